//! Safety state machine.
//!
//! Two regimes keyed by [`OperatingMode`], dispatched through a
//! function-pointer table:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │  RegimeTable                                             │
//! │  ┌─────────────┬──────────────┬────────────────────────┐ │
//! │  │ Mode        │ on_enter     │ on_evaluate            │ │
//! │  ├─────────────┼──────────────┼────────────────────────┤ │
//! │  │ NonCooking  │ fn(ctx)      │ fn(ctx)  single tier   │ │
//! │  │ Cooking     │ fn(ctx)      │ fn(ctx)  warn / danger │ │
//! │  └─────────────┴──────────────┴────────────────────────┘ │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! Every entry point takes the current [`SafetyState`] by value and returns
//! an [`Evaluation`]: the next state, the actuator targets derived from it,
//! and the alert events raised on the way.  Nothing here performs I/O
//! beyond logging, so the whole machine is testable with plain values.

pub mod context;
pub mod states;

use context::{ActuatorTargets, EvalContext, GasLevel, OperatingMode, SafetyState};
use log::{info, warn};

use crate::config::SystemConfig;
use crate::scheduler::Millis;
use crate::thresholds::ThresholdSet;

// ---------------------------------------------------------------------------
// Alert events
// ---------------------------------------------------------------------------

/// Discrete transitions reported on the alert channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertEvent {
    /// Non-cooking reading at or above the safe threshold.
    LeakDetected,
    /// Cooking reading entered the warning band.
    CookingWarning,
    /// Cooking reading reached the danger band.
    ExtremeDanger,
    /// The valve was closed by the reading-driven path.
    ValveClosed,
    /// A safe reading cleared the alert.
    SystemReset,
    /// The valve was reopened by a safe reading.
    ValveReopened,
    /// Remote emergency stop.
    EmergencyStop,
    ManualValveClosed,
    ManualValveOpened,
}

impl AlertEvent {
    /// Text carried in the alert record.
    pub fn message(self) -> &'static str {
        match self {
            Self::LeakDetected => "Gas leak detected in NON-COOKING mode",
            Self::CookingWarning => "Medium gas level during cooking - Normal operation",
            Self::ExtremeDanger => "EXTREME DANGER: Gas too high, valve closed",
            Self::ValveClosed => "SAFETY: Valve closed due to high gas",
            Self::SystemReset => "Gas level normal - System reset",
            Self::ValveReopened => "System reset - Valve reopened",
            Self::EmergencyStop => "EMERGENCY STOP: Valve closed by remote command",
            Self::ManualValveClosed => "Valve closed manually",
            Self::ManualValveOpened => "Valve opened manually",
        }
    }

    /// Whether this event starts a new alarm (drives the alert beep pattern).
    pub fn is_raise(self) -> bool {
        matches!(
            self,
            Self::LeakDetected | Self::CookingWarning | Self::ExtremeDanger | Self::EmergencyStop
        )
    }
}

/// Events produced by one evaluation.  Four covers the worst case
/// (raise + close, or reset + reopen).
pub type AlertList = heapless::Vec<AlertEvent, 4>;

/// Output of every state machine entry point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evaluation {
    pub state: SafetyState,
    pub targets: ActuatorTargets,
    pub alerts: AlertList,
}

impl Evaluation {
    fn from_context(ctx: EvalContext<'_>) -> Self {
        Self {
            targets: ActuatorTargets::from_state(&ctx.state),
            state: ctx.state,
            alerts: ctx.alerts,
        }
    }

    fn unchanged(state: SafetyState) -> Self {
        Self {
            state,
            targets: ActuatorTargets::from_state(&state),
            alerts: AlertList::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Policy knobs
// ---------------------------------------------------------------------------

/// Timing and variant choices consulted by the regime handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SafetyPolicy {
    /// Dwell between alert onset and valve closure in non-cooking mode.
    pub valve_close_delay_ms: u32,
    pub cooking_danger_forces_non_cooking: bool,
    pub manual_valve_override: bool,
}

impl SafetyPolicy {
    pub fn from_config(config: &SystemConfig) -> Self {
        Self {
            valve_close_delay_ms: config.valve_close_delay_ms,
            cooking_danger_forces_non_cooking: config.cooking_danger_forces_non_cooking,
            manual_valve_override: config.manual_valve_override,
        }
    }
}

// ---------------------------------------------------------------------------
// Regime descriptor (one row in the table)
// ---------------------------------------------------------------------------

/// Runs once when the mode switches into this regime.
pub type RegimeEnterFn = fn(&mut EvalContext<'_>);

/// Per-reading decision for this regime.
pub type RegimeEvaluateFn = fn(&mut EvalContext<'_>);

pub struct RegimeDescriptor {
    pub mode: OperatingMode,
    pub name: &'static str,
    pub on_enter: Option<RegimeEnterFn>,
    pub on_evaluate: RegimeEvaluateFn,
}

// ---------------------------------------------------------------------------
// Machine
// ---------------------------------------------------------------------------

/// Placeholder for entry points that are not driven by a reading.
const NO_READING: ThresholdSet = ThresholdSet {
    safe: 0,
    warning: 0,
    danger: 0,
};

/// The regime table plus the policy it runs under.  Holds no device state.
pub struct SafetyMachine {
    /// Indexed by `OperatingMode as usize`.
    table: [RegimeDescriptor; OperatingMode::COUNT],
    policy: SafetyPolicy,
}

impl SafetyMachine {
    pub fn new(policy: SafetyPolicy) -> Self {
        Self {
            table: states::build_regime_table(),
            policy,
        }
    }

    pub fn policy(&self) -> &SafetyPolicy {
        &self.policy
    }

    pub fn regime_name(&self, mode: OperatingMode) -> &'static str {
        self.table[mode as usize].name
    }

    /// Decide the next state for one gas reading.
    pub fn evaluate(
        &self,
        state: SafetyState,
        gas: GasLevel,
        thresholds: &ThresholdSet,
        now: Millis,
    ) -> Evaluation {
        let mut ctx = EvalContext::new(state, gas, thresholds, now, &self.policy);
        (self.table[state.mode as usize].on_evaluate)(&mut ctx);

        if ctx.state.mode != state.mode {
            self.enter(&mut ctx);
        }
        Evaluation::from_context(ctx)
    }

    /// Switch mode (debounced button or remote `toggle_mode`).
    ///
    /// Never reopens a closed valve; only a safe reading does that.
    pub fn toggle_mode(&self, state: SafetyState, now: Millis) -> Evaluation {
        let mut ctx = EvalContext::new(state, 0, &NO_READING, now, &self.policy);
        ctx.state.mode = state.mode.toggled();
        info!(
            "Mode changed: {} -> {}",
            self.regime_name(state.mode),
            self.regime_name(ctx.state.mode)
        );
        self.enter(&mut ctx);
        Evaluation::from_context(ctx)
    }

    /// Remote emergency stop: alarm on and valve closed, no dwell.
    pub fn emergency_stop(&self, state: SafetyState, now: Millis) -> Evaluation {
        let mut ctx = EvalContext::new(state, 0, &NO_READING, now, &self.policy);
        warn!("EMERGENCY STOP: closing valve");
        ctx.stamp_alert();
        ctx.raise(AlertEvent::EmergencyStop);
        if ctx.close_valve() {
            ctx.raise(AlertEvent::ValveClosed);
        }
        Evaluation::from_context(ctx)
    }

    /// Manual `valve_open` / `valve_close`.  Ignored unless enabled.
    pub fn manual_valve(&self, state: SafetyState, open: bool, now: Millis) -> Evaluation {
        if !self.policy.manual_valve_override {
            warn!("Manual valve command ignored: override disabled");
            return Evaluation::unchanged(state);
        }

        let mut ctx = EvalContext::new(state, 0, &NO_READING, now, &self.policy);
        if open {
            if ctx.state.valve_closed {
                ctx.state.valve_closed = false;
                // Restart the dwell so a persisting leak closes it again.
                if ctx.state.alert_active {
                    ctx.state.alert_started_ms = now;
                }
                info!("Valve opened manually");
                ctx.raise(AlertEvent::ManualValveOpened);
            }
        } else if ctx.close_valve() {
            ctx.stamp_alert();
            warn!("Valve closed manually");
            ctx.raise(AlertEvent::ManualValveClosed);
        }
        Evaluation::from_context(ctx)
    }

    fn enter(&self, ctx: &mut EvalContext<'_>) {
        if let Some(enter) = self.table[ctx.state.mode as usize].on_enter {
            enter(ctx);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn machine() -> SafetyMachine {
        SafetyMachine::new(SafetyPolicy::from_config(&SystemConfig::default()))
    }

    fn thresholds() -> ThresholdSet {
        ThresholdSet::uncompensated(&SystemConfig::default().base_thresholds())
    }

    fn cooking() -> SafetyState {
        SafetyState {
            mode: OperatingMode::Cooking,
            ..SafetyState::initial()
        }
    }

    fn alerts(list: &[AlertEvent]) -> AlertList {
        AlertList::from_slice(list).unwrap()
    }

    #[test]
    fn cooking_tier_sequence() {
        let m = machine();
        let th = ThresholdSet {
            safe: 1000,
            warning: 1000,
            danger: 3000,
        };
        let mut state = cooking();
        let mut seen = Vec::new();
        for (i, gas) in [500, 1500, 3500, 800].into_iter().enumerate() {
            let ev = m.evaluate(state, gas, &th, i as u64 * 50);
            state = ev.state;
            seen.push(ev.alerts);
        }
        assert_eq!(seen[0], alerts(&[]));
        assert_eq!(seen[1], alerts(&[AlertEvent::CookingWarning]));
        assert_eq!(
            seen[2],
            alerts(&[AlertEvent::ExtremeDanger, AlertEvent::ValveClosed])
        );
        assert_eq!(
            seen[3],
            alerts(&[AlertEvent::SystemReset, AlertEvent::ValveReopened])
        );
        assert!(!state.alert_active && !state.valve_closed);
        assert_eq!(state.mode, OperatingMode::Cooking);
    }

    #[test]
    fn non_cooking_valve_closes_at_dwell() {
        let m = machine();
        let th = thresholds();
        let mut state = SafetyState::initial();
        let mut closed_at = None;
        for now in (0..=3000).step_by(250) {
            let ev = m.evaluate(state, 1200, &th, now);
            if ev.alerts.contains(&AlertEvent::ValveClosed) {
                assert!(closed_at.is_none(), "valve closed twice");
                closed_at = Some(now);
            }
            state = ev.state;
        }
        assert_eq!(closed_at, Some(2000));
        assert!(state.valve_closed);
    }

    #[test]
    fn non_cooking_dwell_counts_from_first_evaluation() {
        let m = machine();
        let th = thresholds();
        let ev = m.evaluate(SafetyState::initial(), 1200, &th, 700);
        assert_eq!(ev.alerts, alerts(&[AlertEvent::LeakDetected]));
        assert!(ev.targets.buzzer_on && ev.targets.fan_on && ev.targets.valve_open);
        let ev = m.evaluate(ev.state, 1200, &th, 2699);
        assert!(!ev.state.valve_closed);
        let ev = m.evaluate(ev.state, 1200, &th, 2700);
        assert!(ev.state.valve_closed);
        assert!(!ev.targets.valve_open);
    }

    #[test]
    fn toggle_does_not_reopen_closed_valve() {
        let m = machine();
        let th = thresholds();
        let ev = m.evaluate(cooking(), 3500, &th, 0);
        assert!(ev.state.valve_closed);

        let ev = m.toggle_mode(ev.state, 10);
        assert_eq!(ev.state.mode, OperatingMode::NonCooking);
        assert!(ev.state.valve_closed);
        assert!(!ev.state.alert_active);
        assert!(!ev.targets.valve_open);
        assert!(ev.targets.buzzer_on && ev.targets.fan_on);

        let ev = m.toggle_mode(ev.state, 20);
        assert!(ev.state.valve_closed);
    }

    #[test]
    fn leak_after_leaving_cooking_raises_a_new_alert() {
        let m = machine();
        let th = thresholds();
        let ev = m.evaluate(cooking(), 3500, &th, 0);
        let ev = m.toggle_mode(ev.state, 10);
        assert!(!ev.state.alert_active && ev.state.valve_closed);

        let ev = m.evaluate(ev.state, 1500, &th, 1000);
        assert_eq!(ev.alerts, alerts(&[AlertEvent::LeakDetected]));
        assert_eq!(ev.state.alert_started_ms, 1000);
        assert!(ev.state.valve_closed);

        let ev = m.evaluate(ev.state, 500, &th, 2000);
        assert!(!ev.state.is_alarmed());
        assert!(ev.targets.valve_open);
    }

    #[test]
    fn toggle_to_non_cooking_silences_warning() {
        let m = machine();
        let th = thresholds();
        let ev = m.evaluate(cooking(), 1500, &th, 0);
        assert!(ev.state.alert_active);
        let ev = m.toggle_mode(ev.state, 10);
        assert!(!ev.state.alert_active);
        assert_eq!(ev.targets, ActuatorTargets::idle());
        assert!(ev.alerts.is_empty());
    }

    #[test]
    fn emergency_stop_closes_at_safe_reading() {
        let m = machine();
        let ev = m.emergency_stop(SafetyState::initial(), 42);
        assert!(ev.state.valve_closed && ev.state.alert_active);
        assert_eq!(ev.state.alert_started_ms, 42);
        assert_eq!(
            ev.alerts,
            alerts(&[AlertEvent::EmergencyStop, AlertEvent::ValveClosed])
        );
        assert!(!ev.targets.valve_open);

        // A later safe reading is the reset path.
        let ev = m.evaluate(ev.state, 100, &thresholds(), 1000);
        assert!(!ev.state.valve_closed && !ev.state.alert_active);
    }

    #[test]
    fn emergency_stop_when_already_closed_only_reports() {
        let m = machine();
        let ev = m.emergency_stop(SafetyState::initial(), 0);
        let ev = m.emergency_stop(ev.state, 5);
        assert_eq!(ev.alerts, alerts(&[AlertEvent::EmergencyStop]));
        assert_eq!(ev.state.alert_started_ms, 0);
    }

    #[test]
    fn cooking_danger_can_force_non_cooking() {
        let policy = SafetyPolicy {
            cooking_danger_forces_non_cooking: true,
            ..SafetyPolicy::from_config(&SystemConfig::default())
        };
        let m = SafetyMachine::new(policy);
        let ev = m.evaluate(cooking(), 3500, &thresholds(), 0);
        assert_eq!(ev.state.mode, OperatingMode::NonCooking);
        // The forced switch is an ordinary mode switch: alert cleared,
        // valve held closed with alarms on.
        assert!(ev.state.valve_closed && !ev.state.alert_active);
        assert_eq!(ev.alerts, alerts(&[AlertEvent::ExtremeDanger, AlertEvent::ValveClosed]));
        assert!(ev.targets.buzzer_on && ev.targets.fan_on && !ev.targets.valve_open);
    }

    #[test]
    fn manual_valve_ignored_by_default() {
        let m = machine();
        let ev = m.manual_valve(SafetyState::initial(), false, 0);
        assert_eq!(ev.state, SafetyState::initial());
        assert!(ev.alerts.is_empty());
    }

    #[test]
    fn manual_valve_when_enabled() {
        let policy = SafetyPolicy {
            manual_valve_override: true,
            ..SafetyPolicy::from_config(&SystemConfig::default())
        };
        let m = SafetyMachine::new(policy);
        let ev = m.manual_valve(SafetyState::initial(), false, 100);
        assert!(ev.state.valve_closed);
        assert_eq!(ev.alerts, alerts(&[AlertEvent::ManualValveClosed]));

        let ev = m.manual_valve(ev.state, true, 500);
        assert!(!ev.state.valve_closed);
        assert_eq!(ev.state.alert_started_ms, 500);
        assert_eq!(ev.alerts, alerts(&[AlertEvent::ManualValveOpened]));
    }

    #[test]
    fn alert_messages_match_wire_text() {
        assert_eq!(
            AlertEvent::LeakDetected.message(),
            "Gas leak detected in NON-COOKING mode"
        );
        assert_eq!(
            AlertEvent::ValveReopened.message(),
            "System reset - Valve reopened"
        );
        assert!(AlertEvent::CookingWarning.is_raise());
        assert!(!AlertEvent::SystemReset.is_raise());
    }
}
