//! State records threaded through every regime handler.
//!
//! [`SafetyState`] is the authoritative device record owned by the
//! orchestrator.  [`EvalContext`] is the per-evaluation blackboard that
//! regime handlers read from and write to: a copy of the state, the
//! inputs for this evaluation, and the alert events produced so far.

use serde::{Deserialize, Serialize};

use super::{AlertEvent, AlertList, SafetyPolicy};
use crate::scheduler::Millis;
use crate::thresholds::ThresholdSet;

/// Raw gas sample in sensor counts.  Not range-limited.
pub type GasLevel = i32;

// ---------------------------------------------------------------------------
// Operating mode
// ---------------------------------------------------------------------------

/// Selects the threshold tier and regime that apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum OperatingMode {
    #[default]
    NonCooking = 0,
    Cooking = 1,
}

impl OperatingMode {
    pub const COUNT: usize = 2;

    pub fn toggled(self) -> Self {
        match self {
            Self::NonCooking => Self::Cooking,
            Self::Cooking => Self::NonCooking,
        }
    }

    /// Payload published on the mode topic after a switch.
    pub fn announcement(self) -> &'static str {
        match self {
            Self::NonCooking => "non_cooking_mode",
            Self::Cooking => "cooking_mode",
        }
    }

    /// Short name used in telemetry.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NonCooking => "non_cooking",
            Self::Cooking => "cooking",
        }
    }
}

// ---------------------------------------------------------------------------
// Safety state
// ---------------------------------------------------------------------------

/// The authoritative safety record.
///
/// `valve_closed` implies buzzer and fan are on, whatever the mode.  The
/// valve only reopens through a safe reading (or an explicit manual open).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SafetyState {
    pub mode: OperatingMode,
    pub alert_active: bool,
    pub valve_closed: bool,
    /// Stamped on every transition into `alert_active`.
    pub alert_started_ms: Millis,
}

impl SafetyState {
    /// Non-cooking, no alert, valve open.
    pub const fn initial() -> Self {
        Self {
            mode: OperatingMode::NonCooking,
            alert_active: false,
            valve_closed: false,
            alert_started_ms: 0,
        }
    }

    /// True when any alarm output is required.
    pub fn is_alarmed(&self) -> bool {
        self.alert_active || self.valve_closed
    }
}

// ---------------------------------------------------------------------------
// Actuator targets (pure function of the safety state)
// ---------------------------------------------------------------------------

/// Desired physical outputs.  Applied every tick; writes are idempotent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActuatorTargets {
    pub buzzer_on: bool,
    pub fan_on: bool,
    pub valve_open: bool,
}

impl ActuatorTargets {
    /// Quiet, valve open.
    pub const fn idle() -> Self {
        Self {
            buzzer_on: false,
            fan_on: false,
            valve_open: true,
        }
    }

    pub fn from_state(state: &SafetyState) -> Self {
        if state.valve_closed {
            Self {
                buzzer_on: true,
                fan_on: true,
                valve_open: false,
            }
        } else if state.alert_active {
            Self {
                buzzer_on: true,
                fan_on: true,
                valve_open: true,
            }
        } else {
            Self::idle()
        }
    }
}

// ---------------------------------------------------------------------------
// Sensor snapshot (written by the sensor hub, validated by the supervisor)
// ---------------------------------------------------------------------------

/// One raw acquisition of both sensors.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SensorSnapshot {
    /// Raw MQ-2 reading (0 – 4095 on a 12-bit ADC).
    pub gas_raw: GasLevel,
    /// `None` when the DHT11 read failed.
    pub temperature_c: Option<f32>,
}

// ---------------------------------------------------------------------------
// EvalContext
// ---------------------------------------------------------------------------

/// Blackboard passed to every regime handler for one evaluation.
pub struct EvalContext<'a> {
    /// Working copy of the safety record; committed by the caller.
    pub state: SafetyState,
    pub gas: GasLevel,
    pub thresholds: &'a ThresholdSet,
    pub now: Millis,
    pub policy: &'a SafetyPolicy,
    /// Events raised so far, in order.
    pub alerts: AlertList,
}

impl<'a> EvalContext<'a> {
    pub fn new(
        state: SafetyState,
        gas: GasLevel,
        thresholds: &'a ThresholdSet,
        now: Millis,
        policy: &'a SafetyPolicy,
    ) -> Self {
        Self {
            state,
            gas,
            thresholds,
            now,
            policy,
            alerts: AlertList::new(),
        }
    }

    /// Record an event.  The list is sized for the worst case of a single
    /// evaluation, so an overflow indicates a logic error.
    pub fn raise(&mut self, event: AlertEvent) {
        if self.alerts.push(event).is_err() {
            debug_assert!(false, "alert list overflow");
        }
    }

    /// Milliseconds since the current alert was stamped.
    pub fn alert_age_ms(&self) -> Millis {
        self.now.saturating_sub(self.state.alert_started_ms)
    }

    /// Enter `alert_active`, stamping the start time.  No-op when already active.
    pub fn stamp_alert(&mut self) -> bool {
        if self.state.alert_active {
            return false;
        }
        self.state.alert_active = true;
        self.state.alert_started_ms = self.now;
        true
    }

    /// Close the valve.  Returns `false` if it was already closed.
    pub fn close_valve(&mut self) -> bool {
        if self.state.valve_closed {
            return false;
        }
        self.state.valve_closed = true;
        true
    }

    /// Clear the alert and reopen the valve, emitting reset events.
    pub fn clear(&mut self) {
        if !self.state.is_alarmed() {
            return;
        }
        let was_closed = self.state.valve_closed;
        self.state.alert_active = false;
        self.state.valve_closed = false;
        self.raise(AlertEvent::SystemReset);
        if was_closed {
            self.raise(AlertEvent::ValveReopened);
        }
    }
}
