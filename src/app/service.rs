//! Application service: the hexagonal core.
//!
//! [`AppService`] owns the safety record, the state machine, the input
//! supervisor and every loop timer.  It exposes a clean, hardware-agnostic
//! API.  All I/O flows through port traits injected at call sites, making
//! the entire service testable with mock adapters.
//!
//! ```text
//!  SensorPort ──▶ ┌──────────────────────────────┐ ──▶ EventSink
//!  ButtonPort ──▶ │          AppService          │
//! ActuatorPort ◀──│ Supervisor · Thresholds · FSM│◀──▶ TransportPort
//!                 └──────────────────────────────┘
//! ```
//!
//! One [`tick`](AppService::tick) runs, strictly in order:
//!
//! 1. broker connectivity (rate-limited reconnect)
//! 2. sensor sampling and threshold recomputation (sampling period)
//! 3. debounced button → mode toggle
//! 4. state machine evaluation of a fresh reading
//! 5. actuator targets applied
//! 6. telemetry snapshot (publish period)
//! 7. queued remote commands

use log::{debug, error, info, warn};

use crate::config::SystemConfig;
use crate::drivers::button::DebouncedButton;
use crate::fsm::context::{ActuatorTargets, SafetyState, SensorSnapshot};
use crate::fsm::{Evaluation, SafetyMachine, SafetyPolicy};
use crate::safety::{SafetySupervisor, ValidatedReading};
use crate::scheduler::{Cooldown, Millis, PeriodicTimer};
use crate::telemetry::{self, topics};
use crate::thresholds::{BaseThresholds, Compensation, ThresholdSet};

use super::commands::RemoteCommand;
use super::events::AppEvent;
use super::ports::{ActuatorPort, ButtonPort, EventSink, SensorPort, TransportPort};

/// Inbound commands handled per tick; the rest wait for the next one.
const MAX_COMMANDS_PER_TICK: usize = 8;

/// Audible cues: (pulses, pulse length in ms).
const BEEP_STARTUP: (u8, u32) = (2, 100);
const BEEP_BUTTON: (u8, u32) = (1, 100);
const BEEP_ALERT: (u8, u32) = (3, 200);

// ───────────────────────────────────────────────────────────────
// AppService
// ───────────────────────────────────────────────────────────────

/// The application service orchestrates all domain logic.
pub struct AppService {
    config: SystemConfig,
    machine: SafetyMachine,
    safety: SafetySupervisor,
    base: BaseThresholds,
    compensation: Compensation,
    button: DebouncedButton,

    // ── Timers ────────────────────────────────────────────────
    sample_timer: PeriodicTimer,
    telemetry_timer: PeriodicTimer,
    reconnect: Cooldown,

    // ── Live values ───────────────────────────────────────────
    state: SafetyState,
    reading: ValidatedReading,
    thresholds: ThresholdSet,
    tick_count: u64,
}

impl AppService {
    /// Construct the service from configuration.
    ///
    /// Does **not** touch hardware: call [`start`](Self::start) next.
    pub fn new(config: SystemConfig) -> Self {
        let base = config.base_thresholds();
        let compensation = Compensation::from_config(&config);
        let reading = ValidatedReading {
            gas: 0,
            temperature_c: config.initial_temperature_c,
        };
        let thresholds = ThresholdSet::compute(&base, &compensation, reading.temperature_c);

        Self {
            machine: SafetyMachine::new(SafetyPolicy::from_config(&config)),
            safety: SafetySupervisor::new(&config),
            base,
            compensation,
            button: DebouncedButton::new(config.button_debounce_ms),
            sample_timer: PeriodicTimer::new(config.sensor_read_interval_ms),
            telemetry_timer: PeriodicTimer::new(config.telemetry_interval_ms),
            reconnect: Cooldown::new(config.reconnect_cooldown_ms),
            state: SafetyState::initial(),
            reading,
            thresholds,
            tick_count: 0,
            config,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Drive outputs to the initial posture and sound the startup cue.
    pub fn start(&mut self, hw: &mut impl ActuatorPort, sink: &mut impl EventSink) {
        hw.apply(&ActuatorTargets::from_state(&self.state));
        hw.beep(BEEP_STARTUP.0, BEEP_STARTUP.1);
        sink.emit(&AppEvent::Started(self.state.mode));
        info!(
            "AppService started in {}",
            self.machine.regime_name(self.state.mode)
        );
    }

    // ── Per-tick orchestration ────────────────────────────────

    /// Run one full control cycle.
    ///
    /// The `hw` parameter satisfies [`SensorPort`], [`ButtonPort`] and
    /// [`ActuatorPort`] at once; this avoids a double mutable borrow
    /// while keeping the port boundary explicit.
    pub fn tick(
        &mut self,
        now: Millis,
        hw: &mut (impl SensorPort + ButtonPort + ActuatorPort),
        link: &mut impl TransportPort,
        sink: &mut impl EventSink,
    ) {
        self.tick_count += 1;

        // 1. Broker connectivity
        self.ensure_link(now, link, sink);

        // 2. Sampling
        let fresh = self.sample_timer.due(now);
        if fresh {
            self.sample(hw, sink);
        }

        // 3. Button
        let pressed = hw.read_button();
        if self.button.on_sample(pressed, now).is_some() {
            info!("Mode button pressed");
            hw.beep(BEEP_BUTTON.0, BEEP_BUTTON.1);
            let ev = self.machine.toggle_mode(self.state, now);
            self.commit(ev, now, hw, link, sink);
        }

        // 4. Evaluate the latest reading
        if fresh {
            let ev = self
                .machine
                .evaluate(self.state, self.reading.gas, &self.thresholds, now);
            self.commit(ev, now, hw, link, sink);
        }

        // 5. Actuators
        hw.apply(&ActuatorTargets::from_state(&self.state));

        // 6. Telemetry
        if self.telemetry_timer.due(now) {
            self.publish_telemetry(link, sink);
        }

        // 7. Remote commands
        for _ in 0..MAX_COMMANDS_PER_TICK {
            let Some(msg) = link.poll_inbound() else {
                break;
            };
            match RemoteCommand::decode(&msg.topic, &msg.payload) {
                Some(cmd) => self.handle_command(cmd, now, hw, link, sink),
                None => debug!("Ignoring message on {}: {:?}", msg.topic, msg.payload),
            }
        }
    }

    // ── Command handling ──────────────────────────────────────

    /// Feed a decoded remote command into the state machine.
    pub fn handle_command(
        &mut self,
        cmd: RemoteCommand,
        now: Millis,
        hw: &mut impl ActuatorPort,
        link: &mut impl TransportPort,
        sink: &mut impl EventSink,
    ) {
        info!("Remote command: {:?}", cmd);
        let ev = match cmd {
            RemoteCommand::EmergencyStop => self.machine.emergency_stop(self.state, now),
            RemoteCommand::ToggleMode => self.machine.toggle_mode(self.state, now),
            RemoteCommand::ValveOpen => self.machine.manual_valve(self.state, true, now),
            RemoteCommand::ValveClose => self.machine.manual_valve(self.state, false, now),
        };
        self.commit(ev, now, hw, link, sink);
    }

    // ── Queries ───────────────────────────────────────────────

    /// Current safety record.
    pub fn state(&self) -> SafetyState {
        self.state
    }

    /// Thresholds in effect for the latest reading.
    pub fn thresholds(&self) -> ThresholdSet {
        self.thresholds
    }

    /// Latest validated gas and temperature.
    pub fn reading(&self) -> ValidatedReading {
        self.reading
    }

    /// Current sensor fault bitmask (0 = no faults).
    pub fn sensor_faults(&self) -> u8 {
        self.safety.faults()
    }

    /// Total control ticks executed since startup.
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn config(&self) -> &SystemConfig {
        &self.config
    }

    // ── Internal ──────────────────────────────────────────────

    fn ensure_link(&mut self, now: Millis, link: &mut impl TransportPort, sink: &mut impl EventSink) {
        if link.is_connected() || !self.reconnect.ready(now) {
            return;
        }
        self.reconnect.arm(now);
        info!("Connecting to broker...");
        if let Err(e) = link.connect() {
            warn!(
                "Broker connect failed: {}, retrying in {} ms",
                e, self.config.reconnect_cooldown_ms
            );
            return;
        }

        self.reconnect.reset();
        info!("Broker connected");
        if let Err(e) = link.subscribe(topics::COMMANDS) {
            warn!("Subscribe to {} failed: {}", topics::COMMANDS, e);
        }
        publish(link, topics::STATUS, topics::STATUS_CONNECTED.as_bytes());
        sink.emit(&AppEvent::Connected);
    }

    fn sample(&mut self, hw: &mut impl SensorPort, sink: &mut impl EventSink) {
        let snap = SensorSnapshot {
            gas_raw: hw.read_gas(),
            temperature_c: hw.read_temperature(),
        };
        let prev_faults = self.safety.faults();
        self.reading = self.safety.evaluate(&snap);
        if self.safety.faults() != prev_faults {
            sink.emit(&AppEvent::SensorFaults(self.safety.faults()));
        }
        self.thresholds =
            ThresholdSet::compute(&self.base, &self.compensation, self.reading.temperature_c);
        debug!(
            "Sample: gas={} temp={:.1} thresholds={:?}",
            self.reading.gas, self.reading.temperature_c, self.thresholds
        );
    }

    /// Adopt an evaluation: cues, alert records, mode announcement, outputs.
    fn commit(
        &mut self,
        ev: Evaluation,
        now: Millis,
        hw: &mut impl ActuatorPort,
        link: &mut impl TransportPort,
        sink: &mut impl EventSink,
    ) {
        let prev = self.state;
        self.state = ev.state;

        if ev.alerts.iter().any(|a| a.is_raise()) {
            hw.beep(BEEP_ALERT.0, BEEP_ALERT.1);
        }

        for event in &ev.alerts {
            let record =
                telemetry::alert(*event, self.reading.gas, self.reading.temperature_c, now);
            match record.to_payload() {
                Ok(payload) => publish(link, topics::ALERTS, &payload),
                Err(e) => error!("Alert encode failed: {}", e),
            }
            sink.emit(&AppEvent::Alert(record));
        }

        if self.state.mode != prev.mode {
            publish(link, topics::MODE, self.state.mode.announcement().as_bytes());
            sink.emit(&AppEvent::ModeChanged(self.state.mode));
        }

        hw.apply(&ev.targets);
    }

    fn publish_telemetry(&self, link: &mut impl TransportPort, sink: &mut impl EventSink) {
        let record = telemetry::snapshot(
            &self.state,
            self.reading.gas,
            self.reading.temperature_c,
            &self.thresholds,
        );
        match record.to_payload() {
            Ok(payload) => publish(link, topics::TELEMETRY, &payload),
            Err(e) => error!("Telemetry encode failed: {}", e),
        }
        sink.emit(&AppEvent::Telemetry(record));
    }
}

/// Fire-and-forget publish.  Failures are logged, never retried.
fn publish(link: &mut impl TransportPort, topic: &str, payload: &[u8]) {
    if !link.is_connected() {
        debug!("Broker offline, dropping message for {}", topic);
        return;
    }
    if let Err(e) = link.publish(topic, payload) {
        warn!("Publish to {} failed: {}", topic, e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_service_starts_quiet() {
        let app = AppService::new(SystemConfig::default());
        assert_eq!(app.state(), SafetyState::initial());
        assert_eq!(app.tick_count(), 0);
        assert_eq!(app.sensor_faults(), 0);
    }

    #[test]
    fn initial_thresholds_use_initial_temperature() {
        let config = SystemConfig {
            initial_temperature_c: 40.0,
            compensation: crate::thresholds::CompensationPolicy::AsConfigured,
            ..SystemConfig::default()
        };
        let app = AppService::new(config);
        assert_eq!(app.thresholds().safe, 1500);
        assert_eq!(app.thresholds().danger, 4500);
    }
}
