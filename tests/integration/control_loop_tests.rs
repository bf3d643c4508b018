//! Integration tests for the AppService control loop.
//!
//! These run on the host (x86_64) and drive full ticks through mock
//! sensors, actuators, broker link and event sink, checking what a user
//! standing next to the device (outputs, beeps) and the dashboard (broker
//! messages) would observe.

use super::mock_hw::{MockHardware, MockTransport, RecordingSink};

use gasguard::app::events::AppEvent;
use gasguard::app::service::AppService;
use gasguard::config::SystemConfig;
use gasguard::fsm::context::{ActuatorTargets, OperatingMode};
use gasguard::telemetry::topics;
use gasguard::thresholds::CompensationPolicy;

const LEAK: &str = "Gas leak detected in NON-COOKING mode";
const WARNING: &str = "Medium gas level during cooking - Normal operation";
const DANGER: &str = "EXTREME DANGER: Gas too high, valve closed";
const CLOSED: &str = "SAFETY: Valve closed due to high gas";
const RESET: &str = "Gas level normal - System reset";
const REOPENED: &str = "System reset - Valve reopened";
const ESTOP: &str = "EMERGENCY STOP: Valve closed by remote command";

const LOOP_MS: u64 = 50;

/// One device on a bench: service plus its mock surroundings.
struct Rig {
    app: AppService,
    hw: MockHardware,
    link: MockTransport,
    sink: RecordingSink,
    now: u64,
}

impl Rig {
    fn new(config: SystemConfig) -> Self {
        let mut rig = Self {
            app: AppService::new(config),
            hw: MockHardware::new(),
            link: MockTransport::new(),
            sink: RecordingSink::new(),
            now: 0,
        };
        rig.app.start(&mut rig.hw, &mut rig.sink);
        rig
    }

    fn tick(&mut self, now: u64) {
        self.now = now;
        self.app
            .tick(now, &mut self.hw, &mut self.link, &mut self.sink);
    }

    /// Tick at the loop period up to and including `end`.
    fn run_until(&mut self, end: u64) {
        let mut t = self.now + LOOP_MS;
        while t <= end {
            self.tick(t);
            t += LOOP_MS;
        }
    }

    fn press(&mut self, at: u64) {
        self.hw.button_down = true;
        self.tick(at);
        self.hw.button_down = false;
        self.tick(at + LOOP_MS);
    }
}

fn alarm_valve_open() -> ActuatorTargets {
    ActuatorTargets {
        buzzer_on: true,
        fan_on: true,
        valve_open: true,
    }
}

fn alarm_valve_closed() -> ActuatorTargets {
    ActuatorTargets {
        buzzer_on: true,
        fan_on: true,
        valve_open: false,
    }
}

// ── Startup and connectivity ─────────────────────────────────

#[test]
fn start_drives_idle_outputs_and_beeps_twice() {
    let rig = Rig::new(SystemConfig::default());
    assert_eq!(rig.hw.applied, vec![ActuatorTargets::idle()]);
    assert_eq!(rig.hw.beeps, vec![(2, 100)]);
    assert_eq!(
        rig.sink.events.first(),
        Some(&AppEvent::Started(OperatingMode::NonCooking))
    );
}

#[test]
fn first_tick_connects_subscribes_and_announces() {
    let mut rig = Rig::new(SystemConfig::default());
    rig.tick(0);

    assert!(rig.link.connected);
    assert_eq!(rig.link.subscriptions, vec![topics::COMMANDS.to_string()]);
    assert_eq!(rig.link.payloads(topics::STATUS), vec!["connected"]);
    assert_eq!(rig.sink.count(|e| *e == AppEvent::Connected), 1);

    let t = rig.link.last_telemetry().expect("telemetry at boot");
    assert_eq!(t["gas"], 0);
    assert_eq!(t["threshold"], 1000);
    assert_eq!(t["mode"], "non_cooking");
    assert_eq!(t["valve"], "open");
    assert_eq!(t["fan"], 0);
    assert_eq!(t["buzzer"], 0);
}

#[test]
fn reconnect_attempts_are_rate_limited() {
    let mut rig = Rig::new(SystemConfig::default());
    rig.link.failing_connects = 3;
    rig.hw.gas = 1500;

    rig.tick(0);
    rig.run_until(12_000);
    // Attempts at 0, 5000 and 10000 only.
    assert_eq!(rig.link.connect_attempts, 3);
    assert!(rig.link.published.is_empty());

    // The safety loop kept running offline.
    assert_eq!(rig.hw.outputs(), alarm_valve_closed());
    assert_eq!(rig.sink.alert_texts(), vec![LEAK, CLOSED]);
    assert!(rig.sink.count(|e| matches!(e, AppEvent::Telemetry(_))) >= 12);

    rig.run_until(15_000);
    assert_eq!(rig.link.connect_attempts, 4);
    assert!(rig.link.connected);
    assert_eq!(rig.link.payloads(topics::STATUS), vec!["connected"]);
}

#[test]
fn lost_link_is_reestablished_and_resubscribed() {
    let mut rig = Rig::new(SystemConfig::default());
    rig.tick(0);
    rig.link.connected = false;
    rig.link.subscriptions.clear();

    rig.tick(LOOP_MS);
    assert!(rig.link.connected);
    assert_eq!(rig.link.subscriptions, vec![topics::COMMANDS.to_string()]);
    assert_eq!(rig.link.connect_attempts, 2);
}

// ── Non-cooking regime ───────────────────────────────────────

#[test]
fn sustained_leak_closes_valve_after_dwell_then_recovers() {
    let mut rig = Rig::new(SystemConfig::default());
    rig.hw.gas = 1500;
    rig.tick(0);
    assert_eq!(rig.hw.outputs(), alarm_valve_open());
    assert_eq!(rig.hw.beeps, vec![(2, 100), (3, 200)]);

    rig.run_until(1950);
    assert!(rig.hw.valve_open(), "dwell not yet elapsed");

    rig.run_until(2000);
    assert_eq!(rig.hw.outputs(), alarm_valve_closed());
    assert_eq!(rig.link.alert_texts(), vec![LEAK, CLOSED]);
    // Closing the valve is not a new alarm.
    assert_eq!(rig.hw.beeps.len(), 2);

    rig.hw.gas = 500;
    rig.run_until(3000);
    assert_eq!(rig.hw.outputs(), ActuatorTargets::idle());
    assert_eq!(rig.link.alert_texts(), vec![LEAK, CLOSED, RESET, REOPENED]);
}

#[test]
fn interrupted_leak_restarts_the_dwell() {
    let mut rig = Rig::new(SystemConfig::default());
    rig.hw.gas = 1500;
    rig.tick(0);
    rig.hw.gas = 500;
    rig.run_until(1000);
    rig.hw.gas = 1500;
    rig.run_until(3000);
    assert!(rig.hw.valve_open(), "only 1000 ms since the new alert");
    rig.run_until(4000);
    assert!(!rig.hw.valve_open());
    assert_eq!(rig.link.alert_texts(), vec![LEAK, RESET, LEAK, CLOSED]);
}

#[test]
fn alert_record_carries_reading_and_time() {
    let mut rig = Rig::new(SystemConfig::default());
    rig.tick(0);
    rig.hw.gas = 2222;
    rig.hw.temperature = Some(21.0);
    rig.run_until(1000);

    let alerts = rig.link.payloads(topics::ALERTS);
    let v: serde_json::Value = serde_json::from_str(&alerts[0]).unwrap();
    assert_eq!(v["alert"], LEAK);
    assert_eq!(v["gas_level"], 2222);
    assert_eq!(v["temp"], 21.0);
    assert_eq!(v["time"], 1000);
}

// ── Cooking regime and mode switching ────────────────────────

#[test]
fn button_enters_cooking_and_tiers_apply() {
    let mut rig = Rig::new(SystemConfig::default());
    rig.tick(0);
    rig.press(LOOP_MS);

    assert_eq!(rig.app.state().mode, OperatingMode::Cooking);
    assert_eq!(rig.link.payloads(topics::MODE), vec!["cooking_mode"]);
    assert_eq!(rig.hw.beeps, vec![(2, 100), (1, 100)]);

    rig.hw.gas = 1500;
    rig.run_until(1000);
    assert_eq!(rig.hw.outputs(), alarm_valve_open());

    rig.hw.gas = 3500;
    rig.run_until(2000);
    assert_eq!(rig.hw.outputs(), alarm_valve_closed());

    rig.hw.gas = 800;
    rig.run_until(3000);
    assert_eq!(rig.hw.outputs(), ActuatorTargets::idle());
    assert_eq!(rig.app.state().mode, OperatingMode::Cooking);
    assert_eq!(
        rig.link.alert_texts(),
        vec![WARNING, DANGER, CLOSED, RESET, REOPENED]
    );
}

#[test]
fn bouncing_button_toggles_once_per_quiet_interval() {
    let mut rig = Rig::new(SystemConfig::default());
    rig.tick(0);

    // Held across several ticks: one toggle.
    rig.hw.button_down = true;
    rig.run_until(250);
    rig.hw.button_down = false;
    rig.run_until(300);
    assert_eq!(rig.app.state().mode, OperatingMode::Cooking);

    // Re-press 300 ms after the accepted edge: accepted.
    rig.press(350);
    assert_eq!(rig.app.state().mode, OperatingMode::NonCooking);

    // Bounce 100 ms later: swallowed, and never fires late.
    rig.press(450);
    rig.run_until(1500);
    assert_eq!(rig.app.state().mode, OperatingMode::NonCooking);
    assert_eq!(
        rig.sink
            .count(|e| matches!(e, AppEvent::ModeChanged(_))),
        2
    );
}

#[test]
fn leaving_cooking_silences_a_warning() {
    let mut rig = Rig::new(SystemConfig::default());
    rig.tick(0);
    rig.link.command("toggle_mode");
    rig.hw.gas = 1500;
    rig.run_until(1000);
    assert_eq!(rig.hw.outputs(), alarm_valve_open());

    rig.link.command("toggle_mode");
    rig.run_until(1050);
    assert_eq!(rig.app.state().mode, OperatingMode::NonCooking);
    assert_eq!(rig.hw.outputs(), ActuatorTargets::idle());
}

#[test]
fn toggling_never_reopens_a_closed_valve() {
    let mut rig = Rig::new(SystemConfig::default());
    rig.hw.gas = 1500;
    rig.tick(0);
    rig.run_until(2000);
    assert!(!rig.hw.valve_open());

    rig.link.command("toggle_mode");
    rig.run_until(2050);
    rig.link.command("toggle_mode");
    rig.run_until(2100);
    assert_eq!(rig.app.state().mode, OperatingMode::NonCooking);
    assert!(!rig.app.state().alert_active);
    assert_eq!(rig.hw.outputs(), alarm_valve_closed());

    // Back in non-cooking, the persisting leak is a fresh alert.
    rig.run_until(3000);
    assert_eq!(rig.hw.outputs(), alarm_valve_closed());
    assert_eq!(rig.link.alert_texts(), vec![LEAK, CLOSED, LEAK]);

    rig.hw.gas = 500;
    rig.run_until(4000);
    assert_eq!(rig.hw.outputs(), ActuatorTargets::idle());
}

// ── Remote commands ──────────────────────────────────────────

#[test]
fn emergency_stop_holds_until_next_safe_sample() {
    let mut rig = Rig::new(SystemConfig::default());
    rig.tick(0);
    rig.link.command("emergency_stop");
    rig.tick(LOOP_MS);

    assert_eq!(rig.hw.outputs(), alarm_valve_closed());
    assert_eq!(rig.link.alert_texts(), vec![ESTOP, CLOSED]);
    assert_eq!(rig.hw.beeps.last(), Some(&(3, 200)));

    rig.run_until(950);
    assert!(!rig.hw.valve_open());

    rig.run_until(1000);
    assert_eq!(rig.hw.outputs(), ActuatorTargets::idle());
    assert_eq!(
        rig.link.alert_texts(),
        vec![ESTOP, CLOSED, RESET, REOPENED]
    );
}

#[test]
fn unknown_and_misrouted_commands_are_ignored() {
    let mut rig = Rig::new(SystemConfig::default());
    rig.tick(0);
    rig.link.command("EMERGENCY_STOP");
    rig.link.command("reboot");
    rig.link.deliver(topics::MODE, "emergency_stop");
    rig.run_until(500);

    assert_eq!(rig.hw.outputs(), ActuatorTargets::idle());
    assert!(rig.link.payloads(topics::ALERTS).is_empty());
    assert!(rig.link.inbox.is_empty());
}

#[test]
fn manual_valve_commands_need_override() {
    let mut rig = Rig::new(SystemConfig::default());
    rig.tick(0);
    rig.link.command("valve_close");
    rig.tick(LOOP_MS);
    assert!(rig.hw.valve_open());

    let mut rig = Rig::new(SystemConfig {
        manual_valve_override: true,
        ..SystemConfig::default()
    });
    rig.tick(0);
    rig.link.command("valve_close");
    rig.tick(LOOP_MS);
    assert_eq!(rig.hw.outputs(), alarm_valve_closed());

    rig.link.command("valve_open");
    rig.tick(2 * LOOP_MS);
    assert_eq!(rig.hw.outputs(), alarm_valve_open());
    assert_eq!(
        rig.link.alert_texts(),
        vec!["Valve closed manually", "Valve opened manually"]
    );
}

#[test]
fn command_drain_is_bounded_per_tick() {
    let mut rig = Rig::new(SystemConfig::default());
    for _ in 0..9 {
        rig.link.command("toggle_mode");
    }
    rig.tick(0);
    assert_eq!(rig.link.inbox.len(), 1);
    assert_eq!(rig.app.state().mode, OperatingMode::NonCooking);

    rig.tick(LOOP_MS);
    assert_eq!(rig.app.state().mode, OperatingMode::Cooking);
    assert_eq!(rig.link.payloads(topics::MODE).len(), 9);
}

// ── Sampling, compensation and supervision ───────────────────

#[test]
fn sensors_are_read_once_per_sampling_period() {
    let mut rig = Rig::new(SystemConfig::default());
    rig.tick(0);
    rig.run_until(2950);
    assert_eq!(rig.hw.gas_reads, 3);
    assert_eq!(rig.link.payloads(topics::TELEMETRY).len(), 3);
}

#[test]
fn hot_kitchen_lowers_the_safe_threshold() {
    let mut rig = Rig::new(SystemConfig::default());
    rig.hw.temperature = Some(40.0);
    rig.hw.gas = 800;
    rig.tick(0);

    assert_eq!(rig.app.thresholds().safe, 667);
    assert_eq!(rig.link.alert_texts(), vec![LEAK]);
    assert_eq!(rig.link.last_telemetry().unwrap()["threshold"], 667);
}

#[test]
fn verbatim_factors_raise_the_threshold_when_configured() {
    let mut rig = Rig::new(SystemConfig {
        compensation: CompensationPolicy::AsConfigured,
        ..SystemConfig::default()
    });
    rig.hw.temperature = Some(40.0);
    rig.hw.gas = 1200;
    rig.tick(0);

    assert_eq!(rig.app.thresholds().safe, 1500);
    assert!(rig.link.alert_texts().is_empty());
}

#[test]
fn implausible_temperature_keeps_last_good_value() {
    let mut rig = Rig::new(SystemConfig::default());
    rig.hw.temperature = Some(10.0);
    rig.tick(0);
    let cold = rig.app.thresholds();
    assert_eq!(cold.safe, 700);

    rig.hw.temperature = None;
    rig.run_until(1000);
    assert_eq!(rig.app.sensor_faults(), 1);
    assert_eq!(rig.app.thresholds(), cold);

    rig.hw.temperature = Some(85.0);
    rig.run_until(2000);
    assert_eq!(rig.app.thresholds(), cold);

    rig.hw.temperature = Some(25.0);
    rig.run_until(3000);
    assert_eq!(rig.app.sensor_faults(), 0);
    assert_eq!(rig.app.thresholds().safe, 1000);
    assert_eq!(
        rig.sink.count(|e| matches!(e, AppEvent::SensorFaults(_))),
        2
    );
}
