//! Telemetry and alert records, and their JSON wire format.
//!
//! ```text
//! gas_sensor/data    {"gas":1234,"temp":24.5,"threshold":1000,"mode":"cooking",
//!                     "valve":"open","fan":1,"buzzer":1}
//! gas_sensor/alerts  {"alert":"...","gas_level":1234,"temp":24.5,"time":123456}
//! system/mode        cooking_mode | non_cooking_mode
//! system/status      connected
//! ```
//!
//! Records are plain values built by the orchestrator; publishing them is
//! the transport's job and failures are not retried here.

use serde::{Serialize, Serializer};

use crate::fsm::AlertEvent;
use crate::fsm::context::{ActuatorTargets, GasLevel, OperatingMode, SafetyState};
use crate::scheduler::Millis;
use crate::thresholds::{Threshold, ThresholdSet};

/// Topic names used on the broker.
pub mod topics {
    pub const TELEMETRY: &str = "gas_sensor/data";
    pub const ALERTS: &str = "gas_sensor/alerts";
    pub const MODE: &str = "system/mode";
    pub const COMMANDS: &str = "system/commands";
    pub const STATUS: &str = "system/status";

    /// Published on `STATUS` after every successful connect.
    pub const STATUS_CONNECTED: &str = "connected";
}

// ───────────────────────────────────────────────────────────────
// Field encodings
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ValvePosition {
    Open,
    Closed,
}

/// Round to one decimal place, as the dashboard expects.
fn one_decimal<S: Serializer>(value: &f32, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_f64((f64::from(*value) * 10.0).round() / 10.0)
}

/// Booleans go out as `0` / `1`.
fn as_flag<S: Serializer>(value: &bool, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u8(u8::from(*value))
}

// ───────────────────────────────────────────────────────────────
// Records
// ───────────────────────────────────────────────────────────────

/// Periodic status snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TelemetryRecord {
    pub gas: GasLevel,
    #[serde(serialize_with = "one_decimal")]
    pub temp: f32,
    /// Temperature-adjusted safe threshold.
    pub threshold: Threshold,
    pub mode: OperatingMode,
    pub valve: ValvePosition,
    #[serde(serialize_with = "as_flag")]
    pub fan: bool,
    #[serde(serialize_with = "as_flag")]
    pub buzzer: bool,
}

/// One discrete safety transition.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AlertRecord {
    pub alert: &'static str,
    pub gas_level: GasLevel,
    #[serde(serialize_with = "one_decimal")]
    pub temp: f32,
    /// Milliseconds since boot.
    pub time: Millis,
}

pub fn snapshot(
    state: &SafetyState,
    gas: GasLevel,
    temperature_c: f32,
    thresholds: &ThresholdSet,
) -> TelemetryRecord {
    let targets = ActuatorTargets::from_state(state);
    TelemetryRecord {
        gas,
        temp: temperature_c,
        threshold: thresholds.safe,
        mode: state.mode,
        valve: if targets.valve_open {
            ValvePosition::Open
        } else {
            ValvePosition::Closed
        },
        fan: targets.fan_on,
        buzzer: targets.buzzer_on,
    }
}

pub fn alert(event: AlertEvent, gas: GasLevel, temperature_c: f32, now: Millis) -> AlertRecord {
    AlertRecord {
        alert: event.message(),
        gas_level: gas,
        temp: temperature_c,
        time: now,
    }
}

impl TelemetryRecord {
    pub fn to_payload(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}

impl AlertRecord {
    pub fn to_payload(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}
