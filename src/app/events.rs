//! Outbound application events.
//!
//! The [`AppService`](super::service::AppService) emits these through the
//! [`EventSink`](super::ports::EventSink) port alongside publishing them on
//! the broker, so the serial console shows the same stream the dashboard
//! receives even while the link is down.

use crate::fsm::context::OperatingMode;
use crate::telemetry::{AlertRecord, TelemetryRecord};

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// The application service has started (carries initial mode).
    Started(OperatingMode),

    /// Periodic telemetry snapshot.
    Telemetry(TelemetryRecord),

    /// A discrete safety transition.
    Alert(AlertRecord),

    /// The operating mode switched.
    ModeChanged(OperatingMode),

    /// A sensor fault bit changed; carries the new mask.
    SensorFaults(u8),

    /// The broker link came up.
    Connected,
}
