//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ AppService (domain)
//! ```
//!
//! Driven adapters (sensors, button, actuators, broker link, event sinks,
//! storage) implement these traits.  The [`AppService`](super::service::AppService)
//! consumes them via generics, so the domain core never touches hardware
//! directly.
//!
//! All port errors are typed; callers must handle every variant explicitly.

use crate::config::SystemConfig;
use crate::fsm::context::{ActuatorTargets, GasLevel};

// ───────────────────────────────────────────────────────────────
// Sensor port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Read-side port: the domain calls this to obtain sensor data.
pub trait SensorPort {
    /// Raw gas reading.  Never fails; a driver that cannot read returns
    /// its last value.
    fn read_gas(&mut self) -> GasLevel;

    /// Temperature in °C, or `None` when the sensor did not answer.
    fn read_temperature(&mut self) -> Option<f32>;
}

/// Digital input port for the mode button.
pub trait ButtonPort {
    /// `true` while the button is physically held down.
    fn read_button(&mut self) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Actuator port (driven adapter: domain → hardware)
// ───────────────────────────────────────────────────────────────

/// Write-side port: the domain calls this to command actuators.
pub trait ActuatorPort {
    /// Drive buzzer, fan relay and valve to `targets`.
    ///
    /// Called every tick with the full target set.  Repeated identical
    /// calls must be safe.  Physical failure is not reported.
    fn apply(&mut self, targets: &ActuatorTargets);

    /// Blocking beep pattern: `times` pulses of `duration_ms` on and off.
    fn beep(&mut self, times: u8, duration_ms: u32);
}

// ───────────────────────────────────────────────────────────────
// Transport port (driven adapter: domain ↔ broker)
// ───────────────────────────────────────────────────────────────

/// Maximum inbound topic length kept by the transport.
pub const INBOUND_TOPIC_LEN: usize = 64;
/// Maximum inbound payload length kept by the transport.
pub const INBOUND_PAYLOAD_LEN: usize = 64;

/// One message received on a subscribed topic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub topic: heapless::String<INBOUND_TOPIC_LEN>,
    pub payload: heapless::Vec<u8, INBOUND_PAYLOAD_LEN>,
}

impl InboundMessage {
    /// Build a message, or `None` if either part exceeds its capacity.
    pub fn new(topic: &str, payload: &[u8]) -> Option<Self> {
        let mut t = heapless::String::new();
        t.push_str(topic).ok()?;
        let p = heapless::Vec::from_slice(payload).ok()?;
        Some(Self {
            topic: t,
            payload: p,
        })
    }
}

/// Publish/subscribe link to the dashboard broker.
///
/// Inbound messages are queued by the adapter and drained synchronously
/// by the control loop, so commands never run concurrently with a tick.
pub trait TransportPort {
    fn is_connected(&self) -> bool;

    /// One connection attempt.  The caller rate-limits retries.
    fn connect(&mut self) -> Result<(), TransportError>;

    fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), TransportError>;

    fn subscribe(&mut self, topic: &str) -> Result<(), TransportError>;

    /// Next queued inbound message, if any.
    fn poll_inbound(&mut self) -> Option<InboundMessage>;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go (serial log, test
/// recorder, etc.).
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Configuration port (driven adapter: domain ↔ persistent config)
// ───────────────────────────────────────────────────────────────

/// Loads and persists system configuration.
///
/// Implementations MUST validate config values before persisting.
/// Invalid ranges are rejected with [`ConfigError::ValidationFailed`],
/// not silently clamped.
pub trait ConfigPort {
    /// Load configuration from persistent storage.
    /// Returns [`SystemConfig::default()`] if no stored config exists.
    fn load(&self) -> Result<SystemConfig, ConfigError>;

    /// Validate and persist configuration.
    fn save(&self, config: &SystemConfig) -> Result<(), ConfigError>;
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`TransportPort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportError {
    /// Operation needs a live connection.
    NotConnected,
    ConnectFailed,
    PublishFailed,
    SubscribeFailed,
}

/// Errors from [`ConfigPort`] operations.
#[derive(Debug)]
pub enum ConfigError {
    /// No config found in storage (first boot).
    NotFound,
    /// Stored config failed integrity / deserialization check.
    Corrupted,
    /// A config field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
    /// Underlying storage is full.
    StorageFull,
    /// Generic I/O error from the storage backend.
    IoError,
}

impl core::fmt::Display for TransportError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotConnected => write!(f, "not connected"),
            Self::ConnectFailed => write!(f, "connect failed"),
            Self::PublishFailed => write!(f, "publish failed"),
            Self::SubscribeFailed => write!(f, "subscribe failed"),
        }
    }
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "config not found"),
            Self::Corrupted => write!(f, "config corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
            Self::StorageFull => write!(f, "storage full"),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}
