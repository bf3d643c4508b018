//! Inbound commands to the application service.
//!
//! Raw broker messages are decoded exactly once, here, at the transport
//! boundary.  Everything past this point sees only [`RemoteCommand`].

use crate::telemetry::topics;

/// Commands the dashboard can send on the command topic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteCommand {
    /// Close the valve and sound the alarm now, whatever the reading.
    EmergencyStop,
    /// Switch between cooking and non-cooking mode.
    ToggleMode,
    /// Manual override (only honoured when enabled in config).
    ValveOpen,
    ValveClose,
}

impl RemoteCommand {
    /// Decode a message.  Only exact, case-sensitive payloads on the
    /// command topic are recognised; anything else is `None`.
    pub fn decode(topic: &str, payload: &[u8]) -> Option<Self> {
        if topic != topics::COMMANDS {
            return None;
        }
        match payload {
            b"emergency_stop" => Some(Self::EmergencyStop),
            b"toggle_mode" => Some(Self::ToggleMode),
            b"valve_open" => Some(Self::ValveOpen),
            b"valve_close" => Some(Self::ValveClose),
            _ => None,
        }
    }
}
