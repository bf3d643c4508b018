//! Fuzz target: inbound broker messages
//!
//! Splits the input into a topic and a payload, pushes it through the
//! transport's bounded message type and the command decoder.  Only the
//! four exact command strings on the command topic may decode.
//!
//! cargo fuzz run fuzz_command_decode

#![no_main]

use gasguard::app::commands::RemoteCommand;
use gasguard::app::ports::InboundMessage;
use gasguard::telemetry::topics;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let split = data.iter().position(|b| *b == 0).unwrap_or(data.len());
    let Ok(topic) = core::str::from_utf8(&data[..split]) else {
        return;
    };
    let payload = data.get(split + 1..).unwrap_or(&[]);

    let Some(msg) = InboundMessage::new(topic, payload) else {
        return;
    };
    if let Some(cmd) = RemoteCommand::decode(&msg.topic, &msg.payload) {
        assert_eq!(msg.topic.as_str(), topics::COMMANDS);
        let expected: &[u8] = match cmd {
            RemoteCommand::EmergencyStop => b"emergency_stop",
            RemoteCommand::ToggleMode => b"toggle_mode",
            RemoteCommand::ValveOpen => b"valve_open",
            RemoteCommand::ValveClose => b"valve_close",
        };
        assert_eq!(msg.payload.as_slice(), expected);
    }
});
