//! Mock adapters for integration tests.
//!
//! Records every actuator, broker and sink call so tests can assert on the
//! full history without touching real GPIO/PWM registers or a network.

#![allow(dead_code)]

use std::collections::VecDeque;

use gasguard::app::events::AppEvent;
use gasguard::app::ports::{
    ActuatorPort, ButtonPort, EventSink, InboundMessage, SensorPort, TransportError,
    TransportPort,
};
use gasguard::fsm::context::{ActuatorTargets, GasLevel};
use gasguard::telemetry::topics;

// ── MockHardware ──────────────────────────────────────────────

/// Scripted sensors and button, recorded actuator writes.
pub struct MockHardware {
    pub gas: GasLevel,
    pub temperature: Option<f32>,
    pub button_down: bool,
    pub applied: Vec<ActuatorTargets>,
    pub beeps: Vec<(u8, u32)>,
    pub gas_reads: u32,
}

impl MockHardware {
    pub fn new() -> Self {
        Self {
            gas: 0,
            temperature: Some(25.0),
            button_down: false,
            applied: Vec::new(),
            beeps: Vec::new(),
            gas_reads: 0,
        }
    }

    /// The outputs as they physically stand now.
    pub fn outputs(&self) -> ActuatorTargets {
        self.applied
            .last()
            .copied()
            .unwrap_or(ActuatorTargets::idle())
    }

    pub fn valve_open(&self) -> bool {
        self.outputs().valve_open
    }
}

impl Default for MockHardware {
    fn default() -> Self {
        Self::new()
    }
}

impl SensorPort for MockHardware {
    fn read_gas(&mut self) -> GasLevel {
        self.gas_reads += 1;
        self.gas
    }

    fn read_temperature(&mut self) -> Option<f32> {
        self.temperature
    }
}

impl ButtonPort for MockHardware {
    fn read_button(&mut self) -> bool {
        self.button_down
    }
}

impl ActuatorPort for MockHardware {
    fn apply(&mut self, targets: &ActuatorTargets) {
        self.applied.push(*targets);
    }

    fn beep(&mut self, times: u8, duration_ms: u32) {
        self.beeps.push((times, duration_ms));
    }
}

// ── MockTransport ─────────────────────────────────────────────

/// In-memory broker link.
pub struct MockTransport {
    pub connected: bool,
    /// Remaining connection attempts that will fail.
    pub failing_connects: u32,
    pub connect_attempts: u32,
    pub published: Vec<(String, Vec<u8>)>,
    pub subscriptions: Vec<String>,
    pub inbox: VecDeque<InboundMessage>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self {
            connected: false,
            failing_connects: 0,
            connect_attempts: 0,
            published: Vec::new(),
            subscriptions: Vec::new(),
            inbox: VecDeque::new(),
        }
    }

    /// Queue a message on the command topic.
    pub fn command(&mut self, payload: &str) {
        self.deliver(topics::COMMANDS, payload);
    }

    pub fn deliver(&mut self, topic: &str, payload: &str) {
        let msg = InboundMessage::new(topic, payload.as_bytes()).expect("message fits");
        self.inbox.push_back(msg);
    }

    /// Payloads published on `topic`, oldest first.
    pub fn payloads(&self, topic: &str) -> Vec<String> {
        self.published
            .iter()
            .filter(|(t, _)| t == topic)
            .map(|(_, p)| String::from_utf8(p.clone()).expect("utf-8 payload"))
            .collect()
    }

    /// Alert texts published on the alert topic, oldest first.
    pub fn alert_texts(&self) -> Vec<String> {
        self.payloads(topics::ALERTS)
            .iter()
            .map(|p| {
                let v: serde_json::Value = serde_json::from_str(p).expect("alert json");
                v["alert"].as_str().expect("alert field").to_string()
            })
            .collect()
    }

    /// Latest telemetry record, parsed.
    pub fn last_telemetry(&self) -> Option<serde_json::Value> {
        self.payloads(topics::TELEMETRY)
            .last()
            .map(|p| serde_json::from_str(p).expect("telemetry json"))
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl TransportPort for MockTransport {
    fn is_connected(&self) -> bool {
        self.connected
    }

    fn connect(&mut self) -> Result<(), TransportError> {
        self.connect_attempts += 1;
        if self.failing_connects > 0 {
            self.failing_connects -= 1;
            return Err(TransportError::ConnectFailed);
        }
        self.connected = true;
        Ok(())
    }

    fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), TransportError> {
        if !self.connected {
            return Err(TransportError::NotConnected);
        }
        self.published.push((topic.to_string(), payload.to_vec()));
        Ok(())
    }

    fn subscribe(&mut self, topic: &str) -> Result<(), TransportError> {
        self.subscriptions.push(topic.to_string());
        Ok(())
    }

    fn poll_inbound(&mut self) -> Option<InboundMessage> {
        self.inbox.pop_front()
    }
}

// ── RecordingSink ─────────────────────────────────────────────

pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn alert_texts(&self) -> Vec<&'static str> {
        self.events
            .iter()
            .filter_map(|e| match e {
                AppEvent::Alert(a) => Some(a.alert),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, pred: impl Fn(&AppEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }
}

impl Default for RecordingSink {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}
