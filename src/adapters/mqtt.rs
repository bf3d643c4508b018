//! MQTT transport adapter.
//!
//! Implements [`TransportPort`] for the dashboard broker link.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: `EspMqttClient` from esp-idf-svc.  The
//!   client runs its own task; its event callback only flips atomics and
//!   queues inbound messages into [`LinkShared`].
//! - **all other targets**: an in-process simulated broker that records
//!   publishes and lets tests inject inbound messages or connect failures.
//!
//! ## Session model
//!
//! ```text
//!  callback: Connected ──▶ connected=1, session_pending=1
//!  connect()           ──▶ connected ? clear session_pending : ConnectFailed
//!  is_connected()      ==  connected && !session_pending
//! ```
//!
//! `connect()` never waits for the broker.  The ESP-IDF client handshakes
//! and reconnects on its own task; the control loop only claims whatever
//! session exists at the time of its (cooldown-limited) attempt.  A session
//! re-established behind our back stays "pending" until that claim, so the
//! loop always gets the chance to resubscribe and announce itself.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use log::{debug, info, warn};

use crate::app::ports::{InboundMessage, TransportError, TransportPort};

#[cfg(target_os = "espidf")]
use esp_idf_svc::mqtt::client::{
    EspMqttClient, EventPayload, MqttClientConfiguration, QoS,
};

/// Inbound messages buffered between control ticks.
pub const INBOX_DEPTH: usize = 8;

/// Broker password, provided at build time.
#[cfg(target_os = "espidf")]
const MQTT_PASSWORD: Option<&str> = option_env!("GASGUARD_MQTT_PASSWORD");

// ───────────────────────────────────────────────────────────────
// Shared link state
// ───────────────────────────────────────────────────────────────

/// State shared between the client task and the control loop.
#[derive(Default)]
pub struct LinkShared {
    connected: AtomicBool,
    session_pending: AtomicBool,
    inbox: Mutex<heapless::Deque<InboundMessage, INBOX_DEPTH>>,
}

impl LinkShared {
    fn on_connected(&self) {
        self.session_pending.store(true, Ordering::Release);
        self.connected.store(true, Ordering::Release);
    }

    fn on_disconnected(&self) {
        self.connected.store(false, Ordering::Release);
    }

    /// Queue an inbound message.  Returns `false` if it was dropped.
    fn enqueue(&self, topic: &str, data: &[u8]) -> bool {
        let Some(msg) = InboundMessage::new(topic, data) else {
            debug!("MQTT: oversized message on {} dropped", topic);
            return false;
        };
        let mut inbox = self.inbox.lock().unwrap_or_else(PoisonError::into_inner);
        if inbox.push_back(msg).is_err() {
            warn!("MQTT: inbox full, dropping message on {}", topic);
            return false;
        }
        true
    }

    fn dequeue(&self) -> Option<InboundMessage> {
        self.inbox
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
    }

    /// Take ownership of the current session, if the client has one.
    fn claim_session(&self) -> Result<(), TransportError> {
        if !self.connected.load(Ordering::Acquire) {
            return Err(TransportError::ConnectFailed);
        }
        self.session_pending.store(false, Ordering::Release);
        Ok(())
    }

    fn is_live(&self) -> bool {
        self.connected.load(Ordering::Acquire) && !self.session_pending.load(Ordering::Acquire)
    }
}

// ───────────────────────────────────────────────────────────────
// MqttAdapter
// ───────────────────────────────────────────────────────────────

pub struct MqttAdapter {
    url: heapless::String<96>,
    username: heapless::String<32>,
    shared: Arc<LinkShared>,

    // ── ESP-IDF fields ──────────────────────────────────────────
    #[cfg(target_os = "espidf")]
    client: Option<EspMqttClient<'static>>,

    // ── Simulation fields ───────────────────────────────────────
    #[cfg(not(target_os = "espidf"))]
    sim_failing_connects: u32,
    #[cfg(not(target_os = "espidf"))]
    sim_published: Vec<(String, Vec<u8>)>,
    #[cfg(not(target_os = "espidf"))]
    sim_subscriptions: Vec<String>,
}

impl MqttAdapter {
    /// No network activity happens until the first `connect()`.
    pub fn new(url: &heapless::String<96>, username: &heapless::String<32>) -> Self {
        Self {
            url: url.clone(),
            username: username.clone(),
            shared: Arc::new(LinkShared::default()),
            #[cfg(target_os = "espidf")]
            client: None,
            #[cfg(not(target_os = "espidf"))]
            sim_failing_connects: 0,
            #[cfg(not(target_os = "espidf"))]
            sim_published: Vec::new(),
            #[cfg(not(target_os = "espidf"))]
            sim_subscriptions: Vec::new(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    #[cfg(target_os = "espidf")]
    fn start_client(&mut self) -> Result<(), TransportError> {
        // SAFETY: esp_random reads the hardware RNG and has no preconditions.
        let suffix = unsafe { esp_idf_svc::sys::esp_random() } & 0xFFFF;
        let client_id = format!("ESP32-GasDetector-{:x}", suffix);
        let conf = MqttClientConfiguration {
            client_id: Some(client_id.as_str()),
            username: Some(self.username.as_str()).filter(|u| !u.is_empty()),
            password: MQTT_PASSWORD,
            ..Default::default()
        };

        let shared = Arc::clone(&self.shared);
        let client = EspMqttClient::new_cb(&self.url, &conf, move |event| {
            match event.payload() {
                EventPayload::Connected(_) => shared.on_connected(),
                EventPayload::Disconnected => shared.on_disconnected(),
                EventPayload::Received {
                    topic: Some(topic),
                    data,
                    ..
                } => {
                    shared.enqueue(topic, data);
                }
                EventPayload::Error(e) => warn!("MQTT: client error {:?}", e),
                _ => {}
            }
        })
        .map_err(|e| {
            warn!("MQTT: client start failed: {:?}", e);
            TransportError::ConnectFailed
        })?;

        info!("MQTT: client {} started for {}", client_id, self.url);
        self.client = Some(client);
        Ok(())
    }
}

#[cfg(target_os = "espidf")]
impl TransportPort for MqttAdapter {
    fn is_connected(&self) -> bool {
        self.client.is_some() && self.shared.is_live()
    }

    fn connect(&mut self) -> Result<(), TransportError> {
        if self.client.is_none() {
            // The handshake completes on the client task; a later attempt
            // claims the session.
            self.start_client()?;
        }
        self.shared.claim_session()
    }

    fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), TransportError> {
        if !self.shared.is_live() {
            return Err(TransportError::NotConnected);
        }
        let client = self.client.as_mut().ok_or(TransportError::NotConnected)?;
        client
            .publish(topic, QoS::AtMostOnce, false, payload)
            .map(|_| ())
            .map_err(|e| {
                debug!("MQTT: publish to {} failed: {:?}", topic, e);
                TransportError::PublishFailed
            })
    }

    fn subscribe(&mut self, topic: &str) -> Result<(), TransportError> {
        let client = self.client.as_mut().ok_or(TransportError::NotConnected)?;
        client
            .subscribe(topic, QoS::AtLeastOnce)
            .map(|_| ())
            .map_err(|e| {
                debug!("MQTT: subscribe to {} failed: {:?}", topic, e);
                TransportError::SubscribeFailed
            })
    }

    fn poll_inbound(&mut self) -> Option<InboundMessage> {
        self.shared.dequeue()
    }
}

// ── Simulation ────────────────────────────────────────────────

#[cfg(not(target_os = "espidf"))]
impl MqttAdapter {
    /// Make the next `n` connection attempts fail.
    pub fn sim_fail_connects(&mut self, n: u32) {
        self.sim_failing_connects = n;
    }

    /// Broker went away.
    pub fn sim_drop_connection(&mut self) {
        self.shared.on_disconnected();
    }

    /// The client re-established a session by itself.
    pub fn sim_auto_reconnect(&mut self) {
        self.shared.on_connected();
    }

    /// Deliver a message as the broker would.  Only subscribed topics
    /// reach the inbox.
    pub fn sim_inject(&mut self, topic: &str, payload: &[u8]) -> bool {
        if !self.sim_subscriptions.iter().any(|t| t == topic) {
            return false;
        }
        self.shared.enqueue(topic, payload)
    }

    pub fn published(&self) -> &[(String, Vec<u8>)] {
        &self.sim_published
    }

    pub fn subscriptions(&self) -> &[String] {
        &self.sim_subscriptions
    }
}

#[cfg(not(target_os = "espidf"))]
impl TransportPort for MqttAdapter {
    fn is_connected(&self) -> bool {
        self.shared.is_live()
    }

    fn connect(&mut self) -> Result<(), TransportError> {
        if self.sim_failing_connects > 0 {
            self.sim_failing_connects -= 1;
            return Err(TransportError::ConnectFailed);
        }
        // A new session starts without subscriptions.
        self.sim_subscriptions.clear();
        self.shared.on_connected();
        info!("MQTT: simulated session to {}", self.url);
        self.shared.claim_session()
    }

    fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), TransportError> {
        if !self.shared.is_live() {
            return Err(TransportError::NotConnected);
        }
        self.sim_published.push((topic.to_string(), payload.to_vec()));
        Ok(())
    }

    fn subscribe(&mut self, topic: &str) -> Result<(), TransportError> {
        if !self.shared.connected.load(Ordering::Acquire) {
            return Err(TransportError::NotConnected);
        }
        self.sim_subscriptions.push(topic.to_string());
        Ok(())
    }

    fn poll_inbound(&mut self) -> Option<InboundMessage> {
        self.shared.dequeue()
    }
}
