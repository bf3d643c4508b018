//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the ESP-IDF logger (which goes to UART / USB-CDC in production), so the
//! console mirrors what the dashboard receives even while offline.

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the serial console.
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl Default for LogEventSink {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Telemetry(t) => {
                info!(
                    "TELEM | gas={} threshold={} | T={:.1}\u{00b0}C | mode={} | \
                     valve={:?} fan={} buzzer={}",
                    t.gas,
                    t.threshold,
                    t.temp,
                    t.mode.as_str(),
                    t.valve,
                    if t.fan { "ON" } else { "OFF" },
                    if t.buzzer { "ON" } else { "OFF" },
                );
            }
            AppEvent::Alert(a) => {
                warn!(
                    "ALERT | {} | gas={} T={:.1}\u{00b0}C | t={}ms",
                    a.alert, a.gas_level, a.temp, a.time
                );
            }
            AppEvent::ModeChanged(mode) => {
                info!("MODE  | {}", mode.as_str());
            }
            AppEvent::SensorFaults(0) => {
                info!("FAULT | all cleared");
            }
            AppEvent::SensorFaults(flags) => {
                warn!("FAULT | sensor flags=0b{:08b}", flags);
            }
            AppEvent::Connected => {
                info!("LINK  | broker connected");
            }
            AppEvent::Started(mode) => {
                info!("START | initial_mode={}", mode.as_str());
            }
        }
    }
}
