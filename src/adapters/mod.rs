//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter    | Implements     | Connects to                 |
//! |------------|----------------|-----------------------------|
//! | `hardware` | SensorPort     | MQ-2 on ADC2, DHT11 on GPIO |
//! |            | ButtonPort     | Mode button GPIO            |
//! |            | ActuatorPort   | Buzzer, fan relay, servo    |
//! | `log_sink` | EventSink      | Serial log output           |
//! | `mqtt`     | TransportPort  | ESP-IDF MQTT client         |
//! | `nvs`      | ConfigPort     | NVS / in-memory store       |
//! | `time`     | (clock)        | ESP32 system timer          |

pub mod hardware;
pub mod log_sink;
pub mod mqtt;
pub mod nvs;
pub mod time;
