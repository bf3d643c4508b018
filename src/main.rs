//! GasGuard Firmware: Main Entry Point
//!
//! Hexagonal architecture with a single fixed-period control loop.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  HardwareAdapter        LogEventSink   NvsAdapter   Esp32Time  │
//! │  (Sensor+Button+Act.)   (EventSink)    (Config)     (clock)    │
//! │  MqttAdapter                                                   │
//! │  (Transport)                                                   │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │              AppService (pure logic)                   │    │
//! │  │  Supervisor · Thresholds · Safety FSM · Telemetry      │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use anyhow::{Context, Result};
use log::{info, warn};

use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::hal::delay::FreeRtos;
use esp_idf_svc::hal::peripherals::Peripherals;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use esp_idf_svc::wifi::{AuthMethod, BlockingWifi, ClientConfiguration, Configuration, EspWifi};

use gasguard::adapters::hardware::HardwareAdapter;
use gasguard::adapters::log_sink::LogEventSink;
use gasguard::adapters::mqtt::MqttAdapter;
use gasguard::adapters::nvs::NvsAdapter;
use gasguard::adapters::time::Esp32TimeAdapter;
use gasguard::app::ports::ConfigPort;
use gasguard::app::service::AppService;
use gasguard::config::SystemConfig;
use gasguard::drivers::switch::SwitchedOutput;
use gasguard::drivers::valve::ValveDriver;
use gasguard::drivers::hw_init;
use gasguard::pins;
use gasguard::sensors::SensorHub;
use gasguard::sensors::gas::GasSensor;
use gasguard::sensors::temperature::TemperatureSensor;

/// Station credentials, provided at build time.
const WIFI_SSID: &str = match option_env!("GASGUARD_WIFI_SSID") {
    Some(s) => s,
    None => "",
};
const WIFI_PASSWORD: &str = match option_env!("GASGUARD_WIFI_PASSWORD") {
    Some(s) => s,
    None => "",
};

// ── WiFi ──────────────────────────────────────────────────────

fn start_wifi(
    modem: esp_idf_svc::hal::modem::Modem,
    sys_loop: EspSystemEventLoop,
    nvs: EspDefaultNvsPartition,
) -> Result<BlockingWifi<EspWifi<'static>>> {
    let mut wifi = BlockingWifi::wrap(
        EspWifi::new(modem, sys_loop.clone(), Some(nvs))?,
        sys_loop,
    )?;

    let auth_method = if WIFI_PASSWORD.is_empty() {
        AuthMethod::None
    } else {
        AuthMethod::WPA2Personal
    };
    wifi.set_configuration(&Configuration::Client(ClientConfiguration {
        ssid: WIFI_SSID
            .try_into()
            .map_err(|_| anyhow::anyhow!("SSID too long"))?,
        password: WIFI_PASSWORD
            .try_into()
            .map_err(|_| anyhow::anyhow!("password too long"))?,
        auth_method,
        ..Default::default()
    }))?;

    wifi.start()?;
    wifi.connect()?;
    wifi.wait_netif_up()?;
    let ip = wifi.wifi().sta_netif().get_ip_info()?;
    info!("WiFi connected to '{}', IP = {}", WIFI_SSID, ip.ip);
    Ok(wifi)
}

// ── Main ──────────────────────────────────────────────────────

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  GasGuard v{}                        ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Initialise hardware peripherals ────────────────────
    // No sensors or outputs without them; keep retrying until the board is up.
    let attempts = hw_init::init_with_retry(hw_init::init_peripherals, &mut FreeRtos);
    if attempts > 1 {
        info!("HAL init succeeded after {} attempts", attempts);
    }

    // ── 3. Load config from NVS (or defaults) ─────────────────
    let config = match NvsAdapter::new().and_then(|nvs| nvs.load()) {
        Ok(cfg) => cfg,
        Err(e) => {
            warn!("Stored config unusable ({}), using defaults", e);
            SystemConfig::default()
        }
    };
    info!(
        "Config: thresholds {}/{}/{}, compensation {:?}, dwell {} ms",
        config.safe_threshold,
        config.warning_threshold,
        config.danger_threshold,
        config.compensation,
        config.valve_close_delay_ms
    );

    // ── 4. Network ────────────────────────────────────────────
    // The control loop runs with or without a network; a failed bring-up
    // only means alerts stay local.
    let peripherals = Peripherals::take().context("Peripherals::take")?;
    let sys_loop = EspSystemEventLoop::take().context("event loop")?;
    let nvs_part = EspDefaultNvsPartition::take().context("NVS partition")?;
    let _wifi = match start_wifi(peripherals.modem, sys_loop, nvs_part) {
        Ok(w) => Some(w),
        Err(e) => {
            warn!("WiFi bring-up failed ({:#}), running offline", e);
            None
        }
    };

    // ── 5. Construct adapters ─────────────────────────────────
    let sensor_hub = SensorHub::new(
        GasSensor::new(pins::MQ2_ADC_CHANNEL),
        TemperatureSensor::new(pins::DHT11_GPIO),
    );
    let mut hw = HardwareAdapter::new(
        sensor_hub,
        pins::BUTTON_GPIO,
        SwitchedOutput::new("buzzer", pins::BUZZER_GPIO),
        SwitchedOutput::new("fan", pins::FAN_RELAY_GPIO),
        ValveDriver::new(),
        FreeRtos,
    );
    let mut link = MqttAdapter::new(&config.mqtt_url, &config.mqtt_username);
    let mut log_sink = LogEventSink::new();
    let clock = Esp32TimeAdapter::new();

    // ── 6. Construct app service ──────────────────────────────
    let loop_ms = config.control_loop_interval_ms;
    let mut app = AppService::new(config);
    app.start(&mut hw, &mut log_sink);

    info!("System ready. Entering control loop ({} ms).", loop_ms);

    // ── 7. Control loop ───────────────────────────────────────
    loop {
        app.tick(clock.uptime_ms(), &mut hw, &mut link, &mut log_sink);
        FreeRtos::delay_ms(loop_ms);
    }
}
