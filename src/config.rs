//! System configuration parameters
//!
//! All tunable parameters for the GasGuard system.
//! Values can be overridden via NVS (non-volatile storage).

use serde::{Deserialize, Serialize};

use crate::app::ports::ConfigError;
use crate::safety::GasReadingPolicy;
use crate::thresholds::{BaseThresholds, CompensationPolicy, Threshold};

/// Core system configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemConfig {
    // --- Gas thresholds (raw ADC counts, before compensation) ---
    /// Non-cooking alarm threshold.
    pub safe_threshold: Threshold,
    /// Cooking-mode warning band lower edge.
    pub warning_threshold: Threshold,
    /// Cooking-mode danger band lower edge.
    pub danger_threshold: Threshold,

    // --- Temperature compensation ---
    pub compensation: CompensationPolicy,
    /// Above this temperature the hot factor applies (exclusive).
    pub hot_cutoff_c: f32,
    /// Below this temperature the cold factor applies (exclusive).
    pub cold_cutoff_c: f32,
    pub hot_factor: f32,
    pub cold_factor: f32,
    /// Temperature reads must lie strictly inside this window to be accepted.
    pub temp_valid_min_c: f32,
    pub temp_valid_max_c: f32,
    /// Value used until the first valid temperature read arrives.
    pub initial_temperature_c: f32,

    // --- Gas reading policy ---
    pub gas_policy: GasReadingPolicy,
    /// Full-scale raw reading (12-bit ADC).
    pub gas_max_raw: i32,

    // --- Safety policy ---
    /// Dwell before the valve closes in non-cooking mode (milliseconds).
    pub valve_close_delay_ms: u32,
    /// Drop back to non-cooking mode when the cooking danger band is hit.
    pub cooking_danger_forces_non_cooking: bool,
    /// Accept `valve_open` / `valve_close` remote commands.
    pub manual_valve_override: bool,

    // --- Input ---
    /// Minimum interval between accepted button toggles (milliseconds).
    pub button_debounce_ms: u32,

    // --- Timing ---
    /// Sensor read interval (milliseconds)
    pub sensor_read_interval_ms: u32,
    /// Telemetry publish interval (milliseconds)
    pub telemetry_interval_ms: u32,
    /// Minimum gap between broker connection attempts (milliseconds)
    pub reconnect_cooldown_ms: u32,
    /// Control loop interval (milliseconds)
    pub control_loop_interval_ms: u32,

    // --- Network ---
    pub mqtt_url: heapless::String<96>,
    pub mqtt_username: heapless::String<32>,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            // Thresholds
            safe_threshold: 1000,
            warning_threshold: 1000,
            danger_threshold: 3000,

            // Temperature compensation
            compensation: CompensationPolicy::default(),
            hot_cutoff_c: 35.0,
            cold_cutoff_c: 15.0,
            hot_factor: 1.5,
            cold_factor: 0.7,
            temp_valid_min_c: 0.0,
            temp_valid_max_c: 80.0,
            initial_temperature_c: 25.0,

            // Gas
            gas_policy: GasReadingPolicy::default(),
            gas_max_raw: 4095,

            // Safety
            valve_close_delay_ms: 2000,
            cooking_danger_forces_non_cooking: false,
            manual_valve_override: false,

            // Input
            button_debounce_ms: 300,

            // Timing
            sensor_read_interval_ms: 1000,
            telemetry_interval_ms: 1000,
            reconnect_cooldown_ms: 5000,
            control_loop_interval_ms: 50,

            // Network
            mqtt_url: fixed_str("mqtt://gasguard.local:1883"),
            mqtt_username: fixed_str("esp32_client"),
        }
    }
}

impl SystemConfig {
    /// Base (uncompensated) thresholds for every tier.
    pub fn base_thresholds(&self) -> BaseThresholds {
        BaseThresholds {
            safe: self.safe_threshold,
            warning: self.warning_threshold,
            danger: self.danger_threshold,
        }
    }

    /// Range-check every field.  Invalid values are rejected, never clamped.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.safe_threshold <= 0 || self.warning_threshold <= 0 {
            return Err(ConfigError::ValidationFailed("thresholds must be positive"));
        }
        if self.safe_threshold > self.warning_threshold {
            return Err(ConfigError::ValidationFailed(
                "safe_threshold must be <= warning_threshold",
            ));
        }
        if self.warning_threshold >= self.danger_threshold {
            return Err(ConfigError::ValidationFailed(
                "warning_threshold must be < danger_threshold",
            ));
        }
        if !(0.25..=4.0).contains(&self.hot_factor) || !(0.25..=4.0).contains(&self.cold_factor) {
            return Err(ConfigError::ValidationFailed(
                "compensation factors must be 0.25–4.0",
            ));
        }
        if self.cold_cutoff_c >= self.hot_cutoff_c {
            return Err(ConfigError::ValidationFailed(
                "cold_cutoff_c must be < hot_cutoff_c",
            ));
        }
        if self.temp_valid_min_c >= self.temp_valid_max_c {
            return Err(ConfigError::ValidationFailed(
                "temp_valid_min_c must be < temp_valid_max_c",
            ));
        }
        if self.gas_max_raw <= 0 {
            return Err(ConfigError::ValidationFailed("gas_max_raw must be positive"));
        }
        if self.sensor_read_interval_ms == 0
            || self.telemetry_interval_ms == 0
            || self.control_loop_interval_ms == 0
        {
            return Err(ConfigError::ValidationFailed("periods must be non-zero"));
        }
        if self.reconnect_cooldown_ms < 1000 {
            return Err(ConfigError::ValidationFailed(
                "reconnect_cooldown_ms must be >= 1000",
            ));
        }
        if self.valve_close_delay_ms > 60_000 {
            return Err(ConfigError::ValidationFailed(
                "valve_close_delay_ms must be <= 60000",
            ));
        }
        Ok(())
    }
}

/// Copy as much of `s` as fits into a fixed-capacity string.
fn fixed_str<const N: usize>(s: &str) -> heapless::String<N> {
    let mut out = heapless::String::new();
    for c in s.chars() {
        if out.push(c).is_err() {
            break;
        }
    }
    out
}
