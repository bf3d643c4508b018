//! Input plausibility supervisor.
//!
//! Runs on every fresh sensor snapshot **before** thresholds are computed
//! and the state machine is evaluated.  It never stops the loop: an
//! implausible input is replaced by the last known-good value and a bit
//! is set in the sensor-fault mask.
//!
//! ## Fault lifecycle
//!
//! 1. A read fails or falls outside its plausible window.
//! 2. The supervisor sets the fault bit (logged once on onset) and keeps
//!    returning the last good value.
//! 3. The next plausible read replaces the held value and clears the bit.

use serde::{Deserialize, Serialize};

use crate::config::SystemConfig;
use crate::error::SensorFault;
use crate::fsm::context::{GasLevel, SensorSnapshot};
use log::{error, info};

/// What to do with gas readings outside the ADC range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GasReadingPolicy {
    /// Every reading is used as-is.
    #[default]
    Trust,
    /// Readings outside `[0, gas_max_raw]` are replaced by the last
    /// in-range reading.
    RejectOutOfRange,
}

/// A snapshot the rest of the loop may rely on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValidatedReading {
    pub gas: GasLevel,
    /// Always the last known-good value, never an invalid read.
    pub temperature_c: f32,
}

/// Input supervisor.
pub struct SafetySupervisor {
    temp_valid_min_c: f32,
    temp_valid_max_c: f32,
    gas_policy: GasReadingPolicy,
    gas_max_raw: GasLevel,
    last_good_temp_c: f32,
    last_good_gas: GasLevel,
    /// Sensor fault bitmask.
    faults: u8,
}

impl SafetySupervisor {
    pub fn new(config: &SystemConfig) -> Self {
        Self {
            temp_valid_min_c: config.temp_valid_min_c,
            temp_valid_max_c: config.temp_valid_max_c,
            gas_policy: config.gas_policy,
            gas_max_raw: config.gas_max_raw,
            last_good_temp_c: config.initial_temperature_c,
            last_good_gas: 0,
            faults: 0,
        }
    }

    /// Validate a raw snapshot, substituting held values where needed.
    pub fn evaluate(&mut self, snap: &SensorSnapshot) -> ValidatedReading {
        // ── Temperature ───────────────────────────────────────────
        let temp = snap.temperature_c.filter(|t| self.temperature_plausible(*t));
        self.eval_fault(SensorFault::TemperatureInvalid, temp.is_none());
        if let Some(t) = temp {
            self.last_good_temp_c = t;
        }

        // ── Gas ───────────────────────────────────────────────────
        match self.gas_policy {
            GasReadingPolicy::Trust => self.last_good_gas = snap.gas_raw,
            GasReadingPolicy::RejectOutOfRange => {
                let in_range = (0..=self.gas_max_raw).contains(&snap.gas_raw);
                self.eval_fault(SensorFault::GasOutOfRange, !in_range);
                if in_range {
                    self.last_good_gas = snap.gas_raw;
                }
            }
        }

        ValidatedReading {
            gas: self.last_good_gas,
            temperature_c: self.last_good_temp_c,
        }
    }

    /// Last accepted temperature.
    pub fn temperature_c(&self) -> f32 {
        self.last_good_temp_c
    }

    /// Current fault bitmask.
    pub fn faults(&self) -> u8 {
        self.faults
    }

    /// Check if a specific fault is active.
    pub fn has_fault(&self, fault: SensorFault) -> bool {
        self.faults & fault.mask() != 0
    }

    // ── Internal ──────────────────────────────────────────────────

    /// Strictly inside the valid window; NaN never passes.
    fn temperature_plausible(&self, t: f32) -> bool {
        t > self.temp_valid_min_c && t < self.temp_valid_max_c
    }

    /// Set or clear a fault bit based on a boolean condition.
    fn eval_fault(&mut self, fault: SensorFault, condition: bool) {
        if condition {
            if self.faults & fault.mask() == 0 {
                error!("SENSOR FAULT SET: {fault}");
            }
            self.faults |= fault.mask();
        } else {
            if self.faults & fault.mask() != 0 {
                info!("SENSOR FAULT CLEARED: {fault}");
            }
            self.faults &= !fault.mask();
        }
    }
}
