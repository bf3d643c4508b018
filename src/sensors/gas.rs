//! MQ-2 combustible gas sensor driver.
//!
//! Reads the raw analog output through the ESP32-S3 ADC.  No calibration
//! to ppm is attempted; the safety logic works on raw counts.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: reads ADC2_CH4 via the oneshot API (initialised by hw_init).
//! On host/test: reads from a static `AtomicI32` for injection.

#[cfg(not(target_os = "espidf"))]
use core::sync::atomic::{AtomicI32, Ordering};

use log::warn;

use crate::error::SensorError;
use crate::fsm::context::GasLevel;

#[cfg(not(target_os = "espidf"))]
static SIM_GAS_RAW: AtomicI32 = AtomicI32::new(0);

#[cfg(not(target_os = "espidf"))]
pub fn sim_set_gas_raw(raw: GasLevel) {
    SIM_GAS_RAW.store(raw, Ordering::Relaxed);
}

pub struct GasSensor {
    channel: u32,
    last_raw: GasLevel,
    /// Consecutive ADC failures, for log throttling.
    failures: u32,
}

impl GasSensor {
    pub fn new(channel: u32) -> Self {
        Self {
            channel,
            last_raw: 0,
            failures: 0,
        }
    }

    /// Latest raw reading.  On an ADC error the previous value is returned.
    pub fn read(&mut self) -> GasLevel {
        match self.read_adc() {
            Ok(raw) => {
                self.failures = 0;
                self.last_raw = raw;
            }
            Err(e) => {
                self.failures = self.failures.saturating_add(1);
                if self.failures == 1 {
                    warn!("MQ-2 read failed ({}), holding {}", e, self.last_raw);
                }
            }
        }
        self.last_raw
    }

    pub fn last_raw(&self) -> GasLevel {
        self.last_raw
    }

    #[cfg(target_os = "espidf")]
    fn read_adc(&self) -> Result<GasLevel, SensorError> {
        crate::drivers::hw_init::adc2_read(self.channel).map(GasLevel::from)
    }

    #[cfg(not(target_os = "espidf"))]
    fn read_adc(&self) -> Result<GasLevel, SensorError> {
        let _ = self.channel;
        Ok(SIM_GAS_RAW.load(Ordering::Relaxed))
    }
}
