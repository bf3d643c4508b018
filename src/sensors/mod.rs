//! Sensor subsystem: individual drivers and the aggregating [`SensorHub`].
//!
//! The hub owns both sensor drivers.  It does no plausibility checking;
//! that is the [`SafetySupervisor`](crate::safety::SafetySupervisor)'s job.

pub mod gas;
pub mod temperature;

use crate::fsm::context::{GasLevel, SensorSnapshot};
use gas::GasSensor;
use temperature::TemperatureSensor;

/// Aggregates all sensor drivers.
pub struct SensorHub {
    pub gas: GasSensor,
    pub temperature: TemperatureSensor,
}

impl SensorHub {
    /// Construct a new hub.  Pass in pre-built drivers (built in main
    /// where peripheral ownership is established).
    pub fn new(gas: GasSensor, temperature: TemperatureSensor) -> Self {
        Self { gas, temperature }
    }

    pub fn read_gas(&mut self) -> GasLevel {
        self.gas.read()
    }

    pub fn read_temperature(&mut self) -> Option<f32> {
        self.temperature.read()
    }

    /// Read both sensors at once.
    pub fn read_all(&mut self) -> SensorSnapshot {
        SensorSnapshot {
            gas_raw: self.read_gas(),
            temperature_c: self.read_temperature(),
        }
    }
}
