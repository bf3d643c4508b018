//! DHT11 temperature sensor (single-wire, bit-banged).
//!
//! ## Protocol
//!
//! ```text
//!  host  ‾‾\____18ms____/‾‾ release
//!  dht               \_80us_/‾80us‾\  then 40 bits:
//!  bit               \_50us_/‾‾26us‾‾\        → 0
//!                    \_50us_/‾‾‾‾70us‾‾‾‾\    → 1
//! ```
//!
//! Frame: humidity int, humidity dec, temp int, temp dec, checksum.
//! Only temperature is used.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: drives the open-drain data pin and times pulses with the
//! high-resolution timer.
//! On host/test: reads from a static `AtomicU32` (f32 bits) for injection.

#[cfg(not(target_os = "espidf"))]
use core::sync::atomic::{AtomicU32, Ordering};

use log::debug;

use crate::error::SensorError;

/// `u32::MAX` is a NaN pattern we never store for a real value.
#[cfg(not(target_os = "espidf"))]
const SIM_NO_RESPONSE: u32 = u32::MAX;

#[cfg(not(target_os = "espidf"))]
static SIM_TEMP_BITS: AtomicU32 = AtomicU32::new(0x41C8_0000); // 25.0

/// Inject the next reading; `None` simulates a sensor that does not answer.
#[cfg(not(target_os = "espidf"))]
pub fn sim_set_temperature(celsius: Option<f32>) {
    let bits = celsius.map_or(SIM_NO_RESPONSE, f32::to_bits);
    SIM_TEMP_BITS.store(bits, Ordering::Relaxed);
}

/// High pulses longer than this are a `1` bit.
const ONE_BIT_THRESHOLD_US: u32 = 40;

/// Assemble 40 measured high-pulse widths into the 5-byte frame.
pub fn pulses_to_frame(high_us: &[u32; 40]) -> [u8; 5] {
    let mut frame = [0u8; 5];
    for (i, &width) in high_us.iter().enumerate() {
        if width > ONE_BIT_THRESHOLD_US {
            frame[i / 8] |= 0x80 >> (i % 8);
        }
    }
    frame
}

/// Validate the checksum and extract the temperature in °C.
pub fn decode_frame(frame: [u8; 5]) -> Result<f32, SensorError> {
    let sum = frame[..4]
        .iter()
        .fold(0u8, |acc, b| acc.wrapping_add(*b));
    if sum != frame[4] {
        return Err(SensorError::ChecksumMismatch);
    }
    let magnitude = f32::from(frame[2]) + f32::from(frame[3] & 0x7F) * 0.1;
    if frame[3] & 0x80 != 0 {
        Ok(-magnitude)
    } else {
        Ok(magnitude)
    }
}

pub struct TemperatureSensor {
    gpio: i32,
    last_error: Option<SensorError>,
}

impl TemperatureSensor {
    pub fn new(gpio: i32) -> Self {
        Self {
            gpio,
            last_error: None,
        }
    }

    /// One reading, or `None` on any protocol failure.
    pub fn read(&mut self) -> Option<f32> {
        match self.read_raw() {
            Ok(t) => {
                self.last_error = None;
                Some(t)
            }
            Err(e) => {
                if self.last_error != Some(e) {
                    debug!("DHT11 on GPIO {}: {}", self.gpio, e);
                }
                self.last_error = Some(e);
                None
            }
        }
    }

    pub fn last_error(&self) -> Option<SensorError> {
        self.last_error
    }

    #[cfg(not(target_os = "espidf"))]
    fn read_raw(&self) -> Result<f32, SensorError> {
        match SIM_TEMP_BITS.load(Ordering::Relaxed) {
            SIM_NO_RESPONSE => Err(SensorError::NoResponse),
            bits => Ok(f32::from_bits(bits)),
        }
    }

    #[cfg(target_os = "espidf")]
    fn read_raw(&self) -> Result<f32, SensorError> {
        use crate::drivers::hw_init::gpio_write;
        use esp_idf_svc::hal::delay::{Ets, FreeRtos};

        // Start signal: hold low >= 18 ms, then release.
        gpio_write(self.gpio, false);
        FreeRtos::delay_ms(20);
        gpio_write(self.gpio, true);
        Ets::delay_us(30);

        // Response: 80 us low, 80 us high, then the first bit's low phase.
        self.wait_level(false, 100)?;
        self.wait_level(true, 100)?;
        self.wait_level(false, 100)?;

        let mut high_us = [0u32; 40];
        for width in &mut high_us {
            self.wait_level(true, 80)?;
            *width = self.wait_level(false, 100)?;
        }
        decode_frame(pulses_to_frame(&high_us))
    }

    /// Busy-wait until the line reaches `high`.  Returns the time waited.
    #[cfg(target_os = "espidf")]
    fn wait_level(&self, high: bool, timeout_us: u32) -> Result<u32, SensorError> {
        use crate::drivers::hw_init::gpio_read;
        // SAFETY: esp_timer_get_time is a read of the free-running system timer.
        let start = unsafe { esp_idf_svc::sys::esp_timer_get_time() };
        loop {
            let elapsed = (unsafe { esp_idf_svc::sys::esp_timer_get_time() } - start) as u32;
            if gpio_read(self.gpio) == high {
                return Ok(elapsed);
            }
            if elapsed > timeout_us {
                return Err(SensorError::NoResponse);
            }
        }
    }
}
