//! On/off GPIO outputs: buzzer and fan relay.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: drives the real GPIO via hw_init.
//! On host/test: tracks state in-memory only.

use crate::drivers::hw_init;

pub struct SwitchedOutput {
    name: &'static str,
    gpio: i32,
    on: bool,
}

impl SwitchedOutput {
    /// Wrap an already-configured output pin.  Starts off.
    pub fn new(name: &'static str, gpio: i32) -> Self {
        Self {
            name,
            gpio,
            on: false,
        }
    }

    /// Drive the pin.  Always writes, so a glitched pin is corrected on
    /// the next tick.  Returns `true` if the logical state changed.
    pub fn set(&mut self, on: bool) -> bool {
        hw_init::gpio_write(self.gpio, on);
        let changed = self.on != on;
        if changed {
            log::debug!("{}: {}", self.name, if on { "on" } else { "off" });
        }
        self.on = on;
        changed
    }

    pub fn is_on(&self) -> bool {
        self.on
    }

    pub fn gpio(&self) -> i32 {
        self.gpio
    }
}
