//! Hardware adapter: bridges real peripherals to domain port traits.
//!
//! Owns the [`SensorHub`], the mode button and all actuator drivers,
//! exposing them through [`SensorPort`], [`ButtonPort`] and
//! [`ActuatorPort`].  This is the only module in the system that touches
//! actual hardware.  On non-espidf targets, the underlying drivers use
//! cfg-gated simulation stubs.

use embedded_hal::delay::DelayNs;
use log::debug;

use crate::app::ports::{ActuatorPort, ButtonPort, SensorPort};
use crate::drivers::hw_init;
use crate::drivers::switch::SwitchedOutput;
use crate::drivers::valve::ValveDriver;
use crate::fsm::context::{ActuatorTargets, GasLevel};
use crate::sensors::SensorHub;

/// Time the servo needs to finish a full open/close stroke.
pub const VALVE_SETTLE_MS: u32 = 500;

/// Concrete adapter that combines all hardware behind port traits.
pub struct HardwareAdapter<D: DelayNs> {
    sensor_hub: SensorHub,
    button_gpio: i32,
    buzzer: SwitchedOutput,
    fan: SwitchedOutput,
    valve: ValveDriver,
    delay: D,
    /// Buzzer level requested by the last `apply`, restored after a beep.
    buzzer_target: bool,
}

impl<D: DelayNs> HardwareAdapter<D> {
    pub fn new(
        sensor_hub: SensorHub,
        button_gpio: i32,
        buzzer: SwitchedOutput,
        fan: SwitchedOutput,
        valve: ValveDriver,
        delay: D,
    ) -> Self {
        Self {
            sensor_hub,
            button_gpio,
            buzzer,
            fan,
            valve,
            delay,
            buzzer_target: false,
        }
    }

    pub fn valve(&self) -> &ValveDriver {
        &self.valve
    }

    pub fn is_fan_on(&self) -> bool {
        self.fan.is_on()
    }

    pub fn is_buzzer_on(&self) -> bool {
        self.buzzer.is_on()
    }
}

// ── SensorPort implementation ─────────────────────────────────

impl<D: DelayNs> SensorPort for HardwareAdapter<D> {
    fn read_gas(&mut self) -> GasLevel {
        self.sensor_hub.read_gas()
    }

    fn read_temperature(&mut self) -> Option<f32> {
        self.sensor_hub.read_temperature()
    }
}

// ── ButtonPort implementation ─────────────────────────────────

impl<D: DelayNs> ButtonPort for HardwareAdapter<D> {
    /// The button pulls the pin to ground; the line idles high.
    fn read_button(&mut self) -> bool {
        !hw_init::gpio_read(self.button_gpio)
    }
}

// ── ActuatorPort implementation ───────────────────────────────

impl<D: DelayNs> ActuatorPort for HardwareAdapter<D> {
    fn apply(&mut self, targets: &ActuatorTargets) {
        self.buzzer_target = targets.buzzer_on;
        self.buzzer.set(targets.buzzer_on);
        self.fan.set(targets.fan_on);
        if self.valve.set_open(targets.valve_open) {
            self.delay.delay_ms(VALVE_SETTLE_MS);
        }
    }

    fn beep(&mut self, times: u8, duration_ms: u32) {
        debug!("Beep x{} ({} ms)", times, duration_ms);
        for _ in 0..times {
            self.buzzer.set(true);
            self.delay.delay_ms(duration_ms);
            self.buzzer.set(false);
            self.delay.delay_ms(duration_ms);
        }
        self.buzzer.set(self.buzzer_target);
    }
}
