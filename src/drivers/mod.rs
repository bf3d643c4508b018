//! Actuator drivers, input debouncing, and hardware initialisation.

pub mod button;
pub mod hw_init;
pub mod switch;
pub mod valve;
