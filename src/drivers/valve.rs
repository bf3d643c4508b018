//! Gas-supply valve driven by a hobby servo.
//!
//! Two positions only: open (0°) and closed (90°).  There is no position
//! feedback; a stuck valve is not detected here.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: writes the LEDC duty via hw_init.
//! On host/test: tracks state in-memory only.

use log::info;

use crate::drivers::hw_init;
use crate::pins;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValveState {
    Open,
    Closed,
}

pub struct ValveDriver {
    state: ValveState,
}

impl ValveDriver {
    /// The valve is parked open by `hw_init`.
    pub fn new() -> Self {
        Self {
            state: ValveState::Open,
        }
    }

    /// Command the servo.  Returns `true` if the position changed, in
    /// which case the caller owes the mechanism a settle delay.
    pub fn set_open(&mut self, open: bool) -> bool {
        let target = if open {
            ValveState::Open
        } else {
            ValveState::Closed
        };
        let angle = match target {
            ValveState::Open => pins::VALVE_OPEN_DEG,
            ValveState::Closed => pins::VALVE_CLOSED_DEG,
        };
        hw_init::ledc_set(hw_init::LEDC_CH_SERVO, hw_init::servo_duty_for_angle(angle));

        let changed = self.state != target;
        if changed {
            info!("Valve: {:?} -> {:?} ({}°)", self.state, target, angle);
        }
        self.state = target;
        changed
    }

    pub fn state(&self) -> ValveState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.state == ValveState::Open
    }
}

impl Default for ValveDriver {
    fn default() -> Self {
        Self::new()
    }
}
