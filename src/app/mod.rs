//! Application core: pure domain logic, zero I/O.
//!
//! This module contains the control loop of the GasGuard system: input
//! supervision, threshold recomputation, safety state machine dispatch,
//! telemetry and remote command handling.  All interaction with hardware
//! and the broker happens through **port traits** defined in [`ports`],
//! keeping this layer fully testable without real peripherals.

pub mod commands;
pub mod events;
pub mod ports;
pub mod service;
