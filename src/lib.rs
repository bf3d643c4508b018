//! GasGuard firmware library.
//!
//! Exposes the pure-logic modules for integration testing and external
//! inspection.  All ESP-IDF-specific code is guarded by
//! `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod app;
pub mod config;
pub mod fsm;
pub mod safety;
pub mod scheduler;
pub mod telemetry;
pub mod thresholds;

pub mod error;
pub mod pins;

// Hardware-facing modules; host builds get the simulation stubs.
pub mod adapters;
pub mod drivers;
pub mod sensors;
