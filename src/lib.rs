//! Dual-axis linear-motor controller: host command routing, motor
//! lifecycle sequencing, and Modbus RTU gateway bridging for two
//! downstream drives.

pub mod config;
pub mod controller;
pub mod gateway;
pub mod host;
pub mod io;
pub mod motor;
pub mod router;
pub mod transport;

pub use controller::{Controller, ControllerError, VERSION};
