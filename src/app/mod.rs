//! Application core: pure domain logic, zero I/O.
//!
//! This module contains the business rules for the AirWatch node: the
//! sampling cycle that turns readings into an alert level and drives the
//! indicators, the alarm, and the event log.  All interaction with hardware
//! happens through **port traits** defined in [`ports`], keeping this layer
//! fully testable without real peripherals.

pub mod events;
pub mod ports;
pub mod sampler;
