//! AirWatch firmware library.
//!
//! Exposes the pure-logic modules for integration testing and external
//! inspection. All ESP-IDF-specific code is guarded by
//! `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod alarm;
pub mod app;
pub mod classifier;
pub mod config;
pub mod error;
pub mod event_log;
pub mod pins;
pub mod status;

pub mod adapters;
pub mod drivers;
pub mod sensors;
