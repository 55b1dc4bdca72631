//! Sensor snapshot and the published status board.
//!
//! The sampler is the only writer.  Each cycle it builds a fresh, immutable
//! [`StatusReport`] and swaps it in behind an `Arc`; readers (the status
//! page, diagnostics) clone the `Arc` and therefore always see one whole
//! cycle, never a mix of old and new fields.
//!
//! ```text
//!  Sampler ──publish(Arc<StatusReport>)──▶ StatusBoard ──current_status()──▶ page task
//! ```

use std::sync::{Arc, RwLock};

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::app::ports::{AirQualityReading, ClimateReading};
use crate::classifier::AlertLevel;

// ---------------------------------------------------------------------------
// Sensor snapshot
// ---------------------------------------------------------------------------

/// Readings from one sampling cycle.  `None` means the read failed.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct SensorSnapshot {
    /// Air temperature (°C).
    pub temperature_c: Option<f32>,
    /// Relative humidity (%).
    pub humidity_pct: Option<f32>,
    /// Barometric pressure (hPa).
    pub pressure_hpa: Option<f32>,
    /// CO2-equivalent concentration (ppm).
    pub co2_ppm: Option<u16>,
    /// Total volatile organic compounds (ppb).
    pub tvoc_ppb: Option<u16>,
    /// The air-quality sensor is still reporting its 400 ppm / 0 ppb
    /// start-up baseline.
    pub air_quality_warming: bool,
    /// Wall-clock time the cycle started.
    pub captured_at: NaiveDateTime,
}

impl SensorSnapshot {
    /// Assemble a snapshot from independent, possibly failed, reads.
    pub fn from_readings(
        climate: Option<ClimateReading>,
        air: Option<AirQualityReading>,
        captured_at: NaiveDateTime,
    ) -> Self {
        Self {
            temperature_c: climate.map(|c| c.temperature_c),
            humidity_pct: climate.map(|c| c.humidity_pct),
            pressure_hpa: climate.map(|c| c.pressure_hpa),
            co2_ppm: air.map(|a| a.co2_ppm),
            tvoc_ppb: air.map(|a| a.tvoc_ppb),
            air_quality_warming: air.is_some_and(|a| a.is_warming_up()),
            captured_at,
        }
    }
}

// ---------------------------------------------------------------------------
// Published status
// ---------------------------------------------------------------------------

/// What the network page sees: the latest snapshot and the level in force.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct StatusReport {
    /// `None` until the first cycle completes.
    pub snapshot: Option<SensorSnapshot>,
    /// `None` until the first successful classification.
    pub level: Option<AlertLevel>,
    /// Sampling cycles completed since boot.
    pub cycle: u64,
    /// The audible alarm is active.
    pub alarm_active: bool,
    /// The audible alarm was silenced by the override button.
    pub alarm_silenced: bool,
    /// Event-log records dropped since boot.
    pub dropped_records: u32,
    /// Snapshot and record timestamps come from a synchronised clock.
    pub clock_synced: bool,
}

/// Single-writer, multi-reader holder of the latest [`StatusReport`].
#[derive(Debug, Default)]
pub struct StatusBoard {
    current: RwLock<Arc<StatusReport>>,
}

impl StatusBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the published report.  The lock is held only for the
    /// pointer swap.
    pub fn publish(&self, report: StatusReport) {
        let next = Arc::new(report);
        match self.current.write() {
            Ok(mut slot) => *slot = next,
            Err(poisoned) => *poisoned.into_inner() = next,
        }
    }

    /// Latest report.  Never blocks on the sampler beyond the swap.
    pub fn current_status(&self) -> Arc<StatusReport> {
        match self.current.read() {
            Ok(slot) => Arc::clone(&slot),
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }
}
