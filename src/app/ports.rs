//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ Sampler (domain)
//! ```
//!
//! Driven adapters (sensors, indicator lights, alarm, record sink, clock,
//! config storage) implement these traits.  The
//! [`Sampler`](super::sampler::Sampler) consumes them via generics, so the
//! domain core never touches hardware directly.
//!
//! All port errors are typed; callers decide explicitly whether to retain,
//! degrade, or drop.

use chrono::NaiveDateTime;

use crate::classifier::AlertLevel;
use crate::config::SystemConfig;
use crate::error::{LogWriteError, SensorError};
use crate::event_log::LogRecord;

// ───────────────────────────────────────────────────────────────
// Sensor ports (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// One climate measurement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClimateReading {
    pub temperature_c: f32,
    pub humidity_pct: f32,
    pub pressure_hpa: f32,
}

/// One air-quality measurement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AirQualityReading {
    pub co2_ppm: u16,
    pub tvoc_ppb: u16,
}

impl AirQualityReading {
    /// Baseline an SGP30 reports for the first ~15 s after init.
    pub const WARMUP_CO2_PPM: u16 = 400;
    pub const WARMUP_TVOC_PPB: u16 = 0;

    pub fn is_warming_up(&self) -> bool {
        self.co2_ppm == Self::WARMUP_CO2_PPM && self.tvoc_ppb == Self::WARMUP_TVOC_PPB
    }
}

/// Temperature / humidity / pressure source.
pub trait ClimatePort {
    fn read_climate(&mut self) -> Result<ClimateReading, SensorError>;
}

/// CO2-equivalent / TVOC source.
pub trait AirQualityPort {
    fn read_air_quality(&mut self) -> Result<AirQualityReading, SensorError>;
}

// ───────────────────────────────────────────────────────────────
// Actuator ports (driven adapter: domain → hardware)
// ───────────────────────────────────────────────────────────────

/// Tri-colour light stack.
pub trait IndicatorPort {
    /// Light exactly the lamp for `level`; the other two go dark.
    fn apply(&mut self, level: AlertLevel);

    /// All three lamps dark ("unknown" state).
    fn all_off(&mut self);
}

/// Control surface of the audible alarm.
pub trait AlarmPort {
    fn start(&self);
    fn stop(&self);
    fn is_active(&self) -> bool;
    fn is_silenced(&self) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Record sink port (driven adapter: domain → persistent log)
// ───────────────────────────────────────────────────────────────

/// Append-only destination for [`LogRecord`]s.
pub trait RecordSink {
    fn append(&mut self, record: &LogRecord) -> Result<(), LogWriteError>;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Clock port
// ───────────────────────────────────────────────────────────────

/// Wall-clock source used to stamp snapshots and records.
pub trait ClockPort {
    fn now(&self) -> NaiveDateTime;

    /// The wall clock has been set from a time source.  Timestamps taken
    /// before that count from the epoch.
    fn is_synced(&self) -> bool {
        true
    }
}

// ───────────────────────────────────────────────────────────────
// Configuration port (driven adapter: domain ↔ persistent config)
// ───────────────────────────────────────────────────────────────

/// Loads and persists system configuration.
///
/// Implementations MUST call [`SystemConfig::validate`] before persisting.
/// Invalid values are rejected with [`ConfigError::ValidationFailed`], not
/// silently clamped.
pub trait ConfigPort {
    /// Load configuration from persistent storage.
    fn load(&self) -> Result<SystemConfig, ConfigError>;

    /// Validate and persist configuration.
    fn save(&mut self, config: &SystemConfig) -> Result<(), ConfigError>;
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`ConfigPort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// No config found in storage (first boot).
    NotFound,
    /// Stored config failed deserialization.
    Corrupted,
    /// A config field failed range validation.
    ValidationFailed(&'static str),
    /// Generic I/O error from the storage backend.
    IoError,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "config not found"),
            Self::Corrupted => write!(f, "config corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}
