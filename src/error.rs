//! Unified error types for the AirWatch firmware.
//!
//! One `Error` enum that every subsystem converts into, so the sampler and
//! the boot path handle failures uniformly.  All variants are `Copy`; none
//! of them is fatal to the process.  Each one maps to a documented
//! degradation:
//!
//! | Variant          | Decision point          | Degradation                     |
//! |------------------|-------------------------|---------------------------------|
//! | `Sensor`         | `SensorHub`             | field left absent, cycle goes on |
//! | `Classify`       | `Sampler::run_cycle`    | previous alert level retained   |
//! | `LogWrite`       | `EventLogger`           | record counted and dropped      |
//! | `Alarm`          | alarm task              | task exits, buzzer forced off   |

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible operation in the firmware funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A sensor could not be read.
    Sensor(SensorError),
    /// The classifier could not produce a level from the snapshot.
    Classify(ClassifyError),
    /// An event-log record could not be persisted.
    LogWrite(LogWriteError),
    /// The alarm task hit an unrecoverable output fault.
    Alarm(AlarmFault),
    /// A communication subsystem failed.
    Comms(CommsError),
    /// Peripheral initialisation failed.
    Init(&'static str),
    /// Configuration is invalid or could not be loaded.
    Config(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sensor(e) => write!(f, "sensor: {e}"),
            Self::Classify(e) => write!(f, "classify: {e}"),
            Self::LogWrite(e) => write!(f, "event log: {e}"),
            Self::Alarm(e) => write!(f, "alarm: {e}"),
            Self::Comms(e) => write!(f, "comms: {e}"),
            Self::Init(msg) => write!(f, "init: {msg}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Sensor errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    /// The I2C transaction failed or timed out.
    BusFailed,
    /// The device skipped the channel, so no value is available.
    NoData,
    /// A data word failed its CRC check.
    CrcMismatch,
    /// The device has not been initialised yet.
    NotInitialised,
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BusFailed => write!(f, "I2C transaction failed"),
            Self::NoData => write!(f, "no data for channel"),
            Self::CrcMismatch => write!(f, "CRC mismatch"),
            Self::NotInitialised => write!(f, "sensor not initialised"),
        }
    }
}

impl From<SensorError> for Error {
    fn from(e: SensorError) -> Self {
        Self::Sensor(e)
    }
}

// ---------------------------------------------------------------------------
// Classifier errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassifyError {
    /// The snapshot has no temperature; no level can be derived.
    IncompleteReading,
}

impl fmt::Display for ClassifyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IncompleteReading => write!(f, "incomplete reading (temperature absent)"),
        }
    }
}

impl From<ClassifyError> for Error {
    fn from(e: ClassifyError) -> Self {
        Self::Classify(e)
    }
}

// ---------------------------------------------------------------------------
// Event-log errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogWriteError {
    /// The bounded record queue was full when the sampler appended.
    QueueFull,
    /// The log file could not be opened in append mode.
    Open,
    /// Writing or flushing the record failed.
    Io,
}

impl fmt::Display for LogWriteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::QueueFull => write!(f, "record queue full"),
            Self::Open => write!(f, "log file open failed"),
            Self::Io => write!(f, "log write failed"),
        }
    }
}

impl From<LogWriteError> for Error {
    fn from(e: LogWriteError) -> Self {
        Self::LogWrite(e)
    }
}

// ---------------------------------------------------------------------------
// Alarm task faults
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlarmFault {
    /// Setting the buzzer PWM duty failed.
    BuzzerWriteFailed,
    /// The alarm thread could not be spawned.
    SpawnFailed,
}

impl fmt::Display for AlarmFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BuzzerWriteFailed => write!(f, "buzzer write failed"),
            Self::SpawnFailed => write!(f, "alarm task spawn failed"),
        }
    }
}

impl From<AlarmFault> for Error {
    fn from(e: AlarmFault) -> Self {
        Self::Alarm(e)
    }
}

// ---------------------------------------------------------------------------
// Communications errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommsError {
    WifiConnectFailed,
    SocketBindFailed,
}

impl fmt::Display for CommsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WifiConnectFailed => write!(f, "WiFi connect failed"),
            Self::SocketBindFailed => write!(f, "status socket bind failed"),
        }
    }
}

impl From<CommsError> for Error {
    fn from(e: CommsError) -> Self {
        Self::Comms(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
