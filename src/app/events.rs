//! Outbound application events.
//!
//! The [`Sampler`](super::sampler::Sampler) emits these through the
//! [`EventSink`](super::ports::EventSink) port.  Adapters on the other
//! side decide what to do with them.

use crate::classifier::AlertLevel;
use crate::error::{ClassifyError, LogWriteError, SensorError};

/// Which sensor a read failure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorKind {
    Climate,
    AirQuality,
}

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// The sampler started; the level is unknown until the first reading.
    Started,

    /// The classified level changed.  `from` is `None` on the first
    /// successful classification.
    LevelChanged {
        from: Option<AlertLevel>,
        to: AlertLevel,
    },

    /// A sensor read failed; the matching snapshot fields are absent.
    SensorReadFailed { sensor: SensorKind, error: SensorError },

    /// The snapshot could not be classified; the previous level stays.
    ReadingRetained {
        error: ClassifyError,
        level: Option<AlertLevel>,
    },

    /// The air-quality sensor is still on its start-up baseline.
    AirQualityWarmingUp,

    /// The audible alarm was (re)armed by a Red classification.
    AlarmStarted,

    /// The audible alarm was disarmed by a non-Red classification.
    AlarmStopped,

    /// An out-of-range record was handed to the event logger.
    RecordQueued,

    /// An out-of-range record could not be queued.
    RecordDropped(LogWriteError),
}
