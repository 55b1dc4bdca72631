//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the ESP-IDF logger (which goes to UART / USB-CDC in production), one
//! `TAG | key=value` line per event.

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the serial console.
#[derive(Debug, Default)]
pub struct LogEventSink {
    emitted: u64,
}

impl LogEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Events logged since construction.
    pub fn emitted(&self) -> u64 {
        self.emitted
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        self.emitted += 1;
        match event {
            AppEvent::Started => {
                info!("START | level=unknown");
            }
            AppEvent::LevelChanged { from, to } => {
                info!(
                    "LEVEL | {} -> {}",
                    from.map_or("unknown", |l| l.name()),
                    to.name()
                );
            }
            AppEvent::SensorReadFailed { sensor, error } => {
                warn!("SENSOR | {:?} read failed: {}", sensor, error);
            }
            AppEvent::ReadingRetained { error, level } => {
                warn!(
                    "SENSOR | {} | level kept={}",
                    error,
                    level.map_or("unknown", |l| l.name())
                );
            }
            AppEvent::AirQualityWarmingUp => {
                info!("SENSOR | air quality warming up (baseline 400ppm/0ppb)");
            }
            AppEvent::AlarmStarted => {
                info!("ALARM | started");
            }
            AppEvent::AlarmStopped => {
                info!("ALARM | stopped");
            }
            AppEvent::RecordQueued => {
                info!("EVLOG | record queued");
            }
            AppEvent::RecordDropped(e) => {
                warn!("EVLOG | record dropped: {}", e);
            }
        }
    }
}
