//! Sampling cycle: the alert-coordination core.
//!
//! [`Sampler`] owns the sensors and the indicator lights, holds references
//! to the shared alarm, event logger, and status board, and runs one
//! cycle per sample interval:
//!
//! ```text
//!  read climate ─┐
//!                ├─▶ SensorSnapshot ─▶ classify ─┬─ Err ─▶ keep previous level
//!  read air  ────┘                               └─ Ok(level)
//!                                                     ├─▶ indicator.apply(level)
//!                                                     ├─▶ Red: alarm.start() + log record
//!                                                     └─▶ else: alarm.stop()
//!  publish StatusReport ◀─────────────────────────────────────────┘
//! ```
//!
//! The level is "unknown" (all lights dark) until the first successful
//! classification.  A failed sensor read only blanks that sensor's fields.

use core::time::Duration;

use log::{debug, info};

use crate::classifier::{AlertClassifier, AlertLevel};
use crate::config::SystemConfig;
use crate::event_log::{EventLogPolicy, EventLogger, LogRecord};
use crate::status::{SensorSnapshot, StatusBoard, StatusReport};

use super::events::{AppEvent, SensorKind};
use super::ports::{AirQualityPort, AlarmPort, ClimatePort, ClockPort, EventSink, IndicatorPort};

// ───────────────────────────────────────────────────────────────
// Sampler
// ───────────────────────────────────────────────────────────────

pub struct Sampler<'a, S, I, A, K, E> {
    sensors: S,
    indicator: I,
    alarm: &'a A,
    logger: &'a EventLogger,
    board: &'a StatusBoard,
    clock: K,
    events: E,
    classifier: AlertClassifier,
    policy: EventLogPolicy,
    interval: Duration,
    level: Option<AlertLevel>,
    cycle: u64,
}

impl<'a, S, I, A, K, E> Sampler<'a, S, I, A, K, E>
where
    S: ClimatePort + AirQualityPort,
    I: IndicatorPort,
    A: AlarmPort,
    K: ClockPort,
    E: EventSink,
{
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: &SystemConfig,
        sensors: S,
        indicator: I,
        alarm: &'a A,
        logger: &'a EventLogger,
        board: &'a StatusBoard,
        clock: K,
        events: E,
    ) -> Self {
        Self {
            sensors,
            indicator,
            alarm,
            logger,
            board,
            clock,
            events,
            classifier: AlertClassifier::new(config.thresholds),
            policy: config.event_log_policy,
            interval: Duration::from_millis(config.sample_interval_ms as u64),
            level: None,
            cycle: 0,
        }
    }

    /// Level in force, `None` until the first successful classification.
    pub fn level(&self) -> Option<AlertLevel> {
        self.level
    }

    pub fn indicator(&self) -> &I {
        &self.indicator
    }

    pub fn events(&self) -> &E {
        &self.events
    }

    /// Dark lights, unknown level.  Called once before the first cycle.
    pub fn begin(&mut self) {
        self.indicator.all_off();
        self.events.emit(&AppEvent::Started);
        info!("SAMPLER: started, interval={}ms", self.interval.as_millis());
    }

    /// One full cycle.  Returns the level in force afterwards.
    pub fn run_cycle(&mut self) -> Option<AlertLevel> {
        let captured_at = self.clock.now();

        let climate = match self.sensors.read_climate() {
            Ok(reading) => Some(reading),
            Err(error) => {
                self.events.emit(&AppEvent::SensorReadFailed {
                    sensor: SensorKind::Climate,
                    error,
                });
                None
            }
        };
        let air = match self.sensors.read_air_quality() {
            Ok(reading) => Some(reading),
            Err(error) => {
                self.events.emit(&AppEvent::SensorReadFailed {
                    sensor: SensorKind::AirQuality,
                    error,
                });
                None
            }
        };

        let snapshot = SensorSnapshot::from_readings(climate, air, captured_at);
        if snapshot.air_quality_warming {
            self.events.emit(&AppEvent::AirQualityWarmingUp);
        }

        match self.classifier.classify(&snapshot) {
            Ok(level) => self.apply_level(level, &snapshot),
            Err(error) => self.events.emit(&AppEvent::ReadingRetained {
                error,
                level: self.level,
            }),
        }

        self.cycle += 1;
        self.board.publish(StatusReport {
            snapshot: Some(snapshot),
            level: self.level,
            cycle: self.cycle,
            alarm_active: self.alarm.is_active(),
            alarm_silenced: self.alarm.is_silenced(),
            dropped_records: self.logger.dropped(),
            clock_synced: self.clock.is_synced(),
        });
        debug!("SAMPLER: cycle {} done, level={:?}", self.cycle, self.level);

        self.level
    }

    fn apply_level(&mut self, level: AlertLevel, snapshot: &SensorSnapshot) {
        let previous = self.level;
        self.indicator.apply(level);

        if level == AlertLevel::Red {
            let was_active = self.alarm.is_active();
            self.alarm.start();
            if !was_active {
                self.events.emit(&AppEvent::AlarmStarted);
            }

            let entering = previous != Some(AlertLevel::Red);
            if entering || self.policy == EventLogPolicy::EveryCycle {
                match self.logger.append(LogRecord::from_snapshot(snapshot)) {
                    Ok(()) => self.events.emit(&AppEvent::RecordQueued),
                    Err(e) => self.events.emit(&AppEvent::RecordDropped(e)),
                }
            }
        } else {
            let was_active = self.alarm.is_active();
            self.alarm.stop();
            if was_active {
                self.events.emit(&AppEvent::AlarmStopped);
            }
        }

        if previous != Some(level) {
            self.events.emit(&AppEvent::LevelChanged { from: previous, to: level });
        }
        self.level = Some(level);
    }

    /// Cooperative loop: one cycle, then yield to the executor for the
    /// sample interval.  Never returns.
    pub async fn run(&mut self) {
        self.begin();
        loop {
            self.run_cycle();
            async_io_mini::Timer::after(self.interval).await;
        }
    }
}
