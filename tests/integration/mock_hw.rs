//! Mock hardware for integration tests.
//!
//! Records every buzzer duty write (with the writing thread) and every
//! lamp level so tests can assert on the full history without touching
//! real GPIO/LEDC registers.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::ThreadId;
use std::time::{Duration, Instant};

use airwatch::alarm::AlarmState;
use airwatch::app::events::AppEvent;
use airwatch::app::ports::{
    AirQualityPort, AirQualityReading, ClimatePort, ClimateReading, ClockPort, EventSink,
    RecordSink,
};
use airwatch::error::{LogWriteError, SensorError};
use airwatch::event_log::LogRecord;
use chrono::{NaiveDate, NaiveDateTime};
use embedded_hal::digital::OutputPin;
use embedded_hal::pwm::SetDutyCycle;

// ── Buzzer PWM ────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
pub struct DutyWrite {
    pub duty: u16,
    pub thread: ThreadId,
    pub at: Instant,
}

/// PWM channel that logs every duty write.  Clones share the log.
#[derive(Clone, Default)]
pub struct RecordingPwm {
    writes: Arc<Mutex<Vec<DutyWrite>>>,
    fail: Arc<AtomicBool>,
}

#[allow(dead_code)]
impl RecordingPwm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn writes(&self) -> Vec<DutyWrite> {
        self.writes.lock().unwrap().clone()
    }

    pub fn on_writes(&self) -> usize {
        self.writes().iter().filter(|w| w.duty > 0).count()
    }

    /// Level of the last successful write; off if none.
    pub fn is_on(&self) -> bool {
        self.writes().last().is_some_and(|w| w.duty > 0)
    }

    pub fn writer_threads(&self) -> Vec<ThreadId> {
        let mut ids: Vec<ThreadId> = Vec::new();
        for w in self.writes() {
            if !ids.contains(&w.thread) {
                ids.push(w.thread);
            }
        }
        ids
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }
}

impl embedded_hal::pwm::ErrorType for RecordingPwm {
    type Error = embedded_hal::pwm::ErrorKind;
}

impl SetDutyCycle for RecordingPwm {
    fn max_duty_cycle(&self) -> u16 {
        255
    }

    fn set_duty_cycle(&mut self, duty: u16) -> Result<(), Self::Error> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(embedded_hal::pwm::ErrorKind::Other);
        }
        self.writes.lock().unwrap().push(DutyWrite {
            duty,
            thread: std::thread::current().id(),
            at: Instant::now(),
        });
        Ok(())
    }
}

// ── Lamp pins ─────────────────────────────────────────────────

#[derive(Clone, Default)]
pub struct MockPin(Rc<RefCell<bool>>);

impl MockPin {
    pub fn is_high(&self) -> bool {
        *self.0.borrow()
    }
}

impl embedded_hal::digital::ErrorType for MockPin {
    type Error = core::convert::Infallible;
}

impl OutputPin for MockPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        *self.0.borrow_mut() = false;
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        *self.0.borrow_mut() = true;
        Ok(())
    }
}

/// Green / yellow / red.
#[derive(Clone, Default)]
pub struct Lamps {
    pub green: MockPin,
    pub yellow: MockPin,
    pub red: MockPin,
}

impl Lamps {
    pub fn lit(&self) -> (bool, bool, bool) {
        (self.green.is_high(), self.yellow.is_high(), self.red.is_high())
    }
}

// ── Sensors ───────────────────────────────────────────────────

pub struct Readings {
    pub climate: Result<ClimateReading, SensorError>,
    pub air: Result<AirQualityReading, SensorError>,
}

/// Sensor pair whose next readings the test scripts through a shared
/// handle while the sampler owns the sensors.
#[derive(Clone)]
pub struct ScriptedSensors(Rc<RefCell<Readings>>);

#[allow(dead_code)]
impl ScriptedSensors {
    pub fn new(temperature_c: f32, co2_ppm: u16, tvoc_ppb: u16) -> Self {
        let s = Self(Rc::new(RefCell::new(Readings {
            climate: Err(SensorError::NotInitialised),
            air: Err(SensorError::NotInitialised),
        })));
        s.set(temperature_c, co2_ppm, tvoc_ppb);
        s
    }

    pub fn set(&self, temperature_c: f32, co2_ppm: u16, tvoc_ppb: u16) {
        let mut r = self.0.borrow_mut();
        r.climate = Ok(ClimateReading {
            temperature_c,
            humidity_pct: 45.0,
            pressure_hpa: 1008.5,
        });
        r.air = Ok(AirQualityReading { co2_ppm, tvoc_ppb });
    }

    pub fn fail_air(&self, error: SensorError) {
        self.0.borrow_mut().air = Err(error);
    }

    pub fn fail_climate(&self, error: SensorError) {
        self.0.borrow_mut().climate = Err(error);
    }
}

impl ClimatePort for ScriptedSensors {
    fn read_climate(&mut self) -> Result<ClimateReading, SensorError> {
        self.0.borrow().climate
    }
}

impl AirQualityPort for ScriptedSensors {
    fn read_air_quality(&mut self) -> Result<AirQualityReading, SensorError> {
        self.0.borrow().air
    }
}

// ── Clock, events, records ────────────────────────────────────

pub struct FixedClock(pub NaiveDateTime);

impl Default for FixedClock {
    fn default() -> Self {
        Self(
            NaiveDate::from_ymd_opt(2024, 5, 17)
                .and_then(|d| d.and_hms_opt(14, 30, 0))
                .unwrap(),
        )
    }
}

impl ClockPort for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}

#[derive(Clone, Default)]
pub struct EventLog(Rc<RefCell<Vec<AppEvent>>>);

#[allow(dead_code)]
impl EventLog {
    pub fn events(&self) -> Vec<AppEvent> {
        self.0.borrow().clone()
    }

    pub fn count(&self, event: &AppEvent) -> usize {
        self.0.borrow().iter().filter(|e| *e == event).count()
    }
}

impl EventSink for EventLog {
    fn emit(&mut self, event: &AppEvent) {
        self.0.borrow_mut().push(event.clone());
    }
}

/// In-memory record sink.  Stores the encoded CSV lines.
#[derive(Default)]
pub struct MemorySink {
    pub lines: Vec<String>,
    pub fail: bool,
}

impl RecordSink for MemorySink {
    fn append(&mut self, record: &LogRecord) -> Result<(), LogWriteError> {
        if self.fail {
            return Err(LogWriteError::Io);
        }
        let line = record.to_csv_line()?;
        self.lines
            .push(String::from_utf8(line).map_err(|_| LogWriteError::Io)?);
        Ok(())
    }
}

// ── Helpers ───────────────────────────────────────────────────

pub fn leak_state() -> &'static AlarmState {
    Box::leak(Box::new(AlarmState::new()))
}

/// Poll `cond` every millisecond until it holds or `timeout` passes.
pub fn wait_until(timeout: Duration, mut cond: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if cond() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(1));
    }
    cond()
}
