//! End-to-end scenarios: sampler + real alarm controller + override
//! signal + event logger, with mocked sensors, lamps, and buzzer.

use std::time::Duration;

use airwatch::alarm::{AlarmController, BeepPattern};
use airwatch::app::events::{AppEvent, SensorKind};
use airwatch::app::sampler::Sampler;
use airwatch::classifier::AlertLevel;
use airwatch::config::SystemConfig;
use airwatch::drivers::button::OverrideSignal;
use airwatch::drivers::buzzer::BuzzerDriver;
use airwatch::drivers::indicator::IndicatorDriver;
use airwatch::error::{ClassifyError, SensorError};
use airwatch::event_log::{EventLogPolicy, EventLogger, LogRecord};
use airwatch::status::StatusBoard;

use super::mock_hw::{
    EventLog, FixedClock, Lamps, MemorySink, MockPin, RecordingPwm, ScriptedSensors, leak_state,
    wait_until,
};

const PATTERN: BeepPattern = BeepPattern {
    on: Duration::from_millis(5),
    off: Duration::from_millis(15),
};
const SETTLE: Duration = Duration::from_millis(500);

type TestSampler<'a> = Sampler<
    'a,
    ScriptedSensors,
    IndicatorDriver<MockPin, MockPin, MockPin>,
    AlarmController<RecordingPwm>,
    FixedClock,
    EventLog,
>;

struct Rig {
    sensors: ScriptedSensors,
    lamps: Lamps,
    pwm: RecordingPwm,
    events: EventLog,
    alarm: AlarmController<RecordingPwm>,
    logger: EventLogger,
    board: StatusBoard,
}

impl Rig {
    fn new(temperature_c: f32, co2_ppm: u16, tvoc_ppb: u16) -> Self {
        let pwm = RecordingPwm::new();
        Self {
            sensors: ScriptedSensors::new(temperature_c, co2_ppm, tvoc_ppb),
            lamps: Lamps::default(),
            alarm: AlarmController::new(leak_state(), BuzzerDriver::new(pwm.clone(), 50), PATTERN),
            pwm,
            events: EventLog::default(),
            logger: EventLogger::new(),
            board: StatusBoard::new(),
        }
    }

    fn sampler(&self, config: &SystemConfig) -> TestSampler<'_> {
        let mut s = Sampler::new(
            config,
            self.sensors.clone(),
            IndicatorDriver::new(
                self.lamps.green.clone(),
                self.lamps.yellow.clone(),
                self.lamps.red.clone(),
            ),
            &self.alarm,
            &self.logger,
            &self.board,
            FixedClock::default(),
            self.events.clone(),
        );
        s.begin();
        s
    }
}

#[test]
fn red_then_override_then_green() {
    let rig = Rig::new(25.0, 300, 200);
    let config = SystemConfig::default();
    let mut sampler = rig.sampler(&config);
    let button = OverrideSignal::new(rig.alarm.state());

    // {25 °C, 300, 200} → Red, alarm sounding.
    assert_eq!(sampler.run_cycle(), Some(AlertLevel::Red));
    assert_eq!(rig.lamps.lit(), (false, false, true));
    assert!(rig.alarm.state().is_active());
    assert!(wait_until(SETTLE, || rig.pwm.on_writes() >= 1));

    // Override → silenced within one period; light stays Red.
    assert!(button.on_edge());
    assert!(wait_until(SETTLE, || !rig.alarm.is_task_running()));
    assert!(!rig.pwm.is_on());
    assert!(rig.alarm.state().is_silenced());
    assert_eq!(rig.lamps.lit(), (false, false, true));

    // Another Red cycle keeps the silence.
    let on_before = rig.pwm.on_writes();
    assert_eq!(sampler.run_cycle(), Some(AlertLevel::Red));
    std::thread::sleep(PATTERN.period() * 3);
    assert_eq!(rig.pwm.on_writes(), on_before);
    assert!(rig.board.current_status().alarm_silenced);

    // {20 °C, 300, 200} → Green, alarm inactive, silence reset.
    rig.sensors.set(20.0, 300, 200);
    assert_eq!(sampler.run_cycle(), Some(AlertLevel::Green));
    assert_eq!(rig.lamps.lit(), (true, false, false));
    assert!(!rig.alarm.state().is_active());
    assert!(!rig.alarm.state().is_silenced());

    let status = rig.board.current_status();
    assert_eq!(status.level, Some(AlertLevel::Green));
    assert!(!status.alarm_active);
    assert!(!status.alarm_silenced);
    assert_eq!(status.cycle, 3);
    rig.alarm.shutdown();
}

#[test]
fn next_red_episode_is_audible_again() {
    let rig = Rig::new(25.0, 300, 200);
    let config = SystemConfig::default();
    let mut sampler = rig.sampler(&config);

    sampler.run_cycle();
    assert!(rig.alarm.request_silence());
    rig.sensors.set(20.0, 300, 200);
    sampler.run_cycle();
    assert!(wait_until(SETTLE, || !rig.alarm.is_task_running()));

    let before = rig.pwm.on_writes();
    rig.sensors.set(25.0, 300, 200);
    sampler.run_cycle();
    assert!(wait_until(SETTLE, || rig.pwm.on_writes() > before));
    rig.alarm.shutdown();
}

#[test]
fn air_quality_failure_classifies_on_temperature() {
    let rig = Rig::new(20.0, 300, 200);
    let config = SystemConfig::default();
    let mut sampler = rig.sampler(&config);
    rig.sensors.fail_air(SensorError::CrcMismatch);

    assert_eq!(sampler.run_cycle(), Some(AlertLevel::Green));
    let snap = rig.board.current_status().snapshot.unwrap();
    assert_eq!(snap.co2_ppm, None);
    assert_eq!(snap.tvoc_ppb, None);
    assert_eq!(snap.temperature_c, Some(20.0));
    assert!(rig.events.events().contains(&AppEvent::SensorReadFailed {
        sensor: SensorKind::AirQuality,
        error: SensorError::CrcMismatch,
    }));

    // Temperature alone can still raise Red.
    rig.sensors.set(25.0, 0, 0);
    rig.sensors.fail_air(SensorError::BusFailed);
    assert_eq!(sampler.run_cycle(), Some(AlertLevel::Red));
    rig.alarm.shutdown();
}

#[test]
fn climate_failure_retains_level_and_lights() {
    let rig = Rig::new(25.0, 300, 200);
    let config = SystemConfig::default();
    let mut sampler = rig.sampler(&config);
    sampler.run_cycle();

    rig.sensors.fail_climate(SensorError::BusFailed);
    assert_eq!(sampler.run_cycle(), Some(AlertLevel::Red));
    assert_eq!(rig.lamps.lit(), (false, false, true));
    assert!(rig.alarm.state().is_active());
    assert_eq!(
        rig.events.count(&AppEvent::ReadingRetained {
            error: ClassifyError::IncompleteReading,
            level: Some(AlertLevel::Red),
        }),
        1
    );
    rig.alarm.shutdown();
}

#[test]
fn red_entry_record_reaches_sink_and_reparses() {
    let rig = Rig::new(25.0, 650, 120);
    let config = SystemConfig::default();
    let mut sampler = rig.sampler(&config);

    sampler.run_cycle();
    sampler.run_cycle();
    rig.alarm.shutdown();

    let mut sink = MemorySink::default();
    assert_eq!(rig.logger.drain_into(&mut sink), 1, "one record per entry into Red");
    let record = LogRecord::parse_csv_line(&sink.lines[0]).unwrap();
    assert_eq!(record.temperature_c, Some(25.0));
    assert_eq!(record.pressure_hpa, Some(1008.5));
    assert_eq!(record.humidity_pct, Some(45.0));
    assert_eq!(record.co2_ppm, Some(650));
    assert_eq!(record.tvoc_ppb, Some(120));
    assert_eq!(record.timestamp, FixedClock::default().0);
    assert!(sink.lines[0].ends_with(",2024-05-17 14:30:00\n"));
}

#[test]
fn every_cycle_policy_and_dropped_counter() {
    let rig = Rig::new(25.0, 300, 200);
    let config = SystemConfig {
        event_log_policy: EventLogPolicy::EveryCycle,
        ..SystemConfig::default()
    };
    let mut sampler = rig.sampler(&config);

    for _ in 0..3 {
        sampler.run_cycle();
    }
    rig.alarm.shutdown();

    let mut sink = MemorySink {
        fail: true,
        ..MemorySink::default()
    };
    assert_eq!(rig.logger.drain_into(&mut sink), 3);
    assert_eq!(rig.logger.dropped(), 3);
    assert_eq!(rig.logger.written(), 0);

    // The next published report carries the counter.
    sampler.run_cycle();
    assert_eq!(rig.board.current_status().dropped_records, 3);
    rig.alarm.shutdown();
}

#[test]
fn warmup_baseline_is_logged_without_air_fields() {
    let rig = Rig::new(25.0, 400, 0);
    let config = SystemConfig::default();
    let mut sampler = rig.sampler(&config);

    assert_eq!(sampler.run_cycle(), Some(AlertLevel::Red));
    rig.alarm.shutdown();
    assert_eq!(rig.events.count(&AppEvent::AirQualityWarmingUp), 1);

    let mut sink = MemorySink::default();
    rig.logger.drain_into(&mut sink);
    let record = LogRecord::parse_csv_line(&sink.lines[0]).unwrap();
    assert_eq!(record.co2_ppm, None);
    assert_eq!(record.tvoc_ppb, None);
}
