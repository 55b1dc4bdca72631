//! AirWatch firmware entry point.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  SensorHub (BME280 + SGP30)   IndicatorDriver   SystemClock    │
//! │  NvsConfigStore   LogEventSink   FileRecordSink   StatusServer │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │  Sampler (classify · indicators · alarm · event log)   │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  Threads: main executor (sampler + status page)                │
//! │           alarm task (APP core) · event-log writer (PRO core)  │
//! │  ISRs:    override button → ALARM_STATE · display button       │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use anyhow::Result;
use log::{error, info, warn};

use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::hal::delay::Delay;
use esp_idf_svc::hal::i2c::{I2cConfig, I2cDriver};
use esp_idf_svc::hal::peripherals::Peripherals;
use esp_idf_svc::hal::units::Hertz;
use esp_idf_svc::nvs::EspDefaultNvsPartition;

use airwatch::adapters::csv_file::{self, FileRecordSink};
use airwatch::adapters::log_sink::LogEventSink;
use airwatch::adapters::nvs::NvsConfigStore;
use airwatch::adapters::status_page::{self, StatusServer};
use airwatch::adapters::time::{self, SystemClock};
use airwatch::adapters::wifi::{self, EspStation};
use airwatch::alarm::{ALARM_STATE, AlarmController, BeepPattern};
use airwatch::app::sampler::Sampler;
use airwatch::config::SystemConfig;
use airwatch::drivers::buzzer::BuzzerDriver;
use airwatch::drivers::hw_init::{self, GpioOutput, LedcChannel};
use airwatch::drivers::indicator::IndicatorDriver;
use airwatch::drivers::task_pin::{self, LOG_WRITER_TASK};
use airwatch::event_log::EventLogger;
use airwatch::pins;
use airwatch::sensors::SensorHub;
use airwatch::sensors::bme280::{BME280_ADDR, ClimateSensor};
use airwatch::sensors::sgp30::{SGP30_ADDR, Sgp30};
use airwatch::status::StatusBoard;

/// Shared by the sampler (producer) and the writer thread (consumer).
static EVENT_LOG: EventLogger = EventLogger::new();

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  AirWatch v{}                        ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    let peripherals = Peripherals::take()?;
    let sysloop = EspSystemEventLoop::take()?;
    let nvs_partition = EspDefaultNvsPartition::take().ok();

    // ── 2. Load config from NVS (seeded on first boot) ────────
    let config = match NvsConfigStore::new() {
        Ok(mut store) => store.load_or_seed(&SystemConfig::default()),
        Err(e) => {
            warn!("NVS init failed ({}), running with defaults", e);
            SystemConfig::default()
        }
    };

    // ── 3. Peripherals ────────────────────────────────────────
    if let Err(e) = hw_init::init_peripherals(config.buzzer_carrier_hz) {
        // Lights and buzzer are unusable; keep sampling and logging.
        error!("HAL init failed: {}", e);
    }
    if let Err(e) = hw_init::init_isr_service() {
        error!("ISR service init failed ({}), override button inactive", e);
    }

    let i2c_cfg = I2cConfig::new().baudrate(Hertz(pins::I2C_FREQ_HZ));
    // Pin objects must match pins::CLIMATE_I2C_* / pins::AIR_I2C_*.
    let climate_bus = I2cDriver::new(
        peripherals.i2c0,
        peripherals.pins.gpio4,
        peripherals.pins.gpio5,
        &i2c_cfg,
    )?;
    let air_bus = I2cDriver::new(
        peripherals.i2c1,
        peripherals.pins.gpio6,
        peripherals.pins.gpio7,
        &i2c_cfg,
    )?;

    let mut bme = ClimateSensor::new(climate_bus, Delay::new_default(), BME280_ADDR);
    if let Err(e) = bme.init() {
        warn!("BME280 init failed ({}), will retry each cycle", e);
    }
    let mut sgp = Sgp30::new(air_bus, Delay::new_default(), SGP30_ADDR);
    if let Err(e) = sgp.init() {
        warn!("SGP30 init failed ({}), will retry each cycle", e);
    }
    let sensors = SensorHub::new(bme, sgp);

    let indicator = IndicatorDriver::new(
        GpioOutput::new(pins::LIGHT_GREEN_GPIO),
        GpioOutput::new(pins::LIGHT_YELLOW_GPIO),
        GpioOutput::new(pins::LIGHT_RED_GPIO),
    );
    let alarm = AlarmController::new(
        &ALARM_STATE,
        BuzzerDriver::new(
            LedcChannel::new(pins::BUZZER_LEDC_CHANNEL),
            config.buzzer_duty_percent,
        ),
        BeepPattern::from_config(&config),
    );

    // ── 4. Network (bounded retry, never fatal) ───────────────
    if !config.has_wifi_credentials() {
        warn!("no WiFi credentials (build with AIRWATCH_WIFI_SSID/AIRWATCH_WIFI_PASS)");
    }
    let _wifi = match EspStation::new(peripherals.modem, sysloop, nvs_partition, &config) {
        Ok(mut station) => match wifi::connect_with_retry(&mut station, &config) {
            Ok(()) => Some(station),
            Err(e) => {
                warn!("WiFi unavailable ({}), continuing offline", e);
                None
            }
        },
        Err(e) => {
            warn!("WiFi driver unavailable ({}), continuing offline", e);
            None
        }
    };
    let _sntp = time::start_sntp();
    let clock = SystemClock::new(config.utc_offset_minutes);

    // ── 5. Event-log writer thread ────────────────────────────
    if let Err(e) = csv_file::mount_spiflash() {
        warn!("storage mount failed ({}), records will be dropped", e);
    }
    let mut record_sink = FileRecordSink::new(config.log_path.as_str());
    if let Err(e) = task_pin::spawn_on_core(LOG_WRITER_TASK, move || {
        futures_lite::future::block_on(EVENT_LOG.run(&mut record_sink));
    }) {
        warn!("event-log writer spawn failed ({}), records will queue then drop", e);
    }

    // ── 6. Cooperative tasks: sampler + status page ───────────
    let board = StatusBoard::new();
    let mut sampler = Sampler::new(
        &config,
        sensors,
        indicator,
        &alarm,
        &EVENT_LOG,
        &board,
        clock,
        LogEventSink::new(),
    );

    let executor: edge_executor::LocalExecutor<'_, 4> = edge_executor::LocalExecutor::new();
    executor.spawn(async { sampler.run().await }).detach();

    match status_page::bind_listener(&config) {
        Ok(listener) => {
            let mut server = StatusServer::new(&board, listener, &config);
            executor.spawn(async move { server.run().await }).detach();
        }
        Err(e) => warn!("status page disabled: {}", e),
    }

    info!("AirWatch running");
    futures_lite::future::block_on(executor.run(core::future::pending::<()>()));
    Ok(())
}
