//! Bosch BME280 temperature / humidity / pressure sensor.
//!
//! Thin [`ClimatePort`] adapter over the `bme280-rs` blocking driver,
//! which owns the register protocol and the datasheet compensation.  The
//! sensor runs in normal mode at 1× oversampling on every channel; each
//! cycle reads the latest conversion.
//!
//! A sensor that is absent at boot is initialised again on the next read.

use bme280_rs::{Bme280, Configuration, Oversampling, SensorMode};
use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;
use log::{info, warn};

use crate::app::ports::{ClimatePort, ClimateReading};
use crate::error::SensorError;

/// SDO tied low.
pub const BME280_ADDR: u8 = 0x76;

pub struct ClimateSensor<I, D> {
    device: Bme280<I, D>,
    initialised: bool,
}

impl<I: I2c, D: DelayNs> ClimateSensor<I, D> {
    pub fn new(i2c: I, delay: D, address: u8) -> Self {
        Self {
            device: Bme280::new_with_address(i2c, address, delay),
            initialised: false,
        }
    }

    /// Reset the chip, load its calibration, and start conversions.
    pub fn init(&mut self) -> Result<(), SensorError> {
        self.device.init().map_err(|_| {
            warn!("bme280: init failed");
            SensorError::BusFailed
        })?;

        let config = Configuration::default()
            .with_temperature_oversampling(Oversampling::Oversample1)
            .with_humidity_oversampling(Oversampling::Oversample1)
            .with_pressure_oversampling(Oversampling::Oversample1)
            .with_sensor_mode(SensorMode::Normal);
        self.device.set_sampling_configuration(config).map_err(|_| {
            warn!("bme280: sampling configuration failed");
            SensorError::BusFailed
        })?;

        self.initialised = true;
        info!("bme280: ready");
        Ok(())
    }

    pub fn is_initialised(&self) -> bool {
        self.initialised
    }

    pub fn measure(&mut self) -> Result<ClimateReading, SensorError> {
        if !self.initialised {
            return Err(SensorError::NotInitialised);
        }
        let temperature_c = channel("temperature", self.device.read_temperature())?;
        let humidity_pct = channel("humidity", self.device.read_humidity())?;
        let pressure_pa = channel("pressure", self.device.read_pressure())?;

        Ok(ClimateReading {
            temperature_c,
            humidity_pct,
            pressure_hpa: pressure_pa / 100.0,
        })
    }
}

/// Map one channel read: bus errors and skipped channels both fail the
/// whole climate reading.
fn channel<E>(name: &str, read: Result<Option<f32>, E>) -> Result<f32, SensorError> {
    match read {
        Ok(Some(value)) => Ok(value),
        Ok(None) => {
            warn!("bme280: {} not available", name);
            Err(SensorError::NoData)
        }
        Err(_) => {
            warn!("bme280: {} read failed", name);
            Err(SensorError::BusFailed)
        }
    }
}

impl<I: I2c, D: DelayNs> ClimatePort for ClimateSensor<I, D> {
    fn read_climate(&mut self) -> Result<ClimateReading, SensorError> {
        if !self.initialised {
            // Sensor missing at boot; try again each cycle.
            self.init()?;
        }
        self.measure()
    }
}
