//! Sensirion SGP30 CO2-equivalent / TVOC sensor.
//!
//! Two commands are used: `Init_air_quality` once after power-up and
//! `Measure_air_quality` each cycle.  Every 16-bit word the sensor returns
//! is followed by a CRC-8 (poly `0x31`, init `0xFF`), which is checked.
//!
//! For roughly 15 s after init the sensor reports a fixed 400 ppm / 0 ppb
//! baseline; see [`AirQualityReading::is_warming_up`].

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;
use log::{info, warn};

use crate::app::ports::{AirQualityPort, AirQualityReading};
use crate::error::SensorError;

pub const SGP30_ADDR: u8 = 0x58;

const CMD_INIT_AIR_QUALITY: [u8; 2] = [0x20, 0x03];
const CMD_MEASURE_AIR_QUALITY: [u8; 2] = [0x20, 0x08];
const INIT_MS: u32 = 10;
const MEASURE_MS: u32 = 12;

const CRC8_POLY: u8 = 0x31;
const CRC8_INIT: u8 = 0xFF;

/// Sensirion CRC-8 over one data word.
pub fn crc8(data: &[u8]) -> u8 {
    let mut crc = CRC8_INIT;
    for &byte in data {
        crc ^= byte;
        for _ in 0..8 {
            crc = if crc & 0x80 != 0 {
                (crc << 1) ^ CRC8_POLY
            } else {
                crc << 1
            };
        }
    }
    crc
}

/// Split a `[msb, lsb, crc]` triple into a checked word.
fn checked_word(chunk: &[u8]) -> Result<u16, SensorError> {
    if crc8(&chunk[..2]) != chunk[2] {
        return Err(SensorError::CrcMismatch);
    }
    Ok(u16::from_be_bytes([chunk[0], chunk[1]]))
}

pub struct Sgp30<I, D> {
    i2c: I,
    delay: D,
    address: u8,
    initialised: bool,
}

impl<I: I2c, D: DelayNs> Sgp30<I, D> {
    pub fn new(i2c: I, delay: D, address: u8) -> Self {
        Self {
            i2c,
            delay,
            address,
            initialised: false,
        }
    }

    /// Start the on-chip baseline algorithm.
    pub fn init(&mut self) -> Result<(), SensorError> {
        self.command(CMD_INIT_AIR_QUALITY)?;
        self.delay.delay_ms(INIT_MS);
        self.initialised = true;
        info!("sgp30: air-quality algorithm started");
        Ok(())
    }

    pub fn is_initialised(&self) -> bool {
        self.initialised
    }

    pub fn measure(&mut self) -> Result<AirQualityReading, SensorError> {
        if !self.initialised {
            return Err(SensorError::NotInitialised);
        }
        self.command(CMD_MEASURE_AIR_QUALITY)?;
        self.delay.delay_ms(MEASURE_MS);

        let mut buf = [0u8; 6];
        self.i2c.read(self.address, &mut buf).map_err(|e| {
            warn!("sgp30: read failed: {:?}", e);
            SensorError::BusFailed
        })?;

        let co2_ppm = checked_word(&buf[0..3])?;
        let tvoc_ppb = checked_word(&buf[3..6])?;
        Ok(AirQualityReading { co2_ppm, tvoc_ppb })
    }

    fn command(&mut self, cmd: [u8; 2]) -> Result<(), SensorError> {
        self.i2c.write(self.address, &cmd).map_err(|e| {
            warn!("sgp30: command 0x{:02X}{:02X} failed: {:?}", cmd[0], cmd[1], e);
            SensorError::BusFailed
        })
    }
}

impl<I: I2c, D: DelayNs> AirQualityPort for Sgp30<I, D> {
    fn read_air_quality(&mut self) -> Result<AirQualityReading, SensorError> {
        if !self.initialised {
            self.init()?;
        }
        self.measure()
    }
}
