//! Sensor subsystem: individual drivers and the aggregating [`SensorHub`].
//!
//! The hub owns one climate source and one air-quality source and exposes
//! both sensor ports, so the sampler takes a single value.  The two are
//! read independently: a failure of one never blocks the other.

pub mod bme280;
pub mod sgp30;

use crate::app::ports::{AirQualityPort, AirQualityReading, ClimatePort, ClimateReading};
use crate::error::SensorError;

/// Climate + air-quality pair.
pub struct SensorHub<C, A> {
    pub climate: C,
    pub air: A,
}

impl<C, A> SensorHub<C, A>
where
    C: ClimatePort,
    A: AirQualityPort,
{
    /// Construct a new hub.  Pass in pre-built drivers (built in main
    /// where peripheral ownership is established).
    pub fn new(climate: C, air: A) -> Self {
        Self { climate, air }
    }
}

impl<C: ClimatePort, A> ClimatePort for SensorHub<C, A> {
    fn read_climate(&mut self) -> Result<ClimateReading, SensorError> {
        self.climate.read_climate()
    }
}

impl<C, A: AirQualityPort> AirQualityPort for SensorHub<C, A> {
    fn read_air_quality(&mut self) -> Result<AirQualityReading, SensorError> {
        self.air.read_air_quality()
    }
}
