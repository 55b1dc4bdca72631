//! Alert classifier.
//!
//! Maps one [`SensorSnapshot`] to an [`AlertLevel`].  Pure and total: the
//! same snapshot always yields the same result, and every snapshot with a
//! temperature yields a level.  A snapshot without a temperature yields
//! [`ClassifyError::IncompleteReading`]; the sampler then keeps the level
//! it already had.
//!
//! ## Bands
//!
//! | Level  | Any of                                                       |
//! |--------|--------------------------------------------------------------|
//! | Red    | T < 16, T > 24, CO2 > 600 ppm, TVOC > 800 ppb                |
//! | Yellow | T < 17, T > 22, CO2 > 1000 ppm, TVOC > 1200 ppb              |
//! | Green  | otherwise                                                    |
//!
//! Temperature is compared in whole degrees, truncated toward zero, so
//! 15.9 °C counts as 15 (Red) and 24.9 °C counts as 24 (not Red).
//!
//! The Red air-quality limits are *lower* than the Yellow ones, so a CO2 or
//! TVOC value can never produce Yellow on its own.  The shipped limits are
//! kept as-is; only temperature reaches the Yellow band.

use serde::{Deserialize, Serialize};

use crate::error::ClassifyError;
use crate::status::SensorSnapshot;

/// Tri-state environmental alert level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AlertLevel {
    Green,
    Yellow,
    Red,
}

impl AlertLevel {
    pub fn name(self) -> &'static str {
        match self {
            Self::Green => "green",
            Self::Yellow => "yellow",
            Self::Red => "red",
        }
    }
}

/// Classification limits.  Every comparison is strict (`<` / `>`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    pub temp_red_low_c: f32,
    pub temp_red_high_c: f32,
    pub temp_yellow_low_c: f32,
    pub temp_yellow_high_c: f32,
    pub co2_red_ppm: u16,
    pub co2_yellow_ppm: u16,
    pub tvoc_red_ppb: u16,
    pub tvoc_yellow_ppb: u16,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            temp_red_low_c: 16.0,
            temp_red_high_c: 24.0,
            temp_yellow_low_c: 17.0,
            temp_yellow_high_c: 22.0,
            co2_red_ppm: 600,
            co2_yellow_ppm: 1000,
            tvoc_red_ppb: 800,
            tvoc_yellow_ppb: 1200,
        }
    }
}

/// Stateless classifier bound to a set of thresholds.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlertClassifier {
    thresholds: Thresholds,
}

impl AlertClassifier {
    pub fn new(thresholds: Thresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> &Thresholds {
        &self.thresholds
    }

    /// Classify one snapshot.
    ///
    /// Absent CO2/TVOC fields simply contribute nothing; only a missing
    /// temperature makes the reading incomplete.
    pub fn classify(&self, snap: &SensorSnapshot) -> Result<AlertLevel, ClassifyError> {
        let t = &self.thresholds;
        let temp = snap
            .temperature_c
            .ok_or(ClassifyError::IncompleteReading)?
            .trunc();
        if temp.is_nan() {
            return Err(ClassifyError::IncompleteReading);
        }

        let co2_above = |limit: u16| snap.co2_ppm.is_some_and(|v| v > limit);
        let tvoc_above = |limit: u16| snap.tvoc_ppb.is_some_and(|v| v > limit);

        if temp < t.temp_red_low_c
            || temp > t.temp_red_high_c
            || co2_above(t.co2_red_ppm)
            || tvoc_above(t.tvoc_red_ppb)
        {
            Ok(AlertLevel::Red)
        } else if temp < t.temp_yellow_low_c
            || temp > t.temp_yellow_high_c
            || co2_above(t.co2_yellow_ppm)
            || tvoc_above(t.tvoc_yellow_ppb)
        {
            Ok(AlertLevel::Yellow)
        } else {
            Ok(AlertLevel::Green)
        }
    }
}

/// Classify with the default thresholds.
pub fn classify(snap: &SensorSnapshot) -> Result<AlertLevel, ClassifyError> {
    AlertClassifier::default().classify(snap)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snap(temp: Option<f32>, co2: Option<u16>, tvoc: Option<u16>) -> SensorSnapshot {
        SensorSnapshot {
            temperature_c: temp,
            co2_ppm: co2,
            tvoc_ppb: tvoc,
            ..SensorSnapshot::default()
        }
    }

    #[test]
    fn temperature_boundaries() {
        let safe = |t| classify(&snap(Some(t), Some(300), Some(200)));
        assert_eq!(safe(16.0), Ok(AlertLevel::Yellow));
        assert_eq!(safe(15.9), Ok(AlertLevel::Red));
        assert_eq!(safe(24.0), Ok(AlertLevel::Yellow));
        assert_eq!(safe(25.0), Ok(AlertLevel::Red));
        assert_eq!(safe(17.0), Ok(AlertLevel::Green));
        assert_eq!(safe(22.0), Ok(AlertLevel::Green));
        assert_eq!(safe(23.0), Ok(AlertLevel::Yellow));
    }

    #[test]
    fn fractional_degrees_truncate() {
        assert_eq!(classify(&snap(Some(24.9), None, None)), Ok(AlertLevel::Yellow));
        assert_eq!(classify(&snap(Some(16.99), None, None)), Ok(AlertLevel::Yellow));
        assert_eq!(classify(&snap(Some(22.7), None, None)), Ok(AlertLevel::Green));
    }

    #[test]
    fn co2_boundary() {
        assert_eq!(classify(&snap(Some(20.0), Some(601), Some(200))), Ok(AlertLevel::Red));
        assert_eq!(classify(&snap(Some(20.0), Some(600), Some(200))), Ok(AlertLevel::Green));
    }

    #[test]
    fn tvoc_boundary() {
        assert_eq!(classify(&snap(Some(20.0), Some(300), Some(801))), Ok(AlertLevel::Red));
        assert_eq!(classify(&snap(Some(20.0), Some(300), Some(800))), Ok(AlertLevel::Green));
    }

    #[test]
    fn missing_temperature_is_incomplete() {
        assert_eq!(
            classify(&snap(None, Some(2000), Some(2000))),
            Err(ClassifyError::IncompleteReading)
        );
        assert_eq!(
            classify(&snap(Some(f32::NAN), None, None)),
            Err(ClassifyError::IncompleteReading)
        );
    }

    #[test]
    fn missing_air_quality_uses_temperature_only() {
        assert_eq!(classify(&snap(Some(20.0), None, None)), Ok(AlertLevel::Green));
        assert_eq!(classify(&snap(Some(30.0), None, None)), Ok(AlertLevel::Red));
    }

    #[test]
    fn warmup_sentinel_is_green() {
        assert_eq!(classify(&snap(Some(20.0), Some(400), Some(0))), Ok(AlertLevel::Green));
    }

    #[test]
    fn custom_thresholds_are_honoured() {
        let c = AlertClassifier::new(Thresholds {
            co2_red_ppm: 1500,
            co2_yellow_ppm: 1000,
            ..Thresholds::default()
        });
        assert_eq!(c.classify(&snap(Some(20.0), Some(1200), None)), Ok(AlertLevel::Yellow));
        assert_eq!(c.classify(&snap(Some(20.0), Some(1600), None)), Ok(AlertLevel::Red));
    }
}
