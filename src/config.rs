//! System configuration parameters
//!
//! All tunable parameters for the AirWatch node.
//! Values are persisted in NVS by [`NvsConfigStore`](crate::adapters::nvs::NvsConfigStore)
//! and fall back to [`SystemConfig::default`] on first boot.

use serde::{Deserialize, Serialize};

use crate::classifier::Thresholds;
use crate::error::{Error, Result};
use crate::event_log::EventLogPolicy;

/// Station credentials baked in at build time
/// (`AIRWATCH_WIFI_SSID=… AIRWATCH_WIFI_PASS=… cargo build`).
pub const BUILD_WIFI_SSID: Option<&str> = option_env!("AIRWATCH_WIFI_SSID");
pub const BUILD_WIFI_PASS: Option<&str> = option_env!("AIRWATCH_WIFI_PASS");

/// Core system configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemConfig {
    // --- Classification ---
    /// Alert thresholds for temperature, CO2 and TVOC.
    pub thresholds: Thresholds,

    // --- Timing ---
    /// Sampling cycle period (milliseconds)
    pub sample_interval_ms: u32,
    /// Pause between status-page accept attempts (milliseconds)
    pub status_poll_ms: u32,

    // --- Buzzer ---
    /// Audible on-time per alarm period (milliseconds)
    pub buzzer_on_ms: u32,
    /// Full alarm period, on-time included (milliseconds)
    pub buzzer_period_ms: u32,
    /// PWM carrier frequency for the piezo (Hz)
    pub buzzer_carrier_hz: u32,
    /// PWM duty while sounding (0-100%)
    pub buzzer_duty_percent: u8,

    // --- Event log ---
    /// CSV file the out-of-range records are appended to.
    pub log_path: heapless::String<64>,
    /// When a Red classification produces a record.
    pub event_log_policy: EventLogPolicy,
    /// Offset applied to the UTC wall clock for record timestamps.
    pub utc_offset_minutes: i16,

    // --- Network ---
    /// TCP port of the status page.
    pub status_port: u16,
    pub wifi_ssid: heapless::String<32>,
    pub wifi_password: heapless::String<64>,
    /// Bounded retry: WiFi association attempts at boot.
    pub wifi_connect_attempts: u8,
    /// Bounded retry: status socket bind attempts.
    pub socket_bind_attempts: u8,
    /// Delay between bounded retry attempts (milliseconds)
    pub retry_delay_ms: u32,
}

impl Default for SystemConfig {
    fn default() -> Self {
        let mut log_path = heapless::String::new();
        let _ = log_path.push_str("/spiflash/data.csv");

        Self {
            thresholds: Thresholds::default(),

            // Timing
            sample_interval_ms: 5000, // 0.2 Hz
            status_poll_ms: 400,

            // Buzzer: 1 Hz pattern, 5% on-time, 1 kHz tone
            buzzer_on_ms: 50,
            buzzer_period_ms: 1000,
            buzzer_carrier_hz: 1000,
            buzzer_duty_percent: 50,

            // Event log
            log_path,
            event_log_policy: EventLogPolicy::OnEntry,
            utc_offset_minutes: 0,

            // Network
            status_port: 80,
            wifi_ssid: heapless::String::new(),
            wifi_password: heapless::String::new(),
            wifi_connect_attempts: 2,
            socket_bind_attempts: 3,
            retry_delay_ms: 1000,
        }
        .with_build_credentials()
    }
}

impl SystemConfig {
    /// Replace the station credentials.  Values that do not fit the
    /// fixed-size fields are rejected and the previous ones kept.
    pub fn set_wifi_credentials(&mut self, ssid: &str, password: &str) -> Result<()> {
        let ssid: heapless::String<32> = heapless::String::try_from(ssid)
            .map_err(|_| Error::Config("wifi_ssid longer than 32 bytes"))?;
        let password: heapless::String<64> = heapless::String::try_from(password)
            .map_err(|_| Error::Config("wifi_password longer than 64 bytes"))?;
        self.wifi_ssid = ssid;
        self.wifi_password = password;
        Ok(())
    }

    /// Credentials from the build environment, if any were given.
    fn with_build_credentials(mut self) -> Self {
        if let Some(ssid) = BUILD_WIFI_SSID {
            if let Err(e) = self.set_wifi_credentials(ssid, BUILD_WIFI_PASS.unwrap_or("")) {
                log::warn!("build-time WiFi credentials ignored: {}", e);
            }
        }
        self
    }

    /// `true` once an SSID is configured.
    pub fn has_wifi_credentials(&self) -> bool {
        !self.wifi_ssid.is_empty()
    }

    /// Range-check every field that could wedge the node if persisted.
    ///
    /// CO2/TVOC band ordering is deliberately not checked: the shipped Red
    /// limits sit below the Yellow ones and must stay loadable.
    pub fn validate(&self) -> Result<()> {
        let t = &self.thresholds;
        if !(t.temp_red_low_c <= t.temp_yellow_low_c
            && t.temp_yellow_low_c < t.temp_yellow_high_c
            && t.temp_yellow_high_c <= t.temp_red_high_c)
        {
            return Err(Error::Config("temperature bands must nest: red_low <= yellow_low < yellow_high <= red_high"));
        }
        if self.sample_interval_ms == 0 {
            return Err(Error::Config("sample_interval_ms must be > 0"));
        }
        if self.buzzer_period_ms == 0 || self.buzzer_on_ms >= self.buzzer_period_ms {
            return Err(Error::Config("buzzer_on_ms must be shorter than buzzer_period_ms"));
        }
        if self.buzzer_duty_percent == 0 || self.buzzer_duty_percent > 100 {
            return Err(Error::Config("buzzer_duty_percent must be 1-100"));
        }
        if self.buzzer_carrier_hz == 0 {
            return Err(Error::Config("buzzer_carrier_hz must be > 0"));
        }
        if self.log_path.is_empty() {
            return Err(Error::Config("log_path must not be empty"));
        }
        if self.wifi_connect_attempts == 0 || self.socket_bind_attempts == 0 {
            return Err(Error::Config("retry attempt counts must be > 0"));
        }
        Ok(())
    }
}
