//! WiFi station-mode bring-up.
//!
//! The node joins one access point at boot with a bounded number of
//! attempts; if every attempt fails the node keeps running offline (lights,
//! alarm, and event log do not depend on the network).
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: [`EspStation`] over `esp_idf_svc::wifi::BlockingWifi`.
//! - **all other targets**: [`SimStation`] with scripted failures.

use core::time::Duration;

use log::{info, warn};

use super::utils::{is_printable_ascii, retry_bounded};
use crate::config::SystemConfig;
use crate::error::CommsError;

// ───────────────────────────────────────────────────────────────
// Station trait
// ───────────────────────────────────────────────────────────────

/// One attempt to associate and obtain an address.
pub trait StationLink {
    fn try_connect(&mut self) -> Result<(), CommsError>;
    fn is_connected(&self) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Validation
// ───────────────────────────────────────────────────────────────

pub fn validate_credentials(ssid: &str, password: &str) -> Result<(), CommsError> {
    if ssid.is_empty() || ssid.len() > 32 || !is_printable_ascii(ssid) {
        warn!("WiFi: SSID invalid (must be 1-32 printable ASCII bytes)");
        return Err(CommsError::WifiConnectFailed);
    }
    if !password.is_empty() && (password.len() < 8 || password.len() > 64) {
        warn!("WiFi: password invalid (8-64 bytes for WPA2, or empty for open)");
        return Err(CommsError::WifiConnectFailed);
    }
    Ok(())
}

/// Join the configured network, at most `wifi_connect_attempts` times.
pub fn connect_with_retry<L: StationLink>(
    link: &mut L,
    config: &SystemConfig,
) -> Result<(), CommsError> {
    validate_credentials(&config.wifi_ssid, &config.wifi_password)?;
    retry_bounded(
        "WiFi connect",
        config.wifi_connect_attempts,
        Duration::from_millis(config.retry_delay_ms as u64),
        |_| link.try_connect(),
    )?;
    info!("WiFi: connected to '{}'", config.wifi_ssid);
    Ok(())
}

// ───────────────────────────────────────────────────────────────
// ESP-IDF station
// ───────────────────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
pub use esp::EspStation;

#[cfg(target_os = "espidf")]
mod esp {
    use esp_idf_svc::eventloop::EspSystemEventLoop;
    use esp_idf_svc::hal::modem::Modem;
    use esp_idf_svc::nvs::EspDefaultNvsPartition;
    use esp_idf_svc::wifi::{AuthMethod, BlockingWifi, ClientConfiguration, Configuration, EspWifi};
    use log::warn;

    use super::StationLink;
    use crate::config::SystemConfig;
    use crate::error::CommsError;

    pub struct EspStation {
        wifi: BlockingWifi<EspWifi<'static>>,
    }

    impl EspStation {
        pub fn new(
            modem: Modem,
            sysloop: EspSystemEventLoop,
            nvs: Option<EspDefaultNvsPartition>,
            config: &SystemConfig,
        ) -> Result<Self, CommsError> {
            let driver = EspWifi::new(modem, sysloop.clone(), nvs).map_err(|e| {
                warn!("WiFi: driver init failed: {}", e);
                CommsError::WifiConnectFailed
            })?;
            let mut wifi = BlockingWifi::wrap(driver, sysloop).map_err(|e| {
                warn!("WiFi: event wrap failed: {}", e);
                CommsError::WifiConnectFailed
            })?;

            let auth_method = if config.wifi_password.is_empty() {
                AuthMethod::None
            } else {
                AuthMethod::WPA2Personal
            };
            let client = ClientConfiguration {
                ssid: config
                    .wifi_ssid
                    .as_str()
                    .try_into()
                    .map_err(|_| CommsError::WifiConnectFailed)?,
                password: config
                    .wifi_password
                    .as_str()
                    .try_into()
                    .map_err(|_| CommsError::WifiConnectFailed)?,
                auth_method,
                ..Default::default()
            };
            wifi.set_configuration(&Configuration::Client(client))
                .map_err(|e| {
                    warn!("WiFi: set_configuration failed: {}", e);
                    CommsError::WifiConnectFailed
                })?;
            wifi.start().map_err(|e| {
                warn!("WiFi: start failed: {}", e);
                CommsError::WifiConnectFailed
            })?;
            Ok(Self { wifi })
        }
    }

    impl StationLink for EspStation {
        fn try_connect(&mut self) -> Result<(), CommsError> {
            self.wifi.connect().map_err(|e| {
                warn!("WiFi: connect failed: {}", e);
                CommsError::WifiConnectFailed
            })?;
            self.wifi.wait_netif_up().map_err(|e| {
                warn!("WiFi: netif up failed: {}", e);
                CommsError::WifiConnectFailed
            })
        }

        fn is_connected(&self) -> bool {
            self.wifi.is_connected().unwrap_or(false)
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Simulation station
// ───────────────────────────────────────────────────────────────

/// Host station that fails its first `fail_first` attempts.
#[cfg(not(target_os = "espidf"))]
#[derive(Debug, Default)]
pub struct SimStation {
    fail_first: u32,
    attempts: u32,
    connected: bool,
}

#[cfg(not(target_os = "espidf"))]
impl SimStation {
    pub fn new(fail_first: u32) -> Self {
        Self {
            fail_first,
            ..Self::default()
        }
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }
}

#[cfg(not(target_os = "espidf"))]
impl StationLink for SimStation {
    fn try_connect(&mut self) -> Result<(), CommsError> {
        self.attempts += 1;
        if self.attempts <= self.fail_first {
            return Err(CommsError::WifiConnectFailed);
        }
        self.connected = true;
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected
    }
}
