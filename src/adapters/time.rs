//! Wall-clock adapter.
//!
//! Implements [`ClockPort`] from the system clock (`SystemTime`), shifted
//! by the configured UTC offset so log records carry local time.
//!
//! - **`target_os = "espidf"`**: the system clock is set by SNTP once WiFi
//!   is up; see [`start_sntp`].  Until then it counts from the epoch.
//! - **`not(target_os = "espidf")`**: the host clock.

use std::time::SystemTime;

use chrono::{DateTime, NaiveDateTime, TimeDelta, Utc};

use crate::app::ports::ClockPort;

/// Before this the clock has not been synchronised.
const SYNCED_AFTER_UNIX_SECS: i64 = 1_577_836_800; // 2020-01-01

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock {
    offset: TimeDelta,
}

impl SystemClock {
    pub fn new(utc_offset_minutes: i16) -> Self {
        Self {
            offset: TimeDelta::minutes(i64::from(utc_offset_minutes)),
        }
    }
}

impl ClockPort for SystemClock {
    fn now(&self) -> NaiveDateTime {
        DateTime::<Utc>::from(SystemTime::now()).naive_utc() + self.offset
    }

    /// The wall clock looks synchronised (after 2020-01-01).
    fn is_synced(&self) -> bool {
        DateTime::<Utc>::from(SystemTime::now()).timestamp() >= SYNCED_AFTER_UNIX_SECS
    }
}

/// Start SNTP against the default pool.  The returned handle must be kept
/// alive for synchronisation to continue.
#[cfg(target_os = "espidf")]
pub fn start_sntp() -> Option<esp_idf_svc::sntp::EspSntp<'static>> {
    match esp_idf_svc::sntp::EspSntp::new_default() {
        Ok(sntp) => {
            log::info!("SNTP: started");
            Some(sntp)
        }
        Err(e) => {
            log::warn!("SNTP: start failed: {}", e);
            None
        }
    }
}
