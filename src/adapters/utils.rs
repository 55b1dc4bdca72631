//! Shared helpers for the network adapters.

use core::fmt::Display;
use core::time::Duration;

use log::{info, warn};

/// Returns `true` if every byte of `s` is in the printable ASCII range
/// `0x20..=0x7E` (space through tilde, inclusive).
///
/// Used to validate WiFi SSID strings.
pub(super) fn is_printable_ascii(s: &str) -> bool {
    s.bytes().all(|b| (0x20..=0x7E).contains(&b))
}

/// Run `op` up to `attempts` times, sleeping `delay` between failures.
/// `op` receives the 1-based attempt number.  Returns the last error once
/// attempts are exhausted.
///
/// Blocking: for boot-time bring-up only, never inside the executor.
pub(super) fn retry_bounded<T, E: Display>(
    what: &str,
    attempts: u8,
    delay: Duration,
    mut op: impl FnMut(u8) -> Result<T, E>,
) -> Result<T, E> {
    let attempts = attempts.max(1);
    let mut attempt = 1;
    loop {
        match op(attempt) {
            Ok(value) => {
                if attempt > 1 {
                    info!("{}: succeeded on attempt {}/{}", what, attempt, attempts);
                }
                return Ok(value);
            }
            Err(e) if attempt < attempts => {
                warn!("{}: attempt {}/{} failed: {}", what, attempt, attempts, e);
                std::thread::sleep(delay);
                attempt += 1;
            }
            Err(e) => {
                warn!("{}: giving up after {} attempts: {}", what, attempts, e);
                return Err(e);
            }
        }
    }
}
