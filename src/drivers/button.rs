//! Push-button inputs: the alarm override and the display-cycle button.
//!
//! ## Hardware
//!
//! Momentary switches to 3V3 with internal pull-downs.  The GPIO fires on
//! the rising edge and the ISR calls straight into this module.
//!
//! ## Interrupt contract
//!
//! Handlers run in interrupt context: no blocking, no allocation, no I/O.
//! [`OverrideSignal::on_edge`] performs one CAS on the alarm state word
//! plus relaxed counter increments.  Contact bounce needs no filtering
//! because a silence request is idempotent.
//!
//! | Input    | Edge effect                                       |
//! |----------|---------------------------------------------------|
//! | Override | `request_silence()`; no-op while the alarm is off |
//! | Display  | counted only                                      |

use core::sync::atomic::{AtomicU32, Ordering};

use crate::alarm::{ALARM_STATE, AlarmState};

/// Edge-triggered silence request for the audible alarm.
pub struct OverrideSignal {
    state: &'static AlarmState,
    edges: AtomicU32,
    silenced: AtomicU32,
}

impl OverrideSignal {
    pub const fn new(state: &'static AlarmState) -> Self {
        Self {
            state,
            edges: AtomicU32::new(0),
            silenced: AtomicU32::new(0),
        }
    }

    /// One rising edge.  Returns `true` if it silenced an active alarm.
    /// Interrupt-safe.
    pub fn on_edge(&self) -> bool {
        self.edges.fetch_add(1, Ordering::Relaxed);
        let changed = self.state.request_silence();
        if changed {
            self.silenced.fetch_add(1, Ordering::Relaxed);
        }
        changed
    }

    /// Edges seen since boot, including bounces and presses while idle.
    pub fn edges(&self) -> u32 {
        self.edges.load(Ordering::Relaxed)
    }

    /// Edges that actually silenced an alarm.
    pub fn silenced_count(&self) -> u32 {
        self.silenced.load(Ordering::Relaxed)
    }
}

/// Display-cycle button.  There is no display yet; presses are counted.
pub struct DisplayButton {
    presses: AtomicU32,
}

impl DisplayButton {
    pub const fn new() -> Self {
        Self {
            presses: AtomicU32::new(0),
        }
    }

    pub fn on_edge(&self) {
        self.presses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn presses(&self) -> u32 {
        self.presses.load(Ordering::Relaxed)
    }
}

impl Default for DisplayButton {
    fn default() -> Self {
        Self::new()
    }
}

pub static OVERRIDE: OverrideSignal = OverrideSignal::new(&ALARM_STATE);
pub static DISPLAY_BUTTON: DisplayButton = DisplayButton::new();

/// ISR body for the override button.
pub fn override_isr_handler() {
    OVERRIDE.on_edge();
}

/// ISR body for the display button.
pub fn display_isr_handler() {
    DISPLAY_BUTTON.on_edge();
}
