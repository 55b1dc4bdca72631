//! Tri-colour light stack driver.
//!
//! Three discrete lamps (green, yellow, red) on plain GPIO outputs.
//! [`IndicatorDriver::apply`] lights exactly one of them; calling it again
//! with the same level rewrites the same pin levels.
//!
//! Generic over [`embedded_hal::digital::OutputPin`]: `hw_init::GpioOutput`
//! on the device, recording mocks on the host.

use embedded_hal::digital::OutputPin;
use log::warn;

use crate::app::ports::IndicatorPort;
use crate::classifier::AlertLevel;

pub struct IndicatorDriver<G, Y, R> {
    green: G,
    yellow: Y,
    red: R,
    lit: Option<AlertLevel>,
}

impl<G, Y, R> IndicatorDriver<G, Y, R>
where
    G: OutputPin,
    Y: OutputPin,
    R: OutputPin,
{
    pub fn new(green: G, yellow: Y, red: R) -> Self {
        let mut driver = Self {
            green,
            yellow,
            red,
            lit: None,
        };
        driver.write(false, false, false);
        driver
    }

    /// Lamp currently lit, `None` when all are dark.
    pub fn lit(&self) -> Option<AlertLevel> {
        self.lit
    }

    fn write(&mut self, green: bool, yellow: bool, red: bool) {
        // Turn lamps off before turning the new one on so two are never
        // lit at once.
        let off_first = [(!green, 0), (!yellow, 1), (!red, 2)];
        let on_after = [(green, 0), (yellow, 1), (red, 2)];
        for (off, idx) in off_first {
            if off {
                self.set(idx, false);
            }
        }
        for (on, idx) in on_after {
            if on {
                self.set(idx, true);
            }
        }
    }

    fn set(&mut self, idx: u8, high: bool) {
        let ok = match idx {
            0 => self.green.set_state(high.into()).is_ok(),
            1 => self.yellow.set_state(high.into()).is_ok(),
            _ => self.red.set_state(high.into()).is_ok(),
        };
        if !ok {
            warn!("indicator: pin {} write failed", idx);
        }
    }
}

impl<G, Y, R> IndicatorPort for IndicatorDriver<G, Y, R>
where
    G: OutputPin,
    Y: OutputPin,
    R: OutputPin,
{
    fn apply(&mut self, level: AlertLevel) {
        match level {
            AlertLevel::Green => self.write(true, false, false),
            AlertLevel::Yellow => self.write(false, true, false),
            AlertLevel::Red => self.write(false, false, true),
        }
        self.lit = Some(level);
    }

    fn all_off(&mut self) {
        self.write(false, false, false);
        self.lit = None;
    }
}
