//! Piezo buzzer driver.
//!
//! A passive piezo on an LEDC PWM channel.  The channel runs a fixed
//! carrier (1 kHz by default); "on" means the configured duty, "off" means
//! the channel is fully off.  The 1 Hz beep pattern is produced by the
//! alarm task toggling between the two.
//!
//! ## Dual-target design
//!
//! Generic over [`embedded_hal::pwm::SetDutyCycle`]: on ESP-IDF the
//! channel comes from `hw_init::LedcChannel`; on host/test any recording
//! mock will do.

use embedded_hal::pwm::SetDutyCycle;
use log::error;

use crate::error::AlarmFault;

pub struct BuzzerDriver<P> {
    pwm: P,
    duty_percent: u8,
    sounding: bool,
}

impl<P: SetDutyCycle> BuzzerDriver<P> {
    pub fn new(pwm: P, duty_percent: u8) -> Self {
        Self {
            pwm,
            duty_percent: duty_percent.clamp(1, 100),
            sounding: false,
        }
    }

    pub fn sound(&mut self) -> Result<(), AlarmFault> {
        self.pwm.set_duty_cycle_percent(self.duty_percent).map_err(|e| {
            error!("buzzer: duty write failed: {:?}", e);
            AlarmFault::BuzzerWriteFailed
        })?;
        self.sounding = true;
        Ok(())
    }

    pub fn silence(&mut self) -> Result<(), AlarmFault> {
        self.pwm.set_duty_cycle_fully_off().map_err(|e| {
            error!("buzzer: off write failed: {:?}", e);
            AlarmFault::BuzzerWriteFailed
        })?;
        self.sounding = false;
        Ok(())
    }

    pub fn is_sounding(&self) -> bool {
        self.sounding
    }
}
