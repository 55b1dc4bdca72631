//! One-shot hardware peripheral initialization.
//!
//! Configures the light-stack GPIOs, the buzzer LEDC timer/channel, and the
//! button interrupts using raw ESP-IDF sys calls.  Called once from
//! `main()` before any task starts.
//!
//! The handles handed out afterwards ([`GpioOutput`], [`LedcChannel`])
//! implement the `embedded-hal` 1.0 traits so the drivers above stay
//! target-independent.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

// ── Error type ────────────────────────────────────────────────

/// Errors during one-shot peripheral initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwInitError {
    GpioConfigFailed(i32),
    LedcInitFailed(i32),
    IsrInstallFailed(i32),
}

impl core::fmt::Display for HwInitError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::GpioConfigFailed(rc) => write!(f, "GPIO config failed (rc={})", rc),
            Self::LedcInitFailed(rc) => write!(f, "LEDC timer/channel config failed (rc={})", rc),
            Self::IsrInstallFailed(rc) => write!(f, "GPIO ISR service install failed (rc={})", rc),
        }
    }
}

impl std::error::Error for HwInitError {}

/// Error from a register write after init (non-zero `esp_err_t`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HwWriteError(pub i32);

impl embedded_hal::digital::Error for HwWriteError {
    fn kind(&self) -> embedded_hal::digital::ErrorKind {
        embedded_hal::digital::ErrorKind::Other
    }
}

impl embedded_hal::pwm::Error for HwWriteError {
    fn kind(&self) -> embedded_hal::pwm::ErrorKind {
        embedded_hal::pwm::ErrorKind::Other
    }
}

#[cfg(target_os = "espidf")]
use log::info;

use crate::pins;

#[cfg(target_os = "espidf")]
pub fn init_peripherals(buzzer_carrier_hz: u32) -> Result<(), HwInitError> {
    // SAFETY: Called once from main() before any task; single-threaded.
    unsafe {
        init_gpio_outputs()?;
        init_gpio_inputs()?;
        init_ledc(buzzer_carrier_hz)?;
    }
    info!("hw_init: all peripherals configured");
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn init_peripherals(_buzzer_carrier_hz: u32) -> Result<(), HwInitError> {
    log::info!("hw_init(sim): peripheral init skipped");
    Ok(())
}

// ── GPIO Outputs (light stack) ────────────────────────────────

#[cfg(target_os = "espidf")]
unsafe fn init_gpio_outputs() -> Result<(), HwInitError> {
    let output_pins = [
        pins::LIGHT_GREEN_GPIO,
        pins::LIGHT_YELLOW_GPIO,
        pins::LIGHT_RED_GPIO,
    ];

    for &pin in &output_pins {
        let cfg = gpio_config_t {
            pin_bit_mask: 1u64 << pin,
            mode: gpio_mode_t_GPIO_MODE_OUTPUT,
            pull_up_en: gpio_pullup_t_GPIO_PULLUP_DISABLE,
            pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
            intr_type: gpio_int_type_t_GPIO_INTR_DISABLE,
        };
        let ret = unsafe { gpio_config(&cfg) };
        if ret != ESP_OK as i32 {
            return Err(HwInitError::GpioConfigFailed(ret));
        }
        unsafe { gpio_set_level(pin, 0) };
    }

    info!("hw_init: light outputs configured");
    Ok(())
}

/// A configured push-pull output.  Construct only after
/// [`init_peripherals`].
#[derive(Debug)]
pub struct GpioOutput {
    pin: i32,
}

impl GpioOutput {
    pub fn new(pin: i32) -> Self {
        Self { pin }
    }

    #[cfg(target_os = "espidf")]
    fn write(&mut self, high: bool) -> Result<(), HwWriteError> {
        // SAFETY: register write to a pin configured in init_gpio_outputs();
        // each pin has exactly one GpioOutput owner.
        let ret = unsafe { gpio_set_level(self.pin, u32::from(high)) };
        if ret != ESP_OK as i32 {
            return Err(HwWriteError(ret));
        }
        Ok(())
    }

    #[cfg(not(target_os = "espidf"))]
    fn write(&mut self, high: bool) -> Result<(), HwWriteError> {
        log::trace!("hw_init(sim): gpio {} <- {}", self.pin, u8::from(high));
        Ok(())
    }
}

impl embedded_hal::digital::ErrorType for GpioOutput {
    type Error = HwWriteError;
}

impl embedded_hal::digital::OutputPin for GpioOutput {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.write(false)
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.write(true)
    }
}

// ── GPIO Inputs (buttons) ─────────────────────────────────────

#[cfg(target_os = "espidf")]
unsafe fn init_gpio_inputs() -> Result<(), HwInitError> {
    for &pin in &[pins::OVERRIDE_BUTTON_GPIO, pins::DISPLAY_BUTTON_GPIO] {
        let cfg = gpio_config_t {
            pin_bit_mask: 1u64 << pin,
            mode: gpio_mode_t_GPIO_MODE_INPUT,
            pull_up_en: gpio_pullup_t_GPIO_PULLUP_DISABLE,
            pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_ENABLE,
            intr_type: gpio_int_type_t_GPIO_INTR_POSEDGE,
        };
        let ret = unsafe { gpio_config(&cfg) };
        if ret != ESP_OK as i32 {
            return Err(HwInitError::GpioConfigFailed(ret));
        }
    }

    info!("hw_init: button inputs configured");
    Ok(())
}

// ── LEDC PWM (buzzer) ─────────────────────────────────────────

#[cfg(target_os = "espidf")]
unsafe fn init_ledc(carrier_hz: u32) -> Result<(), HwInitError> {
    let timer = ledc_timer_config_t {
        speed_mode: ledc_mode_t_LEDC_LOW_SPEED_MODE,
        timer_num: pins::BUZZER_LEDC_TIMER,
        duty_resolution: ledc_timer_bit_t_LEDC_TIMER_8_BIT,
        freq_hz: carrier_hz,
        clk_cfg: soc_periph_ledc_clk_src_legacy_t_LEDC_AUTO_CLK,
        ..Default::default()
    };
    // SAFETY: single-threaded init path.
    let ret = unsafe { ledc_timer_config(&timer) };
    if ret != ESP_OK as i32 {
        return Err(HwInitError::LedcInitFailed(ret));
    }

    let ret = unsafe {
        ledc_channel_config(&ledc_channel_config_t {
            speed_mode: ledc_mode_t_LEDC_LOW_SPEED_MODE,
            channel: pins::BUZZER_LEDC_CHANNEL,
            timer_sel: pins::BUZZER_LEDC_TIMER,
            gpio_num: pins::BUZZER_GPIO,
            duty: 0,
            hpoint: 0,
            ..Default::default()
        })
    };
    if ret != ESP_OK as i32 {
        return Err(HwInitError::LedcInitFailed(ret));
    }

    info!("hw_init: LEDC configured (buzzer=CH{}, {} Hz)", pins::BUZZER_LEDC_CHANNEL, carrier_hz);
    Ok(())
}

/// One LEDC channel at 8-bit resolution.
#[derive(Debug)]
pub struct LedcChannel {
    channel: u32,
}

impl LedcChannel {
    pub fn new(channel: u32) -> Self {
        Self { channel }
    }

    #[cfg(target_os = "espidf")]
    fn write(&mut self, duty: u16) -> Result<(), HwWriteError> {
        // SAFETY: channel configured in init_ledc(); the alarm task is the
        // only owner of the buzzer channel.
        unsafe {
            let ret = ledc_set_duty(ledc_mode_t_LEDC_LOW_SPEED_MODE, self.channel, duty as u32);
            if ret != ESP_OK as i32 {
                return Err(HwWriteError(ret));
            }
            let ret = ledc_update_duty(ledc_mode_t_LEDC_LOW_SPEED_MODE, self.channel);
            if ret != ESP_OK as i32 {
                return Err(HwWriteError(ret));
            }
        }
        Ok(())
    }

    #[cfg(not(target_os = "espidf"))]
    fn write(&mut self, _duty: u16) -> Result<(), HwWriteError> {
        let _ = self.channel;
        Ok(())
    }
}

impl embedded_hal::pwm::ErrorType for LedcChannel {
    type Error = HwWriteError;
}

impl embedded_hal::pwm::SetDutyCycle for LedcChannel {
    fn max_duty_cycle(&self) -> u16 {
        (1u16 << pins::PWM_RESOLUTION_BITS) - 1
    }

    fn set_duty_cycle(&mut self, duty: u16) -> Result<(), Self::Error> {
        self.write(duty)
    }
}

// ── GPIO ISR Service ──────────────────────────────────────────

#[cfg(target_os = "espidf")]
use crate::drivers::button::{display_isr_handler, override_isr_handler};

#[cfg(target_os = "espidf")]
unsafe extern "C" fn override_gpio_isr(_arg: *mut core::ffi::c_void) {
    override_isr_handler();
}

#[cfg(target_os = "espidf")]
unsafe extern "C" fn display_gpio_isr(_arg: *mut core::ffi::c_void) {
    display_isr_handler();
}

/// Install per-pin GPIO ISR service and register the button handlers.
/// Call after init_peripherals().
#[cfg(target_os = "espidf")]
pub fn init_isr_service() -> Result<(), HwInitError> {
    // SAFETY: gpio_install_isr_service is idempotent; ESP_ERR_INVALID_STATE
    // means it was already installed.  The handlers only touch atomics.
    unsafe {
        let ret = gpio_install_isr_service(0);
        if ret != ESP_OK && ret != ESP_ERR_INVALID_STATE {
            return Err(HwInitError::IsrInstallFailed(ret));
        }

        gpio_set_intr_type(pins::OVERRIDE_BUTTON_GPIO, gpio_int_type_t_GPIO_INTR_POSEDGE);
        gpio_isr_handler_add(pins::OVERRIDE_BUTTON_GPIO, Some(override_gpio_isr), core::ptr::null_mut());
        gpio_intr_enable(pins::OVERRIDE_BUTTON_GPIO);

        gpio_set_intr_type(pins::DISPLAY_BUTTON_GPIO, gpio_int_type_t_GPIO_INTR_POSEDGE);
        gpio_isr_handler_add(pins::DISPLAY_BUTTON_GPIO, Some(display_gpio_isr), core::ptr::null_mut());
        gpio_intr_enable(pins::DISPLAY_BUTTON_GPIO);

        info!("hw_init: ISR service installed (override, display)");
    }
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn init_isr_service() -> Result<(), HwInitError> {
    log::info!("hw_init(sim): ISR service skipped");
    Ok(())
}
