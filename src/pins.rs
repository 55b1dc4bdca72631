//! GPIO / peripheral pin assignments for the AirWatch node.
//!
//! Single source of truth; every driver references this module rather than
//! hard-coding pin numbers.

// ---------------------------------------------------------------------------
// Tri-colour light stack (active HIGH)
// ---------------------------------------------------------------------------

pub const LIGHT_GREEN_GPIO: i32 = 10;
pub const LIGHT_YELLOW_GPIO: i32 = 11;
pub const LIGHT_RED_GPIO: i32 = 12;

// ---------------------------------------------------------------------------
// Piezo buzzer (passive, LEDC PWM)
// ---------------------------------------------------------------------------

pub const BUZZER_GPIO: i32 = 15;
/// LEDC channel 0 / timer 0 are reserved for the buzzer.
pub const BUZZER_LEDC_CHANNEL: u32 = 0;
pub const BUZZER_LEDC_TIMER: u32 = 0;
/// LEDC timer resolution (bits).  8-bit gives 0 – 255 duty levels.
pub const PWM_RESOLUTION_BITS: u32 = 8;

// ---------------------------------------------------------------------------
// Push-buttons (pull-down, rising edge)
// ---------------------------------------------------------------------------

/// Silences an active alarm.
pub const OVERRIDE_BUTTON_GPIO: i32 = 1;
/// Cycles the (future) display page.
pub const DISPLAY_BUTTON_GPIO: i32 = 2;

// ---------------------------------------------------------------------------
// I²C buses
// ---------------------------------------------------------------------------

/// I2C0: BME280 climate sensor.
pub const CLIMATE_I2C_SDA_GPIO: i32 = 4;
pub const CLIMATE_I2C_SCL_GPIO: i32 = 5;

/// I2C1: SGP30 air-quality sensor.
pub const AIR_I2C_SDA_GPIO: i32 = 6;
pub const AIR_I2C_SCL_GPIO: i32 = 7;

pub const I2C_FREQ_HZ: u32 = 400_000;
