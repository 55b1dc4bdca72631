//! Actuator drivers, button inputs, hardware initialisation, and task
//! placement.

pub mod button;
pub mod buzzer;
pub mod hw_init;
pub mod indicator;
pub mod task_pin;
