//! Operator-facing hardware: buttons, status LEDs + buzzer, OLED panel.

pub mod alert;
pub mod buttons;
pub mod display;
