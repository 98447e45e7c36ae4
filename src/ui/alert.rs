//! Status LEDs and buzzer.
//!
//! The mode table in [`crate::mode`] decides what to show; this module
//! only drives the pins. Beep sequences are played inline in the main
//! loop (the longest pattern is under a second, well inside the panel
//! refresh period).

use embassy_rp::gpio::Output;
use embassy_time::Timer;

use crate::config::BEEP_GAP_MS;
use crate::mode::{BeepPattern, LedPattern};

pub struct Alert {
    green: Output<'static>,
    blue: Output<'static>,
    red: Output<'static>,
    buzzer: Output<'static>,
}

impl Alert {
    pub fn new(
        green: Output<'static>,
        blue: Output<'static>,
        red: Output<'static>,
        buzzer: Output<'static>,
    ) -> Self {
        Self {
            green,
            blue,
            red,
            buzzer,
        }
    }

    pub fn apply_leds(&mut self, pattern: LedPattern) {
        self.green.set_level(pattern.green.into());
        self.blue.set_level(pattern.blue.into());
        self.red.set_level(pattern.red.into());
    }

    /// Play one beep sequence, `BEEP_GAP_MS` of silence between tones.
    pub async fn play(&mut self, beeps: BeepPattern) {
        for (i, &duration_ms) in beeps.iter().enumerate() {
            if i > 0 {
                Timer::after_millis(BEEP_GAP_MS).await;
            }
            self.buzzer.set_high();
            Timer::after_millis(duration_ms as u64).await;
            self.buzzer.set_low();
        }
    }
}
