//! GPIO button input with timestamp debouncing.
//!
//! Two physical buttons (active-low with internal pull-up):
//!   - CAPTURE - toggle the logging session
//!   - MOUNT   - toggle the SD card mount
//!
//! Each button is handled by an async task that waits for a falling
//! edge, filters it through the shared refractory window, and flips the
//! matching desired-state flag. The main loop picks the flag change up
//! on its next iteration.

use defmt::info;
use embassy_rp::gpio::Input;
use embassy_time::Instant;

use crate::config::BUTTON_DEBOUNCE_US;
use crate::debounce::{Debouncer, EdgeFlags};

/// Which flag a button toggles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ButtonRole {
    Capture,
    Mount,
}

/// Run a single button loop.
#[embassy_executor::task(pool_size = 2)]
pub async fn button_task(mut btn: Input<'static>, role: ButtonRole, flags: &'static EdgeFlags) {
    let mut debounce = Debouncer::new(BUTTON_DEBOUNCE_US);

    loop {
        // Active-low press.
        btn.wait_for_falling_edge().await;

        if !debounce.accept(Instant::now().as_micros()) {
            continue;
        }

        let desired = match role {
            ButtonRole::Capture => flags.toggle_capture(),
            ButtonRole::Mount => flags.toggle_mount(),
        };
        info!("Button: {} -> {}", role, desired);
    }
}
