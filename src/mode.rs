//! Operational mode state machine.
//!
//! A single `Mode` value is the source of truth for what the system is
//! doing; LEDs, buzzer and panel content are all a function of it.
//! `ModeStatus` wraps the current mode and remembers the last announced
//! one, so the indicator/alert side effects fire exactly once per mode
//! change rather than once per loop iteration.

/// System modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Mode {
    /// Power-on hold; peripherals coming up.
    Init,
    /// Idle, ready for commands.
    Normal,
    /// Mounting the SD card.
    Mounting,
    /// Unmounting the SD card.
    Unmounting,
    /// Directory listing in progress.
    Listing,
    /// Free-space query in progress.
    SpaceQuery,
    /// Reformatting the medium.
    Formatting,
    /// Command list shown.
    Help,
    /// Streaming a file to the console.
    ReadFile,
    /// Capture session active, samples being logged.
    Capturing,
    /// Capture session closing.
    Stopping,
    /// A collaborator failed; informational, next trigger recovers.
    Error,
}

/// Indicator LED pattern (three discrete LEDs).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LedPattern {
    pub green: bool,
    pub blue: bool,
    pub red: bool,
}

/// Buzzer pulse durations in ms, played back-to-back with a fixed gap.
pub type BeepPattern = &'static [u16];

impl Mode {
    /// Indicator pattern for this mode, or `None` to leave the LEDs as
    /// they are (transient modes such as Mounting inherit the previous
    /// pattern).
    pub fn leds(self) -> Option<LedPattern> {
        let (green, blue, red) = match self {
            Mode::Init | Mode::Normal => (true, true, true),
            Mode::Capturing => (false, true, true),
            Mode::Stopping => (true, false, false),
            Mode::Error => (false, false, true),
            Mode::Listing | Mode::ReadFile => (false, true, false),
            Mode::Mounting
            | Mode::Unmounting
            | Mode::SpaceQuery
            | Mode::Formatting
            | Mode::Help => return None,
        };
        Some(LedPattern { green, blue, red })
    }

    /// Alert pulse pattern for this mode. The exact counts and durations
    /// are the user-facing status vocabulary; do not tune them.
    pub fn beeps(self) -> BeepPattern {
        match self {
            Mode::Init => &[200, 200],
            Mode::Capturing => &[300],
            Mode::Stopping => &[100, 300],
            Mode::Error => &[300, 300, 300],
            Mode::Listing | Mode::ReadFile => &[100, 100, 100],
            Mode::Normal
            | Mode::Mounting
            | Mode::Unmounting
            | Mode::SpaceQuery
            | Mode::Formatting
            | Mode::Help => &[],
        }
    }
}

/// Indicator/alert outputs emitted on a mode transition edge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Announcement {
    pub mode: Mode,
    pub leds: Option<LedPattern>,
    pub beeps: BeepPattern,
}

/// Current mode plus the last mode whose outputs were emitted.
pub struct ModeStatus {
    current: Mode,
    announced: Option<Mode>,
}

impl ModeStatus {
    pub const fn new() -> Self {
        Self {
            current: Mode::Init,
            announced: None,
        }
    }

    pub fn current(&self) -> Mode {
        self.current
    }

    pub fn set(&mut self, mode: Mode) {
        self.current = mode;
    }

    /// Outputs for the current mode, exactly once per mode change.
    /// Returns `None` while the mode is unchanged since the last call
    /// that returned `Some`.
    pub fn take_announcement(&mut self) -> Option<Announcement> {
        if self.announced == Some(self.current) {
            return None;
        }
        self.announced = Some(self.current);
        Some(Announcement {
            mode: self.current,
            leds: self.current.leds(),
            beeps: self.current.beeps(),
        })
    }
}

impl Default for ModeStatus {
    fn default() -> Self {
        Self::new()
    }
}
