//! The supervisor: one cooperative main-loop iteration per `poll` call.
//!
//! Owns the mode state machine, the storage mount flag, the capture
//! recorder, the console line assembler and the two scheduling
//! deadlines. Hardware stays outside: button flags, console bytes and
//! sensor samples come in through `PollInputs`; indicator/alert output,
//! panel content and flag re-sync requests go out through `PollOutput`.
//!
//! Sampling and panel refresh run on independent deadlines so a slow
//! render cannot skew the logging rate.

use core::fmt::Write as _;

use crate::config::{DISPLAY_PERIOD_MS, INIT_HOLD_MS, LOG_FILENAME, SAMPLE_PERIOD_MS, SD_DRIVE};
use crate::console::{self, ClockSetting, Command, ConsoleOut, LineAssembler, ParseError};
use crate::error::Error;
use crate::mode::{Announcement, Mode, ModeStatus};
use crate::sample::MotionSample;
use crate::session::{Recorder, Tick};
use crate::storage::{EntryKind, InputFile, Storage};

/// Stimuli for one loop iteration.
#[derive(Debug, Clone, Copy)]
pub struct PollInputs {
    pub now_ms: u64,
    /// Debounced desired-state flags (read from the shared atomics).
    pub capture_flag: bool,
    pub mount_flag: bool,
    /// At most one pending console byte per iteration.
    pub console_byte: Option<u8>,
    /// Latest converted sensor sample.
    pub sample: MotionSample,
}

/// What the status panel should show.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Screen {
    /// Live capture view with current orientation.
    Capture { roll_deg: f32, pitch_deg: f32 },
    /// Idle/system view with the card state.
    Status { mounted: bool },
    /// Directory listing announced (details go to the console).
    Listing,
    /// File readback announced (contents go to the console).
    Reading,
    /// Capture finished; final sample count.
    Stopped { samples: u32 },
    /// Error view with the card state.
    Error { mounted: bool },
    /// Button/command legend.
    Help,
}

/// Effects of one iteration, applied by the caller.
#[derive(Debug, Default)]
pub struct PollOutput {
    /// Indicator/alert outputs; `Some` exactly once per mode change.
    pub announcement: Option<Announcement>,
    /// Panel content; `Some` when the mode changed or the render
    /// deadline elapsed.
    pub screen: Option<Screen>,
    /// Store this into the shared capture flag (console took the action
    /// a button toggle would have).
    pub sync_capture: Option<bool>,
    /// Likewise for the mount flag.
    pub sync_mount: Option<bool>,
    /// Apply this to the real-time clock.
    pub set_clock: Option<ClockSetting>,
}

/// The operational core, generic over the storage collaborator.
pub struct App<S: Storage> {
    status: ModeStatus,
    recorder: Recorder<S::Write>,
    line: LineAssembler,
    mounted: bool,
    capture_seen: bool,
    mount_seen: bool,
    render_deadline_ms: u64,
    last_sample_total: u32,
}

impl<S: Storage> App<S> {
    pub fn new() -> Self {
        Self {
            status: ModeStatus::new(),
            recorder: Recorder::new(SAMPLE_PERIOD_MS),
            line: LineAssembler::new(),
            mounted: false,
            capture_seen: false,
            mount_seen: false,
            render_deadline_ms: 0,
            last_sample_total: 0,
        }
    }

    pub fn mode(&self) -> Mode {
        self.status.current()
    }

    pub fn mounted(&self) -> bool {
        self.mounted
    }

    pub fn capture_active(&self) -> bool {
        self.recorder.is_active()
    }

    pub fn samples_logged(&self) -> u32 {
        self.recorder.sample_count()
    }

    /// Run one main-loop iteration.
    pub fn poll(
        &mut self,
        storage: &mut S,
        out: &mut impl ConsoleOut,
        inputs: &PollInputs,
    ) -> PollOutput {
        let mut output = PollOutput::default();

        // Boot hold expires into Normal.
        if self.status.current() == Mode::Init && inputs.now_ms >= INIT_HOLD_MS {
            self.status.set(Mode::Normal);
        }

        // (a) Edge-flag changes against the shadows, exactly once each.
        if inputs.mount_flag != self.mount_seen {
            self.mount_seen = inputs.mount_flag;
            if inputs.mount_flag {
                self.do_mount(storage, out);
            } else {
                self.do_unmount(storage, out);
            }
        }
        if inputs.capture_flag != self.capture_seen {
            self.capture_seen = inputs.capture_flag;
            if inputs.capture_flag {
                self.do_start(storage, out, inputs.now_ms);
            } else {
                self.do_stop(out);
            }
        }

        // (b) At most one console byte per iteration.
        if let Some(byte) = inputs.console_byte {
            self.echo(out, byte);
            if let Some(line) = self.line.push(byte) {
                match console::parse(&line) {
                    Ok(cmd) => self.dispatch(cmd, storage, out, inputs.now_ms, &mut output),
                    Err(e) => report_parse_error(out, &line, e),
                }
                out.print("> ");
            }
        }

        // (c)+(d) Log the sample if a session is active and due.
        match self.recorder.tick(&inputs.sample, inputs.now_ms) {
            Ok(Tick::LoggedAndFlushed) => {
                let mut msg: heapless::String<48> = heapless::String::new();
                let _ = write!(msg, "Saved {} samples...\r\n", self.recorder.sample_count());
                out.print(&msg);
            }
            Ok(_) => {}
            Err(_) => {
                out.print("[ERROR] CSV write failed, capture stopped.\r\n");
                self.status.set(Mode::Error);
            }
        }

        // (e) Announce and render on the transition edge, plus the fixed
        // render cadence.
        output.announcement = self.status.take_announcement();
        if output.announcement.is_some() || inputs.now_ms >= self.render_deadline_ms {
            self.render_deadline_ms = inputs.now_ms + DISPLAY_PERIOD_MS;
            output.screen = Some(self.screen(&inputs.sample));
        }

        output
    }

    fn screen(&self, sample: &MotionSample) -> Screen {
        match self.status.current() {
            Mode::Capturing => Screen::Capture {
                roll_deg: sample.roll_deg,
                pitch_deg: sample.pitch_deg,
            },
            Mode::Listing => Screen::Listing,
            Mode::ReadFile => Screen::Reading,
            Mode::Stopping => Screen::Stopped {
                samples: self.last_sample_total,
            },
            Mode::Error => Screen::Error {
                mounted: self.mounted,
            },
            Mode::Help => Screen::Help,
            Mode::Init
            | Mode::Normal
            | Mode::Mounting
            | Mode::Unmounting
            | Mode::SpaceQuery
            | Mode::Formatting => Screen::Status {
                mounted: self.mounted,
            },
        }
    }

    fn echo(&self, out: &mut impl ConsoleOut, byte: u8) {
        match byte {
            b'\r' => out.print("\r\n"),
            0x20..=0x7E => {
                let buf = [byte];
                if let Ok(s) = core::str::from_utf8(&buf) {
                    out.print(s);
                }
            }
            _ => {}
        }
    }

    fn dispatch(
        &mut self,
        cmd: Command,
        storage: &mut S,
        out: &mut impl ConsoleOut,
        now_ms: u64,
        output: &mut PollOutput,
    ) {
        match cmd {
            Command::Mount => {
                self.do_mount(storage, out);
                self.mount_seen = true;
                output.sync_mount = Some(true);
            }
            Command::Unmount => {
                self.do_unmount(storage, out);
                self.mount_seen = false;
                output.sync_mount = Some(false);
            }
            Command::StartCapture => {
                self.do_start(storage, out, now_ms);
                self.capture_seen = true;
                output.sync_capture = Some(true);
            }
            Command::StopCapture => {
                self.do_stop(out);
                self.capture_seen = false;
                output.sync_capture = Some(false);
            }
            Command::List(path) => self.do_list(storage, out, path.as_deref().unwrap_or("")),
            Command::Free => self.do_free(storage, out),
            Command::Format => self.do_format(storage, out),
            Command::Cat(name) => self.do_cat(storage, out, &name),
            Command::Help => {
                self.status.set(Mode::Help);
                out.print(console::HELP_TEXT);
            }
            Command::SetClock(setting) => {
                output.set_clock = Some(setting);
                out.print("RTC set.\r\n");
            }
        }
    }

    fn do_mount(&mut self, storage: &mut S, out: &mut impl ConsoleOut) {
        self.status.set(Mode::Mounting);
        out.print("Mounting the SD card...\r\n");
        match storage.mount(SD_DRIVE) {
            Ok(()) => {
                self.mounted = true;
                out.print("SD card mounted.\r\n");
            }
            Err(_) => {
                out.print("[ERROR] mount failed.\r\n");
                self.status.set(Mode::Error);
            }
        }
    }

    fn do_unmount(&mut self, storage: &mut S, out: &mut impl ConsoleOut) {
        self.status.set(Mode::Unmounting);
        out.print("Unmounting the SD card...\r\n");
        match storage.unmount(SD_DRIVE) {
            Ok(()) => {
                self.mounted = false;
                out.print("SD card unmounted.\r\n");
            }
            Err(_) => {
                out.print("[ERROR] unmount failed.\r\n");
                self.status.set(Mode::Error);
            }
        }
    }

    fn do_start(&mut self, storage: &mut S, out: &mut impl ConsoleOut, now_ms: u64) {
        self.status.set(Mode::Capturing);

        if self.recorder.is_active() {
            out.print("[ERROR] capture is already active.\r\n");
            self.status.set(Mode::Error);
            return;
        }
        // Fail fast before touching the medium.
        if !self.mounted {
            out.print("[ERROR] SD card not mounted; cannot start capture.\r\n");
            self.status.set(Mode::Error);
            return;
        }

        let sink = match storage.open_write(LOG_FILENAME, true) {
            Ok(sink) => sink,
            Err(_) => {
                out.print("[ERROR] could not create the CSV file.\r\n");
                self.status.set(Mode::Error);
                return;
            }
        };
        match self.recorder.start(sink, now_ms) {
            Ok(()) => {
                out.print("Continuous capture started (10 Hz). Press 'i' to stop.\r\n");
            }
            Err(_) => {
                out.print("[ERROR] could not write the CSV header.\r\n");
                self.status.set(Mode::Error);
            }
        }
    }

    fn do_stop(&mut self, out: &mut impl ConsoleOut) {
        self.status.set(Mode::Stopping);
        match self.recorder.stop() {
            Ok(count) => {
                self.last_sample_total = count;
                let mut msg: heapless::String<96> = heapless::String::new();
                let _ = write!(
                    msg,
                    "Capture finished. Total samples: {}\r\nData saved to: {}\r\n",
                    count, LOG_FILENAME
                );
                out.print(&msg);
            }
            Err(Error::NotActive) => {
                out.print("[ERROR] capture is not active.\r\n");
                self.status.set(Mode::Error);
            }
            Err(_) => {
                out.print("[ERROR] final flush failed; the log may be incomplete.\r\n");
                self.status.set(Mode::Error);
            }
        }
    }

    fn do_list(&mut self, storage: &mut S, out: &mut impl ConsoleOut, path: &str) {
        self.status.set(Mode::Listing);
        out.print("Directory listing:\r\n");
        let result = storage.list(path, &mut |entry| {
            let kind = match entry.kind {
                EntryKind::File => "writable file",
                EntryKind::ReadOnlyFile => "read only file",
                EntryKind::Directory => "directory",
            };
            let mut line: heapless::String<64> = heapless::String::new();
            let _ = write!(line, "{} [{}] [size={}]\r\n", entry.name, kind, entry.size);
            out.print(&line);
        });
        if result.is_err() {
            out.print("[ERROR] listing failed; is the card mounted?\r\n");
            self.status.set(Mode::Error);
        }
    }

    fn do_free(&mut self, storage: &mut S, out: &mut impl ConsoleOut) {
        self.status.set(Mode::SpaceQuery);
        match storage.free_space(SD_DRIVE) {
            Ok(stats) => {
                let mut msg: heapless::String<80> = heapless::String::new();
                let _ = write!(
                    msg,
                    "{} KiB total drive space.\r\n{} KiB available.\r\n",
                    stats.total_kib, stats.free_kib
                );
                out.print(&msg);
            }
            Err(_) => {
                out.print("[ERROR] free-space query failed.\r\n");
                self.status.set(Mode::Error);
            }
        }
    }

    fn do_format(&mut self, storage: &mut S, out: &mut impl ConsoleOut) {
        self.status.set(Mode::Formatting);
        out.print("Formatting the SD card. Please wait...\r\n");
        match storage.format(SD_DRIVE) {
            Ok(()) => out.print("Format complete.\r\n"),
            Err(_) => {
                out.print("[ERROR] format failed.\r\n");
                self.status.set(Mode::Error);
            }
        }
    }

    fn do_cat(&mut self, storage: &mut S, out: &mut impl ConsoleOut, name: &str) {
        self.status.set(Mode::ReadFile);
        let mut file = match storage.open_read(name) {
            Ok(f) => f,
            Err(_) => {
                out.print("[ERROR] could not open file. Use 'c' to list files.\r\n");
                self.status.set(Mode::Error);
                return;
            }
        };

        let mut buf = [0u8; 128];
        loop {
            match file.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => print_lossy(out, &buf[..n]),
                Err(_) => {
                    out.print("[ERROR] read failed.\r\n");
                    self.status.set(Mode::Error);
                    return;
                }
            }
        }
        out.print("\r\n");
    }
}

impl<S: Storage> Default for App<S> {
    fn default() -> Self {
        Self::new()
    }
}

/// Prints a byte chunk as text, substituting `?` for bytes that do not
/// form valid UTF-8.
fn print_lossy(out: &mut impl ConsoleOut, mut bytes: &[u8]) {
    while !bytes.is_empty() {
        match core::str::from_utf8(bytes) {
            Ok(text) => {
                out.print(text);
                break;
            }
            Err(err) => {
                let valid = err.valid_up_to();
                if let Ok(text) = core::str::from_utf8(&bytes[..valid]) {
                    out.print(text);
                }
                out.print("?");
                let skip = valid + err.error_len().unwrap_or(bytes.len() - valid);
                bytes = &bytes[skip..];
            }
        }
    }
}

fn report_parse_error(out: &mut impl ConsoleOut, line: &str, err: ParseError) {
    // Unknown tokens are reported but never change the mode.
    match err {
        ParseError::UnknownCommand => {
            let mut msg: heapless::String<80> = heapless::String::new();
            let _ = write!(msg, "Command \"{}\" not found\r\n", line.trim());
            out.print(&msg);
        }
        ParseError::MissingArgument => out.print("Missing argument\r\n"),
        ParseError::BadArgument => out.print("Bad argument\r\n"),
    }
}
