//! Line-oriented console: byte-at-a-time line assembly, tokenizing and
//! the command vocabulary.
//!
//! Named commands and single-letter shortcuts resolve to the same
//! `Command` enum and flow through one dispatch path in the supervisor.
//! A shortcut is simply a completed one-character line.

use crate::config::{COMMAND_BUF_SIZE, LOG_FILENAME};

/// A completed console line.
pub type Line = heapless::String<COMMAND_BUF_SIZE>;

/// Where command responses go (the UART on target, a string collector in
/// tests).
pub trait ConsoleOut {
    fn print(&mut self, s: &str);
}

/// Parsed `setrtc` arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ClockSetting {
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

/// Console command vocabulary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Mount,
    Unmount,
    Format,
    List(Option<heapless::String<32>>),
    Cat(heapless::String<32>),
    Free,
    Help,
    SetClock(ClockSetting),
    StartCapture,
    StopCapture,
}

/// Why a line failed to parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParseError {
    UnknownCommand,
    MissingArgument,
    BadArgument,
}

/// Assembles console bytes into lines, handling backspace and ignoring
/// non-printable input. The caller is responsible for echoing.
pub struct LineAssembler {
    buf: Line,
}

impl LineAssembler {
    pub const fn new() -> Self {
        Self {
            buf: heapless::String::new(),
        }
    }

    /// Feed one byte. Returns the completed line on CR (empty lines are
    /// swallowed).
    pub fn push(&mut self, byte: u8) -> Option<Line> {
        match byte {
            b'\r' => {
                if self.buf.is_empty() {
                    return None;
                }
                let line = self.buf.clone();
                self.buf.clear();
                Some(line)
            }
            // Backspace / DEL
            0x08 | 0x7F => {
                self.buf.pop();
                None
            }
            // Printable ASCII only; LF and control bytes are dropped.
            0x20..=0x7E => {
                let _ = self.buf.push(byte as char);
                None
            }
            _ => None,
        }
    }
}

impl Default for LineAssembler {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolve a single-letter shortcut (`a`..`i`).
pub fn shortcut(letter: u8) -> Option<Command> {
    let cmd = match letter {
        b'a' => Command::Mount,
        b'b' => Command::Unmount,
        b'c' => Command::List(None),
        b'd' => {
            let mut name = heapless::String::new();
            let _ = name.push_str(LOG_FILENAME);
            Command::Cat(name)
        }
        b'e' => Command::Free,
        b'f' => Command::Format,
        b'g' => Command::Help,
        b'h' => Command::StartCapture,
        b'i' => Command::StopCapture,
        _ => return None,
    };
    Some(cmd)
}

/// Tokenize a completed line into a command.
pub fn parse(line: &str) -> Result<Command, ParseError> {
    let trimmed = line.trim();

    // One-character lines are keyed shortcuts.
    if trimmed.len() == 1 {
        if let Some(cmd) = shortcut(trimmed.as_bytes()[0]) {
            return Ok(cmd);
        }
    }

    let mut tokens = trimmed.split_whitespace();
    let name = tokens.next().ok_or(ParseError::UnknownCommand)?;

    match name {
        "mount" => Ok(Command::Mount),
        "unmount" => Ok(Command::Unmount),
        "format" => Ok(Command::Format),
        "ls" | "list" => Ok(Command::List(tokens.next().map(to_arg))),
        "cat" => {
            let file = tokens.next().ok_or(ParseError::MissingArgument)?;
            Ok(Command::Cat(to_arg(file)))
        }
        "getfree" | "free" => Ok(Command::Free),
        "help" => Ok(Command::Help),
        "setrtc" => parse_setrtc(&mut tokens),
        _ => Err(ParseError::UnknownCommand),
    }
}

fn to_arg(token: &str) -> heapless::String<32> {
    let mut s = heapless::String::new();
    for c in token.chars().take(32) {
        let _ = s.push(c);
    }
    s
}

/// `setrtc <DD> <MM> <YY> <hh> <mm> <ss>` — two-digit year, 2000-based.
fn parse_setrtc<'a>(tokens: &mut impl Iterator<Item = &'a str>) -> Result<Command, ParseError> {
    let mut next_num = |max: u16| -> Result<u16, ParseError> {
        let tok = tokens.next().ok_or(ParseError::MissingArgument)?;
        let n: u16 = tok.parse().map_err(|_| ParseError::BadArgument)?;
        if n > max {
            return Err(ParseError::BadArgument);
        }
        Ok(n)
    };

    let day = next_num(31)? as u8;
    let month = next_num(12)? as u8;
    let year = 2000 + next_num(99)?;
    let hour = next_num(23)? as u8;
    let minute = next_num(59)? as u8;
    let second = next_num(59)? as u8;

    Ok(Command::SetClock(ClockSetting {
        year,
        month,
        day,
        hour,
        minute,
        second,
    }))
}

/// Help text shown by the `help` command / `g` shortcut.
pub const HELP_TEXT: &str = "\
Commands:\r\n\
  a / mount            mount the SD card\r\n\
  b / unmount          unmount the SD card\r\n\
  c / ls [dir]         list files\r\n\
  d / cat <file>       show file contents\r\n\
  e / getfree          free space on the SD card\r\n\
  f / format           format the SD card\r\n\
  g / help             this list\r\n\
  h                    START continuous capture\r\n\
  i                    STOP continuous capture\r\n\
  setrtc DD MM YY hh mm ss\r\n";
