//! Capture session lifecycle and CSV row emission.
//!
//! A `Recorder` owns at most one open session. The session carries the
//! output stream, the monotonically increasing sample counter and the
//! next sampling deadline; the counter resets only when a session is
//! created.

use core::fmt::Write as _;

use crate::config::{CSV_HEADER, FLUSH_INTERVAL_SAMPLES};
use crate::error::Error;
use crate::sample::MotionSample;
use crate::storage::OutputFile;

/// Outcome of a `tick` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// Inactive, or the sampling deadline has not elapsed yet.
    Idle,
    /// One row appended.
    Logged,
    /// One row appended and a durability flush forced.
    LoggedAndFlushed,
}

struct CaptureSession<W: OutputFile> {
    sink: W,
    counter: u32,
    next_deadline_ms: u64,
}

/// Owns the start/stop lifecycle of the logging session.
pub struct Recorder<W: OutputFile> {
    session: Option<CaptureSession<W>>,
    period_ms: u64,
}

impl<W: OutputFile> Recorder<W> {
    pub const fn new(period_ms: u64) -> Self {
        Self {
            session: None,
            period_ms,
        }
    }

    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    /// Samples logged so far in the open session.
    pub fn sample_count(&self) -> u32 {
        self.session.as_ref().map_or(0, |s| s.counter)
    }

    /// Open a session on `sink`: write the header row, reset the counter
    /// and arm the first deadline at `now + period`.
    pub fn start(&mut self, mut sink: W, now_ms: u64) -> Result<(), Error> {
        if self.session.is_some() {
            return Err(Error::AlreadyActive);
        }
        sink.write_all(CSV_HEADER.as_bytes())
            .map_err(|_| Error::WriteFailure)?;
        self.session = Some(CaptureSession {
            sink,
            counter: 0,
            next_deadline_ms: now_ms + self.period_ms,
        });
        Ok(())
    }

    /// Flush and close the stream; reports the final sample count.
    pub fn stop(&mut self) -> Result<u32, Error> {
        let mut session = self.session.take().ok_or(Error::NotActive)?;
        session.sink.flush().map_err(|_| Error::WriteFailure)?;
        Ok(session.counter)
    }

    /// Log one sample if a session is active and its deadline elapsed.
    ///
    /// A write failure closes the session (the stream is assumed broken)
    /// and surfaces as `WriteFailure`.
    pub fn tick(&mut self, sample: &MotionSample, now_ms: u64) -> Result<Tick, Error> {
        let Some(session) = self.session.as_mut() else {
            return Ok(Tick::Idle);
        };
        if now_ms < session.next_deadline_ms {
            return Ok(Tick::Idle);
        }

        let mut row: heapless::String<128> = heapless::String::new();
        let _ = write!(
            row,
            "{},{:.3},{:.3},{:.3},{:.3},{:.3},{:.3},{:.2},{:.2}\n",
            session.counter,
            sample.accel_g[0],
            sample.accel_g[1],
            sample.accel_g[2],
            sample.gyro_dps[0],
            sample.gyro_dps[1],
            sample.gyro_dps[2],
            sample.roll_deg,
            sample.pitch_deg,
        );

        if session.sink.write_all(row.as_bytes()).is_err() {
            // Implicit stop: never keep writing through a broken handle.
            self.session = None;
            return Err(Error::WriteFailure);
        }

        session.counter += 1;
        session.next_deadline_ms = now_ms + self.period_ms;

        if session.counter % FLUSH_INTERVAL_SAMPLES == 0 {
            if session.sink.flush().is_err() {
                self.session = None;
                return Err(Error::WriteFailure);
            }
            return Ok(Tick::LoggedAndFlushed);
        }
        Ok(Tick::Logged)
    }
}
