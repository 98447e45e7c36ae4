//! Storage collaborator boundary.
//!
//! The core logic never touches a filesystem driver directly; it goes
//! through these traits. The firmware binds them to an SD card via
//! `embedded-sdmmc`, the host tests to an in-memory mock.
//!
//! Failures are never retried here: a single error propagates up and the
//! supervisor translates it into the Error mode.

use crate::error::Error;

/// An open stream for appending log data.
pub trait OutputFile {
    fn write_all(&mut self, data: &[u8]) -> Result<(), Error>;

    /// Durability flush: push buffered data through to the medium.
    fn flush(&mut self) -> Result<(), Error>;
}

/// An open stream for reading a file back.
pub trait InputFile {
    /// Read up to `buf.len()` bytes. `Ok(0)` means end of file.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Error>;
}

/// Directory entry kind, as reported by `Storage::list`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EntryKind {
    File,
    ReadOnlyFile,
    Directory,
}

/// One directory entry. Names are 8.3 short names on FAT media.
#[derive(Debug, Clone)]
pub struct EntryInfo {
    pub name: heapless::String<16>,
    pub kind: EntryKind,
    pub size: u64,
}

/// Volume usage summary for the free-space query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct VolumeStats {
    pub total_kib: u32,
    pub free_kib: u32,
}

/// The removable-medium filesystem collaborator.
///
/// `name` selects the volume (the firmware has a single card,
/// `config::SD_DRIVE`); an unknown name yields `NotFound`.
pub trait Storage {
    type Write: OutputFile;
    type Read: InputFile;

    fn mount(&mut self, name: &str) -> Result<(), Error>;

    fn unmount(&mut self, name: &str) -> Result<(), Error>;

    fn format(&mut self, name: &str) -> Result<(), Error>;

    fn free_space(&mut self, name: &str) -> Result<VolumeStats, Error>;

    /// Enumerate directory entries, invoking `on_entry` for each one.
    fn list(&mut self, path: &str, on_entry: &mut dyn FnMut(&EntryInfo)) -> Result<(), Error>;

    /// Open a fresh write stream. `truncate` discards existing content.
    fn open_write(&mut self, name: &str, truncate: bool) -> Result<Self::Write, Error>;

    fn open_read(&mut self, name: &str) -> Result<Self::Read, Error>;
}
