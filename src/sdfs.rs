//! SD card filesystem backend (`embedded-sdmmc` over SPI).
//!
//! Binds the [`Storage`](crate::storage::Storage) boundary to a FAT
//! volume on the card. The `VolumeManager` lives in a `StaticCell` in
//! `main.rs`; both the backend and every open file handle borrow it for
//! `'static`, which keeps the handles usable after `open_write` returns.
//!
//! `embedded-sdmmc` cannot create filesystems or walk the free cluster
//! chain, so `format` and `free_space` report `StorageUnavailable`.

use embassy_time::Instant;
use embedded_hal::delay::DelayNs;
use embedded_hal_bus::spi::ExclusiveDevice;
use embedded_sdmmc::{
    Mode, RawDirectory, RawFile, RawVolume, SdCard, TimeSource, Timestamp, VolumeIdx,
    VolumeManager,
};
use portable_atomic::{AtomicU64, Ordering};

use crate::config::SD_DRIVE;
use crate::console::ClockSetting;
use crate::error::Error;
use crate::storage::{EntryInfo, EntryKind, InputFile, OutputFile, Storage, VolumeStats};

pub type SdSpi = embassy_rp::spi::Spi<'static, embassy_rp::peripherals::SPI0, embassy_rp::spi::Blocking>;
pub type SdCs = embassy_rp::gpio::Output<'static>;
pub type SdSpiDev = ExclusiveDevice<SdSpi, SdCs, SdDelay>;
pub type SdVolumeManager = VolumeManager<SdCard<SdSpiDev, SdDelay>, UptimeClock>;

/// Busy-wait delay for the SD driver (RP2040 at 125 MHz, 8 ns/cycle).
pub struct SdDelay;

impl DelayNs for SdDelay {
    fn delay_ns(&mut self, ns: u32) {
        cortex_m::asm::delay(ns / 8 + 1);
    }
}

/// Wall clock for FAT timestamps: the `setrtc` console command seeds it,
/// uptime carries it forward. Packed as one atomic word so the time
/// source needs no locking.
///
/// Word layout, low to high bytes: sec, min, hour, day, month, year-2000.
static CLOCK_BASE: AtomicU64 = AtomicU64::new(0);
static CLOCK_SET_AT_SECS: AtomicU64 = AtomicU64::new(0);

pub struct UptimeClock;

impl UptimeClock {
    /// Apply a `setrtc` console command.
    pub fn set(setting: &ClockSetting) {
        let packed = (setting.second as u64)
            | (setting.minute as u64) << 8
            | (setting.hour as u64) << 16
            | (setting.day as u64) << 24
            | (setting.month as u64) << 32
            | ((setting.year - 2000) as u64) << 40;
        CLOCK_SET_AT_SECS.store(Instant::now().as_secs(), Ordering::Relaxed);
        CLOCK_BASE.store(packed, Ordering::Relaxed);
    }
}

fn fallback_timestamp() -> Timestamp {
    Timestamp {
        year_since_1970: 55,
        zero_indexed_month: 0,
        zero_indexed_day: 0,
        hours: 0,
        minutes: 0,
        seconds: 0,
    }
}

impl TimeSource for UptimeClock {
    fn get_timestamp(&self) -> Timestamp {
        let packed = CLOCK_BASE.load(Ordering::Relaxed);
        if packed == 0 {
            // Clock never set: a fixed date still yields valid FAT
            // timestamps.
            return fallback_timestamp();
        }

        let elapsed = Instant::now()
            .as_secs()
            .saturating_sub(CLOCK_SET_AT_SECS.load(Ordering::Relaxed));

        let mut sec = (packed & 0xFF) as u64 + elapsed;
        let mut min = (packed >> 8 & 0xFF) as u64 + sec / 60;
        sec %= 60;
        let mut hour = (packed >> 16 & 0xFF) as u64 + min / 60;
        min %= 60;
        // The date does not roll over past midnight; clamp instead.
        if hour > 23 {
            hour = 23;
            min = 59;
            sec = 59;
        }

        let day = (packed >> 24 & 0xFF) as u8;
        let month = (packed >> 32 & 0xFF) as u8;
        let year = 2000 + (packed >> 40 & 0xFF) as u16;

        Timestamp::from_calendar(year, month, day, hour as u8, min as u8, sec as u8)
            .unwrap_or_else(|_| fallback_timestamp())
    }
}

struct MountedVolume {
    volume: RawVolume,
    root: RawDirectory,
}

/// The card-backed storage collaborator.
pub struct SdStorage {
    volume_mgr: &'static SdVolumeManager,
    mounted: Option<MountedVolume>,
}

impl SdStorage {
    pub fn new(volume_mgr: &'static SdVolumeManager) -> Self {
        Self {
            volume_mgr,
            mounted: None,
        }
    }

    fn check_name(&self, name: &str) -> Result<(), Error> {
        if name == SD_DRIVE {
            Ok(())
        } else {
            Err(Error::NotFound)
        }
    }

    fn root(&self) -> Result<RawDirectory, Error> {
        self.mounted
            .as_ref()
            .map(|m| m.root)
            .ok_or(Error::StorageUnavailable)
    }
}

impl Storage for SdStorage {
    type Write = SdOutputFile;
    type Read = SdInputFile;

    fn mount(&mut self, name: &str) -> Result<(), Error> {
        self.check_name(name)?;
        if self.mounted.is_some() {
            return Ok(());
        }
        let volume = self
            .volume_mgr
            .open_raw_volume(VolumeIdx(0))
            .map_err(|_| Error::StorageUnavailable)?;
        let root = match self.volume_mgr.open_root_dir(volume) {
            Ok(d) => d,
            Err(_) => {
                let _ = self.volume_mgr.close_volume(volume);
                return Err(Error::StorageUnavailable);
            }
        };
        self.mounted = Some(MountedVolume { volume, root });
        Ok(())
    }

    fn unmount(&mut self, name: &str) -> Result<(), Error> {
        self.check_name(name)?;
        if let Some(m) = self.mounted.take() {
            let _ = self.volume_mgr.close_dir(m.root);
            self.volume_mgr
                .close_volume(m.volume)
                .map_err(|_| Error::StorageUnavailable)?;
        }
        Ok(())
    }

    fn format(&mut self, name: &str) -> Result<(), Error> {
        self.check_name(name)?;
        // No mkfs support in the FAT driver.
        Err(Error::StorageUnavailable)
    }

    fn free_space(&mut self, name: &str) -> Result<VolumeStats, Error> {
        self.check_name(name)?;
        // The FAT driver cannot walk the free cluster chain.
        Err(Error::StorageUnavailable)
    }

    fn list(&mut self, path: &str, on_entry: &mut dyn FnMut(&EntryInfo)) -> Result<(), Error> {
        let root = self.root()?;
        let (dir, opened) = if path.is_empty() || path == "/" {
            (root, false)
        } else {
            let sub = self
                .volume_mgr
                .open_dir(root, path)
                .map_err(|_| Error::NotFound)?;
            (sub, true)
        };

        let result = self
            .volume_mgr
            .iterate_dir(dir, |entry| {
                let mut name = heapless::String::new();
                let base = entry.name.base_name();
                let ext = entry.name.extension();
                for &b in base {
                    let _ = name.push(b as char);
                }
                if !ext.is_empty() {
                    let _ = name.push('.');
                    for &b in ext {
                        let _ = name.push(b as char);
                    }
                }
                let kind = if entry.attributes.is_directory() {
                    EntryKind::Directory
                } else if entry.attributes.is_read_only() {
                    EntryKind::ReadOnlyFile
                } else {
                    EntryKind::File
                };
                on_entry(&EntryInfo {
                    name,
                    kind,
                    size: entry.size as u64,
                });
            })
            .map_err(|_| Error::StorageUnavailable);

        if opened {
            let _ = self.volume_mgr.close_dir(dir);
        }
        result
    }

    fn open_write(&mut self, name: &str, truncate: bool) -> Result<SdOutputFile, Error> {
        let root = self.root()?;
        let mode = if truncate {
            Mode::ReadWriteCreateOrTruncate
        } else {
            Mode::ReadWriteCreateOrAppend
        };
        let file = self
            .volume_mgr
            .open_file_in_dir(root, name, mode)
            .map_err(|_| Error::StorageUnavailable)?;
        Ok(SdOutputFile {
            volume_mgr: self.volume_mgr,
            file,
        })
    }

    fn open_read(&mut self, name: &str) -> Result<SdInputFile, Error> {
        let root = self.root()?;
        let file = self
            .volume_mgr
            .open_file_in_dir(root, name, Mode::ReadOnly)
            .map_err(|e| match e {
                embedded_sdmmc::Error::FileNotFound => Error::NotFound,
                _ => Error::StorageUnavailable,
            })?;
        Ok(SdInputFile {
            volume_mgr: self.volume_mgr,
            file,
        })
    }
}

/// An open file handle for appending; closes itself on drop.
pub struct SdOutputFile {
    volume_mgr: &'static SdVolumeManager,
    file: RawFile,
}

impl OutputFile for SdOutputFile {
    fn write_all(&mut self, data: &[u8]) -> Result<(), Error> {
        self.volume_mgr
            .write(self.file, data)
            .map_err(|_| Error::WriteFailure)
    }

    fn flush(&mut self) -> Result<(), Error> {
        self.volume_mgr
            .flush_file(self.file)
            .map_err(|_| Error::WriteFailure)
    }
}

impl Drop for SdOutputFile {
    fn drop(&mut self) {
        let _ = self.volume_mgr.close_file(self.file);
    }
}

pub struct SdInputFile {
    volume_mgr: &'static SdVolumeManager,
    file: RawFile,
}

impl InputFile for SdInputFile {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Error> {
        if self
            .volume_mgr
            .file_eof(self.file)
            .map_err(|_| Error::StorageUnavailable)?
        {
            return Ok(0);
        }
        self.volume_mgr
            .read(self.file, buf)
            .map_err(|_| Error::StorageUnavailable)
    }
}

impl Drop for SdInputFile {
    fn drop(&mut self) {
        let _ = self.volume_mgr.close_file(self.file);
    }
}
