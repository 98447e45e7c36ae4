//! Unified error type for motionlog.
//!
//! We avoid `alloc` - all error variants carry only fixed-size data.
//! Implements `defmt::Format` for efficient on-target logging.

/// Top-level error type used across the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    // Capture session
    /// A capture session is already open.
    AlreadyActive,

    /// No capture session is open.
    NotActive,

    // Storage
    /// The medium is not mounted or cannot accept a new stream.
    StorageUnavailable,

    /// An I/O write failed while logging; the session was closed.
    WriteFailure,

    /// Unknown file or drive name.
    NotFound,

    // Collaborators
    /// The inertial sensor did not respond.
    Sensor,
}
