//! Pass-through transport abstraction
//!
//! A transport moves one 16-byte CDB plus an optional data phase to the
//! device and back. It knows nothing about the IT8951 command set.

use std::path::PathBuf;
use std::time::Duration;

use crate::cdb::Cdb;

/// Largest single data phase the RamDisc firmware accepts (60 KiB).
pub const MAX_TRANSFER_LEN: usize = 60 * 1024;

/// Direction and size of the data phase that accompanies a CDB.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataDirection<'a> {
    /// Device → host, at most this many bytes.
    In(usize),
    /// Host → device, exactly these bytes (may be empty).
    Out(&'a [u8]),
}

impl DataDirection<'_> {
    /// Requested or supplied transfer length in bytes.
    pub fn len(&self) -> usize {
        match self {
            Self::In(len) => *len,
            Self::Out(data) => data.len(),
        }
    }

    /// True when there is no data phase.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A raw CDB pipe to one device.
///
/// Implementations must be a pure byte pipe: they never inspect the CDB or
/// payload beyond handing them to the OS.
pub trait Transport {
    /// Issue `cdb` with the given data phase, blocking for at most `timeout`.
    ///
    /// For [`DataDirection::In`] the returned buffer is truncated to the
    /// number of bytes the device actually returned. For
    /// [`DataDirection::Out`] the returned buffer is empty.
    fn send(
        &self,
        cdb: &Cdb,
        direction: DataDirection<'_>,
        timeout: Duration,
    ) -> Result<Vec<u8>, TransportError>;

    /// Largest data phase this transport accepts in one call.
    fn max_transfer_len(&self) -> usize {
        MAX_TRANSFER_LEN
    }
}

impl<T: Transport + ?Sized> Transport for &T {
    fn send(
        &self,
        cdb: &Cdb,
        direction: DataDirection<'_>,
        timeout: Duration,
    ) -> Result<Vec<u8>, TransportError> {
        (**self).send(cdb, direction, timeout)
    }

    fn max_transfer_len(&self) -> usize {
        (**self).max_transfer_len()
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn send(
        &self,
        cdb: &Cdb,
        direction: DataDirection<'_>,
        timeout: Duration,
    ) -> Result<Vec<u8>, TransportError> {
        (**self).send(cdb, direction, timeout)
    }

    fn max_transfer_len(&self) -> usize {
        (**self).max_transfer_len()
    }
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Device-side limits applied when a backend is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransportConfig {
    /// Largest data phase issued in one pass-through call.
    pub max_transfer_len: usize,
}

impl TransportConfig {
    /// RamDisc firmware default: 60 KiB per transfer.
    pub const DEFAULT: Self = Self {
        max_transfer_len: MAX_TRANSFER_LEN,
    };
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Per-direction timeouts handed to every [`Transport::send`] call.
///
/// Reads are short register/info queries; writes carry up to 60 KiB of
/// pixels and a panel refresh, so they get a much longer budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    /// Timeout for data-in requests.
    pub read: Duration,
    /// Timeout for data-out requests.
    pub write: Duration,
}

impl Timeouts {
    /// 1 s for reads, 10 s for writes.
    pub const DEFAULT: Self = Self {
        read: Duration::from_millis(1_000),
        write: Duration::from_millis(10_000),
    };

    /// Timeout to use for `direction`.
    pub fn for_direction(&self, direction: &DataDirection<'_>) -> Duration {
        match direction {
            DataDirection::In(_) => self.read,
            DataDirection::Out(_) => self.write,
        }
    }
}

impl Default for Timeouts {
    fn default() -> Self {
        Self::DEFAULT
    }
}

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Transport failures.
///
/// Everything after a successful open collapses into
/// [`TransportError::PassThrough`]: the layers above never distinguish a
/// timeout from an ioctl error.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The device node could not be opened.
    #[error("failed to open device {}: {source}", path.display())]
    Open {
        /// Node that was requested.
        path: PathBuf,
        /// OS error from open(2) / CreateFileW.
        #[source]
        source: std::io::Error,
    },
    /// The pass-through request failed or timed out.
    #[error("SCSI pass-through failed: {0}")]
    PassThrough(#[source] std::io::Error),
    /// The data phase does not fit the OS request header.
    #[error("transfer of {len} bytes exceeds the pass-through limit")]
    TransferTooLarge {
        /// Requested length in bytes.
        len: usize,
    },
}
