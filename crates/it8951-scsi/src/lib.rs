//! IT8951 e-paper controller over SCSI pass-through
//!
//! The IT8951 timing controller enumerates as a USB mass-storage device
//! ("Generic Storage RamDisc"). Every chip command travels inside a 16-byte
//! vendor-specific SCSI CDB, with pixel data and command headers carried as the
//! data phase of the same request.
//!
//! # Architecture Layers
//!
//! ```text
//! Display orchestrator (it8951-screen crate)
//!         ↓
//! Chip protocol  : It8951<T>: identify, registers, system info, load/display, VCOM
//!         ↓                      (cdb, chunk, wire, types)
//! Transport      : Transport trait: raw CDB + data-in / data-out + timeout
//!         ↓
//! OS pass-through (SG_IO on Linux, IOCTL_SCSI_PASS_THROUGH_DIRECT on Windows)
//! ```
//!
//! # Features
//!
//! - `mock`: expose [`mock::MockTransport`], a scripted in-memory transport
//!   for downstream tests.
//!
//! # Example
//!
//! ```no_run
//! use it8951_scsi::{open_device, Area, It8951, TransportConfig, WaveMode};
//!
//! # fn main() -> Result<(), it8951_scsi::Error> {
//! let device = open_device("/dev/sg0", TransportConfig::default())?;
//! let chip = It8951::new(device);
//! chip.identify()?;
//!
//! let info = chip.system_info()?;
//! let panel = Area::full(info.width, info.height);
//! let pixels = vec![0xFF; panel.pixel_count()];
//! chip.load_image(panel, &pixels)?;
//! chip.display(panel, WaveMode::GC16)?;
//! # Ok(())
//! # }
//! ```

// ── Lint policy ─────────────────────────────────────────────────────────────
#![deny(clippy::unwrap_used)] // no .unwrap() in production code
#![deny(clippy::expect_used)] // no .expect() in production code
#![deny(clippy::panic)] // no panic!() in production code
#![deny(unused_must_use)] // all Results must be handled
// ────────────────────────────────────────────────────────────────────────────
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::print_stdout)] // prefer tracing over println! in lib code
#![allow(clippy::doc_markdown)] // register names and hex addresses in doc comments
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

pub mod cdb;
pub mod chunk;
pub mod error;
pub mod protocol;
pub mod transport;
pub mod types;
pub mod wire;

#[cfg(target_os = "linux")]
pub mod sg;

#[cfg(windows)]
pub mod spt;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use cdb::{Cdb, Opcode};
pub use chunk::{row_bands, ChunkError, RowBands};
pub use error::Error;
pub use protocol::{It8951, IT8951_INQUIRY_ID, STATUS_REGISTER};
pub use transport::{DataDirection, Timeouts, Transport, TransportConfig, TransportError};
pub use types::{Area, DisplayCommand, ImageLoadCommand, InquiryData, SystemInfo, WaveMode};
pub use wire::{from_wire, to_wire, WireError, WireRecord};

#[cfg(target_os = "linux")]
pub use sg::SgDevice;

#[cfg(windows)]
pub use spt::SptDevice;

/// The pass-through backend for the host operating system.
#[cfg(target_os = "linux")]
pub type PlatformDevice = SgDevice;

/// The pass-through backend for the host operating system.
#[cfg(windows)]
pub type PlatformDevice = SptDevice;

/// Open the device node at `path` with the host's pass-through backend.
///
/// `/dev/sgN` on Linux, `\\.\X:` (the drive letter the RamDisc mounts as) on
/// Windows.
///
/// # Errors
///
/// Returns [`TransportError::Open`] if the node cannot be opened. Callers are
/// expected to treat this as fatal.
#[cfg(any(target_os = "linux", windows))]
pub fn open_device(
    path: impl AsRef<std::path::Path>,
    config: TransportConfig,
) -> Result<PlatformDevice, TransportError> {
    PlatformDevice::open(path, config)
}
