//! Chip-protocol error type

use crate::chunk::ChunkError;
use crate::transport::TransportError;
use crate::wire::WireError;

/// Unified error for [`crate::It8951`] operations.
///
/// Transport, short-response and wrong-device failures are separate
/// variants so callers can tell "unplugged" from "not an IT8951".
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The pass-through layer failed.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The device returned fewer bytes than the command's fixed response.
    #[error("short response: expected {expected} bytes, got {actual}")]
    ShortResponse {
        /// Bytes the command must return.
        expected: usize,
        /// Bytes actually returned.
        actual: usize,
    },

    /// The inquiry identification is not the IT8951 RamDisc string.
    #[error("device is not an IT8951 (inquiry reported {found:?})")]
    NotIt8951 {
        /// Vendor/product/revision bytes as returned, lossily decoded.
        found: String,
    },

    /// A device record failed to decode.
    #[error(transparent)]
    Wire(#[from] WireError),

    /// The pixel buffer is smaller than the target area.
    #[error("pixel buffer holds {actual} bytes, area needs {needed}")]
    PixelBufferTooSmall {
        /// `width × height` of the target area.
        needed: usize,
        /// Length of the supplied buffer.
        actual: usize,
    },

    /// The image cannot be split into transfer-sized bands.
    #[error(transparent)]
    Chunk(#[from] ChunkError),

    /// The controller stayed busy for the whole polling budget.
    #[error("controller still busy after {polls} status polls")]
    NotReady {
        /// Number of status reads issued.
        polls: u32,
    },
}

impl Error {
    /// True for failures of the pass-through itself (as opposed to protocol
    /// mismatches or bad arguments).
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}
