//! Row-band partitioning for oversized image loads
//!
//! A load-image transfer is a 20-byte header followed by `width × height`
//! pixel bytes, and the whole data phase must fit in one pass-through call.
//! Larger images are split into horizontal bands of
//! `floor((max_transfer_len - header) / width)` rows; the last band takes the
//! remainder.
//!
//! The partition is computed here, before anything touches the device, so it
//! can be checked in isolation.

use core::ops::Range;

use crate::types::ImageLoadCommand;
use crate::wire::WireRecord;

/// Header bytes preceding the pixels of every load transfer.
pub const LOAD_HEADER_LEN: usize = ImageLoadCommand::WIRE_LEN;

/// Partitioning failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ChunkError {
    /// Not even one row plus the header fits in a transfer.
    #[error("a {width}-pixel row does not fit a {max_transfer_len}-byte transfer")]
    RowTooWide {
        /// Row width in pixels.
        width: u32,
        /// Transfer limit in bytes.
        max_transfer_len: usize,
    },
}

/// Split `height` rows of `width` pixels into transfer-sized row ranges.
///
/// Ranges are relative to the first row, contiguous, non-overlapping and in
/// increasing order; together they cover exactly `0..height`. Each range's
/// header plus pixels is at most `max_transfer_len` bytes. An empty image
/// yields no ranges.
pub fn row_bands(width: u32, height: u32, max_transfer_len: usize) -> Result<RowBands, ChunkError> {
    if width == 0 || height == 0 {
        return Ok(RowBands::new(height, height, 1));
    }

    let row_len = usize::try_from(width).unwrap_or(usize::MAX);
    let payload = row_len
        .checked_mul(usize::try_from(height).unwrap_or(usize::MAX))
        .and_then(|px| px.checked_add(LOAD_HEADER_LEN));

    if payload.is_some_and(|len| len <= max_transfer_len) {
        return Ok(RowBands::new(0, height, height));
    }

    let lines = max_transfer_len
        .saturating_sub(LOAD_HEADER_LEN)
        .checked_div(row_len)
        .unwrap_or(0);
    if lines == 0 {
        return Err(ChunkError::RowTooWide {
            width,
            max_transfer_len,
        });
    }
    // lines < height here, so it fits in u32.
    let lines = u32::try_from(lines).unwrap_or(u32::MAX);
    Ok(RowBands::new(0, height, lines))
}

/// Iterator over row ranges produced by [`row_bands`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowBands {
    next: u32,
    height: u32,
    lines: u32,
}

impl RowBands {
    fn new(next: u32, height: u32, lines: u32) -> Self {
        Self {
            next,
            height,
            lines: lines.max(1),
        }
    }

    /// Rows per full band.
    pub fn lines_per_band(&self) -> u32 {
        self.lines
    }

    /// True when the image goes out in a single transfer.
    pub fn is_single(&self) -> bool {
        self.len() <= 1
    }
}

impl Iterator for RowBands {
    type Item = Range<u32>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.height {
            return None;
        }
        let start = self.next;
        let end = start.saturating_add(self.lines).min(self.height);
        self.next = end;
        Some(start..end)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.height.saturating_sub(self.next);
        let bands = remaining.div_ceil(self.lines);
        let bands = usize::try_from(bands).unwrap_or(usize::MAX);
        (bands, Some(bands))
    }
}

impl ExactSizeIterator for RowBands {}

impl core::iter::FusedIterator for RowBands {}
