//! IT8951 data model and wire layouts

use core::ops::Range;

use crate::wire::{WireError, WireRecord, WordReader, WordWriter};

// ---------------------------------------------------------------------------
// Area
// ---------------------------------------------------------------------------

/// Rectangle in panel pixel coordinates.
///
/// Not checked against the panel size; the controller clips or misbehaves
/// on out-of-range areas.
///
/// Wire layout (16 bytes): `x, y, width, height`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Area {
    /// Left edge.
    pub x: u32,
    /// Top edge.
    pub y: u32,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Area {
    /// Build an area from origin and extent.
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Whole panel of `width` × `height`.
    pub const fn full(width: u32, height: u32) -> Self {
        Self::new(0, 0, width, height)
    }

    /// Number of pixels (one byte each in 8bpp load mode).
    // SAFETY: u32 × u32 fits in u64; on 32-bit hosts a panel that large could
    // not be buffered anyway, so the usize conversion saturates.
    #[allow(clippy::arithmetic_side_effects)]
    pub fn pixel_count(&self) -> usize {
        let n = u64::from(self.width) * u64::from(self.height);
        usize::try_from(n).unwrap_or(usize::MAX)
    }

    /// True when the area covers no pixels.
    pub const fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Sub-area covering `rows` (relative to this area's top edge).
    pub fn rows(&self, rows: Range<u32>) -> Self {
        Self {
            x: self.x,
            y: self.y.saturating_add(rows.start),
            width: self.width,
            height: rows.end.saturating_sub(rows.start),
        }
    }
}

impl WireRecord for Area {
    const WORDS: usize = 4;

    fn write_words(&self, out: &mut WordWriter<'_>) {
        out.put(self.x);
        out.put(self.y);
        out.put(self.width);
        out.put(self.height);
    }

    fn read_words(input: &mut WordReader<'_>) -> Result<Self, WireError> {
        Ok(Self {
            x: input.take()?,
            y: input.take()?,
            width: input.take()?,
            height: input.take()?,
        })
    }
}

// ---------------------------------------------------------------------------
// WaveMode
// ---------------------------------------------------------------------------

/// Panel refresh waveform.
///
/// Values are fixed by the controller firmware.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum WaveMode {
    /// Full-panel clear to white, flashing.
    Init = 0,
    /// Direct update, 1-bit, no flash.
    DU = 1,
    /// Grayscale clearing, 16 levels. Best quality.
    #[default]
    GC16 = 2,
    /// Grayscale, 16 levels, reduced flash.
    GL16 = 3,
    /// GL16 with regal (ghost reduction) for text.
    GLR16 = 4,
    /// GLR16 with dithering.
    GLD16 = 5,
    /// Direct update, 4 levels.
    DU4 = 6,
    /// Animation mode, 1-bit, fastest.
    A2 = 7,
}

impl WaveMode {
    /// Every mode, in wire-value order.
    pub const ALL: [WaveMode; 8] = [
        WaveMode::Init,
        WaveMode::DU,
        WaveMode::GC16,
        WaveMode::GL16,
        WaveMode::GLR16,
        WaveMode::GLD16,
        WaveMode::DU4,
        WaveMode::A2,
    ];

    /// Wire value.
    pub const fn as_u32(self) -> u32 {
        self as u32
    }

    /// Short mode name as printed in controller datasheets.
    pub fn name(&self) -> &'static str {
        match self {
            WaveMode::Init => "INIT",
            WaveMode::DU => "DU",
            WaveMode::GC16 => "GC16",
            WaveMode::GL16 => "GL16",
            WaveMode::GLR16 => "GLR16",
            WaveMode::GLD16 => "GLD16",
            WaveMode::DU4 => "DU4",
            WaveMode::A2 => "A2",
        }
    }
}

impl TryFrom<u32> for WaveMode {
    type Error = WireError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        usize::try_from(value)
            .ok()
            .and_then(|i| Self::ALL.get(i).copied())
            .ok_or(WireError::InvalidWaveMode(value))
    }
}

impl core::fmt::Display for WaveMode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// SystemInfo
// ---------------------------------------------------------------------------

/// Device descriptor returned by the get-system-info command.
///
/// Layout (29 big-endian words, 116 bytes):
/// ```text
/// [0]      standard_cmd_no
/// [1]      extend_cmd_no
/// [2]      signature        "8951" (0x3139_3538 as read)
/// [3]      version          command table version
/// [4]      width            panel width
/// [5]      height           panel height
/// [6]      update_buf_base
/// [7]      image_buf_base
/// [8]      temperature_no
/// [9]      mode_no          supported wave modes
/// [10..18] frame_count[8]   frames per mode
/// [18]     num_img_buf
/// [19..28] reserved[9]
/// [28]     cmd_table_ptr    device-side pointer, opaque
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SystemInfo {
    /// Standard command count.
    pub standard_cmd_no: u32,
    /// Extended command count.
    pub extend_cmd_no: u32,
    /// Controller signature.
    pub signature: u32,
    /// Command-table version.
    pub version: u32,
    /// Panel width in pixels.
    pub width: u32,
    /// Panel height in pixels.
    pub height: u32,
    /// Update buffer base address.
    pub update_buf_base: u32,
    /// Image buffer base address; default destination for loads.
    pub image_buf_base: u32,
    /// Temperature segment count.
    pub temperature_no: u32,
    /// Supported wave-mode count.
    pub mode_no: u32,
    /// Frame count for each of the eight modes.
    pub frame_count: [u32; 8],
    /// Number of image buffers.
    pub num_img_buf: u32,
    /// Reserved.
    pub reserved: [u32; 9],
    /// Device-side command table pointer.
    pub cmd_table_ptr: u32,
}

impl SystemInfo {
    /// Panel size as `(width, height)`.
    pub const fn panel_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Full-panel area.
    pub const fn panel_area(&self) -> Area {
        Area::full(self.width, self.height)
    }
}

impl WireRecord for SystemInfo {
    const WORDS: usize = 29;

    fn write_words(&self, out: &mut WordWriter<'_>) {
        out.put(self.standard_cmd_no);
        out.put(self.extend_cmd_no);
        out.put(self.signature);
        out.put(self.version);
        out.put(self.width);
        out.put(self.height);
        out.put(self.update_buf_base);
        out.put(self.image_buf_base);
        out.put(self.temperature_no);
        out.put(self.mode_no);
        out.put_all(&self.frame_count);
        out.put(self.num_img_buf);
        out.put_all(&self.reserved);
        out.put(self.cmd_table_ptr);
    }

    fn read_words(input: &mut WordReader<'_>) -> Result<Self, WireError> {
        Ok(Self {
            standard_cmd_no: input.take()?,
            extend_cmd_no: input.take()?,
            signature: input.take()?,
            version: input.take()?,
            width: input.take()?,
            height: input.take()?,
            update_buf_base: input.take()?,
            image_buf_base: input.take()?,
            temperature_no: input.take()?,
            mode_no: input.take()?,
            frame_count: input.take_array()?,
            num_img_buf: input.take()?,
            reserved: input.take_array()?,
            cmd_table_ptr: input.take()?,
        })
    }
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

/// Header of a load-image-area transfer; the pixels follow it on the wire.
///
/// Wire layout (20 bytes): `address, x, y, width, height`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ImageLoadCommand {
    /// Destination image buffer address.
    pub address: u32,
    /// Target area.
    pub area: Area,
}

impl WireRecord for ImageLoadCommand {
    const WORDS: usize = 5;

    fn write_words(&self, out: &mut WordWriter<'_>) {
        out.put(self.address);
        out.put_record(&self.area);
    }

    fn read_words(input: &mut WordReader<'_>) -> Result<Self, WireError> {
        Ok(Self {
            address: input.take()?,
            area: input.take_record()?,
        })
    }
}

/// Refresh of a previously loaded region.
///
/// Wire layout (28 bytes): `address, wave_mode, x, y, width, height, wait_ready`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DisplayCommand {
    /// Source image buffer address (0 for clears).
    pub address: u32,
    /// Refresh waveform.
    pub wave_mode: WaveMode,
    /// Region to refresh.
    pub area: Area,
    /// Ask the controller to block until the refresh completes.
    pub wait_ready: bool,
}

impl WireRecord for DisplayCommand {
    const WORDS: usize = 7;

    fn write_words(&self, out: &mut WordWriter<'_>) {
        out.put(self.address);
        out.put(self.wave_mode.as_u32());
        out.put_record(&self.area);
        out.put(u32::from(self.wait_ready));
    }

    fn read_words(input: &mut WordReader<'_>) -> Result<Self, WireError> {
        Ok(Self {
            address: input.take()?,
            wave_mode: WaveMode::try_from(input.take()?)?,
            area: input.take_record()?,
            wait_ready: input.take()? != 0,
        })
    }
}

// ---------------------------------------------------------------------------
// Inquiry
// ---------------------------------------------------------------------------

/// Standard SCSI inquiry identification fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InquiryData {
    /// T10 vendor identification (bytes 8..16).
    pub vendor: String,
    /// Product identification (bytes 16..32).
    pub product: String,
    /// Product revision level (bytes 32..36).
    pub revision: String,
}

impl InquiryData {
    /// Bytes needed to hold vendor, product and revision.
    pub const MIN_LEN: usize = 36;

    /// Parse the identification fields; `None` if the response is too short.
    pub fn parse(response: &[u8]) -> Option<Self> {
        let field = |r: Range<usize>| {
            response
                .get(r)
                .map(|b| String::from_utf8_lossy(b).trim_end().to_owned())
        };
        Some(Self {
            vendor: field(8..16)?,
            product: field(16..32)?,
            revision: field(32..36)?,
        })
    }
}
