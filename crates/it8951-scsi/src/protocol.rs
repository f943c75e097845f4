//! IT8951 chip protocol
//!
//! [`It8951`] owns one [`Transport`] and turns chip operations into CDBs:
//!
//! | Operation | CDB | Data phase |
//! |-----------|-----|------------|
//! | inquiry / identify | `12 .. 81 ..` | in, 40 bytes |
//! | read register | `FE 00 addr 83 00 04 ..` | in, 4 bytes |
//! | write register | `FE 00 addr 84 00 04 ..` | out, 4 bytes BE |
//! | system info | `FE 00 "8951" 80 00 01 00 02 ..` | in, 116 bytes |
//! | load image area | `FE 00 .. A2 ..` | out, 20-byte header + pixels |
//! | display area | `FE 00 .. 94 ..` | out, 28-byte header |
//! | set VCOM | `FE 00 .. A3 mv_hi mv_lo 00 01 00 ..` | none |
//!
//! System info is fetched at most once per `It8951` and cached; the device is
//! assumed not to change its buffer layout while open.

use std::sync::OnceLock;

use crate::cdb::Cdb;
use crate::chunk::row_bands;
use crate::error::Error;
use crate::transport::{DataDirection, Timeouts, Transport};
use crate::types::{Area, DisplayCommand, ImageLoadCommand, InquiryData, SystemInfo, WaveMode};
use crate::wire::{from_wire, to_wire, WireRecord};

/// TCON engine status register; low 16 bits are zero when idle.
pub const STATUS_REGISTER: u32 = 0x1800_1224;

/// Identification at offset 8 of the inquiry response (vendor + product + revision).
pub const IT8951_INQUIRY_ID: &[u8] = b"Generic Storage RamDisc 1.00";

/// Allocation length of the identify inquiry.
const INQUIRY_LEN: usize = 0x28;

/// Offset of the vendor identification in a standard inquiry response.
const INQUIRY_ID_OFFSET: usize = 8;

/// Width of a register data phase.
const REGISTER_LEN: usize = 4;

/// IT8951 controller behind a pass-through transport.
///
/// Generic over the transport so tests can run against
/// [`crate::mock::MockTransport`] and hosts pick their OS backend.
///
/// Not meant for concurrent use: one `It8951` per device handle. The system
/// info cache is single-initialization, so a racing first fetch is still
/// written once.
pub struct It8951<T> {
    transport: T,
    timeouts: Timeouts,
    system_info: OnceLock<SystemInfo>,
}

impl<T: Transport> It8951<T> {
    /// Take ownership of `transport` with default timeouts.
    pub fn new(transport: T) -> Self {
        Self::with_timeouts(transport, Timeouts::DEFAULT)
    }

    /// Take ownership of `transport` with explicit read/write timeouts.
    pub fn with_timeouts(transport: T, timeouts: Timeouts) -> Self {
        Self {
            transport,
            timeouts,
            system_info: OnceLock::new(),
        }
    }

    /// Underlying transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Timeouts applied to every request.
    pub fn timeouts(&self) -> Timeouts {
        self.timeouts
    }

    /// Give the transport back.
    pub fn into_inner(self) -> T {
        self.transport
    }

    // -----------------------------------------------------------------------
    // Transport helpers
    // -----------------------------------------------------------------------

    fn read(&self, cdb: &Cdb, len: usize) -> Result<Vec<u8>, Error> {
        tracing::trace!(?cdb, len, "data-in");
        Ok(self
            .transport
            .send(cdb, DataDirection::In(len), self.timeouts.read)?)
    }

    fn write(&self, cdb: &Cdb, data: &[u8]) -> Result<(), Error> {
        tracing::trace!(?cdb, len = data.len(), "data-out");
        self.transport
            .send(cdb, DataDirection::Out(data), self.timeouts.write)?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Identification
    // -----------------------------------------------------------------------

    /// Standard inquiry identification fields.
    pub fn inquiry(&self) -> Result<InquiryData, Error> {
        let resp = self.read(&Cdb::inquiry(), INQUIRY_LEN)?;
        InquiryData::parse(&resp).ok_or(Error::ShortResponse {
            expected: InquiryData::MIN_LEN,
            actual: resp.len(),
        })
    }

    /// Check that the device answers inquiry as the IT8951 RamDisc.
    ///
    /// Callers should gate every other operation on this.
    pub fn identify(&self) -> Result<(), Error> {
        let resp = self.read(&Cdb::inquiry(), INQUIRY_LEN)?;
        let end = INQUIRY_ID_OFFSET.saturating_add(IT8951_INQUIRY_ID.len());
        match resp.get(INQUIRY_ID_OFFSET..end) {
            Some(id) if id == IT8951_INQUIRY_ID => Ok(()),
            Some(id) => Err(Error::NotIt8951 {
                found: String::from_utf8_lossy(id).into_owned(),
            }),
            None => Err(Error::ShortResponse {
                expected: end,
                actual: resp.len(),
            }),
        }
    }

    /// Boolean form of [`It8951::identify`]; any failure reads as "not an IT8951".
    pub fn is_it8951(&self) -> bool {
        match self.identify() {
            Ok(()) => true,
            Err(e) => {
                tracing::debug!(error = %e, "identify failed");
                false
            }
        }
    }

    // -----------------------------------------------------------------------
    // Registers
    // -----------------------------------------------------------------------

    /// Read a 32-bit register.
    ///
    /// A response shorter than 4 bytes is [`Error::ShortResponse`], never a
    /// partially decoded value.
    pub fn read_register(&self, address: u32) -> Result<u32, Error> {
        let resp = self.read(&Cdb::read_register(address), REGISTER_LEN)?;
        let word = resp
            .get(..REGISTER_LEN)
            .and_then(|b| <[u8; REGISTER_LEN]>::try_from(b).ok())
            .ok_or(Error::ShortResponse {
                expected: REGISTER_LEN,
                actual: resp.len(),
            })?;
        Ok(u32::from_be_bytes(word))
    }

    /// Write a 32-bit register.
    pub fn write_register(&self, address: u32, value: u32) -> Result<(), Error> {
        self.write(&Cdb::write_register(address), &value.to_be_bytes())
    }

    /// Block until the TCON engine reports idle.
    ///
    /// A failed status read counts as busy, so this never returns while the
    /// device is unreachable. Use [`It8951::wait_until_ready_within`] for a
    /// bounded wait.
    pub fn wait_until_ready(&self) {
        while self.is_busy() {}
    }

    /// Poll the status register at most `max_polls` times.
    ///
    /// Failed reads count as busy, exactly as in [`It8951::wait_until_ready`].
    pub fn wait_until_ready_within(&self, max_polls: u32) -> Result<(), Error> {
        for _ in 0..max_polls {
            if !self.is_busy() {
                return Ok(());
            }
        }
        Err(Error::NotReady { polls: max_polls })
    }

    fn is_busy(&self) -> bool {
        match self.read_register(STATUS_REGISTER) {
            Ok(status) => status & 0xFFFF != 0,
            Err(e) => {
                tracing::trace!(error = %e, "status read failed, treating as busy");
                true
            }
        }
    }

    // -----------------------------------------------------------------------
    // System info
    // -----------------------------------------------------------------------

    /// Device descriptor, fetched on first call and cached afterwards.
    ///
    /// A short reply is read as if the missing tail were zero. A failed or
    /// empty fetch caches nothing; the next call asks again.
    pub fn system_info(&self) -> Result<SystemInfo, Error> {
        if let Some(info) = self.system_info.get() {
            return Ok(*info);
        }

        let mut resp = self.read(&Cdb::system_info(), SystemInfo::WIRE_LEN)?;
        if resp.is_empty() {
            return Err(Error::ShortResponse {
                expected: SystemInfo::WIRE_LEN,
                actual: 0,
            });
        }
        if resp.len() < SystemInfo::WIRE_LEN {
            tracing::debug!(len = resp.len(), "short system info, zero-filling tail");
            resp.resize(SystemInfo::WIRE_LEN, 0);
        }
        let info: SystemInfo = from_wire(&resp)?;
        tracing::debug!(
            width = info.width,
            height = info.height,
            image_buf_base = info.image_buf_base,
            mode_no = info.mode_no,
            version = info.version,
            "fetched system info"
        );
        Ok(*self.system_info.get_or_init(|| info))
    }

    /// Cached system info, if it has been fetched.
    pub fn cached_system_info(&self) -> Option<SystemInfo> {
        self.system_info.get().copied()
    }

    // -----------------------------------------------------------------------
    // Image load
    // -----------------------------------------------------------------------

    /// Load `pixels` (8bpp, row-major, at least `width × height` bytes) into
    /// the image buffer at `address`, covering `area`.
    ///
    /// Transfers larger than the transport limit are sent as consecutive row
    /// bands, top to bottom. The first failing band aborts the load.
    pub fn load_image_area(&self, address: u32, area: Area, pixels: &[u8]) -> Result<(), Error> {
        let needed = area.pixel_count();
        if pixels.len() < needed {
            return Err(Error::PixelBufferTooSmall {
                needed,
                actual: pixels.len(),
            });
        }

        let bands = row_bands(area.width, area.height, self.transport.max_transfer_len())?;
        let chunked = !bands.is_single();
        if chunked {
            tracing::debug!(
                lines = bands.lines_per_band(),
                bands = bands.len(),
                "image too big to send at once"
            );
        }

        let row_len = usize::try_from(area.width).unwrap_or(usize::MAX);
        for rows in bands {
            // SAFETY: rows.end ≤ area.height, so both offsets are ≤ needed,
            // which already fit in usize.
            #[allow(clippy::arithmetic_side_effects)]
            let span = (rows.start as usize * row_len)..(rows.end as usize * row_len);
            let band = area.rows(rows);
            let slice = pixels.get(span).ok_or(Error::PixelBufferTooSmall {
                needed,
                actual: pixels.len(),
            })?;
            if chunked {
                tracing::debug!(lines = band.height, y = band.y, "sending chunk");
            }
            self.send_load(address, band, slice)?;
        }
        Ok(())
    }

    /// Load into the image buffer reported by system info.
    pub fn load_image(&self, area: Area, pixels: &[u8]) -> Result<(), Error> {
        let address = self.system_info()?.image_buf_base;
        self.load_image_area(address, area, pixels)
    }

    fn send_load(&self, address: u32, area: Area, pixels: &[u8]) -> Result<(), Error> {
        let header = ImageLoadCommand { address, area };
        let mut buf = Vec::with_capacity(ImageLoadCommand::WIRE_LEN.saturating_add(pixels.len()));
        buf.extend_from_slice(&to_wire(&header));
        buf.extend_from_slice(pixels);
        self.write(&Cdb::load_image_area(), &buf)?;
        tracing::debug!(
            width = area.width,
            height = area.height,
            x = area.x,
            y = area.y,
            "sent image"
        );
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Display
    // -----------------------------------------------------------------------

    /// Refresh a previously loaded region.
    pub fn display_area(&self, command: &DisplayCommand) -> Result<(), Error> {
        tracing::debug!(
            mode = %command.wave_mode,
            x = command.area.x,
            y = command.area.y,
            width = command.area.width,
            height = command.area.height,
            "display area"
        );
        self.write(&Cdb::display_area(), &to_wire(command))
    }

    /// Refresh `area` from the image buffer reported by system info, without
    /// waiting for completion.
    pub fn display(&self, area: Area, wave_mode: WaveMode) -> Result<(), Error> {
        let address = self.system_info()?.image_buf_base;
        self.display_area(&DisplayCommand {
            address,
            wave_mode,
            area,
            wait_ready: false,
        })
    }

    /// Flash `area` back to white.
    pub fn clear_area(&self, area: Area) -> Result<(), Error> {
        self.display_area(&DisplayCommand {
            address: 0,
            wave_mode: WaveMode::Init,
            area,
            wait_ready: false,
        })
    }

    // -----------------------------------------------------------------------
    // VCOM
    // -----------------------------------------------------------------------

    /// Set the panel bias voltage.
    ///
    /// Only the magnitude is sent: `-1.53` and `1.53` both program 1530 mV.
    /// Panels print VCOM as a negative voltage, and the controller applies
    /// the sign itself.
    pub fn set_vcom(&self, volts: f64) -> Result<(), Error> {
        let mv = vcom_millivolts(volts);
        tracing::debug!(millivolts = mv, "raw VCOM value");
        self.write(&Cdb::set_vcom(mv), &[])
    }
}

/// `|volts| × 1000`, truncated and saturated to 16 bits. NaN maps to 0.
// Float-to-int `as` saturates and maps NaN to 0, which is the clamping wanted here.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn vcom_millivolts(volts: f64) -> u16 {
    (volts.abs() * 1000.0) as u16
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::cdb::Opcode;
    use crate::mock::{MockTransport, Phase};

    fn panel_info(width: u32, height: u32) -> SystemInfo {
        SystemInfo {
            width,
            height,
            image_buf_base: 0x0012_36E0,
            mode_no: 8,
            ..SystemInfo::default()
        }
    }

    // -----------------------------------------------------------------------
    // Identification
    // -----------------------------------------------------------------------

    #[test]
    fn test_identify_accepts_ramdisc() {
        let chip = It8951::new(MockTransport::it8951(panel_info(800, 600)));
        assert!(chip.is_it8951());
        chip.identify().unwrap();

        let sent = chip.transport().sent();
        assert_eq!(sent[0].cdb, Cdb::inquiry());
        assert_eq!(sent[0].phase, Phase::In(0x28));
    }

    #[test]
    fn test_identify_rejects_other_device() {
        let mock = MockTransport::new();
        let mut resp = vec![0u8; 40];
        resp[8..36].copy_from_slice(b"Generic Storage RamDisc 1.01");
        mock.push_reply(resp);
        let chip = It8951::new(mock);
        assert!(matches!(chip.identify(), Err(Error::NotIt8951 { .. })));
    }

    #[test]
    fn test_identify_short_response() {
        let mock = MockTransport::new();
        mock.push_reply(b"xxxxxxxxGeneric Storage".to_vec());
        let chip = It8951::new(mock);
        assert!(matches!(
            chip.identify(),
            Err(Error::ShortResponse {
                expected: 36,
                actual: 23
            })
        ));
        assert!(!chip.is_it8951());
    }

    #[test]
    fn test_identify_transport_failure_is_distinct() {
        let mock = MockTransport::new();
        mock.push_failure();
        let chip = It8951::new(mock);
        assert!(chip.identify().unwrap_err().is_transport());
    }

    #[test]
    fn test_inquiry_fields() {
        let chip = It8951::new(MockTransport::it8951(panel_info(800, 600)));
        let inq = chip.inquiry().unwrap();
        assert_eq!(inq.vendor, "Generic");
        assert_eq!(inq.product, "Storage RamDisc");
        assert_eq!(inq.revision, "1.00");
    }

    // -----------------------------------------------------------------------
    // Registers
    // -----------------------------------------------------------------------

    #[test]
    fn test_read_register_decodes_big_endian() {
        let mock = MockTransport::new();
        mock.push_reply(vec![0x12, 0x34, 0x56, 0x78]);
        let chip = It8951::new(mock);
        assert_eq!(chip.read_register(0x1000_0000).unwrap(), 0x1234_5678);

        let sent = chip.transport().sent();
        assert_eq!(sent[0].cdb, Cdb::read_register(0x1000_0000));
        assert_eq!(sent[0].phase, Phase::In(4));
        assert_eq!(sent[0].timeout, Timeouts::DEFAULT.read);
    }

    #[test]
    fn test_read_register_two_bytes_is_no_value() {
        let mock = MockTransport::new();
        mock.push_reply(vec![0xAB, 0xCD]);
        let chip = It8951::new(mock);
        assert!(matches!(
            chip.read_register(STATUS_REGISTER),
            Err(Error::ShortResponse {
                expected: 4,
                actual: 2
            })
        ));
    }

    #[test]
    fn test_write_register_payload() {
        let chip = It8951::new(MockTransport::new());
        chip.write_register(0x0000_1138, 0xCAFE_F00D).unwrap();

        let sent = chip.transport().sent();
        assert_eq!(sent[0].cdb, Cdb::write_register(0x0000_1138));
        assert_eq!(sent[0].payload(), &[0xCA, 0xFE, 0xF0, 0x0D]);
        assert_eq!(sent[0].timeout, Timeouts::DEFAULT.write);
    }

    #[test]
    fn test_wait_until_ready_polls_until_idle() {
        let mock = MockTransport::new();
        mock.push_reply(vec![0, 0, 0, 1]); // busy
        mock.push_failure(); // unreachable counts as busy
        mock.push_reply(vec![0xFF, 0xFF, 0x00, 0x00]); // high half ignored
        let chip = It8951::new(mock);
        chip.wait_until_ready();
        assert_eq!(chip.transport().count(Opcode::ReadRegister), 3);
    }

    #[test]
    fn test_wait_until_ready_within_gives_up() {
        let mock = MockTransport::new();
        mock.set_register(STATUS_REGISTER, 0x0000_0001);
        let chip = It8951::new(mock);
        assert!(matches!(
            chip.wait_until_ready_within(5),
            Err(Error::NotReady { polls: 5 })
        ));
        assert_eq!(chip.transport().count(Opcode::ReadRegister), 5);
    }

    // -----------------------------------------------------------------------
    // System info
    // -----------------------------------------------------------------------

    #[test]
    fn test_system_info_fetched_once() {
        let chip = It8951::new(MockTransport::it8951(panel_info(1872, 1404)));
        for _ in 0..5 {
            assert_eq!(chip.system_info().unwrap().panel_size(), (1872, 1404));
        }
        assert_eq!(chip.transport().count(Opcode::SystemInfo), 1);
        assert_eq!(chip.transport().sent()[0].phase, Phase::In(116));
    }

    #[test]
    fn test_system_info_empty_response() {
        let mock = MockTransport::new();
        mock.push_reply(Vec::new());
        let chip = It8951::new(mock);
        assert!(matches!(
            chip.system_info(),
            Err(Error::ShortResponse {
                expected: 116,
                actual: 0
            })
        ));
        assert!(chip.cached_system_info().is_none());
    }

    #[test]
    fn test_system_info_short_reply_zero_fills_tail() {
        let full = SystemInfo {
            cmd_table_ptr: 0xDEAD_BEEF,
            ..panel_info(1872, 1404)
        };
        let mut reply = to_wire(&full);
        reply.truncate(112);
        let mock = MockTransport::new();
        mock.push_reply(reply);
        let chip = It8951::new(mock);

        let info = chip.system_info().unwrap();
        assert_eq!(info.panel_size(), (1872, 1404));
        assert_eq!(info.image_buf_base, 0x0012_36E0);
        assert_eq!(info.cmd_table_ptr, 0);
        assert_eq!(chip.cached_system_info(), Some(info));
    }

    // -----------------------------------------------------------------------
    // Image load
    // -----------------------------------------------------------------------

    #[test]
    fn test_small_load_is_one_transfer() {
        let chip = It8951::new(MockTransport::new());
        let area = Area::new(8, 16, 4, 2);
        let pixels: Vec<u8> = (0..8).collect();
        chip.load_image_area(0x100, area, &pixels).unwrap();

        let loads = chip.transport().payloads(Opcode::LoadImageArea);
        assert_eq!(loads.len(), 1);
        let payload = &loads[0];
        assert_eq!(payload.len(), 20 + 8);
        let header: ImageLoadCommand = from_wire(payload).unwrap();
        assert_eq!(header, ImageLoadCommand { address: 0x100, area });
        assert_eq!(&payload[20..], pixels.as_slice());
    }

    #[test]
    fn test_load_sends_only_area_bytes() {
        let chip = It8951::new(MockTransport::new());
        let pixels = vec![7u8; 100];
        chip.load_image_area(0, Area::new(0, 0, 3, 3), &pixels).unwrap();
        assert_eq!(chip.transport().payloads(Opcode::LoadImageArea)[0].len(), 20 + 9);
    }

    #[test]
    fn test_chunked_load_readdresses_each_band() {
        // 20-byte header + 3 rows of 10 = 50 bytes per transfer
        let chip = It8951::new(MockTransport::new().with_max_transfer_len(50));
        let area = Area::new(5, 100, 10, 7);
        let pixels: Vec<u8> = (0..70).collect();
        chip.load_image_area(0xAA, area, &pixels).unwrap();

        let loads = chip.transport().payloads(Opcode::LoadImageArea);
        let headers: Vec<ImageLoadCommand> =
            loads.iter().map(|p| from_wire(p).unwrap()).collect();
        assert_eq!(
            headers.iter().map(|h| (h.area.y, h.area.height)).collect::<Vec<_>>(),
            vec![(100, 3), (103, 3), (106, 1)]
        );
        assert!(headers.iter().all(|h| h.address == 0xAA && h.area.x == 5 && h.area.width == 10));
        assert!(loads.iter().all(|p| p.len() <= 50));

        let sent: Vec<u8> = loads.iter().flat_map(|p| p[20..].to_vec()).collect();
        assert_eq!(sent, pixels);
    }

    #[test]
    fn test_thousand_square_load_covers_every_row() {
        let chip = It8951::new(MockTransport::new());
        let pixels = vec![0x80u8; 1000 * 1000];
        chip.load_image_area(0, Area::full(1000, 1000), &pixels).unwrap();

        let loads = chip.transport().payloads(Opcode::LoadImageArea);
        assert_eq!(loads.len(), 17, "ceil(1000 / 61) transfers");
        let headers: Vec<ImageLoadCommand> =
            loads.iter().map(|p| from_wire(p).unwrap()).collect();
        assert_eq!(headers[0].area.y, 0);
        let last = headers[16].area;
        assert_eq!(last.y + last.height - 1, 999);
        assert!(loads.iter().all(|p| p.len() <= 61_440));
    }

    #[test]
    fn test_load_rejects_short_buffer() {
        let chip = It8951::new(MockTransport::new());
        let err = chip.load_image_area(0, Area::new(0, 0, 10, 10), &[0; 99]).unwrap_err();
        assert!(matches!(
            err,
            Error::PixelBufferTooSmall {
                needed: 100,
                actual: 99
            }
        ));
        assert!(chip.transport().sent().is_empty());
    }

    #[test]
    fn test_load_stops_at_first_failed_band() {
        let mock = MockTransport::new().with_max_transfer_len(30);
        mock.fail_writes(true);
        let chip = It8951::new(mock);
        assert!(chip.load_image_area(0, Area::new(0, 0, 10, 5), &[0; 50]).is_err());
        assert_eq!(chip.transport().count(Opcode::LoadImageArea), 1);
    }

    #[test]
    fn test_load_image_uses_image_buffer_base() {
        let chip = It8951::new(MockTransport::it8951(panel_info(4, 4)));
        chip.load_image(Area::full(4, 4), &[0; 16]).unwrap();
        let header: ImageLoadCommand =
            from_wire(&chip.transport().payloads(Opcode::LoadImageArea)[0]).unwrap();
        assert_eq!(header.address, 0x0012_36E0);
    }

    // -----------------------------------------------------------------------
    // Display / clear / VCOM
    // -----------------------------------------------------------------------

    #[test]
    fn test_display_uses_image_buffer_and_no_wait() {
        let chip = It8951::new(MockTransport::it8951(panel_info(800, 600)));
        chip.display(Area::full(800, 600), WaveMode::GC16).unwrap();

        let cmds = chip.transport().display_commands();
        assert_eq!(
            cmds,
            vec![DisplayCommand {
                address: 0x0012_36E0,
                wave_mode: WaveMode::GC16,
                area: Area::full(800, 600),
                wait_ready: false,
            }]
        );
    }

    #[test]
    fn test_clear_area_is_init_at_zero() {
        let chip = It8951::new(MockTransport::new());
        chip.clear_area(Area::full(10, 10)).unwrap();
        let cmd = chip.transport().display_commands()[0];
        assert_eq!(cmd.address, 0);
        assert_eq!(cmd.wave_mode, WaveMode::Init);
        assert_eq!(chip.transport().count(Opcode::SystemInfo), 0);
    }

    #[test]
    fn test_set_vcom_sends_magnitude_only() {
        let chip = It8951::new(MockTransport::new());
        chip.set_vcom(-1.53).unwrap();
        chip.set_vcom(1.53).unwrap();

        let sent = chip.transport().sent();
        assert_eq!(sent[0].cdb, Cdb::set_vcom(1530));
        assert_eq!(sent[0].cdb, sent[1].cdb);
        assert!(sent[0].payload().is_empty());
    }

    #[test]
    fn test_vcom_millivolts_saturates() {
        assert_eq!(vcom_millivolts(2.0), 2000);
        assert_eq!(vcom_millivolts(-0.0005), 0);
        assert_eq!(vcom_millivolts(100.0), u16::MAX);
        assert_eq!(vcom_millivolts(f64::NAN), 0);
    }
}
