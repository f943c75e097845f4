//! IT8951 command descriptor blocks
//!
//! Every IT8951 command is a 16-byte CDB. Vendor commands start with `0xFE`
//! and put the chip opcode at byte 6; the standard inquiry starts with `0x12`.
//!
//! Register-style layout:
//! ```text
//! [0]     0xFE          vendor-specific
//! [1]     0x00
//! [2..6]  address       u32 big-endian (register or memory address)
//! [6]     opcode        see [`Opcode`]
//! [7]     0x00
//! [8]     0x04          register width in bytes
//! [9..16] 0x00
//! ```

/// Length of every CDB on this device.
pub const CDB_LEN: usize = 16;

/// Vendor-specific SCSI operation code used for all IT8951 commands.
pub const VENDOR_OPCODE: u8 = 0xFE;

/// Standard SCSI INQUIRY operation code.
pub const INQUIRY_OPCODE: u8 = 0x12;

/// IT8951 USB chip opcodes (byte 6 of a vendor CDB).
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Opcode {
    /// Read one 32-bit register: 4 bytes data-in.
    ReadRegister = 0x83,
    /// Write one 32-bit register: 4 bytes data-out.
    WriteRegister = 0x84,
    /// Get system info. Shares its slot with the signature bytes, see [`Cdb::system_info`].
    SystemInfo = 0x80,
    /// Load image area: header + pixels data-out.
    LoadImageArea = 0xA2,
    /// Display area: header data-out.
    DisplayArea = 0x94,
    /// PMIC control (VCOM, power): no data phase.
    Pmic = 0xA3,
}

/// A 16-byte command descriptor block.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Cdb([u8; CDB_LEN]);

impl Cdb {
    /// Wrap raw CDB bytes.
    pub const fn from_bytes(bytes: [u8; CDB_LEN]) -> Self {
        Self(bytes)
    }

    /// Raw CDB bytes.
    pub const fn as_bytes(&self) -> &[u8; CDB_LEN] {
        &self.0
    }

    /// Vendor command carrying a big-endian `address` at bytes 2..=5.
    pub const fn command(address: u32, opcode: Opcode) -> Self {
        let a = address.to_be_bytes();
        Self([
            VENDOR_OPCODE,
            0x00,
            a[0],
            a[1],
            a[2],
            a[3],
            opcode as u8,
            0x00,
            0x04,
            0x00,
            0x00,
            0x00,
            0x00,
            0x00,
            0x00,
            0x00,
        ])
    }

    /// Read a 32-bit register.
    pub const fn read_register(address: u32) -> Self {
        Self::command(address, Opcode::ReadRegister)
    }

    /// Write a 32-bit register.
    pub const fn write_register(address: u32) -> Self {
        Self::command(address, Opcode::WriteRegister)
    }

    /// Standard INQUIRY, EVPD clear, page `0x81` in byte 6 as the RamDisc expects.
    #[rustfmt::skip]
    pub const fn inquiry() -> Self {
        Self([
            INQUIRY_OPCODE,
            0x00, 0x00, 0x00, 0x00, 0x00,
            0x81,
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
        ])
    }

    /// Get system info.
    ///
    /// Bytes 2..=5 hold the `"8951"` signature, byte 6 the opcode and
    /// bytes 8..=11 the command-table version `01 00 02 00`.
    #[rustfmt::skip]
    pub const fn system_info() -> Self {
        Self([
            VENDOR_OPCODE,
            0x00,
            0x38, 0x39, 0x35, 0x31, // "8951"
            Opcode::SystemInfo as u8,
            0x00,
            0x01, 0x00, 0x02, 0x00, // version
            0x00, 0x00, 0x00, 0x00,
        ])
    }

    /// Load image area. The destination lives in the data-phase header.
    pub const fn load_image_area() -> Self {
        Self::bare(Opcode::LoadImageArea)
    }

    /// Display area. The destination lives in the data-phase header.
    pub const fn display_area() -> Self {
        Self::bare(Opcode::DisplayArea)
    }

    /// Set VCOM to `millivolts` and switch PMIC power on.
    ///
    /// ```text
    /// [6]    0xA3  PMIC command
    /// [7..9] VCOM  u16 big-endian, millivolts magnitude
    /// [9]    0x00  VCOM action
    /// [10]   0x01  set power
    /// [11]   0x00  power state
    /// ```
    #[rustfmt::skip]
    pub const fn set_vcom(millivolts: u16) -> Self {
        let v = millivolts.to_be_bytes();
        Self([
            VENDOR_OPCODE,
            0x00, 0x00, 0x00, 0x00, 0x00,
            Opcode::Pmic as u8,
            v[0],
            v[1],
            0x00,
            0x01,
            0x00,
            0x00, 0x00, 0x00, 0x00,
        ])
    }

    /// Opcode byte (byte 6).
    pub const fn opcode_byte(&self) -> u8 {
        self.0[6]
    }

    /// Big-endian address at bytes 2..=5.
    pub const fn address(&self) -> u32 {
        u32::from_be_bytes([self.0[2], self.0[3], self.0[4], self.0[5]])
    }

    const fn bare(opcode: Opcode) -> Self {
        let mut bytes = [0u8; CDB_LEN];
        bytes[0] = VENDOR_OPCODE;
        bytes[6] = opcode as u8;
        Self(bytes)
    }
}

impl AsRef<[u8]> for Cdb {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl core::fmt::Debug for Cdb {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "Cdb[")?;
        for (i, b) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{b:02X}")?;
        }
        write!(f, "]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_cdb_layout() {
        let cdb = Cdb::read_register(0x1800_1224);
        assert_eq!(
            cdb.as_bytes(),
            &[0xFE, 0x00, 0x18, 0x00, 0x12, 0x24, 0x83, 0x00, 0x04, 0, 0, 0, 0, 0, 0, 0]
        );
        assert_eq!(cdb.address(), 0x1800_1224);
        assert_eq!(Cdb::write_register(0).opcode_byte(), 0x84);
    }

    #[test]
    fn test_system_info_cdb_is_fixed() {
        assert_eq!(
            Cdb::system_info().as_bytes(),
            &[0xFE, 0x00, 0x38, 0x39, 0x35, 0x31, 0x80, 0x00, 0x01, 0x00, 0x02, 0, 0, 0, 0, 0]
        );
    }

    #[test]
    fn test_inquiry_cdb() {
        let cdb = Cdb::inquiry();
        assert_eq!(cdb.as_bytes()[0], 0x12);
        assert_eq!(cdb.opcode_byte(), 0x81);
        assert_eq!(cdb.as_bytes().iter().filter(|b| **b != 0).count(), 2);
    }

    #[test]
    fn test_bare_cdbs() {
        let load = Cdb::load_image_area();
        assert_eq!(load.as_bytes()[0], 0xFE);
        assert_eq!(load.opcode_byte(), 0xA2);
        assert_eq!(load.address(), 0);
        assert_eq!(load.as_bytes()[8], 0x00, "no register width on bulk commands");

        assert_eq!(Cdb::display_area().opcode_byte(), 0x94);
    }

    #[test]
    fn test_vcom_cdb() {
        // 1.5 V → 1500 mV = 0x05DC
        assert_eq!(
            Cdb::set_vcom(1500).as_bytes(),
            &[0xFE, 0, 0, 0, 0, 0, 0xA3, 0x05, 0xDC, 0x00, 0x01, 0x00, 0, 0, 0, 0]
        );
    }

    #[test]
    fn test_debug_format_is_hex() {
        let s = format!("{:?}", Cdb::display_area());
        assert!(s.starts_with("Cdb[FE 00"), "{s}");
    }
}
