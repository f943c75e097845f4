//! Linux SCSI generic (`/dev/sgN`) backend
//!
//! Each request is one blocking `SG_IO` ioctl. The kernel copies the CDB and
//! the data phase straight to and from our buffers; nothing is queued.

use std::fs::{File, OpenOptions};
use std::os::unix::fs::OpenOptionsExt;
use std::os::unix::io::AsRawFd;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::cdb::{Cdb, CDB_LEN};
use crate::transport::{DataDirection, Transport, TransportConfig, TransportError};

// ---------------------------------------------------------------------------
// <scsi/sg.h>
// ---------------------------------------------------------------------------

const SG_IO: libc::c_ulong = 0x2285;
const SG_INTERFACE_ID: libc::c_int = b'S' as libc::c_int;
const SG_DXFER_TO_DEV: libc::c_int = -2;
const SG_DXFER_FROM_DEV: libc::c_int = -3;
const SG_INFO_OK_MASK: libc::c_uint = 0x1;

const SENSE_LEN: usize = 32;

#[repr(C)]
struct SgIoHdr {
    interface_id: libc::c_int,
    dxfer_direction: libc::c_int,
    cmd_len: libc::c_uchar,
    mx_sb_len: libc::c_uchar,
    iovec_count: libc::c_ushort,
    dxfer_len: libc::c_uint,
    dxferp: *mut libc::c_void,
    cmdp: *const libc::c_uchar,
    sbp: *mut libc::c_uchar,
    timeout: libc::c_uint,
    flags: libc::c_uint,
    pack_id: libc::c_int,
    usr_ptr: *mut libc::c_void,
    status: libc::c_uchar,
    masked_status: libc::c_uchar,
    msg_status: libc::c_uchar,
    sb_len_wr: libc::c_uchar,
    host_status: libc::c_ushort,
    driver_status: libc::c_ushort,
    resid: libc::c_int,
    duration: libc::c_uint,
    info: libc::c_uint,
}

// ---------------------------------------------------------------------------
// Device
// ---------------------------------------------------------------------------

/// An open `/dev/sgN` node.
///
/// The file descriptor is closed on drop.
#[derive(Debug)]
pub struct SgDevice {
    file: File,
    path: PathBuf,
    config: TransportConfig,
}

impl SgDevice {
    /// Open `path` read-write, non-blocking.
    pub fn open(path: impl AsRef<Path>, config: TransportConfig) -> Result<Self, TransportError> {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .custom_flags(libc::O_NONBLOCK)
            .open(path)
            .map_err(|source| {
                tracing::error!(path = %path.display(), error = %source, "failed to open device");
                TransportError::Open {
                    path: path.to_path_buf(),
                    source,
                }
            })?;
        tracing::debug!(path = %path.display(), "opened SG device");
        Ok(Self {
            file,
            path: path.to_path_buf(),
            config,
        })
    }

    /// Node this device was opened from.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Transport for SgDevice {
    fn send(
        &self,
        cdb: &Cdb,
        direction: DataDirection<'_>,
        timeout: Duration,
    ) -> Result<Vec<u8>, TransportError> {
        let len = direction.len();
        if len > self.config.max_transfer_len {
            return Err(TransportError::TransferTooLarge { len });
        }
        let dxfer_len = libc::c_uint::try_from(len).map_err(|_| TransportError::TransferTooLarge { len })?;

        let (dxfer_direction, mut buf) = match direction {
            DataDirection::In(n) => (SG_DXFER_FROM_DEV, vec![0u8; n]),
            DataDirection::Out(data) => (SG_DXFER_TO_DEV, data.to_vec()),
        };
        let mut sense = [0u8; SENSE_LEN];
        let cmd: [u8; CDB_LEN] = *cdb.as_bytes();

        #[allow(clippy::cast_possible_truncation)] // CDB_LEN and SENSE_LEN are small constants
        let mut hdr = SgIoHdr {
            interface_id: SG_INTERFACE_ID,
            dxfer_direction,
            cmd_len: CDB_LEN as libc::c_uchar,
            mx_sb_len: SENSE_LEN as libc::c_uchar,
            iovec_count: 0,
            dxfer_len,
            dxferp: buf.as_mut_ptr().cast(),
            cmdp: cmd.as_ptr(),
            sbp: sense.as_mut_ptr(),
            timeout: libc::c_uint::try_from(timeout.as_millis()).unwrap_or(libc::c_uint::MAX),
            flags: 0,
            pack_id: 0,
            usr_ptr: std::ptr::null_mut(),
            status: 0,
            masked_status: 0,
            msg_status: 0,
            sb_len_wr: 0,
            host_status: 0,
            driver_status: 0,
            resid: 0,
            duration: 0,
            info: 0,
        };

        // SAFETY: hdr is a valid sg_io_hdr whose pointers reference `buf`
        // (dxfer_len bytes), `cmd` (cmd_len bytes) and `sense` (mx_sb_len
        // bytes), all of which outlive the blocking call.
        let res = unsafe { libc::ioctl(self.file.as_raw_fd(), SG_IO as _, &mut hdr) };
        if res < 0 {
            let err = std::io::Error::last_os_error();
            tracing::error!(
                path = %self.path.display(),
                ?cdb,
                error = %err,
                "SG_IO failed"
            );
            return Err(TransportError::PassThrough(err));
        }

        if hdr.info & SG_INFO_OK_MASK != 0 {
            tracing::warn!(
                ?cdb,
                status = hdr.status,
                host_status = hdr.host_status,
                driver_status = hdr.driver_status,
                "SG_IO completed with check condition"
            );
        }

        match direction {
            DataDirection::In(n) => {
                let resid = usize::try_from(hdr.resid).unwrap_or(0);
                buf.truncate(n.saturating_sub(resid));
                Ok(buf)
            }
            DataDirection::Out(_) => Ok(Vec::new()),
        }
    }

    fn max_transfer_len(&self) -> usize {
        self.config.max_transfer_len
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_header_matches_kernel_layout() {
        // 64-bit sg_io_hdr is 88 bytes
        #[cfg(target_pointer_width = "64")]
        assert_eq!(std::mem::size_of::<SgIoHdr>(), 88);
    }

    #[test]
    fn test_open_missing_node_reports_path() {
        let err = SgDevice::open("/dev/it8951-does-not-exist", TransportConfig::default())
            .unwrap_err();
        match err {
            TransportError::Open { path, .. } => {
                assert_eq!(path, Path::new("/dev/it8951-does-not-exist"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_oversized_request_rejected_before_ioctl() {
        let file = tempfile::tempfile().unwrap();
        let dev = SgDevice {
            file,
            path: PathBuf::from("tmp"),
            config: TransportConfig { max_transfer_len: 16 },
        };
        let err = dev
            .send(&Cdb::load_image_area(), DataDirection::Out(&[0; 17]), Duration::from_secs(1))
            .unwrap_err();
        assert!(matches!(err, TransportError::TransferTooLarge { len: 17 }));
    }
}
