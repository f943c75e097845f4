//! Windows SCSI pass-through direct backend
//!
//! The RamDisc mounts as a drive letter; requests go through
//! `IOCTL_SCSI_PASS_THROUGH_DIRECT` on a handle to `\\.\X:`.

use std::ffi::c_void;
use std::os::windows::ffi::OsStrExt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use windows_sys::Win32::Foundation::{CloseHandle, GENERIC_READ, GENERIC_WRITE, HANDLE, INVALID_HANDLE_VALUE};
use windows_sys::Win32::Storage::FileSystem::{CreateFileW, FILE_SHARE_READ, FILE_SHARE_WRITE, OPEN_EXISTING};
use windows_sys::Win32::System::IO::DeviceIoControl;

use crate::cdb::{Cdb, CDB_LEN};
use crate::transport::{DataDirection, Transport, TransportConfig, TransportError};

// ---------------------------------------------------------------------------
// <ntddscsi.h>
// ---------------------------------------------------------------------------

const IOCTL_SCSI_PASS_THROUGH_DIRECT: u32 = 0x0004_D014;
const SCSI_IOCTL_DATA_OUT: u8 = 0;
const SCSI_IOCTL_DATA_IN: u8 = 1;

#[repr(C)]
#[allow(non_snake_case)]
struct ScsiPassThroughDirect {
    Length: u16,
    ScsiStatus: u8,
    PathId: u8,
    TargetId: u8,
    Lun: u8,
    CdbLength: u8,
    SenseInfoLength: u8,
    DataIn: u8,
    DataTransferLength: u32,
    TimeOutValue: u32,
    DataBuffer: *mut c_void,
    SenseInfoOffset: u32,
    Cdb: [u8; 16],
}

// ---------------------------------------------------------------------------
// Device
// ---------------------------------------------------------------------------

/// An open handle to the RamDisc volume.
///
/// The handle is closed on drop.
#[derive(Debug)]
pub struct SptDevice {
    handle: HANDLE,
    path: PathBuf,
    config: TransportConfig,
}

impl SptDevice {
    /// Open `path` (e.g. `\\.\E:`) for read/write with shared access.
    pub fn open(path: impl AsRef<Path>, config: TransportConfig) -> Result<Self, TransportError> {
        let path = path.as_ref();
        let wide: Vec<u16> = path.as_os_str().encode_wide().chain(Some(0)).collect();

        // SAFETY: `wide` is NUL-terminated and outlives the call; all other
        // arguments are plain flags or null.
        let handle = unsafe {
            CreateFileW(
                wide.as_ptr(),
                GENERIC_READ | GENERIC_WRITE,
                FILE_SHARE_READ | FILE_SHARE_WRITE,
                std::ptr::null(),
                OPEN_EXISTING,
                0,
                0,
            )
        };
        if handle == INVALID_HANDLE_VALUE {
            let source = std::io::Error::last_os_error();
            tracing::error!(path = %path.display(), error = %source, "failed to open device");
            return Err(TransportError::Open {
                path: path.to_path_buf(),
                source,
            });
        }
        tracing::debug!(path = %path.display(), "opened pass-through device");
        Ok(Self {
            handle,
            path: path.to_path_buf(),
            config,
        })
    }

    /// Volume path this device was opened from.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for SptDevice {
    fn drop(&mut self) {
        // SAFETY: the handle came from a successful CreateFileW and is closed once.
        unsafe {
            CloseHandle(self.handle);
        }
    }
}

impl Transport for SptDevice {
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
        let transfer_len = u32::try_from(len).map_err(|_| TransportError::TransferTooLarge { len })?;

        let (data_in, mut buf) = match direction {
            DataDirection::In(n) => (SCSI_IOCTL_DATA_IN, vec![0u8; n]),
            DataDirection::Out(data) => (SCSI_IOCTL_DATA_OUT, data.to_vec()),
        };

        // Seconds, rounded up, at least one.
        let secs = timeout
            .as_secs()
            .saturating_add(u64::from(timeout.subsec_nanos() > 0))
            .max(1);

        #[allow(clippy::cast_possible_truncation)] // struct size and CDB_LEN are small constants
        let mut sptd = ScsiPassThroughDirect {
            Length: std::mem::size_of::<ScsiPassThroughDirect>() as u16,
            ScsiStatus: 0,
            PathId: 0,
            TargetId: 0,
            Lun: 0,
            CdbLength: CDB_LEN as u8,
            SenseInfoLength: 0,
            DataIn: data_in,
            DataTransferLength: transfer_len,
            TimeOutValue: u32::try_from(secs).unwrap_or(u32::MAX),
            DataBuffer: buf.as_mut_ptr().cast(),
            SenseInfoOffset: 0,
            Cdb: *cdb.as_bytes(),
        };
        let size = u32::try_from(std::mem::size_of::<ScsiPassThroughDirect>()).unwrap_or(u32::MAX);
        let mut returned: u32 = 0;

        // SAFETY: sptd is used as both input and output buffer of `size` bytes;
        // DataBuffer points at `buf`, which holds DataTransferLength bytes and
        // outlives the synchronous call.
        let ok = unsafe {
            DeviceIoControl(
                self.handle,
                IOCTL_SCSI_PASS_THROUGH_DIRECT,
                std::ptr::addr_of_mut!(sptd).cast(),
                size,
                std::ptr::addr_of_mut!(sptd).cast(),
                size,
                &mut returned,
                std::ptr::null_mut(),
            )
        };
        if ok == 0 {
            let err = std::io::Error::last_os_error();
            tracing::error!(path = %self.path.display(), ?cdb, error = %err, "DeviceIoControl failed");
            return Err(TransportError::PassThrough(err));
        }

        match direction {
            DataDirection::In(n) => {
                let got = usize::try_from(sptd.DataTransferLength).unwrap_or(n);
                buf.truncate(got.min(n));
                Ok(buf)
            }
            DataDirection::Out(_) => Ok(Vec::new()),
        }
    }

    fn max_transfer_len(&self) -> usize {
        self.config.max_transfer_len
    }
}
