//! Settings from the optional JSON config file, overridden by flags.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use it8951_scsi::{Timeouts, TransportConfig};
use it8951_screen::Rotation;
use serde::Deserialize;

/// Device node used when neither the config file nor `--device` names one.
#[cfg(unix)]
pub const DEFAULT_DEVICE: Option<&str> = Some("/dev/sg0");
#[cfg(not(unix))]
pub const DEFAULT_DEVICE: Option<&str> = None;

/// Contents of the config file. Every field is optional.
///
/// ```json
/// { "device": "/dev/sg0", "vcom": -1.5, "rotation": 180,
///   "read_timeout_ms": 1000, "write_timeout_ms": 10000,
///   "max_transfer_len": 61440 }
/// ```
#[derive(Debug, Default, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub device: Option<PathBuf>,
    pub vcom: Option<f64>,
    pub rotation: Option<u32>,
    pub read_timeout_ms: Option<u64>,
    pub write_timeout_ms: Option<u64>,
    pub max_transfer_len: Option<usize>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn parse(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }
}

/// Values given on the command line; `None` leaves the file value in place.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Overrides {
    pub device: Option<PathBuf>,
    pub vcom: Option<f64>,
    pub rotation: Option<Rotation>,
}

/// Fully resolved settings for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub device: PathBuf,
    pub vcom: Option<f64>,
    pub rotation: Rotation,
    pub timeouts: Timeouts,
    pub transport: TransportConfig,
}

impl Settings {
    /// Flags win over the file; the file wins over built-in defaults.
    pub fn resolve(file: FileConfig, flags: Overrides) -> Result<Self> {
        let device = flags
            .device
            .or(file.device)
            .or_else(|| DEFAULT_DEVICE.map(PathBuf::from))
            .ok_or_else(|| anyhow!("no device given; pass --device or set \"device\" in the config"))?;

        let rotation = match (flags.rotation, file.rotation) {
            (Some(r), _) => r,
            (None, Some(deg)) => Rotation::from_degrees(deg).ok_or_else(|| {
                anyhow!("config rotation {deg} is not one of 0, 90, 180, 270")
            })?,
            (None, None) => Rotation::default(),
        };

        let max_transfer_len = file
            .max_transfer_len
            .unwrap_or(TransportConfig::DEFAULT.max_transfer_len);
        if max_transfer_len == 0 {
            return Err(anyhow!("max_transfer_len must be positive"));
        }

        Ok(Self {
            device,
            vcom: flags.vcom.or(file.vcom),
            rotation,
            timeouts: Timeouts {
                read: file
                    .read_timeout_ms
                    .map_or(Timeouts::DEFAULT.read, Duration::from_millis),
                write: file
                    .write_timeout_ms
                    .map_or(Timeouts::DEFAULT.write, Duration::from_millis),
            },
            transport: TransportConfig { max_transfer_len },
        })
    }
}
