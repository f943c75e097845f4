//! Image rotation applied before scaling to the panel

use core::fmt;
use core::str::FromStr;

use image::{imageops, GrayImage};

/// Clockwise rotation applied to every image before it is scaled to the panel.
///
/// Panels are usually mounted upside down relative to the controller's
/// origin, hence the 180° default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Rotation {
    /// No rotation
    Degrees0,
    /// 90° clockwise (portrait source on a landscape panel)
    Degrees90,
    /// Upside down
    #[default]
    Degrees180,
    /// 270° clockwise / 90° counter-clockwise
    Degrees270,
}

impl Rotation {
    /// Clockwise angle in degrees.
    pub const fn degrees(self) -> u32 {
        match self {
            Rotation::Degrees0 => 0,
            Rotation::Degrees90 => 90,
            Rotation::Degrees180 => 180,
            Rotation::Degrees270 => 270,
        }
    }

    /// Parse a clockwise angle; only right angles in `0..360` are accepted.
    pub const fn from_degrees(degrees: u32) -> Option<Self> {
        match degrees {
            0 => Some(Rotation::Degrees0),
            90 => Some(Rotation::Degrees90),
            180 => Some(Rotation::Degrees180),
            270 => Some(Rotation::Degrees270),
            _ => None,
        }
    }

    /// Parse the legacy numeric selector: 0 = 90° cw, 1 = 180°, 2 = 270° cw.
    ///
    /// There is no selector for "no rotation".
    pub const fn from_selector(selector: i32) -> Option<Self> {
        match selector {
            0 => Some(Rotation::Degrees90),
            1 => Some(Rotation::Degrees180),
            2 => Some(Rotation::Degrees270),
            _ => None,
        }
    }

    /// Size of a `width × height` image once rotated; quarter turns transpose.
    pub const fn rotated_size(self, width: u32, height: u32) -> (u32, u32) {
        match self {
            Rotation::Degrees90 | Rotation::Degrees270 => (height, width),
            Rotation::Degrees0 | Rotation::Degrees180 => (width, height),
        }
    }

    /// Rotate `image` clockwise by this angle.
    pub fn apply(self, image: GrayImage) -> GrayImage {
        match self {
            Rotation::Degrees0 => image,
            Rotation::Degrees90 => imageops::rotate90(&image),
            Rotation::Degrees180 => imageops::rotate180(&image),
            Rotation::Degrees270 => imageops::rotate270(&image),
        }
    }
}

impl fmt::Display for Rotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}°", self.degrees())
    }
}

/// A rotation string that is not 0, 90, 180 or 270.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid rotation {0:?}: expected 0, 90, 180 or 270")]
pub struct ParseRotationError(pub String);

impl FromStr for Rotation {
    type Err = ParseRotationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .trim_end_matches('°')
            .parse::<u32>()
            .ok()
            .and_then(Rotation::from_degrees)
            .ok_or_else(|| ParseRotationError(s.to_owned()))
    }
}
