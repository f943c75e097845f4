//! Grayscale image sources
//!
//! The orchestrator only needs "some 8-bit luma pixels of a known size";
//! [`ImageSource`] is that seam. [`FileImageSource`] decodes files with the
//! `image` crate, and [`GrayBuffer`] itself is a source for in-memory images.

use std::path::{Path, PathBuf};

use image::GrayImage;

/// Image loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ImageError {
    /// The file could not be opened or decoded.
    #[error("failed to load image {}: {source}", path.display())]
    Decode {
        /// File that was requested.
        path: PathBuf,
        /// Decoder error.
        #[source]
        source: image::ImageError,
    },
    /// The image has no pixels.
    #[error("image is empty")]
    Empty,
    /// Pixel count does not match `width × height`.
    #[error("{width}x{height} image needs {expected} pixels, got {actual}")]
    SizeMismatch {
        /// Declared width.
        width: u32,
        /// Declared height.
        height: u32,
        /// `width × height`.
        expected: usize,
        /// Pixels supplied.
        actual: usize,
    },
}

/// 8-bit grayscale pixels, row-major, one byte per pixel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrayBuffer {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl GrayBuffer {
    /// Wrap `pixels`; the length must be exactly `width × height`.
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self, ImageError> {
        // SAFETY: u32 × u32 fits in u64.
        #[allow(clippy::arithmetic_side_effects)]
        let expected = usize::try_from(u64::from(width) * u64::from(height)).unwrap_or(usize::MAX);
        if pixels.len() != expected {
            return Err(ImageError::SizeMismatch {
                width,
                height,
                expected,
                actual: pixels.len(),
            });
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Row-major pixels.
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// True when the image has no pixels.
    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    /// Convert into an `image` buffer for processing.
    pub fn into_image(self) -> GrayImage {
        let (width, height) = (self.width, self.height);
        // Length was checked in `new`, so `from_raw` cannot fail.
        GrayImage::from_raw(width, height, self.pixels).unwrap_or_else(|| GrayImage::new(width, height))
    }
}

impl From<GrayImage> for GrayBuffer {
    fn from(image: GrayImage) -> Self {
        let (width, height) = image.dimensions();
        Self {
            width,
            height,
            pixels: image.into_raw(),
        }
    }
}

/// Anything that can produce a grayscale image on demand.
pub trait ImageSource {
    /// Produce the image. Called once per display.
    fn load(&self) -> Result<GrayBuffer, ImageError>;
}

impl ImageSource for GrayBuffer {
    fn load(&self) -> Result<GrayBuffer, ImageError> {
        Ok(self.clone())
    }
}

impl<S: ImageSource + ?Sized> ImageSource for &S {
    fn load(&self) -> Result<GrayBuffer, ImageError> {
        (**self).load()
    }
}

/// Image file on disk, decoded and converted to 8-bit luma.
///
/// Format is detected from the file contents and extension (PNG, JPEG, BMP,
/// GIF, TIFF).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileImageSource {
    path: PathBuf,
}

impl FileImageSource {
    /// Source reading `path` on every load.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// File this source reads.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ImageSource for FileImageSource {
    fn load(&self) -> Result<GrayBuffer, ImageError> {
        tracing::info!(path = %self.path.display(), "loading image");
        let decoded = image::open(&self.path).map_err(|source| ImageError::Decode {
            path: self.path.clone(),
            source,
        })?;
        let luma = decoded.into_luma8();
        if luma.width() == 0 || luma.height() == 0 {
            return Err(ImageError::Empty);
        }
        tracing::info!(width = luma.width(), height = luma.height(), "opened image");
        Ok(GrayBuffer::from(luma))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_new_checks_length() {
        assert!(GrayBuffer::new(2, 3, vec![0; 6]).is_ok());
        assert!(matches!(
            GrayBuffer::new(2, 3, vec![0; 5]),
            Err(ImageError::SizeMismatch {
                expected: 6,
                actual: 5,
                ..
            })
        ));
    }

    #[test]
    fn test_image_conversion_keeps_pixels() {
        let buf = GrayBuffer::new(2, 2, vec![10, 20, 30, 40]).unwrap();
        let img = buf.clone().into_image();
        assert_eq!(img.get_pixel(1, 0).0, [20]);
        assert_eq!(GrayBuffer::from(img), buf);
    }

    #[test]
    fn test_missing_file_is_decode_error() {
        let src = FileImageSource::new("/nonexistent/picture.png");
        assert!(matches!(src.load(), Err(ImageError::Decode { .. })));
    }

    #[test]
    fn test_file_source_converts_to_luma() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rgb.png");
        let mut rgb = image::RgbImage::new(3, 2);
        rgb.put_pixel(0, 0, image::Rgb([255, 255, 255]));
        rgb.save(&path).unwrap();

        let buf = FileImageSource::new(&path).load().unwrap();
        assert_eq!((buf.width(), buf.height()), (3, 2));
        assert_eq!(buf.pixels()[0], 255);
        assert_eq!(buf.pixels()[1], 0);
    }
}
