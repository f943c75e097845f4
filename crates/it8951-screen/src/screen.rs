//! Display orchestrator

use image::imageops::{self, FilterType};
use image::GrayImage;
use it8951_scsi::{Area, DisplayCommand, It8951, SystemInfo, Transport, WaveMode};

use crate::image_source::{ImageError, ImageSource};
use crate::rotation::Rotation;

/// Orchestrator failures.
#[derive(Debug, thiserror::Error)]
pub enum ScreenError {
    /// The image could not be produced; nothing was sent to the device.
    #[error(transparent)]
    Image(#[from] ImageError),
    /// A chip operation failed.
    #[error(transparent)]
    Device(#[from] it8951_scsi::Error),
    /// The device reported a 0×0 panel, so there is nothing to draw on.
    #[error("device reported no panel (0x0)")]
    NoPanel,
}

/// Shows images on one IT8951 panel.
///
/// Holds a snapshot of the device's system info taken at construction, the
/// rotation applied to every image, and whether the next display must be
/// refreshed twice to wipe the ghosting left by a clear.
pub struct ScreenManager<T> {
    chip: It8951<T>,
    info: SystemInfo,
    rotation: Rotation,
    needs_full_clear: bool,
}

impl<T: Transport> ScreenManager<T> {
    /// Take ownership of `chip` and snapshot its system info.
    ///
    /// A failed system-info query is not fatal: the manager is built with a
    /// 0×0 panel and every later [`ScreenManager::display`] reports
    /// [`ScreenError::NoPanel`].
    pub fn new(chip: It8951<T>) -> Self {
        let info = chip.system_info().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "couldn't read system info, assuming no panel");
            SystemInfo::default()
        });
        tracing::debug!(
            width = info.width,
            height = info.height,
            "created screen manager"
        );
        Self {
            chip,
            info,
            rotation: Rotation::default(),
            needs_full_clear: true,
        }
    }

    /// Like [`ScreenManager::new`], then program the panel bias voltage once.
    ///
    /// A failed VCOM write is logged and the manager is still returned.
    pub fn with_vcom(chip: It8951<T>, volts: f64) -> Self {
        let manager = Self::new(chip);
        if let Err(e) = manager.chip.set_vcom(volts) {
            tracing::error!(volts, error = %e, "failed to set VCOM");
        }
        manager
    }

    /// Panel size as `(width, height)`.
    pub fn panel_size(&self) -> (u32, u32) {
        self.info.panel_size()
    }

    /// System info captured at construction.
    pub fn system_info(&self) -> &SystemInfo {
        &self.info
    }

    /// Rotation applied to upcoming images.
    pub fn rotation(&self) -> Rotation {
        self.rotation
    }

    /// Underlying chip.
    pub fn chip(&self) -> &It8951<T> {
        &self.chip
    }

    /// Give the chip back.
    pub fn into_inner(self) -> It8951<T> {
        self.chip
    }

    /// Load an image, fit it to the panel and refresh with GC16.
    ///
    /// The image is rotated, then stretched to exactly the panel size. If the
    /// screen was cleared since the last display (or never displayed), the
    /// refresh is issued twice.
    pub fn display(&mut self, source: &impl ImageSource) -> Result<(), ScreenError> {
        let image = source
            .load()
            .map_err(|e| {
                tracing::warn!(error = %e, "couldn't load image");
                e
            })?
            .into_image();

        let (panel_w, panel_h) = self.info.panel_size();
        if panel_w == 0 || panel_h == 0 {
            return Err(ScreenError::NoPanel);
        }

        let (rotated_w, rotated_h) = self.rotation.rotated_size(image.width(), image.height());
        tracing::info!(
            rotation = %self.rotation,
            width = rotated_w,
            height = rotated_h,
            "rotating image"
        );
        let rotated = self.rotation.apply(image);
        let scaled = scale_to(rotated, panel_w, panel_h);

        let (w, h) = scaled.dimensions();
        let command = DisplayCommand {
            address: self.info.image_buf_base,
            wave_mode: WaveMode::GC16,
            area: Area::new(panel_w.saturating_sub(w) / 2, panel_h.saturating_sub(h) / 2, w, h),
            wait_ready: false,
        };

        self.chip
            .load_image_area(command.address, command.area, scaled.as_raw())?;
        self.chip.display_area(&command)?;
        if self.needs_full_clear {
            self.chip.display_area(&command)?;
            self.needs_full_clear = false;
        }
        Ok(())
    }

    /// Flash the whole panel to white.
    ///
    /// The next [`ScreenManager::display`] refreshes twice.
    pub fn clear_screen(&mut self) -> Result<(), ScreenError> {
        self.needs_full_clear = true;
        self.chip.clear_area(self.info.panel_area())?;
        Ok(())
    }

    /// Rotation for subsequent [`ScreenManager::display`] calls.
    pub fn set_rotation(&mut self, rotation: Rotation) {
        self.rotation = rotation;
    }

    /// Does nothing: the bias voltage is only set at construction
    /// ([`ScreenManager::with_vcom`]) or directly on the chip.
    pub fn set_vcom(&mut self, volts: f64) {
        tracing::debug!(volts, "runtime VCOM change ignored");
    }
}

fn scale_to(image: GrayImage, width: u32, height: u32) -> GrayImage {
    if image.dimensions() == (width, height) {
        return image;
    }
    tracing::info!(
        from_width = image.width(),
        from_height = image.height(),
        to_width = width,
        to_height = height,
        "resizing image"
    );
    imageops::resize(&image, width, height, FilterType::Triangle)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::image_source::GrayBuffer;
    use it8951_scsi::mock::MockTransport;
    use it8951_scsi::Opcode;

    #[test]
    fn test_scale_is_noop_at_panel_size() {
        let img = GrayImage::from_raw(2, 1, vec![1, 2]).unwrap();
        assert_eq!(scale_to(img.clone(), 2, 1), img);
        assert_eq!(scale_to(img, 6, 3).dimensions(), (6, 3));
    }

    #[test]
    fn test_vcom_setter_sends_nothing() {
        let info = SystemInfo {
            width: 4,
            height: 4,
            ..SystemInfo::default()
        };
        let mut screen = ScreenManager::new(It8951::new(MockTransport::it8951(info)));
        screen.chip().transport().clear_sent();
        screen.set_vcom(-2.0);
        assert!(screen.chip().transport().sent().is_empty());
    }

    #[test]
    fn test_zero_panel_display_sends_nothing() {
        let mut screen = ScreenManager::new(It8951::new(MockTransport::new()));
        let err = screen
            .display(&GrayBuffer::new(1, 1, vec![0]).unwrap())
            .unwrap_err();
        assert!(matches!(err, ScreenError::NoPanel));
        assert_eq!(screen.chip().transport().count(Opcode::LoadImageArea), 0);
    }
}
