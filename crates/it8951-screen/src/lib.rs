//! Image display orchestration for IT8951 e-paper panels
//!
//! [`ScreenManager`] sits on top of an [`it8951_scsi::It8951`] and turns "show
//! this picture" into load and refresh commands:
//!
//! ```text
//! ImageSource ──► GrayBuffer ──► rotate ──► scale to panel ──► load + GC16 refresh
//!                                                               (+ second refresh after a clear)
//! ```
//!
//! # Example
//!
//! ```no_run
//! use it8951_scsi::{open_device, It8951, TransportConfig};
//! use it8951_screen::{FileImageSource, Rotation, ScreenManager};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let chip = It8951::new(open_device("/dev/sg0", TransportConfig::default())?);
//! let mut screen = ScreenManager::new(chip);
//! screen.set_rotation(Rotation::Degrees0);
//! screen.clear_screen()?;
//! screen.display(&FileImageSource::new("photo.png"))?;
//! # Ok(())
//! # }
//! ```

// ── Lint policy ─────────────────────────────────────────────────────────────
#![deny(clippy::unwrap_used)] // no .unwrap() in production code
#![deny(clippy::expect_used)] // no .expect() in production code
#![deny(clippy::panic)] // no panic!() in production code
#![deny(unused_must_use)] // all Results must be handled
// ────────────────────────────────────────────────────────────────────────────
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::print_stdout)] // prefer tracing over println! in lib code
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

pub mod image_source;
pub mod rotation;
pub mod screen;

pub use image_source::{FileImageSource, GrayBuffer, ImageError, ImageSource};
pub use rotation::{ParseRotationError, Rotation};
pub use screen::{ScreenError, ScreenManager};
