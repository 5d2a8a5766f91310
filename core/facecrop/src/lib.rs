//! Face-centered square cropping for photos.
//!
//! Given encoded image bytes, find the primary face and produce a square,
//! bounds-safe, distortion-free crop centered on it, optionally zoomed and
//! resized, encoded as baseline JPEG. Face detection and resampling are
//! opaque collaborators behind narrow interfaces; this crate owns the
//! geometry between them.
//!
//! # Example
//!
//! ```no_run
//! use facecrop::{process, CropOptions, RustfaceDetector};
//!
//! let detector = RustfaceDetector::from_file("model/seeta_fd_frontal_v1.0.bin").unwrap();
//! let bytes = std::fs::read("portrait.jpg").unwrap();
//! let output = process(&bytes, &CropOptions::default(), &detector).unwrap();
//! println!("{} bytes of JPEG", output.data.len());
//! ```
#![warn(missing_docs)]

pub mod detect;
mod error;
mod geometry;
mod pipeline;
mod raster;
#[cfg(feature = "rustface")]
/// Built-in SeetaFace-based face detector backend.
pub mod rustface_backend;

pub use detect::{Detection, FaceDetector};
pub use error::CropError;
pub use geometry::{plan_square_crop, CropPlan, FaceRect};
pub use pipeline::{process, ProcessedImage};
#[cfg(feature = "rustface")]
pub use rustface_backend::RustfaceDetector;

/// Zoom and output-size parameters for one crop request.
///
/// Both multipliers default to `1.0`. [`CropOptions::from_raw`] builds a
/// value from untrusted query input, falling back to the defaults for
/// anything that does not parse as a finite, non-negative float.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CropOptions {
    /// Multiplier expanding the crop square beyond the face rectangle
    /// width.
    pub zoom: f64,
    /// Multiplier applied to the pre-clamp crop side to pick the output
    /// size.
    pub output_scale: f64,
}

impl Default for CropOptions {
    fn default() -> Self {
        Self {
            zoom: 1.0,
            output_scale: 1.0,
        }
    }
}

impl CropOptions {
    /// Build options from raw query values.
    ///
    /// Invalid input selects the defaults; it is never an error.
    pub fn from_raw(zoom: Option<&str>, size: Option<&str>) -> Self {
        Self {
            zoom: parse_multiplier(zoom),
            output_scale: parse_multiplier(size),
        }
    }
}

fn parse_multiplier(raw: Option<&str>) -> f64 {
    raw.and_then(|v| v.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite() && *v >= 0.0)
        .unwrap_or(1.0)
}
