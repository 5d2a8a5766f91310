use std::io::Cursor;
use std::path::Path;

use crate::detect::{Detection, FaceDetector};

/// Smallest face the cascade searches for, in pixels.
const MIN_FACE_SIZE: u32 = 20;

/// Largest face the cascade searches for, in pixels.
const MAX_FACE_SIZE: u32 = 2000;

/// Slide step of the 40px detection window: 4px, a 10% shift per step.
const SLIDE_WINDOW_STEP: u32 = 4;

/// Pyramid downscale per level; 0.91 is the inverse of a 1.1x per-level
/// window growth.
const PYRAMID_SCALE_FACTOR: f32 = 0.91;

/// Raw classifier cutoff. Candidate selection applies its own, stricter
/// threshold on the clustered score afterwards.
const SCORE_THRESH: f64 = 2.0;

/// Face detector backed by the `rustface` crate (SeetaFace engine).
///
/// The model is read once at construction and held immutably for the life
/// of the process. Each `detect` call builds a short-lived detector from a
/// clone of the model, because the underlying detector keeps per-run
/// scratch buffers and is not `Sync`.
pub struct RustfaceDetector {
    model: rustface::Model,
}

impl RustfaceDetector {
    /// Read the SeetaFace model from `path`.
    ///
    /// Intended to run once at process start; a failure here should be
    /// treated as fatal by the caller.
    pub fn from_file(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let data = std::fs::read(path)?;
        Self::from_bytes(&data)
    }

    /// Load the SeetaFace model from raw bytes.
    pub fn from_bytes(data: &[u8]) -> std::io::Result<Self> {
        let model = rustface::read_model(Cursor::new(data))?;
        Ok(Self { model })
    }
}

impl FaceDetector for RustfaceDetector {
    fn detect(&self, gray: &[u8], width: u32, height: u32) -> Vec<Detection> {
        let mut detector = rustface::create_detector_with_model(self.model.clone());
        detector.set_min_face_size(MIN_FACE_SIZE);
        detector.set_max_face_size(MAX_FACE_SIZE);
        detector.set_score_thresh(SCORE_THRESH);
        detector.set_pyramid_scale_factor(PYRAMID_SCALE_FACTOR);
        detector.set_slide_window_step(SLIDE_WINDOW_STEP, SLIDE_WINDOW_STEP);

        let faces = detector.detect(&rustface::ImageData::new(gray, width, height));

        faces
            .iter()
            .map(|face| {
                let bbox = face.bbox();
                Detection {
                    col: bbox.x() + bbox.width() as i32 / 2,
                    row: bbox.y() + bbox.height() as i32 / 2,
                    scale: bbox.width().max(bbox.height()) as i32,
                    score: face.score() as f32,
                }
            })
            .collect()
    }
}
