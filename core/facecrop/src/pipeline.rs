//! Per-request processing pipeline: decode, detect, choose the primary
//! face, crop, resize, encode.

use image::DynamicImage;

use crate::detect::{self, FaceDetector, QUALITY_THRESHOLD};
use crate::error::CropError;
use crate::geometry::{plan_square_crop, FaceRect};
use crate::raster;
use crate::CropOptions;

/// Result of one pipeline run.
#[derive(Debug, Clone)]
pub struct ProcessedImage {
    /// Encoded JPEG bytes.
    pub data: Vec<u8>,
    /// Output raster width in pixels.
    pub width: u32,
    /// Output raster height in pixels.
    pub height: u32,
    /// Whether a face drove the crop. `false` means the original raster
    /// was re-encoded whole.
    pub face_found: bool,
}

/// Run the full pipeline over encoded image bytes.
///
/// When no detection survives the quality threshold, the original raster
/// is re-encoded and returned uncropped and unresized: a designed
/// fallback, not an error. Otherwise the first candidate in detector order
/// is cropped per [`plan_square_crop`], resized to
/// `round(intended_side * output_scale)` per side, and JPEG-encoded.
///
/// The run is synchronous and deterministic: identical bytes and options
/// produce identical output.
pub fn process(
    input: &[u8],
    options: &CropOptions,
    detector: &dyn FaceDetector,
) -> Result<ProcessedImage, CropError> {
    let image = raster::decode(input)?;

    let detections = detect::detect_faces(&image, detector);
    let candidates = detect::select_candidates(&detections, QUALITY_THRESHOLD);

    match candidates.first() {
        None => {
            tracing::info!("no face above threshold, returning the full image");
            encode_original(&image)
        }
        Some(face) => render_face_crop(&image, face, options),
    }
}

fn encode_original(image: &DynamicImage) -> Result<ProcessedImage, CropError> {
    let data = raster::encode_jpeg(image)?;
    Ok(ProcessedImage {
        data,
        width: image.width(),
        height: image.height(),
        face_found: false,
    })
}

fn render_face_crop(
    image: &DynamicImage,
    face: &FaceRect,
    options: &CropOptions,
) -> Result<ProcessedImage, CropError> {
    let plan = plan_square_crop(face, image.width(), image.height(), options.zoom)?;
    let side = raster::output_side(plan.intended_side, options.output_scale)?;

    let cropped = image.crop_imm(plan.x, plan.y, plan.side, plan.side);
    let resized = raster::resize_square(&cropped, side);
    let data = raster::encode_jpeg(&resized)?;

    Ok(ProcessedImage {
        data,
        width: resized.width(),
        height: resized.height(),
        face_found: true,
    })
}
