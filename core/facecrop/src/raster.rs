//! Thin adapters over the `image` crate: decode, exact square resize, and
//! baseline JPEG encode.

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageEncoder, RgbImage};

use crate::error::CropError;

/// Baseline JPEG quality used for every response.
const JPEG_QUALITY: u8 = 75;

/// Hard ceiling on the output side, guarding resize allocations against
/// absurd zoom/size combinations.
const MAX_OUTPUT_SIDE: u32 = 8192;

/// Decode input bytes into a `DynamicImage`.
pub(crate) fn decode(input: &[u8]) -> Result<DynamicImage, CropError> {
    let image = image::load_from_memory(input).map_err(|e| CropError::Decode(e.to_string()))?;
    if image.width() == 0 || image.height() == 0 {
        return Err(CropError::ZeroDimensions);
    }
    Ok(image)
}

/// Output side for a crop whose pre-clamp side was `intended_side`.
///
/// The intended side is used rather than the possibly-smaller clamped side,
/// so the response dimensions stay predictable when the crop hit an image
/// edge; the raster is upscaled past the extracted region in that case.
pub(crate) fn output_side(intended_side: u64, output_scale: f64) -> Result<u32, CropError> {
    let side = (intended_side as f64 * output_scale).round();
    if side < 1.0 {
        return Err(CropError::ZeroOutputSize);
    }
    if side > f64::from(MAX_OUTPUT_SIDE) {
        return Err(CropError::OutputTooLarge(side as u64));
    }
    Ok(side as u32)
}

/// Lanczos3 resize to an exact `side` x `side` square.
pub(crate) fn resize_square(image: &DynamicImage, side: u32) -> DynamicImage {
    image.resize_exact(side, side, FilterType::Lanczos3)
}

/// Encode as baseline JPEG, flattening any alpha over white first.
pub(crate) fn encode_jpeg(image: &DynamicImage) -> Result<Vec<u8>, CropError> {
    let rgb = flatten_alpha(image);
    let mut buffer = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut buffer, JPEG_QUALITY);
    encoder
        .write_image(
            rgb.as_raw(),
            rgb.width(),
            rgb.height(),
            image::ExtendedColorType::Rgb8,
        )
        .map_err(|e| CropError::Encode(e.to_string()))?;
    Ok(buffer)
}

/// Composite the image onto a white background, dropping alpha.
fn flatten_alpha(image: &DynamicImage) -> RgbImage {
    let rgba = image.to_rgba8();
    let (width, height) = rgba.dimensions();
    let mut rgb = RgbImage::new(width, height);
    for (x, y, pixel) in rgba.enumerate_pixels() {
        let [r, g, b, a] = pixel.0;
        let alpha = f32::from(a) / 255.0;
        let blend = |c: u8| (f32::from(c) * alpha + 255.0 * (1.0 - alpha)).round() as u8;
        rgb.put_pixel(x, y, image::Rgb([blend(r), blend(g), blend(b)]));
    }
    rgb
}
