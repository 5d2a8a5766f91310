use thiserror::Error;

/// Error type returned by facecrop operations.
///
/// Every variant is terminal for the request that produced it; nothing in
/// the pipeline retries.
#[derive(Debug, Error)]
pub enum CropError {
    /// The input bytes could not be decoded as an image.
    #[error("failed to decode image: {0}")]
    Decode(String),

    /// The decoded raster has a zero dimension.
    #[error("image dimensions are zero")]
    ZeroDimensions,

    /// The crop arithmetic produced an empty region.
    #[error("computed crop region is empty")]
    EmptyCrop,

    /// The output-size arithmetic rounded to zero pixels.
    #[error("computed output size is zero")]
    ZeroOutputSize,

    /// The output-size arithmetic exceeded the supported maximum.
    #[error("computed output side of {0}px exceeds the supported maximum")]
    OutputTooLarge(u64),

    /// The final raster could not be serialized.
    #[error("failed to encode image: {0}")]
    Encode(String),
}

impl CropError {
    /// Pipeline stage the error belongs to, used as log context.
    pub fn stage(&self) -> &'static str {
        match self {
            CropError::Decode(_) | CropError::ZeroDimensions => "decode",
            CropError::EmptyCrop | CropError::ZeroOutputSize | CropError::OutputTooLarge(_) => {
                "geometry"
            }
            CropError::Encode(_) => "encode",
        }
    }
}
