use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use facecrop::CropError;
use thiserror::Error;

/// Request-level failures. Every variant is terminal for its request; the
/// service never retries.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("missing src parameter")]
    MissingSrc,

    #[error("invalid src parameter: {0}")]
    InvalidSrc(String),

    #[error("failed to fetch source image: {0}")]
    Fetch(#[from] reqwest::Error),

    #[error(transparent)]
    Pipeline(#[from] CropError),

    #[error("processing task failed: {0}")]
    Internal(String),
}

impl ServiceError {
    /// Stage label used as log context.
    pub fn stage(&self) -> &'static str {
        match self {
            Self::MissingSrc | Self::InvalidSrc(_) => "input",
            Self::Fetch(_) => "fetch",
            Self::Pipeline(e) => e.stage(),
            Self::Internal(_) => "internal",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::MissingSrc | Self::InvalidSrc(_) => StatusCode::BAD_REQUEST,
            Self::Fetch(_) => StatusCode::BAD_GATEWAY,
            Self::Pipeline(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        tracing::warn!(stage = self.stage(), error = %self, "request failed");
        let mut response = (self.status(), self.to_string()).into_response();
        response.headers_mut().insert(
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static("*"),
        );
        response
    }
}
