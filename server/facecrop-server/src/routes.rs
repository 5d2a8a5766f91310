//! The `/crop` endpoint: fetch the source image, run the pipeline, return
//! the encoded JPEG.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use facecrop::{process, CropOptions, FaceDetector};
use serde::Deserialize;

use crate::error::ServiceError;

/// Shared per-process state: the immutably loaded detector and the
/// outbound HTTP client. Cheap to clone; both halves are handles.
#[derive(Clone)]
pub struct AppState {
    pub detector: Arc<dyn FaceDetector>,
    pub client: reqwest::Client,
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    Router::new().route("/crop", get(crop)).with_state(state)
}

/// Raw query parameters. `zoom` and `size` stay strings here so that
/// unparsable values fall back to defaults instead of rejecting the
/// request.
#[derive(Debug, Deserialize)]
struct CropParams {
    src: Option<String>,
    zoom: Option<String>,
    size: Option<String>,
}

async fn crop(
    State(state): State<AppState>,
    Query(params): Query<CropParams>,
) -> Result<Response, ServiceError> {
    let url = decode_src(params.src.as_deref())?;
    let options = CropOptions::from_raw(params.zoom.as_deref(), params.size.as_deref());

    tracing::debug!(%url, zoom = options.zoom, size = options.output_scale, "crop request");

    let bytes = fetch_source(&state.client, &url).await?;

    // Detection and resampling are CPU-bound; keep them off the async
    // workers. The pipeline itself is synchronous per request.
    let detector = Arc::clone(&state.detector);
    let output = tokio::task::spawn_blocking(move || process(&bytes, &options, detector.as_ref()))
        .await
        .map_err(|e| ServiceError::Internal(e.to_string()))??;

    if !output.face_found {
        tracing::info!(%url, "no face detected, returned the original image");
    }

    Ok(jpeg_response(output.data))
}

/// Decode the base64-encoded source URL.
fn decode_src(src: Option<&str>) -> Result<String, ServiceError> {
    let encoded = src.ok_or(ServiceError::MissingSrc)?;
    let decoded = BASE64
        .decode(encoded)
        .map_err(|e| ServiceError::InvalidSrc(e.to_string()))?;
    String::from_utf8(decoded).map_err(|_| ServiceError::InvalidSrc("not valid UTF-8".into()))
}

/// Retrieve the source image bytes. A non-success upstream status is a
/// fetch failure like any network error.
async fn fetch_source(client: &reqwest::Client, url: &str) -> Result<Vec<u8>, ServiceError> {
    let response = client.get(url).send().await?.error_for_status()?;
    Ok(response.bytes().await?.to_vec())
}

fn jpeg_response(data: Vec<u8>) -> Response {
    let length = data.len();
    let mut response = (StatusCode::OK, data).into_response();
    let headers = response.headers_mut();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("image/jpeg"));
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(length));
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    response
}
