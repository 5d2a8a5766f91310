//! End-to-end tests: a fixture HTTP server hands out a known raster, the
//! application fetches, crops, and returns it.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use facecrop::{Detection, FaceDetector};
use facecrop_server::routes::{router, AppState};

struct StubDetector {
    detections: Vec<Detection>,
}

impl FaceDetector for StubDetector {
    fn detect(&self, _gray: &[u8], _width: u32, _height: u32) -> Vec<Detection> {
        self.detections.clone()
    }
}

fn make_test_png(width: u32, height: u32) -> Vec<u8> {
    use image::codecs::png::PngEncoder;
    use image::{ImageEncoder, RgbImage};

    let mut img = RgbImage::new(width, height);
    for (x, y, pixel) in img.enumerate_pixels_mut() {
        *pixel = image::Rgb([
            (x * 255 / width.max(1)) as u8,
            (y * 255 / height.max(1)) as u8,
            128,
        ]);
    }
    let mut buffer = Vec::new();
    PngEncoder::new(&mut buffer)
        .write_image(img.as_raw(), width, height, image::ExtendedColorType::Rgb8)
        .unwrap();
    buffer
}

async fn serve(app: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

/// Serve `png` at `/img` on an ephemeral port.
async fn start_fixture_server(png: Vec<u8>) -> SocketAddr {
    let app = Router::new().route(
        "/img",
        get(move || {
            let png = png.clone();
            async move { png }
        }),
    );
    serve(app).await
}

async fn start_app(detections: Vec<Detection>) -> SocketAddr {
    let state = AppState {
        detector: Arc::new(StubDetector { detections }),
        client: reqwest::Client::new(),
    };
    serve(router(state)).await
}

fn detection(col: i32, row: i32, scale: i32, score: f32) -> Detection {
    Detection {
        col,
        row,
        scale,
        score,
    }
}

/// Base64 in a query string: escape `+` so it survives form decoding.
fn encode_src(url: &str) -> String {
    BASE64.encode(url).replace('+', "%2B")
}

#[tokio::test]
async fn crop_returns_a_square_jpeg_with_contract_headers() {
    let fixture = start_fixture_server(make_test_png(1000, 1000)).await;
    let app = start_app(vec![detection(500, 500, 200, 10.0)]).await;

    let src = encode_src(&format!("http://{fixture}/img"));
    let response = reqwest::get(format!("http://{app}/crop?src={src}&zoom=2"))
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    assert_eq!(
        response.headers().get("content-type").unwrap(),
        "image/jpeg"
    );
    assert_eq!(
        response.headers().get("access-control-allow-origin").unwrap(),
        "*"
    );
    let declared: usize = response
        .headers()
        .get("content-length")
        .unwrap()
        .to_str()
        .unwrap()
        .parse()
        .unwrap();

    let body = response.bytes().await.unwrap();
    assert_eq!(declared, body.len());
    assert_eq!(&body[..2], &[0xFF, 0xD8]);

    let decoded = image::load_from_memory(&body).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (400, 400));
}

#[tokio::test]
async fn no_face_returns_the_original_dimensions() {
    let fixture = start_fixture_server(make_test_png(640, 480)).await;
    let app = start_app(Vec::new()).await;

    let src = encode_src(&format!("http://{fixture}/img"));
    let response = reqwest::get(format!("http://{app}/crop?src={src}"))
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let body = response.bytes().await.unwrap();
    let decoded = image::load_from_memory(&body).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (640, 480));
}

#[tokio::test]
async fn invalid_parameters_fall_back_to_defaults() {
    let fixture = start_fixture_server(make_test_png(1000, 1000)).await;
    let app = start_app(vec![detection(500, 500, 200, 10.0)]).await;

    let src = encode_src(&format!("http://{fixture}/img"));
    let response = reqwest::get(format!(
        "http://{app}/crop?src={src}&zoom=banana&size=-3"
    ))
    .await
    .unwrap();

    assert_eq!(response.status(), 200);
    let body = response.bytes().await.unwrap();
    let decoded = image::load_from_memory(&body).unwrap();
    // zoom and size both default to 1.0: face width drives everything.
    assert_eq!((decoded.width(), decoded.height()), (200, 200));
}

#[tokio::test]
async fn missing_src_is_bad_request() {
    let app = start_app(Vec::new()).await;

    let response = reqwest::get(format!("http://{app}/crop")).await.unwrap();

    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn malformed_base64_is_bad_request() {
    let app = start_app(Vec::new()).await;

    let response = reqwest::get(format!("http://{app}/crop?src=!!!not-base64!!!"))
        .await
        .unwrap();

    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn unreachable_upstream_is_bad_gateway() {
    let app = start_app(Vec::new()).await;

    // Nothing listens on the discard port.
    let src = encode_src("http://127.0.0.1:9/img");
    let response = reqwest::get(format!("http://{app}/crop?src={src}"))
        .await
        .unwrap();

    assert_eq!(response.status(), 502);
}

#[tokio::test]
async fn non_image_payload_is_internal_error() {
    let app_fixture = Router::new().route("/img", get(|| async { "definitely not an image" }));
    let fixture = serve(app_fixture).await;
    let app = start_app(Vec::new()).await;

    let src = encode_src(&format!("http://{fixture}/img"));
    let response = reqwest::get(format!("http://{app}/crop?src={src}"))
        .await
        .unwrap();

    assert_eq!(response.status(), 500);
}
