//! facecrop-server entrypoint: parse flags, load the detector model once,
//! and serve the crop endpoint.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use facecrop::RustfaceDetector;
use facecrop_server::routes;
use tracing_subscriber::EnvFilter;

/// How long a single upstream image fetch may take before the request
/// fails.
const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP service that crops remote images around the primary face.
#[derive(Parser, Debug)]
#[command(name = "facecrop-server", version, about)]
struct Args {
    /// Port to listen on.
    #[arg(long, default_value_t = 8037)]
    port: u16,

    /// Path to the SeetaFace detection model.
    #[arg(long, default_value = "model/seeta_fd_frontal_v1.0.bin")]
    model: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    // The only fatal error: without the model there is nothing to serve.
    let detector = RustfaceDetector::from_file(&args.model).with_context(|| {
        format!(
            "failed to load detector model from {}",
            args.model.display()
        )
    })?;
    tracing::info!(model = %args.model.display(), "detector model loaded");

    let client = reqwest::Client::builder()
        .timeout(FETCH_TIMEOUT)
        .build()
        .context("failed to build HTTP client")?;

    let app = routes::router(routes::AppState {
        detector: Arc::new(detector),
        client,
    });

    let addr = SocketAddr::from(([0, 0, 0, 0], args.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!(%addr, "server started");

    axum::serve(listener, app).await.context("server exited")?;
    Ok(())
}
