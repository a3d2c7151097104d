//! auscult-api - Respiratory Sound Classification microservice
//!
//! Serves `POST /cough_predict` and `POST /breath_predict`: an uploaded
//! recording is reduced to a 13 × 216 MFCC tensor and scored by the model
//! bound to the endpoint. Models are loaded once at startup.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use auscult_api::api::BuildInfo;
use auscult_api::config::{Cli, ServiceConfig};
use auscult_api::features::{AudioFeatureExtractor, FeatureParams};
use auscult_api::inference::load_models;
use auscult_api::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = ServiceConfig::load(&cli).context("Failed to load configuration")?;

    // Initialize tracing (RUST_LOG wins over the config file)
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.logging.filter.as_str().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting auscult-api (Respiratory Sound Classification)");
    let build = BuildInfo::current();
    info!(
        "Version: {} (git {}, built {}, {})",
        env!("CARGO_PKG_VERSION"),
        build.git_hash,
        build.timestamp,
        build.profile
    );
    match &config.config_path {
        Some(path) => info!("Configuration: {}", path.display()),
        None => info!("Configuration: compiled defaults"),
    }

    let params = FeatureParams::default();
    info!(
        sample_rate = params.sample_rate,
        duration_seconds = params.duration_seconds,
        n_mfcc = params.n_mfcc,
        frames = params.n_frames(),
        "Feature extractor parameters"
    );
    let extractor = Arc::new(
        AudioFeatureExtractor::new(params).context("Failed to initialize feature extractor")?,
    );

    let models = load_models(&config.models).with_context(|| {
        if cfg!(feature = "onnx") {
            "Failed to load models".to_string()
        } else {
            "Failed to load models: this binary has no model backend, rebuild with `--features onnx` (needs protoc)"
                .to_string()
        }
    })?;
    let state = AppState::from_models(&models, &config.bindings, extractor)
        .context("Failed to bind models to endpoints")?
        .with_upload_limits(&config.upload.field_name, config.upload.max_upload_bytes);

    let app = auscult_api::build_router(state);

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("Listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received SIGTERM, shutting down");
        },
    }
}
