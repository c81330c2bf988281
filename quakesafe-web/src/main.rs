//! quakesafe-web - building collapse-risk and wall-crack assessment service
//!
//! **Module Identity:**
//! - Name: quakesafe-web
//! - Default port: 5000
//!
//! Serves the landing page, answers chat messages through a hosted language
//! model, and assesses submitted buildings with pre-trained classifiers
//! reached through a model server.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use quakesafe_common::config::{resolve_gemini_api_key, ConfigFileResolver, TomlConfig};
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use quakesafe_web::services::{
    CrackPipeline, Explainer, GeminiClient, HttpCrackDetector, HttpStructuralClassifier,
    ModelServerClient, UploadStore,
};
use quakesafe_web::{build_router, AppState};

/// Command-line arguments for quakesafe-web
#[derive(Parser, Debug)]
#[command(name = "quakesafe-web")]
#[command(about = "Building collapse-risk and wall-crack assessment service")]
#[command(version)]
struct Args {
    /// Path to the TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address to bind (overrides config)
    #[arg(long, env = "QUAKESAFE_HOST")]
    host: Option<String>,

    /// Port to listen on (overrides config)
    #[arg(short, long, env = "QUAKESAFE_PORT")]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Config is read before tracing init so its log level applies;
    // the load outcome is reported once the subscriber is up
    let config_path = ConfigFileResolver::new(args.config.clone()).resolve();
    let (config, config_source) =
        TomlConfig::load(config_path.as_deref()).context("Failed to load configuration")?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!(
                    "quakesafe_web={0},quakesafe_common={0},tower_http={0}",
                    config.logging.level
                )
                .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting quakesafe-web v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );
    config_source.report();

    // External collaborators
    let api_key = resolve_gemini_api_key(&config)?;
    let llm = GeminiClient::new(api_key, &config.gemini).context("Failed to build Gemini client")?;
    info!("Language model: {}", config.gemini.model);

    let models = ModelServerClient::new(Duration::from_secs(config.models.timeout_secs))
        .context("Failed to build model-server client")?;
    let structural = HttpStructuralClassifier::new(models.clone(), &config.models.structural);
    let crack = CrackPipeline::new(
        Arc::new(HttpCrackDetector::new(models.clone(), "crack", &config.models.crack)),
        Arc::new(HttpCrackDetector::new(models.clone(), "crack_x", &config.models.crack_x)),
        Arc::new(HttpCrackDetector::new(models, "crack_y", &config.models.crack_y)),
    );
    info!("Structural classifier: {}", config.models.structural.endpoint);

    let uploads = UploadStore::new(&config.server.upload_dir).with_context(|| {
        format!(
            "Failed to create upload directory {}",
            config.server.upload_dir.display()
        )
    })?;
    info!("Upload directory: {}", uploads.dir().display());

    let state = AppState::new(
        Arc::new(structural),
        crack,
        Explainer::new(Arc::new(llm)),
        uploads,
    )
    .with_max_upload_bytes(config.server.max_upload_bytes)
    .with_static_assets(config.server.static_assets.clone());

    let app = build_router(state);

    let host = args.host.unwrap_or_else(|| config.server.host.clone());
    let port = args.port.unwrap_or(config.server.port);
    let listener = tokio::net::TcpListener::bind((host.as_str(), port))
        .await
        .with_context(|| format!("Failed to bind to {}:{}", host, port))?;
    let addr = listener.local_addr().context("Failed to read bound address")?;
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
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
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
                tracing::error!("Failed to install signal handler: {}", e);
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
            info!("Received terminate signal, shutting down");
        },
    }
}
