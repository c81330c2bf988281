//! quakesafe-web library interface
//!
//! HTTP service that classifies a building's collapse risk from a form,
//! classifies wall cracks from an uploaded photograph, and asks a hosted
//! language model to explain the results.

pub mod api;
pub mod error;
pub mod services;
pub mod types;

pub use crate::error::{ApiError, ApiResult};

use std::fmt::Display;
use std::path::PathBuf;
use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::Router;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::services::{CrackPipeline, Explainer, UploadStore};
use crate::types::StructuralClassifier;

/// Default request body limit (16 MiB)
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Tabular collapse-risk classifier
    pub structural: Arc<dyn StructuralClassifier>,
    /// Crack detectors and verdict composition
    pub crack: CrackPipeline,
    /// Language-model explanations and chat
    pub explainer: Explainer,
    /// Per-request upload files
    pub uploads: UploadStore,
    /// Largest accepted request body
    pub max_upload_bytes: usize,
    /// Directory served under `/static`, if any
    pub static_assets: Option<PathBuf>,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
    /// Last upstream error for diagnostic purposes
    pub last_error: Arc<RwLock<Option<String>>>,
}

impl AppState {
    pub fn new(
        structural: Arc<dyn StructuralClassifier>,
        crack: CrackPipeline,
        explainer: Explainer,
        uploads: UploadStore,
    ) -> Self {
        Self {
            structural,
            crack,
            explainer,
            uploads,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            static_assets: None,
            startup_time: Utc::now(),
            last_error: Arc::new(RwLock::new(None)),
        }
    }

    pub fn with_max_upload_bytes(mut self, max_upload_bytes: usize) -> Self {
        self.max_upload_bytes = max_upload_bytes;
        self
    }

    pub fn with_static_assets(mut self, dir: Option<PathBuf>) -> Self {
        self.static_assets = dir;
        self
    }

    /// Remember an upstream failure for `/health`
    pub async fn record_error(&self, error: &impl Display) {
        tracing::error!("Upstream failure: {}", error);
        *self.last_error.write().await = Some(error.to_string());
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    let mut router = Router::new()
        .merge(api::ui_routes())
        .merge(api::chat_routes())
        .merge(api::submit_routes())
        .merge(api::health_routes())
        .merge(api::buildinfo_routes());

    if let Some(dir) = &state.static_assets {
        tracing::info!("Serving static assets from {}", dir.display());
        router = router.nest_service("/static", ServeDir::new(dir));
    }

    router
        .layer(DefaultBodyLimit::max(state.max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
