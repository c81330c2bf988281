//! Health check endpoint
//!
//! The service has no local state that can fail, so health reflects the
//! external models: once an upstream call has failed the service reports
//! `degraded` along with the failure, until the process restarts.

use axum::{extract::State, routing::get, Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::AppState;

/// Overall service condition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// No upstream failure seen
    Ok,
    /// A classifier or language-model call has failed
    Degraded,
}

impl HealthStatus {
    fn from_last_error(last_error: Option<&str>) -> Self {
        match last_error {
            Some(_) => HealthStatus::Degraded,
            None => HealthStatus::Ok,
        }
    }
}

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub module: String,
    pub version: String,
    pub uptime_seconds: u64,
    /// Most recent upstream failure, present when `status` is `degraded`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let uptime_seconds = Utc::now()
        .signed_duration_since(state.startup_time)
        .num_seconds()
        .max(0) as u64;
    let last_error = state.last_error.read().await.clone();

    Json(HealthResponse {
        status: HealthStatus::from_last_error(last_error.as_deref()),
        module: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds,
        last_error,
    })
}

pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
