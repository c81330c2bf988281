//! UI serving routes
//!
//! Serves the embedded landing page: building form on the left, chat bot
//! on the right.

use axum::{response::Html, routing::get, Router};

use crate::AppState;

const INDEX_HTML: &str = include_str!("../../static/index.html");

/// GET /
pub async fn serve_index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

pub fn ui_routes() -> Router<AppState> {
    Router::new().route("/", get(serve_index))
}
