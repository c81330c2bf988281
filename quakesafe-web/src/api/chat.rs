//! Chat bot endpoint
//!
//! Free-text questions go to the language model with an instruction to
//! answer in Traditional Chinese. Asking for a prediction ("我要預測")
//! points the user at the form instead.

use axum::{
    extract::{rejection::JsonRejection, State},
    routing::post,
    Json, Router,
};
use quakesafe_common::api::{ChatReply, ChatRequest};

use crate::{ApiError, ApiResult, AppState};

/// POST /send_message
pub async fn send_message(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> ApiResult<Json<ChatReply>> {
    let Json(request) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    let reply = match state.explainer.chat(&request.message).await {
        Ok(reply) => reply,
        Err(e) => {
            state.record_error(&e).await;
            return Err(e.into());
        }
    };

    Ok(Json(ChatReply { reply }))
}

pub fn chat_routes() -> Router<AppState> {
    Router::new().route("/send_message", post(send_message))
}
