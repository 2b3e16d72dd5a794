use askama::Template;
use axum::{
    extract::{rejection::JsonRejection, State},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::startup::AppState;
use service_core::error::AppError;

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub prompt: String,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub response: String,
}

#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {}

pub async fn index() -> impl IntoResponse {
    IndexTemplate {}
}

pub async fn health_check() -> &'static str {
    "OK"
}

/// Relay one prompt to the inference daemon and hand its reply back.
#[tracing::instrument(skip(state, payload))]
pub async fn chat(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, AppError> {
    // Surface the parser's own message so the caller can see what was wrong
    // with the body.
    let Json(request) =
        payload.map_err(|e| AppError::BadRequest(anyhow::anyhow!(e.body_text())))?;

    let response = state.ollama.generate(&request.prompt).await?;

    Ok(Json(ChatResponse { response }))
}
