use axum::{extract::State, http::Uri, response::IntoResponse, Json};
use serde_json::json;

use crate::startup::AppState;

/// Greeting for any path the router does not otherwise claim. The hostname is
/// resolved once at boot and carried in the state.
pub async fn greeting(State(state): State<AppState>, uri: Uri) -> impl IntoResponse {
    Json(json!({
        "message": "Hello from the homelab!",
        "hostname": state.hostname,
        "path": uri.path(),
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

pub async fn health_check() -> &'static str {
    "OK"
}
