//! Ollama client for the daemon's non-streaming generate endpoint.

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::config::OllamaSettings;
use service_core::error::AppError;

/// Fixed time limit for one generate round-trip. When the daemon does not
/// answer in time the request fails; there is no retry.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Error type for generate calls, one variant per failure class.
#[derive(Debug, Error)]
pub enum OllamaError {
    #[error("Cannot connect to Ollama: {0}")]
    Unreachable(#[source] reqwest::Error),

    #[error("Ollama error: {body}")]
    UpstreamStatus { status: StatusCode, body: String },

    #[error("Invalid response from Ollama: {0}")]
    InvalidResponse(#[source] serde_json::Error),
}

impl From<OllamaError> for AppError {
    fn from(err: OllamaError) -> Self {
        AppError::Upstream(anyhow::Error::new(err))
    }
}

/// Request body for `/api/generate`. `stream` stays false: the relay waits
/// for the full completion and hands it back in one piece.
#[derive(Debug, Serialize)]
struct GenerateRequest {
    model: String,
    prompt: String,
    stream: bool,
}

/// The daemon's reply. Only the completion text matters here; the rest of the
/// payload (timings, context, done flag) is ignored.
#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

pub struct OllamaClient {
    settings: OllamaSettings,
    client: Client,
}

impl OllamaClient {
    pub fn new(settings: OllamaSettings) -> Self {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("Failed to create HTTP client");

        Self { settings, client }
    }

    pub fn model(&self) -> &str {
        &self.settings.model
    }

    /// One non-streaming completion round-trip.
    pub async fn generate(&self, prompt: &str) -> Result<String, OllamaError> {
        let request = GenerateRequest {
            model: self.settings.model.clone(),
            prompt: prompt.to_string(),
            stream: false,
        };

        let url = format!("{}/api/generate", self.settings.url);
        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Error connecting to Ollama at {}: {}", url, e);
                OllamaError::Unreachable(e)
            })?;

        let status = response.status();
        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "Ollama returned an error status");
            return Err(OllamaError::UpstreamStatus { status, body });
        }

        // Read the whole body first so a decode failure can be logged with
        // the raw payload.
        let body = response.text().await.map_err(OllamaError::Unreachable)?;
        let reply: GenerateResponse = serde_json::from_str(&body).map_err(|e| {
            tracing::error!(body = %body, "Failed to parse Ollama response");
            OllamaError::InvalidResponse(e)
        })?;

        Ok(reply.response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upstream_status_error_carries_the_raw_body() {
        let err = OllamaError::UpstreamStatus {
            status: StatusCode::SERVICE_UNAVAILABLE,
            body: "busy".to_string(),
        };

        assert_eq!(err.to_string(), "Ollama error: busy");
        match err {
            OllamaError::UpstreamStatus { status, .. } => {
                assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE)
            }
            _ => unreachable!(),
        }
    }

    #[test]
    fn invalid_response_error_names_the_parse_failure() {
        let parse_err = serde_json::from_str::<GenerateResponse>("not json").unwrap_err();
        let err = OllamaError::InvalidResponse(parse_err);

        assert!(err.to_string().starts_with("Invalid response from Ollama:"));
    }

    #[test]
    fn generate_request_is_non_streaming() {
        let request = GenerateRequest {
            model: "codellama:7b".to_string(),
            prompt: "hi".to_string(),
            stream: false,
        };

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["model"], "codellama:7b");
        assert_eq!(value["prompt"], "hi");
        assert_eq!(value["stream"], false);
    }

    #[test]
    fn extra_upstream_fields_are_ignored() {
        let reply: GenerateResponse = serde_json::from_str(
            r#"{"model":"codellama:7b","response":"X","done":true,"total_duration":42}"#,
        )
        .unwrap();

        assert_eq!(reply.response, "X");
    }
}
