use axum::{http::StatusCode, routing::post, Json, Router};
use chat_relay::config::RelayConfig;
use chat_relay::startup::Application;
use serde_json::{json, Value};
use std::time::Duration;
use tokio::net::TcpListener;

pub struct TestApp {
    pub address: String,
}

impl TestApp {
    /// Spawn the relay on a random port, pointed at the given upstream.
    pub async fn spawn(ollama_url: &str) -> Self {
        let mut config = RelayConfig::load().expect("Failed to load configuration");
        config.common.port = 0; // Random port for testing
        config.ollama.url = ollama_url.to_string();

        let app = Application::build(config)
            .await
            .expect("Failed to build test application");
        let port = app.port();

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        let address = format!("http://127.0.0.1:{}", port);

        // Wait for the server to accept requests by polling the health endpoint
        let client = reqwest::Client::new();
        let health_url = format!("{}/health", address);
        for _ in 0..50 {
            if client.get(&health_url).send().await.is_ok() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }

        TestApp { address }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }
}

/// Stand-in inference daemon answering `/api/generate` with a canned reply.
#[allow(dead_code)]
pub async fn spawn_mock_ollama(status: StatusCode, body: &'static str) -> String {
    let app = Router::new().route("/api/generate", post(move || async move { (status, body) }));

    serve_mock(app).await
}

/// Stand-in daemon that checks the relay's outbound request shape before
/// echoing the prompt back.
#[allow(dead_code)]
pub async fn spawn_echo_ollama() -> String {
    async fn echo(Json(request): Json<Value>) -> (StatusCode, Json<Value>) {
        if request["stream"] != json!(false) {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({"error": "expected a non-streaming request"})),
            );
        }
        let model = request["model"].as_str().unwrap_or_default();
        if model.is_empty() {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({"error": "expected a model identifier"})),
            );
        }

        let prompt = request["prompt"].as_str().unwrap_or_default();
        (
            StatusCode::OK,
            Json(json!({
                "model": model,
                "response": format!("echo: {}", prompt),
                "done": true,
            })),
        )
    }

    let app = Router::new().route("/api/generate", post(echo));

    serve_mock(app).await
}

async fn serve_mock(app: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind mock listener");
    let address = format!("http://{}", listener.local_addr().unwrap());

    tokio::spawn(async move {
        axum::serve(listener, app).await.ok();
    });

    address
}
