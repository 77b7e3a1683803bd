//! Throwaway RAG backend for integration tests.
//!
//! Serves the same routes as the real backend under `/api` and records every
//! request it receives. Search behaviour is keyed off the query text:
//!
//! | Query | Response |
//! |-------|----------|
//! | `broken` | 500 `{"detail": "index unavailable"}` |
//! | `plain500` | 500 with a non-JSON body |
//! | `partial` | 200 without `answer` |
//! | `noisy` | 200 with extra top-level fields |
//! | `delay <ms> <label>` | 200 after sleeping `<ms>` milliseconds |
//! | anything else | 200 echoing the query and model |
//!
//! Model switches to `llama-3.2-3b` fail with 400; switches to a model whose
//! name contains `slow` answer after 300 ms.

#![allow(dead_code)]

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use rag_console::client::ApiClient;
use rag_console::config::Config;

/// One request as seen by the mock backend.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: String,
    pub path: String,
    pub auth: Option<String>,
    pub content_type: Option<String>,
    pub body: Value,
}

#[derive(Clone)]
pub struct MockBackend {
    pub calls: Arc<Mutex<Vec<Recorded>>>,
    pub stats: Arc<Mutex<Value>>,
}

impl MockBackend {
    fn new() -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            stats: Arc::new(Mutex::new(json!({
                "total_documents": 2,
                "total_chunks": 17,
                "sources": [
                    {
                        "url": "https://example.com/guide",
                        "title": "Guide",
                        "chunk_count": 12,
                        "added_at": "2024-11-17T09:30:00"
                    },
                    {
                        "url": "https://example.com/faq",
                        "title": "FAQ",
                        "chunk_count": 5,
                        "added_at": "2024-11-17T10:00:00Z"
                    }
                ]
            }))),
        }
    }

    pub fn calls(&self) -> Vec<Recorded> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_to(&self, path: &str) -> Vec<Recorded> {
        self.calls()
            .into_iter()
            .filter(|c| c.path == path)
            .collect()
    }

    pub fn set_stats(&self, payload: Value) {
        *self.stats.lock().unwrap() = payload;
    }

    fn record(&self, method: &str, path: &str, headers: &HeaderMap, body: Value) {
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        self.calls.lock().unwrap().push(Recorded {
            method: method.to_string(),
            path: path.to_string(),
            auth: header("authorization"),
            content_type: header("content-type"),
            body,
        });
    }
}

/// Start the mock backend on a free local port.
///
/// Returns the backend handle and its base URL (including `/api`).
pub async fn start_backend() -> (MockBackend, String) {
    let backend = MockBackend::new();

    let app = Router::new()
        .route("/api/documents/add", post(handle_add))
        .route("/api/search", post(handle_search))
        .route("/api/stats", get(handle_stats))
        .route("/api/health", get(handle_health))
        .route("/api/model/switch", post(handle_switch))
        .with_state(backend.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.ok();
    });

    (backend, format!("http://{}/api", addr))
}

/// A base URL nothing is listening on.
pub fn dead_base_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{}/api", port)
}

pub fn test_config(base_url: &str, timeout_secs: u64) -> Config {
    let mut cfg = Config::minimal();
    cfg.backend.base_url = base_url.to_string();
    cfg.backend.timeout_secs = timeout_secs;
    cfg.models.offered = vec![
        "llama-3.2-1b".to_string(),
        "llama-3.2-3b".to_string(),
        "llama-slow".to_string(),
    ];
    cfg
}

pub fn test_client(base_url: &str) -> ApiClient {
    ApiClient::from_config(&test_config(base_url, 5)).unwrap()
}

// ─── Handlers ───────────────────────────────────────────────────────

async fn handle_add(
    State(backend): State<MockBackend>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    backend.record("POST", "/documents/add", &headers, body.clone());

    let url = body["url"].as_str().unwrap_or_default().to_string();
    if url.contains("slow") {
        tokio::time::sleep(Duration::from_secs(3)).await;
    }
    if url.contains("unreachable") {
        return Json(json!({
            "status": "failure",
            "message": "Failed to add URL content",
            "url": url,
        }))
        .into_response();
    }

    Json(json!({
        "status": "success",
        "message": "Content added successfully",
        "url": url,
    }))
    .into_response()
}

async fn handle_search(
    State(backend): State<MockBackend>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    backend.record("POST", "/search", &headers, body.clone());

    let query = body["query"].as_str().unwrap_or_default().to_string();
    let model = body["model_type"].as_str().unwrap_or("default").to_string();

    match query.as_str() {
        "broken" => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"detail": "index unavailable"})),
        )
            .into_response(),
        "plain500" => (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response(),
        "partial" => Json(json!({"sources": []})).into_response(),
        "noisy" => Json(json!({
            "answer": "clean answer",
            "sources": [{"content": "chunk one", "metadata": {"source": "https://example.com/guide"}}],
            "debug": {"latency_ms": 41},
            "model_type": model,
        }))
        .into_response(),
        q if q.starts_with("delay ") => {
            let mut parts = q.splitn(3, ' ').skip(1);
            let ms: u64 = parts.next().and_then(|p| p.parse().ok()).unwrap_or(0);
            let label = parts.next().unwrap_or_default().to_string();
            tokio::time::sleep(Duration::from_millis(ms)).await;
            Json(json!({"answer": format!("answer to {}", label), "sources": []})).into_response()
        }
        _ => Json(json!({
            "answer": format!("{} (via {})", query, model),
            "sources": [{"content": "some retrieved text"}],
        }))
        .into_response(),
    }
}

async fn handle_stats(State(backend): State<MockBackend>, headers: HeaderMap) -> Response {
    backend.record("GET", "/stats", &headers, Value::Null);
    let payload = backend.stats.lock().unwrap().clone();
    Json(payload).into_response()
}

async fn handle_health(State(backend): State<MockBackend>, headers: HeaderMap) -> Response {
    backend.record("GET", "/health", &headers, Value::Null);
    Json(json!({"status": "healthy", "timestamp": "2024-11-17T09:30:00Z"})).into_response()
}

async fn handle_switch(
    State(backend): State<MockBackend>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    backend.record("POST", "/model/switch", &headers, body.clone());

    let model = body["model_type"].as_str().unwrap_or_default().to_string();
    if model.contains("slow") {
        tokio::time::sleep(Duration::from_millis(300)).await;
    }
    if model == "llama-3.2-3b" {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"detail": "model not available"})),
        )
            .into_response();
    }
    Json(json!({"message": format!("switched to {}", model), "model_type": model})).into_response()
}
