//! Local stand-in for a provider endpoint, used by tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::{http::StatusCode, routing::post, Router};

pub const CHAT_OK: &str =
    r#"{"choices": [{"index": 0, "message": {"role": "assistant", "content": "Match score: 88"}}]}"#;

pub const CHAT_EMPTY: &str = r#"{"choices": [{"message": {"role": "assistant", "content": "  "}}]}"#;

pub const CHAT_SCORED_JSON: &str = r#"{"choices": [{"message": {"role": "assistant", "content": "{\"match_score\": 91, \"strengths\": [\"Tokio\", \"axum\", \"Redis\"], \"missing_keywords\": [\"Kubernetes\"], \"improvement_suggestions\": [\"Quantify impact\"], \"summary\": \"Strong async Rust fit.\"}"}}]}"#;

pub const RESPONSES_OK: &str = r#"{
    "id": "resp_1",
    "output": [{"type": "message", "role": "assistant", "content": [
        {"type": "output_text", "text": "Match score: 74", "annotations": []}
    ]}]
}"#;

pub const RESPONSES_EMPTY: &str = r#"{"id": "resp_2", "output": []}"#;

pub const UNAUTHORIZED: &str = r#"{"error": {"message": "Invalid API key provided"}}"#;

pub const BAD_REQUEST: &str = r#"{"error": {"message": "Invalid model 'sonar-pro'"}}"#;

/// Serves `status` + `body` for every POST to `/` on an ephemeral port.
/// Returns the endpoint URL and a counter of requests received.
pub async fn spawn_stub(status: StatusCode, body: &'static str) -> (String, Arc<AtomicUsize>) {
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = hits.clone();
    let app = Router::new().route(
        "/",
        post(move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                (status, body)
            }
        }),
    );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    (format!("http://{addr}/"), hits)
}
