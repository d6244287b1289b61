pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::export;
use crate::scan;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let upload_limit = state.config.max_upload_bytes;
    let bulk_upload_limit = state.config.max_bulk_upload_bytes;

    Router::new()
        .route("/health", get(health::health_handler))
        // Scan API
        .route(
            "/api/v1/scan",
            post(scan::handlers::handle_scan).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route(
            "/api/v1/analyses/:id",
            get(scan::handlers::handle_get_analysis),
        )
        // Bulk scan API
        .route(
            "/api/v1/bulk-scan",
            post(scan::handlers::handle_bulk_scan)
                .layer(DefaultBodyLimit::max(bulk_upload_limit)),
        )
        .route(
            "/api/v1/bulk-analyses/:id",
            get(scan::handlers::handle_get_bulk_analysis),
        )
        // Export API
        .route(
            "/api/v1/analyses/:id/export/pdf",
            get(export::handlers::handle_export_pdf),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
        Router,
    };
    use serde_json::Value;
    use tower::ServiceExt;
    use uuid::Uuid;

    use super::*;
    use crate::config::Config;
    use crate::llm_client::stub::{spawn_stub, BAD_REQUEST, CHAT_OK, CHAT_SCORED_JSON};
    use crate::llm_client::{LlmClient, Provider, ProviderKind};
    use crate::models::analysis::Analysis;
    use crate::scan::store::{AnalysisStore, InMemoryAnalysisStore};

    const BOUNDARY: &str = "scanner-test-boundary";

    fn test_config() -> Config {
        Config {
            perplexity_api_key: None,
            openai_api_key: None,
            perplexity_endpoint: None,
            openai_endpoint: None,
            redis_url: None,
            analysis_ttl_secs: 60,
            max_upload_bytes: 1024 * 1024,
            max_bulk_upload_bytes: 4 * 1024 * 1024,
            port: 0,
            rust_log: "info".to_string(),
        }
    }

    fn app_with(store: Arc<InMemoryAnalysisStore>) -> Router {
        app_with_llm(store, LlmClient::new(vec![]).unwrap())
    }

    fn app_with_llm(store: Arc<InMemoryAnalysisStore>, llm: LlmClient) -> Router {
        build_router(AppState {
            llm,
            store,
            config: test_config(),
        })
    }

    /// A single Perplexity provider served from a local endpoint.
    async fn stub_llm(status: StatusCode, body: &'static str) -> LlmClient {
        let (url, _) = spawn_stub(status, body).await;
        LlmClient::new(vec![Provider::with_endpoint(
            ProviderKind::Perplexity,
            "pplx-1".to_string(),
            url,
        )])
        .unwrap()
    }

    /// Parts are `(field name, optional file name, content)`.
    fn multipart_request(uri: &str, parts: &[(&str, Option<&str>, &str)]) -> Request<Body> {
        let mut body = String::new();
        for (name, file_name, content) in parts {
            body.push_str(&format!("--{BOUNDARY}\r\n"));
            match file_name {
                Some(file_name) => body.push_str(&format!(
                    "Content-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\n\
                     Content-Type: application/octet-stream\r\n\r\n"
                )),
                None => body.push_str(&format!(
                    "Content-Disposition: form-data; name=\"{name}\"\r\n\r\n"
                )),
            }
            body.push_str(content);
            body.push_str("\r\n");
        }
        body.push_str(&format!("--{BOUNDARY}--\r\n"));

        Request::post(uri)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    async fn stored_analysis(store: &InMemoryAnalysisStore) -> Analysis {
        let analysis = Analysis::new(
            "jane.txt".to_string(),
            "Jane Doe\nRust (async), Tokio".to_string(),
            "Senior Rust Engineer".to_string(),
            "Match score: 82".to_string(),
            ProviderKind::OpenAi,
        );
        store.put(&analysis).await.unwrap();
        analysis
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let app = app_with(Arc::new(InMemoryAnalysisStore::new()));
        let response = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["status"], "ok");
    }

    #[tokio::test]
    async fn test_get_analysis_by_id() {
        let store = Arc::new(InMemoryAnalysisStore::new());
        let analysis = stored_analysis(&store).await;
        let app = app_with(store);

        let response = app
            .oneshot(
                Request::get(format!("/api/v1/analyses/{}", analysis.id))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["analysis"], "Match score: 82");
        assert_eq!(body["provider"], "openai");
    }

    #[tokio::test]
    async fn test_get_unknown_analysis_is_404() {
        let app = app_with(Arc::new(InMemoryAnalysisStore::new()));
        let response = app
            .oneshot(
                Request::get(format!("/api/v1/analyses/{}", Uuid::new_v4()))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_export_pdf_returns_attachment() {
        let store = Arc::new(InMemoryAnalysisStore::new());
        let analysis = stored_analysis(&store).await;
        let app = app_with(store);

        let response = app
            .oneshot(
                Request::get(format!("/api/v1/analyses/{}/export/pdf", analysis.id))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "application/pdf"
        );
        let disposition = response.headers()[header::CONTENT_DISPOSITION]
            .to_str()
            .unwrap()
            .to_string();
        assert!(disposition.starts_with("attachment; filename=\"resume_analysis_"));
        assert!(disposition.ends_with(".pdf\""));

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let text = String::from_utf8_lossy(&bytes);
        assert!(text.starts_with("%PDF-1.4\n"));
        assert!(text.ends_with("%%EOF"));
        assert!(text.contains(r"(Rust \(async\), Tokio) Tj"));
    }

    #[tokio::test]
    async fn test_export_without_analysis_is_client_error() {
        let app = app_with(Arc::new(InMemoryAnalysisStore::new()));
        let response = app
            .oneshot(
                Request::get(format!("/api/v1/analyses/{}/export/pdf", Uuid::new_v4()))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["error"]["code"], "NO_ANALYSIS");
        assert_eq!(
            body["error"]["message"],
            "No analysis to export. Run a scan first."
        );
    }

    #[tokio::test]
    async fn test_scan_without_providers_is_not_configured() {
        let app = app_with(Arc::new(InMemoryAnalysisStore::new()));
        let response = app
            .oneshot(multipart_request(
                "/api/v1/scan",
                &[
                    ("job_description", None, "Senior Rust Engineer"),
                    ("resume", Some("cv.txt"), "Jane Doe"),
                ],
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json_body(response).await["error"]["code"], "NOT_CONFIGURED");
    }

    #[tokio::test]
    async fn test_scan_requires_resume_and_job_description() {
        let app = app_with_llm(
            Arc::new(InMemoryAnalysisStore::new()),
            stub_llm(StatusCode::OK, CHAT_OK).await,
        );
        let response = app
            .oneshot(multipart_request(
                "/api/v1/scan",
                &[
                    ("job_description", None, "   "),
                    ("resume", Some("cv.txt"), "Jane Doe"),
                ],
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
        assert_eq!(
            body["error"]["message"],
            "Resume file and job description are required."
        );
    }

    #[tokio::test]
    async fn test_scan_rejects_unreadable_resume() {
        let app = app_with_llm(
            Arc::new(InMemoryAnalysisStore::new()),
            stub_llm(StatusCode::OK, CHAT_OK).await,
        );
        let response = app
            .oneshot(multipart_request(
                "/api/v1/scan",
                &[
                    ("job_description", None, "Senior Rust Engineer"),
                    ("resume", Some("cv.docx"), "PK binary"),
                ],
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            json_body(response).await["error"]["message"],
            "Could not extract resume text. Use a readable PDF or TXT."
        );
    }

    #[tokio::test]
    async fn test_scan_stores_analysis_for_export() {
        let store = Arc::new(InMemoryAnalysisStore::new());
        let app = app_with_llm(store.clone(), stub_llm(StatusCode::OK, CHAT_OK).await);
        let response = app
            .oneshot(multipart_request(
                "/api/v1/scan",
                &[
                    ("resume", Some("jane.txt"), "Jane Doe\nRust, Tokio"),
                    ("job_description", None, "Senior Rust Engineer"),
                ],
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["analysis"], "Match score: 88");
        assert_eq!(body["provider"], "perplexity");

        let id: Uuid = body["analysis_id"].as_str().unwrap().parse().unwrap();
        let stored = store.get(id).await.unwrap().unwrap();
        assert_eq!(stored.resume_file_name, "jane.txt");
        assert_eq!(stored.resume_text, "Jane Doe\nRust, Tokio");
    }

    #[tokio::test]
    async fn test_scan_provider_bad_request_is_client_error() {
        let app = app_with_llm(
            Arc::new(InMemoryAnalysisStore::new()),
            stub_llm(StatusCode::BAD_REQUEST, BAD_REQUEST).await,
        );
        let response = app
            .oneshot(multipart_request(
                "/api/v1/scan",
                &[
                    ("resume", Some("jane.txt"), "Jane Doe"),
                    ("job_description", None, "Senior Rust Engineer"),
                ],
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["error"]["code"], "PROVIDER_REQUEST_ERROR");
        assert_eq!(
            body["error"]["message"],
            "Provider request error: Invalid model 'sonar-pro'"
        );
    }

    // ────────────────────────────────────────────────────────────────────────
    // Bulk scan
    // ────────────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_bulk_scan_ranks_and_reports_failures() {
        let store = Arc::new(InMemoryAnalysisStore::new());
        let app = app_with_llm(
            store.clone(),
            stub_llm(StatusCode::OK, CHAT_SCORED_JSON).await,
        );
        let response = app
            .clone()
            .oneshot(multipart_request(
                "/api/v1/bulk-scan",
                &[
                    ("job_description", None, "Senior Rust Engineer"),
                    ("resumes[]", Some("jane.txt"), "Jane Doe\nRust, Tokio"),
                    ("resumes[]", Some("notes.docx"), "PK binary"),
                ],
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["total_uploaded"], 2);
        assert_eq!(body["processed"], 1);
        assert_eq!(body["failed"], 1);
        assert_eq!(body["top_candidates"][0]["file_name"], "jane.txt");
        assert_eq!(body["results"][0]["match_score"], 91);
        assert_eq!(body["results"][0]["status"], "processed");
        assert_eq!(body["failures"][0]["file_name"], "notes.docx");
        assert_eq!(
            body["failures"][0]["error"],
            "Could not extract text (supported: PDF/TXT)."
        );

        let bulk_id = body["bulk_id"].as_str().unwrap().to_string();
        let response = app
            .oneshot(
                Request::get(format!("/api/v1/bulk-analyses/{bulk_id}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let fetched = json_body(response).await;
        assert_eq!(fetched["processed"], 1);
        assert_eq!(fetched["results"][0]["file_name"], "jane.txt");
    }

    #[tokio::test]
    async fn test_bulk_scan_validation_messages() {
        let llm = stub_llm(StatusCode::OK, CHAT_SCORED_JSON).await;
        let app = app_with_llm(Arc::new(InMemoryAnalysisStore::new()), llm);

        let cases: [(&[(&str, Option<&str>, &str)], &str); 2] = [
            (
                &[("resumes", Some("jane.txt"), "Jane Doe")],
                "Job description is required.",
            ),
            (
                &[("job_description", None, "Senior Rust Engineer")],
                "Please upload resume files.",
            ),
        ];
        for (parts, message) in cases {
            let response = app
                .clone()
                .oneshot(multipart_request("/api/v1/bulk-scan", parts))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
            assert_eq!(json_body(response).await["error"]["message"], message);
        }
    }

    #[tokio::test]
    async fn test_bulk_scan_rejects_more_than_a_thousand_files() {
        let llm = stub_llm(StatusCode::OK, CHAT_SCORED_JSON).await;
        let app = app_with_llm(Arc::new(InMemoryAnalysisStore::new()), llm);

        let mut parts = vec![("job_description", None, "Senior Rust Engineer")];
        parts.extend((0..1001).map(|_| ("resumes", Some("cv.txt"), "x")));
        let response = app
            .oneshot(multipart_request("/api/v1/bulk-scan", &parts))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            json_body(response).await["error"]["message"],
            "Company bulk mode supports 1 to 1000 resumes per run."
        );
    }

    #[tokio::test]
    async fn test_get_unknown_bulk_analysis_is_404() {
        let app = app_with(Arc::new(InMemoryAnalysisStore::new()));
        let response = app
            .oneshot(
                Request::get(format!("/api/v1/bulk-analyses/{}", Uuid::new_v4()))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
