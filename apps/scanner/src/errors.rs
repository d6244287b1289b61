use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::export::pdf_writer::PdfError;
use crate::llm_client::LlmError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    /// Export requested before any scan produced an analysis for this id.
    #[error("No analysis to export")]
    NoAnalysis,

    #[error("No LLM provider configured")]
    NotConfigured,

    #[error("Invalid API key for every configured provider")]
    InvalidApiKey,

    /// The provider refused the request itself (HTTP 400), e.g. an unknown model.
    #[error("Provider request error: {0}")]
    ProviderRequest(String),

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("Export failed: {0}")]
    Export(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<LlmError> for AppError {
    fn from(e: LlmError) -> Self {
        match e {
            LlmError::Unauthorized { .. } => AppError::InvalidApiKey,
            LlmError::NoProviders => AppError::NotConfigured,
            LlmError::Api {
                status: 400,
                message,
            } => AppError::ProviderRequest(message),
            other => AppError::Llm(other.to_string()),
        }
    }
}

impl From<PdfError> for AppError {
    fn from(e: PdfError) -> Self {
        AppError::Export(e.to_string())
    }
}

impl From<redis::RedisError> for AppError {
    fn from(e: redis::RedisError) -> Self {
        AppError::Store(e.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::NoAnalysis => (
                StatusCode::BAD_REQUEST,
                "NO_ANALYSIS",
                "No analysis to export. Run a scan first.".to_string(),
            ),
            AppError::NotConfigured => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "NOT_CONFIGURED",
                "API key not configured. Add a valid PPLX_API_KEY or OPENAI_API_KEY in .env, then restart the service.".to_string(),
            ),
            AppError::InvalidApiKey => (
                StatusCode::UNAUTHORIZED,
                "INVALID_API_KEY",
                "Invalid API key (401). Update PPLX_API_KEY or OPENAI_API_KEY in .env and restart the service.".to_string(),
            ),
            AppError::ProviderRequest(msg) => {
                tracing::warn!("Provider rejected request: {msg}");
                (
                    StatusCode::BAD_REQUEST,
                    "PROVIDER_REQUEST_ERROR",
                    format!("Provider request error: {msg}"),
                )
            }
            AppError::Llm(msg) => {
                tracing::error!("LLM error: {msg}");
                (StatusCode::BAD_GATEWAY, "LLM_ERROR", msg.clone())
            }
            AppError::Export(msg) => {
                tracing::error!("Export error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "EXPORT_FAILED",
                    format!("Export failed: {msg}"),
                )
            }
            AppError::Store(msg) => {
                tracing::error!("Store error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "STORE_ERROR",
                    "A storage error occurred".to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_missing_analysis_is_client_error() {
        assert_eq!(status_of(AppError::NoAnalysis), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_export_failure_is_server_error() {
        assert_eq!(
            status_of(AppError::Export("boom".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_llm_failures_map_to_gateway_and_unauthorized() {
        assert_eq!(status_of(AppError::Llm("x".into())), StatusCode::BAD_GATEWAY);
        assert_eq!(status_of(AppError::InvalidApiKey), StatusCode::UNAUTHORIZED);
        assert_eq!(
            status_of(AppError::NotConfigured),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_unauthorized_llm_error_becomes_invalid_api_key() {
        let err: AppError = LlmError::Unauthorized {
            provider: "openai".to_string(),
        }
        .into();
        assert!(matches!(err, AppError::InvalidApiKey));

        let err: AppError = LlmError::EmptyContent.into();
        assert!(matches!(err, AppError::Llm(_)));

        let err: AppError = LlmError::NoProviders.into();
        assert!(matches!(err, AppError::NotConfigured));
    }

    #[test]
    fn test_provider_bad_request_is_client_error() {
        let err: AppError = LlmError::Api {
            status: 400,
            message: "Invalid model 'sonar-pro'".to_string(),
        }
        .into();
        assert!(matches!(&err, AppError::ProviderRequest(m) if m == "Invalid model 'sonar-pro'"));
        assert_eq!(status_of(err), StatusCode::BAD_REQUEST);

        let err: AppError = LlmError::Api {
            status: 404,
            message: "no such route".to_string(),
        }
        .into();
        assert_eq!(status_of(err), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_rate_limited_is_gateway_error() {
        let err: AppError = LlmError::RateLimited { retries: 3 }.into();
        assert!(matches!(&err, AppError::Llm(m) if m == "Rate limited after 3 retries"));
        assert_eq!(status_of(err), StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn test_error_body_shape() {
        let response = AppError::Validation("job_description is required".into()).into_response();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
        assert_eq!(body["error"]["message"], "job_description is required");
    }
}
