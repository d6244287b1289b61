use std::sync::Arc;

use crate::config::Config;
use crate::llm_client::LlmClient;
use crate::scan::store::AnalysisStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub llm: LlmClient,
    /// Pluggable analysis store. In-memory by default, Redis when REDIS_URL is set.
    pub store: Arc<dyn AnalysisStore>,
    pub config: Config,
}
