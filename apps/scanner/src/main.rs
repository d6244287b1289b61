mod config;
mod errors;
mod export;
mod llm_client;
mod models;
mod routes;
mod scan;
mod state;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::llm_client::LlmClient;
use crate::routes::build_router;
use crate::scan::store::{AnalysisStore, InMemoryAnalysisStore, RedisAnalysisStore};
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Resume Scanner v{}", env!("CARGO_PKG_VERSION"));

    // Initialize LLM provider chain
    let llm = LlmClient::from_config(&config)?;
    if llm.has_providers() {
        let names: Vec<String> = llm.providers().iter().map(|p| p.kind.to_string()).collect();
        info!("LLM providers: {}", names.join(", "));
    } else {
        warn!("No usable PPLX_API_KEY or OPENAI_API_KEY; scans will be rejected");
    }

    // Initialize analysis store
    let store: Arc<dyn AnalysisStore> = match &config.redis_url {
        Some(url) => {
            let client = redis::Client::open(url.as_str())?;
            info!("Analysis store: redis (ttl {}s)", config.analysis_ttl_secs);
            Arc::new(RedisAnalysisStore::new(client, config.analysis_ttl_secs))
        }
        None => {
            info!("Analysis store: in-memory");
            Arc::new(InMemoryAnalysisStore::new())
        }
    };

    let state = AppState {
        llm,
        store,
        config: config.clone(),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins once the UI has a fixed host

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
