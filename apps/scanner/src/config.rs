use anyhow::{Context, Result};

/// Tokens that mark an API key as a copy-pasted placeholder rather than a real secret.
const PLACEHOLDER_TOKENS: &[&str] = &[
    "your-key-here",
    "your-openai-key-here",
    "your-perplexity-key-here",
    "replace-me",
    "changeme",
    "dummy",
    "test",
];

/// Application configuration loaded from environment variables.
///
/// Provider keys are optional: a key that is missing or still a placeholder is
/// stored as `None` and the provider is left out of the chain.
#[derive(Debug, Clone)]
pub struct Config {
    pub perplexity_api_key: Option<String>,
    pub openai_api_key: Option<String>,
    /// Endpoint overrides for gateways or self-hosted proxies.
    pub perplexity_endpoint: Option<String>,
    pub openai_endpoint: Option<String>,
    /// When set, analyses are kept in Redis instead of process memory.
    pub redis_url: Option<String>,
    pub analysis_ttl_secs: u64,
    pub max_upload_bytes: usize,
    /// Body limit for the bulk route, which carries up to a thousand files.
    pub max_bulk_upload_bytes: usize,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            perplexity_api_key: api_key_env("PPLX_API_KEY"),
            openai_api_key: api_key_env("OPENAI_API_KEY"),
            perplexity_endpoint: optional_env("PPLX_ENDPOINT"),
            openai_endpoint: optional_env("OPENAI_ENDPOINT"),
            redis_url: optional_env("REDIS_URL"),
            analysis_ttl_secs: parse_env("ANALYSIS_TTL_SECS", 86_400)
                .context("ANALYSIS_TTL_SECS must be a number of seconds")?,
            max_upload_bytes: parse_env("MAX_UPLOAD_BYTES", 10 * 1024 * 1024)
                .context("MAX_UPLOAD_BYTES must be a byte count")?,
            max_bulk_upload_bytes: parse_env("MAX_BULK_UPLOAD_BYTES", 200 * 1024 * 1024)
                .context("MAX_BULK_UPLOAD_BYTES must be a byte count")?,
            port: parse_env("PORT", 5000).context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("Invalid value '{raw}' for '{key}'")),
        Err(_) => Ok(default),
    }
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn api_key_env(key: &str) -> Option<String> {
    let cleaned = clean_env_key(&std::env::var(key).unwrap_or_default());
    is_real_api_key(&cleaned).then_some(cleaned)
}

/// Trims whitespace and any surrounding quotes left over from `.env` editing.
pub fn clean_env_key(value: &str) -> String {
    value
        .trim()
        .trim_matches(|c| c == '"' || c == '\'')
        .to_string()
}

pub fn is_real_api_key(value: &str) -> bool {
    if value.is_empty() {
        return false;
    }
    let lowered = value.to_lowercase();
    !PLACEHOLDER_TOKENS
        .iter()
        .any(|token| lowered.contains(token))
}
