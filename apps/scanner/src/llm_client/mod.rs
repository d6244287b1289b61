/// LLM Client — the single point of entry for every model call in the scanner.
///
/// Holds an ordered provider chain built from configuration. A scan walks the
/// chain: an authentication failure moves on to the next provider, the first
/// non-empty answer wins, and any other failure ends the scan. Bulk scans use
/// `first_answer`, which is more forgiving and keeps walking the chain on errors.
use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::Config;

pub mod providers;
#[cfg(test)]
pub mod stub;

pub use providers::{Provider, ProviderKind};

const MAX_RETRIES: u32 = 3;
const REQUEST_TIMEOUT_SECS: u64 = 120;
const RETRY_BASE_MS: u64 = 1000;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Authentication failed for provider '{provider}'")]
    Unauthorized { provider: String },

    #[error("Rate limited after {retries} retries")]
    RateLimited { retries: u32 },

    #[error("Model returned an empty response. Please try again.")]
    EmptyContent,

    #[error("No LLM provider configured")]
    NoProviders,
}

#[derive(Debug, Deserialize)]
struct ProviderErrorEnvelope {
    error: ProviderErrorBody,
}

#[derive(Debug, Deserialize)]
struct ProviderErrorBody {
    message: String,
}

/// Text returned by whichever provider answered first.
#[derive(Debug, Clone)]
pub struct Completion {
    pub text: String,
    pub provider: ProviderKind,
}

#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    providers: Vec<Provider>,
    retry_base: Duration,
}

impl LlmClient {
    pub fn new(providers: Vec<Provider>) -> Result<Self, LlmError> {
        let builder = Client::builder().timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS));
        // Tests talk to stubs on 127.0.0.1; keep them off any ambient proxy.
        #[cfg(test)]
        let builder = builder.no_proxy();

        Ok(Self {
            client: builder.build()?,
            providers,
            retry_base: Duration::from_millis(RETRY_BASE_MS),
        })
    }

    #[cfg(test)]
    pub fn with_retry_base(mut self, retry_base: Duration) -> Self {
        self.retry_base = retry_base;
        self
    }

    /// Builds the chain from configured keys: Perplexity first, then OpenAI.
    pub fn from_config(config: &Config) -> Result<Self, LlmError> {
        let configured = [
            (
                ProviderKind::Perplexity,
                &config.perplexity_api_key,
                &config.perplexity_endpoint,
            ),
            (
                ProviderKind::OpenAi,
                &config.openai_api_key,
                &config.openai_endpoint,
            ),
        ];
        let providers = configured
            .into_iter()
            .filter_map(|(kind, key, endpoint)| {
                let key = key.clone()?;
                Some(match endpoint {
                    Some(url) => Provider::with_endpoint(kind, key, url.clone()),
                    None => Provider::new(kind, key),
                })
            })
            .collect();
        Self::new(providers)
    }

    pub fn providers(&self) -> &[Provider] {
        &self.providers
    }

    pub fn has_providers(&self) -> bool {
        !self.providers.is_empty()
    }

    /// Runs `prompt` against the provider chain.
    pub async fn analyze(&self, prompt: &str, system: &str) -> Result<Completion, LlmError> {
        if self.providers.is_empty() {
            return Err(LlmError::NoProviders);
        }

        let mut auth_failures = 0;
        for provider in &self.providers {
            match self.complete(provider, prompt, system).await {
                Ok(text) if !text.trim().is_empty() => {
                    info!("{} answered ({} chars)", provider.kind, text.len());
                    return Ok(Completion {
                        text: text.trim().to_string(),
                        provider: provider.kind,
                    });
                }
                Ok(_) => warn!("{} returned an empty response", provider.kind),
                Err(LlmError::Unauthorized { provider: name }) => {
                    warn!("{name} rejected its API key, trying next provider");
                    auth_failures += 1;
                }
                Err(e) => return Err(e),
            }
        }

        if auth_failures == self.providers.len() {
            return Err(LlmError::Unauthorized {
                provider: "all".to_string(),
            });
        }
        Err(LlmError::EmptyContent)
    }

    /// Runs `prompt` with bulk-scan semantics: the first provider that answers wins
    /// even if the answer is empty, and failures other than a rejected key are
    /// remembered while the next provider is tried.
    pub async fn first_answer(&self, prompt: &str, system: &str) -> Result<Completion, LlmError> {
        if self.providers.is_empty() {
            return Err(LlmError::NoProviders);
        }

        let mut auth_failures = 0;
        let mut last_error = None;
        for provider in &self.providers {
            match self.complete(provider, prompt, system).await {
                Ok(text) => {
                    return Ok(Completion {
                        text: text.trim().to_string(),
                        provider: provider.kind,
                    })
                }
                Err(LlmError::Unauthorized { provider: name }) => {
                    warn!("{name} rejected its API key, trying next provider");
                    auth_failures += 1;
                }
                Err(e) => {
                    warn!("{} failed: {e}, trying next provider", provider.kind);
                    last_error = Some(e);
                }
            }
        }

        if auth_failures == self.providers.len() {
            return Err(LlmError::Unauthorized {
                provider: "all".to_string(),
            });
        }
        Err(last_error.unwrap_or(LlmError::EmptyContent))
    }

    /// Makes one completion call against a single provider.
    async fn complete(
        &self,
        provider: &Provider,
        prompt: &str,
        system: &str,
    ) -> Result<String, LlmError> {
        let body = match provider.kind {
            ProviderKind::Perplexity => {
                let request = providers::chat_request(provider.kind.model(), system, prompt);
                self.send_with_retry(provider, &request).await?
            }
            ProviderKind::OpenAi => {
                let request = providers::responses_request(provider.kind.model(), prompt);
                self.send_with_retry(provider, &request).await?
            }
        };
        providers::parse_completion_text(provider.kind, &body)
    }

    /// POSTs `request` to the provider endpoint and returns the raw success body.
    /// Retries on 429 (rate limit) and 5xx errors with exponential backoff.
    async fn send_with_retry<B: Serialize>(
        &self,
        provider: &Provider,
        request: &B,
    ) -> Result<String, LlmError> {
        let mut last_error: Option<LlmError> = None;

        for attempt in 0..MAX_RETRIES {
            if attempt > 0 {
                // Exponential backoff: 1s, 2s
                let delay = self.retry_base * (1 << (attempt - 1));
                warn!(
                    "{} call attempt {} failed, retrying after {}ms...",
                    provider.kind,
                    attempt,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            let response = self
                .client
                .post(&provider.endpoint)
                .bearer_auth(&provider.api_key)
                .json(request)
                .send()
                .await;

            let response = match response {
                Ok(r) => r,
                Err(e) => {
                    last_error = Some(LlmError::Http(e));
                    continue;
                }
            };

            let status = response.status();

            if status.as_u16() == 401 {
                return Err(LlmError::Unauthorized {
                    provider: provider.kind.to_string(),
                });
            }

            if status.as_u16() == 429 || status.is_server_error() {
                let body = response.text().await.unwrap_or_default();
                warn!("{} returned {}: {}", provider.kind, status, body);
                last_error = Some(LlmError::Api {
                    status: status.as_u16(),
                    message: body,
                });
                continue;
            }

            let body = response.text().await?;

            if !status.is_success() {
                let message = serde_json::from_str::<ProviderErrorEnvelope>(&body)
                    .map(|e| e.error.message)
                    .unwrap_or(body);
                return Err(LlmError::Api {
                    status: status.as_u16(),
                    message,
                });
            }

            debug!("{} call succeeded ({} bytes)", provider.kind, body.len());
            return Ok(body);
        }

        match last_error {
            Some(LlmError::Api { status: 429, .. }) | None => Err(LlmError::RateLimited {
                retries: MAX_RETRIES,
            }),
            Some(e) => Err(e),
        }
    }
}
