//! Wire shapes for the two supported providers.
//!
//! Perplexity speaks the OpenAI chat-completions dialect; OpenAI itself is called
//! through its Responses API, whose answer is spread over `output[].content[]`.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::LlmError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Perplexity,
    #[serde(rename = "openai")]
    OpenAi,
}

impl ProviderKind {
    pub fn model(self) -> &'static str {
        match self {
            ProviderKind::Perplexity => "sonar-pro",
            ProviderKind::OpenAi => "gpt-4.1-mini",
        }
    }

    pub fn endpoint(self) -> &'static str {
        match self {
            ProviderKind::Perplexity => "https://api.perplexity.ai/chat/completions",
            ProviderKind::OpenAi => "https://api.openai.com/v1/responses",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ProviderKind::Perplexity => "perplexity",
            ProviderKind::OpenAi => "openai",
        })
    }
}

/// A provider plus the key and URL used to call it.
#[derive(Clone)]
pub struct Provider {
    pub kind: ProviderKind,
    pub api_key: String,
    /// Defaults to `ProviderKind::endpoint()`; overridable for proxies and gateways.
    pub endpoint: String,
}

impl Provider {
    pub fn new(kind: ProviderKind, api_key: String) -> Self {
        Self::with_endpoint(kind, api_key, kind.endpoint().to_string())
    }

    pub fn with_endpoint(kind: ProviderKind, api_key: String, endpoint: String) -> Self {
        Self {
            kind,
            api_key,
            endpoint,
        }
    }
}

// Keys stay out of logs.
impl fmt::Debug for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Provider")
            .field("kind", &self.kind)
            .field("endpoint", &self.endpoint)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Requests
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
pub struct ResponsesRequest<'a> {
    model: &'a str,
    input: &'a str,
}

pub fn chat_request<'a>(model: &'a str, system: &'a str, prompt: &'a str) -> ChatRequest<'a> {
    ChatRequest {
        model,
        messages: vec![
            ChatMessage {
                role: "system",
                content: system,
            },
            ChatMessage {
                role: "user",
                content: prompt,
            },
        ],
    }
}

pub fn responses_request<'a>(model: &'a str, prompt: &'a str) -> ResponsesRequest<'a> {
    ResponsesRequest {
        model,
        input: prompt,
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Responses
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResponsesResponse {
    #[serde(default)]
    output: Vec<OutputItem>,
}

#[derive(Debug, Deserialize)]
struct OutputItem {
    #[serde(default)]
    content: Vec<OutputContent>,
}

#[derive(Debug, Deserialize)]
struct OutputContent {
    #[serde(rename = "type")]
    content_type: String,
    text: Option<String>,
}

/// Pulls the answer text out of a provider's success body.
/// Missing content yields an empty string; the caller decides whether that is an error.
pub fn parse_completion_text(kind: ProviderKind, body: &str) -> Result<String, LlmError> {
    match kind {
        ProviderKind::Perplexity => {
            let response: ChatResponse = serde_json::from_str(body)?;
            Ok(response
                .choices
                .into_iter()
                .next()
                .and_then(|c| c.message.content)
                .unwrap_or_default())
        }
        ProviderKind::OpenAi => {
            let response: ResponsesResponse = serde_json::from_str(body)?;
            Ok(response
                .output
                .into_iter()
                .flat_map(|item| item.content)
                .filter(|c| c.content_type == "output_text")
                .filter_map(|c| c.text)
                .collect())
        }
    }
}
