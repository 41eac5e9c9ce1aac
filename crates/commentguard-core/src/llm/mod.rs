//! LLM integration - Gemini and OpenRouter HTTP clients
//!
//! This module provides:
//! - `CompletionBackend`, the "send a prompt, get text back" seam the
//!   provider adapters are built on
//! - HTTP clients for Gemini `generateContent` and OpenRouter chat completions
//! - Request/response wire types for both APIs

mod gemini;
mod openrouter;
mod types;

use async_trait::async_trait;

use crate::error::{Error, Result};
use crate::providers::ProviderId;

pub use gemini::{GeminiClient, GeminiClientBuilder};
pub use openrouter::{OpenRouterClient, OpenRouterClientBuilder};
pub use types::{ChatRequest, ChatResponse, GeminiRequest, GeminiResponse, Message, MessageRole};

/// One prompt sent to a hosted model
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    /// Optional system instruction
    pub system: Option<String>,
    /// User prompt
    pub prompt: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl CompletionRequest {
    pub fn new(prompt: impl Into<String>, temperature: f32, max_tokens: u32) -> Self {
        Self {
            system: None,
            prompt: prompt.into(),
            temperature,
            max_tokens,
        }
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }
}

/// Transport that turns a prompt into model text
///
/// `Ok(None)` means the call succeeded but the model returned no text.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    async fn complete(&self, request: &CompletionRequest) -> Result<Option<String>>;
}

/// Map a non-success HTTP status to an error
pub(crate) fn status_error(
    provider: ProviderId,
    status: u16,
    retry_after: Option<u64>,
    body: &str,
) -> Error {
    match status {
        401 | 403 => Error::LLMError(format!(
            "{} rejected the API key ({}). Check the {} environment variable.",
            provider.display_name(),
            status,
            provider.api_key_env()
        )),
        429 => Error::RateLimited(
            retry_after
                .or_else(|| extract_retry_after(body))
                .unwrap_or(60),
        ),
        400 => Error::LLMError(format!("{} bad request: {}", provider.display_name(), body)),
        402 => Error::LLMError(format!(
            "{} payment required: insufficient credits",
            provider.display_name()
        )),
        404 => Error::LLMError(format!(
            "{} model not found or endpoint unavailable: {}",
            provider.display_name(),
            body
        )),
        500..=599 => Error::LLMError(format!(
            "{} server error ({}): {}",
            provider.display_name(),
            status,
            body
        )),
        _ => Error::LLMError(format!(
            "{} HTTP error {}: {}",
            provider.display_name(),
            status,
            body
        )),
    }
}

/// Read a `Retry-After` header given in seconds
pub(crate) fn retry_after_header(headers: &reqwest::header::HeaderMap) -> Option<u64> {
    headers
        .get(reqwest::header::RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse()
        .ok()
}

/// Extract retry-after value from an error body
fn extract_retry_after(body: &str) -> Option<u64> {
    let json = serde_json::from_str::<serde_json::Value>(body).ok()?;
    json.get("retry_after")
        .or_else(|| json.get("error")?.get("retry_after"))
        .and_then(serde_json::Value::as_u64)
}
