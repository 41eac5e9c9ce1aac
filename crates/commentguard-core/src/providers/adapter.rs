//! Provider adapter
//!
//! Wraps one completion backend with a provider's prompts, sampling
//! parameters, deadlines and normalization rules.

use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, info};

use crate::config::ProviderConfig;
use crate::error::{Error, Result};
use crate::llm::{CompletionBackend, CompletionRequest, GeminiClient, OpenRouterClient};
use crate::sentiment::prompts::{
    ANALYSIS_SYSTEM_PROMPT, RESPONSE_SYSTEM_PROMPT, response_prompt, sentiment_prompt,
};
use crate::sentiment::{ResponseTone, SentimentResult, parse_sentiment};

use super::{ProviderId, SentimentProvider};

/// A hosted model behind the `SentimentProvider` contract
pub struct ProviderAdapter {
    id: ProviderId,
    config: ProviderConfig,
    backend: Option<Box<dyn CompletionBackend>>,
}

impl std::fmt::Debug for ProviderAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderAdapter")
            .field("id", &self.id)
            .field("model", &self.config.model_or_default(self.id))
            .field("initialized", &self.backend.is_some())
            .finish()
    }
}

impl ProviderAdapter {
    /// Create an uninitialized adapter
    pub fn new(id: ProviderId, config: ProviderConfig) -> Self {
        Self {
            id,
            config,
            backend: None,
        }
    }

    /// Create an adapter that is already initialized around `backend`
    pub fn with_backend(
        id: ProviderId,
        config: ProviderConfig,
        backend: impl CompletionBackend + 'static,
    ) -> Self {
        Self {
            id,
            config,
            backend: Some(Box::new(backend)),
        }
    }

    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    fn backend(&self) -> Result<&dyn CompletionBackend> {
        self.backend
            .as_deref()
            .ok_or(Error::NotInitialized(self.id))
    }

    /// Only the OpenRouter chat API gets system messages
    fn uses_system_prompt(&self) -> bool {
        matches!(self.id, ProviderId::OpenRouter)
    }

    fn build_client(&self, api_key: &str) -> Result<Box<dyn CompletionBackend>> {
        let model = self.config.model_or_default(self.id);
        let base_url = self.config.base_url_or_default(self.id);

        let backend: Box<dyn CompletionBackend> = match self.id {
            ProviderId::Gemini => Box::new(
                GeminiClient::builder()
                    .api_key(api_key)
                    .base_url(base_url)
                    .model(model)
                    .build()?,
            ),
            ProviderId::OpenRouter => Box::new(
                OpenRouterClient::builder()
                    .api_key(api_key)
                    .base_url(base_url)
                    .model(model)
                    .build()?,
            ),
        };
        Ok(backend)
    }

    /// Run one request under a deadline
    ///
    /// Dropping the timed-out future cancels the in-flight HTTP call.
    async fn complete_within(
        &self,
        request: &CompletionRequest,
        timeout_secs: u64,
    ) -> Result<String> {
        let backend = self.backend()?;

        let reply = tokio::time::timeout(
            Duration::from_secs(timeout_secs),
            backend.complete(request),
        )
        .await
        .map_err(|_| Error::Timeout {
            provider: self.id,
            secs: timeout_secs,
        })??;

        reply.ok_or(Error::EmptyResponse(self.id))
    }
}

fn require_text(text: &str) -> Result<()> {
    if text.trim().is_empty() {
        return Err(Error::InvalidInput("comment text is empty".to_string()));
    }
    Ok(())
}

/// Reject keys that cannot travel as an HTTP header or query value
fn validate_api_key(id: ProviderId, api_key: &str) -> Result<()> {
    if api_key.trim().is_empty() {
        return Err(Error::ConfigError(format!(
            "{} API key is empty",
            id.display_name()
        )));
    }
    if !api_key.chars().all(|c| c.is_ascii_graphic()) {
        return Err(Error::ConfigError(format!(
            "{} API key contains whitespace or non-printable characters",
            id.display_name()
        )));
    }
    Ok(())
}

#[async_trait]
impl SentimentProvider for ProviderAdapter {
    fn id(&self) -> ProviderId {
        self.id
    }

    fn initialize(&mut self, api_key: &str) -> Result<()> {
        if self.backend.is_some() {
            return Err(Error::ConfigError(format!(
                "{} is already initialized",
                self.id.display_name()
            )));
        }
        validate_api_key(self.id, api_key)?;

        self.backend = Some(self.build_client(api_key)?);
        debug!(provider = %self.id, "Provider initialized");
        Ok(())
    }

    fn is_initialized(&self) -> bool {
        self.backend.is_some()
    }

    async fn analyze_sentiment(&self, text: &str) -> Result<SentimentResult> {
        self.backend()?;
        require_text(text)?;

        let shape = self.id.payload_shape();
        let mut request = CompletionRequest::new(
            sentiment_prompt(text, shape),
            self.config.analysis_temperature,
            self.config.analysis_max_tokens,
        );
        if self.uses_system_prompt() {
            request = request.with_system(ANALYSIS_SYSTEM_PROMPT);
        }

        debug!(provider = %self.id, chars = text.len(), "Requesting sentiment analysis");

        let reply = self
            .complete_within(&request, self.config.analysis_timeout_secs)
            .await?;
        if reply.trim().is_empty() {
            return Err(Error::EmptyResponse(self.id));
        }

        debug!(provider = %self.id, reply_chars = reply.len(), "Received analysis reply");

        let result =
            parse_sentiment(&reply, shape).map_err(|reason| Error::malformed(self.id, reason))?;

        info!(
            provider = %self.id,
            label = %result.label(),
            score = result.score(),
            human_review = result.requires_human_review(),
            "Sentiment analysis complete"
        );
        Ok(result)
    }

    async fn generate_response(&self, text: &str, tone: ResponseTone) -> Result<String> {
        self.backend()?;
        require_text(text)?;

        let system = self.uses_system_prompt();
        let mut request = CompletionRequest::new(
            response_prompt(text, tone, !system),
            self.config.response_temperature,
            self.config.response_max_tokens,
        );
        if system {
            request = request.with_system(RESPONSE_SYSTEM_PROMPT);
        }

        debug!(provider = %self.id, tone = %tone, "Requesting custom response");

        let reply = self
            .complete_within(&request, self.config.response_timeout_secs)
            .await?;
        let reply = reply.trim();
        if reply.is_empty() {
            return Err(Error::EmptyResponse(self.id));
        }

        Ok(reply.to_string())
    }
}
