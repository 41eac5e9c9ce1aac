//! Gemini client
//!
//! Talks to `POST {base}/models/{model}:generateContent?key=...`.

use async_trait::async_trait;
use reqwest::Client as HttpClient;
use tracing::debug;

use crate::error::{Error, Result};
use crate::providers::ProviderId;

use super::types::{GeminiRequest, GeminiResponse};
use super::{CompletionBackend, CompletionRequest, retry_after_header, status_error};

/// Gemini generateContent client
#[derive(Clone)]
pub struct GeminiClient {
    http_client: HttpClient,
    api_key: String,
    base_url: String,
    model: String,
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish()
    }
}

/// Builder for creating a GeminiClient
#[derive(Default)]
pub struct GeminiClientBuilder {
    api_key: Option<String>,
    base_url: Option<String>,
    model: Option<String>,
}

impl GeminiClientBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn build(self) -> Result<GeminiClient> {
        let api_key = self
            .api_key
            .ok_or_else(|| Error::ConfigError("Gemini API key is required".to_string()))?;

        let http_client = HttpClient::builder().build().map_err(Error::NetworkError)?;

        let base_url = self
            .base_url
            .unwrap_or_else(|| ProviderId::Gemini.default_base_url().to_string());

        Ok(GeminiClient {
            http_client,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: self
                .model
                .unwrap_or_else(|| ProviderId::Gemini.default_model().to_string()),
        })
    }
}

impl GeminiClient {
    pub fn builder() -> GeminiClientBuilder {
        GeminiClientBuilder::new()
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Send a generateContent request and return the first candidate's text
    pub async fn generate(&self, request: &GeminiRequest) -> Result<Option<String>> {
        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);

        debug!(
            model = %self.model,
            contents = request.contents.len(),
            "Sending generateContent request"
        );

        // The key travels in the query string; strip URLs from transport
        // errors so it never reaches logs.
        let response = self
            .http_client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(request)
            .send()
            .await
            .map_err(|e| Error::NetworkError(e.without_url()))?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = retry_after_header(response.headers());
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(
                ProviderId::Gemini,
                status.as_u16(),
                retry_after,
                &body,
            ));
        }

        let gemini_response: GeminiResponse = response.json().await.map_err(|e| {
            Error::malformed(
                ProviderId::Gemini,
                format!("failed to decode generateContent response: {}", e.without_url()),
            )
        })?;

        if let Some(reason) = gemini_response
            .candidates
            .first()
            .and_then(|c| c.finish_reason.as_deref())
        {
            debug!(finish_reason = reason, "generateContent finished");
        }

        Ok(gemini_response.into_text())
    }
}

#[async_trait]
impl CompletionBackend for GeminiClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<Option<String>> {
        // generateContent gets a single user turn; any system text leads it
        let prompt = match &request.system {
            Some(system) => format!("{}\n\n{}", system, request.prompt),
            None => request.prompt.clone(),
        };
        let body = GeminiRequest::from_prompt(prompt)
            .with_generation_config(request.temperature, request.max_tokens);

        self.generate(&body).await
    }
}
