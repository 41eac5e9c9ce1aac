//! OpenRouter client
//!
//! Async HTTP client for OpenRouter's OpenAI-compatible chat completions
//! endpoint. One attempt per call; deadlines are enforced by the caller.

use async_trait::async_trait;
use reqwest::Client as HttpClient;
use tracing::debug;

use crate::error::{Error, Result};
use crate::providers::ProviderId;

use super::types::{ChatRequest, ChatResponse, Message};
use super::{CompletionBackend, CompletionRequest, retry_after_header, status_error};

/// Attribution headers OpenRouter shows on its dashboard
const HTTP_REFERER: &str = "commentguard-ai";
const X_TITLE: &str = "CommentGuard AI";

/// OpenRouter chat completions client
///
/// Cheap to clone; the underlying connection pool is shared.
#[derive(Clone)]
pub struct OpenRouterClient {
    http_client: HttpClient,
    api_key: String,
    base_url: String,
    model: String,
}

impl std::fmt::Debug for OpenRouterClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenRouterClient")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish()
    }
}

/// Builder for creating an OpenRouterClient
#[derive(Default)]
pub struct OpenRouterClientBuilder {
    api_key: Option<String>,
    base_url: Option<String>,
    model: Option<String>,
}

impl OpenRouterClientBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Set the base URL (defaults to OpenRouter)
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn build(self) -> Result<OpenRouterClient> {
        let api_key = self
            .api_key
            .ok_or_else(|| Error::ConfigError("OpenRouter API key is required".to_string()))?;

        let http_client = HttpClient::builder().build().map_err(Error::NetworkError)?;

        let base_url = self
            .base_url
            .unwrap_or_else(|| ProviderId::OpenRouter.default_base_url().to_string());

        Ok(OpenRouterClient {
            http_client,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: self
                .model
                .unwrap_or_else(|| ProviderId::OpenRouter.default_model().to_string()),
        })
    }
}

impl OpenRouterClient {
    pub fn builder() -> OpenRouterClientBuilder {
        OpenRouterClientBuilder::new()
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Send a chat request and return the first choice's content
    pub async fn chat(&self, request: &ChatRequest) -> Result<Option<String>> {
        let url = format!("{}/chat/completions", self.base_url);

        debug!(
            model = %request.model,
            messages = request.messages.len(),
            "Sending chat completion request"
        );

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&self.api_key)
            .header("HTTP-Referer", HTTP_REFERER)
            .header("X-Title", X_TITLE)
            .json(request)
            .send()
            .await
            .map_err(Error::NetworkError)?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = retry_after_header(response.headers());
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(
                ProviderId::OpenRouter,
                status.as_u16(),
                retry_after,
                &body,
            ));
        }

        let chat_response: ChatResponse = response.json().await.map_err(|e| {
            Error::malformed(
                ProviderId::OpenRouter,
                format!("failed to decode chat completion: {}", e),
            )
        })?;

        if let Some(usage) = &chat_response.usage {
            debug!(
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                "Chat completion received"
            );
        }

        if let Some(reason) = chat_response
            .choices
            .first()
            .and_then(|c| c.finish_reason.as_deref())
        {
            debug!(finish_reason = reason, "Chat completion finished");
        }

        Ok(chat_response.into_text())
    }
}

#[async_trait]
impl CompletionBackend for OpenRouterClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<Option<String>> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = &request.system {
            messages.push(Message::system(system.as_str()));
        }
        messages.push(Message::user(request.prompt.as_str()));

        let chat = ChatRequest::new(self.model.as_str(), messages)
            .with_temperature(request.temperature)
            .with_max_tokens(request.max_tokens);

        self.chat(&chat).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};

    fn client_for(server: &Server) -> OpenRouterClient {
        OpenRouterClient::builder()
            .api_key("or-test-key")
            .base_url(server.url())
            .model("test/model")
            .build()
            .unwrap()
    }

    #[test]
    fn test_client_builder_defaults() {
        let client = OpenRouterClient::builder().api_key("k").build().unwrap();
        assert_eq!(client.model(), "mistralai/mistral-7b-instruct");
        assert_eq!(client.base_url(), "https://openrouter.ai/api/v1");
    }

    #[test]
    fn test_client_builder_requires_api_key() {
        let result = OpenRouterClient::builder().build();
        assert!(matches!(result, Err(Error::ConfigError(_))));
    }

    #[test]
    fn test_client_builder_trims_trailing_slash() {
        let client = OpenRouterClient::builder()
            .api_key("k")
            .base_url("http://localhost:1234/api/v1/")
            .build()
            .unwrap();
        assert_eq!(client.base_url(), "http://localhost:1234/api/v1");
    }

    #[test]
    fn test_client_debug_omits_key() {
        let client = OpenRouterClient::builder()
            .api_key("sk-secret-value")
            .build()
            .unwrap();
        let debug = format!("{:?}", client);
        assert!(debug.contains("OpenRouterClient"));
        assert!(!debug.contains("sk-secret-value"));
    }

    #[test]
    fn test_client_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<OpenRouterClient>();
    }

    #[tokio::test]
    async fn test_complete_sends_headers_and_messages() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/chat/completions")
            .match_header("authorization", "Bearer or-test-key")
            .match_header("http-referer", "commentguard-ai")
            .match_header("x-title", "CommentGuard AI")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "model": "test/model",
                "messages": [
                    {"role": "system", "content": "be nice"},
                    {"role": "user", "content": "hello"}
                ],
                "max_tokens": 250
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"choices":[{"message":{"role":"assistant","content":"Hi there"}}]}"#)
            .create_async()
            .await;

        let client = client_for(&server);
        let request = CompletionRequest::new("hello", 0.5, 250).with_system("be nice");
        let text = client.complete(&request).await.unwrap();

        assert_eq!(text.as_deref(), Some("Hi there"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_complete_maps_rate_limit() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/chat/completions")
            .with_status(429)
            .with_header("retry-after", "5")
            .with_body("slow down")
            .create_async()
            .await;

        let client = client_for(&server);
        let err = client
            .complete(&CompletionRequest::new("x", 0.3, 10))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::RateLimited(5)));
    }

    #[tokio::test]
    async fn test_complete_maps_unauthorized() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/chat/completions")
            .with_status(401)
            .with_body(r#"{"error":{"message":"No auth credentials found"}}"#)
            .create_async()
            .await;

        let client = client_for(&server);
        let err = client
            .complete(&CompletionRequest::new("x", 0.3, 10))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::LLMError(ref msg) if msg.contains("OPENROUTER_API_KEY")));
    }

    #[tokio::test]
    async fn test_complete_undecodable_body() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_body("<html>gateway</html>")
            .create_async()
            .await;

        let client = client_for(&server);
        let err = client
            .complete(&CompletionRequest::new("x", 0.3, 10))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::MalformedResponse { provider: ProviderId::OpenRouter, .. }
        ));
    }
}
