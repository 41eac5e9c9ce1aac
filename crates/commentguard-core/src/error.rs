//! Error types for CommentGuard

use thiserror::Error;

use crate::providers::ProviderId;

/// Result type alias using CommentGuard's Error
pub type Result<T> = std::result::Result<T, Error>;

/// A single provider's failure, collected by the orchestrator's fan-in step
#[derive(Debug)]
pub struct ProviderFailure {
    /// Provider that failed
    pub provider: ProviderId,
    /// Why it failed
    pub error: Error,
}

impl ProviderFailure {
    pub fn new(provider: ProviderId, error: Error) -> Self {
        Self { provider, error }
    }
}

impl std::fmt::Display for ProviderFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.provider.display_name(), self.error)
    }
}

fn join_failures(failures: &[ProviderFailure]) -> String {
    if failures.is_empty() {
        return "no providers configured".to_string();
    }
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// CommentGuard error types with helpful messages and suggestions
#[derive(Error, Debug)]
pub enum Error {
    // Network errors (E100-E199)
    #[error("Network error: {0}. Check your internet connection.")]
    NetworkError(#[from] reqwest::Error),

    #[error("LLM API error: {0}")]
    LLMError(String),

    #[error("Rate limited. Retry after {0} seconds.")]
    RateLimited(u64),

    #[error("{} request timed out after {secs} seconds", .provider.display_name())]
    Timeout { provider: ProviderId, secs: u64 },

    // Provider response errors (E200-E299)
    #[error("Malformed response from {}: {reason}", .provider.display_name())]
    MalformedResponse { provider: ProviderId, reason: String },

    #[error("Empty response from {}", .0.display_name())]
    EmptyResponse(ProviderId),

    // Orchestration errors (E300-E399)
    #[error("All AI providers failed to analyze the text: {}", join_failures(.0))]
    AllProvidersFailed(Vec<ProviderFailure>),

    #[error("Failed to initialize AI providers: {}", join_failures(.0))]
    AggregateInit(Vec<ProviderFailure>),

    #[error("{} has not been initialized", .0.display_name())]
    NotInitialized(ProviderId),

    #[error("Unknown provider '{0}'. Supported: gemini, openrouter")]
    UnknownProvider(String),

    // Config errors (E600-E699)
    #[error("Configuration error: {0}")]
    ConfigError(String),

    // Input errors (E800-E899)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Get error code for this error type
    pub fn code(&self) -> &'static str {
        match self {
            Self::NetworkError(_) => "E100",
            Self::LLMError(_) => "E101",
            Self::RateLimited(_) => "E102",
            Self::Timeout { .. } => "E103",
            Self::MalformedResponse { .. } => "E200",
            Self::EmptyResponse(_) => "E201",
            Self::AllProvidersFailed(_) => "E300",
            Self::AggregateInit(_) => "E301",
            Self::NotInitialized(_) => "E302",
            Self::UnknownProvider(_) => "E303",
            Self::ConfigError(_) => "E600",
            Self::InvalidInput(_) => "E800",
            Self::Io(_) => "E9999",
        }
    }

    /// Get suggestion for how to fix this error
    pub fn suggestion(&self) -> Option<String> {
        match self {
            Self::NetworkError(_) => Some("Check internet connection".to_string()),
            Self::ConfigError(_) | Self::AggregateInit(_) => Some(format!(
                "Set {} and {} in the environment or a .env file",
                ProviderId::Gemini.api_key_env(),
                ProviderId::OpenRouter.api_key_env()
            )),
            Self::Timeout { .. } | Self::AllProvidersFailed(_) => {
                Some("Try again in a moment".to_string())
            }
            Self::UnknownProvider(_) => {
                Some("Run `commentguard providers` to see supported providers".to_string())
            }
            Self::RateLimited(secs) => Some(format!("Wait {} seconds and try again", secs)),
            _ => None,
        }
    }

    /// Per-provider diagnostics carried by the aggregate variants
    pub fn failures(&self) -> &[ProviderFailure] {
        match self {
            Self::AllProvidersFailed(failures) | Self::AggregateInit(failures) => failures,
            _ => &[],
        }
    }

    /// Shorthand used by adapters when a reply cannot be normalized
    pub fn malformed(provider: ProviderId, reason: impl Into<String>) -> Self {
        Self::MalformedResponse {
            provider,
            reason: reason.into(),
        }
    }
}
