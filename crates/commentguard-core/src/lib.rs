//! CommentGuard Core Library
//!
//! Dual-provider sentiment analysis for social media comments:
//! - Provider adapters for Gemini and OpenRouter
//! - Concurrent fan-out with partial-failure aggregation
//! - Brace-matched JSON extraction and schema validation of model output
//! - Custom reply generation
//! - TOML configuration with environment-only API keys

pub mod config;
pub mod error;
pub mod llm;
pub mod orchestrator;
pub mod providers;
pub mod sentiment;

pub use error::{Error, ProviderFailure, Result};
pub use orchestrator::{AnalysisBatch, Credentials, InitPolicy, InitReport, Orchestrator};
pub use providers::{ProviderAdapter, ProviderId, SentimentProvider};
pub use sentiment::{AiResponse, ResponseTone, SentimentLabel, SentimentResult};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::error::{Error, Result};
    pub use crate::orchestrator::{Credentials, InitPolicy, Orchestrator};
    pub use crate::providers::{ProviderId, SentimentProvider};
    pub use crate::sentiment::{ResponseTone, SentimentResult};
}

#[cfg(test)]
mod orchestrator_tests;
