//! Sentiment providers
//!
//! Every hosted model is reached through a `SentimentProvider`. The concrete
//! `ProviderAdapter` covers both supported APIs; tests and alternative
//! transports plug in through `ProviderAdapter::with_backend`.

mod adapter;
mod id;

use async_trait::async_trait;

use crate::error::Result;
use crate::sentiment::{ResponseTone, SentimentResult};

pub use adapter::ProviderAdapter;
pub use id::{PayloadShape, ProviderId};

/// Contract every provider adapter fulfils
#[async_trait]
pub trait SentimentProvider: Send + Sync {
    /// Which provider this is
    fn id(&self) -> ProviderId;

    /// Build the authenticated client. Must be called exactly once, and
    /// performs no network I/O.
    fn initialize(&mut self, api_key: &str) -> Result<()>;

    fn is_initialized(&self) -> bool;

    /// Classify a comment
    async fn analyze_sentiment(&self, text: &str) -> Result<SentimentResult>;

    /// Draft a plain-text customer-service reply
    async fn generate_response(&self, text: &str, tone: ResponseTone) -> Result<String>;
}
