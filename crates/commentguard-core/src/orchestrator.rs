//! Orchestrator
//!
//! Owns one adapter per provider, initializes them together, and fans each
//! comment out to every initialized adapter concurrently. Per-provider
//! failures are collected instead of aborting the batch; only a batch with
//! no successes is an error.

use futures_util::future::join_all;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use tracing::{error, info, warn};

use crate::config::{Config, env_api_key, redact_key};
use crate::error::{Error, ProviderFailure, Result};
use crate::providers::{ProviderAdapter, ProviderId, SentimentProvider};
use crate::sentiment::{AiResponse, ResponseTone};

/// What `initialize_all` does when only some providers come up
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InitPolicy {
    /// Any failure is an error
    #[default]
    Strict,
    /// Continue with whichever providers initialized
    Degrade,
}

impl fmt::Display for InitPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InitPolicy::Strict => write!(f, "strict"),
            InitPolicy::Degrade => write!(f, "degrade"),
        }
    }
}

impl FromStr for InitPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "strict" => Ok(InitPolicy::Strict),
            "degrade" => Ok(InitPolicy::Degrade),
            other => Err(Error::ConfigError(format!(
                "Invalid init policy: {}. Valid options: strict, degrade",
                other
            ))),
        }
    }
}

/// API keys by provider
#[derive(Clone, Default)]
pub struct Credentials {
    keys: BTreeMap<ProviderId, String>,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.keys.iter().map(|(id, key)| (id, redact_key(key))))
            .finish()
    }
}

impl Credentials {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collect every provider's key from the environment
    pub fn from_env() -> Self {
        let keys = ProviderId::ALL
            .iter()
            .filter_map(|&id| env_api_key(id).map(|key| (id, key)))
            .collect();
        Self { keys }
    }

    pub fn with(mut self, id: ProviderId, key: impl Into<String>) -> Self {
        self.keys.insert(id, key.into());
        self
    }

    pub fn get(&self, id: ProviderId) -> Option<&str> {
        self.keys.get(&id).map(String::as_str)
    }
}

/// Outcome of `initialize_all`
#[derive(Debug, Default)]
pub struct InitReport {
    /// Providers ready for use
    pub initialized: Vec<ProviderId>,
    /// Providers that failed (only non-empty under `InitPolicy::Degrade`)
    pub failures: Vec<ProviderFailure>,
}

/// Result of one `analyze_with_all` call
#[derive(Debug)]
pub struct AnalysisBatch {
    /// Successful analyses, in submission order
    pub responses: Vec<AiResponse>,
    /// Providers that failed while others succeeded
    pub failures: Vec<ProviderFailure>,
}

impl AnalysisBatch {
    /// Whether any provider flagged the comment for a human moderator
    pub fn needs_human_review(&self) -> bool {
        self.responses
            .iter()
            .any(|r| r.sentiment.requires_human_review())
    }

    pub fn is_partial(&self) -> bool {
        !self.failures.is_empty()
    }

    pub fn response_from(&self, id: ProviderId) -> Option<&AiResponse> {
        self.responses.iter().find(|r| r.model == id)
    }
}

/// Fans comments out to every initialized provider
pub struct Orchestrator {
    providers: BTreeMap<ProviderId, Box<dyn SentimentProvider>>,
    policy: InitPolicy,
}

impl fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Orchestrator")
            .field("providers", &self.providers.keys().collect::<Vec<_>>())
            .field("available", &self.available())
            .field("policy", &self.policy)
            .finish()
    }
}

impl Default for Orchestrator {
    fn default() -> Self {
        Self::new(InitPolicy::default())
    }
}

impl Orchestrator {
    pub fn new(policy: InitPolicy) -> Self {
        Self {
            providers: BTreeMap::new(),
            policy,
        }
    }

    /// Register an adapter for every enabled provider in `config`
    pub fn from_config(config: &Config) -> Self {
        let mut orchestrator = Self::new(config.orchestrator.init_policy);
        for id in config.enabled_providers() {
            orchestrator.register(ProviderAdapter::new(id, config.provider(id).clone()));
        }
        orchestrator
    }

    /// Add a provider, replacing any previous one with the same id
    pub fn register(&mut self, provider: impl SentimentProvider + 'static) -> &mut Self {
        self.providers.insert(provider.id(), Box::new(provider));
        self
    }

    pub fn policy(&self) -> InitPolicy {
        self.policy
    }

    pub fn set_policy(&mut self, policy: InitPolicy) {
        self.policy = policy;
    }

    /// Registered providers, initialized or not
    pub fn registered(&self) -> Vec<ProviderId> {
        self.providers.keys().copied().collect()
    }

    /// Providers ready to take requests
    pub fn available(&self) -> Vec<ProviderId> {
        self.providers
            .iter()
            .filter(|(_, p)| p.is_initialized())
            .map(|(&id, _)| id)
            .collect()
    }

    /// Initialize every registered provider
    ///
    /// Every provider is attempted even after a failure. Providers that
    /// initialize successfully stay usable whatever the outcome.
    pub fn initialize_all(&mut self, credentials: &Credentials) -> Result<InitReport> {
        let mut report = InitReport::default();

        for (&id, provider) in self.providers.iter_mut() {
            if provider.is_initialized() {
                report.initialized.push(id);
                continue;
            }

            let outcome = match credentials.get(id) {
                Some(key) => provider.initialize(key),
                None => Err(Error::ConfigError(format!(
                    "{} is not set",
                    id.api_key_env()
                ))),
            };

            match outcome {
                Ok(()) => {
                    info!(provider = %id, "Provider ready");
                    report.initialized.push(id);
                }
                Err(e) => {
                    warn!(provider = %id, error = %e, "Provider failed to initialize");
                    report.failures.push(ProviderFailure::new(id, e));
                }
            }
        }

        let fatal = match self.policy {
            InitPolicy::Strict => !report.failures.is_empty(),
            InitPolicy::Degrade => report.initialized.is_empty(),
        };

        if fatal {
            let err = Error::AggregateInit(report.failures);
            error!(error = %err, "Initialization failed");
            return Err(err);
        }

        Ok(report)
    }

    /// Analyze a comment with every initialized provider concurrently
    ///
    /// Waits for every call to settle. Registered providers that are not
    /// initialized are reported as `NotInitialized` failures. Fails only when
    /// no provider produced a result, with one diagnostic per provider.
    pub async fn analyze_with_all(&self, text: &str) -> Result<AnalysisBatch> {
        if text.trim().is_empty() {
            return Err(Error::InvalidInput("comment text is empty".to_string()));
        }

        let (active, skipped): (Vec<&dyn SentimentProvider>, Vec<_>) = self
            .providers
            .values()
            .map(|p| p.as_ref())
            .partition(|p| p.is_initialized());

        let not_initialized: Vec<ProviderFailure> = skipped
            .iter()
            .map(|p| ProviderFailure::new(p.id(), Error::NotInitialized(p.id())))
            .collect();

        if active.is_empty() {
            let err = Error::AllProvidersFailed(not_initialized);
            error!(error = %err, "No provider is initialized");
            return Err(err);
        }

        let outcomes = join_all(active.into_iter().map(|provider| async move {
            (provider.id(), provider.analyze_sentiment(text).await)
        }))
        .await;

        let mut batch = AnalysisBatch {
            responses: Vec::new(),
            failures: Vec::new(),
        };

        for (id, outcome) in outcomes {
            match outcome {
                Ok(sentiment) => batch.responses.push(AiResponse::new(id, sentiment)),
                Err(e) => {
                    warn!(provider = %id, error = %e, "Provider analysis failed");
                    batch.failures.push(ProviderFailure::new(id, e));
                }
            }
        }

        batch.failures.extend(not_initialized);
        batch.failures.sort_by_key(|f| f.provider);

        if batch.responses.is_empty() {
            let err = Error::AllProvidersFailed(batch.failures);
            error!(error = %err, "Analysis failed");
            return Err(err);
        }

        info!(
            succeeded = batch.responses.len(),
            failed = batch.failures.len(),
            human_review = batch.needs_human_review(),
            "Analysis batch complete"
        );
        Ok(batch)
    }

    /// Draft a reply with one specific provider
    pub async fn generate_response(
        &self,
        provider: ProviderId,
        text: &str,
        tone: ResponseTone,
    ) -> Result<String> {
        let adapter = self
            .providers
            .get(&provider)
            .ok_or_else(|| Error::UnknownProvider(provider.to_string()))?;

        adapter.generate_response(text, tone).await
    }
}
