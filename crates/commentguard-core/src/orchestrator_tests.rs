//! Orchestrator tests

use std::time::Duration;

use crate::config::{Config, ProviderConfig};
use crate::error::Error;
use crate::orchestrator::{Credentials, InitPolicy, Orchestrator};
use crate::providers::stub::{Reply, ScriptedBackend};
use crate::providers::{ProviderAdapter, ProviderId, SentimentProvider};
use crate::sentiment::{ResponseTone, SentimentLabel};

const GEMINI_REPLY: &str = r#"Sure! {"label":"positive","score":0.9,"suggestedResponse":"Thanks!"} Hope that helps!"#;

const OPENROUTER_REPLY: &str = r#"{"sentiment":{"label":"negative","score":0.2,
    "summary":"Upset about billing.","suggestedResponse":"Sorry to hear that.",
    "analysis":{"toxicity":0.3,"spam_probability":0.0,"key_topics":["billing"],
    "requires_human_review":true,"priority_level":"high","response_tone":"empathetic"}}}"#;

fn stubbed(id: ProviderId, reply: Reply) -> ProviderAdapter {
    ProviderAdapter::with_backend(id, ProviderConfig::default(), ScriptedBackend::new(reply))
}

fn orchestrator(gemini: Reply, openrouter: Reply) -> Orchestrator {
    let mut orchestrator = Orchestrator::default();
    orchestrator
        .register(stubbed(ProviderId::Gemini, gemini))
        .register(stubbed(ProviderId::OpenRouter, openrouter));
    orchestrator
}

fn uninitialized(policy: InitPolicy) -> Orchestrator {
    let mut orchestrator = Orchestrator::new(policy);
    for &id in ProviderId::ALL {
        orchestrator.register(ProviderAdapter::new(id, ProviderConfig::default()));
    }
    orchestrator
}

#[tokio::test]
async fn test_both_succeed_in_submission_order() {
    let orchestrator = orchestrator(
        Reply::Text(GEMINI_REPLY.to_string()),
        Reply::Text(OPENROUTER_REPLY.to_string()),
    );

    let batch = orchestrator.analyze_with_all("My bill is wrong!").await.unwrap();

    assert_eq!(batch.responses.len(), 2);
    assert!(!batch.is_partial());
    assert_eq!(batch.responses[0].model, ProviderId::Gemini);
    assert_eq!(batch.responses[1].model, ProviderId::OpenRouter);
    assert_eq!(
        batch.responses[1].sentiment.label(),
        SentimentLabel::Negative
    );
    assert!(batch.needs_human_review());
}

#[tokio::test(start_paused = true)]
async fn test_one_timeout_yields_partial_batch() {
    let orchestrator = orchestrator(Reply::Text(GEMINI_REPLY.to_string()), Reply::Hang);

    let batch = orchestrator.analyze_with_all("Great service").await.unwrap();

    assert_eq!(batch.responses.len(), 1);
    assert_eq!(batch.responses[0].model, ProviderId::Gemini);
    assert!(!batch.needs_human_review());

    assert_eq!(batch.failures.len(), 1);
    assert_eq!(batch.failures[0].provider, ProviderId::OpenRouter);
    assert!(matches!(
        batch.failures[0].error,
        Error::Timeout {
            provider: ProviderId::OpenRouter,
            secs: 15
        }
    ));
}

#[tokio::test(start_paused = true)]
async fn test_calls_run_concurrently() {
    let orchestrator = orchestrator(
        Reply::Delayed(8, GEMINI_REPLY.to_string()),
        Reply::Delayed(8, OPENROUTER_REPLY.to_string()),
    );

    let started = tokio::time::Instant::now();
    let batch = orchestrator.analyze_with_all("hello").await.unwrap();

    assert_eq!(batch.responses.len(), 2);
    assert!(started.elapsed() < Duration::from_secs(15));
}

#[tokio::test]
async fn test_both_fail_reports_every_diagnostic() {
    let orchestrator = orchestrator(
        Reply::Text("{label: positive}".to_string()),
        Reply::RateLimited(20),
    );

    let err = orchestrator.analyze_with_all("hello").await.unwrap_err();

    assert!(matches!(err, Error::AllProvidersFailed(_)));
    let failures = err.failures();
    assert_eq!(failures.len(), 2);
    assert!(matches!(
        failures[0].error,
        Error::MalformedResponse {
            provider: ProviderId::Gemini,
            ..
        }
    ));
    assert!(matches!(failures[1].error, Error::RateLimited(20)));
}

#[tokio::test]
async fn test_analyze_rejects_empty_text() {
    let orchestrator = orchestrator(
        Reply::Text(GEMINI_REPLY.to_string()),
        Reply::Text(OPENROUTER_REPLY.to_string()),
    );
    assert!(matches!(
        orchestrator.analyze_with_all(" \t ").await,
        Err(Error::InvalidInput(_))
    ));
}

#[tokio::test]
async fn test_analyze_without_initialization() {
    let orchestrator = uninitialized(InitPolicy::Strict);

    let err = orchestrator.analyze_with_all("hello").await.unwrap_err();
    let failures = err.failures();
    assert_eq!(failures.len(), 2);
    assert!(
        failures
            .iter()
            .all(|f| matches!(f.error, Error::NotInitialized(id) if id == f.provider))
    );
}

fn degraded(gemini: Reply) -> Orchestrator {
    let mut orchestrator = Orchestrator::new(InitPolicy::Degrade);
    orchestrator
        .register(stubbed(ProviderId::Gemini, gemini))
        .register(ProviderAdapter::new(ProviderId::OpenRouter, ProviderConfig::default()));
    orchestrator
}

#[tokio::test]
async fn test_uninitialized_provider_reported_in_partial_batch() {
    let orchestrator = degraded(Reply::Text(GEMINI_REPLY.to_string()));

    let batch = orchestrator.analyze_with_all("Nice work").await.unwrap();

    assert_eq!(batch.responses.len(), 1);
    assert_eq!(batch.responses[0].model, ProviderId::Gemini);
    assert!(batch.is_partial());
    assert_eq!(batch.failures.len(), 1);
    assert_eq!(batch.failures[0].provider, ProviderId::OpenRouter);
    assert!(matches!(
        batch.failures[0].error,
        Error::NotInitialized(ProviderId::OpenRouter)
    ));
}

#[tokio::test]
async fn test_uninitialized_provider_counted_when_all_fail() {
    let orchestrator = degraded(Reply::Text("not json at all".to_string()));

    let err = orchestrator.analyze_with_all("Nice work").await.unwrap_err();

    let failures = err.failures();
    assert_eq!(failures.len(), 2);
    assert_eq!(failures[0].provider, ProviderId::Gemini);
    assert!(matches!(failures[0].error, Error::MalformedResponse { .. }));
    assert_eq!(failures[1].provider, ProviderId::OpenRouter);
    assert!(matches!(failures[1].error, Error::NotInitialized(_)));
}

#[tokio::test]
async fn test_repeated_calls_are_independent() {
    let orchestrator = orchestrator(
        Reply::Text(GEMINI_REPLY.to_string()),
        Reply::Text(OPENROUTER_REPLY.to_string()),
    );

    let first = orchestrator.analyze_with_all("same text").await.unwrap();
    let second = orchestrator.analyze_with_all("same text").await.unwrap();

    assert_eq!(first.responses, second.responses);
    assert!(second.failures.is_empty());
}

#[test]
fn test_strict_init_names_only_the_failing_provider() {
    let mut orchestrator = uninitialized(InitPolicy::Strict);
    let credentials = Credentials::new()
        .with(ProviderId::Gemini, "AIza-valid-key")
        .with(ProviderId::OpenRouter, "not a valid key");

    let err = orchestrator.initialize_all(&credentials).unwrap_err();

    assert!(matches!(err, Error::AggregateInit(_)));
    let failures = err.failures();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].provider, ProviderId::OpenRouter);
    assert!(matches!(failures[0].error, Error::ConfigError(_)));

    // The provider that did initialize stays usable
    assert_eq!(orchestrator.available(), vec![ProviderId::Gemini]);
}

#[test]
fn test_strict_init_missing_credential() {
    let mut orchestrator = uninitialized(InitPolicy::Strict);
    let credentials = Credentials::new().with(ProviderId::OpenRouter, "sk-or-valid");

    let err = orchestrator.initialize_all(&credentials).unwrap_err();
    assert_eq!(err.failures().len(), 1);
    assert_eq!(err.failures()[0].provider, ProviderId::Gemini);
    assert!(err.to_string().contains("GEMINI_API_KEY is not set"));
}

#[test]
fn test_degrade_init_keeps_working_provider() {
    let mut orchestrator = uninitialized(InitPolicy::Degrade);
    let credentials = Credentials::new().with(ProviderId::Gemini, "AIza-valid-key");

    let report = orchestrator.initialize_all(&credentials).unwrap();

    assert_eq!(report.initialized, vec![ProviderId::Gemini]);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].provider, ProviderId::OpenRouter);
    assert_eq!(orchestrator.available(), vec![ProviderId::Gemini]);
}

#[test]
fn test_degrade_init_fails_when_nothing_initializes() {
    let mut orchestrator = uninitialized(InitPolicy::Degrade);
    let err = orchestrator.initialize_all(&Credentials::new()).unwrap_err();
    assert_eq!(err.failures().len(), 2);
}

#[test]
fn test_initialize_all_is_safe_to_repeat() {
    let mut orchestrator = uninitialized(InitPolicy::Strict);
    let credentials = Credentials::new()
        .with(ProviderId::Gemini, "AIza-valid-key")
        .with(ProviderId::OpenRouter, "sk-or-valid");

    let report = orchestrator.initialize_all(&credentials).unwrap();
    assert_eq!(report.initialized, ProviderId::ALL);

    let again = orchestrator.initialize_all(&credentials).unwrap();
    assert_eq!(again.initialized, ProviderId::ALL);
    assert!(again.failures.is_empty());
}

#[test]
fn test_from_config_registers_enabled_providers() {
    let mut config = Config::default();
    config.gemini.enabled = false;
    config.orchestrator.init_policy = InitPolicy::Degrade;

    let orchestrator = Orchestrator::from_config(&config);
    assert_eq!(orchestrator.registered(), vec![ProviderId::OpenRouter]);
    assert!(orchestrator.available().is_empty());
    assert_eq!(orchestrator.policy(), InitPolicy::Degrade);
}

#[test]
fn test_credentials_debug_redacts_keys() {
    let credentials = Credentials::new().with(ProviderId::Gemini, "AIza-super-secret-1234");
    let debug = format!("{:?}", credentials);
    assert!(debug.contains("***1234"));
    assert!(!debug.contains("super-secret"));
}

#[tokio::test]
async fn test_generate_response_routes_to_provider() {
    let orchestrator = orchestrator(
        Reply::Text("Gemini says hi".to_string()),
        Reply::Text("OpenRouter says hi".to_string()),
    );

    let reply = orchestrator
        .generate_response(ProviderId::OpenRouter, "hello", ResponseTone::Formal)
        .await
        .unwrap();
    assert_eq!(reply, "OpenRouter says hi");
}

#[tokio::test]
async fn test_generate_response_unregistered_provider() {
    let mut orchestrator = Orchestrator::default();
    orchestrator.register(stubbed(ProviderId::Gemini, Reply::Text("hi".to_string())));

    let err = orchestrator
        .generate_response(ProviderId::OpenRouter, "hello", ResponseTone::Casual)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::UnknownProvider(ref name) if name == "openrouter"));
}

#[test]
fn test_register_replaces_same_id() {
    let mut orchestrator = Orchestrator::default();
    orchestrator
        .register(ProviderAdapter::new(ProviderId::Gemini, ProviderConfig::default()))
        .register(stubbed(ProviderId::Gemini, Reply::Empty));

    assert_eq!(orchestrator.registered(), vec![ProviderId::Gemini]);
    assert_eq!(orchestrator.available(), vec![ProviderId::Gemini]);
}

#[test]
fn test_init_policy_parsing() {
    assert_eq!("strict".parse::<InitPolicy>().unwrap(), InitPolicy::Strict);
    assert_eq!(" DEGRADE ".parse::<InitPolicy>().unwrap(), InitPolicy::Degrade);
    assert!(matches!(
        "partial".parse::<InitPolicy>(),
        Err(Error::ConfigError(_))
    ));
}

#[test]
fn test_adapter_is_object_safe() {
    let provider: Box<dyn SentimentProvider> =
        Box::new(stubbed(ProviderId::Gemini, Reply::Empty));
    assert_eq!(provider.id(), ProviderId::Gemini);
    assert!(provider.is_initialized());
}
