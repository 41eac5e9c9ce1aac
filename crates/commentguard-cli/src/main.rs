//! CommentGuard CLI - dual-provider sentiment analysis for social media comments

use std::io::Read;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use commentguard_core::config::{Config, env_api_key, redact_key};
use commentguard_core::{
    AiResponse, AnalysisBatch, Credentials, Error, InitPolicy, Orchestrator, ProviderAdapter,
    ProviderFailure, ProviderId, ResponseTone,
};
use serde_json::json;
use tracing::warn;

#[derive(Parser)]
#[command(name = "commentguard")]
#[command(author, version, about = "Dual-provider AI sentiment analysis for social media comments", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format (text or json)
    #[arg(long, global = true, default_value = "text")]
    format: OutputFormat,

    /// Quiet mode (minimal output)
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Keep going when only some providers initialize
    #[arg(long, global = true)]
    allow_partial: bool,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a comment with every configured provider
    Analyze {
        /// Comment text (read from stdin when omitted)
        text: Option<String>,
    },

    /// Draft a customer-service reply with one provider
    Respond {
        /// Comment text (read from stdin when omitted)
        text: Option<String>,
        /// Provider to ask (gemini or openrouter)
        #[arg(short, long)]
        provider: ProviderId,
        /// Reply tone (formal, casual, empathetic)
        #[arg(short, long, default_value = "casual")]
        tone: ResponseTone,
    },

    /// Show provider settings and key status
    Providers,

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Get a configuration value
    Get { key: String },
    /// Set a configuration value
    Set { key: String, value: String },
    /// List all configuration values
    List,
    /// Reset configuration to defaults
    Reset,
    /// Show config file path
    Path,
}

#[tokio::main]
async fn main() -> ExitCode {
    // A missing .env file is fine
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let directive = if cli.quiet {
        "commentguard=warn"
    } else {
        "commentguard=info"
    };
    let filter = tracing_subscriber::EnvFilter::from_default_env();
    let filter = match directive.parse() {
        Ok(directive) => filter.add_directive(directive),
        Err(_) => filter,
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let format = cli.format;
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            report_error(&e, format);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Analyze { text } => {
            cmd_analyze(text, cli.allow_partial, cli.format, cli.quiet).await
        }

        Commands::Respond {
            text,
            provider,
            tone,
        } => cmd_respond(text, provider, tone, cli.format, cli.quiet).await,

        Commands::Providers => cmd_providers(cli.format),

        Commands::Config { action } => cmd_config(action, cli.quiet),
    }
}

/// Use the argument if given, otherwise read all of stdin
fn read_text(text: Option<String>) -> anyhow::Result<String> {
    match text {
        Some(text) => Ok(text),
        None => {
            let mut buffer = String::new();
            std::io::stdin().read_to_string(&mut buffer)?;
            Ok(buffer.trim_end().to_string())
        }
    }
}

async fn cmd_analyze(
    text: Option<String>,
    allow_partial: bool,
    format: OutputFormat,
    quiet: bool,
) -> anyhow::Result<()> {
    let text = read_text(text)?;
    let config = Config::load()?;

    let mut orchestrator = Orchestrator::from_config(&config);
    if allow_partial {
        orchestrator.set_policy(InitPolicy::Degrade);
    }

    let report = orchestrator.initialize_all(&Credentials::from_env())?;
    for failure in &report.failures {
        warn!(provider = %failure.provider, error = %failure.error, "Skipping provider");
    }

    let batch = orchestrator.analyze_with_all(&text).await?;

    match format {
        OutputFormat::Json => {
            let output = json!({
                "responses": batch.responses,
                "failures": batch.failures.iter().map(failure_json).collect::<Vec<_>>(),
                "needs_human_review": batch.needs_human_review(),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Text if quiet => {
            for response in &batch.responses {
                println!(
                    "{}\t{}\t{:.2}",
                    response.model,
                    response.sentiment.label(),
                    response.sentiment.score()
                );
            }
        }
        OutputFormat::Text => print_batch(&batch),
    }

    Ok(())
}

fn failure_json(failure: &ProviderFailure) -> serde_json::Value {
    json!({
        "provider": failure.provider,
        "code": failure.error.code(),
        "error": failure.error.to_string(),
    })
}

fn print_response(response: &AiResponse) {
    let sentiment = &response.sentiment;
    println!(
        "[{}] {} (score {:.2})",
        response.model.display_name(),
        sentiment.label(),
        sentiment.score()
    );
    if let Some(summary) = sentiment.summary() {
        println!("  Summary: {}", summary);
    }
    println!("  Suggested response: {}", sentiment.suggested_response());

    if let Some(analysis) = sentiment.analysis() {
        println!(
            "  Toxicity: {:.2}  Spam: {:.2}  Priority: {}  Tone: {}",
            analysis.toxicity(),
            analysis.spam_probability(),
            analysis.priority_level(),
            analysis.response_tone()
        );
        if !analysis.key_topics().is_empty() {
            println!("  Topics: {}", analysis.key_topics().join(", "));
        }
    }
}

fn print_batch(batch: &AnalysisBatch) {
    for response in &batch.responses {
        print_response(response);
        println!();
    }

    for failure in &batch.failures {
        println!(
            "[{}] failed: {}",
            failure.provider.display_name(),
            failure.error
        );
    }

    if batch.needs_human_review() {
        println!("!! This comment requires human review before replying.");
    }
}

async fn cmd_respond(
    text: Option<String>,
    provider: ProviderId,
    tone: ResponseTone,
    format: OutputFormat,
    quiet: bool,
) -> anyhow::Result<()> {
    let text = read_text(text)?;
    let config = Config::load()?;

    let mut orchestrator = Orchestrator::new(InitPolicy::Strict);
    orchestrator.register(ProviderAdapter::new(
        provider,
        config.provider(provider).clone(),
    ));
    orchestrator.initialize_all(&Credentials::from_env())?;

    let reply = orchestrator.generate_response(provider, &text, tone).await?;

    match format {
        OutputFormat::Json => {
            let output = json!({
                "provider": provider,
                "tone": tone,
                "response": reply,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Text if quiet => println!("{}", reply),
        OutputFormat::Text => {
            println!("[{}] ({} tone)", provider.display_name(), tone);
            println!("{}", reply);
        }
    }

    Ok(())
}

fn cmd_providers(format: OutputFormat) -> anyhow::Result<()> {
    let config = Config::load()?;

    let rows: Vec<serde_json::Value> = ProviderId::ALL
        .iter()
        .map(|&id| {
            let settings = config.provider(id);
            json!({
                "provider": id,
                "enabled": settings.enabled,
                "model": settings.model_or_default(id),
                "base_url": settings.base_url_or_default(id),
                "api_key_env": id.api_key_env(),
                "api_key": env_api_key(id).map(|key| redact_key(&key)),
            })
        })
        .collect();

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&rows)?),
        OutputFormat::Text => {
            for &id in ProviderId::ALL {
                let settings = config.provider(id);
                let key = match env_api_key(id) {
                    Some(key) => redact_key(&key),
                    None => format!("not set ({})", id.api_key_env()),
                };
                println!(
                    "{:<12} {:<9} {:<32} key: {}",
                    id.name(),
                    if settings.enabled { "enabled" } else { "disabled" },
                    settings.model_or_default(id),
                    key
                );
            }
        }
    }

    Ok(())
}

fn cmd_config(action: ConfigAction, quiet: bool) -> anyhow::Result<()> {
    match action {
        ConfigAction::Get { key } => {
            let config = Config::load()?;
            let value = config.get(&key)?;
            println!("{}", value);
        }
        ConfigAction::Set { key, value } => {
            let mut config = Config::load()?;
            config.set(&key, &value)?;
            config.save()?;
            if !quiet {
                println!("Set {} = {}", key, value);
            }
        }
        ConfigAction::List => {
            let config = Config::load()?;
            let items = config.list()?;
            for (key, value) in items {
                println!("{} = {}", key, value);
            }
        }
        ConfigAction::Reset => {
            Config::reset()?;
            if !quiet {
                println!("Configuration reset to defaults.");
            }
        }
        ConfigAction::Path => {
            let path = Config::config_path()?;
            println!("{}", path.display());
        }
    }
    Ok(())
}

/// Print an error with its code and remediation hint
fn report_error(err: &anyhow::Error, format: OutputFormat) {
    let core = err.downcast_ref::<Error>();

    if format == OutputFormat::Json {
        let output = json!({
            "error": format!("{:#}", err),
            "code": core.map(Error::code),
            "failures": core
                .map(|e| e.failures().iter().map(failure_json).collect::<Vec<_>>())
                .unwrap_or_default(),
            "suggestion": core.and_then(Error::suggestion),
        });
        println!("{}", output);
        return;
    }

    match core {
        Some(e) => {
            eprintln!("Error [{}]: {}", e.code(), e);
            if let Some(suggestion) = e.suggestion() {
                eprintln!("Hint: {}", suggestion);
            }
        }
        None => eprintln!("Error: {:#}", err),
    }
}

#[cfg(test)]
mod main_tests;
