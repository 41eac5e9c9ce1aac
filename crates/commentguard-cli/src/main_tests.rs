//! CLI argument parsing tests

use clap::{CommandFactory, Parser};
use commentguard_core::{ProviderId, ResponseTone};

use crate::{Cli, Commands, ConfigAction, OutputFormat};

#[test]
fn test_cli_definition_is_valid() {
    Cli::command().debug_assert();
}

#[test]
fn test_analyze_with_text() {
    let cli = Cli::try_parse_from(["commentguard", "analyze", "Love it!"]).unwrap();
    assert_eq!(cli.format, OutputFormat::Text);
    assert!(!cli.quiet);
    assert!(!cli.allow_partial);
    assert!(matches!(cli.command, Commands::Analyze { text: Some(ref t) } if t == "Love it!"));
}

#[test]
fn test_analyze_reads_stdin_when_text_omitted() {
    let cli = Cli::try_parse_from(["commentguard", "analyze"]).unwrap();
    assert!(matches!(cli.command, Commands::Analyze { text: None }));
}

#[test]
fn test_global_flags_after_subcommand() {
    let cli = Cli::try_parse_from([
        "commentguard",
        "analyze",
        "hi",
        "--format",
        "json",
        "--allow-partial",
        "-q",
    ])
    .unwrap();
    assert_eq!(cli.format, OutputFormat::Json);
    assert!(cli.allow_partial);
    assert!(cli.quiet);
}

#[test]
fn test_respond_defaults_to_casual() {
    let cli =
        Cli::try_parse_from(["commentguard", "respond", "Where is my order?", "-p", "gemini"])
            .unwrap();
    match cli.command {
        Commands::Respond {
            provider, tone, ..
        } => {
            assert_eq!(provider, ProviderId::Gemini);
            assert_eq!(tone, ResponseTone::Casual);
        }
        _ => panic!("expected respond"),
    }
}

#[test]
fn test_respond_accepts_legacy_provider_name() {
    let cli = Cli::try_parse_from([
        "commentguard",
        "respond",
        "hi",
        "--provider",
        "deepseek",
        "--tone",
        "Empathetic",
    ])
    .unwrap();
    match cli.command {
        Commands::Respond { provider, tone, .. } => {
            assert_eq!(provider, ProviderId::OpenRouter);
            assert_eq!(tone, ResponseTone::Empathetic);
        }
        _ => panic!("expected respond"),
    }
}

#[test]
fn test_respond_rejects_unknown_values() {
    assert!(Cli::try_parse_from(["commentguard", "respond", "hi", "-p", "claude"]).is_err());
    assert!(
        Cli::try_parse_from(["commentguard", "respond", "hi", "-p", "gemini", "-t", "snarky"])
            .is_err()
    );
    assert!(Cli::try_parse_from(["commentguard", "respond", "hi"]).is_err());
}

#[test]
fn test_config_subcommands() {
    let cli = Cli::try_parse_from(["commentguard", "config", "set", "gemini.model", "gemini-1.5-pro"])
        .unwrap();
    assert!(matches!(
        cli.command,
        Commands::Config {
            action: ConfigAction::Set { ref key, ref value }
        } if key == "gemini.model" && value == "gemini-1.5-pro"
    ));

    let cli = Cli::try_parse_from(["commentguard", "config", "path"]).unwrap();
    assert!(matches!(
        cli.command,
        Commands::Config {
            action: ConfigAction::Path
        }
    ));
}

#[test]
fn test_invalid_format_rejected() {
    assert!(Cli::try_parse_from(["commentguard", "--format", "yaml", "providers"]).is_err());
}
