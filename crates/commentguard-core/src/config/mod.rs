//! Configuration management with file persistence
//!
//! API keys are never stored here; they come from the environment only.

use anyhow::{Context, anyhow};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::PathBuf;

use crate::orchestrator::InitPolicy;
use crate::providers::ProviderId;

/// CommentGuard configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub gemini: ProviderConfig,
    pub openrouter: ProviderConfig,
    pub orchestrator: OrchestratorConfig,
}

/// Per-provider settings
///
/// `model` and `base_url` fall back to the provider's defaults when unset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Read only so `validate` can reject it; never written back
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    pub analysis_timeout_secs: u64,
    pub response_timeout_secs: u64,
    pub analysis_temperature: f32,
    pub analysis_max_tokens: u32,
    pub response_temperature: f32,
    pub response_max_tokens: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    pub init_policy: InitPolicy,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            enabled: true,
            model: None,
            base_url: None,
            analysis_timeout_secs: 15,
            response_timeout_secs: 10,
            analysis_temperature: 0.3,
            analysis_max_tokens: 500,
            response_temperature: 0.5,
            response_max_tokens: 250,
        }
    }
}

impl ProviderConfig {
    pub fn model_or_default(&self, id: ProviderId) -> String {
        self.model
            .clone()
            .unwrap_or_else(|| id.default_model().to_string())
    }

    pub fn base_url_or_default(&self, id: ProviderId) -> String {
        self.base_url
            .clone()
            .unwrap_or_else(|| id.default_base_url().to_string())
    }

    pub fn enforce_env_only(&self) -> anyhow::Result<()> {
        if self.api_key.is_some() {
            return Err(anyhow!(
                "API keys must be provided via environment variables, not stored in configuration"
            ));
        }
        Ok(())
    }

    fn validate(&self, id: ProviderId) -> anyhow::Result<()> {
        self.enforce_env_only()?;
        check_timeout(id, "analysis_timeout_secs", self.analysis_timeout_secs)?;
        check_timeout(id, "response_timeout_secs", self.response_timeout_secs)?;
        check_temperature(id, "analysis_temperature", self.analysis_temperature)?;
        check_temperature(id, "response_temperature", self.response_temperature)?;
        if let Some(url) = &self.base_url {
            check_url(url)?;
        }
        Ok(())
    }
}

fn check_timeout(id: ProviderId, field: &str, secs: u64) -> anyhow::Result<()> {
    if secs == 0 {
        return Err(anyhow!("{}.{} must be at least 1 second", id, field));
    }
    Ok(())
}

fn check_temperature(id: ProviderId, field: &str, temp: f32) -> anyhow::Result<()> {
    if !(0.0..=2.0).contains(&temp) {
        return Err(anyhow!("{}.{} must be between 0.0 and 2.0", id, field));
    }
    Ok(())
}

fn check_url(url: &str) -> anyhow::Result<()> {
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(anyhow!("Base URL must start with http:// or https://: {}", url));
    }
    Ok(())
}

/// Read a provider's API key from the environment
///
/// Falls back to the `VITE_*` names used by the legacy web frontend.
pub fn env_api_key(id: ProviderId) -> Option<String> {
    [id.api_key_env(), id.legacy_api_key_env()]
        .into_iter()
        .filter_map(|name| env::var(name).ok())
        .find(|value| !value.trim().is_empty())
}

/// Show only the last four characters of a key
pub fn redact_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 4 {
        "***".to_string()
    } else {
        let suffix: String = chars[chars.len() - 4..].iter().collect();
        format!("***{}", suffix)
    }
}

const PROVIDER_FIELDS: &[&str] = &[
    "enabled",
    "model",
    "base_url",
    "analysis_timeout_secs",
    "response_timeout_secs",
    "analysis_temperature",
    "analysis_max_tokens",
    "response_temperature",
    "response_max_tokens",
    "api_key",
];

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> anyhow::Result<PathBuf> {
        let dir = if let Ok(custom_dir) = env::var("COMMENTGUARD_CONFIG_DIR") {
            PathBuf::from(custom_dir)
        } else {
            dirs::config_dir()
                .ok_or_else(|| anyhow!("Could not determine config directory"))?
                .join("commentguard")
        };
        Ok(dir)
    }

    /// Get the config file path
    pub fn config_path() -> anyhow::Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Load configuration from file, or defaults if it doesn't exist
    pub fn load() -> anyhow::Result<Self> {
        let path = Self::config_path()?;

        if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            let config = Self::from_toml(&contents)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml(contents: &str) -> anyhow::Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self) -> anyhow::Result<()> {
        self.validate()?;

        let dir = Self::config_dir()?;
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create config directory: {}", dir.display()))?;

        let path = Self::config_path()?;
        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(&path, contents)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        for &id in ProviderId::ALL {
            self.provider(id).validate(id)?;
        }
        Ok(())
    }

    pub fn provider(&self, id: ProviderId) -> &ProviderConfig {
        match id {
            ProviderId::Gemini => &self.gemini,
            ProviderId::OpenRouter => &self.openrouter,
        }
    }

    pub fn provider_mut(&mut self, id: ProviderId) -> &mut ProviderConfig {
        match id {
            ProviderId::Gemini => &mut self.gemini,
            ProviderId::OpenRouter => &mut self.openrouter,
        }
    }

    /// Providers with `enabled = true`, in submission order
    pub fn enabled_providers(&self) -> Vec<ProviderId> {
        ProviderId::ALL
            .iter()
            .copied()
            .filter(|&id| self.provider(id).enabled)
            .collect()
    }

    fn split_key(key: &str) -> anyhow::Result<(ProviderId, &str)> {
        let unknown = || {
            anyhow!(
                "Unknown configuration key: {}. Use `commentguard config list` to see available keys.",
                key
            )
        };
        let (section, field) = key.split_once('.').ok_or_else(unknown)?;
        let id: ProviderId = section.parse().map_err(|_| unknown())?;
        if !PROVIDER_FIELDS.contains(&field) {
            return Err(unknown());
        }
        Ok((id, field))
    }

    /// Get a configuration value by key
    pub fn get(&self, key: &str) -> anyhow::Result<String> {
        if key == "orchestrator.init_policy" {
            return Ok(self.orchestrator.init_policy.to_string());
        }

        let (id, field) = Self::split_key(key)?;
        let provider = self.provider(id);

        let value = match field {
            "enabled" => provider.enabled.to_string(),
            "model" => provider.model_or_default(id),
            "base_url" => provider.base_url_or_default(id),
            "analysis_timeout_secs" => provider.analysis_timeout_secs.to_string(),
            "response_timeout_secs" => provider.response_timeout_secs.to_string(),
            "analysis_temperature" => provider.analysis_temperature.to_string(),
            "analysis_max_tokens" => provider.analysis_max_tokens.to_string(),
            "response_temperature" => provider.response_temperature.to_string(),
            "response_max_tokens" => provider.response_max_tokens.to_string(),
            // API key (special handling - show redacted)
            _ => {
                provider.enforce_env_only()?;
                match env_api_key(id) {
                    Some(key) => redact_key(&key),
                    None => format!("(not set - use {} env var)", id.api_key_env()),
                }
            }
        };
        Ok(value)
    }

    /// Set a configuration value by key
    pub fn set(&mut self, key: &str, value: &str) -> anyhow::Result<()> {
        if key == "orchestrator.init_policy" {
            self.orchestrator.init_policy = value.parse()?;
            return Ok(());
        }

        let (id, field) = Self::split_key(key)?;
        let provider = self.provider_mut(id);

        match field {
            "enabled" => {
                provider.enabled = value
                    .parse()
                    .with_context(|| format!("Invalid boolean value: {}", value))?;
            }
            "model" => {
                let model = value.trim();
                if model.is_empty() {
                    return Err(anyhow!("Model name cannot be empty"));
                }
                provider.model = Some(model.to_string());
            }
            "base_url" => {
                check_url(value)?;
                provider.base_url = Some(value.trim_end_matches('/').to_string());
            }
            "analysis_timeout_secs" | "response_timeout_secs" => {
                let secs: u64 = value
                    .parse()
                    .with_context(|| format!("Invalid {} value: {}", field, value))?;
                check_timeout(id, field, secs)?;
                if field == "analysis_timeout_secs" {
                    provider.analysis_timeout_secs = secs;
                } else {
                    provider.response_timeout_secs = secs;
                }
            }
            "analysis_temperature" | "response_temperature" => {
                let temp: f32 = value
                    .parse()
                    .with_context(|| format!("Invalid temperature value: {}", value))?;
                check_temperature(id, field, temp)?;
                if field == "analysis_temperature" {
                    provider.analysis_temperature = temp;
                } else {
                    provider.response_temperature = temp;
                }
            }
            "analysis_max_tokens" | "response_max_tokens" => {
                let tokens: u32 = value
                    .parse()
                    .with_context(|| format!("Invalid {} value: {}", field, value))?;
                if tokens == 0 {
                    return Err(anyhow!("{}.{} must be positive", id, field));
                }
                if field == "analysis_max_tokens" {
                    provider.analysis_max_tokens = tokens;
                } else {
                    provider.response_max_tokens = tokens;
                }
            }
            // API key cannot be set via config
            _ => {
                return Err(anyhow!(
                    "API keys cannot be stored in configuration for security. \
                     Set the {} environment variable instead.",
                    id.api_key_env()
                ));
            }
        }
        Ok(())
    }

    /// All configuration keys, in display order
    pub fn keys() -> Vec<String> {
        ProviderId::ALL
            .iter()
            .flat_map(|id| {
                PROVIDER_FIELDS
                    .iter()
                    .map(move |field| format!("{}.{}", id, field))
            })
            .chain(std::iter::once("orchestrator.init_policy".to_string()))
            .collect()
    }

    /// List all configuration keys and their values
    pub fn list(&self) -> anyhow::Result<Vec<(String, String)>> {
        Self::keys()
            .into_iter()
            .map(|key| {
                let value = self.get(&key)?;
                Ok((key, value))
            })
            .collect()
    }

    /// Reset configuration to defaults
    pub fn reset() -> anyhow::Result<()> {
        let path = Self::config_path()?;
        if path.exists() {
            fs::remove_file(&path)
                .with_context(|| format!("Failed to remove config file: {}", path.display()))?;
        }
        Ok(())
    }
}
