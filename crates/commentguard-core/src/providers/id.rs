//! Provider identity
//!
//! Single source of truth for the supported providers and their defaults.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Which hosted model produced a result
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderId {
    /// Google Gemini (generateContent API)
    Gemini,
    /// OpenRouter (OpenAI-compatible chat completions)
    #[serde(alias = "deepseek")]
    OpenRouter,
}

/// Shape of the JSON object a provider is asked to return
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadShape {
    /// Sentiment fields at the top level
    Flat,
    /// Sentiment fields nested under a `sentiment` key
    Wrapped,
}

impl ProviderId {
    /// All providers, in submission order
    pub const ALL: &'static [ProviderId] = &[ProviderId::Gemini, ProviderId::OpenRouter];

    /// Name as used in config files and on the command line
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Gemini => "gemini",
            Self::OpenRouter => "openrouter",
        }
    }

    /// Human-readable name for messages
    pub const fn display_name(&self) -> &'static str {
        match self {
            Self::Gemini => "Gemini",
            Self::OpenRouter => "OpenRouter",
        }
    }

    /// Environment variable holding the API key
    pub const fn api_key_env(&self) -> &'static str {
        match self {
            Self::Gemini => "GEMINI_API_KEY",
            Self::OpenRouter => "OPENROUTER_API_KEY",
        }
    }

    /// Fallback environment variable used by the legacy web frontend
    pub const fn legacy_api_key_env(&self) -> &'static str {
        match self {
            Self::Gemini => "VITE_GEMINI_API_KEY",
            Self::OpenRouter => "VITE_OPENROUTER_API_KEY",
        }
    }

    pub const fn default_model(&self) -> &'static str {
        match self {
            Self::Gemini => "gemini-pro",
            Self::OpenRouter => "mistralai/mistral-7b-instruct",
        }
    }

    pub const fn default_base_url(&self) -> &'static str {
        match self {
            Self::Gemini => "https://generativelanguage.googleapis.com/v1beta",
            Self::OpenRouter => "https://openrouter.ai/api/v1",
        }
    }

    pub const fn payload_shape(&self) -> PayloadShape {
        match self {
            Self::Gemini => PayloadShape::Flat,
            Self::OpenRouter => PayloadShape::Wrapped,
        }
    }

    /// All provider names as strings
    pub fn all_names() -> Vec<&'static str> {
        Self::ALL.iter().map(Self::name).collect()
    }
}

impl FromStr for ProviderId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        // The legacy frontend called the OpenRouter integration "deepseek"
        let normalized = if lower == "deepseek" {
            "openrouter"
        } else {
            lower.as_str()
        };

        Self::ALL
            .iter()
            .find(|p| p.name() == normalized)
            .copied()
            .ok_or_else(|| Error::UnknownProvider(s.to_string()))
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
