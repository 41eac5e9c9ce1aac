//! Sentiment value types
//!
//! These are produced fresh for every request and never mutated afterwards.
//! Construction validates the numeric ranges, so every value reachable from
//! outside this module satisfies them.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::providers::ProviderId;

/// Overall sentiment of a comment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentLabel {
    Positive,
    Neutral,
    Negative,
}

/// How urgently a comment needs attention
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriorityLevel {
    Low,
    Medium,
    High,
}

/// Tone of a customer-service reply
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseTone {
    Formal,
    #[default]
    Casual,
    Empathetic,
}

macro_rules! lowercase_enum {
    ($ty:ident, $what:literal, { $($variant:ident => $name:literal),+ $(,)? }) => {
        impl $ty {
            pub const fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $name),+
                }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = String;

            /// Case-insensitive, surrounding whitespace ignored
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_lowercase().as_str() {
                    $($name => Ok(Self::$variant),)+
                    other => Err(format!(
                        "invalid {} '{}' (expected one of: {})",
                        $what,
                        other,
                        [$($name),+].join(", ")
                    )),
                }
            }
        }
    };
}

lowercase_enum!(SentimentLabel, "label", {
    Positive => "positive",
    Neutral => "neutral",
    Negative => "negative",
});

lowercase_enum!(PriorityLevel, "priority_level", {
    Low => "low",
    Medium => "medium",
    High => "high",
});

lowercase_enum!(ResponseTone, "response_tone", {
    Formal => "formal",
    Casual => "casual",
    Empathetic => "empathetic",
});

fn check_unit_interval(field: &str, value: f64) -> Result<f64, String> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(format!("{} must be between 0 and 1, got {}", field, value))
    }
}

/// Detailed moderation signals for a comment
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SentimentAnalysis {
    toxicity: f64,
    spam_probability: f64,
    key_topics: Vec<String>,
    requires_human_review: bool,
    priority_level: PriorityLevel,
    response_tone: ResponseTone,
}

impl SentimentAnalysis {
    /// Create an analysis, rejecting probabilities outside [0, 1]
    pub fn new(
        toxicity: f64,
        spam_probability: f64,
        key_topics: Vec<String>,
        requires_human_review: bool,
        priority_level: PriorityLevel,
        response_tone: ResponseTone,
    ) -> Result<Self, String> {
        Ok(Self {
            toxicity: check_unit_interval("toxicity", toxicity)?,
            spam_probability: check_unit_interval("spam_probability", spam_probability)?,
            key_topics,
            requires_human_review,
            priority_level,
            response_tone,
        })
    }

    pub fn toxicity(&self) -> f64 {
        self.toxicity
    }

    pub fn spam_probability(&self) -> f64 {
        self.spam_probability
    }

    pub fn key_topics(&self) -> &[String] {
        &self.key_topics
    }

    pub fn requires_human_review(&self) -> bool {
        self.requires_human_review
    }

    pub fn priority_level(&self) -> PriorityLevel {
        self.priority_level
    }

    pub fn response_tone(&self) -> ResponseTone {
        self.response_tone
    }
}

/// Normalized sentiment reported by one provider
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SentimentResult {
    label: SentimentLabel,
    score: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<String>,
    suggested_response: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    analysis: Option<SentimentAnalysis>,
}

impl SentimentResult {
    /// Create a result, rejecting a score outside [0, 1]
    pub fn new(
        label: SentimentLabel,
        score: f64,
        suggested_response: impl Into<String>,
    ) -> Result<Self, String> {
        Ok(Self {
            label,
            score: check_unit_interval("score", score)?,
            summary: None,
            suggested_response: suggested_response.into(),
            analysis: None,
        })
    }

    /// Attach a summary
    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    /// Attach detailed analysis
    pub fn with_analysis(mut self, analysis: SentimentAnalysis) -> Self {
        self.analysis = Some(analysis);
        self
    }

    pub fn label(&self) -> SentimentLabel {
        self.label
    }

    pub fn score(&self) -> f64 {
        self.score
    }

    pub fn summary(&self) -> Option<&str> {
        self.summary.as_deref()
    }

    pub fn suggested_response(&self) -> &str {
        &self.suggested_response
    }

    pub fn analysis(&self) -> Option<&SentimentAnalysis> {
        self.analysis.as_ref()
    }

    /// Whether the provider flagged this comment for a human moderator
    pub fn requires_human_review(&self) -> bool {
        self.analysis
            .as_ref()
            .is_some_and(SentimentAnalysis::requires_human_review)
    }
}

/// A sentiment result tagged with the provider that produced it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AiResponse {
    pub model: ProviderId,
    pub sentiment: SentimentResult,
}

impl AiResponse {
    pub fn new(model: ProviderId, sentiment: SentimentResult) -> Self {
        Self { model, sentiment }
    }
}
