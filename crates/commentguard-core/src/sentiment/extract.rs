//! JSON extraction from free-form model output
//!
//! Models are asked for JSON but routinely wrap it in prose ("Sure! Here is
//! the analysis: {...} Let me know if..."). We isolate the first balanced
//! `{...}` span by tracking nesting depth, then parse and validate it
//! against the sentiment schema. Matching greedily up to the last `}` is
//! wrong as soon as trailing prose contains its own braces.

use serde::Deserialize;
use serde_json::Value;

use super::types::{
    PriorityLevel, ResponseTone, SentimentAnalysis, SentimentLabel, SentimentResult,
};
use crate::providers::PayloadShape;

/// Return the first balanced `{...}` span in `text`
///
/// Scanning starts at the first `{`; depth goes up on `{` and down on `}`
/// and the span ends where depth returns to zero. Braces inside JSON string
/// literals are skipped (honoring backslash escapes). Returns `None` when
/// there is no `{` or the object never closes.
pub fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }

        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    let end = start + offset + ch.len_utf8();
                    return Some(&text[start..end]);
                }
            }
            _ => {}
        }
    }

    None
}

#[derive(Debug, Deserialize)]
struct RawSentiment {
    label: String,
    score: f64,
    #[serde(default)]
    summary: Option<String>,
    #[serde(rename = "suggestedResponse", alias = "suggested_response")]
    suggested_response: String,
    #[serde(default)]
    analysis: Option<RawAnalysis>,
}

#[derive(Debug, Deserialize)]
struct RawAnalysis {
    toxicity: f64,
    #[serde(alias = "spamProbability")]
    spam_probability: f64,
    #[serde(alias = "keyTopics")]
    key_topics: Vec<String>,
    #[serde(alias = "requiresHumanReview")]
    requires_human_review: bool,
    #[serde(alias = "priorityLevel")]
    priority_level: String,
    #[serde(alias = "responseTone")]
    response_tone: String,
}

impl RawAnalysis {
    fn validate(self) -> Result<SentimentAnalysis, String> {
        let priority: PriorityLevel = self.priority_level.parse()?;
        let tone: ResponseTone = self.response_tone.parse()?;
        SentimentAnalysis::new(
            self.toxicity,
            self.spam_probability,
            self.key_topics,
            self.requires_human_review,
            priority,
            tone,
        )
    }
}

impl RawSentiment {
    fn validate(self) -> Result<SentimentResult, String> {
        let label: SentimentLabel = self.label.parse()?;
        let mut result = SentimentResult::new(label, self.score, self.suggested_response)?;

        if let Some(summary) = self.summary.filter(|s| !s.trim().is_empty()) {
            result = result.with_summary(summary);
        }
        if let Some(analysis) = self.analysis {
            result = result.with_analysis(analysis.validate()?);
        }

        Ok(result)
    }
}

/// Extract, parse and validate a sentiment object from raw model output
///
/// The error string explains what was wrong; callers wrap it into a
/// provider-tagged `MalformedResponse`.
pub fn parse_sentiment(text: &str, shape: PayloadShape) -> Result<SentimentResult, String> {
    let candidate =
        extract_json_object(text).ok_or_else(|| "no JSON object found in response".to_string())?;

    let value: Value =
        serde_json::from_str(candidate).map_err(|e| format!("invalid JSON: {}", e))?;

    let payload = match shape {
        PayloadShape::Flat => value,
        PayloadShape::Wrapped => match value {
            Value::Object(mut map) => map
                .remove("sentiment")
                .ok_or_else(|| "response missing sentiment data".to_string())?,
            _ => return Err("response is not a JSON object".to_string()),
        },
    };

    let raw: RawSentiment =
        serde_json::from_value(payload).map_err(|e| format!("unexpected shape: {}", e))?;

    raw.validate()
}
