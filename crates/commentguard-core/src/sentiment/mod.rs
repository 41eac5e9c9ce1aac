//! Sentiment analysis model
//!
//! - `types`: validated result types shared by every provider
//! - `prompts`: instruction templates
//! - `extract`: brace-matched JSON extraction and schema validation

pub mod extract;
pub mod prompts;
mod types;

pub use extract::{extract_json_object, parse_sentiment};
pub use types::{
    AiResponse, PriorityLevel, ResponseTone, SentimentAnalysis, SentimentLabel, SentimentResult,
};
