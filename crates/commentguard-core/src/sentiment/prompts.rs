//! Prompt templates
//!
//! Each provider gets a fixed instruction that embeds the comment verbatim.

use super::types::ResponseTone;
use crate::providers::PayloadShape;

/// System message sent with analysis requests that support one
pub const ANALYSIS_SYSTEM_PROMPT: &str =
    "You are an AI trained to analyze social media comments. Always respond with valid JSON.";

/// System message sent with reply requests that support one
pub const RESPONSE_SYSTEM_PROMPT: &str =
    "You are a customer service AI. Be concise and professional.";

const SENTIMENT_FIELDS: &str = r#""label": "positive" or "negative" or "neutral",
    "score": number between 0 and 1,
    "summary": "A 1-2 sentence summary highlighting sentiment, key topics, and urgency",
    "suggestedResponse": "an appropriate customer service response",
    "analysis": {
      "toxicity": number between 0 and 1,
      "spam_probability": number between 0 and 1,
      "key_topics": ["topic1", "topic2"],
      "requires_human_review": boolean,
      "priority_level": "low" or "medium" or "high",
      "response_tone": "formal" or "casual" or "empathetic"
    }"#;

const GUIDELINES: &str = "Guidelines:
- Provide a clear, concise summary that captures the main points and sentiment
- If the comment is negative or contains sensitive content, set requires_human_review to true
- Set priority_level based on urgency and sentiment
- List the key topics mentioned in the comment
- Choose response_tone based on the comment's context";

/// Build the sentiment analysis prompt for a payload shape
pub fn sentiment_prompt(text: &str, shape: PayloadShape) -> String {
    let schema = match shape {
        PayloadShape::Flat => format!("{{\n    {}\n}}", SENTIMENT_FIELDS),
        PayloadShape::Wrapped => format!(
            "{{\n  \"sentiment\": {{\n    {}\n  }}\n}}",
            SENTIMENT_FIELDS
        ),
    };

    format!(
        "Analyze this social media comment and provide a detailed response in the following JSON format:\n\
         {}\n\n\
         {}\n\n\
         Comment to analyze: \"{}\"",
        schema, GUIDELINES, text
    )
}

/// Build the custom reply prompt
///
/// `plain_text_hint` appends an explicit "no JSON" instruction for models
/// that default to structured output without a system message.
pub fn response_prompt(text: &str, tone: ResponseTone, plain_text_hint: bool) -> String {
    let mut prompt = format!(
        "Generate a customer service response to this social media comment.\n\
         Use a {} tone. The response should be professional, helpful, and align with social media best practices.\n\n\
         Comment: \"{}\"",
        tone, text
    );
    if plain_text_hint {
        prompt.push_str("\n\nReturn only the response text, no JSON formatting.");
    }
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flat_prompt_embeds_comment() {
        let prompt = sentiment_prompt("Love the new update!", PayloadShape::Flat);
        assert!(prompt.ends_with("Comment to analyze: \"Love the new update!\""));
        assert!(prompt.contains("\"suggestedResponse\""));
        assert!(!prompt.contains("\"sentiment\""));
    }

    #[test]
    fn test_wrapped_prompt_nests_fields() {
        let prompt = sentiment_prompt("meh", PayloadShape::Wrapped);
        let wrapper = prompt.find("\"sentiment\"").unwrap();
        let label = prompt.find("\"label\"").unwrap();
        assert!(wrapper < label);
    }

    #[test]
    fn test_response_prompt_tone_and_hint() {
        let prompt = response_prompt("Where is my order?", ResponseTone::Empathetic, true);
        assert!(prompt.contains("Use a empathetic tone."));
        assert!(prompt.contains("Comment: \"Where is my order?\""));
        assert!(prompt.ends_with("no JSON formatting."));

        let prompt = response_prompt("hi", ResponseTone::Formal, false);
        assert!(!prompt.contains("no JSON formatting"));
    }
}
