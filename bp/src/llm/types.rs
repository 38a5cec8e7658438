//! Completion request/response types
//!
//! One request carries one rendered prompt. The model profile travels with
//! the request so the client never needs to know which caller it serves.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::LlmError;

/// Model selection and sampling settings for one class of calls
///
/// Question turns use a fast profile, breakdown generation a more capable one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelProfile {
    /// Model identifier sent to the completion service
    pub model: String,

    /// Sampling temperature
    pub temperature: f32,
}

impl ModelProfile {
    pub fn new(model: impl Into<String>, temperature: f32) -> Self {
        Self {
            model: model.into(),
            temperature,
        }
    }

    /// Profile for short question-generation turns
    pub fn fast() -> Self {
        Self::new("gpt-4o", 0.7)
    }

    /// Profile for breakdown generation
    pub fn capable() -> Self {
        Self::new("gpt-4", 0.7)
    }
}

impl Default for ModelProfile {
    fn default() -> Self {
        Self::fast()
    }
}

/// A completion request - everything needed for one call
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    /// Prompt text, sent verbatim as the single user message
    pub prompt: String,

    /// Model and temperature to use
    pub profile: ModelProfile,

    /// Max tokens for response; `None` uses the configured limit, which also caps it
    pub max_tokens: Option<u32>,
}

impl CompletionRequest {
    pub fn new(prompt: impl Into<String>, profile: &ModelProfile) -> Self {
        let prompt = prompt.into();
        debug!(prompt_len = prompt.len(), model = %profile.model, "CompletionRequest::new: called");
        Self {
            prompt,
            profile: profile.clone(),
            max_tokens: None,
        }
    }
}

/// Response from a completion request
#[derive(Debug, Clone)]
pub struct CompletionResponse {
    /// Raw text of the top completion choice
    pub content: String,

    /// Why the model stopped
    pub stop_reason: StopReason,

    /// Token usage for cost tracking
    pub usage: TokenUsage,
}

impl CompletionResponse {
    /// Plain end-of-turn response with no usage data
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            stop_reason: StopReason::EndTurn,
            usage: TokenUsage::default(),
        }
    }
}

/// Outcome of one completion call: the raw text or the reason it failed
pub type CompletionResult = Result<String, LlmError>;

/// Why the model stopped generating
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    EndTurn,
    MaxTokens,
    ContentFilter,
}

impl StopReason {
    /// Parse from an OpenAI `finish_reason` string
    pub fn from_openai(s: Option<&str>) -> Self {
        debug!(?s, "StopReason::from_openai: called");
        match s {
            Some("length") => StopReason::MaxTokens,
            Some("content_filter") => StopReason::ContentFilter,
            _ => StopReason::EndTurn,
        }
    }
}

/// Token usage statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

impl TokenUsage {
    pub fn total(&self) -> u64 {
        self.input_tokens + self.output_tokens
    }
}
