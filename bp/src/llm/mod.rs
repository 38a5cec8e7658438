//! Completion client module
//!
//! Wraps the external generative text service behind the [`LlmClient`] trait
//! and surfaces a typed success/failure result to the planning core.

use std::sync::Arc;

use tracing::{debug, warn};

pub mod client;
mod error;
mod openai;
mod types;

pub use client::LlmClient;
pub use error::LlmError;
pub use openai::OpenAIClient;
pub use types::{CompletionRequest, CompletionResponse, CompletionResult, ModelProfile, StopReason, TokenUsage};

use crate::config::LlmConfig;

/// Create an LLM client based on the provider specified in config
///
/// Only "openai" is supported.
pub fn create_client(config: &LlmConfig) -> Result<Arc<dyn LlmClient>, LlmError> {
    debug!(provider = %config.provider, "create_client: called");
    match config.provider.as_str() {
        "openai" => {
            debug!("create_client: creating OpenAI client");
            Ok(Arc::new(OpenAIClient::from_config(config)?))
        }
        other => {
            debug!(provider = %other, "create_client: unknown provider");
            Err(LlmError::InvalidResponse(format!(
                "Unknown LLM provider: '{}'. Supported: openai",
                other
            )))
        }
    }
}

/// Send one prompt with the given profile and return the raw reply text
pub async fn complete(llm: &Arc<dyn LlmClient>, prompt: String, profile: &ModelProfile) -> CompletionResult {
    debug!(prompt_len = prompt.len(), model = %profile.model, "complete: called");
    match llm.complete(CompletionRequest::new(prompt, profile)).await {
        Ok(response) => Ok(response.content),
        Err(e) => {
            warn!(error = %e, model = %profile.model, "complete: completion failed");
            Err(e)
        }
    }
}
