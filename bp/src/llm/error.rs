//! LLM error types

use std::time::Duration;
use thiserror::Error;

/// Errors that can occur during a completion call
///
/// Every variant means the same thing to callers: the completion service was
/// unavailable for this request.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Rate limited, retry after {retry_after:?}")]
    RateLimited { retry_after: Duration },

    #[error("API error {status}: {message}")]
    ApiError { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Timeout after {0:?}")]
    Timeout(Duration),

    #[error("API key not found in environment variable {0}")]
    MissingApiKey(String),
}
