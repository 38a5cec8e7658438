//! OpenAI API client implementation
//!
//! Implements the LlmClient trait for OpenAI's Chat Completions API. The
//! prompt is sent as a single user message; the reply is the text of the
//! first choice.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

use super::{CompletionRequest, CompletionResponse, LlmClient, LlmError, StopReason, TokenUsage};
use crate::config::LlmConfig;

/// OpenAI API client
pub struct OpenAIClient {
    api_key: String,
    base_url: String,
    http: Client,
    max_tokens: u32,
    timeout: Duration,
}

impl OpenAIClient {
    /// Create a new client from configuration
    ///
    /// Reads the API key from the environment variable named in the config.
    pub fn from_config(config: &LlmConfig) -> Result<Self, LlmError> {
        debug!(base_url = %config.base_url, api_key_env = %config.api_key_env, "from_config: called");
        let api_key = config
            .get_api_key()
            .ok_or_else(|| LlmError::MissingApiKey(config.api_key_env.clone()))?;

        let timeout = Duration::from_millis(config.timeout_ms);

        let http = Client::builder().timeout(timeout).build().map_err(LlmError::Network)?;

        Ok(Self {
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            http,
            max_tokens: config.max_tokens,
            timeout,
        })
    }

    /// Build the request body for the OpenAI API
    fn build_request_body(&self, request: &CompletionRequest) -> serde_json::Value {
        let model = &request.profile.model;
        debug!(%model, max_tokens = ?request.max_tokens, "build_request_body: called");

        let max_tokens = request.max_tokens.map_or(self.max_tokens, |n| n.min(self.max_tokens));

        // GPT-5.x and o1/o3 models use max_completion_tokens instead of max_tokens
        let uses_completion_tokens = model.starts_with("gpt-5") || model.starts_with("o1") || model.starts_with("o3");

        let mut body = serde_json::json!({
            "model": model,
            "messages": [{
                "role": "user",
                "content": request.prompt,
            }],
            "temperature": request.profile.temperature,
        });

        if uses_completion_tokens {
            body["max_completion_tokens"] = serde_json::json!(max_tokens);
        } else {
            body["max_tokens"] = serde_json::json!(max_tokens);
        }

        body
    }

    /// Parse the raw response body into a completion
    ///
    /// An envelope without a first choice carrying message content is treated
    /// the same as a transport failure.
    fn parse_response(&self, body: &str) -> Result<CompletionResponse, LlmError> {
        debug!(body_len = body.len(), "parse_response: called");
        let api_response: OpenAIResponse = serde_json::from_str(body)
            .map_err(|e| LlmError::InvalidResponse(format!("Malformed completion envelope: {}", e)))?;

        let choice = api_response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::InvalidResponse("Completion envelope has no choices".to_string()))?;

        let message = choice
            .message
            .ok_or_else(|| LlmError::InvalidResponse("Completion choice has no message".to_string()))?;

        let content = message
            .content
            .ok_or_else(|| LlmError::InvalidResponse("Completion message has no content".to_string()))?;

        let stop_reason = StopReason::from_openai(choice.finish_reason.as_deref());
        if stop_reason == StopReason::MaxTokens {
            warn!("parse_response: completion truncated at max tokens");
        }

        let usage = api_response
            .usage
            .map(|u| TokenUsage {
                input_tokens: u.prompt_tokens,
                output_tokens: u.completion_tokens,
            })
            .unwrap_or_default();

        Ok(CompletionResponse {
            content,
            stop_reason,
            usage,
        })
    }
}

#[async_trait]
impl LlmClient for OpenAIClient {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        debug!(model = %request.profile.model, max_tokens = ?request.max_tokens, "complete: called");
        let url = format!("{}/v1/chat/completions", self.base_url);
        let body = self.build_request_body(&request);

        let response = self
            .http
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LlmError::Timeout(self.timeout)
                } else {
                    LlmError::Network(e)
                }
            })?;

        let status = response.status().as_u16();

        if status == 429 {
            debug!("complete: rate limited (429)");
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(60);

            return Err(LlmError::RateLimited {
                retry_after: Duration::from_secs(retry_after),
            });
        }

        if !response.status().is_success() {
            debug!(%status, "complete: API error");
            let text = response.text().await.unwrap_or_default();
            return Err(LlmError::ApiError { status, message: text });
        }

        let text = response.text().await?;
        let completion = self.parse_response(&text)?;
        debug!(
            content_len = completion.content.len(),
            total_tokens = completion.usage.total(),
            "complete: success"
        );
        Ok(completion)
    }
}

// OpenAI API response types. Every level is optional so a partial envelope
// surfaces as InvalidResponse rather than a decode panic further up.

#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    #[serde(default)]
    choices: Vec<OpenAIChoice>,
    usage: Option<OpenAIUsage>,
}

#[derive(Debug, Deserialize)]
struct OpenAIChoice {
    message: Option<OpenAIMessage>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAIMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAIUsage {
    prompt_tokens: u64,
    completion_tokens: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::ModelProfile;

    fn test_client(max_tokens: u32) -> OpenAIClient {
        OpenAIClient {
            api_key: "test-key".to_string(),
            base_url: "https://api.openai.com".to_string(),
            http: Client::new(),
            max_tokens,
            timeout: Duration::from_secs(300),
        }
    }

    #[test]
    fn test_build_request_body_basic() {
        let client = test_client(8192);
        let mut request = CompletionRequest::new("Next question:", &ModelProfile::new("gpt-4o", 0.7));
        request.max_tokens = Some(1000);

        let body = client.build_request_body(&request);

        assert_eq!(body["model"], "gpt-4o");
        assert_eq!(body["max_tokens"], 1000);
        assert_eq!(body["messages"].as_array().map(|m| m.len()), Some(1));
        assert_eq!(body["messages"][0]["role"], "user");
        assert_eq!(body["messages"][0]["content"], "Next question:");
        assert!((body["temperature"].as_f64().unwrap() - 0.7).abs() < 1e-6);
    }

    #[test]
    fn test_max_tokens_capped() {
        let client = test_client(1000);
        let mut request = CompletionRequest::new("Test", &ModelProfile::capable());
        request.max_tokens = Some(5000);

        let body = client.build_request_body(&request);
        assert_eq!(body["max_tokens"], 1000);
    }

    #[test]
    fn test_configured_limit_used_by_default() {
        let client = test_client(8192);
        let request = CompletionRequest::new("Test", &ModelProfile::capable());

        let body = client.build_request_body(&request);
        assert_eq!(body["max_tokens"], 8192);
    }

    #[test]
    fn test_completion_tokens_for_reasoning_models() {
        let client = test_client(1000);
        let request = CompletionRequest::new("Test", &ModelProfile::new("o3-mini", 1.0));

        let body = client.build_request_body(&request);
        assert_eq!(body["max_completion_tokens"], 1000);
        assert!(body.get("max_tokens").is_none());
    }

    #[test]
    fn test_parse_response_success() {
        let client = test_client(1000);
        let body = r#"{
            "choices": [{"message": {"role": "assistant", "content": "DONE"}, "finish_reason": "stop"}],
            "usage": {"prompt_tokens": 12, "completion_tokens": 1}
        }"#;

        let resp = client.parse_response(body).unwrap();
        assert_eq!(resp.content, "DONE");
        assert_eq!(resp.stop_reason, StopReason::EndTurn);
        assert_eq!(resp.usage.total(), 13);
    }

    #[test]
    fn test_parse_response_missing_choices() {
        let client = test_client(1000);
        let err = client.parse_response(r#"{"error": {"message": "quota"}}"#).unwrap_err();
        assert!(matches!(err, LlmError::InvalidResponse(_)));
    }

    #[test]
    fn test_parse_response_missing_message() {
        let client = test_client(1000);
        let err = client.parse_response(r#"{"choices": [{"finish_reason": "stop"}]}"#).unwrap_err();
        assert!(matches!(err, LlmError::InvalidResponse(_)));
    }

    #[test]
    fn test_parse_response_not_json() {
        let client = test_client(1000);
        let err = client.parse_response("<html>Bad Gateway</html>").unwrap_err();
        assert!(matches!(err, LlmError::InvalidResponse(_)));
    }
}
