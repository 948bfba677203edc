//! Anthropic API client
//!
//! Used for editorial review: the newsletter text goes in as a single user
//! message and the first text block of the answer comes back as feedback.

use super::{endpoint, error_body};
use crate::clients::anthropic_types::{ErrorResponse, Message, MessagesRequest, MessagesResponse};
use crate::config::{AnthropicConfig, Secret};
use crate::error::AppError;

const SERVICE: &str = "AI review";
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Maximum tokens requested for a review
pub const REVIEW_MAX_TOKENS: u32 = 1024;

/// Client for the Anthropic Messages API
#[derive(Debug, Clone)]
pub struct AnthropicClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Secret,
    model: String,
}

impl AnthropicClient {
    /// Create a client from configuration
    pub fn new(http: reqwest::Client, config: &AnthropicConfig) -> Self {
        Self {
            http,
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
        }
    }

    /// Send a single-turn prompt and return the model's text
    ///
    /// # Errors
    /// * `Upstream` if the request fails, the API returns an error status,
    ///   or the response holds no text block.
    pub async fn complete(&self, prompt: &str) -> Result<String, AppError> {
        let url = endpoint(&self.base_url, &["v1", "messages"])?;
        let request = MessagesRequest {
            model: self.model.clone(),
            max_tokens: REVIEW_MAX_TOKENS,
            messages: vec![Message {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
        };

        tracing::debug!(model = %self.model, prompt_len = prompt.len(), "Calling Anthropic API");

        let response = self
            .http
            .post(url)
            .header("x-api-key", self.api_key.expose())
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::upstream(SERVICE, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = error_body(response).await;
            tracing::error!(status_code = status.as_u16(), error_body = %body, "Anthropic API returned error status");
            let message = serde_json::from_str::<ErrorResponse>(&body)
                .map(|e| format!("{}: {}", e.error.error_type, e.error.message))
                .unwrap_or(body);
            return Err(AppError::upstream(
                SERVICE,
                format!("HTTP {}: {}", status.as_u16(), message),
            ));
        }

        let parsed: MessagesResponse = response
            .json()
            .await
            .map_err(|e| AppError::upstream(SERVICE, format!("Failed to parse response: {}", e)))?;

        let text = parsed
            .content
            .into_iter()
            .find(|block| block.block_type == "text")
            .and_then(|block| block.text)
            .filter(|text| !text.is_empty())
            .ok_or_else(|| AppError::upstream(SERVICE, "Response contains no text"))?;

        tracing::debug!(response_len = text.len(), "Received review from Anthropic API");
        Ok(text)
    }
}
