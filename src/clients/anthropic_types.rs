//! Anthropic Messages API types
//!
//! Structs that mirror the request and response JSON of `POST /v1/messages`.

use serde::{Deserialize, Serialize};

/// Request body for the Messages API
#[derive(Serialize, Debug)]
pub struct MessagesRequest {
    /// Model name
    pub model: String,
    /// Upper bound on generated tokens
    pub max_tokens: u32,
    /// Conversation turns
    pub messages: Vec<Message>,
}

/// A single conversation turn
#[derive(Serialize, Debug)]
pub struct Message {
    /// `user` or `assistant`
    pub role: String,
    /// Plain-text content
    pub content: String,
}

/// Successful Messages API response
#[derive(Deserialize, Debug)]
pub struct MessagesResponse {
    /// Content blocks produced by the model
    pub content: Vec<ContentBlock>,
    /// Why the model stopped generating
    #[serde(default)]
    #[allow(dead_code)] // Part of API response format
    pub stop_reason: Option<String>,
}

/// One content block of a response
#[derive(Deserialize, Debug)]
pub struct ContentBlock {
    /// Block type, e.g. `text`
    #[serde(rename = "type")]
    pub block_type: String,
    /// Text for `text` blocks
    #[serde(default)]
    pub text: Option<String>,
}

/// Error envelope returned on non-2xx responses
#[derive(Deserialize, Debug)]
pub struct ErrorResponse {
    /// Error details
    pub error: ErrorDetail,
}

/// Error details
#[derive(Deserialize, Debug)]
pub struct ErrorDetail {
    /// Error category, e.g. `authentication_error`
    #[serde(rename = "type")]
    pub error_type: String,
    /// Human-readable message
    pub message: String,
}
