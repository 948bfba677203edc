//! HTTP clients for the portal's external collaborators
//!
//! One module per service. Every client shares the process-wide
//! `reqwest::Client` (connection pooling) and takes its base URL from
//! configuration so tests can point it at a mock server.

pub mod anthropic;
pub mod anthropic_types;
pub mod backend;
pub mod github;
pub mod mailchimp;

pub use anthropic::AnthropicClient;
pub use backend::BackendClient;
pub use github::GithubClient;
pub use mailchimp::MailchimpClient;

use crate::error::AppError;
use anyhow::anyhow;
use reqwest::Url;

/// User agent sent on every outbound request (GitHub rejects requests without one)
pub const USER_AGENT: &str = concat!("newsletter-portal/", env!("CARGO_PKG_VERSION"));

/// Build the shared HTTP client
pub fn build_http_client() -> Result<reqwest::Client, AppError> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| AppError::Internal(anyhow!("Failed to build HTTP client: {}", e)))
}

/// Join path segments onto a base URL, percent-encoding each segment
///
/// Newsletter identifiers are opaque, so they are always pushed as a single
/// segment and never interpreted.
pub fn endpoint(base_url: &str, segments: &[&str]) -> Result<Url, AppError> {
    let mut url = Url::parse(base_url)
        .map_err(|e| AppError::Internal(anyhow!("Invalid base URL {}: {}", base_url, e)))?;
    url.path_segments_mut()
        .map_err(|_| AppError::Internal(anyhow!("Base URL cannot take a path: {}", base_url)))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

/// Read an error body without failing the caller
async fn error_body(response: reqwest::Response) -> String {
    response
        .text()
        .await
        .unwrap_or_else(|_| "Unable to read error body".to_string())
}
