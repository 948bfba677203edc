//! GitHub contents API client
//!
//! Saving a newsletter writes one file through the contents API. Updating an
//! existing file requires its current blob sha, so a save is a lookup followed
//! by a `PUT`.

use super::{endpoint, error_body, USER_AGENT};
use crate::config::{GithubConfig, Secret};
use crate::error::AppError;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::{RequestBuilder, StatusCode, Url};
use serde::{Deserialize, Serialize};

const SERVICE: &str = "GitHub";

#[derive(Deserialize, Debug)]
struct ContentsResponse {
    sha: String,
}

#[derive(Serialize, Debug)]
struct PutContentsRequest<'a> {
    message: &'a str,
    content: String,
    branch: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<String>,
}

#[derive(Deserialize, Debug)]
struct PutContentsResponse {
    commit: CommitInfo,
}

#[derive(Deserialize, Debug)]
struct CommitInfo {
    sha: String,
}

#[derive(Deserialize, Debug)]
struct ApiError {
    #[serde(default)]
    message: Option<String>,
}

/// Client for one repository's contents API
#[derive(Debug, Clone)]
pub struct GithubClient {
    http: reqwest::Client,
    base_url: String,
    token: Secret,
    repo: String,
    branch: String,
}

impl GithubClient {
    /// Create a client from configuration
    pub fn new(http: reqwest::Client, config: &GithubConfig) -> Self {
        Self {
            http,
            base_url: config.base_url.clone(),
            token: config.token.clone(),
            repo: config.repo.clone(),
            branch: config.branch.clone(),
        }
    }

    fn contents_url(&self, path: &str) -> Result<Url, AppError> {
        let mut segments = vec!["repos"];
        segments.extend(self.repo.split('/').filter(|s| !s.is_empty()));
        segments.push("contents");
        segments.extend(path.split('/').filter(|s| !s.is_empty()));
        endpoint(&self.base_url, &segments)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .bearer_auth(self.token.expose())
            .header("accept", "application/vnd.github.v3+json")
            .header("user-agent", USER_AGENT)
    }

    /// Current blob sha of `path`, or `None` if the file does not exist yet
    pub async fn file_sha(&self, path: &str) -> Result<Option<String>, AppError> {
        let url = self.contents_url(path)?;
        let response = self
            .authorized(self.http.get(url).query(&[("ref", self.branch.as_str())]))
            .send()
            .await
            .map_err(|e| AppError::upstream(SERVICE, e.to_string()))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(api_error(status, error_body(response).await));
        }

        let contents: ContentsResponse = response
            .json()
            .await
            .map_err(|e| AppError::upstream(SERVICE, format!("Invalid contents response: {}", e)))?;
        Ok(Some(contents.sha))
    }

    /// Create or update `path` with `content`; returns the commit sha
    pub async fn commit_file(
        &self,
        path: &str,
        content: &str,
        message: &str,
    ) -> Result<String, AppError> {
        let sha = self.file_sha(path).await?;
        let request = PutContentsRequest {
            message,
            content: STANDARD.encode(content.as_bytes()),
            branch: &self.branch,
            sha,
        };

        let url = self.contents_url(path)?;
        let response = self
            .authorized(self.http.put(url))
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::upstream(SERVICE, e.to_string()))?;

        let status = response.status();
        if status != StatusCode::OK && status != StatusCode::CREATED {
            return Err(api_error(status, error_body(response).await));
        }

        let parsed: PutContentsResponse = response
            .json()
            .await
            .map_err(|e| AppError::upstream(SERVICE, format!("Invalid commit response: {}", e)))?;

        tracing::info!(path = %path, commit_sha = %parsed.commit.sha, "Committed newsletter");
        Ok(parsed.commit.sha)
    }
}

fn api_error(status: StatusCode, body: String) -> AppError {
    tracing::error!(status_code = status.as_u16(), error_body = %body, "GitHub returned error status");
    let message = serde_json::from_str::<ApiError>(&body)
        .ok()
        .and_then(|e| e.message)
        .unwrap_or_else(|| "Unknown error".to_string());
    AppError::upstream(SERVICE, message)
}
