//! Newsletter generation backend client
//!
//! The backend owns newsletter storage. The portal asks it to generate new
//! issues, list existing ones and return the HTML body of a single issue.

use super::{endpoint, error_body};
use crate::error::AppError;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

/// Response body of `POST /api/generate`
#[derive(Deserialize, Debug)]
pub struct GenerateApiResponse {
    /// Whether generation succeeded
    #[serde(default)]
    pub success: bool,
    /// Backend-issued identifier
    #[serde(default)]
    pub newsletter_id: Option<String>,
    /// Generated HTML
    #[serde(default)]
    pub html: String,
    /// Seconds spent generating content
    #[serde(default)]
    pub generation_time_seconds: f64,
    /// Seconds spent end to end
    #[serde(default)]
    pub total_time_seconds: f64,
    /// Failure reason when `success` is false
    #[serde(default)]
    pub error: Option<String>,
}

/// Response body of `GET /api/newsletters`
#[derive(Deserialize, Debug)]
pub struct ListApiResponse {
    /// Whether listing succeeded
    #[serde(default)]
    pub success: bool,
    /// Newsletters known to the backend
    #[serde(default)]
    pub newsletters: Vec<NewsletterSummary>,
    /// Failure reason when `success` is false
    #[serde(default)]
    pub error: Option<String>,
}

/// One row of the backend's newsletter listing
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct NewsletterSummary {
    /// Backend-issued identifier
    #[serde(alias = "newsletter_id", alias = "filename")]
    pub id: String,
    /// Display title, if the backend provides one
    #[serde(default)]
    pub title: Option<String>,
    /// Creation time as reported by the backend
    #[serde(default, alias = "created")]
    pub created_at: Option<String>,
}

/// Client for the generation backend
#[derive(Debug, Clone)]
pub struct BackendClient {
    http: reqwest::Client,
    base_url: String,
}

impl BackendClient {
    /// Create a client for the backend at `base_url`
    pub fn new(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }

    /// Base URL this client talks to
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Ask the backend to generate a new newsletter
    ///
    /// # Errors
    /// * `BackendUnreachable` if the request could not be sent
    /// * `BackendFailure` on a non-2xx status, an unreadable body or `success: false`
    pub async fn generate(&self) -> Result<GenerateApiResponse, AppError> {
        let url = endpoint(&self.base_url, &["api", "generate"])?;
        tracing::debug!(url = %url, "Requesting newsletter generation");

        let response = self
            .http
            .post(url)
            .json(&serde_json::json!({}))
            .send()
            .await
            .map_err(|e| AppError::BackendUnreachable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = error_body(response).await;
            tracing::error!(status_code = status.as_u16(), error_body = %body, "Generation call failed");
            return Err(AppError::BackendFailure(format!(
                "API call failed with status {}: {}",
                status.as_u16(),
                body
            )));
        }

        let parsed: GenerateApiResponse = response
            .json()
            .await
            .map_err(|e| AppError::BackendFailure(format!("Invalid generation response: {}", e)))?;

        if !parsed.success {
            return Err(AppError::BackendFailure(
                parsed
                    .error
                    .unwrap_or_else(|| "Unknown error".to_string()),
            ));
        }

        Ok(parsed)
    }

    /// List the newsletters the backend knows about
    pub async fn list_newsletters(&self) -> Result<Vec<NewsletterSummary>, AppError> {
        let url = endpoint(&self.base_url, &["api", "newsletters"])?;

        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| AppError::BackendUnreachable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = error_body(response).await;
            return Err(AppError::BackendFailure(format!(
                "Listing failed with status {}: {}",
                status.as_u16(),
                body
            )));
        }

        let parsed: ListApiResponse = response
            .json()
            .await
            .map_err(|e| AppError::BackendFailure(format!("Invalid listing response: {}", e)))?;

        if !parsed.success {
            return Err(AppError::BackendFailure(
                parsed
                    .error
                    .unwrap_or_else(|| "Unknown error".to_string()),
            ));
        }

        tracing::debug!(count = parsed.newsletters.len(), "Fetched newsletter listing");
        Ok(parsed.newsletters)
    }

    /// Fetch the HTML body of one newsletter
    ///
    /// # Errors
    /// * `NewsletterNotFound` when the backend answers 404
    pub async fn fetch_content(&self, newsletter_id: &str) -> Result<String, AppError> {
        let url = endpoint(&self.base_url, &["newsletter", newsletter_id])?;

        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| AppError::BackendUnreachable(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(AppError::NewsletterNotFound(newsletter_id.to_string()));
        }
        if !status.is_success() {
            let body = error_body(response).await;
            return Err(AppError::BackendFailure(format!(
                "Fetching {} failed with status {}: {}",
                newsletter_id,
                status.as_u16(),
                body
            )));
        }

        let content = response
            .text()
            .await
            .map_err(|e| AppError::BackendFailure(format!("Unreadable newsletter body: {}", e)))?;

        tracing::debug!(newsletter_id = %newsletter_id, content_len = content.len(), "Fetched newsletter content");
        Ok(content)
    }

    /// Probe `GET /health`; returns the status code the backend answered with
    pub async fn health(&self) -> Result<u16, AppError> {
        let url = endpoint(&self.base_url, &["health"])?;
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| AppError::BackendUnreachable(e.to_string()))?;
        Ok(response.status().as_u16())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Server;

    #[tokio::test]
    async fn test_generate_success() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/api/generate")
            .match_header("content-type", "application/json")
            .with_status(200)
            .with_body(
                r#"{"success": true, "newsletter_id": "nl-42", "html": "<p>Hi</p>",
                    "generation_time_seconds": 12.5, "total_time_seconds": 14.0}"#,
            )
            .create_async()
            .await;

        let client = BackendClient::new(reqwest::Client::new(), server.url());
        let result = client.generate().await.unwrap();

        mock.assert_async().await;
        assert_eq!(result.newsletter_id.as_deref(), Some("nl-42"));
        assert_eq!(result.html, "<p>Hi</p>");
        assert_eq!(result.generation_time_seconds, 12.5);
    }

    #[tokio::test]
    async fn test_generate_reports_backend_failure_flag() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/api/generate")
            .with_status(200)
            .with_body(r#"{"success": false, "error": "no market data"}"#)
            .create_async()
            .await;

        let client = BackendClient::new(reqwest::Client::new(), server.url());
        match client.generate().await {
            Err(AppError::BackendFailure(msg)) => assert_eq!(msg, "no market data"),
            other => panic!("Expected BackendFailure, got: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_generate_non_success_status() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/api/generate")
            .with_status(500)
            .with_body("boom")
            .create_async()
            .await;

        let client = BackendClient::new(reqwest::Client::new(), server.url());
        let err = client.generate().await.unwrap_err();
        assert!(matches!(err, AppError::BackendFailure(_)));
        assert!(err.to_string().contains("500"));
    }

    #[tokio::test]
    async fn test_generate_unreachable() {
        // Port 9 (discard) is not expected to accept HTTP connections
        let client = BackendClient::new(reqwest::Client::new(), "http://127.0.0.1:9");
        let err = client.generate().await.unwrap_err();
        assert!(matches!(err, AppError::BackendUnreachable(_)));
    }

    #[tokio::test]
    async fn test_fetch_content_not_found() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/newsletter/missing.html")
            .with_status(404)
            .create_async()
            .await;

        let client = BackendClient::new(reqwest::Client::new(), server.url());
        let err = client.fetch_content("missing.html").await.unwrap_err();
        assert!(matches!(err, AppError::NewsletterNotFound(id) if id == "missing.html"));
    }

    #[tokio::test]
    async fn test_fetch_content_returns_raw_body() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/newsletter/nl-42")
            .with_status(200)
            .with_body("<html><body><p>Hi</p></body></html>")
            .create_async()
            .await;

        let client = BackendClient::new(reqwest::Client::new(), server.url());
        let content = client.fetch_content("nl-42").await.unwrap();
        assert_eq!(content, "<html><body><p>Hi</p></body></html>");
    }

    #[tokio::test]
    async fn test_list_newsletters_accepts_aliases() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/api/newsletters")
            .with_status(200)
            .with_body(
                r#"{"success": true, "newsletters": [
                    {"newsletter_id": "nl-1", "title": "Monday", "created_at": "2024-05-01"},
                    {"filename": "nl-2.html", "created": "2024-05-02"}
                ]}"#,
            )
            .create_async()
            .await;

        let client = BackendClient::new(reqwest::Client::new(), server.url());
        let list = client.list_newsletters().await.unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].id, "nl-1");
        assert_eq!(list[0].title.as_deref(), Some("Monday"));
        assert_eq!(list[1].id, "nl-2.html");
        assert_eq!(list[1].created_at.as_deref(), Some("2024-05-02"));
    }
}
