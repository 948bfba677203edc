//! Mailchimp Marketing API client
//!
//! Sending a newsletter is a three-step exchange: create a regular campaign
//! for the configured audience, attach the HTML, then trigger either a test
//! email or the real send.

use super::{endpoint, error_body};
use crate::config::{MailchimpConfig, Secret};
use crate::error::AppError;
use chrono::{DateTime, TimeZone};
use serde::{Deserialize, Serialize};

const SERVICE: &str = "Mailchimp";

/// Request body for `POST /campaigns`
#[derive(Serialize, Debug, PartialEq)]
pub struct CampaignRequest {
    /// Campaign type, always `regular`
    #[serde(rename = "type")]
    pub campaign_type: String,
    /// Audience the campaign goes to
    pub recipients: Recipients,
    /// Subject, title and sender settings
    pub settings: CampaignSettings,
}

/// Campaign recipients
#[derive(Serialize, Debug, PartialEq)]
pub struct Recipients {
    /// Audience (list) id
    pub list_id: String,
}

/// Campaign settings
#[derive(Serialize, Debug, PartialEq)]
pub struct CampaignSettings {
    /// Email subject line
    pub subject_line: String,
    /// Internal campaign title
    pub title: String,
    /// Sender display name
    pub from_name: String,
    /// Reply-to address
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<String>,
}

impl CampaignRequest {
    /// Build a regular campaign dated `now`
    pub fn regular<Tz: TimeZone>(config: &MailchimpConfig, now: &DateTime<Tz>) -> Self
    where
        Tz::Offset: std::fmt::Display,
    {
        Self {
            campaign_type: "regular".to_string(),
            recipients: Recipients {
                list_id: config.list_id.clone(),
            },
            settings: CampaignSettings {
                subject_line: format!("{} - {}", config.from_name, now.format("%B %d, %Y")),
                title: format!("{} {}", config.from_name, now.format("%Y-%m-%d")),
                from_name: config.from_name.clone(),
                reply_to: config.reply_to.clone(),
            },
        }
    }
}

#[derive(Serialize)]
struct ContentRequest<'a> {
    html: &'a str,
}

#[derive(Serialize)]
struct TestEmailRequest<'a> {
    test_emails: &'a [String],
    send_type: &'static str,
}

#[derive(Deserialize, Debug)]
struct CampaignResponse {
    id: String,
}

/// Mailchimp problem-detail error body
#[derive(Deserialize, Debug)]
struct ApiError {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    detail: Option<String>,
}

/// Client for the Mailchimp Marketing API
#[derive(Debug, Clone)]
pub struct MailchimpClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Secret,
}

impl MailchimpClient {
    /// Create a client from configuration
    pub fn new(http: reqwest::Client, config: &MailchimpConfig) -> Self {
        Self {
            http,
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
        }
    }

    /// Create a campaign and return its id
    pub async fn create_campaign(&self, request: &CampaignRequest) -> Result<String, AppError> {
        let url = endpoint(&self.base_url, &["campaigns"])?;
        let response = self
            .http
            .post(url)
            .basic_auth("anystring", Some(self.api_key.expose()))
            .json(request)
            .send()
            .await
            .map_err(|e| AppError::upstream(SERVICE, e.to_string()))?;

        let response = check_status(response).await?;
        let campaign: CampaignResponse = response
            .json()
            .await
            .map_err(|e| AppError::upstream(SERVICE, format!("Invalid campaign response: {}", e)))?;

        tracing::info!(campaign_id = %campaign.id, "Created Mailchimp campaign");
        Ok(campaign.id)
    }

    /// Attach HTML content to a campaign
    pub async fn set_content(&self, campaign_id: &str, html: &str) -> Result<(), AppError> {
        let url = endpoint(&self.base_url, &["campaigns", campaign_id, "content"])?;
        let response = self
            .http
            .put(url)
            .basic_auth("anystring", Some(self.api_key.expose()))
            .json(&ContentRequest { html })
            .send()
            .await
            .map_err(|e| AppError::upstream(SERVICE, e.to_string()))?;

        check_status(response).await?;
        Ok(())
    }

    /// Send a test email of the campaign to the given addresses
    pub async fn send_test_email(
        &self,
        campaign_id: &str,
        test_emails: &[String],
    ) -> Result<(), AppError> {
        let url = endpoint(&self.base_url, &["campaigns", campaign_id, "actions", "test"])?;
        let response = self
            .http
            .post(url)
            .basic_auth("anystring", Some(self.api_key.expose()))
            .json(&TestEmailRequest {
                test_emails,
                send_type: "html",
            })
            .send()
            .await
            .map_err(|e| AppError::upstream(SERVICE, e.to_string()))?;

        check_status(response).await?;
        Ok(())
    }

    /// Send the campaign to its audience
    pub async fn send(&self, campaign_id: &str) -> Result<(), AppError> {
        let url = endpoint(&self.base_url, &["campaigns", campaign_id, "actions", "send"])?;
        let response = self
            .http
            .post(url)
            .basic_auth("anystring", Some(self.api_key.expose()))
            .send()
            .await
            .map_err(|e| AppError::upstream(SERVICE, e.to_string()))?;

        check_status(response).await?;
        Ok(())
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, AppError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = error_body(response).await;
    tracing::error!(status_code = status.as_u16(), error_body = %body, "Mailchimp returned error status");

    let message = serde_json::from_str::<ApiError>(&body)
        .ok()
        .and_then(|e| e.detail.or(e.title))
        .unwrap_or(body);
    Err(AppError::upstream(
        SERVICE,
        format!("HTTP {}: {}", status.as_u16(), message),
    ))
}
