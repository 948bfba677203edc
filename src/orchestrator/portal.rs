//! Portal orchestrator
//!
//! Turns the four editor actions (generate, save, send, review) plus the
//! dashboard/editor reads into calls against the external services. Every
//! precondition on configuration is checked before any network traffic, and
//! nothing is retried: a failure goes straight back to the user.

use crate::clients::mailchimp::CampaignRequest;
use crate::clients::{AnthropicClient, BackendClient, GithubClient, MailchimpClient};
use crate::config::Config;
use crate::error::AppError;
use crate::orchestrator::constants::{FALLBACK_ID_PREFIX, MOCK_PREFIX, MOCK_REVIEW, NO_EDITOR_NOTES};
use crate::orchestrator::content::{html_to_text, load_stylesheet, prepare_email_html, review_prompt};
use crate::orchestrator::generation::{GenerationGuard, GenerationStatus};
use crate::state::{Newsletter, NewsletterId, NewsletterLedger, NewsletterStatus};
use chrono::{Local, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;

/// Result of a successful generation
#[derive(Debug, Clone, Serialize)]
pub struct GeneratedNewsletter {
    /// The new newsletter
    pub newsletter: Newsletter,
    /// Human-readable outcome
    pub message: String,
    /// Seconds the backend spent generating
    pub generation_time_seconds: f64,
    /// Seconds the backend spent end to end
    pub total_time_seconds: f64,
}

/// Acknowledgement of a persisted edit
#[derive(Debug, Clone, Serialize)]
pub struct SaveReceipt {
    /// Newsletter that was saved
    pub newsletter_id: NewsletterId,
    /// Commit created on the version-control host
    pub commit_sha: String,
    /// Human-readable outcome
    pub message: String,
}

/// Acknowledgement of a forwarded send
#[derive(Debug, Clone, Serialize)]
pub struct SendReceipt {
    /// Newsletter that was sent
    pub newsletter_id: NewsletterId,
    /// Campaign created at the email provider (absent in mock mode)
    pub campaign_id: Option<String>,
    /// Whether only a test email went out
    pub test_mode: bool,
    /// Real sends forwarded for this newsletter by this process
    pub send_count: u32,
    /// Human-readable outcome
    pub message: String,
}

/// AI feedback on a newsletter
#[derive(Debug, Clone, Serialize)]
pub struct ReviewFeedback {
    /// Newsletter that was reviewed
    pub newsletter_id: NewsletterId,
    /// Feedback text exactly as returned by the provider
    pub review: String,
}

/// One dashboard row
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct NewsletterListing {
    /// Backend-issued identifier
    pub id: NewsletterId,
    /// Display title
    pub title: Option<String>,
    /// Creation time as reported by the backend
    pub created_at: Option<String>,
    /// Status observed by this process
    pub status: NewsletterStatus,
}

/// Which actions the current configuration allows
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct FeatureAvailability {
    /// Generation backend reachable by configuration
    pub generate: bool,
    /// Version-control credentials present
    pub save: bool,
    /// Email-provider credentials present
    pub send: bool,
    /// AI-provider credentials present
    pub review: bool,
}

/// Mediates between editor actions and the external services
#[derive(Debug)]
pub struct Portal {
    config: Arc<Config>,
    backend: Option<BackendClient>,
    mailchimp: Option<MailchimpClient>,
    reviewer: Option<AnthropicClient>,
    github: Option<GithubClient>,
    ledger: RwLock<NewsletterLedger>,
    generation: GenerationGuard,
}

fn unavailable(feature: &str, settings: &str) -> AppError {
    AppError::FeatureUnavailable(format!("{} is not configured (set {})", feature, settings))
}

/// Commit message recorded for a saved edit
pub fn commit_message(newsletter_id: &str, editor_notes: Option<&str>) -> String {
    let notes = editor_notes
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .unwrap_or(NO_EDITOR_NOTES);
    format!("docs: update {}\n\nNotes: {}", newsletter_id, notes)
}

fn fallback_newsletter_id() -> NewsletterId {
    format!(
        "{}{}.html",
        FALLBACK_ID_PREFIX,
        Local::now().format("%Y-%m-%d_%H%M")
    )
}

impl Portal {
    /// Build the orchestrator and a client for every configured service
    pub fn new(config: Arc<Config>, http: reqwest::Client) -> Self {
        let backend = config
            .backend
            .as_ref()
            .map(|b| BackendClient::new(http.clone(), b.base_url.clone()));
        let mailchimp = config
            .mailchimp
            .as_ref()
            .map(|m| MailchimpClient::new(http.clone(), m));
        let reviewer = config
            .anthropic
            .as_ref()
            .map(|a| AnthropicClient::new(http.clone(), a));
        let github = config
            .github
            .as_ref()
            .map(|g| GithubClient::new(http.clone(), g));

        Self {
            config,
            backend,
            mailchimp,
            reviewer,
            github,
            ledger: RwLock::new(NewsletterLedger::new()),
            generation: GenerationGuard::new(),
        }
    }

    fn backend(&self) -> Result<&BackendClient, AppError> {
        self.backend
            .as_ref()
            .ok_or_else(|| unavailable("The newsletter backend", "BACKEND_URL"))
    }

    /// Which actions are usable with the current configuration
    pub fn features(&self) -> FeatureAvailability {
        let mock = self.config.mock_mode;
        let backend = self.backend.is_some();
        FeatureAvailability {
            generate: mock || backend,
            save: self.github.is_some(),
            send: mock || (backend && self.mailchimp.is_some()),
            review: mock || (backend && self.reviewer.is_some()),
        }
    }

    /// Ask the backend for a new newsletter
    ///
    /// # Errors
    /// * `FeatureUnavailable` without a backend URL
    /// * `GenerationInProgress` while another generation runs
    /// * `BackendUnreachable` / `BackendFailure` from the backend call
    pub async fn generate(&self) -> Result<GeneratedNewsletter, AppError> {
        if self.config.mock_mode {
            let id = format!("{}{}.html", FALLBACK_ID_PREFIX, Local::now().format("%Y-%m-%d"));
            let entry = self.ledger.write().await.record_generated(&id);
            return Ok(GeneratedNewsletter {
                newsletter: Newsletter {
                    id,
                    content: String::new(),
                    status: entry.status,
                    last_modified: entry.last_modified,
                },
                message: format!("{} Newsletter generated!", MOCK_PREFIX),
                generation_time_seconds: 0.0,
                total_time_seconds: 0.0,
            });
        }

        let backend = self.backend()?;
        let _ticket = self
            .generation
            .try_start()
            .ok_or(AppError::GenerationInProgress)?;

        let started = Instant::now();
        tracing::info!(backend = %backend.base_url(), "Starting newsletter generation");

        let response = match backend.generate().await {
            Ok(response) => response,
            Err(e) => {
                tracing::error!(error = %e, elapsed_ms = started.elapsed().as_millis(), "Newsletter generation failed");
                return Err(e);
            }
        };

        let id = response
            .newsletter_id
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(fallback_newsletter_id);
        let entry = self.ledger.write().await.record_generated(&id);

        tracing::info!(
            newsletter_id = %id,
            content_len = response.html.len(),
            elapsed_ms = started.elapsed().as_millis(),
            "Newsletter generated"
        );

        Ok(GeneratedNewsletter {
            message: format!("Newsletter generated successfully! Saved as {}", id),
            newsletter: Newsletter {
                id,
                content: response.html,
                status: entry.status,
                last_modified: entry.last_modified,
            },
            generation_time_seconds: response.generation_time_seconds,
            total_time_seconds: response.total_time_seconds,
        })
    }

    /// Whether a generation is running, finished, or never happened
    pub async fn generation_status(&self) -> GenerationStatus {
        if self.generation.is_running() {
            return GenerationStatus::InProgress {
                message: "Newsletter generation is currently running...".to_string(),
            };
        }

        match self.ledger.read().await.latest_generated() {
            Some(id) => GenerationStatus::Completed {
                message: format!("Latest newsletter: {}", id),
                latest_newsletter_id: id.clone(),
            },
            None => GenerationStatus::Idle {
                message: "No generation in progress and no newsletters generated yet".to_string(),
            },
        }
    }

    /// Newsletters known to the backend, with locally observed status
    pub async fn list(&self) -> Result<Vec<NewsletterListing>, AppError> {
        let summaries = self.backend()?.list_newsletters().await?;
        let ledger = self.ledger.read().await;
        Ok(summaries
            .into_iter()
            .map(|s| NewsletterListing {
                status: ledger.status_of(&s.id),
                id: s.id,
                title: s.title,
                created_at: s.created_at,
            })
            .collect())
    }

    /// Load one newsletter for the editor
    pub async fn open(&self, newsletter_id: &str) -> Result<Newsletter, AppError> {
        let content = self.backend()?.fetch_content(newsletter_id).await?;
        let ledger = self.ledger.read().await;
        let entry = ledger.get(newsletter_id);
        Ok(Newsletter {
            id: newsletter_id.to_string(),
            content,
            status: entry.map(|e| e.status).unwrap_or(NewsletterStatus::Draft),
            last_modified: entry.map(|e| e.last_modified).unwrap_or_else(Utc::now),
        })
    }

    /// Persist an edit to the version-control host
    ///
    /// Each call is forwarded as a new commit; the edit is not kept anywhere
    /// in the portal after the request.
    pub async fn save(
        &self,
        newsletter_id: &str,
        content: &str,
        editor_notes: Option<&str>,
    ) -> Result<SaveReceipt, AppError> {
        if content.trim().is_empty() {
            return Err(AppError::InvalidRequest("No content".to_string()));
        }
        let (github, settings) = match (&self.github, &self.config.github) {
            (Some(client), Some(settings)) => (client, settings),
            _ => return Err(unavailable("Saving", "GITHUB_TOKEN and GITHUB_REPO")),
        };

        let path = if settings.newsletter_dir.is_empty() {
            newsletter_id.to_string()
        } else {
            format!("{}/{}", settings.newsletter_dir, newsletter_id)
        };
        let message = commit_message(newsletter_id, editor_notes);

        let commit_sha = github.commit_file(&path, content, &message).await?;
        self.ledger.write().await.record_saved(newsletter_id);

        Ok(SaveReceipt {
            newsletter_id: newsletter_id.to_string(),
            commit_sha,
            message: "Saved to GitHub.".to_string(),
        })
    }

    /// Send a newsletter (or a test email of it) through the email provider
    ///
    /// Repeated sends are forwarded as new campaigns; the portal does not
    /// deduplicate them.
    pub async fn send(&self, newsletter_id: &str, test_mode: bool) -> Result<SendReceipt, AppError> {
        if self.config.mock_mode {
            let what = if test_mode { "Test email sent!" } else { "Newsletter sent!" };
            return Ok(SendReceipt {
                newsletter_id: newsletter_id.to_string(),
                campaign_id: None,
                test_mode,
                send_count: 0,
                message: format!("{} {}", MOCK_PREFIX, what),
            });
        }

        let (mailchimp, settings) = match (&self.mailchimp, &self.config.mailchimp) {
            (Some(client), Some(settings)) => (client, settings),
            _ => {
                return Err(unavailable(
                    "Sending",
                    "MAILCHIMP_API_KEY, MAILCHIMP_SERVER_PREFIX and MAILCHIMP_LIST_ID",
                ))
            }
        };
        let test_recipients = if test_mode {
            let editor = settings
                .editor_email
                .clone()
                .ok_or_else(|| unavailable("Test emails", "EDITOR_EMAIL"))?;
            Some(vec![editor])
        } else {
            None
        };
        let backend = self.backend()?;

        let html = backend.fetch_content(newsletter_id).await?;
        let css = load_stylesheet(&self.config.content.newsletter_css_path).await;
        let email_html = prepare_email_html(&html, css.as_deref());

        let campaign_id = mailchimp
            .create_campaign(&CampaignRequest::regular(settings, &Local::now()))
            .await?;
        mailchimp.set_content(&campaign_id, &email_html).await?;

        if let Some(recipients) = test_recipients {
            mailchimp.send_test_email(&campaign_id, &recipients).await?;
            let send_count = self
                .ledger
                .read()
                .await
                .get(newsletter_id)
                .map(|e| e.send_count)
                .unwrap_or(0);
            tracing::info!(newsletter_id = %newsletter_id, campaign_id = %campaign_id, "Test email sent");
            return Ok(SendReceipt {
                newsletter_id: newsletter_id.to_string(),
                campaign_id: Some(campaign_id),
                test_mode: true,
                send_count,
                message: "Test email sent!".to_string(),
            });
        }

        if let Some(previous) = self.ledger.read().await.get(newsletter_id) {
            if previous.send_count > 0 {
                tracing::warn!(
                    newsletter_id = %newsletter_id,
                    previous_sends = previous.send_count,
                    "Newsletter was already sent; forwarding another send"
                );
            }
        }

        mailchimp.send(&campaign_id).await?;
        let entry = self.ledger.write().await.record_sent(newsletter_id);
        tracing::info!(newsletter_id = %newsletter_id, campaign_id = %campaign_id, "Newsletter sent");

        Ok(SendReceipt {
            newsletter_id: newsletter_id.to_string(),
            campaign_id: Some(campaign_id),
            test_mode: false,
            send_count: entry.send_count,
            message: "Newsletter sent successfully!".to_string(),
        })
    }

    /// Ask the AI provider for editorial feedback
    ///
    /// Stored content is never modified by a review.
    pub async fn review(&self, newsletter_id: &str) -> Result<ReviewFeedback, AppError> {
        if self.config.mock_mode {
            return Ok(ReviewFeedback {
                newsletter_id: newsletter_id.to_string(),
                review: MOCK_REVIEW.to_string(),
            });
        }

        let reviewer = self
            .reviewer
            .as_ref()
            .ok_or_else(|| unavailable("AI review", "ANTHROPIC_API_KEY"))?;
        let backend = self.backend()?;

        let html = backend.fetch_content(newsletter_id).await?;
        let prompt = review_prompt(&html_to_text(&html));
        let review = reviewer.complete(&prompt).await?;

        self.ledger.write().await.record_reviewed(newsletter_id);
        tracing::info!(newsletter_id = %newsletter_id, review_len = review.len(), "Review received");

        Ok(ReviewFeedback {
            newsletter_id: newsletter_id.to_string(),
            review,
        })
    }

    /// Probe the backend's health endpoint; `None` when no backend is configured
    pub async fn backend_health(&self) -> Option<Result<u16, AppError>> {
        match &self.backend {
            Some(backend) => Some(backend.health().await),
            None => None,
        }
    }

    /// Observed status of a newsletter
    pub async fn status_of(&self, newsletter_id: &str) -> NewsletterStatus {
        self.ledger.read().await.status_of(newsletter_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server, ServerGuard};
    use std::collections::HashMap;

    fn portal_with(pairs: &[(&str, String)]) -> Portal {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect();
        let config = Config::from_lookup(|key| vars.get(key).cloned());
        Portal::new(Arc::new(config), reqwest::Client::new())
    }

    /// Fails the test if anything at all reaches the server
    async fn forbid_traffic(server: &mut ServerGuard) -> Vec<mockito::Mock> {
        let mut mocks = Vec::new();
        for method in ["GET", "POST", "PUT"] {
            mocks.push(
                server
                    .mock(method, Matcher::Any)
                    .expect(0)
                    .create_async()
                    .await,
            );
        }
        mocks
    }

    #[test]
    fn test_commit_message() {
        assert_eq!(
            commit_message("nl-1.html", None),
            "docs: update nl-1.html\n\nNotes: n/a"
        );
        assert_eq!(
            commit_message("nl-1.html", Some("  fixed typo ")),
            "docs: update nl-1.html\n\nNotes: fixed typo"
        );
        assert_eq!(
            commit_message("nl-1.html", Some("")),
            "docs: update nl-1.html\n\nNotes: n/a"
        );
    }

    #[test]
    fn test_fallback_id_shape() {
        let id = fallback_newsletter_id();
        assert!(id.starts_with("newsletter_"));
        assert!(id.ends_with(".html"));
    }

    #[tokio::test]
    async fn test_features_follow_configuration() {
        let portal = portal_with(&[]);
        assert_eq!(
            portal.features(),
            FeatureAvailability {
                generate: false,
                save: false,
                send: false,
                review: false
            }
        );

        let portal = portal_with(&[
            ("BACKEND_URL", "http://backend".to_string()),
            ("ANTHROPIC_API_KEY", "k".to_string()),
        ]);
        let features = portal.features();
        assert!(features.generate);
        assert!(features.review);
        assert!(!features.send);
    }

    #[tokio::test]
    async fn test_actions_without_configuration_make_no_calls() {
        let mut server = Server::new_async().await;
        let mocks = forbid_traffic(&mut server).await;
        // Only the backend is configured; every optional provider is missing
        let portal = portal_with(&[("BACKEND_URL", server.url())]);

        let send = portal.send("nl-1", false).await.unwrap_err();
        assert!(matches!(send, AppError::FeatureUnavailable(_)), "{:?}", send);
        let review = portal.review("nl-1").await.unwrap_err();
        assert!(matches!(review, AppError::FeatureUnavailable(_)), "{:?}", review);
        let save = portal.save("nl-1", "<p>x</p>", None).await.unwrap_err();
        assert!(matches!(save, AppError::FeatureUnavailable(_)), "{:?}", save);

        for mock in mocks {
            mock.assert_async().await;
        }
    }

    #[tokio::test]
    async fn test_generate_without_backend_is_unavailable() {
        let portal = portal_with(&[]);
        let err = portal.generate().await.unwrap_err();
        assert!(matches!(err, AppError::FeatureUnavailable(_)));
        assert!(matches!(
            portal.generation_status().await,
            GenerationStatus::Idle { .. }
        ));
    }

    #[tokio::test]
    async fn test_generate_records_draft() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/api/generate")
            .with_status(200)
            .with_body(r#"{"success": true, "newsletter_id": "nl-42", "html": "<p>Hi</p>"}"#)
            .create_async()
            .await;
        let portal = portal_with(&[("BACKEND_URL", server.url())]);

        let generated = portal.generate().await.unwrap();
        assert_eq!(generated.newsletter.id, "nl-42");
        assert_eq!(generated.newsletter.content, "<p>Hi</p>");
        assert_eq!(generated.newsletter.status, NewsletterStatus::Draft);
        assert_eq!(
            portal.generation_status().await,
            GenerationStatus::Completed {
                message: "Latest newsletter: nl-42".to_string(),
                latest_newsletter_id: "nl-42".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_generate_failure_leaves_ledger_untouched() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/api/generate")
            .with_status(503)
            .create_async()
            .await;
        let portal = portal_with(&[("BACKEND_URL", server.url())]);

        assert!(portal.generate().await.is_err());
        assert!(matches!(
            portal.generation_status().await,
            GenerationStatus::Idle { .. }
        ));
        // The guard is released after a failure
        assert!(!portal.generation.is_running());
    }

    #[tokio::test]
    async fn test_review_returns_feedback_verbatim() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/newsletter/nl-42")
            .with_status(200)
            .with_body("<p>Markets were calm.</p>")
            .create_async()
            .await;
        let ai = server
            .mock("POST", "/v1/messages")
            .match_body(Matcher::Regex("Markets were calm.".to_string()))
            .with_status(200)
            .with_body(r#"{"content": [{"type": "text", "text": "Tighten the intro."}]}"#)
            .create_async()
            .await;
        let portal = portal_with(&[
            ("BACKEND_URL", server.url()),
            ("ANTHROPIC_API_KEY", "sk".to_string()),
            ("ANTHROPIC_API_BASE_URL", server.url()),
        ]);

        let feedback = portal.review("nl-42").await.unwrap();
        ai.assert_async().await;
        assert_eq!(feedback.review, "Tighten the intro.");
        assert_eq!(portal.status_of("nl-42").await, NewsletterStatus::Reviewed);
    }

    #[tokio::test]
    async fn test_failed_review_keeps_status() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/newsletter/nl-42")
            .with_status(200)
            .with_body("<p>x</p>")
            .create_async()
            .await;
        server
            .mock("POST", "/v1/messages")
            .with_status(500)
            .create_async()
            .await;
        let portal = portal_with(&[
            ("BACKEND_URL", server.url()),
            ("ANTHROPIC_API_KEY", "sk".to_string()),
            ("ANTHROPIC_API_BASE_URL", server.url()),
        ]);

        let err = portal.review("nl-42").await.unwrap_err();
        assert!(matches!(err, AppError::Upstream { .. }));
        assert_eq!(portal.status_of("nl-42").await, NewsletterStatus::Draft);
    }

    #[tokio::test]
    async fn test_send_full_flow_and_resend() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/newsletter/nl-42")
            .with_status(200)
            .with_body("<html><head></head><body><p>Hi</p></body></html>")
            .expect(2)
            .create_async()
            .await;
        let create = server
            .mock("POST", "/campaigns")
            .with_status(200)
            .with_body(r#"{"id": "cmp-1"}"#)
            .expect(2)
            .create_async()
            .await;
        server
            .mock("PUT", "/campaigns/cmp-1/content")
            .match_body(Matcher::Regex("p \\{ color: navy \\}".to_string()))
            .with_status(200)
            .with_body("{}")
            .expect(2)
            .create_async()
            .await;
        let send = server
            .mock("POST", "/campaigns/cmp-1/actions/send")
            .with_status(204)
            .expect(2)
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let css_path = dir.path().join("newsletter.css");
        std::fs::write(&css_path, "p { color: navy }").unwrap();

        let portal = portal_with(&[
            ("BACKEND_URL", server.url()),
            ("MAILCHIMP_API_KEY", "mc".to_string()),
            ("MAILCHIMP_SERVER_PREFIX", "us1".to_string()),
            ("MAILCHIMP_LIST_ID", "list".to_string()),
            ("MAILCHIMP_API_BASE_URL", server.url()),
            ("NEWSLETTER_CSS_PATH", css_path.display().to_string()),
        ]);

        let first = portal.send("nl-42", false).await.unwrap();
        assert_eq!(first.send_count, 1);
        assert_eq!(first.campaign_id.as_deref(), Some("cmp-1"));
        let second = portal.send("nl-42", false).await.unwrap();
        assert_eq!(second.send_count, 2);

        create.assert_async().await;
        send.assert_async().await;
        assert_eq!(portal.status_of("nl-42").await, NewsletterStatus::Sent);
    }

    #[tokio::test]
    async fn test_failed_send_leaves_ledger_untouched() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/newsletter/nl-42")
            .with_status(200)
            .with_body("<p>Hi</p>")
            .create_async()
            .await;
        server
            .mock("POST", "/campaigns")
            .with_status(200)
            .with_body(r#"{"id": "cmp-1"}"#)
            .create_async()
            .await;
        server
            .mock("PUT", "/campaigns/cmp-1/content")
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;
        server
            .mock("POST", "/campaigns/cmp-1/actions/send")
            .with_status(500)
            .with_body("nope")
            .create_async()
            .await;
        let portal = portal_with(&[
            ("BACKEND_URL", server.url()),
            ("MAILCHIMP_API_KEY", "mc".to_string()),
            ("MAILCHIMP_SERVER_PREFIX", "us1".to_string()),
            ("MAILCHIMP_LIST_ID", "list".to_string()),
            ("MAILCHIMP_API_BASE_URL", server.url()),
        ]);

        let err = portal.send("nl-42", false).await.unwrap_err();
        assert!(matches!(err, AppError::Upstream { service: "Mailchimp", .. }), "{:?}", err);
        assert_eq!(portal.status_of("nl-42").await, NewsletterStatus::Draft);
        assert!(portal.ledger.read().await.get("nl-42").is_none());
    }

    #[tokio::test]
    async fn test_failed_save_leaves_ledger_untouched() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/repos/acme/news/contents/newsletters/nl-42")
            .match_query(Matcher::Any)
            .with_status(404)
            .create_async()
            .await;
        server
            .mock("PUT", "/repos/acme/news/contents/newsletters/nl-42")
            .with_status(409)
            .with_body(r#"{"message": "newsletters/nl-42 does not match"}"#)
            .create_async()
            .await;
        let portal = portal_with(&[
            ("GITHUB_TOKEN", "t".to_string()),
            ("GITHUB_REPO", "acme/news".to_string()),
            ("GITHUB_API_BASE_URL", server.url()),
        ]);
        let before = portal.ledger.write().await.record_reviewed("nl-42");

        let err = portal.save("nl-42", "<p>Hi</p>", None).await.unwrap_err();
        assert!(err.to_string().contains("does not match"), "{}", err);
        assert_eq!(portal.ledger.read().await.get("nl-42"), Some(&before));
    }

    #[tokio::test]
    async fn test_test_send_requires_editor_email() {
        let mut server = Server::new_async().await;
        let mocks = forbid_traffic(&mut server).await;
        let portal = portal_with(&[
            ("BACKEND_URL", server.url()),
            ("MAILCHIMP_API_KEY", "mc".to_string()),
            ("MAILCHIMP_SERVER_PREFIX", "us1".to_string()),
            ("MAILCHIMP_LIST_ID", "list".to_string()),
            ("MAILCHIMP_API_BASE_URL", server.url()),
        ]);

        let err = portal.send("nl-42", true).await.unwrap_err();
        assert!(err.to_string().contains("EDITOR_EMAIL"));
        for mock in mocks {
            mock.assert_async().await;
        }
    }

    #[tokio::test]
    async fn test_save_forwards_every_call() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/repos/acme/news/contents/newsletters/nl-42")
            .match_query(Matcher::Any)
            .with_status(404)
            .expect(2)
            .create_async()
            .await;
        let put = server
            .mock("PUT", "/repos/acme/news/contents/newsletters/nl-42")
            .with_status(201)
            .with_body(r#"{"commit": {"sha": "c1"}}"#)
            .expect(2)
            .create_async()
            .await;
        let portal = portal_with(&[
            ("GITHUB_TOKEN", "t".to_string()),
            ("GITHUB_REPO", "acme/news".to_string()),
            ("GITHUB_API_BASE_URL", server.url()),
        ]);

        for _ in 0..2 {
            let receipt = portal.save("nl-42", "<p>Hi</p>", None).await.unwrap();
            assert_eq!(receipt.commit_sha, "c1");
        }
        put.assert_async().await;
    }

    #[tokio::test]
    async fn test_save_rejects_empty_content() {
        let portal = portal_with(&[]);
        let err = portal.save("nl-1", "   ", None).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn test_mock_mode_short_circuits() {
        let portal = portal_with(&[("MOCK_MODE", "true".to_string())]);
        assert_eq!(portal.review("nl-1").await.unwrap().review, MOCK_REVIEW);
        let sent = portal.send("nl-1", true).await.unwrap();
        assert_eq!(sent.message, "[MOCK] Test email sent!");
        let generated = portal.generate().await.unwrap();
        assert!(generated.newsletter.id.starts_with("newsletter_"));
        assert!(generated.message.starts_with("[MOCK]"));
    }

    #[tokio::test]
    async fn test_list_merges_observed_status() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/api/generate")
            .with_status(200)
            .with_body(r#"{"success": true, "newsletter_id": "nl-2", "html": "x"}"#)
            .create_async()
            .await;
        server
            .mock("GET", "/api/newsletters")
            .with_status(200)
            .with_body(r#"{"success": true, "newsletters": [{"id": "nl-1"}, {"id": "nl-2"}]}"#)
            .create_async()
            .await;
        let portal = portal_with(&[("BACKEND_URL", server.url())]);
        portal.generate().await.unwrap();
        portal.ledger.write().await.record_reviewed("nl-2");

        let listing = portal.list().await.unwrap();
        assert_eq!(listing.len(), 2);
        assert_eq!(listing[0].status, NewsletterStatus::Draft);
        assert_eq!(listing[1].status, NewsletterStatus::Reviewed);
    }
}
