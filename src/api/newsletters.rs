//! JSON handlers for editor actions
//!
//! Each handler validates its input, hands the action to the [`Portal`] and
//! wraps the outcome in a `{"success": true, ...}` body. Failures become
//! [`AppError`] responses.
//!
//! [`Portal`]: crate::orchestrator::Portal

use crate::api::utils::{local_path, validate_newsletter_id};
use crate::error::AppError;
use crate::orchestrator::{
    GenerationStatus, NewsletterListing, ReviewFeedback, SaveReceipt, SendReceipt,
};
use crate::session::Authenticated;
use crate::state::{NewsletterId, NewsletterStatus, SharedState};
use axum::{
    extract::{Path, State},
    response::Json,
};
use serde::{Deserialize, Serialize};

// Response types
#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    pub success: bool,
    pub newsletter_id: NewsletterId,
    pub html: String,
    pub status: NewsletterStatus,
    pub message: String,
    pub editor_url: String,
    pub generation_time_seconds: f64,
    pub total_time_seconds: f64,
}

#[derive(Debug, Serialize)]
pub struct NewslettersListResponse {
    pub success: bool,
    pub newsletters: Vec<NewsletterListing>,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct ActionResponse<T> {
    pub success: bool,
    #[serde(flatten)]
    pub result: T,
}

impl<T> ActionResponse<T> {
    fn ok(result: T) -> Json<Self> {
        Json(Self {
            success: true,
            result,
        })
    }
}

// Request types
#[derive(Debug, Deserialize)]
pub struct SaveRequest {
    pub html_content: Option<String>,
    pub editor_notes: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SendRequest {
    #[serde(default)]
    pub test_mode: bool,
}

// POST /api/generate-newsletter - Ask the backend for a new newsletter
pub async fn generate_newsletter(
    _auth: Authenticated,
    State(state): State<SharedState>,
) -> Result<Json<GenerateResponse>, AppError> {
    let generated = state.portal.generate().await?;
    let newsletter = generated.newsletter;

    Ok(Json(GenerateResponse {
        success: true,
        editor_url: local_path(&["editor", &newsletter.id])?,
        newsletter_id: newsletter.id,
        html: newsletter.content,
        status: newsletter.status,
        message: generated.message,
        generation_time_seconds: generated.generation_time_seconds,
        total_time_seconds: generated.total_time_seconds,
    }))
}

// GET /api/generation-status - Poll for a running generation
pub async fn generation_status(
    _auth: Authenticated,
    State(state): State<SharedState>,
) -> Json<GenerationStatus> {
    Json(state.portal.generation_status().await)
}

// GET /api/newsletters - List newsletters known to the backend
pub async fn list_newsletters(
    _auth: Authenticated,
    State(state): State<SharedState>,
) -> Result<Json<NewslettersListResponse>, AppError> {
    let newsletters = state.portal.list().await?;
    Ok(Json(NewslettersListResponse {
        success: true,
        count: newsletters.len(),
        newsletters,
    }))
}

// POST /api/newsletter/:id - Commit an edit
pub async fn save_newsletter(
    _auth: Authenticated,
    State(state): State<SharedState>,
    Path(id): Path<NewsletterId>,
    Json(request): Json<SaveRequest>,
) -> Result<Json<ActionResponse<SaveReceipt>>, AppError> {
    validate_newsletter_id(&id)?;
    let content = request.html_content.unwrap_or_default();

    tracing::info!(
        newsletter_id = %id,
        content_len = content.len(),
        has_notes = request.editor_notes.is_some(),
        "Saving newsletter"
    );
    let receipt = state
        .portal
        .save(&id, &content, request.editor_notes.as_deref())
        .await?;

    Ok(ActionResponse::ok(receipt))
}

// POST /api/newsletter/:id/review - AI feedback
pub async fn review_newsletter(
    _auth: Authenticated,
    State(state): State<SharedState>,
    Path(id): Path<NewsletterId>,
) -> Result<Json<ActionResponse<ReviewFeedback>>, AppError> {
    validate_newsletter_id(&id)?;
    let feedback = state.portal.review(&id).await?;
    Ok(ActionResponse::ok(feedback))
}

// POST /api/newsletter/:id/send - Send, or send a test email with {"test_mode": true}
pub async fn send_newsletter(
    _auth: Authenticated,
    State(state): State<SharedState>,
    Path(id): Path<NewsletterId>,
    request: Option<Json<SendRequest>>,
) -> Result<Json<ActionResponse<SendReceipt>>, AppError> {
    validate_newsletter_id(&id)?;
    let request = request.map(|Json(r)| r).unwrap_or_default();

    tracing::info!(newsletter_id = %id, test_mode = request.test_mode, "Send requested");
    let receipt = state.portal.send(&id, request.test_mode).await?;

    Ok(ActionResponse::ok(receipt))
}
