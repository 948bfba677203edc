//! Error types and error handling for the application
//!
//! Every failure a user action can hit is represented by [`AppError`], which
//! converts into a JSON HTTP response with a consistent shape.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Application-level error types
#[derive(Error, Debug)]
pub enum AppError {
    /// An optional integration is not configured; raised before any network call
    #[error("Feature unavailable: {0}")]
    FeatureUnavailable(String),

    /// The generation backend could not be reached
    #[error("Backend unreachable: {0}")]
    BackendUnreachable(String),

    /// The generation backend answered with a failure
    #[error("Backend returned failure: {0}")]
    BackendFailure(String),

    /// An email, AI or version-control provider call failed
    #[error("{service} error: {message}")]
    Upstream {
        /// Name of the provider that failed
        service: &'static str,
        /// Provider-supplied or transport error message
        message: String,
    },

    /// The backend does not know the requested newsletter
    #[error("Newsletter not found: {0}")]
    NewsletterNotFound(String),

    /// The request itself is unusable
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The caller has no authenticated session
    #[error("Authentication required")]
    Unauthorized,

    /// Another generation is already running
    #[error("Newsletter generation is already in progress. Please wait for it to complete.")]
    GenerationInProgress,

    /// A page template failed to render
    #[error("Template error: {0}")]
    Template(String),

    /// Internal server error (catch-all for unexpected errors)
    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Shorthand for an upstream provider failure
    pub fn upstream(service: &'static str, message: impl Into<String>) -> Self {
        AppError::Upstream {
            service,
            message: message.into(),
        }
    }

    /// HTTP status this error maps to
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::FeatureUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::BackendUnreachable(_) => StatusCode::BAD_GATEWAY,
            AppError::BackendFailure(_) => StatusCode::BAD_GATEWAY,
            AppError::Upstream { .. } => StatusCode::BAD_GATEWAY,
            AppError::NewsletterNotFound(_) => StatusCode::NOT_FOUND,
            AppError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::GenerationInProgress => StatusCode::CONFLICT,
            AppError::Template(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<handlebars::RenderError> for AppError {
    fn from(err: handlebars::RenderError) -> Self {
        AppError::Template(err.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::warn!(status = status.as_u16(), error = %self, "Request failed");
        }

        let body = Json(json!({
            "error": self.to_string(),
            "status": status.as_u16(),
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            AppError::FeatureUnavailable("x".into()).status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            AppError::upstream("Mailchimp", "boom").status_code(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            AppError::NewsletterNotFound("nl-1".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::GenerationInProgress.status_code(),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn test_upstream_message_names_service() {
        let err = AppError::upstream("GitHub", "Bad credentials");
        assert_eq!(err.to_string(), "GitHub error: Bad credentials");
    }

    #[test]
    fn test_into_response_uses_status() {
        let response = AppError::Unauthorized.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
