//! Authentication extractor
//!
//! Protected handlers take an [`Authenticated`] argument, so the session check
//! is part of each handler's signature rather than ambient state.

use crate::error::AppError;
use crate::state::SharedState;
use async_trait::async_trait;
use axum::{
    extract::FromRequestParts,
    http::{request::Parts, HeaderValue},
    response::{IntoResponse, Redirect, Response},
};
use reqwest::Url;

use super::store::SessionToken;

/// Proof that the request belongs to a logged-in editor
#[derive(Debug, Clone)]
pub struct Authenticated {
    /// Session token, or `None` when login is disabled
    pub token: Option<SessionToken>,
}

/// Why a request was refused
#[derive(Debug)]
pub enum AuthRejection {
    /// JSON endpoint: answer 401
    Api,
    /// Page: send the browser to the login form
    Page {
        /// Where to return after logging in
        next: String,
    },
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            AuthRejection::Api => AppError::Unauthorized.into_response(),
            AuthRejection::Page { next } => Redirect::to(&login_url(&next)).into_response(),
        }
    }
}

/// Login URL that returns to `next` afterwards
pub fn login_url(next: &str) -> String {
    if next == "/" {
        return "/login".to_string();
    }
    match Url::parse("http://portal.local/login") {
        Ok(mut url) => {
            url.query_pairs_mut().append_pair("next", next);
            format!("{}?{}", url.path(), url.query().unwrap_or_default())
        }
        Err(_) => "/login".to_string(),
    }
}

/// Accept `next` only when it points back into this site
///
/// The value ends up in a `Location` header, so anything that is not a valid
/// header value falls back to `/` as well.
pub fn safe_next(next: Option<&str>) -> &str {
    match next {
        Some(n)
            if n.starts_with('/')
                && !n.starts_with("//")
                && !n.starts_with("/\\")
                && !n.chars().any(|c| c.is_ascii_control())
                && HeaderValue::from_str(n).is_ok() =>
        {
            n
        }
        _ => "/",
    }
}

#[async_trait]
impl FromRequestParts<SharedState> for Authenticated {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &SharedState,
    ) -> Result<Self, Self::Rejection> {
        if !state.config.login_required() {
            return Ok(Authenticated { token: None });
        }

        if let Some(token) = state.session_token(&parts.headers) {
            if state.sessions.is_authenticated(&token).await {
                return Ok(Authenticated { token: Some(token) });
            }
        }

        let path = parts.uri.path();
        tracing::debug!(path = %path, "Rejecting unauthenticated request");
        if path.starts_with("/api/") {
            Err(AuthRejection::Api)
        } else {
            let next = parts
                .uri
                .path_and_query()
                .map(|pq| pq.as_str().to_string())
                .unwrap_or_else(|| "/".to_string());
            Err(AuthRejection::Page { next })
        }
    }
}
