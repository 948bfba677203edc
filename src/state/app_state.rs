// Application state
// Everything a request handler needs, built once at startup and shared
// behind an `Arc`. Configuration is passed in explicitly; nothing here reads
// the environment.

use crate::clients::build_http_client;
use crate::config::Config;
use crate::error::AppError;
use crate::orchestrator::Portal;
use crate::session::{read_cookie, CookieSigner, SessionStore, SessionToken, SESSION_COOKIE};
use crate::templates::Templates;
use axum::http::HeaderMap;
use std::sync::Arc;
use uuid::Uuid;

/// State shared by every handler
pub type SharedState = Arc<AppState>;

/// Main application state
#[derive(Debug)]
pub struct AppState {
    /// Immutable process configuration
    pub config: Arc<Config>,
    /// Orchestrator for editor actions
    pub portal: Portal,
    /// Login sessions
    pub sessions: SessionStore,
    /// Session cookie signer
    pub signer: CookieSigner,
    /// Page templates
    pub templates: Templates,
}

impl AppState {
    /// Build the application state from configuration
    ///
    /// Without `SECRET_KEY` a random signing key is generated, so sessions do
    /// not survive a restart.
    pub fn new(config: Config) -> Result<Self, AppError> {
        let config = Arc::new(config);
        let http = build_http_client()?;

        let secret = match &config.auth.secret_key {
            Some(secret) => secret.expose().to_string(),
            None => {
                if config.login_required() {
                    tracing::warn!("SECRET_KEY is not set; using an ephemeral signing key, sessions will not survive a restart");
                }
                format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple())
            }
        };

        Ok(Self {
            portal: Portal::new(Arc::clone(&config), http),
            sessions: SessionStore::new(config.auth.session_ttl_secs),
            signer: CookieSigner::new(secret),
            templates: Templates::new()?,
            config,
        })
    }

    /// Session token carried by the request, if its cookie is correctly signed
    pub fn session_token(&self, headers: &HeaderMap) -> Option<SessionToken> {
        read_cookie(headers, SESSION_COOKIE).and_then(|value| self.signer.verify(&value))
    }

    /// Whether the request may use protected routes
    ///
    /// Always true when no editor password is configured.
    pub async fn is_authenticated(&self, headers: &HeaderMap) -> bool {
        if !self.config.login_required() {
            return true;
        }
        match self.session_token(headers) {
            Some(token) => self.sessions.is_authenticated(&token).await,
            None => false,
        }
    }
}
