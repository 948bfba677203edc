//! Health and configuration probes
//!
//! Both endpoints are unauthenticated and never reveal secret values.

use crate::orchestrator::FeatureAvailability;
use crate::state::SharedState;
use axum::{extract::State, response::Json};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Serialize)]
pub struct BackendHealth {
    pub configured: bool,
    pub reachable: Option<bool>,
    pub status_code: Option<u16>,
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: DateTime<Utc>,
    pub features: FeatureAvailability,
    pub login_required: bool,
    pub mock_mode: bool,
    pub backend: BackendHealth,
}

#[derive(Debug, Serialize)]
pub struct EnvCheckResponse {
    pub variables: BTreeMap<&'static str, &'static str>,
    pub features: FeatureAvailability,
}

fn presence(set: bool) -> &'static str {
    if set {
        "Set"
    } else {
        "Not set"
    }
}

// GET /health - Liveness plus a backend probe
pub async fn health_check(State(state): State<SharedState>) -> Json<HealthResponse> {
    let backend = match state.portal.backend_health().await {
        None => BackendHealth {
            configured: false,
            reachable: None,
            status_code: None,
            error: None,
        },
        Some(Ok(code)) => BackendHealth {
            configured: true,
            reachable: Some(true),
            status_code: Some(code),
            error: None,
        },
        Some(Err(e)) => BackendHealth {
            configured: true,
            reachable: Some(false),
            status_code: None,
            error: Some(e.to_string()),
        },
    };

    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now(),
        features: state.portal.features(),
        login_required: state.config.login_required(),
        mock_mode: state.config.mock_mode,
        backend,
    })
}

// GET /api/env-check - Which settings are present
pub async fn env_check(State(state): State<SharedState>) -> Json<EnvCheckResponse> {
    let config = &state.config;
    let mailchimp = config.mailchimp.as_ref();
    let github = config.github.is_some();

    let variables = BTreeMap::from([
        ("BACKEND_URL", presence(config.backend.is_some())),
        ("EDITOR_PASSWORD", presence(config.auth.editor_password.is_some())),
        ("SECRET_KEY", presence(config.auth.secret_key.is_some())),
        ("MAILCHIMP_API_KEY", presence(mailchimp.is_some())),
        ("MAILCHIMP_SERVER_PREFIX", presence(mailchimp.is_some())),
        ("MAILCHIMP_LIST_ID", presence(mailchimp.is_some())),
        (
            "REPLY_TO_EMAIL",
            presence(mailchimp.and_then(|m| m.reply_to.as_ref()).is_some()),
        ),
        (
            "EDITOR_EMAIL",
            presence(mailchimp.and_then(|m| m.editor_email.as_ref()).is_some()),
        ),
        ("ANTHROPIC_API_KEY", presence(config.anthropic.is_some())),
        ("GITHUB_TOKEN", presence(github)),
        ("GITHUB_REPO", presence(github)),
        ("MOCK_MODE", presence(config.mock_mode)),
    ]);

    Json(EnvCheckResponse {
        variables,
        features: state.portal.features(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::state::AppState;
    use std::collections::HashMap;
    use std::sync::Arc;

    fn state_with(pairs: &[(&str, String)]) -> SharedState {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect();
        Arc::new(AppState::new(Config::from_lookup(|key| vars.get(key).cloned())).unwrap())
    }

    #[tokio::test]
    async fn test_env_check_never_leaks_values() {
        let state = state_with(&[
            ("ANTHROPIC_API_KEY", "sk-very-secret".to_string()),
            ("EDITOR_PASSWORD", "hunter2".to_string()),
        ]);
        let Json(response) = env_check(State(state)).await;
        let body = serde_json::to_string(&response).unwrap();

        assert!(!body.contains("sk-very-secret"));
        assert!(!body.contains("hunter2"));
        assert_eq!(response.variables["ANTHROPIC_API_KEY"], "Set");
        assert_eq!(response.variables["GITHUB_TOKEN"], "Not set");
    }

    #[tokio::test]
    async fn test_health_without_backend() {
        let state = state_with(&[]);
        let Json(response) = health_check(State(state)).await;
        assert_eq!(response.status, "healthy");
        assert!(!response.backend.configured);
        assert!(!response.login_required);
    }

    #[tokio::test]
    async fn test_health_probes_backend() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/health")
            .with_status(200)
            .with_body(r#"{"status": "ok"}"#)
            .create_async()
            .await;
        let state = state_with(&[("BACKEND_URL", server.url())]);

        let Json(response) = health_check(State(state)).await;
        assert_eq!(response.backend.reachable, Some(true));
        assert_eq!(response.backend.status_code, Some(200));
    }
}
