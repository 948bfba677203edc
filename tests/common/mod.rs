//! Shared helpers for integration tests

#![allow(dead_code)]

use newsletter_portal::{app::build_router, config::Config, state::AppState};
use std::collections::HashMap;
use std::sync::Arc;

/// Serve the portal on an ephemeral port and return its base URL
pub async fn spawn_portal(pairs: &[(&str, String)]) -> String {
    let mut vars: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect();
    vars.entry("STATIC_DIR".to_string())
        .or_insert_with(|| format!("{}/static", env!("CARGO_MANIFEST_DIR")));

    let config = Config::from_lookup(|key| vars.get(key).cloned());
    let state = Arc::new(AppState::new(config).unwrap());
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{}", addr)
}

/// Client that reports redirects instead of following them
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap()
}

/// `name=value` part of the response's `Set-Cookie` header
pub fn session_cookie_pair(response: &reqwest::Response) -> Option<String> {
    response
        .headers()
        .get(reqwest::header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(str::to_string)
}
