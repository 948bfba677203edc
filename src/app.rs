//! Router construction
//!
//! Kept separate from `main` so integration tests can serve the exact same
//! application on an ephemeral port.

use crate::api;
use crate::state::SharedState;
use axum::{
    extract::Request,
    middleware::Next,
    response::Response,
    routing::{get, post},
    Router,
};
use std::time::Instant;
use tower_http::{services::ServeDir, trace::TraceLayer};
use tracing::{info, info_span, Instrument};
use uuid::Uuid;

/// Request ID middleware - adds unique ID to each request for tracing
async fn request_id_middleware(request: Request, next: Next) -> Response {
    let request_id = Uuid::new_v4().to_string();
    let method = request.method().clone();
    let uri = request.uri().path().to_string();
    let start = Instant::now();

    let span = info_span!(
        "request",
        request_id = %request_id,
        method = %method,
        path = %uri,
    );

    let response = next.run(request).instrument(span).await;

    info!(
        request_id = %request_id,
        method = %method,
        path = %uri,
        status = %response.status().as_u16(),
        duration_ms = start.elapsed().as_millis(),
        "Request completed"
    );

    response
}

/// Build the portal router with every page, action and asset route
pub fn build_router(state: SharedState) -> Router {
    let static_dir = ServeDir::new(&state.config.content.static_dir);

    Router::new()
        // Pages
        .route("/", get(api::pages::dashboard))
        .route("/editor/:id", get(api::pages::editor))
        .route(
            "/login",
            get(api::pages::login_page).post(api::pages::login_submit),
        )
        .route("/logout", get(api::pages::logout))
        // Editor actions
        .route(
            "/api/generate-newsletter",
            post(api::newsletters::generate_newsletter),
        )
        .route(
            "/api/generation-status",
            get(api::newsletters::generation_status),
        )
        .route("/api/newsletters", get(api::newsletters::list_newsletters))
        .route("/api/newsletter/:id", post(api::newsletters::save_newsletter))
        .route(
            "/api/newsletter/:id/review",
            post(api::newsletters::review_newsletter),
        )
        .route(
            "/api/newsletter/:id/send",
            post(api::newsletters::send_newsletter),
        )
        // Probes
        .route("/health", get(api::health::health_check))
        .route("/api/env-check", get(api::health::env_check))
        .nest_service("/static", static_dir)
        // Middleware (order matters - request_id should be first)
        .layer(axum::middleware::from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    path = %request.uri().path(),
                )
            }),
        )
        .with_state(state)
}
