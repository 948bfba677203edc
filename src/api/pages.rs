//! HTML page handlers
//!
//! Dashboard, editor and the login/logout flow. Pages are rendered from the
//! embedded handlebars templates.

use crate::api::utils::local_path;
use crate::error::AppError;
use crate::orchestrator::{FeatureAvailability, NewsletterListing};
use crate::session::{
    clear_session_cookie, login_url, password_matches, safe_next, session_cookie,
    Authenticated,
};
use crate::state::{Newsletter, NewsletterId, SharedState};
use axum::{
    extract::{Form, Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
};
use serde::{Deserialize, Serialize};

const INVALID_PASSWORD: &str = "Invalid password. Please try again.";

#[derive(Debug, Serialize)]
struct DashboardRow {
    #[serde(flatten)]
    listing: NewsletterListing,
    editor_path: String,
}

#[derive(Debug, Serialize)]
struct DashboardPage {
    title: &'static str,
    show_logout: bool,
    features: FeatureAvailability,
    newsletters: Vec<DashboardRow>,
    notice: Option<String>,
}

#[derive(Debug, Serialize)]
struct EditorPage {
    title: String,
    show_logout: bool,
    features: FeatureAvailability,
    newsletter: Newsletter,
    api_path: String,
}

#[derive(Debug, Serialize)]
struct LoginPage {
    title: &'static str,
    show_logout: bool,
    error: Option<&'static str>,
    action: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginQuery {
    pub next: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub password: String,
}

// GET / - Dashboard
pub async fn dashboard(
    _auth: Authenticated,
    State(state): State<SharedState>,
) -> Result<Html<String>, AppError> {
    let (listing, notice) = match state.portal.list().await {
        Ok(listing) => (listing, None),
        Err(e) => {
            tracing::warn!(error = %e, "Could not list newsletters for the dashboard");
            (Vec::new(), Some(e.to_string()))
        }
    };

    let newsletters = listing
        .into_iter()
        .map(|listing| {
            Ok(DashboardRow {
                editor_path: local_path(&["editor", &listing.id])?,
                listing,
            })
        })
        .collect::<Result<Vec<_>, AppError>>()?;

    state.templates.render(
        "dashboard",
        &DashboardPage {
            title: "Newsletters",
            show_logout: state.config.login_required(),
            features: state.portal.features(),
            newsletters,
            notice,
        },
    )
}

// GET /editor/:id - Editor for one newsletter
pub async fn editor(
    _auth: Authenticated,
    State(state): State<SharedState>,
    Path(id): Path<NewsletterId>,
) -> Result<Html<String>, AppError> {
    let newsletter = state.portal.open(&id).await?;
    tracing::debug!(newsletter_id = %id, content_len = newsletter.content.len(), "Opening editor");

    state.templates.render(
        "editor",
        &EditorPage {
            title: format!("Edit {}", newsletter.id),
            show_logout: state.config.login_required(),
            features: state.portal.features(),
            api_path: local_path(&["api", "newsletter", &newsletter.id])?,
            newsletter,
        },
    )
}

// GET /login - Login form
pub async fn login_page(
    State(state): State<SharedState>,
    Query(query): Query<LoginQuery>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let next = safe_next(query.next.as_deref());
    if state.is_authenticated(&headers).await {
        return Ok(Redirect::to(next).into_response());
    }
    render_login(&state, None, next).map(IntoResponse::into_response)
}

// POST /login - Check the password and open a session
pub async fn login_submit(
    State(state): State<SharedState>,
    Query(query): Query<LoginQuery>,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    let next = safe_next(query.next.as_deref());
    let expected = match &state.config.auth.editor_password {
        Some(password) => password,
        None => return Ok(Redirect::to(next).into_response()),
    };

    if !password_matches(expected.expose(), &form.password) {
        tracing::warn!("Rejected login attempt");
        let page = render_login(&state, Some(INVALID_PASSWORD), next)?;
        return Ok((StatusCode::UNAUTHORIZED, page).into_response());
    }

    let token = state.sessions.create_authenticated().await;
    let cookie = session_cookie(
        &state.signer.sign(&token),
        state.sessions.ttl().num_seconds(),
    );
    let sessions = state.sessions.len().await;
    tracing::info!(sessions, "Editor logged in");

    Ok(([(header::SET_COOKIE, cookie)], Redirect::to(next)).into_response())
}

// GET /logout - Drop the session
pub async fn logout(State(state): State<SharedState>, headers: HeaderMap) -> Response {
    if let Some(token) = state.session_token(&headers) {
        if state.sessions.revoke(&token).await {
            tracing::info!("Editor logged out");
        }
    }
    let purged = state.sessions.purge_expired().await;
    if purged > 0 {
        tracing::debug!(purged, "Dropped expired sessions");
    }
    let target = if state.config.login_required() {
        "/login"
    } else {
        "/"
    };
    ([(header::SET_COOKIE, clear_session_cookie())], Redirect::to(target)).into_response()
}

fn render_login(
    state: &SharedState,
    error: Option<&'static str>,
    next: &str,
) -> Result<Html<String>, AppError> {
    state.templates.render(
        "login",
        &LoginPage {
            title: "Login",
            show_logout: false,
            error,
            action: login_url(next),
        },
    )
}
