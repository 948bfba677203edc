//! Helpers shared by page and JSON handlers

use crate::clients::endpoint;
use crate::error::AppError;

const LOCAL_ORIGIN: &str = "http://portal.local";

/// Site-relative path with every segment percent-encoded
///
/// Newsletter identifiers are opaque and may contain characters that are not
/// valid in a URL path, so links are built segment by segment.
///
/// # Examples
/// `local_path(&["editor", "a b.html"])` gives `/editor/a%20b.html`
pub fn local_path(segments: &[&str]) -> Result<String, AppError> {
    Ok(endpoint(LOCAL_ORIGIN, segments)?.path().to_string())
}

/// Reject identifiers that cannot name a newsletter
pub fn validate_newsletter_id(id: &str) -> Result<(), AppError> {
    if id.trim().is_empty() {
        return Err(AppError::InvalidRequest(
            "Newsletter id cannot be empty".to_string(),
        ));
    }
    Ok(())
}
