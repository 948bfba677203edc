//! Signed session cookie
//!
//! The cookie value is `{token}.{digest}` where the digest is the SHA-256 of
//! the signing secret and the token. A cookie whose digest does not match is
//! ignored, so tokens cannot be forged without the secret.

use axum::http::{header, HeaderMap};
use sha2::{Digest, Sha256};

use super::store::SessionToken;

/// Name of the session cookie
pub const SESSION_COOKIE: &str = "portal_session";

/// Signs and verifies session cookie values
#[derive(Clone)]
pub struct CookieSigner {
    secret: String,
}

impl std::fmt::Debug for CookieSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CookieSigner").finish_non_exhaustive()
    }
}

impl CookieSigner {
    /// Create a signer for `secret`
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    fn digest(&self, token: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.secret.as_bytes());
        hasher.update(b":");
        hasher.update(token.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    /// Produce the cookie value for `token`
    pub fn sign(&self, token: &str) -> String {
        format!("{}.{}", token, self.digest(token))
    }

    /// Recover the token from a cookie value, if the signature holds
    pub fn verify(&self, value: &str) -> Option<SessionToken> {
        let (token, digest) = value.rsplit_once('.')?;
        if token.is_empty() {
            return None;
        }
        let expected = self.digest(token);
        if constant_time_eq(expected.as_bytes(), digest.as_bytes()) {
            Some(token.to_string())
        } else {
            None
        }
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Exact comparison of a submitted login password against the configured one
pub fn password_matches(expected: &str, submitted: &str) -> bool {
    constant_time_eq(expected.as_bytes(), submitted.as_bytes())
}

/// Find a cookie by name across all `Cookie` headers
pub fn read_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim_matches('"').to_string())
}

/// `Set-Cookie` value establishing a session
pub fn session_cookie(value: &str, max_age_secs: i64) -> String {
    format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        SESSION_COOKIE, value, max_age_secs
    )
}

/// `Set-Cookie` value removing the session cookie
pub fn clear_session_cookie() -> String {
    format!(
        "{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0",
        SESSION_COOKIE
    )
}
