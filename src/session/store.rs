// Session store
// Maps opaque session tokens to an authenticated flag with an expiry.

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

// Ten years; keeps `now + ttl` far from chrono's range limits
const MAX_TTL_SECS: u64 = 10 * 365 * 24 * 60 * 60;

/// Opaque session token handed to the browser (inside a signed cookie)
pub type SessionToken = String;

/// A single session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionEntry {
    /// Set once the password check succeeded
    pub authenticated: bool,
    /// Moment after which the session no longer counts
    pub expires_at: DateTime<Utc>,
}

impl SessionEntry {
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// Server-side session registry shared by all request handlers
#[derive(Debug, Clone)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<SessionToken, SessionEntry>>>,
    ttl: Duration,
}

impl SessionStore {
    /// Create a store whose sessions live for `ttl_secs` seconds
    pub fn new(ttl_secs: u64) -> Self {
        let ttl_secs = ttl_secs.min(MAX_TTL_SECS) as i64;
        Self::with_ttl(Duration::seconds(ttl_secs))
    }

    /// Create a store with an explicit lifetime
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            ttl,
        }
    }

    /// Session lifetime
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Start a new authenticated session and return its token
    pub async fn create_authenticated(&self) -> SessionToken {
        let token = Uuid::new_v4().simple().to_string();
        let entry = SessionEntry {
            authenticated: true,
            expires_at: Utc::now() + self.ttl,
        };

        let mut sessions = self.sessions.write().await;
        sessions.retain(|_, e| !e.is_expired(Utc::now()));
        sessions.insert(token.clone(), entry);
        tracing::debug!(active_sessions = sessions.len(), "Session created");
        token
    }

    /// Whether `token` names a live, authenticated session
    ///
    /// Expired sessions are removed on lookup.
    pub async fn is_authenticated(&self, token: &str) -> bool {
        let now = Utc::now();
        let expired = {
            let sessions = self.sessions.read().await;
            match sessions.get(token) {
                Some(entry) if !entry.is_expired(now) => return entry.authenticated,
                Some(_) => true,
                None => false,
            }
        };

        if expired {
            self.sessions.write().await.remove(token);
            tracing::debug!("Expired session removed");
        }
        false
    }

    /// End a session; returns whether it existed
    pub async fn revoke(&self, token: &str) -> bool {
        self.sessions.write().await.remove(token).is_some()
    }

    /// Drop every expired session; returns how many were removed
    pub async fn purge_expired(&self) -> usize {
        let now = Utc::now();
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, e| !e.is_expired(now));
        before - sessions.len()
    }

    /// Number of stored sessions, expired ones included
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Whether no sessions are stored
    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_new_session_is_authenticated() {
        let store = SessionStore::new(3600);
        let token = store.create_authenticated().await;
        assert!(store.is_authenticated(&token).await);
        assert!(!store.is_authenticated("someone-else").await);
    }

    #[tokio::test]
    async fn test_revoke_ends_session() {
        let store = SessionStore::new(3600);
        let token = store.create_authenticated().await;
        assert!(store.revoke(&token).await);
        assert!(!store.is_authenticated(&token).await);
        assert!(!store.revoke(&token).await);
    }

    #[tokio::test]
    async fn test_expired_session_is_rejected_and_removed() {
        let store = SessionStore::with_ttl(Duration::zero());
        let token = store.create_authenticated().await;
        assert_eq!(store.len().await, 1);
        assert!(!store.is_authenticated(&token).await);
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_purge_expired() {
        let store = SessionStore::with_ttl(Duration::seconds(-1));
        store.create_authenticated().await;
        store.create_authenticated().await;
        // Creation itself purges older expired entries, so only the last remains
        assert_eq!(store.len().await, 1);
        assert_eq!(store.purge_expired().await, 1);
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_tokens_are_unique() {
        let store = SessionStore::new(60);
        let a = store.create_authenticated().await;
        let b = store.create_authenticated().await;
        assert_ne!(a, b);
        assert_eq!(a.len(), 32);
    }
}
