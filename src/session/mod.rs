//! Login sessions
//!
//! Server-side token store, signed cookie handling and the extractor that
//! gates protected handlers.

pub mod cookie;
pub mod extract;
pub mod store;

pub use cookie::{
    clear_session_cookie, password_matches, read_cookie, session_cookie, CookieSigner,
    SESSION_COOKIE,
};
pub use extract::{login_url, safe_next, AuthRejection, Authenticated};
pub use store::{SessionEntry, SessionStore, SessionToken};
