// State management module
// Handles shared application state and the newsletter model

pub mod app_state;
pub mod newsletter;

pub use app_state::{AppState, SharedState};
pub use newsletter::{LedgerEntry, Newsletter, NewsletterId, NewsletterLedger, NewsletterStatus};
