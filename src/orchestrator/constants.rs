//! Orchestrator constants
//!
//! Centralized constants used throughout the orchestrator module.

/// Response text for a review in mock mode
pub const MOCK_REVIEW: &str = "[MOCK] Looks great!";

/// Prefix of every mock-mode message
pub const MOCK_PREFIX: &str = "[MOCK]";

/// Notes placeholder in commit messages when the editor left none
pub const NO_EDITOR_NOTES: &str = "n/a";

/// Filename pattern for identifiers the portal has to issue itself
/// Format: "newsletter_{timestamp}.html"
pub const FALLBACK_ID_PREFIX: &str = "newsletter_";
