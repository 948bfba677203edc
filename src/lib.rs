//! Newsletter Portal Library
//!
//! Editor-facing web portal that forwards generate, save, send and review
//! actions to the newsletter backend and third-party services. The binary is
//! in `src/main.rs`; modules are public for integration tests.

pub mod api;
pub mod app;
pub mod clients;
pub mod config;
pub mod error;
pub mod orchestrator;
/// Login sessions and the authentication extractor
pub mod session;
/// Application state and the newsletter model
///
/// Holds the process-lifetime ledger of observed newsletter status.
pub mod state;
pub mod templates;
