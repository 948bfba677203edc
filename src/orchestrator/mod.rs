//! Orchestrator module
//!
//! Mediates between editor actions and the external services. The
//! [`Portal`] owns one client per configured collaborator and the in-memory
//! ledger of what this process has observed.

pub mod constants;
pub mod content;
pub mod generation;
pub mod portal;

pub use generation::GenerationStatus;
pub use portal::{
    FeatureAvailability, GeneratedNewsletter, NewsletterListing, Portal, ReviewFeedback,
    SaveReceipt, SendReceipt,
};
