//! Single-flight guard for newsletter generation
//!
//! Generation is slow and expensive on the backend, so at most one request
//! per process is forwarded at a time. A second request fails fast instead of
//! queueing.

use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};

/// Tracks whether a generation request is in flight
#[derive(Debug, Default)]
pub struct GenerationGuard {
    running: AtomicBool,
}

/// Held while a generation is running; releases the guard on drop
#[derive(Debug)]
pub struct GenerationTicket<'a> {
    guard: &'a GenerationGuard,
}

impl GenerationGuard {
    /// Create an idle guard
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the guard, or `None` if a generation is already running
    pub fn try_start(&self) -> Option<GenerationTicket<'_>> {
        self.running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| GenerationTicket { guard: self })
    }

    /// Whether a generation is running right now
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }
}

impl Drop for GenerationTicket<'_> {
    fn drop(&mut self) {
        self.guard.running.store(false, Ordering::Release);
    }
}

/// Coarse generation state reported to the dashboard
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum GenerationStatus {
    /// A generation request is being forwarded
    InProgress {
        /// Human-readable status
        message: String,
    },
    /// At least one generation finished in this process
    Completed {
        /// Human-readable status
        message: String,
        /// Most recently generated identifier
        latest_newsletter_id: String,
    },
    /// Nothing running and nothing generated yet
    Idle {
        /// Human-readable status
        message: String,
    },
}
