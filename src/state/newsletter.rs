// Newsletter model and the portal's observation ledger
// The backend owns newsletter storage; the ledger only remembers what this
// process has seen happen to each identifier.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Backend-issued newsletter identifier, passed through unchanged
pub type NewsletterId = String;

/// Newsletter lifecycle as observed through the portal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NewsletterStatus {
    /// Generated or edited, not yet reviewed or sent
    Draft,
    /// AI feedback has been requested at least once
    Reviewed,
    /// Sent to the audience at least once
    Sent,
}

/// A newsletter as presented to the editor
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Newsletter {
    /// Backend-issued identifier
    pub id: NewsletterId,
    /// HTML body, opaque to the portal
    pub content: String,
    /// Observed status
    pub status: NewsletterStatus,
    /// Last time the portal saw this newsletter change
    pub last_modified: DateTime<Utc>,
}

/// What the portal has observed about one newsletter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LedgerEntry {
    /// Observed status
    pub status: NewsletterStatus,
    /// Last observed change
    pub last_modified: DateTime<Utc>,
    /// Number of real (non-test) sends forwarded
    pub send_count: u32,
}

impl LedgerEntry {
    fn new(status: NewsletterStatus) -> Self {
        Self {
            status,
            last_modified: Utc::now(),
            send_count: 0,
        }
    }
}

/// In-memory record of newsletter activity seen by this process
///
/// Never persisted and never consulted to allow or deny an action.
#[derive(Debug, Clone, Default)]
pub struct NewsletterLedger {
    entries: HashMap<NewsletterId, LedgerEntry>,
    latest_generated: Option<NewsletterId>,
}

impl NewsletterLedger {
    /// Create an empty ledger
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up what is known about a newsletter
    pub fn get(&self, id: &str) -> Option<&LedgerEntry> {
        self.entries.get(id)
    }

    /// Observed status, defaulting to draft for unknown identifiers
    pub fn status_of(&self, id: &str) -> NewsletterStatus {
        self.entries
            .get(id)
            .map(|e| e.status)
            .unwrap_or(NewsletterStatus::Draft)
    }

    /// Identifier of the most recent successful generation
    pub fn latest_generated(&self) -> Option<&NewsletterId> {
        self.latest_generated.as_ref()
    }

    /// A fresh newsletter came back from the backend
    pub fn record_generated(&mut self, id: &str) -> LedgerEntry {
        let entry = LedgerEntry::new(NewsletterStatus::Draft);
        self.entries.insert(id.to_string(), entry);
        self.latest_generated = Some(id.to_string());
        entry
    }

    /// An edit was persisted; status is kept
    pub fn record_saved(&mut self, id: &str) -> LedgerEntry {
        let entry = self
            .entries
            .entry(id.to_string())
            .or_insert_with(|| LedgerEntry::new(NewsletterStatus::Draft));
        entry.last_modified = Utc::now();
        *entry
    }

    /// AI feedback was returned; a sent newsletter stays sent
    pub fn record_reviewed(&mut self, id: &str) -> LedgerEntry {
        let entry = self
            .entries
            .entry(id.to_string())
            .or_insert_with(|| LedgerEntry::new(NewsletterStatus::Draft));
        if entry.status != NewsletterStatus::Sent {
            entry.status = NewsletterStatus::Reviewed;
        }
        *entry
    }

    /// A real send was forwarded; returns the updated entry
    pub fn record_sent(&mut self, id: &str) -> LedgerEntry {
        let entry = self
            .entries
            .entry(id.to_string())
            .or_insert_with(|| LedgerEntry::new(NewsletterStatus::Draft));
        entry.status = NewsletterStatus::Sent;
        entry.send_count += 1;
        *entry
    }
}
