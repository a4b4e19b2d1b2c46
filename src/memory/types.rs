//! Core record and outcome types for the memory store.

use serde::{Deserialize, Serialize};

/// The tracked individual a store handle is scoped to.
///
/// Every operation runs against an explicit subject — there is no process-wide
/// "current user".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    /// Stable identifier used for storage scoping and write locking.
    pub id: String,
    /// Display name substituted into the graph form ("Alice loves hiking").
    pub name: String,
}

impl Subject {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// An accepted statement, stored in both grammatical forms.
///
/// Created only through the store's accept path; the embedding lives in the
/// vector table and is never exposed here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryRecord {
    /// UUID v7 (time-sortable), assigned on acceptance.
    pub id: String,
    /// Subject this statement is about.
    pub subject_id: String,
    /// The statement as captured, first person.
    pub raw_text: String,
    /// Second-person restatement, stored in the local index.
    pub local_form: String,
    /// Third-person restatement, stored in the graph service.
    pub graph_form: String,
    /// Topic labels — never empty; `["unknown"]` when nothing classified.
    pub topics: Vec<String>,
    /// Informational score in `[0.0, 1.0]`; never gates acceptance.
    pub confidence: f64,
    /// `true` if another actor stated this on the subject's behalf.
    pub is_proxy: bool,
    /// Identifier of that actor; present exactly when `is_proxy` is set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proxy_source: Option<String>,
    /// RFC 3339 creation timestamp.
    pub created_at: String,
}

/// Which mirrored backend writes succeeded for a stored record.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct BackendWrites {
    /// Local SQLite index write.
    pub local: bool,
    /// Remote graph service write (best effort).
    pub graph: bool,
}

/// Outcome of a store call. A duplicate is a normal outcome, not an error.
#[derive(Debug, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum StoreOutcome {
    /// The statement was new and written.
    Stored {
        record: MemoryRecord,
        backends: BackendWrites,
    },
    /// The statement duplicates an existing record.
    Duplicate {
        /// Id of the pre-existing record.
        existing_id: String,
        /// Cosine similarity that triggered the rejection (1.0 for an exact
        /// text match).
        similarity: f64,
    },
}

impl StoreOutcome {
    /// `Some(record)` when a new record was written.
    pub fn record(&self) -> Option<&MemoryRecord> {
        match self {
            StoreOutcome::Stored { record, .. } => Some(record),
            StoreOutcome::Duplicate { .. } => None,
        }
    }

    pub fn is_duplicate(&self) -> bool {
        matches!(self, StoreOutcome::Duplicate { .. })
    }
}

/// Caller-supplied knobs for a store call.
#[derive(Debug, Clone, Default)]
pub struct StoreOptions {
    /// Replace the classified topic set with these labels verbatim.
    pub topics: Option<Vec<String>>,
    /// Statement was generated on the subject's behalf by another actor.
    pub is_proxy: bool,
    /// Identifier of that actor; required when `is_proxy` is set.
    pub proxy_source: Option<String>,
}

/// A ranked search hit.
#[derive(Debug, Clone, Serialize)]
pub struct SearchHit {
    pub record: MemoryRecord,
    /// Combined content + topic score used for ordering.
    pub score: f64,
    /// Cosine similarity between query and record embeddings.
    pub content_similarity: f64,
    /// Topic-label match score (1.0 exact, partial for substring, else 0).
    pub topic_score: f64,
}
