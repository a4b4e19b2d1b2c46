//! Typed error kinds for the memory core.
//!
//! Callers branch on kind, never on backend-specific message text. A
//! near-duplicate statement is *not* an error — it surfaces as
//! [`StoreOutcome::Duplicate`](crate::memory::types::StoreOutcome).

use thiserror::Error;

use crate::knowledge::Backend;

/// Errors surfaced by the public memory-core API.
#[derive(Debug, Error)]
pub enum Error {
    /// Empty or otherwise unusable input, rejected before any backend work.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// One backend (local index or graph service) could not be reached.
    #[error("{backend} backend unavailable: {reason}")]
    BackendUnavailable { backend: Backend, reason: String },

    /// Both knowledge backends failed, including the fallback attempt.
    #[error("all knowledge backends failed (local: {local}; graph: {graph})")]
    AllBackendsFailed { local: String, graph: String },

    /// The topic dictionary could not be loaded. The classifier degrades to
    /// the `unknown` sentinel instead of failing stores, so this kind only
    /// surfaces from explicit dictionary operations.
    #[error("topic dictionary unavailable: {0}")]
    DictionaryUnavailable(String),

    /// Local SQLite storage error.
    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    /// The embedding service failed or returned a malformed vector.
    #[error("embedding failed: {0}")]
    Embedding(String),
}

impl Error {
    /// Helper for wrapping a backend failure with its origin.
    pub fn backend(backend: Backend, reason: impl Into<String>) -> Self {
        Error::BackendUnavailable {
            backend,
            reason: reason.into(),
        }
    }
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;
