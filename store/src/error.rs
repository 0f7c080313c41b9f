use thiserror::Error;

/// Failures reported by any [`GrantStore`](crate::GrantStore) backend.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("not found: {0}")]
    NotFound(String),

    /// A batch tried to move a grant outside its allowed `remaining` range.
    #[error("invalid update: {0}")]
    InvalidUpdate(String),

    /// A batch was planned from a read that another writer has since changed.
    #[error("write conflict: {0}")]
    Conflict(String),

    #[error("backend error: {0}")]
    Backend(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    /// Stored data contradicts itself, e.g. an index entry with no grant.
    #[error("corrupted store: {0}")]
    Corruption(String),
}
