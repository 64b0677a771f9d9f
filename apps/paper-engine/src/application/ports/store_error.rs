//! Errors returned by persistence adapters.

use thiserror::Error;

/// Persistence failure reported by a store adapter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Backend unreachable or the write failed.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// Referenced record does not exist.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Kind of record.
        entity: &'static str,
        /// Record identifier.
        id: String,
    },

    /// Write rejected because it conflicts with stored state.
    #[error("store conflict: {0}")]
    Conflict(String),
}
