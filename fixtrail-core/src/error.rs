//! Engine error taxonomy.
//!
//! Structural and configuration errors surface immediately to the caller.
//! Persistence errors are reported but never invalidate in-memory state;
//! the engine stays usable from memory even while storage is failing.

use thiserror::Error;

use crate::store::StoreError;

/// Errors returned by the history engine and its components.
#[derive(Debug, Error)]
pub enum HistoryError {
    /// Buffer capacity must be greater than zero.
    #[error("history capacity must be greater than zero")]
    InvalidCapacity,

    /// A seed sequence exceeded the buffer capacity.
    #[error("seed of {len} fixes exceeds capacity {capacity}")]
    SeedTooLarge { len: usize, capacity: usize },

    /// An operation was called before `configure`.
    #[error("engine is not configured")]
    NotConfigured,

    /// A query ran against an empty history.
    #[error("no position fixes recorded yet")]
    NoData,

    /// The storage collaborator failed; in-memory state is unaffected.
    #[error(transparent)]
    Store(#[from] StoreError),
}
