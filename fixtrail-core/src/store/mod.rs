//! Persisted State
//!
//! This module defines the contract between the engine and the host's
//! key-value storage, and the codec that turns the history snapshot and
//! the last-reported marker into opaque blobs.
//!
//! # Slots
//!
//! The engine uses exactly two addressable slots:
//!
//! - [`HISTORY_SLOT`] - the buffer snapshot in canonical newest-first order
//! - [`MARKER_SLOT`] - the last-reported position marker
//!
//! Both slots are always written together in a single [`StateStore::write_all`]
//! call, so persisted state is never partially updated.

mod codec;
mod memory;

pub use codec::*;
pub use memory::MemoryStateStore;

use thiserror::Error;

/// Slot holding the encoded history snapshot.
pub const HISTORY_SLOT: &str = "history";

/// Slot holding the encoded last-reported marker.
pub const MARKER_SLOT: &str = "marker";

/// Storage collaborator errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Persisted bytes could not be decoded. Callers treat this the same
    /// as absent state so the engine stays usable after an upgrade or a
    /// corruption event.
    #[error("corrupt persisted state: {0}")]
    Corrupt(String),

    /// In-memory state could not be encoded for persistence.
    #[error("state could not be encoded: {0}")]
    Encode(String),

    /// The storage backend failed to read or write.
    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Opaque key-value storage supplied by the host.
///
/// Implementations must honor the batch contract of [`write_all`]: either
/// every entry becomes visible to subsequent reads or none does. Beyond
/// that the blobs are opaque; the engine never interprets stored bytes
/// except through the codec in this module.
///
/// [`write_all`]: StateStore::write_all
pub trait StateStore: Send {
    /// Read the blob stored under `slot`, or `None` if the slot is absent.
    fn read(&self, slot: &str) -> Result<Option<Vec<u8>>, StoreError>;

    /// Write all entries as one unit, both-or-neither.
    fn write_all(&mut self, entries: &[(&str, &[u8])]) -> Result<(), StoreError>;
}
