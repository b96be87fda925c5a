//! In-memory state store for tests and embedding.

use std::collections::HashMap;

use crate::store::{StateStore, StoreError};

/// A `StateStore` backed by a plain in-memory map.
///
/// Useful in tests and for hosts that do their own persistence elsewhere.
#[derive(Debug, Clone, Default)]
pub struct MemoryStateStore {
    slots: HashMap<String, Vec<u8>>,
}

impl MemoryStateStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with the given slots.
    pub fn with_slots<I>(slots: I) -> Self
    where
        I: IntoIterator<Item = (String, Vec<u8>)>,
    {
        Self {
            slots: slots.into_iter().collect(),
        }
    }
}

impl StateStore for MemoryStateStore {
    fn read(&self, slot: &str) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.slots.get(slot).cloned())
    }

    fn write_all(&mut self, entries: &[(&str, &[u8])]) -> Result<(), StoreError> {
        for (slot, bytes) in entries {
            self.slots.insert((*slot).to_string(), bytes.to_vec());
        }
        Ok(())
    }
}
