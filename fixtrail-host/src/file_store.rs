//! File-backed state store.
//!
//! All slots live in a single JSON document (slot name to base64-encoded
//! blob). Writes go to a temporary file in the same directory followed by
//! a rename, so a flush lands either completely or not at all - the
//! both-or-neither contract of
//! [`StateStore::write_all`](fixtrail_core::StateStore::write_all).

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use directories::ProjectDirs;
use fixtrail_core::{StateStore, StoreError};

/// Name of the state document inside the project data directory.
const STATE_FILE_NAME: &str = "state.json";

/// `StateStore` backed by one JSON document on disk.
pub struct FileStateStore {
    path: PathBuf,
    slots: BTreeMap<String, Vec<u8>>,
}

impl FileStateStore {
    /// Open the store at `path`, loading any existing document.
    ///
    /// A missing document starts empty; a malformed one is logged and
    /// also starts empty, matching the engine's treatment of corrupt
    /// state. I/O failures other than "not found" surface as
    /// [`StoreError::Backend`].
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let slots = match fs::read(&path) {
            Ok(bytes) => match Self::parse_document(&bytes) {
                Ok(slots) => slots,
                Err(err) => {
                    log::warn!(
                        "state document {} is malformed ({}), starting empty",
                        path.display(),
                        err
                    );
                    BTreeMap::new()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => BTreeMap::new(),
            Err(err) => {
                return Err(StoreError::Backend(format!(
                    "failed to read {}: {}",
                    path.display(),
                    err
                )))
            }
        };
        Ok(Self { path, slots })
    }

    /// Default state document path under the user's data directory, or
    /// `None` when no home directory can be determined.
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "fixtrail")
            .map(|dirs| dirs.data_local_dir().join(STATE_FILE_NAME))
    }

    /// Path of the backing document.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn parse_document(bytes: &[u8]) -> Result<BTreeMap<String, Vec<u8>>, String> {
        let encoded: BTreeMap<String, String> =
            serde_json::from_slice(bytes).map_err(|e| e.to_string())?;
        encoded
            .into_iter()
            .map(|(slot, value)| {
                BASE64
                    .decode(value.as_bytes())
                    .map(|bytes| (slot, bytes))
                    .map_err(|e| e.to_string())
            })
            .collect()
    }

    fn persist(&self, slots: &BTreeMap<String, Vec<u8>>) -> Result<(), StoreError> {
        let encoded: BTreeMap<&str, String> = slots
            .iter()
            .map(|(slot, bytes)| (slot.as_str(), BASE64.encode(bytes)))
            .collect();
        let document = serde_json::to_vec_pretty(&encoded)
            .map_err(|e| StoreError::Encode(e.to_string()))?;

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                StoreError::Backend(format!("failed to create {}: {}", parent.display(), e))
            })?;
        }

        // Temp file in the target directory so the rename stays on one
        // filesystem
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, &document).map_err(|e| {
            StoreError::Backend(format!("failed to write {}: {}", tmp.display(), e))
        })?;
        fs::rename(&tmp, &self.path).map_err(|e| {
            StoreError::Backend(format!("failed to commit {}: {}", self.path.display(), e))
        })?;

        log::debug!(
            "persisted {} slot(s) to {}",
            slots.len(),
            self.path.display()
        );
        Ok(())
    }
}

impl StateStore for FileStateStore {
    fn read(&self, slot: &str) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.slots.get(slot).cloned())
    }

    fn write_all(&mut self, entries: &[(&str, &[u8])]) -> Result<(), StoreError> {
        // Stage, persist, then commit to memory, so a failed disk write
        // leaves the previous slots visible
        let mut staged = self.slots.clone();
        for (slot, bytes) in entries {
            staged.insert((*slot).to_string(), bytes.to_vec());
        }
        self.persist(&staged)?;
        self.slots = staged;
        Ok(())
    }
}
