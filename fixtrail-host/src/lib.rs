//! Fixtrail Host
//!
//! Native glue around `fixtrail-core`: a file-backed implementation of the
//! engine's [`StateStore`](fixtrail_core::StateStore) contract and a
//! background executor that keeps storage writes off latency-sensitive
//! sampling callbacks.
//!
//! The `fixtrail-replay` binary in this crate replays a recorded track
//! file through a configured engine.

pub mod file_store;
pub mod flusher;

pub use file_store::FileStateStore;
pub use flusher::{BackgroundFlusher, SharedEngine};
