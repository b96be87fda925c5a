//! Bounded Position History
//!
//! This module stores a fixed-capacity history of recent position fixes,
//! evicting the oldest fix once the buffer is full.
//!
//! # Features
//!
//! - O(1) insertion and last-element access
//! - Deterministic newest-first iteration order
//! - Lazy iteration over the most recent `n` elements
//!
//! # Example
//!
//! ```rust,ignore
//! use fixtrail_core::history::BoundedHistory;
//!
//! let mut history = BoundedHistory::new(3)?;
//! history.add(fix1);
//! history.add(fix2);
//!
//! // Newest first
//! let snapshot = history.snapshot();
//! assert_eq!(snapshot[0], fix2);
//! ```

mod buffer;

pub use buffer::*;
