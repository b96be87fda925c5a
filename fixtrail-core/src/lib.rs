//! Fixtrail Core
//!
//! Platform-independent engine that keeps a bounded history of recent
//! position fixes and decides, for each new fix, whether it represents a
//! significant movement worth reporting and remembering.
//!
//! This crate contains no I/O, no async and no platform-specific code.
//! The host supplies every external collaborator through a trait:
//!
//! - [`store::StateStore`] - opaque key-value persistence (e.g. a file,
//!   UserDefaults, SharedPreferences)
//! - [`lifecycle::SamplingDriver`] - the location sensor that actually
//!   starts and stops sampling
//! - [`lifecycle::AuthorizationSource`] - the platform's location
//!   authorization state
//!
//! # Architecture
//!
//! - **history**: fixed-capacity circular buffer of position fixes
//! - **store**: persistence codec and the key-value store contract
//! - **detector**: significant-change decision (great-circle distance
//!   against a threshold)
//! - **lifecycle**: foreground/background controller selecting the
//!   sampling strategy, plus the single-flight authorization request guard
//! - **engine**: the façade composing the above
//!
//! # Example
//!
//! ```rust,ignore
//! use fixtrail_core::{EngineConfig, HistoryEngine, MemoryStateStore, PositionFix};
//!
//! let mut engine = HistoryEngine::new();
//! engine.configure(EngineConfig::default(), Box::new(MemoryStateStore::new()))?;
//!
//! let outcome = engine.ingest(PositionFix::new(48.8566, 2.3522, 5.0, 1_700_000_000_000))?;
//! if outcome.significant {
//!     // dispatch a notification carrying engine.last_reported()
//! }
//! ```

pub mod detector;
pub mod engine;
pub mod error;
pub mod history;
pub mod lifecycle;
pub mod position;
pub mod store;

// Re-export commonly used types
pub use detector::{ChangeDetector, Evaluation, DEFAULT_THRESHOLD_METERS, NO_MARKER_DISTANCE};
pub use engine::{EngineConfig, HistoryEngine, IngestOutcome, DEFAULT_CAPACITY};
pub use error::HistoryError;
pub use history::BoundedHistory;
pub use lifecycle::{
    AuthorizationRequest, AuthorizationSource, AuthorizationStatus, LifecycleConfig,
    LifecycleController, PermissionError, RunState, SamplingDriver, SamplingMode,
    DEFAULT_DISTANCE_FILTER_METERS,
};
pub use position::{PositionFix, EARTH_RADIUS_M, METERS_PER_DEGREE_LATITUDE};
pub use store::{MemoryStateStore, StateStore, StoreError, HISTORY_SLOT, MARKER_SLOT};
