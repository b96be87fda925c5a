//! History Engine
//!
//! The façade composing the bounded history, the persistence codec, the
//! change detector and the store collaborator. Hosts feed every new fix
//! through [`HistoryEngine::ingest`] and dispatch their own notification
//! when the outcome says the movement was significant; the engine itself
//! never pushes events.
//!
//! All mutating operations take `&mut self`, so ownership serializes them.
//! Hosts that share the engine across threads (e.g. a sensor callback and
//! a background flush executor) wrap it in `Arc<Mutex<_>>`.

use crate::detector::ChangeDetector;
use crate::error::HistoryError;
use crate::history::BoundedHistory;
use crate::position::PositionFix;
use crate::store::{
    decode_history, decode_marker, encode_history, encode_marker, StateStore, StoreError,
    HISTORY_SLOT, MARKER_SLOT,
};

/// Default history buffer capacity.
pub const DEFAULT_CAPACITY: usize = 20;

/// Engine configuration.
#[derive(Debug, Clone, Copy)]
pub struct EngineConfig {
    /// History buffer capacity; must be greater than zero.
    pub capacity: usize,
    /// Significant-change threshold in meters.
    pub threshold_meters: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            capacity: DEFAULT_CAPACITY,
            threshold_meters: crate::detector::DEFAULT_THRESHOLD_METERS,
        }
    }
}

/// What happened to one ingested fix.
#[derive(Debug)]
pub struct IngestOutcome {
    /// The fix was added to the history buffer. Always true today; ingest
    /// never drops a fix.
    pub stored: bool,
    /// The fix was a significant movement and is now the reported marker.
    /// The caller is responsible for dispatching any external notification.
    pub significant: bool,
    /// Distance from the previous marker in meters;
    /// [`NO_MARKER_DISTANCE`](crate::detector::NO_MARKER_DISTANCE) for the
    /// first ever fix.
    pub distance_meters: f64,
    /// Set when a background-triggered flush failed. In-memory state is
    /// unaffected and stays authoritative.
    pub flush_error: Option<StoreError>,
}

/// Configured engine internals; absent until `configure` succeeds.
struct Configured {
    history: BoundedHistory<PositionFix>,
    marker: Option<PositionFix>,
    detector: ChangeDetector,
    store: Box<dyn StateStore>,
}

/// Bounded-history and significant-change engine.
///
/// Created unconfigured; every operation other than
/// [`configure`](HistoryEngine::configure) fails with
/// [`HistoryError::NotConfigured`] until configuration succeeds.
#[derive(Default)]
pub struct HistoryEngine {
    state: Option<Configured>,
    background: bool,
}

impl HistoryEngine {
    /// Create an unconfigured engine.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configure the engine and seed it from the store.
    ///
    /// Fails with [`HistoryError::InvalidCapacity`] per the buffer
    /// contract. Absent or corrupt persisted slots seed an empty buffer
    /// and marker; configuration never fails because of prior state. A
    /// persisted snapshot longer than the configured capacity keeps only
    /// the newest `capacity` fixes.
    pub fn configure(
        &mut self,
        config: EngineConfig,
        store: Box<dyn StateStore>,
    ) -> Result<(), HistoryError> {
        let mut history = BoundedHistory::new(config.capacity)?;

        if let Ok(Some(bytes)) = store.read(HISTORY_SLOT) {
            if let Ok(mut snapshot) = decode_history(&bytes) {
                snapshot.truncate(config.capacity);
                history = BoundedHistory::with_seed(config.capacity, snapshot)?;
            }
        }

        let mut marker = None;
        if let Ok(Some(bytes)) = store.read(MARKER_SLOT) {
            if let Ok(decoded) = decode_marker(&bytes) {
                marker = decoded;
            }
        }

        self.state = Some(Configured {
            history,
            marker,
            detector: ChangeDetector::new(config.threshold_meters),
            store,
        });
        Ok(())
    }

    /// Whether `configure` has succeeded.
    pub fn is_configured(&self) -> bool {
        self.state.is_some()
    }

    /// Ingest one new fix.
    ///
    /// The fix is always added to the history. If it is a significant
    /// movement away from the current marker, the marker is replaced by
    /// the fix. While backgrounded, every ingest also flushes to the
    /// store; a flush failure is reported in the outcome, never as an
    /// error, and in-memory state stays authoritative.
    pub fn ingest(&mut self, fix: PositionFix) -> Result<IngestOutcome, HistoryError> {
        let background = self.background;
        let state = self.state.as_mut().ok_or(HistoryError::NotConfigured)?;

        state.history.add(fix);

        let evaluation = state.detector.evaluate(&fix, state.marker.as_ref());
        if evaluation.significant {
            // Replaced, never mutated in place
            state.marker = Some(fix);
        }

        let flush_error = if background {
            Self::flush(state).err()
        } else {
            None
        };

        Ok(IngestOutcome {
            stored: true,
            significant: evaluation.significant,
            distance_meters: evaluation.distance_meters,
            flush_error,
        })
    }

    /// The newest `min(n, held)` fixes, newest-first.
    ///
    /// Fails with [`HistoryError::NoData`] when the history is empty;
    /// `n == 0` succeeds with an empty vec regardless.
    pub fn last_fixes(&self, n: usize) -> Result<Vec<PositionFix>, HistoryError> {
        let state = self.state.as_ref().ok_or(HistoryError::NotConfigured)?;
        if n == 0 {
            return Ok(Vec::new());
        }
        if state.history.is_empty() {
            return Err(HistoryError::NoData);
        }
        Ok(state.history.iter_recent(n).copied().collect())
    }

    /// The most recent fix.
    pub fn last_fix(&self) -> Result<PositionFix, HistoryError> {
        let state = self.state.as_ref().ok_or(HistoryError::NotConfigured)?;
        state.history.last().copied().ok_or(HistoryError::NoData)
    }

    /// The last fix the detector judged significant, if any.
    pub fn last_reported(&self) -> Option<PositionFix> {
        self.state.as_ref().and_then(|state| state.marker)
    }

    /// Persist the current snapshot and marker in one both-or-neither
    /// write. A failed write leaves in-memory state untouched.
    pub fn flush_to_store(&mut self) -> Result<(), HistoryError> {
        let state = self.state.as_mut().ok_or(HistoryError::NotConfigured)?;
        Self::flush(state).map_err(HistoryError::from)
    }

    /// Set the lifecycle background flag; normally driven by
    /// [`LifecycleController`](crate::lifecycle::LifecycleController).
    /// While backgrounded, every ingest flushes to the store.
    pub fn set_background(&mut self, background: bool) {
        self.background = background;
    }

    /// Current lifecycle background flag.
    pub fn is_background(&self) -> bool {
        self.background
    }

    fn flush(state: &mut Configured) -> Result<(), StoreError> {
        let history_bytes = encode_history(&state.history.snapshot())?;
        let marker_bytes = encode_marker(state.marker.as_ref())?;
        state.store.write_all(&[
            (HISTORY_SLOT, history_bytes.as_slice()),
            (MARKER_SLOT, marker_bytes.as_slice()),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detector::NO_MARKER_DISTANCE;
    use crate::position::METERS_PER_DEGREE_LATITUDE;
    use crate::store::MemoryStateStore;
    use std::sync::{Arc, Mutex};

    const ORIGIN_LAT: f64 = 48.8566;
    const ORIGIN_LON: f64 = 2.3522;

    /// A fix `meters` north of the origin.
    fn fix_at(meters: f64, timestamp_ms: u64) -> PositionFix {
        PositionFix::new(
            ORIGIN_LAT + meters / METERS_PER_DEGREE_LATITUDE,
            ORIGIN_LON,
            5.0,
            timestamp_ms,
        )
    }

    fn configured_engine(capacity: usize) -> HistoryEngine {
        let mut engine = HistoryEngine::new();
        engine
            .configure(
                EngineConfig {
                    capacity,
                    threshold_meters: 100.0,
                },
                Box::new(MemoryStateStore::new()),
            )
            .unwrap();
        engine
    }

    /// Store handle that stays observable after being moved into the engine.
    #[derive(Clone, Default)]
    struct SharedStore(Arc<Mutex<MemoryStateStore>>);

    impl StateStore for SharedStore {
        fn read(&self, slot: &str) -> Result<Option<Vec<u8>>, StoreError> {
            self.0.lock().unwrap().read(slot)
        }

        fn write_all(&mut self, entries: &[(&str, &[u8])]) -> Result<(), StoreError> {
            self.0.lock().unwrap().write_all(entries)
        }
    }

    /// Store whose writes always fail.
    struct FailingStore;

    impl StateStore for FailingStore {
        fn read(&self, _slot: &str) -> Result<Option<Vec<u8>>, StoreError> {
            Ok(None)
        }

        fn write_all(&mut self, _entries: &[(&str, &[u8])]) -> Result<(), StoreError> {
            Err(StoreError::Backend("disk full".to_string()))
        }
    }

    #[test]
    fn test_operations_before_configure_fail() {
        let mut engine = HistoryEngine::new();

        assert!(matches!(
            engine.ingest(fix_at(0.0, 1)),
            Err(HistoryError::NotConfigured)
        ));
        assert!(matches!(
            engine.last_fixes(3),
            Err(HistoryError::NotConfigured)
        ));
        assert!(matches!(
            engine.flush_to_store(),
            Err(HistoryError::NotConfigured)
        ));
    }

    #[test]
    fn test_configure_rejects_zero_capacity() {
        let mut engine = HistoryEngine::new();
        let result = engine.configure(
            EngineConfig {
                capacity: 0,
                threshold_meters: 100.0,
            },
            Box::new(MemoryStateStore::new()),
        );

        assert!(matches!(result, Err(HistoryError::InvalidCapacity)));
        assert!(!engine.is_configured());
    }

    #[test]
    fn test_first_fix_is_always_significant() {
        let mut engine = configured_engine(3);

        let outcome = engine.ingest(fix_at(0.0, 1)).unwrap();
        assert!(outcome.stored);
        assert!(outcome.significant);
        assert_eq!(outcome.distance_meters, NO_MARKER_DISTANCE);
        assert_eq!(engine.last_reported(), Some(fix_at(0.0, 1)));
    }

    #[test]
    fn test_threshold_scenario() {
        // capacity=3, threshold=100: S1 significant, S2 at 50 m is not,
        // S3 at 150 m is and becomes the marker
        let mut engine = configured_engine(3);

        let s1 = fix_at(0.0, 1);
        let s2 = fix_at(50.0, 2);
        let s3 = fix_at(150.0, 3);

        assert!(engine.ingest(s1).unwrap().significant);

        let second = engine.ingest(s2).unwrap();
        assert!(!second.significant);
        assert!((second.distance_meters - 50.0).abs() < 0.5);
        assert_eq!(engine.last_reported(), Some(s1));

        let third = engine.ingest(s3).unwrap();
        assert!(third.significant);
        assert!((third.distance_meters - 150.0).abs() < 0.5);
        assert_eq!(engine.last_reported(), Some(s3));
    }

    #[test]
    fn test_eviction_scenario() {
        // capacity=2: after S1, S2, S3 the snapshot is [S3, S2]
        let mut engine = configured_engine(2);

        let s1 = fix_at(0.0, 1);
        let s2 = fix_at(200.0, 2);
        let s3 = fix_at(400.0, 3);
        engine.ingest(s1).unwrap();
        engine.ingest(s2).unwrap();
        engine.ingest(s3).unwrap();

        assert_eq!(engine.last_fixes(10).unwrap(), vec![s3, s2]);
    }

    #[test]
    fn test_configure_with_corrupt_store_starts_empty() {
        let store = MemoryStateStore::with_slots([
            (HISTORY_SLOT.to_string(), b"{definitely not json".to_vec()),
            (MARKER_SLOT.to_string(), b"also corrupt".to_vec()),
        ]);

        let mut engine = HistoryEngine::new();
        engine
            .configure(EngineConfig::default(), Box::new(store))
            .unwrap();

        assert!(engine.is_configured());
        assert!(matches!(engine.last_fixes(1), Err(HistoryError::NoData)));
        assert_eq!(engine.last_reported(), None);
    }

    #[test]
    fn test_last_fixes_clamps_to_held_count() {
        let mut engine = configured_engine(5);
        let s1 = fix_at(0.0, 1);
        let s2 = fix_at(200.0, 2);
        engine.ingest(s1).unwrap();
        engine.ingest(s2).unwrap();

        assert_eq!(engine.last_fixes(5).unwrap(), vec![s2, s1]);
    }

    #[test]
    fn test_last_fix_returns_newest() {
        let mut engine = configured_engine(3);
        assert!(matches!(engine.last_fix(), Err(HistoryError::NoData)));

        engine.ingest(fix_at(0.0, 1)).unwrap();
        engine.ingest(fix_at(50.0, 2)).unwrap();

        assert_eq!(engine.last_fix().unwrap(), fix_at(50.0, 2));
    }

    #[test]
    fn test_last_fixes_zero_succeeds_on_empty_history() {
        let engine = configured_engine(3);

        assert_eq!(engine.last_fixes(0).unwrap(), Vec::new());
        assert!(matches!(engine.last_fixes(1), Err(HistoryError::NoData)));
    }

    #[test]
    fn test_persistence_round_trip_across_engines() {
        let store = SharedStore::default();

        let mut first = HistoryEngine::new();
        first
            .configure(EngineConfig::default(), Box::new(store.clone()))
            .unwrap();
        let s1 = fix_at(0.0, 1);
        let s2 = fix_at(150.0, 2);
        first.ingest(s1).unwrap();
        first.ingest(s2).unwrap();
        first.flush_to_store().unwrap();

        let mut second = HistoryEngine::new();
        second
            .configure(EngineConfig::default(), Box::new(store))
            .unwrap();

        assert_eq!(second.last_fixes(10).unwrap(), vec![s2, s1]);
        assert_eq!(second.last_reported(), Some(s2));
    }

    #[test]
    fn test_reconfigure_truncates_oversized_snapshot() {
        let store = SharedStore::default();

        let mut first = HistoryEngine::new();
        first
            .configure(
                EngineConfig {
                    capacity: 4,
                    threshold_meters: 100.0,
                },
                Box::new(store.clone()),
            )
            .unwrap();
        let fixes: Vec<_> = (0..4).map(|i| fix_at(i as f64 * 200.0, i)).collect();
        for fix in &fixes {
            first.ingest(*fix).unwrap();
        }
        first.flush_to_store().unwrap();

        // Smaller capacity keeps only the newest fixes; configure succeeds
        let mut second = HistoryEngine::new();
        second
            .configure(
                EngineConfig {
                    capacity: 2,
                    threshold_meters: 100.0,
                },
                Box::new(store),
            )
            .unwrap();

        assert_eq!(second.last_fixes(10).unwrap(), vec![fixes[3], fixes[2]]);
    }

    #[test]
    fn test_background_ingest_flushes() {
        let store = SharedStore::default();

        let mut engine = HistoryEngine::new();
        engine
            .configure(EngineConfig::default(), Box::new(store.clone()))
            .unwrap();
        engine.set_background(true);

        let outcome = engine.ingest(fix_at(0.0, 1)).unwrap();
        assert!(outcome.flush_error.is_none());

        let persisted = store.read(HISTORY_SLOT).unwrap().unwrap();
        assert_eq!(decode_history(&persisted).unwrap(), vec![fix_at(0.0, 1)]);
    }

    #[test]
    fn test_foreground_ingest_does_not_flush() {
        let store = SharedStore::default();

        let mut engine = HistoryEngine::new();
        engine
            .configure(EngineConfig::default(), Box::new(store.clone()))
            .unwrap();
        engine.ingest(fix_at(0.0, 1)).unwrap();

        assert_eq!(store.read(HISTORY_SLOT).unwrap(), None);
    }

    #[test]
    fn test_flush_failure_leaves_memory_authoritative() {
        let mut engine = HistoryEngine::new();
        engine
            .configure(EngineConfig::default(), Box::new(FailingStore))
            .unwrap();
        engine.set_background(true);

        let s1 = fix_at(0.0, 1);
        let outcome = engine.ingest(s1).unwrap();

        // Reported, not fatal; the fix and marker survive in memory
        assert!(outcome.flush_error.is_some());
        assert!(outcome.significant);
        assert_eq!(engine.last_fixes(1).unwrap(), vec![s1]);
        assert_eq!(engine.last_reported(), Some(s1));

        assert!(matches!(
            engine.flush_to_store(),
            Err(HistoryError::Store(StoreError::Backend(_)))
        ));
    }
}
