//! Significant-change detection.
//!
//! A movement is significant when the great-circle distance from the last
//! reported marker strictly exceeds the configured threshold. The first
//! ever fix is always significant.

use crate::position::PositionFix;

/// Default significant-change threshold in meters.
pub const DEFAULT_THRESHOLD_METERS: f64 = 100.0;

/// Sentinel distance reported when no marker exists yet.
pub const NO_MARKER_DISTANCE: f64 = f64::MAX;

/// Result of a significance evaluation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Evaluation {
    /// Whether the candidate should be reported and become the new marker.
    pub significant: bool,
    /// Distance from the marker in meters; [`NO_MARKER_DISTANCE`] when no
    /// marker exists.
    pub distance_meters: f64,
}

/// Distance-threshold significant-change detector.
///
/// Pure: evaluation has no side effects and performs no I/O.
#[derive(Debug, Clone, Copy)]
pub struct ChangeDetector {
    threshold_meters: f64,
}

impl Default for ChangeDetector {
    fn default() -> Self {
        ChangeDetector::new(DEFAULT_THRESHOLD_METERS)
    }
}

impl ChangeDetector {
    /// Create a detector with the given threshold in meters.
    pub fn new(threshold_meters: f64) -> Self {
        Self { threshold_meters }
    }

    /// Configured threshold in meters.
    pub fn threshold_meters(&self) -> f64 {
        self.threshold_meters
    }

    /// Decide whether `candidate` is a significant movement away from
    /// `marker`.
    ///
    /// With no marker the candidate is unconditionally significant and the
    /// distance is the [`NO_MARKER_DISTANCE`] sentinel. Otherwise the
    /// comparison is strictly greater-than: a candidate exactly at the
    /// threshold is not significant.
    pub fn evaluate(&self, candidate: &PositionFix, marker: Option<&PositionFix>) -> Evaluation {
        match marker {
            None => Evaluation {
                significant: true,
                distance_meters: NO_MARKER_DISTANCE,
            },
            Some(marker) => {
                let distance_meters = marker.distance_to(candidate);
                Evaluation {
                    significant: distance_meters > self.threshold_meters,
                    distance_meters,
                }
            }
        }
    }
}
