//! Position fix value type and great-circle distance.

use serde::{Deserialize, Serialize};

/// Mean earth radius in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Meters per degree of latitude on the great circle.
pub const METERS_PER_DEGREE_LATITUDE: f64 = EARTH_RADIUS_M * std::f64::consts::PI / 180.0;

/// A single position fix produced by the host's location sensor.
///
/// Plain immutable value: the engine never mutates a fix after ingest,
/// and each buffer slot owns its copy outright. Serialized field names
/// match the persisted wire format (`time` for the timestamp).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PositionFix {
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
    /// Estimated horizontal accuracy in meters (>= 0).
    pub accuracy: f64,
    /// Fix timestamp in milliseconds since the Unix epoch.
    #[serde(rename = "time")]
    pub timestamp_ms: u64,
}

impl PositionFix {
    /// Create a new position fix.
    pub fn new(latitude: f64, longitude: f64, accuracy: f64, timestamp_ms: u64) -> Self {
        Self {
            latitude,
            longitude,
            accuracy,
            timestamp_ms,
        }
    }

    /// Great-circle (haversine) distance to another fix, in meters.
    pub fn distance_to(&self, other: &PositionFix) -> f64 {
        let phi1 = self.latitude.to_radians();
        let phi2 = other.latitude.to_radians();
        let delta_phi = (other.latitude - self.latitude).to_radians();
        let delta_lambda = (other.longitude - self.longitude).to_radians();

        let a = (delta_phi / 2.0).sin().powi(2)
            + phi1.cos() * phi2.cos() * (delta_lambda / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

        EARTH_RADIUS_M * c
    }
}
