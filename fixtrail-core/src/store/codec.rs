//! JSON codec for the history snapshot and the marker.
//!
//! The persisted format is JSON: an array of fixes for the history slot
//! and either a fix object or an explicit `null` for the marker slot.
//! `null` is the "absent marker" encoding, so a round-trip through the
//! store distinguishes "never reported" from "slot missing".

use crate::position::PositionFix;
use crate::store::StoreError;

/// Encode a history snapshot, given in canonical newest-first order.
pub fn encode_history(snapshot: &[PositionFix]) -> Result<Vec<u8>, StoreError> {
    serde_json::to_vec(snapshot).map_err(|e| StoreError::Encode(e.to_string()))
}

/// Decode a history snapshot, returned in canonical newest-first order.
///
/// Malformed input fails with [`StoreError::Corrupt`].
pub fn decode_history(bytes: &[u8]) -> Result<Vec<PositionFix>, StoreError> {
    serde_json::from_slice(bytes).map_err(|e| StoreError::Corrupt(e.to_string()))
}

/// Encode the last-reported marker; `None` encodes as JSON `null`.
pub fn encode_marker(marker: Option<&PositionFix>) -> Result<Vec<u8>, StoreError> {
    serde_json::to_vec(&marker).map_err(|e| StoreError::Encode(e.to_string()))
}

/// Decode the last-reported marker; JSON `null` decodes as `None`.
///
/// Malformed input fails with [`StoreError::Corrupt`].
pub fn decode_marker(bytes: &[u8]) -> Result<Option<PositionFix>, StoreError> {
    serde_json::from_slice(bytes).map_err(|e| StoreError::Corrupt(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fix(latitude: f64, longitude: f64) -> PositionFix {
        PositionFix::new(latitude, longitude, 5.0, 1_700_000_000_000)
    }

    #[test]
    fn test_history_round_trip() {
        let snapshot = vec![fix(48.0, 2.0), fix(48.1, 2.1), fix(48.2, 2.2)];
        let bytes = encode_history(&snapshot).unwrap();

        assert_eq!(decode_history(&bytes).unwrap(), snapshot);
    }

    #[test]
    fn test_empty_history_round_trip() {
        let bytes = encode_history(&[]).unwrap();
        assert_eq!(decode_history(&bytes).unwrap(), Vec::<PositionFix>::new());
    }

    #[test]
    fn test_marker_round_trip() {
        let marker = fix(48.8566, 2.3522);
        let bytes = encode_marker(Some(&marker)).unwrap();

        assert_eq!(decode_marker(&bytes).unwrap(), Some(marker));
    }

    #[test]
    fn test_absent_marker_is_explicit_null() {
        let bytes = encode_marker(None).unwrap();
        assert_eq!(bytes, b"null");
        assert_eq!(decode_marker(&bytes).unwrap(), None);
    }

    #[test]
    fn test_malformed_input_is_corrupt() {
        assert!(matches!(
            decode_history(b"{not json"),
            Err(StoreError::Corrupt(_))
        ));
        assert!(matches!(
            decode_marker(b"\"latitude\""),
            Err(StoreError::Corrupt(_))
        ));
    }
}
