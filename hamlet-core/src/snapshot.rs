//! Plain JSON snapshots of a [`MemoryStream`].
//!
//! A snapshot is a JSON array of [`MemoryRecord`]s in stream order, with the
//! record field names used everywhere else. Capacity is not part of the
//! snapshot; the loader supplies it.

use std::path::Path;

use tracing::debug;

use crate::error::{HamletError, Result};
use crate::memory::{MemoryRecord, MemoryStream};

/// Serialize the stream to a JSON array.
///
/// # Errors
/// Returns [`HamletError::Serialization`] if encoding fails.
pub fn to_json(stream: &MemoryStream) -> Result<String> {
    serde_json::to_string_pretty(stream.records()).map_err(|e| HamletError::Serialization(e.to_string()))
}

/// Rebuild a stream from a JSON array, applying `capacity`.
///
/// # Errors
/// Returns [`HamletError::Serialization`] on malformed input, including
/// out-of-range importance values.
pub fn from_json(text: &str, capacity: usize) -> Result<MemoryStream> {
    let records: Vec<MemoryRecord> =
        serde_json::from_str(text).map_err(|e| HamletError::Serialization(e.to_string()))?;
    Ok(MemoryStream::from_records(records, capacity))
}

/// Write a snapshot file, replacing any existing one.
///
/// # Errors
/// Returns an error if encoding or writing fails.
pub fn save_to_file(stream: &MemoryStream, path: &Path) -> Result<()> {
    let json = to_json(stream)?;
    std::fs::write(path, &json)?;
    debug!(path = %path.display(), records = stream.len(), "Wrote memory snapshot");
    Ok(())
}

/// Read a snapshot file.
///
/// # Errors
/// Returns an error if the file cannot be read or decoded.
pub fn load_from_file(path: &Path, capacity: usize) -> Result<MemoryStream> {
    let text = std::fs::read_to_string(path)?;
    let stream = from_json(&text, capacity)?;
    debug!(path = %path.display(), records = stream.len(), "Read memory snapshot");
    Ok(stream)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{Importance, MemoryKind, NewMemory};
    use crate::types::CharacterId;
    use chrono::{Duration, TimeZone, Utc};

    fn sample() -> MemoryStream {
        let start = Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).single().expect("valid date");
        let mut stream = MemoryStream::new(3);
        for (i, importance) in [2u8, 5, 1, 4, 3].into_iter().enumerate() {
            let memory = NewMemory::new(
                MemoryKind::Action,
                format!("event {i}"),
                Importance::new(importance).expect("valid importance"),
            )
            .about(CharacterId::new("bob"));
            stream.add(memory, start + Duration::minutes(i64::try_from(i).expect("small")));
        }
        stream
    }

    #[test]
    fn json_round_trip_preserves_order_and_fields() {
        let stream = sample();
        assert_eq!(stream.len(), 3);

        let json = to_json(&stream).expect("serialize");
        let restored = from_json(&json, 3).expect("deserialize");
        assert_eq!(restored, stream);
        assert!(restored.iter().zip(restored.iter().skip(1)).all(|(a, b)| a.created_at <= b.created_at));
    }

    #[test]
    fn empty_related_ids_are_serialized() {
        let mut stream = MemoryStream::new(2);
        stream.add(NewMemory::new(MemoryKind::Custom, "note", Importance::TRIVIAL), Utc::now());
        let json = to_json(&stream).expect("serialize");
        assert!(json.contains("\"related_character_ids\": []"));
    }

    #[test]
    fn rejects_bad_importance() {
        let json = r#"[{"kind":"action","content":"x","importance":9,
                        "created_at":"2024-01-01T00:00:00Z","related_character_ids":[]}]"#;
        assert!(matches!(from_json(json, 5), Err(HamletError::Serialization(_))));
    }

    #[test]
    fn smaller_capacity_on_load_evicts() {
        let json = to_json(&sample()).expect("serialize");
        let restored = from_json(&json, 1).expect("deserialize");
        assert_eq!(restored.len(), 1);
        assert_eq!(restored.records()[0].importance, Importance::DIALOGUE);
    }

    #[test]
    fn file_round_trip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("alice.json");
        let stream = sample();
        save_to_file(&stream, &path).expect("save");
        let loaded = load_from_file(&path, 3).expect("load");
        assert_eq!(loaded, stream);
    }
}
