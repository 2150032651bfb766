// Snapshot codec for the persisted queue
//
// Wire format: a JSON array of QueuedRequest in insertion order.

use crate::domain::QueuedRequest;
use crate::error::Result;
use std::collections::HashSet;
use tracing::warn;

/// Serialize the queue (insertion order)
pub fn encode(items: &[QueuedRequest]) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec(items)?)
}

/// Parse a stored snapshot; any malformed content is an error, never a partial result
pub fn decode(bytes: &[u8]) -> Result<Vec<QueuedRequest>> {
    Ok(serde_json::from_slice(bytes)?)
}

/// Restore queue invariants on a parsed snapshot
///
/// Duplicate ids keep their first occurrence; an over-capacity snapshot is
/// trimmed from the oldest end. Returns the repaired items and whether
/// anything was dropped.
pub fn repair(items: Vec<QueuedRequest>, max_queue_size: usize) -> (Vec<QueuedRequest>, bool) {
    let original_len = items.len();
    let mut seen = HashSet::with_capacity(items.len());
    let mut unique: Vec<QueuedRequest> = items
        .into_iter()
        .filter(|item| seen.insert(item.id.clone()))
        .collect();

    let duplicates = original_len - unique.len();
    if duplicates > 0 {
        warn!(duplicates = duplicates, "Dropped duplicate ids from stored queue");
    }

    let overflow = unique.len().saturating_sub(max_queue_size);
    if overflow > 0 {
        warn!(
            overflow = overflow,
            max_queue_size = max_queue_size,
            "Stored queue exceeds capacity, trimming oldest entries"
        );
        unique.drain(..overflow);
    }

    let repaired = duplicates > 0 || overflow > 0;
    (unique, repaired)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{EnqueueSpec, HttpMethod, Priority};

    fn item(id: &str, created_at: i64) -> QueuedRequest {
        QueuedRequest::new(
            id,
            created_at,
            EnqueueSpec::new("/x", HttpMethod::Post).with_priority(Priority::Low),
        )
        .unwrap()
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(decode(b"not json").is_err());
        assert!(decode(br#"{"id": "x"}"#).is_err());
        // One bad element poisons the whole snapshot
        assert!(decode(br#"[{"id":"a","endpoint":"/a","method":"GET","priority":"low","createdAt":1},{"id":"b"}]"#).is_err());
    }

    #[test]
    fn test_decode_accepts_missing_optional_fields() {
        let items =
            decode(br#"[{"id":"a","endpoint":"/a","method":"GET","priority":"high","createdAt":7}]"#)
                .unwrap();

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].retry_count, 0);
        assert!(!items[0].requires_auth);
        assert!(items[0].payload.is_none());
    }

    #[test]
    fn test_encode_preserves_insertion_order() {
        let bytes = encode(&[item("b", 2), item("a", 1)]).unwrap();
        let back = decode(&bytes).unwrap();
        let ids: Vec<&str> = back.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a"]);
    }

    #[test]
    fn test_repair_drops_duplicates_and_overflow() {
        let items = vec![item("a", 1), item("b", 2), item("a", 3), item("c", 4), item("d", 5)];

        let (repaired, changed) = repair(items, 3);

        assert!(changed);
        let ids: Vec<&str> = repaired.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "c", "d"]);
    }

    #[test]
    fn test_repair_leaves_valid_snapshot_untouched() {
        let (repaired, changed) = repair(vec![item("a", 1), item("b", 2)], 10);
        assert!(!changed);
        assert_eq!(repaired.len(), 2);
    }
}
