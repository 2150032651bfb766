//! Scheduling order
//!
//! Items are attempted (and listed) by `(priority rank, created_at)`
//! ascending. Sorting is stable, so insertion order breaks remaining ties.

use crate::domain::request::QueuedRequest;

/// Ordering key for one item
pub fn schedule_key(item: &QueuedRequest) -> (u8, i64) {
    (item.priority.rank(), item.created_at)
}

/// Sort items in place into scheduling order
pub fn sort_for_schedule(items: &mut [QueuedRequest]) {
    items.sort_by_key(schedule_key);
}
