// Queue statistics snapshot

use crate::domain::request::{Priority, QueuedRequest};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Point-in-time summary of the queue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueStats {
    pub total: usize,
    pub by_priority: BTreeMap<Priority, usize>,
    pub oldest_request: Option<i64>, // createdAt, epoch ms
    pub newest_request: Option<i64>,
    pub average_age_ms: i64,
}

impl QueueStats {
    /// Summarize `items` as seen at `now_millis`
    pub fn collect(items: &[QueuedRequest], now_millis: i64) -> Self {
        let mut by_priority: BTreeMap<Priority, usize> =
            Priority::ALL.iter().map(|p| (*p, 0)).collect();
        for item in items {
            *by_priority.entry(item.priority).or_insert(0) += 1;
        }

        let average_age_ms = if items.is_empty() {
            0
        } else {
            let total_age: i128 = items
                .iter()
                .map(|i| i128::from(i.age_millis(now_millis)))
                .sum();
            let average = total_age / items.len() as i128;
            i64::try_from(average).unwrap_or(i64::MAX)
        };

        Self {
            total: items.len(),
            by_priority,
            oldest_request: items.iter().map(|i| i.created_at).min(),
            newest_request: items.iter().map(|i| i.created_at).max(),
            average_age_ms,
        }
    }
}
