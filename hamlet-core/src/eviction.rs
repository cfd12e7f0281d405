//! Capacity eviction ranking.
//!
//! When a stream grows past its capacity, the single lowest-ranked record
//! goes. Records rank ascending by
//!
//! ```text
//! (importance, created_at, insertion position)
//! ```
//!
//! so the least important record is dropped first and, among equally
//! important ones, the oldest. The insertion position only matters when two
//! records were stamped in the same instant; the earlier insert counts as
//! older.
//!
//! Age-based pruning is a separate, caller-triggered sweep and lives on
//! [`MemoryStream::prune`](crate::memory::MemoryStream::prune).

use chrono::{DateTime, Utc};

use crate::memory::{Importance, MemoryRecord};

/// Sort key of a record at `position` in its stream. Lower is evicted first.
#[must_use]
pub fn eviction_rank(record: &MemoryRecord, position: usize) -> (Importance, DateTime<Utc>, usize) {
    (record.importance, record.created_at, position)
}

/// Index of the record that should be evicted next, or `None` when empty.
#[must_use]
pub fn lowest_ranked(records: &[MemoryRecord]) -> Option<usize> {
    records
        .iter()
        .enumerate()
        .min_by_key(|(position, record)| eviction_rank(record, *position))
        .map(|(position, _)| position)
}
