//! The bounded, chronologically ordered memory stream each character owns.

use chrono::{DateTime, Duration, Utc};
use tracing::trace;

use crate::error::{HamletError, Result};
use crate::eviction;
use crate::memory::{Importance, MemoryKind, MemoryRecord, NewMemory};
use crate::types::CharacterId;

/// Default number of records a stream keeps.
pub const DEFAULT_CAPACITY: usize = 100;

/// Window used by [`MemoryStream::summarize`] when no character is given.
pub const SUMMARY_WINDOW_HOURS: i64 = 24;

/// Text returned by [`MemoryStream::summarize`] when nothing matches.
pub const NO_MEMORIES: &str = "No relevant memories.";

/// Bounded sequence of [`MemoryRecord`]s in insertion (chronological) order.
///
/// `len() <= capacity()` holds after every mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryStream {
    records: Vec<MemoryRecord>,
    capacity: usize,
}

impl Default for MemoryStream {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl MemoryStream {
    /// Create an empty stream. A capacity of zero is raised to one.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            records: Vec::with_capacity(capacity.min(DEFAULT_CAPACITY)),
            capacity,
        }
    }

    /// Rebuild a stream from stored records.
    ///
    /// Records are stably re-sorted by `created_at`, then the capacity rule
    /// is applied as if they had been added one by one.
    #[must_use]
    pub fn from_records(mut records: Vec<MemoryRecord>, capacity: usize) -> Self {
        records.sort_by_key(|r| r.created_at);
        let mut stream = Self::new(capacity);
        stream.records = records;
        stream.enforce_capacity();
        stream
    }

    /// Maximum number of records kept.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of records held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the stream holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// All records, oldest first.
    #[must_use]
    pub fn records(&self) -> &[MemoryRecord] {
        &self.records
    }

    /// Iterate all records, oldest first.
    pub fn iter(&self) -> std::slice::Iter<'_, MemoryRecord> {
        self.records.iter()
    }

    // ------------------------------------------------------------------
    // Mutation
    // ------------------------------------------------------------------

    /// Stamp `memory` with `now` and append it.
    ///
    /// The stamp never precedes the newest record already held, so a clock
    /// that steps backwards cannot break chronological order.
    ///
    /// If the stream is now over capacity, the lowest-ranked records are
    /// evicted until it fits; they are returned (possibly including the
    /// record just added, when it ranks lowest).
    pub fn add(&mut self, memory: NewMemory, now: DateTime<Utc>) -> Vec<MemoryRecord> {
        let stamped_at = self
            .records
            .last()
            .map_or(now, |last| last.created_at.max(now));
        self.records.push(memory.stamped(stamped_at));
        self.enforce_capacity()
    }

    /// Remove and return the single lowest-ranked record.
    ///
    /// # Errors
    /// Returns [`HamletError::CapacityInvariant`] when the stream is empty.
    pub fn evict(&mut self) -> Result<MemoryRecord> {
        let index = eviction::lowest_ranked(&self.records).ok_or(HamletError::CapacityInvariant)?;
        let evicted = self.records.remove(index);
        trace!(
            importance = %evicted.importance,
            kind = %evicted.kind,
            "Evicted memory record"
        );
        Ok(evicted)
    }

    /// Remove every record created at or before `now - older_than`.
    ///
    /// Returns how many records were dropped. A cutoff before the start of
    /// representable time removes nothing.
    pub fn prune(&mut self, older_than: Duration, now: DateTime<Utc>) -> usize {
        let Some(cutoff) = now.checked_sub_signed(older_than) else {
            return 0;
        };
        let before = self.records.len();
        self.records.retain(|r| r.created_at > cutoff);
        before - self.records.len()
    }

    fn enforce_capacity(&mut self) -> Vec<MemoryRecord> {
        let mut evicted = Vec::new();
        while self.records.len() > self.capacity {
            match self.evict() {
                Ok(record) => evicted.push(record),
                Err(err) => {
                    debug_assert!(false, "{err}");
                    break;
                }
            }
        }
        evicted
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Records created strictly after `now - within`, oldest first.
    ///
    /// A window reaching past the start of representable time yields every
    /// record.
    pub fn recent(
        &self,
        within: Duration,
        now: DateTime<Utc>,
    ) -> impl Iterator<Item = &MemoryRecord> + Clone + '_ {
        let cutoff = now.checked_sub_signed(within);
        self.records
            .iter()
            .filter(move |r| cutoff.is_none_or(|cutoff| r.created_at > cutoff))
    }

    /// Records of one kind, oldest first.
    pub fn by_kind(&self, kind: MemoryKind) -> impl Iterator<Item = &MemoryRecord> + Clone + '_ {
        self.records.iter().filter(move |r| r.kind == kind)
    }

    /// Records that name `id` among their related characters.
    pub fn about<'a>(
        &'a self,
        id: &'a CharacterId,
    ) -> impl Iterator<Item = &'a MemoryRecord> + Clone + 'a {
        self.records.iter().filter(move |r| r.involves(id))
    }

    /// Records with importance of at least `min_importance`.
    pub fn important(
        &self,
        min_importance: Importance,
    ) -> impl Iterator<Item = &MemoryRecord> + Clone + '_ {
        self.records.iter().filter(move |r| r.importance >= min_importance)
    }

    /// The last `n` records, oldest first.
    #[must_use]
    pub fn latest(&self, n: usize) -> &[MemoryRecord] {
        let start = self.records.len().saturating_sub(n);
        &self.records[start..]
    }

    /// One line per memory, `[HH:MM] content`, in chronological order.
    ///
    /// With `about`, summarizes every memory involving that character;
    /// otherwise the last [`SUMMARY_WINDOW_HOURS`] hours. Returns
    /// [`NO_MEMORIES`] when nothing matches.
    #[must_use]
    pub fn summarize(&self, about: Option<&CharacterId>, now: DateTime<Utc>) -> String {
        let mut selected: Vec<&MemoryRecord> = match about {
            Some(id) => self.about(id).collect(),
            None => self.recent(Duration::hours(SUMMARY_WINDOW_HOURS), now).collect(),
        };
        if selected.is_empty() {
            return NO_MEMORIES.to_string();
        }
        selected.sort_by_key(|r| r.created_at);
        selected
            .iter()
            .map(|r| format!("[{}] {}", r.created_at.format("%H:%M"), r.content))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl<'a> IntoIterator for &'a MemoryStream {
    type Item = &'a MemoryRecord;
    type IntoIter = std::slice::Iter<'a, MemoryRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 9, 8, 0, 0).single().expect("valid date")
    }

    fn memory(importance: u8, content: &str) -> NewMemory {
        NewMemory::new(
            MemoryKind::Action,
            content,
            Importance::new(importance).expect("valid importance"),
        )
    }

    #[test]
    fn evicts_least_important_first() {
        let mut stream = MemoryStream::new(2);
        stream.add(memory(1, "low"), t0());
        stream.add(memory(5, "high"), t0() + Duration::minutes(1));
        let evicted = stream.add(memory(3, "mid"), t0() + Duration::minutes(2));

        assert_eq!(evicted.len(), 1);
        assert_eq!(evicted[0].content, "low");
        let kept: Vec<_> = stream.iter().map(|r| r.content.as_str()).collect();
        assert_eq!(kept, ["high", "mid"]);
    }

    #[test]
    fn newest_record_can_be_the_one_evicted() {
        let mut stream = MemoryStream::new(1);
        stream.add(memory(4, "kept"), t0());
        let evicted = stream.add(memory(2, "dropped"), t0() + Duration::minutes(1));
        assert_eq!(evicted[0].content, "dropped");
        assert_eq!(stream.records()[0].content, "kept");
    }

    #[test]
    fn evict_on_empty_is_an_error() {
        let mut stream = MemoryStream::new(3);
        assert!(matches!(stream.evict(), Err(HamletError::CapacityInvariant)));
    }

    #[test]
    fn zero_capacity_is_raised_to_one() {
        let mut stream = MemoryStream::new(0);
        stream.add(memory(3, "only"), t0());
        assert_eq!(stream.capacity(), 1);
        assert_eq!(stream.len(), 1);
    }

    #[test]
    fn recent_uses_strict_cutoff() {
        let mut stream = MemoryStream::new(10);
        stream.add(memory(3, "old"), t0());
        stream.add(memory(3, "new"), t0() + Duration::hours(2));
        let now = t0() + Duration::hours(3);

        let exactly_three: Vec<_> = stream.recent(Duration::hours(3), now).collect();
        assert_eq!(exactly_three.len(), 1, "a record exactly at the cutoff is excluded");
        assert_eq!(stream.recent(Duration::hours(4), now).count(), 2);
    }

    #[test]
    fn recent_can_be_iterated_twice() {
        let mut stream = MemoryStream::new(10);
        stream.add(memory(3, "a"), t0());
        stream.add(memory(3, "b"), t0());
        let recent = stream.recent(Duration::hours(1), t0());
        assert_eq!(recent.clone().count(), 2);
        assert_eq!(recent.count(), 2);
    }

    #[test]
    fn filters_by_kind_relation_and_importance() {
        let bob = CharacterId::new("bob");
        let mut stream = MemoryStream::new(10);
        stream.add(NewMemory::new(MemoryKind::Movement, "walked", Importance::ROUTINE), t0());
        stream.add(
            NewMemory::new(MemoryKind::Dialogue, "talked with bob", Importance::DIALOGUE)
                .about(bob.clone()),
            t0(),
        );
        stream.add(NewMemory::new(MemoryKind::Observation, "saw rain", Importance::OBSERVATION), t0());

        assert_eq!(stream.by_kind(MemoryKind::Movement).count(), 1);
        assert_eq!(stream.about(&bob).count(), 1);
        assert_eq!(stream.important(Importance::ROUTINE).count(), 2);
        assert_eq!(stream.important(Importance::DIALOGUE).count(), 1);
    }

    #[test]
    fn prune_removes_at_and_before_cutoff() {
        let mut stream = MemoryStream::new(10);
        stream.add(memory(5, "ancient"), t0());
        stream.add(memory(5, "boundary"), t0() + Duration::days(1));
        stream.add(memory(1, "fresh"), t0() + Duration::days(7));
        let now = t0() + Duration::days(8);

        let removed = stream.prune(Duration::days(7), now);
        assert_eq!(removed, 2);
        assert_eq!(stream.records()[0].content, "fresh");
    }

    #[test]
    fn huge_windows_do_not_overflow() {
        let mut stream = MemoryStream::new(10);
        stream.add(memory(3, "a"), t0());
        stream.add(memory(3, "b"), t0() + Duration::hours(1));
        let huge = Duration::days(200_000_000);

        assert_eq!(stream.recent(huge, t0()).count(), 2);
        assert_eq!(stream.prune(huge, t0()), 0);
        assert_eq!(stream.len(), 2);
    }

    #[test]
    fn backwards_clock_keeps_order() {
        let mut stream = MemoryStream::new(10);
        let later = t0() + Duration::hours(2);
        stream.add(memory(3, "first"), later);
        stream.add(memory(3, "second"), later - Duration::hours(1));

        let stamps: Vec<_> = stream.iter().map(|r| r.created_at).collect();
        assert_eq!(stamps, [later, later]);
        let kept: Vec<_> = stream.iter().map(|r| r.content.as_str()).collect();
        assert_eq!(kept, ["first", "second"]);

        let rebuilt = MemoryStream::from_records(stream.records().to_vec(), 10);
        assert_eq!(rebuilt, stream);
    }

    #[test]
    fn summarize_empty_returns_sentinel() {
        let stream = MemoryStream::new(5);
        assert_eq!(stream.summarize(None, t0()), NO_MEMORIES);
        assert_eq!(stream.summarize(Some(&CharacterId::new("x")), t0()), NO_MEMORIES);
    }

    #[test]
    fn summarize_is_chronological() {
        let bob = CharacterId::new("bob");
        let records = vec![
            memory(3, "second").about(bob.clone()).stamped(t0() + Duration::minutes(30)),
            memory(3, "first").about(bob.clone()).stamped(t0()),
        ];
        let stream = MemoryStream::from_records(records, 5);
        let summary = stream.summarize(Some(&bob), t0() + Duration::hours(1));
        assert_eq!(summary, "[08:00] first\n[08:30] second");
    }

    #[test]
    fn from_records_enforces_capacity() {
        let records = (0..5u8)
            .map(|i| memory(i + 1, &format!("m{i}")).stamped(t0() + Duration::minutes(i64::from(i))))
            .collect();
        let stream = MemoryStream::from_records(records, 3);
        let kept: Vec<_> = stream.iter().map(|r| r.importance.get()).collect();
        assert_eq!(kept, [3, 4, 5]);
    }

    #[test]
    fn latest_returns_tail() {
        let mut stream = MemoryStream::new(10);
        for i in 0..4 {
            stream.add(memory(3, &format!("m{i}")), t0());
        }
        let tail: Vec<_> = stream.latest(2).iter().map(|r| r.content.as_str()).collect();
        assert_eq!(tail, ["m2", "m3"]);
        assert_eq!(stream.latest(10).len(), 4);
    }
}
