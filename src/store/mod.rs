//! Per-entity ordered condition log.
//!
//! Records are kept in ascending `(timestamp, arrival)` order in a vector.
//! Appends are the common case; slightly late records are placed with a
//! binary search. Cursors walk the log backwards (newest first) and borrow
//! the store, so a cursor can never outlive the lock guard it was built under.

use crate::condition::{ConditionLevel, ConditionRecord};


/// Insertion-ordered-by-time log of one entity's conditions.
///
/// Not internally synchronised: callers wrap it in the entity's `RwLock`.
#[derive(Debug, Default)]
pub struct ConditionStore {
    records: Vec<ConditionRecord>,
}

impl ConditionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record, keeping existing entries in place.
    ///
    /// A record whose timestamp equals existing ones lands after them, so
    /// descending traversal of a tie yields the latest arrival first.
    pub fn insert(&mut self, record: ConditionRecord) {
        let ts = record.timestamp_unix();
        match self.records.last() {
            Some(last) if last.timestamp_unix() > ts => {
                let idx = self
                    .records
                    .partition_point(|r| r.timestamp_unix() <= ts);
                self.records.insert(idx, record);
            }
            _ => self.records.push(record),
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Most recent record regardless of level.
    pub fn latest(&self) -> Option<&ConditionRecord> {
        self.records.last()
    }

    /// Cursor positioned just above `bound`: the first `prev()` yields the
    /// newest record matching `filter` with a timestamp strictly below `bound`.
    pub fn lower_bound(&self, filter: ConditionLevel, bound: i64) -> ConditionCursor<'_> {
        let end = self.records.partition_point(|r| r.timestamp_unix() < bound);
        ConditionCursor {
            records: &self.records[..end],
            filter,
        }
    }

    /// Cursor positioned after the most recent record.
    pub fn end(&self, filter: ConditionLevel) -> ConditionCursor<'_> {
        ConditionCursor {
            records: &self.records,
            filter,
        }
    }
}

/// Descending, filtered traversal over a borrowed store.
#[derive(Debug, Clone)]
pub struct ConditionCursor<'a> {
    /// Records not yet visited; the cursor consumes from the back.
    records: &'a [ConditionRecord],
    filter: ConditionLevel,
}

impl<'a> ConditionCursor<'a> {
    /// Step to the next-older matching record.
    ///
    /// Returns `None` once exhausted, and keeps returning `None` afterwards.
    pub fn prev(&mut self) -> Option<&'a ConditionRecord> {
        while let Some((last, rest)) = self.records.split_last() {
            self.records = rest;
            if last.level().intersects(self.filter) {
                return Some(last);
            }
        }
        None
    }

    pub fn filter(&self) -> ConditionLevel {
        self.filter
    }
}

impl<'a> Iterator for ConditionCursor<'a> {
    type Item = &'a ConditionRecord;

    fn next(&mut self) -> Option<Self::Item> {
        self.prev()
    }
}
