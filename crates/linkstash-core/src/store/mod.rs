//! Locally reconciled view of one owner's bookmarks.
//!
//! The store is the only place the collection view is mutated. Inserts and
//! deletes may arrive from the push channel and from local workflows in any
//! order; applying them here keeps ids unique, keeps the view sorted newest
//! first, and stops a late insert from bringing back a deleted record.

mod shared;
mod tombstones;

use std::collections::HashSet;

use tokio::time::Instant;

use crate::config::EngineConfig;
use crate::models::{BookmarkId, BookmarkRecord};

pub use shared::SharedCollection;
pub use tombstones::Tombstones;

/// Result of applying an insert event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// Record added at this position of the view
    Inserted { index: usize },
    /// Id already present; event ignored
    Duplicate,
    /// Id was recently deleted; event ignored
    Suppressed,
}

/// Result of applying a delete event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoveOutcome {
    Removed(BookmarkRecord),
    /// Id not in the view; only a tombstone was recorded
    Unknown,
}

/// Ordered, deduplicated view of bookmarks, newest first.
#[derive(Debug)]
pub struct SyncedCollectionStore {
    records: Vec<BookmarkRecord>,
    tombstones: Tombstones,
    deleting: HashSet<BookmarkId>,
}

impl Default for SyncedCollectionStore {
    fn default() -> Self {
        Self::new(&EngineConfig::default())
    }
}

impl SyncedCollectionStore {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            records: Vec::new(),
            tombstones: Tombstones::new(config.tombstone_ttl(), config.tombstone_capacity),
            deleting: HashSet::new(),
        }
    }

    /// Replace the view with the result of a full fetch.
    ///
    /// Duplicate ids keep their first occurrence. Tombstones are dropped since
    /// the fetch is authoritative, and deleting flags survive only for ids
    /// still present.
    pub fn seed(&mut self, records: impl IntoIterator<Item = BookmarkRecord>) {
        let mut seen = HashSet::new();
        let mut records: Vec<BookmarkRecord> = records
            .into_iter()
            .filter(|record| seen.insert(record.id))
            .collect();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        self.deleting.retain(|id| seen.contains(id));
        self.tombstones.clear();
        self.records = records;
        tracing::debug!("Seeded collection with {} bookmarks", self.records.len());
    }

    /// Apply an insert event idempotently.
    pub fn apply_insert(&mut self, record: BookmarkRecord) -> InsertOutcome {
        if self.contains(&record.id) {
            return InsertOutcome::Duplicate;
        }
        if self.tombstones.contains(&record.id, Instant::now()) {
            tracing::debug!("Suppressed insert for deleted bookmark {}", record.id);
            return InsertOutcome::Suppressed;
        }

        // Among equal timestamps the latest arrival goes first, matching a
        // full fetch ordered by insertion.
        let index = self
            .records
            .partition_point(|existing| existing.created_at > record.created_at);
        self.records.insert(index, record);
        InsertOutcome::Inserted { index }
    }

    /// Apply a delete event idempotently.
    ///
    /// The id is tombstoned whether or not it was present, so an insert that
    /// was overtaken by its own delete stays suppressed.
    pub fn apply_delete(&mut self, id: &BookmarkId) -> RemoveOutcome {
        self.tombstones.record(*id, Instant::now());
        self.deleting.remove(id);

        match self.records.iter().position(|record| record.id == *id) {
            Some(index) => RemoveOutcome::Removed(self.records.remove(index)),
            None => RemoveOutcome::Unknown,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[BookmarkRecord] {
        &self.records
    }

    /// Owned copy of the current view
    pub fn snapshot(&self) -> Vec<BookmarkRecord> {
        self.records.clone()
    }

    pub fn get(&self, id: &BookmarkId) -> Option<&BookmarkRecord> {
        self.records.iter().find(|record| record.id == *id)
    }

    pub fn contains(&self, id: &BookmarkId) -> bool {
        self.get(id).is_some()
    }

    /// Flag a present record as having a delete in flight.
    ///
    /// Returns `false` when the record is not in the view.
    pub fn mark_deleting(&mut self, id: &BookmarkId) -> bool {
        if self.contains(id) {
            self.deleting.insert(*id);
            true
        } else {
            false
        }
    }

    pub fn clear_deleting(&mut self, id: &BookmarkId) {
        self.deleting.remove(id);
    }

    pub fn is_deleting(&self, id: &BookmarkId) -> bool {
        self.deleting.contains(id)
    }
}
