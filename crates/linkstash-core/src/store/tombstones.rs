//! Bounded tombstone set for deleted bookmark ids.

use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use tokio::time::Instant;

use crate::models::BookmarkId;

/// Remembers recently deleted ids so a late insert cannot resurrect them.
///
/// Entries expire after `ttl`; when more than `capacity` ids are live the
/// oldest are evicted first.
#[derive(Debug)]
pub struct Tombstones {
    ttl: Duration,
    capacity: usize,
    expiry: HashMap<BookmarkId, Instant>,
    order: VecDeque<(BookmarkId, Instant)>,
}

impl Tombstones {
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        Self {
            ttl,
            capacity: capacity.max(1),
            expiry: HashMap::new(),
            order: VecDeque::new(),
        }
    }

    /// Record (or refresh) a tombstone for `id`
    pub fn record(&mut self, id: BookmarkId, now: Instant) {
        self.purge(now);

        let expires_at = now + self.ttl;
        self.expiry.insert(id, expires_at);
        self.order.push_back((id, expires_at));

        while self.expiry.len() > self.capacity {
            let Some((evicted, at)) = self.order.pop_front() else {
                break;
            };
            self.forget_if_current(evicted, at);
        }
    }

    /// Whether `id` has a live tombstone at `now`
    pub fn contains(&self, id: &BookmarkId, now: Instant) -> bool {
        self.expiry.get(id).is_some_and(|expires_at| *expires_at > now)
    }

    /// Drop expired entries
    pub fn purge(&mut self, now: Instant) {
        while let Some(&(id, at)) = self.order.front() {
            if at > now {
                break;
            }
            self.order.pop_front();
            self.forget_if_current(id, at);
        }
    }

    pub fn clear(&mut self) {
        self.expiry.clear();
        self.order.clear();
    }

    pub fn len(&self) -> usize {
        self.expiry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.expiry.is_empty()
    }

    // A refreshed id leaves a stale queue entry behind; only the entry
    // matching the current expiry may remove it.
    fn forget_if_current(&mut self, id: BookmarkId, at: Instant) {
        if self.expiry.get(&id) == Some(&at) {
            self.expiry.remove(&id);
        }
    }
}
