//! Push channel collaborator and the subscriber that feeds the store.
//!
//! A push channel delivers row changes for the bookmarks table. It is not
//! trusted to scope events to one owner, so the subscriber filters every
//! event after receipt before handing it to a [`ChangeHandler`].

mod subscriber;

use std::fmt;
use std::future::Future;

use tokio::sync::mpsc;

use crate::error::{Error, Result};
use crate::models::{BookmarkId, BookmarkRecord, ChangeKind, DeletedRow, OwnerId, RawChange};
use crate::state::ConnectionState;

pub use subscriber::{ChannelSubscriber, SubscriptionHandle};

/// Deterministic per-owner subscription topic, `<prefix>:<owner>`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SubscriptionKey(String);

impl SubscriptionKey {
    pub fn for_owner(prefix: &str, owner: &OwnerId) -> Self {
        Self(format!("{prefix}:{owner}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SubscriptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifies one registration under a key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionToken(pub u64);

/// Subscription status as reported by the channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelStatus {
    Connecting,
    Active,
    Failed(String),
}

/// One item on a subscription stream
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelMessage {
    Status(ChannelStatus),
    Change(RawChange),
}

/// An acquired subscription
#[derive(Debug)]
pub struct Subscription {
    pub token: SubscriptionToken,
    pub events: mpsc::Receiver<ChannelMessage>,
}

/// Source of pushed row changes.
///
/// `subscribe` must be cancel-safe: dropping its future before it resolves
/// leaves nothing registered. `unsubscribe` must be idempotent and must not
/// remove a newer registration that reused the same key.
pub trait PushChannel: Send + Sync + 'static {
    fn subscribe(&self, key: &SubscriptionKey)
        -> impl Future<Output = Result<Subscription>> + Send;

    fn unsubscribe(
        &self,
        key: &SubscriptionKey,
        token: SubscriptionToken,
    ) -> impl Future<Output = ()> + Send;
}

/// Receiver of owner-filtered, decoded changes
pub trait ChangeHandler: Send + Sync + 'static {
    fn on_insert(&self, record: BookmarkRecord) -> impl Future<Output = ()> + Send;

    fn on_delete(&self, id: BookmarkId) -> impl Future<Output = ()> + Send;

    fn on_state_change(&self, state: ConnectionState) -> impl Future<Output = ()> + Send {
        let _ = state;
        async {}
    }
}

/// A raw change after payload decoding
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodedChange {
    Insert(BookmarkRecord),
    Delete(DeletedRow),
}

impl DecodedChange {
    /// Whether this change may belong to `owner`.
    ///
    /// Deletes without an owner column pass; the store treats unknown ids as
    /// a no-op apart from a short-lived tombstone.
    pub fn belongs_to(&self, owner: &OwnerId) -> bool {
        match self {
            Self::Insert(record) => record.owner_id == *owner,
            Self::Delete(row) => row.owner_id.map_or(true, |row_owner| row_owner == *owner),
        }
    }
}

/// Decode the row carried by a raw change
pub fn decode_change(change: RawChange) -> Result<DecodedChange> {
    let RawChange { kind, mut payload } = change;
    let column = match kind {
        ChangeKind::Insert => "new",
        ChangeKind::Delete => "old",
    };
    let row = payload
        .get_mut(column)
        .map(serde_json::Value::take)
        .ok_or_else(|| Error::InvalidInput(format!("change payload has no `{column}` row")))?;

    Ok(match kind {
        ChangeKind::Insert => DecodedChange::Insert(serde_json::from_value(row)?),
        ChangeKind::Delete => DecodedChange::Delete(serde_json::from_value(row)?),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn key_is_deterministic_per_owner() {
        let owner = OwnerId::new();
        let first = SubscriptionKey::for_owner("bookmarks", &owner);
        let second = SubscriptionKey::for_owner("bookmarks", &owner);
        assert_eq!(first, second);
        assert_eq!(first.as_str(), format!("bookmarks:{owner}"));
    }

    #[test]
    fn decodes_insert_and_delete_rows() {
        let owner = OwnerId::new();
        let record = BookmarkRecord::new(owner, "Rust", "https://rust-lang.org");

        let insert = decode_change(RawChange::insert(&record).unwrap()).unwrap();
        assert_eq!(insert, DecodedChange::Insert(record.clone()));

        let delete = decode_change(RawChange::delete(record.id, Some(owner)).unwrap()).unwrap();
        assert_eq!(
            delete,
            DecodedChange::Delete(DeletedRow {
                id: record.id,
                owner_id: Some(owner),
            })
        );
    }

    #[test]
    fn rejects_payload_without_row() {
        let change = RawChange {
            kind: ChangeKind::Insert,
            payload: serde_json::json!({ "old": {} }),
        };
        assert!(decode_change(change).is_err());

        let change = RawChange {
            kind: ChangeKind::Insert,
            payload: serde_json::json!({ "new": { "id": "nope" } }),
        };
        assert!(matches!(decode_change(change), Err(Error::Serialization(_))));
    }

    #[test]
    fn ownership_filter_keeps_unscoped_deletes() {
        let owner = OwnerId::new();
        let stranger = OwnerId::new();

        let foreign = DecodedChange::Insert(BookmarkRecord::new(stranger, "x", "https://x.io"));
        assert!(!foreign.belongs_to(&owner));

        let unscoped = DecodedChange::Delete(DeletedRow {
            id: BookmarkId::new(),
            owner_id: None,
        });
        assert!(unscoped.belongs_to(&owner));

        let scoped = DecodedChange::Delete(DeletedRow {
            id: BookmarkId::new(),
            owner_id: Some(stranger),
        });
        assert!(!scoped.belongs_to(&owner));
    }
}
