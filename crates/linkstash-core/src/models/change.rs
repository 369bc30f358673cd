//! Raw change events as delivered by a push channel

use serde::{Deserialize, Serialize};

use super::{BookmarkId, BookmarkRecord, OwnerId};

/// Kind of row change carried by a push event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeKind {
    Insert,
    Delete,
}

/// An undecoded change event.
///
/// Insert payloads carry the new row under `new`; delete payloads carry the
/// old row's key columns under `old`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawChange {
    pub kind: ChangeKind,
    pub payload: serde_json::Value,
}

impl RawChange {
    /// Build the insert event a change feed emits for `record`
    pub fn insert(record: &BookmarkRecord) -> serde_json::Result<Self> {
        Ok(Self {
            kind: ChangeKind::Insert,
            payload: serde_json::json!({ "new": serde_json::to_value(record)? }),
        })
    }

    /// Build the delete event a change feed emits for a removed row.
    ///
    /// `owner_id` is `None` when the feed only replicates the primary key.
    pub fn delete(id: BookmarkId, owner_id: Option<OwnerId>) -> serde_json::Result<Self> {
        let old = DeletedRow { id, owner_id };
        Ok(Self {
            kind: ChangeKind::Delete,
            payload: serde_json::json!({ "old": serde_json::to_value(old)? }),
        })
    }
}

/// Key columns of a deleted row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletedRow {
    pub id: BookmarkId,
    #[serde(rename = "user_id", default, skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<OwnerId>,
}
