//! Data models for LinkStash

mod bookmark;
mod change;

pub use bookmark::{BookmarkId, BookmarkRecord, OwnerId};
pub use change::{ChangeKind, DeletedRow, RawChange};
