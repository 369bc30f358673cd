//! Collaborator interfaces and their local implementations

mod database;
mod hub;
#[cfg(test)]
pub(crate) mod testing;

use crate::error::Result;
use crate::models::{BookmarkId, BookmarkRecord, OwnerId};
use crate::validation::NormalizedUrl;

pub use database::BookmarkService;
pub use hub::ChangeHub;

/// Trait for bookmark storage operations (async)
#[allow(async_fn_in_trait)]
pub trait BookmarkPersistence {
    /// Create a bookmark; the store assigns its id and creation time
    async fn create(&self, owner: &OwnerId, title: &str, url: &NormalizedUrl)
        -> Result<BookmarkRecord>;

    /// List an owner's bookmarks, newest first
    async fn list(&self, owner: &OwnerId) -> Result<Vec<BookmarkRecord>>;

    /// Delete a bookmark, scoped to its owner
    async fn delete(&self, id: &BookmarkId, owner: &OwnerId) -> Result<()>;
}

/// Source of the signed-in user
pub trait IdentityProvider {
    fn current_owner_id(&self) -> Option<OwnerId>;
}

/// Identity fixed at construction, e.g. after a completed sign-in
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticIdentity(pub Option<OwnerId>);

impl IdentityProvider for StaticIdentity {
    fn current_owner_id(&self) -> Option<OwnerId> {
        self.0
    }
}
