//! Local bookmark service: libSQL persistence plus an in-process change feed.

use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::Mutex;

use super::{BookmarkPersistence, ChangeHub};
use crate::channel::{PushChannel, Subscription, SubscriptionKey, SubscriptionToken};
use crate::config::EngineConfig;
use crate::db::{Database, LibSqlBookmarkRepository};
use crate::error::Result;
use crate::models::{BookmarkId, BookmarkRecord, OwnerId, RawChange};
use crate::validation::NormalizedUrl;

/// Thread-safe service for bookmark storage and change delivery.
///
/// Successful writes are echoed to subscribers as change events, so it can
/// serve as both the persistence and the push-channel collaborator.
#[derive(Clone)]
pub struct BookmarkService {
    db: Arc<Mutex<Database>>,
    hub: ChangeHub,
}

impl BookmarkService {
    /// Open a service backed by a local database file.
    pub async fn open_path(db_path: impl Into<PathBuf>, config: &EngineConfig) -> Result<Self> {
        let db_path = db_path.into();
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        tracing::info!("Opening bookmark database at {}", db_path.display());
        Ok(Self::from_database(Database::open(&db_path).await?, config))
    }

    /// Open an in-memory service (primarily for tests).
    pub async fn open_in_memory(config: &EngineConfig) -> Result<Self> {
        Ok(Self::from_database(Database::open_in_memory().await?, config))
    }

    fn from_database(db: Database, config: &EngineConfig) -> Self {
        Self {
            db: Arc::new(Mutex::new(db)),
            hub: ChangeHub::new(config),
        }
    }

    /// The change feed fed by this service's writes
    pub const fn hub(&self) -> &ChangeHub {
        &self.hub
    }
}

impl BookmarkPersistence for BookmarkService {
    async fn create(
        &self,
        owner: &OwnerId,
        title: &str,
        url: &NormalizedUrl,
    ) -> Result<BookmarkRecord> {
        let record = {
            let db = self.db.lock().await;
            LibSqlBookmarkRepository::new(db.connection())
                .create(owner, title, url)
                .await?
        };
        self.hub.publish(RawChange::insert(&record)?).await;
        Ok(record)
    }

    async fn list(&self, owner: &OwnerId) -> Result<Vec<BookmarkRecord>> {
        let db = self.db.lock().await;
        LibSqlBookmarkRepository::new(db.connection())
            .list(owner)
            .await
    }

    async fn delete(&self, id: &BookmarkId, owner: &OwnerId) -> Result<()> {
        {
            let db = self.db.lock().await;
            LibSqlBookmarkRepository::new(db.connection())
                .delete(id, owner)
                .await?;
        }
        self.hub.publish(RawChange::delete(*id, Some(*owner))?).await;
        Ok(())
    }
}

impl PushChannel for BookmarkService {
    fn subscribe(
        &self,
        key: &SubscriptionKey,
    ) -> impl Future<Output = Result<Subscription>> + Send {
        self.hub.subscribe(key)
    }

    fn unsubscribe(
        &self,
        key: &SubscriptionKey,
        token: SubscriptionToken,
    ) -> impl Future<Output = ()> + Send {
        self.hub.unsubscribe(key, token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::{decode_change, ChannelMessage, DecodedChange};
    use crate::validation::normalize_url;
    use pretty_assertions::assert_eq;

    #[tokio::test(flavor = "multi_thread")]
    async fn writes_are_echoed_on_the_feed() {
        let service = BookmarkService::open_in_memory(&EngineConfig::default())
            .await
            .unwrap();
        let owner = OwnerId::new();
        let key = SubscriptionKey::for_owner("bookmarks", &owner);
        let mut subscription = service.subscribe(&key).await.unwrap();
        subscription.events.recv().await;
        subscription.events.recv().await;

        let url = normalize_url("example.com").unwrap();
        let record = service.create(&owner, "Example", &url).await.unwrap();
        service.delete(&record.id, &owner).await.unwrap();

        let mut decoded = Vec::new();
        for _ in 0..2 {
            match subscription.events.recv().await {
                Some(ChannelMessage::Change(change)) => {
                    decoded.push(decode_change(change).unwrap());
                }
                other => panic!("unexpected message: {other:?}"),
            }
        }

        assert_eq!(decoded[0], DecodedChange::Insert(record.clone()));
        assert!(matches!(
            &decoded[1],
            DecodedChange::Delete(row) if row.id == record.id && row.owner_id == Some(owner)
        ));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn failed_delete_publishes_nothing() {
        let service = BookmarkService::open_in_memory(&EngineConfig::default())
            .await
            .unwrap();
        let owner = OwnerId::new();
        let key = SubscriptionKey::for_owner("bookmarks", &owner);
        let mut subscription = service.subscribe(&key).await.unwrap();
        subscription.events.recv().await;
        subscription.events.recv().await;

        assert!(service.delete(&BookmarkId::new(), &owner).await.is_err());
        assert!(subscription.events.try_recv().is_err());
    }
}
