//! Shared handle to a collection store.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::{Mutex, MutexGuard};

use super::SyncedCollectionStore;
use crate::channel::ChangeHandler;
use crate::config::EngineConfig;
use crate::models::{BookmarkId, BookmarkRecord};

/// Clonable, task-safe access to one [`SyncedCollectionStore`].
///
/// The channel subscriber and the local workflows each hold a clone; every
/// mutation still goes through the store's own methods.
#[derive(Clone, Default)]
pub struct SharedCollection {
    inner: Arc<Mutex<SyncedCollectionStore>>,
}

impl SharedCollection {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            inner: Arc::new(Mutex::new(SyncedCollectionStore::new(config))),
        }
    }

    pub async fn lock(&self) -> MutexGuard<'_, SyncedCollectionStore> {
        self.inner.lock().await
    }

    pub async fn snapshot(&self) -> Vec<BookmarkRecord> {
        self.lock().await.snapshot()
    }

    pub async fn len(&self) -> usize {
        self.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.lock().await.is_empty()
    }
}

impl ChangeHandler for SharedCollection {
    fn on_insert(&self, record: BookmarkRecord) -> impl Future<Output = ()> + Send {
        let store = self.clone();
        async move {
            store.lock().await.apply_insert(record);
        }
    }

    fn on_delete(&self, id: BookmarkId) -> impl Future<Output = ()> + Send {
        let store = self.clone();
        async move {
            store.lock().await.apply_delete(&id);
        }
    }
}
