//! Two-phase delete: request, then confirm or cancel.
//!
//! At most one confirmation is pending at a time; a new request replaces
//! the previous one. Removal from the view goes through the store, so the
//! direct delete response and the channel's delete echo may arrive in either
//! order.

use std::sync::Arc;

use serde::Serialize;

use crate::error::{Error, Result};
use crate::models::{BookmarkId, OwnerId};
use crate::services::BookmarkPersistence;
use crate::store::SharedCollection;
use crate::util::compact_text;

/// Snapshot of the record awaiting confirmation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PendingDeletion {
    pub id: BookmarkId,
    pub title: String,
    pub url: String,
}

/// Where a record sits in the delete workflow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DeletionState {
    Idle,
    ConfirmPending,
    Deleting,
    Removed,
}

/// Outcome of [`DeletionWorkflow::confirm_delete`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeletionResult {
    NothingPending,
    Removed(BookmarkId),
    /// The delete call failed; the record stays in the view
    Failed { id: BookmarkId, reason: String },
}

pub struct DeletionWorkflow<P> {
    persistence: Arc<P>,
    owner: OwnerId,
    store: SharedCollection,
    pending: Option<PendingDeletion>,
}

impl<P: BookmarkPersistence> DeletionWorkflow<P> {
    pub(crate) const fn new(persistence: Arc<P>, owner: OwnerId, store: SharedCollection) -> Self {
        Self {
            persistence,
            owner,
            store,
            pending: None,
        }
    }

    pub const fn pending(&self) -> Option<&PendingDeletion> {
        self.pending.as_ref()
    }

    /// Ask for confirmation to delete `id`, replacing any pending request.
    ///
    /// Fails with `NotFound` when the record is not in the view, leaving the
    /// current request untouched.
    pub async fn request_delete(&mut self, id: &BookmarkId) -> Result<&PendingDeletion> {
        let snapshot = {
            let store = self.store.lock().await;
            let record = store
                .get(id)
                .ok_or_else(|| Error::NotFound(id.to_string()))?;
            PendingDeletion {
                id: record.id,
                title: record.title.clone(),
                url: record.url.clone(),
            }
        };

        if let Some(previous) = self.pending.as_ref().filter(|p| p.id != *id) {
            tracing::debug!("Delete request for {} superseded by {id}", previous.id);
        }
        Ok(self.pending.insert(snapshot))
    }

    /// Drop the pending request without side effects
    pub fn cancel_delete(&mut self) -> Option<PendingDeletion> {
        self.pending.take()
    }

    /// Delete the pending record, scoped to the owner.
    pub async fn confirm_delete(&mut self) -> DeletionResult {
        let Some(pending) = self.pending.take() else {
            return DeletionResult::NothingPending;
        };
        let id = pending.id;

        if !self.store.lock().await.mark_deleting(&id) {
            tracing::debug!("Bookmark {id} already left the view before confirmation");
            return DeletionResult::Removed(id);
        }

        match self.persistence.delete(&id, &self.owner).await {
            // NotFound means the row is already gone, which is the goal.
            Ok(()) | Err(Error::NotFound(_)) => {
                self.store.lock().await.apply_delete(&id);
                tracing::info!("Deleted bookmark {id}");
                DeletionResult::Removed(id)
            }
            Err(error) => {
                self.store.lock().await.clear_deleting(&id);
                tracing::warn!("Failed to delete bookmark {id}: {error}");
                DeletionResult::Failed {
                    id,
                    reason: compact_text(&error.to_string()),
                }
            }
        }
    }

    pub async fn state_of(&self, id: &BookmarkId) -> DeletionState {
        if self.pending.as_ref().is_some_and(|p| p.id == *id) {
            return DeletionState::ConfirmPending;
        }
        let store = self.store.lock().await;
        if store.is_deleting(id) {
            DeletionState::Deleting
        } else if store.contains(id) {
            DeletionState::Idle
        } else {
            DeletionState::Removed
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BookmarkRecord;
    use crate::services::testing::{Call, RecordingPersistence};
    use crate::store::RemoveOutcome;
    use crate::validation::NormalizedUrl;
    use pretty_assertions::assert_eq;

    async fn seeded(owner: OwnerId, titles: &[&str]) -> (SharedCollection, Vec<BookmarkRecord>) {
        let records: Vec<BookmarkRecord> = titles
            .iter()
            .map(|title| BookmarkRecord::new(owner, *title, "https://example.com"))
            .collect();
        let store = SharedCollection::default();
        store.lock().await.seed(records.clone());
        (store, records)
    }

    #[tokio::test]
    async fn later_request_supersedes_earlier() {
        let owner = OwnerId::new();
        let (store, records) = seeded(owner, &["A", "B"]).await;
        let persistence = Arc::new(RecordingPersistence::default());
        let mut workflow = DeletionWorkflow::new(persistence, owner, store);

        workflow.request_delete(&records[0].id).await.unwrap();
        let pending = workflow.request_delete(&records[1].id).await.unwrap();

        assert_eq!(pending.title, "B");
        assert_eq!(workflow.pending().map(|p| p.id), Some(records[1].id));
        assert_eq!(
            workflow.state_of(&records[0].id).await,
            DeletionState::Idle
        );
        assert_eq!(
            workflow.state_of(&records[1].id).await,
            DeletionState::ConfirmPending
        );
    }

    #[tokio::test]
    async fn unknown_request_keeps_current_pending() {
        let owner = OwnerId::new();
        let (store, records) = seeded(owner, &["A"]).await;
        let mut workflow =
            DeletionWorkflow::new(Arc::new(RecordingPersistence::default()), owner, store);

        workflow.request_delete(&records[0].id).await.unwrap();
        let error = workflow.request_delete(&BookmarkId::new()).await.unwrap_err();

        assert!(matches!(error, Error::NotFound(_)));
        assert_eq!(workflow.pending().map(|p| p.id), Some(records[0].id));
    }

    #[tokio::test]
    async fn cancel_has_no_side_effect() {
        let owner = OwnerId::new();
        let (store, records) = seeded(owner, &["A"]).await;
        let persistence = Arc::new(RecordingPersistence::default());
        let mut workflow = DeletionWorkflow::new(Arc::clone(&persistence), owner, store.clone());

        workflow.request_delete(&records[0].id).await.unwrap();
        assert!(workflow.cancel_delete().is_some());

        assert_eq!(workflow.confirm_delete().await, DeletionResult::NothingPending);
        assert!(persistence.calls().is_empty());
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn confirm_deletes_scoped_by_owner_then_echo_is_noop() {
        let owner = OwnerId::new();
        let (store, records) = seeded(owner, &["A", "B"]).await;
        let persistence = Arc::new(RecordingPersistence::default());
        let mut workflow = DeletionWorkflow::new(Arc::clone(&persistence), owner, store.clone());
        let target = records[0].id;

        workflow.request_delete(&target).await.unwrap();
        assert_eq!(workflow.confirm_delete().await, DeletionResult::Removed(target));

        assert_eq!(
            persistence.calls(),
            vec![Call::Delete { id: target, owner }]
        );
        assert!(workflow.pending().is_none());
        assert_eq!(workflow.state_of(&target).await, DeletionState::Removed);

        // The channel's echo arrives after the direct success.
        assert_eq!(store.lock().await.apply_delete(&target), RemoveOutcome::Unknown);
        assert_eq!(store.snapshot().await, vec![records[1].clone()]);
        assert!(!store.lock().await.is_deleting(&target));
    }

    /// Delivers the channel echo before the delete call returns.
    struct EchoFirst {
        store: SharedCollection,
    }

    impl BookmarkPersistence for EchoFirst {
        async fn create(
            &self,
            _owner: &OwnerId,
            _title: &str,
            _url: &NormalizedUrl,
        ) -> Result<BookmarkRecord> {
            Err(Error::Persistence("unused".into()))
        }

        async fn list(&self, _owner: &OwnerId) -> Result<Vec<BookmarkRecord>> {
            Ok(Vec::new())
        }

        async fn delete(&self, id: &BookmarkId, _owner: &OwnerId) -> Result<()> {
            let mut store = self.store.lock().await;
            assert!(store.is_deleting(id));
            store.apply_delete(id);
            Ok(())
        }
    }

    #[tokio::test]
    async fn channel_echo_before_response_settles_once() {
        let owner = OwnerId::new();
        let (store, records) = seeded(owner, &["A"]).await;
        let persistence = Arc::new(EchoFirst {
            store: store.clone(),
        });
        let mut workflow = DeletionWorkflow::new(persistence, owner, store.clone());
        let target = records[0].id;

        workflow.request_delete(&target).await.unwrap();
        assert_eq!(workflow.confirm_delete().await, DeletionResult::Removed(target));

        assert!(store.is_empty().await);
        assert!(!store.lock().await.is_deleting(&target));
    }

    #[tokio::test]
    async fn failed_delete_clears_flag_and_keeps_record() {
        let owner = OwnerId::new();
        let (store, records) = seeded(owner, &["A"]).await;
        let persistence = Arc::new(RecordingPersistence::default());
        persistence.fail_deletes(true);
        let mut workflow = DeletionWorkflow::new(persistence, owner, store.clone());
        let target = records[0].id;

        workflow.request_delete(&target).await.unwrap();
        let result = workflow.confirm_delete().await;

        assert!(matches!(result, DeletionResult::Failed { id, .. } if id == target));
        assert_eq!(store.snapshot().await, records);
        assert_eq!(workflow.state_of(&target).await, DeletionState::Idle);
    }
}
