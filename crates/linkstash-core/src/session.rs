//! One owner's live collection: full fetch, seed, and subscription.

use std::sync::Arc;

use tokio::sync::watch;

use crate::channel::{ChannelSubscriber, PushChannel, SubscriptionHandle};
use crate::config::EngineConfig;
use crate::deletion::DeletionWorkflow;
use crate::error::Result;
use crate::models::OwnerId;
use crate::services::{BookmarkPersistence, IdentityProvider};
use crate::state::ConnectionState;
use crate::store::SharedCollection;
use crate::submission::SubmissionController;

/// Wires the store, the subscriber and the workflows for one owner.
///
/// There is no automatic reconnect; after a channel error the caller
/// decides when to [`reconnect`](Self::reconnect), which re-subscribes and
/// re-runs the full fetch so no change from the gap is missed.
pub struct CollectionSession<P, C> {
    owner: OwnerId,
    config: EngineConfig,
    persistence: Arc<P>,
    subscriber: ChannelSubscriber<C>,
    store: SharedCollection,
    deletion: DeletionWorkflow<P>,
    handle: Option<SubscriptionHandle>,
}

impl<P: BookmarkPersistence, C: PushChannel> CollectionSession<P, C> {
    /// Subscribe, then fetch and seed the store.
    ///
    /// The fetch starts only once the channel has registered the
    /// subscription, so every change is either in the seed or delivered.
    pub async fn open(
        owner: OwnerId,
        persistence: Arc<P>,
        channel: Arc<C>,
        config: &EngineConfig,
    ) -> Result<Self> {
        let store = SharedCollection::new(config);
        let mut session = Self {
            owner,
            config: config.clone(),
            deletion: DeletionWorkflow::new(Arc::clone(&persistence), owner, store.clone()),
            persistence,
            subscriber: ChannelSubscriber::new(channel, config),
            store,
            handle: None,
        };
        session.connect().await?;
        Ok(session)
    }

    /// Open a session for the signed-in user, if any.
    pub async fn open_for_current_user(
        identity: &impl IdentityProvider,
        persistence: Arc<P>,
        channel: Arc<C>,
        config: &EngineConfig,
    ) -> Result<Option<Self>> {
        let Some(owner) = identity.current_owner_id() else {
            tracing::debug!("No signed-in user; not opening a collection session");
            return Ok(None);
        };
        Self::open(owner, persistence, channel, config).await.map(Some)
    }

    /// Drop the current subscription and start over with a fresh fetch.
    ///
    /// On failure the session is left closed.
    pub async fn reconnect(&mut self) -> Result<()> {
        tracing::info!("Reconnecting bookmark collection for {}", self.owner);
        self.close().await;
        self.connect().await
    }

    /// Stop the subscription; idempotent.
    pub async fn close(&mut self) {
        if let Some(mut handle) = self.handle.take() {
            handle.stop().await;
        }
    }

    pub const fn owner(&self) -> &OwnerId {
        &self.owner
    }

    pub const fn store(&self) -> &SharedCollection {
        &self.store
    }

    /// Channel state, or `None` once the session is closed
    pub fn connection_state(&self) -> Option<ConnectionState> {
        self.handle.as_ref().map(SubscriptionHandle::state)
    }

    pub fn watch_state(&self) -> Option<watch::Receiver<ConnectionState>> {
        self.handle.as_ref().map(SubscriptionHandle::watch_state)
    }

    pub fn submission_controller(&self) -> SubmissionController<P> {
        SubmissionController::new(Arc::clone(&self.persistence), self.owner, &self.config)
    }

    /// The session's delete workflow; it holds the only pending confirmation.
    pub fn deletion_workflow(&mut self) -> &mut DeletionWorkflow<P> {
        &mut self.deletion
    }

    async fn connect(&mut self) -> Result<()> {
        let mut handle = self.subscriber.start(self.owner, self.store.clone());
        if !handle.acquired().await {
            tracing::warn!(
                "Channel {} unavailable; showing fetched bookmarks only",
                handle.key()
            );
        }

        // Holding the store across the fetch makes changes delivered
        // meanwhile queue up and apply on top of the seed.
        let mut store = self.store.lock().await;
        let records = match self.persistence.list(&self.owner).await {
            Ok(records) => records,
            Err(error) => {
                drop(store);
                handle.stop().await;
                tracing::warn!("Failed to load bookmarks for {}: {error}", self.owner);
                return Err(error);
            }
        };
        store.seed(records);
        drop(store);

        self.handle = Some(handle);
        Ok(())
    }
}
