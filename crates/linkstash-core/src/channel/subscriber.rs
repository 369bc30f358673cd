//! Subscription lifecycle for one owner's change feed.

use std::sync::Arc;

use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;

use super::{
    decode_change, ChangeHandler, ChannelMessage, ChannelStatus, DecodedChange, PushChannel,
    SubscriptionKey,
};
use crate::config::EngineConfig;
use crate::models::{OwnerId, RawChange};
use crate::state::ConnectionState;
use crate::util::compact_text;

/// Opens per-owner subscriptions on a push channel.
pub struct ChannelSubscriber<C> {
    channel: Arc<C>,
    topic_prefix: String,
}

impl<C: PushChannel> ChannelSubscriber<C> {
    pub fn new(channel: Arc<C>, config: &EngineConfig) -> Self {
        Self {
            channel,
            topic_prefix: config.topic_prefix.clone(),
        }
    }

    /// Start pumping `owner`'s changes into `handler`.
    ///
    /// Returns immediately in the `Connecting` state; the subscription is
    /// acquired on a background task owned by the returned handle.
    pub fn start<H: ChangeHandler>(&self, owner: OwnerId, handler: H) -> SubscriptionHandle {
        let key = SubscriptionKey::for_owner(&self.topic_prefix, &owner);
        let (state_tx, state_rx) = watch::channel(ConnectionState::Connecting);
        let (stop_tx, stop_rx) = oneshot::channel();
        let (acquired_tx, acquired_rx) = oneshot::channel();

        let task = tokio::spawn(run_subscription(
            Arc::clone(&self.channel),
            key.clone(),
            owner,
            handler,
            state_tx,
            stop_rx,
            acquired_tx,
        ));

        SubscriptionHandle {
            key,
            state: state_rx,
            stop: Some(stop_tx),
            acquired: Some(acquired_rx),
            registered: false,
            task: Some(task),
        }
    }

    /// Stop a subscription; safe to call any number of times.
    pub async fn stop(&self, handle: &mut SubscriptionHandle) {
        handle.stop().await;
    }
}

/// Owns a running subscription task.
///
/// Dropping the handle requests a stop without waiting for it.
#[derive(Debug)]
pub struct SubscriptionHandle {
    key: SubscriptionKey,
    state: watch::Receiver<ConnectionState>,
    stop: Option<oneshot::Sender<()>>,
    acquired: Option<oneshot::Receiver<()>>,
    registered: bool,
    task: Option<JoinHandle<()>>,
}

impl SubscriptionHandle {
    pub const fn key(&self) -> &SubscriptionKey {
        &self.key
    }

    /// Current connection state
    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    /// Receiver that observes every state transition
    pub fn watch_state(&self) -> watch::Receiver<ConnectionState> {
        self.state.clone()
    }

    pub const fn is_stopped(&self) -> bool {
        self.task.is_none()
    }

    /// Wait until the channel has registered the subscription.
    ///
    /// Returns `false` if subscribing failed or the subscription was stopped
    /// first. Every change published after a `true` return is delivered.
    pub async fn acquired(&mut self) -> bool {
        if let Some(acquired) = self.acquired.take() {
            self.registered = acquired.await.is_ok();
        }
        self.registered
    }

    /// Stop the subscription and wait until the channel has been released.
    pub async fn stop(&mut self) {
        if let Some(stop) = self.stop.take() {
            stop.send(()).ok();
        }
        if let Some(task) = self.task.take() {
            if let Err(error) = task.await {
                tracing::warn!("Subscription task for {} ended abnormally: {error}", self.key);
            }
        }
    }
}

impl Drop for SubscriptionHandle {
    fn drop(&mut self) {
        if let Some(stop) = self.stop.take() {
            stop.send(()).ok();
        }
    }
}

async fn run_subscription<C: PushChannel, H: ChangeHandler>(
    channel: Arc<C>,
    key: SubscriptionKey,
    owner: OwnerId,
    handler: H,
    state: watch::Sender<ConnectionState>,
    mut stop: oneshot::Receiver<()>,
    acquired: oneshot::Sender<()>,
) {
    // A closed stop channel (handle dropped) counts as a stop request.
    let subscribed = tokio::select! {
        biased;
        _ = &mut stop => None,
        result = channel.subscribe(&key) => Some(result),
    };

    let mut subscription = match subscribed {
        None => {
            tracing::debug!("Stopped {key} before the subscription was acquired");
            return;
        }
        Some(Err(error)) => {
            tracing::warn!("Failed to subscribe to {key}: {error}");
            publish_state(&state, &handler, ConnectionState::Error).await;
            return;
        }
        Some(Ok(subscription)) => subscription,
    };
    tracing::info!("Subscribed to bookmark changes on {key}");
    acquired.send(()).ok();

    loop {
        tokio::select! {
            biased;
            _ = &mut stop => break,
            message = subscription.events.recv() => match message {
                Some(ChannelMessage::Status(status)) => {
                    let next = match status {
                        ChannelStatus::Connecting => ConnectionState::Connecting,
                        ChannelStatus::Active => ConnectionState::Live,
                        ChannelStatus::Failed(reason) => {
                            tracing::warn!("Channel {key} reported failure: {}", compact_text(&reason));
                            ConnectionState::Error
                        }
                    };
                    publish_state(&state, &handler, next).await;
                }
                Some(ChannelMessage::Change(change)) => {
                    dispatch(&owner, &handler, change).await;
                }
                None => {
                    tracing::warn!("Channel {key} closed the subscription stream");
                    publish_state(&state, &handler, ConnectionState::Error).await;
                    break;
                }
            },
        }
    }

    channel.unsubscribe(&key, subscription.token).await;
    tracing::info!("Unsubscribed from {key}");
}

async fn dispatch<H: ChangeHandler>(owner: &OwnerId, handler: &H, change: RawChange) {
    let decoded = match decode_change(change) {
        Ok(decoded) => decoded,
        Err(error) => {
            tracing::warn!("Dropping undecodable change event: {error}");
            return;
        }
    };

    if !decoded.belongs_to(owner) {
        tracing::debug!("Ignoring change event for another owner");
        return;
    }

    match decoded {
        DecodedChange::Insert(record) => handler.on_insert(record).await,
        DecodedChange::Delete(row) => handler.on_delete(row.id).await,
    }
}

async fn publish_state<H: ChangeHandler>(
    state: &watch::Sender<ConnectionState>,
    handler: &H,
    next: ConnectionState,
) {
    let changed = state.send_if_modified(|current| {
        if *current == next {
            false
        } else {
            *current = next;
            true
        }
    });
    if changed {
        handler.on_state_change(next).await;
    }
}
