//! In-process push channel.
//!
//! Every subscriber receives every change for the table, unscoped, the way a
//! database change feed delivers them. Owner filtering is the subscriber's
//! job.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};

use crate::channel::{
    ChannelMessage, ChannelStatus, PushChannel, Subscription, SubscriptionKey, SubscriptionToken,
};
use crate::config::EngineConfig;
use crate::error::Result;
use crate::models::RawChange;

/// Fan-out hub implementing [`PushChannel`]
#[derive(Clone)]
pub struct ChangeHub {
    state: Arc<Mutex<HubState>>,
}

struct HubState {
    buffer: usize,
    next_token: u64,
    subscribers: HashMap<SubscriptionKey, (SubscriptionToken, mpsc::Sender<ChannelMessage>)>,
}

impl Default for ChangeHub {
    fn default() -> Self {
        Self::new(&EngineConfig::default())
    }
}

impl ChangeHub {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            state: Arc::new(Mutex::new(HubState {
                // Room for the two status messages sent on subscribe.
                buffer: config.channel_buffer.max(2),
                next_token: 0,
                subscribers: HashMap::new(),
            })),
        }
    }

    /// Deliver a change to every subscriber
    pub async fn publish(&self, change: RawChange) {
        self.broadcast(ChannelMessage::Change(change)).await;
    }

    /// Report a channel failure to every subscriber
    pub async fn fail_all(&self, reason: impl Into<String>) {
        let reason = reason.into();
        tracing::warn!("Change hub failing all subscriptions: {reason}");
        self.broadcast(ChannelMessage::Status(ChannelStatus::Failed(reason)))
            .await;
    }

    /// Report every subscription as active again
    pub async fn set_active_all(&self) {
        self.broadcast(ChannelMessage::Status(ChannelStatus::Active))
            .await;
    }

    /// Drop every subscription, ending their streams
    pub async fn close_all(&self) {
        self.state.lock().await.subscribers.clear();
    }

    pub async fn subscriber_count(&self) -> usize {
        self.state.lock().await.subscribers.len()
    }

    async fn broadcast(&self, message: ChannelMessage) {
        // Clone the senders so a slow subscriber never blocks the hub lock.
        let senders: Vec<mpsc::Sender<ChannelMessage>> = {
            let state = self.state.lock().await;
            state
                .subscribers
                .values()
                .map(|(_, sender)| sender.clone())
                .collect()
        };

        for sender in senders {
            if sender.send(message.clone()).await.is_err() {
                tracing::debug!("Skipping closed subscription");
            }
        }
    }
}

impl PushChannel for ChangeHub {
    fn subscribe(
        &self,
        key: &SubscriptionKey,
    ) -> impl Future<Output = Result<Subscription>> + Send {
        let key = key.clone();
        async move {
            let mut state = self.state.lock().await;
            let (sender, events) = mpsc::channel(state.buffer);
            sender
                .try_send(ChannelMessage::Status(ChannelStatus::Connecting))
                .ok();
            sender
                .try_send(ChannelMessage::Status(ChannelStatus::Active))
                .ok();

            state.next_token += 1;
            let token = SubscriptionToken(state.next_token);
            if state.subscribers.insert(key.clone(), (token, sender)).is_some() {
                tracing::debug!("Replaced existing subscription for {key}");
            }
            Ok(Subscription { token, events })
        }
    }

    fn unsubscribe(
        &self,
        key: &SubscriptionKey,
        token: SubscriptionToken,
    ) -> impl Future<Output = ()> + Send {
        let key = key.clone();
        async move {
            let mut state = self.state.lock().await;
            if state
                .subscribers
                .get(&key)
                .is_some_and(|(current, _)| *current == token)
            {
                state.subscribers.remove(&key);
            }
        }
    }
}
