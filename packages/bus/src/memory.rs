//! In-process message bus backed by tokio broadcast channels.
//!
//! `InMemoryBus` behaves like a pub/sub server with no persistence:
//!
//! - **publish**: records the payload, then fans it out to current subscribers
//! - **subscribe**: sees only messages published after it subscribed
//! - **drop_channel**: ends every subscription on a channel, the way a
//!   dropped server connection would
//!
//! It doubles as the recording transport in tests: every publish is kept
//! for inspection and publishes or subscribes can be made to fail.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use lambda_view_core::ChannelName;
use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::connector::Connector;
use crate::error::{BusError, Result};
use crate::subscription::{Subscription, DEFAULT_CAPACITY};
use crate::MessageBus;

/// A payload published through [`MessageBus::publish`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Published {
    pub channel: String,
    pub payload: String,
}

#[derive(Default)]
struct Inner {
    channels: Mutex<HashMap<String, broadcast::Sender<String>>>,
    published: Mutex<Vec<Published>>,
    publish_failure: Mutex<Option<String>>,
    subscribe_failure: Mutex<Option<String>>,
}

/// A cloneable in-process pub/sub bus. Clones share channels.
#[derive(Clone, Default)]
pub struct InMemoryBus {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for InMemoryBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryBus")
            .field("channels", &lock(&self.inner.channels).len())
            .field("published", &lock(&self.inner.published).len())
            .finish()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl InMemoryBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver `payload` to the current subscribers of `channel` without
    /// recording it. This is the strategy side of the bus.
    ///
    /// Returns the number of subscribers reached.
    pub fn send(&self, channel: &str, payload: impl Into<String>) -> usize {
        let channels = lock(&self.inner.channels);
        match channels.get(channel) {
            Some(sender) => sender.send(payload.into()).unwrap_or(0),
            None => 0,
        }
    }

    /// Number of live subscriptions on `channel`.
    pub fn subscriber_count(&self, channel: &str) -> usize {
        lock(&self.inner.channels)
            .get(channel)
            .map(|sender| sender.receiver_count())
            .unwrap_or(0)
    }

    /// End every subscription on `channel`.
    pub fn drop_channel(&self, channel: &str) {
        if lock(&self.inner.channels).remove(channel).is_some() {
            debug!(channel, "in-memory channel dropped");
        }
    }

    /// Every publish attempt so far, in order.
    pub fn published(&self) -> Vec<Published> {
        lock(&self.inner.published).clone()
    }

    /// Payloads published on `channel`, in order.
    pub fn published_on(&self, channel: &str) -> Vec<String> {
        lock(&self.inner.published)
            .iter()
            .filter(|p| p.channel == channel)
            .map(|p| p.payload.clone())
            .collect()
    }

    pub fn clear_published(&self) {
        lock(&self.inner.published).clear();
    }

    /// Make every following publish fail with `message`.
    pub fn fail_publishes_with(&self, message: impl Into<String>) {
        *lock(&self.inner.publish_failure) = Some(message.into());
    }

    /// Make every following subscribe fail with `message`.
    pub fn fail_subscribes_with(&self, message: impl Into<String>) {
        *lock(&self.inner.subscribe_failure) = Some(message.into());
    }

    /// Clear any configured failures.
    pub fn heal(&self) {
        *lock(&self.inner.publish_failure) = None;
        *lock(&self.inner.subscribe_failure) = None;
    }

    fn sender(&self, channel: &str) -> broadcast::Sender<String> {
        lock(&self.inner.channels)
            .entry(channel.to_string())
            .or_insert_with(|| broadcast::channel(DEFAULT_CAPACITY).0)
            .clone()
    }
}

#[async_trait]
impl MessageBus for InMemoryBus {
    async fn subscribe(&self, channel: &ChannelName) -> Result<Subscription> {
        let name = channel.to_string();
        if let Some(message) = lock(&self.inner.subscribe_failure).clone() {
            return Err(BusError::subscribe(&name, message));
        }

        // Subscribe before spawning so nothing published after this call
        // returns can be missed.
        let mut source = self.sender(&name).subscribe();
        let (tx, rx) = Subscription::pipe();
        let pump = tokio::spawn(async move {
            loop {
                match source.recv().await {
                    Ok(payload) => {
                        if tx.send(Ok(payload)).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        // Snapshots replace each other; older ones can go.
                        warn!(channel = %name, skipped, "subscriber lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
            debug!(channel = %name, "in-memory subscription ended");
        });

        Ok(Subscription::new(channel.clone(), rx, pump))
    }

    async fn publish(&self, channel: &ChannelName, payload: String) -> Result<()> {
        let name = channel.to_string();
        lock(&self.inner.published).push(Published {
            channel: name.clone(),
            payload: payload.clone(),
        });

        if let Some(message) = lock(&self.inner.publish_failure).clone() {
            return Err(BusError::publish(&name, message));
        }

        // Like a pub/sub PUBLISH, reaching zero subscribers is still success.
        let _ = self.sender(&name).send(payload);
        Ok(())
    }
}

/// Every host resolves to the same shared bus.
#[async_trait]
impl Connector for InMemoryBus {
    async fn connect(&self, host: &str) -> Result<Arc<dyn MessageBus>> {
        debug!(host, "connecting in-memory bus");
        Ok(Arc::new(self.clone()))
    }
}
