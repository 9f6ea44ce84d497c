//! # lambda-view-bus
//!
//! Transports that carry strategy snapshots and parameter edits.
//!
//! A [`MessageBus`] offers two operations on a named channel: subscribe to
//! its messages and publish one. Implementations:
//!
//! - [`RedisBus`]: Redis PUBLISH/SUBSCRIBE
//! - [`HttpBus`]: polling a strategy's HTTP parameter service
//! - [`InMemoryBus`]: in-process, used by tests and demos
//! - [`RetryingBus`]: re-subscribes another bus after failures
//!
//! A [`Connector`] opens the right bus for a target host.

use std::sync::Arc;

use async_trait::async_trait;
use lambda_view_core::ChannelName;

pub mod connector;
pub mod error;
pub mod http_poll;
pub mod memory;
pub mod redis_bus;
pub mod retry;
pub mod subscription;

pub use connector::{Connector, UrlConnector};
pub use error::{BusError, Result};
pub use http_poll::HttpBus;
pub use memory::{InMemoryBus, Published};
pub use redis_bus::RedisBus;
pub use retry::{RetryPolicy, RetryingBus};
pub use subscription::{Delivery, Subscription};

/// A publish/subscribe transport.
///
/// Delivery is at-most-once: a message published while nobody is
/// subscribed is gone, and nothing is redelivered.
#[async_trait]
pub trait MessageBus: Send + Sync {
    /// Start receiving messages published on `channel` from now on.
    async fn subscribe(&self, channel: &ChannelName) -> Result<Subscription>;

    /// Send one message on `channel`.
    async fn publish(&self, channel: &ChannelName, payload: String) -> Result<()>;
}

#[async_trait]
impl<T: MessageBus + ?Sized> MessageBus for Arc<T> {
    async fn subscribe(&self, channel: &ChannelName) -> Result<Subscription> {
        (**self).subscribe(channel).await
    }

    async fn publish(&self, channel: &ChannelName, payload: String) -> Result<()> {
        (**self).publish(channel, payload).await
    }
}
