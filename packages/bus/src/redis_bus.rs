//! Redis PUBLISH/SUBSCRIBE transport.
//!
//! One multiplexed connection is opened per bus and shared by every
//! publish. Each subscription gets its own pub/sub connection, since a
//! Redis connection in subscribe mode cannot issue other commands.

use async_trait::async_trait;
use futures_util::StreamExt;
use lambda_view_core::ChannelName;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;
use tracing::{debug, warn};

use crate::error::{BusError, Result};
use crate::subscription::Subscription;
use crate::MessageBus;

/// Message bus over a Redis server.
pub struct RedisBus {
    client: redis::Client,
    publisher: MultiplexedConnection,
}

impl RedisBus {
    /// Open the publishing connection to `url` (e.g. `redis://127.0.0.1:6379`).
    pub async fn connect(url: &str) -> Result<Self> {
        let connect_error = |e: redis::RedisError| BusError::Connect {
            host: url.to_string(),
            message: e.to_string(),
        };
        let client = redis::Client::open(url).map_err(connect_error)?;
        let publisher = client
            .get_multiplexed_async_connection()
            .await
            .map_err(connect_error)?;
        debug!(url, "redis bus connected");
        Ok(Self { client, publisher })
    }
}

#[async_trait]
impl MessageBus for RedisBus {
    async fn subscribe(&self, channel: &ChannelName) -> Result<Subscription> {
        let name = channel.to_string();
        let mut pubsub = self
            .client
            .get_async_pubsub()
            .await
            .map_err(|e| BusError::subscribe(&name, e))?;
        pubsub
            .subscribe(&name)
            .await
            .map_err(|e| BusError::subscribe(&name, e))?;

        let (tx, rx) = Subscription::pipe();
        let pump = tokio::spawn(async move {
            let messages = pubsub.into_on_message();
            tokio::pin!(messages);
            while let Some(msg) = messages.next().await {
                let payload = match msg.get_payload::<String>() {
                    Ok(payload) => payload,
                    Err(e) => {
                        warn!(channel = %name, error = %e, "dropping non-text payload");
                        continue;
                    }
                };
                if tx.send(Ok(payload)).await.is_err() {
                    return;
                }
            }
            // The stream only ends when the connection is gone.
            let _ = tx
                .send(Err(BusError::Closed {
                    channel: name.clone(),
                }))
                .await;
            debug!(channel = %name, "redis subscription ended");
        });

        Ok(Subscription::new(channel.clone(), rx, pump))
    }

    async fn publish(&self, channel: &ChannelName, payload: String) -> Result<()> {
        let name = channel.to_string();
        let mut conn = self.publisher.clone();
        let receivers: i64 = conn
            .publish(&name, payload)
            .await
            .map_err(|e| BusError::publish(&name, e))?;
        debug!(channel = %name, receivers, "published");
        Ok(())
    }
}
