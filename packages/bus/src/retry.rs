//! Bounded reconnection for subscriptions.
//!
//! [`RetryingBus`] wraps another bus. When a subscription of the inner bus
//! fails or ends, it re-subscribes with exponential backoff, up to
//! [`RetryPolicy::max_retries`] consecutive failures. A delivered message
//! resets the count. Once the bound is exceeded the subscription reports
//! [`BusError::Closed`] and stops.
//!
//! Publishes pass straight through. An edit is never retried, so it reaches
//! the transport at most once.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use lambda_view_core::ChannelName;
use tracing::{debug, info, warn};

use crate::error::{BusError, Result};
use crate::subscription::Subscription;
use crate::MessageBus;

/// Backoff bounds for re-subscribing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Consecutive failures tolerated before giving up.
    pub max_retries: u32,
    /// Delay before the first re-subscribe.
    pub initial_backoff: Duration,
    /// Upper bound on the delay.
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 5,
            initial_backoff: Duration::from_millis(250),
            max_backoff: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    /// A policy that gives up on the first failure.
    pub fn no_retry() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Delay before retry number `attempt` (zero-based).
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
        self.initial_backoff
            .checked_mul(factor)
            .unwrap_or(self.max_backoff)
            .min(self.max_backoff)
    }
}

/// A bus whose subscriptions survive transient transport failures.
pub struct RetryingBus {
    inner: Arc<dyn MessageBus>,
    policy: RetryPolicy,
}

impl RetryingBus {
    pub fn new(inner: Arc<dyn MessageBus>, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }
}

#[async_trait]
impl MessageBus for RetryingBus {
    async fn subscribe(&self, channel: &ChannelName) -> Result<Subscription> {
        // The first attempt is not retried; the caller sees its error.
        let mut current = self.inner.subscribe(channel).await?;

        let (tx, rx) = Subscription::pipe();
        let inner = Arc::clone(&self.inner);
        let policy = self.policy.clone();
        let target = channel.clone();
        let pump = tokio::spawn(async move {
            let name = target.to_string();
            let mut failures = 0u32;
            loop {
                match current.recv().await {
                    Some(Ok(payload)) => {
                        failures = 0;
                        if tx.send(Ok(payload)).await.is_err() {
                            return;
                        }
                        continue;
                    }
                    Some(Err(e)) => warn!(channel = %name, error = %e, "subscription failed"),
                    None => debug!(channel = %name, "subscription ended"),
                }

                // Re-subscribe until it works or the budget runs out.
                loop {
                    if failures >= policy.max_retries {
                        warn!(channel = %name, failures, "giving up on subscription");
                        let _ = tx.send(Err(BusError::Closed { channel: name })).await;
                        return;
                    }
                    let delay = policy.backoff(failures);
                    failures += 1;
                    tokio::time::sleep(delay).await;
                    if tx.is_closed() {
                        return;
                    }
                    match inner.subscribe(&target).await {
                        Ok(sub) => {
                            info!(channel = %name, attempt = failures, "re-subscribed");
                            current = sub;
                            break;
                        }
                        Err(e) => {
                            warn!(channel = %name, attempt = failures, error = %e, "re-subscribe failed");
                        }
                    }
                }
            }
        });

        Ok(Subscription::new(channel.clone(), rx, pump))
    }

    async fn publish(&self, channel: &ChannelName, payload: String) -> Result<()> {
        self.inner.publish(channel, payload).await
    }
}
