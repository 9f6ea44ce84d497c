//! Turning a host URL into a bus.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;
use url::Url;

use crate::error::{BusError, Result};
use crate::http_poll::{HttpBus, DEFAULT_POLL_INTERVAL};
use crate::memory::InMemoryBus;
use crate::redis_bus::RedisBus;
use crate::retry::{RetryPolicy, RetryingBus};
use crate::MessageBus;

/// Opens one bus per target host.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, host: &str) -> Result<Arc<dyn MessageBus>>;
}

/// Chooses the transport from the host URL's scheme.
///
/// | scheme            | transport       |
/// |-------------------|-----------------|
/// | `redis`, `rediss` | [`RedisBus`]    |
/// | `http`, `https`   | [`HttpBus`]     |
/// | `memory`          | [`InMemoryBus`] |
///
/// Every `memory://` host resolves to the connector's one in-process bus,
/// reachable through [`memory_bus`](Self::memory_bus).
#[derive(Debug, Clone)]
pub struct UrlConnector {
    poll_interval: Duration,
    retry: Option<RetryPolicy>,
    memory: InMemoryBus,
}

impl Default for UrlConnector {
    fn default() -> Self {
        Self::new(DEFAULT_POLL_INTERVAL, Some(RetryPolicy::default()))
    }
}

impl UrlConnector {
    pub fn new(poll_interval: Duration, retry: Option<RetryPolicy>) -> Self {
        Self {
            poll_interval,
            retry,
            memory: InMemoryBus::new(),
        }
    }

    /// The bus shared by all `memory://` hosts.
    pub fn memory_bus(&self) -> &InMemoryBus {
        &self.memory
    }

    fn wrap(&self, bus: Arc<dyn MessageBus>) -> Arc<dyn MessageBus> {
        match &self.retry {
            Some(policy) => Arc::new(RetryingBus::new(bus, policy.clone())),
            None => bus,
        }
    }
}

#[async_trait]
impl Connector for UrlConnector {
    async fn connect(&self, host: &str) -> Result<Arc<dyn MessageBus>> {
        let url = Url::parse(host)?;
        debug!(host, scheme = url.scheme(), "connecting");
        let bus: Arc<dyn MessageBus> = match url.scheme() {
            "redis" | "rediss" => Arc::new(RedisBus::connect(host).await?),
            "http" | "https" => Arc::new(HttpBus::with_poll_interval(host, self.poll_interval)?),
            "memory" => Arc::new(self.memory.clone()),
            other => {
                return Err(BusError::UnsupportedScheme {
                    scheme: other.to_string(),
                })
            }
        };
        Ok(self.wrap(bus))
    }
}
