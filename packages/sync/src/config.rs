//! Engine configuration.

use std::time::Duration;

use lambda_view_bus::http_poll::DEFAULT_POLL_INTERVAL;
use lambda_view_bus::{RetryPolicy, UrlConnector};

/// Configuration for the synchronization engine.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Re-subscribe policy for dropped subscriptions. `None` lets a
    /// dropped subscription close its session for good.
    pub retry: Option<RetryPolicy>,
    /// Interval between polls on HTTP hosts.
    pub http_poll_interval: Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            retry: Some(RetryPolicy::default()),
            http_poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

impl SyncConfig {
    /// The connector that opens buses with these settings.
    pub fn connector(&self) -> UrlConnector {
        UrlConnector::new(self.http_poll_interval, self.retry.clone())
    }
}
