//! HTTP polling transport.
//!
//! Some strategies expose their snapshots through a small HTTP parameter
//! service instead of pub/sub:
//!
//! ```text
//! GET  {host}/state    -> state object, or JSON array of state entries
//! GET  {host}/params   -> JSON array of parameter entries
//! POST {host}/params   <- JSON array of edited entries
//! ```
//!
//! The service may also wrap either response in a JSON string literal.
//!
//! `HttpBus` maps that service onto [`MessageBus`]: a subscription polls the
//! matching route and delivers every response body as one snapshot message,
//! and a publish to the update channel becomes a `POST /params`. Bodies are
//! rewritten to the entry-array form every other transport carries; an
//! object becomes one entry per field. Snapshots replace each other
//! wholesale, so repeated polls need no deduplication.

use std::time::Duration;

use async_trait::async_trait;
use lambda_view_core::{ChannelKind, ChannelName, Group, Snapshot};
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use serde_json::Value;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};
use url::Url;

use crate::error::{BusError, Result};
use crate::subscription::Subscription;
use crate::MessageBus;

/// Default interval between polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Message bus over a strategy's HTTP parameter service.
pub struct HttpBus {
    client: Client,
    base_url: Url,
    poll_interval: Duration,
}

impl HttpBus {
    /// Create a bus for the service at `base_url`, polling every 500 ms.
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_poll_interval(base_url, DEFAULT_POLL_INTERVAL)
    }

    pub fn with_poll_interval(base_url: &str, poll_interval: Duration) -> Result<Self> {
        let mut base_url = Url::parse(base_url)?;
        // Routes are joined onto the base; keep any base path intact.
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Ok(Self {
            client: Client::new(),
            base_url,
            poll_interval,
        })
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// URL serving `channel`.
    pub fn route(&self, channel: &ChannelName) -> Result<Url> {
        let path = match channel.kind() {
            ChannelKind::StrategyStates => "state",
            ChannelKind::StrategyParams | ChannelKind::UpdateParam => "params",
        };
        Ok(self.base_url.join(path)?)
    }
}

async fn fetch(client: &Client, url: Url) -> Result<String> {
    let body = client
        .get(url)
        .send()
        .await?
        .error_for_status()?
        .text()
        .await?;
    Ok(body)
}

/// Rewrite a response body as a JSON array of entries of `group`.
///
/// A string literal is unwrapped first. Bodies that are not JSON are passed
/// on unchanged for the session to reject.
pub fn normalize_body(group: Group, body: String) -> String {
    let value = match serde_json::from_str::<Value>(&body) {
        Ok(Value::String(inner)) => match serde_json::from_str::<Value>(&inner) {
            Ok(value) => value,
            Err(_) => return inner,
        },
        Ok(value) => value,
        Err(_) => return body,
    };
    if value.is_object() {
        Snapshot::from_object(group, &value).encode().unwrap_or(body)
    } else {
        value.to_string()
    }
}

#[async_trait]
impl MessageBus for HttpBus {
    async fn subscribe(&self, channel: &ChannelName) -> Result<Subscription> {
        let name = channel.to_string();
        let Some(group) = channel.kind().group() else {
            return Err(BusError::subscribe(&name, "update channel is publish-only"));
        };
        let url = self.route(channel)?;

        // The first poll doubles as the subscribe handshake.
        let first = fetch(&self.client, url.clone())
            .await
            .map_err(|e| BusError::subscribe(&name, e))?;

        debug!(channel = %channel, url = %url, "polling");
        let (tx, rx) = Subscription::pipe();
        let client = self.client.clone();
        let poll_interval = self.poll_interval;
        let pump = tokio::spawn(async move {
            if tx.send(Ok(normalize_body(group, first))).await.is_err() {
                return;
            }
            let mut ticker = tokio::time::interval(poll_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // interval fires immediately; the first poll already happened.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                match fetch(&client, url.clone()).await {
                    Ok(body) => {
                        if tx.send(Ok(normalize_body(group, body))).await.is_err() {
                            return;
                        }
                    }
                    Err(e) => {
                        warn!(channel = %name, error = %e, "poll failed, closing subscription");
                        let _ = tx.send(Err(e)).await;
                        return;
                    }
                }
            }
        });

        Ok(Subscription::new(channel.clone(), rx, pump))
    }

    async fn publish(&self, channel: &ChannelName, payload: String) -> Result<()> {
        let name = channel.to_string();
        if channel.kind() != ChannelKind::UpdateParam {
            return Err(BusError::publish(&name, "only the update channel accepts edits"));
        }
        let url = self.route(channel)?;
        self.client
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .body(payload)
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|e| BusError::publish(&name, e))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn channel(kind: ChannelKind) -> ChannelName {
        ChannelName::new(kind, "swap-mm-ethusd").unwrap()
    }

    #[test]
    fn routes_by_channel_kind() {
        let bus = HttpBus::new("http://localhost:8000").unwrap();
        assert_eq!(
            bus.route(&channel(ChannelKind::StrategyStates)).unwrap().as_str(),
            "http://localhost:8000/state"
        );
        assert_eq!(
            bus.route(&channel(ChannelKind::StrategyParams)).unwrap().as_str(),
            "http://localhost:8000/params"
        );
        assert_eq!(
            bus.route(&channel(ChannelKind::UpdateParam)).unwrap().as_str(),
            "http://localhost:8000/params"
        );
    }

    #[test]
    fn keeps_base_path() {
        let bus = HttpBus::new("https://quant.example.com/lambda").unwrap();
        assert_eq!(
            bus.route(&channel(ChannelKind::StrategyParams)).unwrap().as_str(),
            "https://quant.example.com/lambda/params"
        );
    }

    #[test]
    fn rejects_invalid_url() {
        assert!(matches!(
            HttpBus::new("not a url"),
            Err(BusError::UrlParse(_))
        ));
    }

    #[test]
    fn custom_poll_interval() {
        let bus =
            HttpBus::with_poll_interval("http://localhost", Duration::from_secs(2)).unwrap();
        assert_eq!(bus.poll_interval(), Duration::from_secs(2));
    }

    fn decoded(group: Group, body: &str) -> Vec<lambda_view_core::Entry> {
        Snapshot::decode(group, &normalize_body(group, body.to_string()))
            .unwrap()
            .into_entries()
    }

    #[test]
    fn entry_array_passes_through() {
        let body = r#"[{"group":"params","key":"size","type":"Int","value":1}]"#;
        assert_eq!(normalize_body(Group::Param, body.to_string()), body);
    }

    #[test]
    fn string_wrapped_entries_are_unwrapped() {
        let body = serde_json::to_string(r#"[{"key":"size","type":"Int","value":1}]"#).unwrap();
        let entries = decoded(Group::Param, &body);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].key, "size");
        assert_eq!(entries[0].group, Group::Param);
    }

    #[test]
    fn state_object_becomes_entries() {
        let body = serde_json::to_string(r#"{"pnl":1.5,"state":"Live"}"#).unwrap();
        let entries = decoded(Group::State, &body);
        let keys: Vec<_> = entries.iter().map(|e| e.key.as_str()).collect();
        assert_eq!(keys, vec!["pnl", "state"]);
        assert!(entries.iter().all(|e| e.group == Group::State));

        let bare = decoded(Group::State, r#"{"pnl":1.5}"#);
        assert_eq!(bare[0].value, serde_json::json!(1.5));
    }

    #[test]
    fn non_json_body_is_unchanged() {
        assert_eq!(normalize_body(Group::State, "Error".to_string()), "Error");
    }

    #[tokio::test]
    async fn publish_only_on_update_channel() {
        let bus = HttpBus::new("http://localhost:1").unwrap();
        let result = bus
            .publish(&channel(ChannelKind::StrategyParams), "[]".into())
            .await;
        assert!(matches!(result, Err(BusError::Publish { .. })));
    }

    #[tokio::test]
    async fn update_channel_is_not_subscribable() {
        let bus = HttpBus::new("http://localhost:1").unwrap();
        let result = bus.subscribe(&channel(ChannelKind::UpdateParam)).await;
        assert!(matches!(result, Err(BusError::Subscribe { .. })));
    }
}
