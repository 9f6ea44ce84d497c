//! Publishing parameter edits.

use std::sync::Arc;

use lambda_view_bus::MessageBus;
use lambda_view_core::{
    encode_entries, parse_edit, parse_edit_json, ChannelName, Channels, Entry, TypedValue,
};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::EditError;

/// Key of the parameter that starts and stops a strategy.
pub const RUN_STATE_KEY: &str = "state";
/// Run state value of a started strategy.
pub const LIVE: &str = "Live";
/// Run state value of a stopped strategy.
pub const STOPPED: &str = "Stopped";

/// The transport accepted an edit. The strategy may still ignore it.
#[derive(Debug, Clone, PartialEq)]
pub struct Ack {
    pub channel: ChannelName,
    pub entry: Entry,
}

/// Publishes edits to an instance's update channel.
///
/// Each edit is sent at most once. A failed publish is returned to the
/// caller and never retried.
#[derive(Clone)]
pub struct EditGateway {
    bus: Arc<dyn MessageBus>,
    channels: Channels,
}

impl EditGateway {
    pub fn new(bus: Arc<dyn MessageBus>, channels: Channels) -> Self {
        Self { bus, channels }
    }

    pub fn channels(&self) -> &Channels {
        &self.channels
    }

    /// Coerce `raw` to the entry's type and publish the edited entry.
    ///
    /// State entries and coercion failures are rejected before anything
    /// reaches the transport.
    pub async fn submit(&self, entry: &Entry, raw: &str) -> Result<Ack, EditError> {
        if !entry.group.is_editable() {
            return Err(EditError::NotEditable { row: entry.row_id() });
        }
        let value = parse_edit(entry, raw)?;
        self.publish(entry.with_value(&value)).await
    }

    /// Like [`submit`](Self::submit) for input that is already a JSON value.
    pub async fn submit_json(&self, entry: &Entry, raw: &Value) -> Result<Ack, EditError> {
        if !entry.group.is_editable() {
            return Err(EditError::NotEditable { row: entry.row_id() });
        }
        let value = parse_edit_json(entry, raw)?;
        self.publish(entry.with_value(&value)).await
    }

    /// Publish the `state` parameter as `Live` or `Stopped`.
    ///
    /// Works whether or not the strategy has reported a `state` parameter.
    pub async fn set_running(&self, running: bool) -> Result<Ack, EditError> {
        self.publish(run_state_entry(running)).await
    }

    async fn publish(&self, entry: Entry) -> Result<Ack, EditError> {
        let payload = encode_entries(std::slice::from_ref(&entry)).map_err(|e| {
            EditError::Encode {
                message: e.to_string(),
            }
        })?;
        let channel = self.channels.update.clone();

        if let Err(e) = self.bus.publish(&channel, payload).await {
            warn!(channel = %channel, key = %entry.key, error = %e, "edit not published");
            return Err(e.into());
        }
        debug!(channel = %channel, key = %entry.key, value = %entry.value, "edit published");
        Ok(Ack { channel, entry })
    }
}

/// The `state` parameter entry for a run state.
pub fn run_state_entry(running: bool) -> Entry {
    let value = TypedValue::String(if running { LIVE } else { STOPPED }.to_string());
    Entry::param(RUN_STATE_KEY, value.value_type(), value.to_json())
}
