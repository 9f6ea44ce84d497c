//! Subscription sessions.
//!
//! A [`Session`] turns one channel subscription into a sequence of decoded
//! [`Snapshot`]s. It is lazy and cannot be restarted: once cancelled, or
//! once the transport ends it, [`Session::next`] returns `None` forever.
//! Reconnecting means opening a new session.

use std::sync::{Arc, Mutex, PoisonError};

use lambda_view_bus::{BusError, MessageBus, Subscription};
use lambda_view_core::{ChannelName, Group, Snapshot};
use tracing::{debug, error, info_span, warn, Instrument, Span};
use uuid::Uuid;

use crate::cancel::CancelToken;

/// Unique identifier for a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Delivering snapshots.
    Open,
    /// Cancelled by its owner.
    Cancelled,
    /// Ended by the transport.
    Closed,
}

/// Observes and cancels a session from outside the task that drives it.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    pub id: SessionId,
    channel: ChannelName,
    cancel: CancelToken,
    state: Arc<Mutex<SessionState>>,
}

impl SessionHandle {
    pub fn channel(&self) -> &ChannelName {
        &self.channel
    }

    pub fn state(&self) -> SessionState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Stop the session. Idempotent.
    pub fn cancel(&self) {
        if self.cancel.cancel() {
            debug!(session = %self.id, channel = %self.channel, "session cancelled");
        }
    }
}

/// A live subscription decoding snapshots for one group.
pub struct Session {
    handle: SessionHandle,
    group: Group,
    subscription: Subscription,
    dropped: u64,
    span: Span,
}

impl Session {
    /// Subscribe to a `StrategyStates` or `StrategyParams` channel.
    pub async fn open(bus: &dyn MessageBus, channel: ChannelName) -> Result<Self, BusError> {
        let group = channel.kind().group().ok_or_else(|| BusError::Subscribe {
            channel: channel.to_string(),
            message: "not a snapshot channel".to_string(),
        })?;

        let id = SessionId::new();
        let span = info_span!("session", id = %id, channel = %channel);
        let subscription = bus
            .subscribe(&channel)
            .instrument(span.clone())
            .await?;
        span.in_scope(|| debug!("session opened"));

        Ok(Self {
            handle: SessionHandle {
                id,
                channel,
                cancel: CancelToken::new(),
                state: Arc::new(Mutex::new(SessionState::Open)),
            },
            group,
            subscription,
            dropped: 0,
            span,
        })
    }

    pub fn id(&self) -> SessionId {
        self.handle.id
    }

    pub fn group(&self) -> Group {
        self.group
    }

    pub fn channel(&self) -> &ChannelName {
        &self.handle.channel
    }

    pub fn state(&self) -> SessionState {
        self.handle.state()
    }

    /// Number of payloads dropped because they did not decode.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    pub fn handle(&self) -> SessionHandle {
        self.handle.clone()
    }

    /// Stop the session. Idempotent; no snapshot is yielded afterwards.
    pub fn cancel(&self) {
        self.handle.cancel();
    }

    fn finish(&mut self, state: SessionState) {
        *self
            .handle
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = state;
        self.subscription.close();
    }

    /// Wait for the next well-formed snapshot.
    ///
    /// Malformed payloads are logged, counted and skipped. Returns `None`
    /// once the session is cancelled or closed.
    pub async fn next(&mut self) -> Option<Snapshot> {
        let span = self.span.clone();
        self.next_inner().instrument(span).await
    }

    async fn next_inner(&mut self) -> Option<Snapshot> {
        if self.state() != SessionState::Open {
            return None;
        }
        if self.handle.cancel.is_cancelled() {
            self.finish(SessionState::Cancelled);
            return None;
        }

        let cancel = self.handle.cancel.clone();
        loop {
            let delivery = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    self.finish(SessionState::Cancelled);
                    return None;
                }
                delivery = self.subscription.recv() => delivery,
            };

            match delivery {
                Some(Ok(payload)) => match Snapshot::decode(self.group, &payload) {
                    Ok(snapshot) => {
                        let foreign = snapshot
                            .entries()
                            .iter()
                            .filter(|e| e.group != self.group)
                            .count();
                        if foreign > 0 {
                            debug!(foreign, "entries tagged with the other group kept as sent");
                        }
                        // A cancel may have raced the delivery.
                        if cancel.is_cancelled() {
                            self.finish(SessionState::Cancelled);
                            return None;
                        }
                        return Some(snapshot);
                    }
                    Err(e) => {
                        self.dropped += 1;
                        warn!(error = %e, dropped = self.dropped, "dropping malformed payload");
                    }
                },
                Some(Err(e)) => {
                    error!(error = %e, "transport failed, closing session");
                    self.finish(SessionState::Closed);
                    return None;
                }
                None => {
                    error!("transport ended, closing session");
                    self.finish(SessionState::Closed);
                    return None;
                }
            }
        }
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.handle.id)
            .field("channel", &self.handle.channel.to_string())
            .field("state", &self.state())
            .field("dropped", &self.dropped)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lambda_view_bus::InMemoryBus;
    use lambda_view_core::{ChannelKind, Entry, ValueType};
    use serde_json::json;

    const PARAMS: &str = "StrategyParams:swap-mm-ethusd";

    fn params_channel() -> ChannelName {
        ChannelName::new(ChannelKind::StrategyParams, "swap-mm-ethusd").unwrap()
    }

    #[tokio::test]
    async fn yields_decoded_snapshots() {
        let bus = InMemoryBus::new();
        let mut session = Session::open(&bus, params_channel()).await.unwrap();
        assert_eq!(session.group(), Group::Param);

        bus.send(
            PARAMS,
            r#"[{"group":"params","key":"size","type":"Int","value":3}]"#,
        );
        let snapshot = session.next().await.unwrap();
        assert_eq!(
            snapshot.entries(),
            &[Entry::param("size", ValueType::Int, json!(3))]
        );
    }

    #[tokio::test]
    async fn skips_malformed_payloads() {
        let bus = InMemoryBus::new();
        let mut session = Session::open(&bus, params_channel()).await.unwrap();

        bus.send(PARAMS, "not json");
        bus.send(PARAMS, r#"{"an":"object"}"#);
        bus.send(PARAMS, "[]");

        let snapshot = session.next().await.unwrap();
        assert!(snapshot.is_empty());
        assert_eq!(session.dropped(), 2);
        assert_eq!(session.state(), SessionState::Open);
    }

    #[tokio::test]
    async fn cancel_stops_delivery() {
        let bus = InMemoryBus::new();
        let mut session = Session::open(&bus, params_channel()).await.unwrap();

        bus.send(PARAMS, "[]");
        session.cancel();
        session.cancel();

        assert!(session.next().await.is_none());
        assert_eq!(session.state(), SessionState::Cancelled);
    }

    #[tokio::test]
    async fn handle_cancels_waiting_session() {
        let bus = InMemoryBus::new();
        let mut session = Session::open(&bus, params_channel()).await.unwrap();
        let handle = session.handle();

        let task = tokio::spawn(async move {
            let next = session.next().await;
            (next.is_none(), session.state())
        });
        tokio::task::yield_now().await;
        handle.cancel();

        assert_eq!(task.await.unwrap(), (true, SessionState::Cancelled));
        assert_eq!(handle.state(), SessionState::Cancelled);
    }

    #[tokio::test]
    async fn transport_drop_closes_for_good() {
        let bus = InMemoryBus::new();
        let mut session = Session::open(&bus, params_channel()).await.unwrap();

        bus.drop_channel(PARAMS);
        assert!(session.next().await.is_none());
        assert_eq!(session.state(), SessionState::Closed);

        // A new publisher on the same channel does not revive it.
        bus.send(PARAMS, "[]");
        assert!(session.next().await.is_none());
    }

    #[tokio::test]
    async fn update_channel_cannot_be_opened() {
        let bus = InMemoryBus::new();
        let channel = ChannelName::new(ChannelKind::UpdateParam, "x").unwrap();
        assert!(matches!(
            Session::open(&bus, channel).await,
            Err(BusError::Subscribe { .. })
        ));
    }

    #[test]
    fn session_ids_are_unique() {
        assert_ne!(SessionId::new(), SessionId::new());
    }
}
