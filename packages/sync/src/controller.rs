//! Target selection.
//!
//! The [`TargetController`] is either unselected or selected on one
//! target. Selecting a target opens one bus for its host and two sessions,
//! one for states and one for params, each drained by a pump task into the
//! shared store.
//!
//! Switching is strictly ordered: the old sessions are cancelled and their
//! pumps awaited before the store starts a new generation and the new
//! sessions open. Together with the generation check on every write, this
//! keeps the previous target's rows out of the new target's view.

use std::sync::Arc;

use lambda_view_bus::Connector;
use lambda_view_core::{ChannelName, Entry, Group, RowId, Target};
use serde_json::Value;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::SyncConfig;
use crate::error::{EditError, Result};
use crate::gateway::{Ack, EditGateway};
use crate::session::{Session, SessionHandle, SessionState};
use crate::store::{Generation, SharedStore};

struct Active {
    target: Target,
    gateway: EditGateway,
    sessions: Vec<SessionHandle>,
    pumps: Vec<JoinHandle<()>>,
}

/// Owns the current target, its connection and its sessions.
pub struct TargetController {
    connector: Arc<dyn Connector>,
    store: SharedStore,
    active: Option<Active>,
}

impl TargetController {
    pub fn new(connector: Arc<dyn Connector>) -> Self {
        Self {
            connector,
            store: SharedStore::new(),
            active: None,
        }
    }

    /// A controller that connects with [`SyncConfig::connector`].
    pub fn with_config(config: &SyncConfig) -> Self {
        Self::new(Arc::new(config.connector()))
    }

    /// The selected target, if any.
    pub fn target(&self) -> Option<&Target> {
        self.active.as_ref().map(|a| &a.target)
    }

    pub fn store(&self) -> &SharedStore {
        &self.store
    }

    /// Current rows: states, then params.
    pub fn rows(&self) -> Vec<Entry> {
        self.store.rows()
    }

    /// Notified after every store change.
    pub fn changes(&self) -> watch::Receiver<u64> {
        self.store.changes()
    }

    /// State of each live session, states first.
    pub fn session_states(&self) -> Vec<(ChannelName, SessionState)> {
        self.active
            .iter()
            .flat_map(|a| &a.sessions)
            .map(|h| (h.channel().clone(), h.state()))
            .collect()
    }

    /// Switch to `target`, or to nothing.
    ///
    /// Returns once the previous target is fully detached and, when a new
    /// target is given, both of its sessions are subscribed. A target with
    /// an empty instance counts as nothing. On error the controller is left
    /// unselected with an empty store.
    pub async fn select(&mut self, target: Option<Target>) -> Result<()> {
        self.teardown().await;
        let generation = self.store.begin_generation();

        let target = match target {
            Some(target) if target.is_selected() => target,
            _ => {
                debug!("target cleared");
                return Ok(());
            }
        };

        let channels = target.channels()?;
        let bus = self.connector.connect(&target.host).await?;
        let states = Session::open(bus.as_ref(), channels.states.clone()).await?;
        // Dropping `states` on error closes its subscription.
        let params = Session::open(bus.as_ref(), channels.params.clone()).await?;

        let sessions = vec![states.handle(), params.handle()];
        let pumps = vec![
            spawn_pump(states, self.store.clone(), generation),
            spawn_pump(params, self.store.clone(), generation),
        ];
        info!(selected = %target, generation = generation.get(), "target selected");

        self.active = Some(Active {
            target,
            gateway: EditGateway::new(bus, channels),
            sessions,
            pumps,
        });
        Ok(())
    }

    /// Return to unselected.
    pub async fn clear(&mut self) {
        // Selecting nothing cannot fail.
        let _ = self.select(None).await;
    }

    /// Edit the parameter `key` of the selected target.
    pub async fn submit_edit(&self, key: &str, raw: &str) -> std::result::Result<Ack, EditError> {
        let (gateway, entry) = self.editable(key)?;
        gateway.submit(&entry, raw).await
    }

    /// Like [`submit_edit`](Self::submit_edit) for a JSON value.
    pub async fn submit_edit_json(
        &self,
        key: &str,
        raw: &Value,
    ) -> std::result::Result<Ack, EditError> {
        let (gateway, entry) = self.editable(key)?;
        gateway.submit_json(&entry, raw).await
    }

    /// Start or stop the selected strategy.
    pub async fn set_running(&self, running: bool) -> std::result::Result<Ack, EditError> {
        let active = self.active.as_ref().ok_or(EditError::NoTarget)?;
        active.gateway.set_running(running).await
    }

    fn editable(&self, key: &str) -> std::result::Result<(&EditGateway, Entry), EditError> {
        let active = self.active.as_ref().ok_or(EditError::NoTarget)?;
        if let Some(entry) = self.store.find(&RowId::new(Group::Param, key)) {
            return Ok((&active.gateway, entry));
        }
        if self.store.find(&RowId::new(Group::State, key)).is_some() {
            return Err(EditError::NotEditable {
                row: RowId::new(Group::State, key),
            });
        }
        Err(EditError::NotFound {
            key: key.to_string(),
        })
    }

    async fn teardown(&mut self) {
        let Some(active) = self.active.take() else {
            return;
        };
        for session in &active.sessions {
            session.cancel();
        }
        for pump in active.pumps {
            if let Err(e) = pump.await {
                warn!(error = %e, "session pump failed");
            }
        }
        debug!(selected = %active.target, "target detached");
    }
}

impl Drop for TargetController {
    fn drop(&mut self) {
        if let Some(active) = self.active.take() {
            for session in &active.sessions {
                session.cancel();
            }
            for pump in &active.pumps {
                pump.abort();
            }
        }
    }
}

fn spawn_pump(mut session: Session, store: SharedStore, generation: Generation) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(snapshot) = session.next().await {
            store.replace_if_current(generation, snapshot);
        }
        debug!(session = %session.id(), state = ?session.state(), "session pump finished");
    })
}

