//! The snapshot store.
//!
//! Two buffers, one per group, each overwritten wholesale by the latest
//! snapshot of its group. Rows are read as states followed by params.
//!
//! [`SharedStore`] adds what concurrent sessions need: a mutex, a change
//! counter consumers can await, and a generation number. Every target
//! switch starts a new generation, and a write tagged with an older one is
//! discarded, so a late delivery from a previous target can never show up
//! among the new target's rows.

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use lambda_view_core::{Entry, Group, RowId, Snapshot};
use tokio::sync::watch;
use tracing::{debug, warn};

/// Latest snapshot per group.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SnapshotStore {
    states: Vec<Entry>,
    params: Vec<Entry>,
    /// Keys last reported as present in both groups.
    ambiguous: Vec<String>,
}

impl SnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite the buffer of the snapshot's group.
    pub fn replace(&mut self, snapshot: Snapshot) {
        let group = snapshot.group();
        let entries = snapshot.into_entries();
        match group {
            Group::State => self.states = entries,
            Group::Param => self.params = entries,
        }

        // Report only when the set changes.
        let ambiguous = self.ambiguous_keys();
        if ambiguous != self.ambiguous {
            if ambiguous.is_empty() {
                debug!("no keys present in both states and params");
            } else {
                warn!(?ambiguous, "keys present in both states and params");
            }
            self.ambiguous = ambiguous;
        }
    }

    /// All rows: states first, then params, each in delivery order.
    pub fn rows(&self) -> Vec<Entry> {
        self.states.iter().chain(&self.params).cloned().collect()
    }

    pub fn group(&self, group: Group) -> &[Entry] {
        match group {
            Group::State => &self.states,
            Group::Param => &self.params,
        }
    }

    pub fn clear(&mut self) {
        self.states.clear();
        self.params.clear();
        self.ambiguous.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty() && self.params.is_empty()
    }

    /// Look a row up by group and key.
    pub fn find(&self, id: &RowId) -> Option<&Entry> {
        self.group(id.group).iter().find(|e| e.key == id.key)
    }

    /// Keys that appear in both groups, sorted.
    pub fn ambiguous_keys(&self) -> Vec<String> {
        let states: BTreeSet<&str> = self.states.iter().map(|e| e.key.as_str()).collect();
        self.params
            .iter()
            .map(|e| e.key.as_str())
            .filter(|key| states.contains(key))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .map(str::to_string)
            .collect()
    }
}

/// A store generation. Each target selection gets a fresh one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Generation(u64);

impl Generation {
    pub fn get(&self) -> u64 {
        self.0
    }
}

struct Guarded {
    store: SnapshotStore,
    generation: Generation,
}

/// A cloneable, thread-safe [`SnapshotStore`] with generations.
#[derive(Clone)]
pub struct SharedStore {
    inner: Arc<Mutex<Guarded>>,
    version: Arc<watch::Sender<u64>>,
}

impl Default for SharedStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SharedStore {
    pub fn new() -> Self {
        let (version, _) = watch::channel(0);
        Self {
            inner: Arc::new(Mutex::new(Guarded {
                store: SnapshotStore::new(),
                generation: Generation(0),
            })),
            version: Arc::new(version),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Guarded> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn bump(&self) {
        self.version.send_modify(|v| *v += 1);
    }

    pub fn generation(&self) -> Generation {
        self.lock().generation
    }

    /// Clear both buffers and invalidate every earlier generation.
    pub fn begin_generation(&self) -> Generation {
        let generation = {
            let mut guard = self.lock();
            guard.store.clear();
            guard.generation = Generation(guard.generation.0 + 1);
            guard.generation
        };
        debug!(generation = generation.0, "store generation started");
        self.bump();
        generation
    }

    /// Apply `snapshot` if `generation` is still current.
    ///
    /// Returns `false` when the write was discarded.
    pub fn replace_if_current(&self, generation: Generation, snapshot: Snapshot) -> bool {
        {
            let mut guard = self.lock();
            if guard.generation != generation {
                debug!(
                    stale = generation.0,
                    current = guard.generation.0,
                    "discarding snapshot from stale generation"
                );
                return false;
            }
            guard.store.replace(snapshot);
        }
        self.bump();
        true
    }

    pub fn rows(&self) -> Vec<Entry> {
        self.lock().store.rows()
    }

    pub fn find(&self, id: &RowId) -> Option<Entry> {
        self.lock().store.find(id).cloned()
    }

    pub fn ambiguous_keys(&self) -> Vec<String> {
        self.lock().store.ambiguous_keys()
    }

    /// A copy of the current contents.
    pub fn snapshot(&self) -> SnapshotStore {
        self.lock().store.clone()
    }

    /// Receiver that is notified after every change.
    pub fn changes(&self) -> watch::Receiver<u64> {
        self.version.subscribe()
    }
}

impl std::fmt::Debug for SharedStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let guard = self.lock();
        f.debug_struct("SharedStore")
            .field("generation", &guard.generation.0)
            .field("store", &guard.store)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lambda_view_core::ValueType;
    use serde_json::json;

    fn states(keys: &[&str]) -> Snapshot {
        Snapshot::new(
            Group::State,
            keys.iter()
                .map(|k| Entry::state(*k, ValueType::Float, json!(1.5)))
                .collect(),
        )
    }

    fn params(keys: &[&str]) -> Snapshot {
        Snapshot::new(
            Group::Param,
            keys.iter()
                .map(|k| Entry::param(*k, ValueType::Int, json!(1)))
                .collect(),
        )
    }

    fn keys(rows: &[Entry]) -> Vec<&str> {
        rows.iter().map(|e| e.key.as_str()).collect()
    }

    #[test]
    fn rows_are_states_then_params() {
        let mut store = SnapshotStore::new();
        store.replace(params(&["size", "spread"]));
        store.replace(states(&["pnl"]));
        assert_eq!(keys(&store.rows()), vec!["pnl", "size", "spread"]);
    }

    #[test]
    fn replace_overwrites_only_its_group() {
        let mut store = SnapshotStore::new();
        store.replace(states(&["pnl", "position"]));
        store.replace(params(&["size"]));
        store.replace(params(&["spread"]));
        assert_eq!(keys(&store.rows()), vec!["pnl", "position", "spread"]);
    }

    #[test]
    fn replacing_with_same_content_is_idempotent() {
        let mut store = SnapshotStore::new();
        store.replace(states(&["pnl", "position"]));
        store.replace(params(&["size", "spread"]));
        let before = store.rows();

        store.replace(params(&["size", "spread"]));
        assert_eq!(store.rows(), before);
    }

    #[test]
    fn empty_snapshot_empties_group() {
        let mut store = SnapshotStore::new();
        store.replace(params(&["size"]));
        store.replace(Snapshot::empty(Group::Param));
        assert!(store.is_empty());
    }

    #[test]
    fn find_uses_group_and_key() {
        let mut store = SnapshotStore::new();
        store.replace(states(&["state"]));
        store.replace(params(&["state"]));

        let param = store.find(&RowId::new(Group::Param, "state")).unwrap();
        assert_eq!(param.group, Group::Param);
        let state = store.find(&RowId::new(Group::State, "state")).unwrap();
        assert_eq!(state.group, Group::State);
        assert!(store.find(&RowId::new(Group::Param, "missing")).is_none());
    }

    #[test]
    fn foreign_group_entry_stays_in_its_snapshot() {
        let mut store = SnapshotStore::new();
        store.replace(Snapshot::new(
            Group::State,
            vec![Entry::param("size", ValueType::Int, json!(1))],
        ));

        assert_eq!(store.group(Group::State).len(), 1);
        assert_eq!(store.rows()[0].group, Group::Param);
        assert!(store.find(&RowId::new(Group::Param, "size")).is_none());
    }

    #[test]
    fn reports_ambiguous_keys() {
        let mut store = SnapshotStore::new();
        store.replace(states(&["state", "pnl"]));
        store.replace(params(&["size", "state"]));
        assert_eq!(store.ambiguous_keys(), vec!["state".to_string()]);
    }

    #[test]
    fn ambiguity_is_tracked_across_replaces() {
        let mut store = SnapshotStore::new();
        store.replace(states(&["state"]));
        store.replace(params(&["state"]));
        assert_eq!(store.ambiguous, vec!["state".to_string()]);

        // Same collision again: nothing new to report.
        let before = store.clone();
        store.replace(params(&["state"]));
        assert_eq!(store, before);

        store.replace(params(&["size"]));
        assert!(store.ambiguous.is_empty());

        store.replace(params(&["state"]));
        store.clear();
        assert!(store.ambiguous.is_empty());
    }

    #[test]
    fn clear_empties_both_groups() {
        let mut store = SnapshotStore::new();
        store.replace(states(&["pnl"]));
        store.replace(params(&["size"]));
        store.clear();
        assert!(store.rows().is_empty());
    }

    #[test]
    fn stale_generation_is_discarded() {
        let shared = SharedStore::new();
        let first = shared.begin_generation();
        assert!(shared.replace_if_current(first, params(&["old"])));

        let second = shared.begin_generation();
        assert!(shared.rows().is_empty());
        assert!(!shared.replace_if_current(first, params(&["late"])));
        assert!(shared.rows().is_empty());

        assert!(shared.replace_if_current(second, params(&["new"])));
        assert_eq!(keys(&shared.rows()), vec!["new"]);
        assert!(second > first);
    }

    #[tokio::test]
    async fn changes_are_observable() {
        let shared = SharedStore::new();
        let mut changes = shared.changes();
        let generation = shared.begin_generation();
        changes.changed().await.unwrap();

        shared.replace_if_current(generation, states(&["pnl"]));
        changes.changed().await.unwrap();
        assert_eq!(keys(&shared.rows()), vec!["pnl"]);
        assert_eq!(shared.snapshot().group(Group::State).len(), 1);
    }
}
