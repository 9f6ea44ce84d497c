//! Snapshots - a wholesale-replacing batch of entries for one group.

use serde::Deserialize;
use serde_json::Value;

use crate::entry::{Entry, Group, ValueType};
use crate::error::{Error, Result};

/// An ordered batch of entries delivered as one message.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    group: Group,
    entries: Vec<Entry>,
}

/// Entry as it may appear on the wire. The HTTP parameter service leaves
/// out `group`; such entries inherit the group of their channel.
#[derive(Deserialize)]
struct WireEntry {
    #[serde(default)]
    group: Option<Group>,
    key: String,
    #[serde(rename = "type")]
    value_type: ValueType,
    #[serde(default)]
    value: Value,
}

impl Snapshot {
    pub fn new(group: Group, entries: Vec<Entry>) -> Self {
        Self { group, entries }
    }

    pub fn empty(group: Group) -> Self {
        Self::new(group, Vec::new())
    }

    /// Decode a payload received on the channel of `group`.
    ///
    /// The payload must be a JSON array of entries. Entries are kept
    /// verbatim; only a missing `group` is filled in. An entry tagged with
    /// the other group keeps its tag but still belongs to this snapshot: it
    /// is listed with `group`'s rows, and a lookup by its own group will not
    /// find it.
    pub fn decode(group: Group, payload: &str) -> Result<Self> {
        let wire: Vec<WireEntry> = serde_json::from_str(payload).map_err(|e| Error::Decode {
            message: e.to_string(),
        })?;

        let entries = wire
            .into_iter()
            .map(|w| Entry {
                group: w.group.unwrap_or(group),
                key: w.key,
                value_type: w.value_type,
                value: w.value,
            })
            .collect();

        Ok(Self { group, entries })
    }

    /// Build a snapshot from a flat JSON object, inferring each type tag.
    ///
    /// This is how a strategy turns its state or parameter struct into
    /// entries: booleans become `Bool`, integral numbers `Int`, other
    /// numbers `Float`, everything else `String`. Non-objects yield an
    /// empty snapshot.
    pub fn from_object(group: Group, object: &Value) -> Self {
        let entries = object
            .as_object()
            .map(|map| {
                map.iter()
                    .map(|(key, value)| {
                        Entry::new(group, key.clone(), infer_type(value), value.clone())
                    })
                    .collect()
            })
            .unwrap_or_default();
        Self { group, entries }
    }

    /// Serialize to the wire form: a JSON array of entries.
    pub fn encode(&self) -> Result<String> {
        encode_entries(&self.entries)
    }

    pub fn group(&self) -> Group {
        self.group
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<Entry> {
        self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Serialize entries as a JSON array, the shape used on every channel.
pub fn encode_entries(entries: &[Entry]) -> Result<String> {
    serde_json::to_string(entries).map_err(|e| Error::Encode {
        message: e.to_string(),
    })
}

fn infer_type(value: &Value) -> ValueType {
    if value.is_boolean() {
        ValueType::Bool
    } else if value.is_f64() {
        ValueType::Float
    } else if value.is_i64() {
        ValueType::Int
    } else {
        ValueType::String
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decode_array_of_entries() {
        let payload = r#"[{"group":"params","key":"state","type":"String","value":"Stopped"}]"#;
        let snapshot = Snapshot::decode(Group::Param, payload).unwrap();
        assert_eq!(snapshot.group(), Group::Param);
        assert_eq!(snapshot.len(), 1);
        assert_eq!(
            snapshot.entries()[0],
            Entry::param("state", ValueType::String, json!("Stopped"))
        );
    }

    #[test]
    fn decode_keeps_order() {
        let payload = r#"[
            {"group":"states","key":"b","type":"Int","value":2},
            {"group":"states","key":"a","type":"Int","value":1}
        ]"#;
        let snapshot = Snapshot::decode(Group::State, payload).unwrap();
        let keys: Vec<_> = snapshot.entries().iter().map(|e| e.key.as_str()).collect();
        assert_eq!(keys, vec!["b", "a"]);
    }

    #[test]
    fn decode_fills_missing_group() {
        let payload = r#"[{"key":"spread","type":"Float","value":0.5}]"#;
        let snapshot = Snapshot::decode(Group::Param, payload).unwrap();
        assert_eq!(snapshot.entries()[0].group, Group::Param);
    }

    #[test]
    fn decode_keeps_foreign_group() {
        let payload = r#"[{"group":"params","key":"size","type":"Int","value":1}]"#;
        let snapshot = Snapshot::decode(Group::State, payload).unwrap();
        assert_eq!(snapshot.group(), Group::State);
        assert_eq!(snapshot.entries()[0].group, Group::Param);
    }

    #[test]
    fn decode_empty_array() {
        let snapshot = Snapshot::decode(Group::State, "[]").unwrap();
        assert!(snapshot.is_empty());
    }

    #[test]
    fn decode_rejects_malformed() {
        for payload in ["", "{", "{}", r#"[{"key":1}]"#, "null", r#"[{"type":"Int"}]"#] {
            assert!(
                matches!(Snapshot::decode(Group::State, payload), Err(Error::Decode { .. })),
                "{payload:?} should not decode"
            );
        }
    }

    #[test]
    fn encode_single_entry_array() {
        let snapshot = Snapshot::new(
            Group::Param,
            vec![Entry::param("state", ValueType::String, json!("Live"))],
        );
        assert_eq!(
            snapshot.encode().unwrap(),
            r#"[{"group":"params","key":"state","type":"String","value":"Live"}]"#
        );
    }

    #[test]
    fn from_object_infers_types() {
        let object = json!({
            "enabled": true,
            "size": 3,
            "spread": 0.25,
            "state": "Live",
            "levels": [1, 2]
        });
        let snapshot = Snapshot::from_object(Group::Param, &object);
        let mut types: Vec<_> = snapshot
            .entries()
            .iter()
            .map(|e| (e.key.as_str(), e.value_type.clone()))
            .collect();
        types.sort_by(|a, b| a.0.cmp(b.0));
        assert_eq!(
            types,
            vec![
                ("enabled", ValueType::Bool),
                ("levels", ValueType::String),
                ("size", ValueType::Int),
                ("spread", ValueType::Float),
                ("state", ValueType::String),
            ]
        );
        assert!(snapshot.entries().iter().all(|e| e.group == Group::Param));
    }

    #[test]
    fn from_object_non_object_is_empty() {
        assert!(Snapshot::from_object(Group::State, &json!([1, 2])).is_empty());
    }
}
