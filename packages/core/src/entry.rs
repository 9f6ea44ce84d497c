//! Entries - one reported state fact or one strategy parameter.
//!
//! An entry is what a strategy puts on the wire:
//!
//! ```json
//! { "group": "params", "key": "state", "type": "String", "value": "Stopped" }
//! ```
//!
//! The `value` is kept as the raw JSON primitive the strategy sent. Its shape
//! is only checked against `type` when an operator edits the entry (see
//! [`crate::codec`]); ingested snapshots are trusted verbatim.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::codec::TypedValue;

/// Which snapshot an entry belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Group {
    /// Reported strategy state. Read-only.
    #[serde(rename = "states")]
    State,
    /// Strategy parameters. Editable.
    #[serde(rename = "params")]
    Param,
}

impl Group {
    /// Wire name of the group.
    pub fn as_str(&self) -> &'static str {
        match self {
            Group::State => "states",
            Group::Param => "params",
        }
    }

    /// Only parameters accept edits.
    pub fn is_editable(&self) -> bool {
        matches!(self, Group::Param)
    }
}

impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Runtime type tag of an entry.
///
/// Unrecognized tags survive ingestion as `Unknown` so the row still shows
/// up; editing such a row fails with `UnknownType`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ValueType {
    String,
    Int,
    Float,
    Bool,
    Unknown(String),
}

impl ValueType {
    /// Wire name of the type tag.
    pub fn as_str(&self) -> &str {
        match self {
            ValueType::String => "String",
            ValueType::Int => "Int",
            ValueType::Float => "Float",
            ValueType::Bool => "Bool",
            ValueType::Unknown(name) => name,
        }
    }

    /// Whether the value codec can coerce edits for this type.
    pub fn is_known(&self) -> bool {
        !matches!(self, ValueType::Unknown(_))
    }
}

impl From<String> for ValueType {
    fn from(name: String) -> Self {
        match name.as_str() {
            "String" => ValueType::String,
            "Int" => ValueType::Int,
            "Float" => ValueType::Float,
            "Bool" => ValueType::Bool,
            _ => ValueType::Unknown(name),
        }
    }
}

impl From<ValueType> for String {
    fn from(value_type: ValueType) -> Self {
        match value_type {
            ValueType::Unknown(name) => name,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One state or parameter fact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub group: Group,
    pub key: String,
    #[serde(rename = "type")]
    pub value_type: ValueType,
    pub value: Value,
}

impl Entry {
    pub fn new(group: Group, key: impl Into<String>, value_type: ValueType, value: Value) -> Self {
        Self {
            group,
            key: key.into(),
            value_type,
            value,
        }
    }

    /// A reported state entry.
    pub fn state(key: impl Into<String>, value_type: ValueType, value: Value) -> Self {
        Self::new(Group::State, key, value_type, value)
    }

    /// A parameter entry.
    pub fn param(key: impl Into<String>, value_type: ValueType, value: Value) -> Self {
        Self::new(Group::Param, key, value_type, value)
    }

    /// Identity of this entry within the merged row model.
    pub fn row_id(&self) -> RowId {
        RowId::new(self.group, self.key.clone())
    }

    /// Copy of this entry carrying a coerced edit value.
    pub fn with_value(&self, value: &TypedValue) -> Self {
        Self {
            group: self.group,
            key: self.key.clone(),
            value_type: self.value_type.clone(),
            value: value.to_json(),
        }
    }
}

/// Row identity: the group plus the key.
///
/// A state and a parameter may share a key. Keying rows by `(group, key)`
/// keeps them distinct.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RowId {
    pub group: Group,
    pub key: String,
}

impl RowId {
    pub fn new(group: Group, key: impl Into<String>) -> Self {
        Self {
            group,
            key: key.into(),
        }
    }
}

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.group, self.key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn group_wire_names() {
        assert_eq!(serde_json::to_value(Group::State).unwrap(), json!("states"));
        assert_eq!(serde_json::to_value(Group::Param).unwrap(), json!("params"));
        assert_eq!(
            serde_json::from_value::<Group>(json!("params")).unwrap(),
            Group::Param
        );
    }

    #[test]
    fn group_editability() {
        assert!(Group::Param.is_editable());
        assert!(!Group::State.is_editable());
    }

    #[test]
    fn value_type_known_tags() {
        for name in ["String", "Int", "Float", "Bool"] {
            let ty: ValueType = serde_json::from_value(json!(name)).unwrap();
            assert!(ty.is_known());
            assert_eq!(ty.as_str(), name);
        }
    }

    #[test]
    fn value_type_unknown_tag_survives() {
        let ty: ValueType = serde_json::from_value(json!("Decimal")).unwrap();
        assert_eq!(ty, ValueType::Unknown("Decimal".to_string()));
        assert!(!ty.is_known());
        assert_eq!(serde_json::to_value(&ty).unwrap(), json!("Decimal"));
    }

    #[test]
    fn value_type_is_case_sensitive() {
        let ty: ValueType = serde_json::from_value(json!("int")).unwrap();
        assert_eq!(ty, ValueType::Unknown("int".to_string()));
    }

    #[test]
    fn entry_wire_shape() {
        let entry = Entry::param("state", ValueType::String, json!("Stopped"));
        let text = serde_json::to_string(&entry).unwrap();
        assert_eq!(
            text,
            r#"{"group":"params","key":"state","type":"String","value":"Stopped"}"#
        );
    }

    #[test]
    fn entry_mismatched_value_is_trusted() {
        // Shape is not checked at ingestion.
        let entry: Entry = serde_json::from_value(json!({
            "group": "states",
            "key": "position",
            "type": "Int",
            "value": "not a number"
        }))
        .unwrap();
        assert_eq!(entry.value, json!("not a number"));
        assert_eq!(entry.value_type, ValueType::Int);
    }

    #[test]
    fn with_value_keeps_identity() {
        let entry = Entry::param("spread", ValueType::Float, json!(0.5));
        let edited = entry.with_value(&TypedValue::Float(0.75));
        assert_eq!(edited.row_id(), entry.row_id());
        assert_eq!(edited.value, json!(0.75));
        assert_eq!(edited.value_type, ValueType::Float);
    }

    #[test]
    fn row_id_display() {
        let id = RowId::new(Group::Param, "state");
        assert_eq!(id.to_string(), "params/state");
        assert_ne!(id, RowId::new(Group::State, "state"));
    }
}
