use std::collections::BTreeSet;

use serde_json::Value;

use crate::storage::StorageRoot;

/// A decoded JSON field value.
#[derive(Debug, Clone, PartialEq)]
pub enum Structured {
    Null,
    Bool(bool),
    Scalar(String),
    Sequence(Vec<Structured>),
    Mapping(Vec<(String, Structured)>),
}

impl Structured {
    /// Try to decode `raw` as a JSON array or object.
    ///
    /// Scalars and invalid JSON yield `None`; callers treat such values as
    /// plain strings.
    pub fn decode(raw: &str) -> Option<Self> {
        match serde_json::from_str::<Value>(raw) {
            Ok(value @ (Value::Array(_) | Value::Object(_))) => Some(value.into()),
            _ => None,
        }
    }

    /// True for containers without elements. Leaves are never empty.
    pub fn is_empty(&self) -> bool {
        match self {
            Structured::Sequence(items) => items.is_empty(),
            Structured::Mapping(entries) => entries.is_empty(),
            _ => false,
        }
    }

    /// Walk every leaf and record those naming an existing file under `root`.
    ///
    /// String leaves that are themselves encoded arrays or objects are decoded
    /// and walked in turn. Mapping keys are not considered.
    pub fn collect_files(&self, root: &StorageRoot, found: &mut BTreeSet<String>) {
        match self {
            Structured::Sequence(items) => {
                for item in items {
                    item.collect_files(root, found);
                }
            }
            Structured::Mapping(entries) => {
                for (_, item) in entries {
                    item.collect_files(root, found);
                }
            }
            Structured::Scalar(s) => {
                if let Some(nested) = Structured::decode(s) {
                    nested.collect_files(root, found);
                } else if let Some(rel) = root.resolve(s) {
                    found.insert(rel);
                }
            }
            Structured::Null | Structured::Bool(_) => {}
        }
    }
}

impl From<Value> for Structured {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Structured::Null,
            Value::Bool(b) => Structured::Bool(b),
            Value::Number(n) => Structured::Scalar(n.to_string()),
            Value::String(s) => Structured::Scalar(s),
            Value::Array(items) => {
                Structured::Sequence(items.into_iter().map(Structured::from).collect())
            }
            Value::Object(map) => Structured::Mapping(
                map.into_iter()
                    .map(|(k, v)| (k, Structured::from(v)))
                    .collect(),
            ),
        }
    }
}
