//! Record identifiers and helpers for raw records.
//!
//! Records travel through the engine as untyped JSON objects. The only field
//! the engine ever inspects is `id`.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// A record as returned by the transport: a JSON object carrying an `id`.
pub type Record = Value;

/// Identifier of a remote record.
///
/// Backends hand out either integers or strings, so both are accepted and
/// kept distinct (`1` and `"1"` are different ids).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    Int(i64),
    Str(String),
}

impl RecordId {
    /// Reads an id out of a JSON scalar. Anything other than an integer or a
    /// string is rejected.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n.as_i64().map(RecordId::Int),
            Value::String(s) => Some(RecordId::Str(s.clone())),
            _ => None,
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            RecordId::Int(n) => Value::from(*n),
            RecordId::Str(s) => Value::from(s.as_str()),
        }
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordId::Int(n) => write!(f, "{n}"),
            RecordId::Str(s) => f.write_str(s),
        }
    }
}

impl From<i64> for RecordId {
    fn from(n: i64) -> Self {
        RecordId::Int(n)
    }
}

impl From<i32> for RecordId {
    fn from(n: i32) -> Self {
        RecordId::Int(n.into())
    }
}

impl From<&str> for RecordId {
    fn from(s: &str) -> Self {
        RecordId::Str(s.to_string())
    }
}

impl From<String> for RecordId {
    fn from(s: String) -> Self {
        RecordId::Str(s)
    }
}

/// Extracts the `id` field of a record, if it has a usable one.
pub fn record_id(record: &Record) -> Option<RecordId> {
    record.get("id").and_then(RecordId::from_value)
}
