use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

use super::error::RowError;

/// Typed attribute value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    String(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Date(DateTime<Utc>),
    List(Vec<Value>),
}

impl Value {
    pub fn text(value: &str) -> Self {
        Value::String(value.to_string())
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Value::String(s) => s.is_empty(),
            Value::List(items) => items.is_empty(),
            _ => false,
        }
    }

    /// Unambiguous, type-tagged text used for content addressing.
    /// Strings are length-prefixed so no two distinct values share an encoding.
    pub fn canonical(&self) -> String {
        match self {
            Value::String(s) => format!("s{}:{}", s.len(), s),
            Value::Integer(i) => format!("i:{}", i),
            Value::Float(f) => format!("f:{:e}", f),
            Value::Boolean(b) => format!("b:{}", b),
            Value::Date(d) => format!("d:{}", d.to_rfc3339_opts(SecondsFormat::Millis, true)),
            Value::List(items) => {
                let inner: Vec<String> = items.iter().map(Value::canonical).collect();
                format!("l{}[{}]", items.len(), inner.join(","))
            }
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::String(s) => write!(f, "{}", s),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Date(d) => write!(f, "{}", d.to_rfc3339_opts(SecondsFormat::Secs, true)),
            Value::List(items) => {
                let parts: Vec<String> = items.iter().map(|v| v.to_string()).collect();
                write!(f, "{}", parts.join(", "))
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Entity,
    Relationship,
}

/// Computed keys of a relationship's two ends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Endpoints {
    pub from: String,
    pub to: String,
}

/// An entity or relationship produced from one row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BuiltRecord {
    pub representation_id: String,
    pub row_index: usize,
    pub computed_key: String,
    pub kind: RecordKind,
    /// Entity type or relationship type
    pub target_type: String,
    pub attributes: BTreeMap<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoints: Option<Endpoints>,
}

impl BuiltRecord {
    pub fn attribute(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }

    pub fn is_relationship(&self) -> bool {
        self.kind == RecordKind::Relationship
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowOutcome {
    pub row_index: usize,
    pub produced_records: Vec<BuiltRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RowError>,
}

impl RowOutcome {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// A distinct computed key across the batch and the rows that produced it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogicalRecord {
    pub computed_key: String,
    /// First record built with this key
    pub record: BuiltRecord,
    pub contributing_rows: Vec<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub total_rows: usize,
    pub succeeded_rows: usize,
    pub failed_rows: usize,
    pub unique_records: usize,
    pub cancelled: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchResult {
    pub outcomes: Vec<RowOutcome>,
    pub records: Vec<LogicalRecord>,
    pub summary: BatchSummary,
}

impl BatchResult {
    pub fn failed_outcomes(&self) -> impl Iterator<Item = &RowOutcome> {
        self.outcomes.iter().filter(|o| !o.is_success())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_canonical_is_type_tagged() {
        assert_ne!(Value::text("1").canonical(), Value::Integer(1).canonical());
        assert_ne!(Value::text("true").canonical(), Value::Boolean(true).canonical());
        // A separator inside a string cannot forge a list boundary.
        let joined = Value::List(vec![Value::text("a,s1:b")]);
        let split = Value::List(vec![Value::text("a"), Value::text("b")]);
        assert_ne!(joined.canonical(), split.canonical());
    }

    #[test]
    fn test_value_serializes_untagged() {
        let date = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
        let list = Value::List(vec![Value::text("a"), Value::Integer(2), Value::Date(date)]);
        let json = serde_json::to_string(&list).unwrap();
        assert_eq!(json, r#"["a",2,"2024-01-02T00:00:00Z"]"#);
        assert_eq!(list.to_string(), "a, 2, 2024-01-02T00:00:00Z");
    }
}
