use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Campaign mapping label used for classification.
pub const NEW_MAPPING: &str = "New_mapping";
/// Precomputed top-level group; wins over the classification table when set.
pub const TOP_LEVEL_GROUP: &str = "Top_Level_Group";
/// Precomputed second-level group; wins over the classification table when set.
pub const SUB_GROUP: &str = "Sub_Group";

/// Which comparison window a row belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Period {
    Current,
    Prior,
}

/// One raw campaign record: field name to JSON value, in source column order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CampaignRow(Map<String, Value>);

impl CampaignRow {
    pub fn new() -> Self {
        Self(Map::new())
    }

    pub fn insert(&mut self, field: impl Into<String>, value: Value) {
        self.0.insert(field.into(), value);
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// Numeric value of a field; strings and other non-numbers yield `None`.
    pub fn number(&self, field: &str) -> Option<f64> {
        self.0.get(field).and_then(Value::as_f64)
    }

    /// Field as a string if it holds a non-empty string.
    pub fn text(&self, field: &str) -> Option<&str> {
        match self.0.get(field) {
            Some(Value::String(s)) if !s.is_empty() => Some(s.as_str()),
            _ => None,
        }
    }

    /// Field rendered as a grouping label. Null, `false`, zero and the empty
    /// string all count as "no value".
    pub fn label(&self, field: &str) -> Option<String> {
        match self.0.get(field)? {
            Value::Null | Value::Bool(false) => None,
            Value::Bool(true) => Some("true".to_string()),
            Value::String(s) if s.is_empty() => None,
            Value::String(s) => Some(s.clone()),
            Value::Number(n) if n.as_f64() == Some(0.0) => None,
            Value::Number(n) => Some(n.to_string()),
            other => Some(other.to_string()),
        }
    }
}

impl From<Map<String, Value>> for CampaignRow {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}
