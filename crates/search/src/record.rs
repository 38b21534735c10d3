//! Paper record type
//!
//! Records are not schema-fixed: each conference dump carries its own set
//! of fields. A `Record` wraps the raw JSON object and offers typed
//! accessors for the conventional keys.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Conventional field names
pub mod fields {
    pub const ID: &str = "id";
    pub const TITLE: &str = "title";
    pub const STATUS: &str = "status";
    pub const KEYWORDS: &str = "keywords";
    pub const AWARD: &str = "award";
    pub const SOURCE: &str = "source";
    pub const FULL_TEXT: &str = "full_text";
}

/// One paper: field name to JSON value
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(Map<String, Value>);

impl Record {
    pub fn new() -> Self {
        Self(Map::new())
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(field.into(), value.into())
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }

    pub fn id(&self) -> Option<&Value> {
        self.get(fields::ID).filter(|v| !v.is_null())
    }

    pub fn title(&self) -> Option<&str> {
        self.get(fields::TITLE).and_then(Value::as_str)
    }

    pub fn status(&self) -> Option<&str> {
        self.get(fields::STATUS).and_then(Value::as_str)
    }

    /// Conference tag assigned at load time
    pub fn source(&self) -> Option<&str> {
        self.get(fields::SOURCE).and_then(Value::as_str)
    }

    pub fn set_source(&mut self, conference: &str) {
        self.insert(fields::SOURCE, conference);
    }

    /// Text of a field as used for keyword matching.
    ///
    /// Strings verbatim, arrays joined with ", ", other values as JSON text.
    /// Absent and null fields yield `None`.
    pub fn field_text(&self, field: &str) -> Option<String> {
        match self.get(field)? {
            Value::Null => None,
            Value::Array(items) => Some(
                items
                    .iter()
                    .map(value_text)
                    .collect::<Vec<_>>()
                    .join(", "),
            ),
            value => Some(value_text(value)),
        }
    }

    /// Copy of the record restricted to `fields`, in the record's own order
    pub fn project(&self, fields: &[&str]) -> Record {
        Record(
            self.0
                .iter()
                .filter(|(k, _)| fields.contains(&k.as_str()))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        )
    }
}

/// String form of a JSON value: strings verbatim, everything else as JSON text
pub fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

impl From<Map<String, Value>> for Record {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl TryFrom<Value> for Record {
    type Error = Value;

    /// Only JSON objects are records; anything else is handed back
    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(other),
        }
    }
}

impl From<Record> for Value {
    fn from(record: Record) -> Self {
        Value::Object(record.0)
    }
}

#[cfg(test)]
pub(crate) fn record(value: Value) -> Record {
    Record::try_from(value).unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_field_text() {
        let r = record(json!({
            "title": "Graph Agents",
            "keywords": ["agents", "graphs"],
            "award": true,
            "year": 2025,
            "site": null
        }));

        assert_eq!(r.field_text("title").as_deref(), Some("Graph Agents"));
        assert_eq!(r.field_text("keywords").as_deref(), Some("agents, graphs"));
        assert_eq!(r.field_text("award").as_deref(), Some("true"));
        assert_eq!(r.field_text("year").as_deref(), Some("2025"));
        assert_eq!(r.field_text("site"), None);
        assert_eq!(r.field_text("abstract"), None);
    }

    #[test]
    fn test_project_keeps_only_listed_fields() {
        let r = record(json!({ "id": "p1", "title": "T", "authors": "A", "status": "Poster" }));
        let projected = r.project(&["title", "status", "id"]);

        assert_eq!(projected.len(), 3);
        assert!(!projected.contains("authors"));
    }

    #[test]
    fn test_non_object_is_not_a_record() {
        assert!(Record::try_from(json!([1, 2])).is_err());
        assert!(Record::try_from(json!("paper")).is_err());
    }

    #[test]
    fn test_transparent_serde() {
        let r = record(json!({ "id": 1, "title": "Échantillonnage" }));
        assert_eq!(serde_json::to_value(&r).unwrap(), json!({ "id": 1, "title": "Échantillonnage" }));
    }
}
