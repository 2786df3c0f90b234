//! Id-keyed JSON records and the ordered collections holding them.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Record identifier in canonical string form.
///
/// A JSON string id is kept as-is and a JSON number id is rendered in
/// decimal, so `"7"` and `7` name the same record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordId(String);

impl RecordId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Canonicalize a JSON id value. Other JSON kinds carry no id.
    #[must_use]
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(Self(s.clone())),
            Value::Number(n) => Some(Self(n.to_string())),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RecordId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// One JSON object. Only the `id` field has meaning to the broker.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(Map<String, Value>);

impl Record {
    #[must_use]
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Wrap a JSON value, which must be an object.
    #[must_use]
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Self(map)),
            _ => None,
        }
    }

    /// The record id, if present and a string or number.
    #[must_use]
    pub fn id(&self) -> Option<RecordId> {
        self.0.get("id").and_then(RecordId::from_value)
    }

    /// Whether this record carries the given id.
    #[must_use]
    pub fn has_id(&self, id: &RecordId) -> bool {
        self.id().is_some_and(|own| own == *id)
    }

    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// Set a field, returning the previous value.
    pub fn insert(&mut self, field: impl Into<String>, value: Value) -> Option<Value> {
        self.0.insert(field.into(), value)
    }

    #[must_use]
    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

impl From<Map<String, Value>> for Record {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// Ordered records of one entity type.
///
/// Appends keep insertion order, updates replace in place and deletes
/// never reorder the survivors.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Collection(Vec<Record>);

impl Collection {
    #[must_use]
    pub fn new() -> Self {
        Self(Vec::new())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.0.iter()
    }

    /// First record with the given id.
    #[must_use]
    pub fn find(&self, id: &RecordId) -> Option<&Record> {
        self.0.iter().find(|r| r.has_id(id))
    }

    /// Append without any uniqueness check.
    pub fn push(&mut self, record: Record) {
        self.0.push(record);
    }

    /// Remove every record with the given id. Returns how many were removed.
    pub fn remove_by_id(&mut self, id: &RecordId) -> usize {
        let before = self.0.len();
        self.0.retain(|r| !r.has_id(id));
        before - self.0.len()
    }

    /// Replace the first record whose id matches `record`'s id.
    ///
    /// Later records sharing the id are left alone. Returns false when
    /// nothing matched, including when `record` has no id.
    pub fn replace_first(&mut self, record: Record) -> bool {
        let Some(id) = record.id() else {
            return false;
        };
        match self.0.iter_mut().find(|r| r.has_id(&id)) {
            Some(slot) => {
                *slot = record;
                true
            }
            None => false,
        }
    }

    #[must_use]
    pub fn to_value(&self) -> Value {
        Value::Array(self.0.iter().cloned().map(Record::into_value).collect())
    }

    #[must_use]
    pub fn into_records(self) -> Vec<Record> {
        self.0
    }
}

impl From<Vec<Record>> for Collection {
    fn from(records: Vec<Record>) -> Self {
        Self(records)
    }
}

impl FromIterator<Record> for Collection {
    fn from_iter<I: IntoIterator<Item = Record>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Collection {
    type Item = &'a Record;
    type IntoIter = std::slice::Iter<'a, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// The named collections served by the broker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollectionName {
    Students,
    Teachers,
    Admins,
}

impl CollectionName {
    pub const ALL: [Self; 3] = [Self::Students, Self::Teachers, Self::Admins];

    /// Storage name, e.g. `students`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Students => "students",
            Self::Teachers => "teachers",
            Self::Admins => "admins",
        }
    }

    /// Response action carrying the full collection, e.g. `studentsData`.
    #[must_use]
    pub const fn data_action(self) -> &'static str {
        match self {
            Self::Students => "studentsData",
            Self::Teachers => "teachersData",
            Self::Admins => "adminsData",
        }
    }
}

impl fmt::Display for CollectionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CollectionName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|name| name.as_str() == s)
            .ok_or_else(|| format!("unknown collection: {s}"))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn record(value: Value) -> Record {
        Record::from_value(value).unwrap()
    }

    fn names(collection: &Collection) -> Vec<&str> {
        collection
            .iter()
            .map(|r| r.get("name").and_then(Value::as_str).unwrap_or_default())
            .collect()
    }

    #[test]
    fn test_record_id_canonical_forms() {
        assert_eq!(RecordId::from_value(&json!("7")), Some(RecordId::new("7")));
        assert_eq!(RecordId::from_value(&json!(7)), Some(RecordId::new("7")));
        assert_eq!(RecordId::from_value(&json!(null)), None);
        assert_eq!(RecordId::from_value(&json!({"id": 1})), None);
    }

    #[test]
    fn test_record_requires_object() {
        assert!(Record::from_value(json!([1])).is_none());
        assert!(Record::from_value(json!("x")).is_none());
        assert!(record(json!({})).id().is_none());
    }

    #[test]
    fn test_remove_by_id_removes_all_and_keeps_order() {
        let mut c: Collection = vec![
            record(json!({"id": "1", "name": "A"})),
            record(json!({"id": "2", "name": "B"})),
            record(json!({"id": "1", "name": "C"})),
            record(json!({"id": "3", "name": "D"})),
        ]
        .into();

        assert_eq!(c.remove_by_id(&RecordId::new("1")), 2);
        assert_eq!(names(&c), ["B", "D"]);
        assert_eq!(c.remove_by_id(&RecordId::new("missing")), 0);
        assert_eq!(c.len(), 2);
    }

    #[test]
    fn test_remove_by_numeric_id() {
        let mut c: Collection = vec![record(json!({"id": 5})), record(json!({"id": "5"}))].into();
        assert_eq!(c.remove_by_id(&RecordId::new("5")), 2);
        assert!(c.is_empty());
    }

    #[test]
    fn test_replace_first_only() {
        let mut c: Collection = vec![
            record(json!({"id": "1", "name": "A"})),
            record(json!({"id": "1", "name": "B"})),
        ]
        .into();

        assert!(c.replace_first(record(json!({"id": "1", "name": "Z"}))));
        assert_eq!(names(&c), ["Z", "B"]);
    }

    #[test]
    fn test_replace_first_without_match() {
        let mut c: Collection = vec![record(json!({"id": "1", "name": "A"}))].into();
        assert!(!c.replace_first(record(json!({"id": "9", "name": "Z"}))));
        assert!(!c.replace_first(record(json!({"name": "no id"}))));
        assert_eq!(names(&c), ["A"]);
    }

    #[test]
    fn test_collection_serializes_as_array() {
        let c: Collection = vec![record(json!({"id": "1"}))].into();
        assert_eq!(serde_json::to_value(&c).unwrap(), json!([{"id": "1"}]));
        assert_eq!(c.to_value(), json!([{"id": "1"}]));

        let parsed: Collection = serde_json::from_str(r#"[{"id":"2","name":"B"}]"#).unwrap();
        assert_eq!(parsed.find(&RecordId::new("2")).and_then(|r| r.get("name")), Some(&json!("B")));
    }

    #[test]
    fn test_collection_name_round_trip() {
        for name in CollectionName::ALL {
            assert_eq!(name.as_str().parse::<CollectionName>().unwrap(), name);
        }
        assert_eq!(CollectionName::Teachers.data_action(), "teachersData");
        assert!("courses".parse::<CollectionName>().is_err());
    }
}
