//! Schemaless records.
//!
//! A [`Record`] is one open JSON object inside a collection. The store
//! itself only interprets three fields: a numeric `id` it may assign on
//! insert, and the `created_at`/`updated_at` timestamps it stamps. All
//! other fields belong to the caller and round-trip untouched, including
//! their order and their numeric vs. string typing.

use chrono::Local;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Format used for `created_at`/`updated_at` and other datetime stamps.
pub const STAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Returns the current local time formatted as a stamp string.
#[must_use]
pub fn now_stamp() -> String {
    Local::now().format(STAMP_FORMAT).to_string()
}

/// One schemaless document within a collection.
///
/// Field order is preserved across read/write cycles.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(Map<String, Value>);

impl Record {
    /// Creates an empty record.
    #[must_use]
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Returns a field value, if present.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// Returns a field as a string slice, if present and textual.
    #[must_use]
    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.0.get(field).and_then(Value::as_str)
    }

    /// Returns a field as an unsigned integer, if present and numeric.
    #[must_use]
    pub fn get_u64(&self, field: &str) -> Option<u64> {
        self.0.get(field).and_then(Value::as_u64)
    }

    /// Returns the record's numeric `id`, if assigned.
    #[must_use]
    pub fn id(&self) -> Option<u64> {
        self.get_u64("id")
    }

    /// Sets a field value.
    pub fn set(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(field.into(), value.into());
    }

    /// Returns true if the record has the field with exactly this value.
    #[must_use]
    pub fn matches(&self, field: &str, value: &Value) -> bool {
        self.0.get(field) == Some(value)
    }

    /// Merges a partial record into this one.
    ///
    /// Fields present in `patch` overwrite existing fields; fields absent
    /// from `patch` are left untouched.
    pub fn merge(&mut self, patch: &Record) {
        for (key, value) in &patch.0 {
            self.0.insert(key.clone(), value.clone());
        }
    }

    /// Stamps `created_at` (only if absent) and `updated_at`.
    pub(crate) fn stamp_inserted(&mut self) {
        let now = now_stamp();
        self.0
            .entry("created_at".to_string())
            .or_insert_with(|| Value::String(now.clone()));
        self.0.insert("updated_at".to_string(), Value::String(now));
    }

    /// Refreshes `updated_at`.
    pub(crate) fn stamp_updated(&mut self) {
        self.0
            .insert("updated_at".to_string(), Value::String(now_stamp()));
    }

    /// Returns the underlying field map.
    #[must_use]
    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Consumes the record, returning the underlying field map.
    #[must_use]
    pub fn into_fields(self) -> Map<String, Value> {
        self.0
    }

    /// Number of fields in the record.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the record has no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Map<String, Value>> for Record {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl From<Record> for Value {
    fn from(record: Record) -> Self {
        Value::Object(record.0)
    }
}

impl FromIterator<(String, Value)> for Record {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
