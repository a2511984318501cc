//! Conversion between typed views and raw store records.

use crate::error::{CoreError, CoreResult};
use gearbase_store::{Record, StoreError};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

/// Collection names used by the core.
pub(crate) mod collections {
    pub const ASSETS: &str = "assets";
    pub const TRANSACTIONS: &str = "transactions";
    pub const RESERVATIONS: &str = "reservations";
    pub const AUDIT_LOG: &str = "audit_log";
    pub const MAINTENANCE_ISSUES: &str = "maintenance_issues";
}

/// Serializes a typed view into a raw record.
pub(crate) fn to_record<T: Serialize>(collection: &str, value: &T) -> CoreResult<Record> {
    match serde_json::to_value(value) {
        Ok(Value::Object(map)) => Ok(Record::from(map)),
        Ok(_) => Err(CoreError::from(StoreError::corrupt(
            collection,
            "typed view did not serialize to an object",
        ))),
        Err(e) => Err(CoreError::from(StoreError::corrupt(collection, e.to_string()))),
    }
}

/// Deserializes a raw record into a typed view.
///
/// A stored record that no longer matches the collection's shape is
/// treated as data corruption, not caller error.
pub(crate) fn from_record<T: DeserializeOwned>(collection: &str, record: Record) -> CoreResult<T> {
    serde_json::from_value(Value::Object(record.into_fields()))
        .map_err(|e| CoreError::from(StoreError::corrupt(collection, e.to_string())))
}

/// Generates a prefixed business key, e.g. `TXN-9F2C41AB`.
pub(crate) fn short_key(prefix: &str) -> String {
    let hex = Uuid::new_v4().simple().to_string().to_uppercase();
    format!("{prefix}-{}", &hex[..8])
}
