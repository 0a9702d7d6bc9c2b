//! Domain models returned by the storage backends, plus the lookups that do
//! not depend on which backend is active.

pub mod authinfos;
pub mod computers;
pub mod logs;
pub mod settings;
pub mod users;
pub mod workflows;

use serde_json::Value;

use crate::error::BackendError;

/// Decode a JSON text column. An empty string is treated as `{}`.
pub(crate) fn parse_json(raw: &str, table: &str, id: i32) -> Result<Value, BackendError> {
    if raw.trim().is_empty() {
        return Ok(Value::Object(Default::default()));
    }
    serde_json::from_str(raw)
        .map_err(|e| BackendError::db(format!("Invalid JSON stored in {table} row {id}: {e}")))
}
