//! Conversion between models and store rows.

use datakit_db::Row;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use training_data_sdk::{DataError, ErrorKind};

fn internal(entity: &str, action: &str, detail: &str) -> DataError {
    tracing::error!(entity, action, detail, "record mapping failed");
    DataError::new(ErrorKind::Unknown, ErrorKind::Unknown.default_message())
}

/// # Errors
/// `unknown` if the value does not serialize to a JSON object.
pub fn to_row<T: Serialize>(entity: &str, value: &T) -> Result<Row, DataError> {
    match serde_json::to_value(value) {
        Ok(Value::Object(row)) => Ok(row),
        Ok(_) => Err(internal(entity, "encode", "not an object")),
        Err(e) => Err(internal(entity, "encode", &e.to_string())),
    }
}

/// # Errors
/// `unknown` if the stored row does not match the model.
pub fn from_row<T: DeserializeOwned>(entity: &str, row: Row) -> Result<T, DataError> {
    serde_json::from_value(Value::Object(row)).map_err(|e| internal(entity, "decode", &e.to_string()))
}

/// Non-null fields of a patch as a change set.
///
/// # Errors
/// `unknown` if the patch does not serialize to a JSON object.
pub fn changes_row<T: Serialize>(entity: &str, patch: &T) -> Result<Row, DataError> {
    let mut row = to_row(entity, patch)?;
    row.retain(|_, v| !v.is_null());
    Ok(row)
}
