//! Normalisation of bookmark responses.
//!
//! The server answers list endpoints either with a bare JSON array or with
//! an `{"items": [...], "total": n}` envelope. Both decode to a plain vector.
//! Single records must be JSON objects; serde would otherwise accept an
//! array as a positional struct.

use serde::de::DeserializeOwned;
use serde_json::Value;

use markdex_core::{Bookmark, MarkdexError, MarkdexResult};

/// Decode a list body: bare array first, then envelope, else `MalformedResponse`.
/// A `null` array or `null` items field yields an empty vector.
pub fn decode_bookmark_list(body: &str) -> MarkdexResult<Vec<Bookmark>> {
    let value: Value =
        serde_json::from_str(body).map_err(|e| MarkdexError::MalformedResponse(e.to_string()))?;
    bookmark_list_from_value(value)
}

pub fn bookmark_list_from_value(value: Value) -> MarkdexResult<Vec<Bookmark>> {
    match value {
        Value::Null => Ok(Vec::new()),
        Value::Array(items) => decode_items(items),
        Value::Object(mut envelope) => match envelope.remove("items") {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(Value::Array(items)) => decode_items(items),
            Some(other) => Err(MarkdexError::MalformedResponse(format!(
                "items: expected array, got {}",
                json_kind(&other)
            ))),
        },
        other => Err(MarkdexError::MalformedResponse(format!(
            "expected array or object, got {}",
            json_kind(&other)
        ))),
    }
}

/// Decode one record, rejecting anything that is not a JSON object.
pub fn decode_object<T: DeserializeOwned>(value: Value) -> MarkdexResult<T> {
    if !value.is_object() {
        return Err(MarkdexError::MalformedResponse(format!(
            "expected object, got {}",
            json_kind(&value)
        )));
    }
    serde_json::from_value(value)
        .map_err(|e| MarkdexError::MalformedResponse(format!("failed to decode response: {e}")))
}

fn decode_items(items: Vec<Value>) -> MarkdexResult<Vec<Bookmark>> {
    items.into_iter().map(decode_object).collect()
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
