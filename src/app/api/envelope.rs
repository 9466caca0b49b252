use serde::de::DeserializeOwned;
use serde_json::Value;

use super::ApiError;

/// Unwraps the API Gateway envelope. A string `body` holding a JSON object is
/// the real payload; anything else means the outer value already is.
pub(crate) fn decode_payload(raw: &str) -> Result<Value, ApiError> {
    let outer: Value = serde_json::from_str(raw)
        .map_err(|err| ApiError::Malformed(format!("invalid JSON: {err}")))?;

    if let Some(inner) = outer.get("body").and_then(Value::as_str)
        && let Ok(parsed) = serde_json::from_str::<Value>(inner)
        && parsed.is_object()
    {
        return Ok(parsed);
    }

    Ok(outer)
}

pub(super) fn decode_typed<T: DeserializeOwned>(raw: &str) -> Result<T, ApiError> {
    let payload = decode_payload(raw)?;
    serde_json::from_value(payload)
        .map_err(|err| ApiError::Malformed(format!("unexpected payload shape: {err}")))
}
