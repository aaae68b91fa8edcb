use serde_json::Value;
use uuid::Uuid;

/// Distinguishes a field left out of a PATCH body from one explicitly set to null.
#[derive(Debug, PartialEq)]
pub enum NullableValue {
    Omitted,
    Null,
    String(String),
}

pub fn classify_nullable(optional_value: Option<&Value>) -> Result<NullableValue, String> {
    match optional_value {
        None => Ok(NullableValue::Omitted),
        Some(Value::Null) => Ok(NullableValue::Null),
        Some(Value::String(s)) => Ok(NullableValue::String(s.to_owned())),
        Some(other) => Err(format!("expected string or null, got {other}")),
    }
}

/// Like [`classify_nullable`] but parses the string form as a UUID.
pub fn classify_nullable_uuid(
    field: &str,
    optional_value: Option<&Value>,
) -> Result<Option<Option<Uuid>>, String> {
    match classify_nullable(optional_value)? {
        NullableValue::Omitted => Ok(None),
        NullableValue::Null => Ok(Some(None)),
        NullableValue::String(raw) if raw.trim().is_empty() => Ok(Some(None)),
        NullableValue::String(raw) => Uuid::parse_str(raw.trim())
            .map(|id| Some(Some(id)))
            .map_err(|_| format!("{field} must be a valid UUID")),
    }
}
