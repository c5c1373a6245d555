//! Shape checks for remote payloads.
//!
//! Remote documents are untyped JSON; these tell "a real payload" apart from
//! "no payload" before anything tries to unpack it.

use serde_json::Value;

/// True for a keyed mapping. Lists, `null`, and scalars (including date strings) are not records.
#[must_use]
pub fn is_plain_record(value: &Value) -> bool {
    matches!(value, Value::Object(_))
}

/// True for an ordered sequence.
#[must_use]
pub fn is_plain_list(value: &Value) -> bool {
    matches!(value, Value::Array(_))
}
