//! Pincode format check.

use serde_json::Value;

pub const PINCODE_LEN: usize = 6;

/// True iff `raw`, after trimming, is exactly six ASCII digits with a
/// non-zero first digit.
pub fn validate(raw: &str) -> bool {
    let s = raw.trim();
    let bytes = s.as_bytes();
    bytes.len() == PINCODE_LEN
        && bytes[0] != b'0'
        && bytes.iter().all(|b| b.is_ascii_digit())
}

/// Coerce a loosely typed value (as found in request bodies) to the string
/// form the validator expects. Strings pass through, non-negative integers
/// are rendered in decimal, everything else is not coercible.
pub fn coerce(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => n.as_u64().map(|v| v.to_string()),
        _ => None,
    }
}

/// Validate a loosely typed value. Non-coercible input is invalid.
pub fn validate_value(value: &Value) -> bool {
    coerce(value).is_some_and(|s| validate(&s))
}
