//! Value normalization helpers used by wallet event and request patches.

use serde_json::Value;

/// Normalizes a chain id to `0x`-prefixed lowercase hex.
///
/// Decimal strings and numbers are converted. Values already in `0x` form
/// and values that cannot be parsed yield `None`, so a transform built on
/// this helper leaves them untouched.
pub fn to_hex_chain_id(value: &Value) -> Option<Value> {
    let id = match value {
        Value::String(s) => {
            let s = s.trim();
            if s.starts_with("0x") || s.starts_with("0X") {
                return None;
            }
            s.parse::<u64>().ok()?
        }
        Value::Number(n) => n.as_u64()?,
        _ => return None,
    };
    Some(Value::String(format!("{id:#x}")))
}

/// Like [`to_hex_chain_id`], but hands back the original value when it is
/// left untouched.
pub fn normalize_chain_id(value: Value) -> Value {
    to_hex_chain_id(&value).unwrap_or(value)
}
