//! Trigger condition evaluation.
//!
//! Decides whether a payload satisfies a mapping's `trigger_value`. Sensors
//! publish anything from bare values (`1`, `open`) to JSON objects such as
//! Advantech's `{"Val": 1}`, so several interpretations are tried in order.
//! A payload that fits none of them simply does not trigger.

use serde_json::{Map, Value};

/// Object keys consulted, in order, when the payload is a JSON object.
const VALUE_KEYS: [&str; 6] = ["Val", "value", "val", "state", "status", "data"];

/// Returns true if `payload` satisfies `trigger_value`.
///
/// 1. An empty trigger value fires on anything.
/// 2. The trimmed payload equals the trigger value.
/// 3. JSON: a scalar compares its string form; an object compares the first
///    present key of [`VALUE_KEYS`], or else any of its values.
/// 4. Both parse as floats and are equal.
pub fn should_trigger(payload: &str, trigger_value: &str) -> bool {
    if trigger_value.is_empty() {
        return true;
    }

    let trimmed = payload.trim();
    if trimmed == trigger_value {
        return true;
    }

    if let Ok(value) = serde_json::from_str::<Value>(payload) {
        if let Some(decided) = match_json(&value, trigger_value) {
            return decided;
        }
    }

    match (trimmed.parse::<f64>(), trigger_value.trim().parse::<f64>()) {
        (Ok(payload_num), Ok(trigger_num)) => payload_num == trigger_num,
        _ => false,
    }
}

/// `Some(result)` when the JSON shape decides the outcome, `None` to fall through.
fn match_json(value: &Value, trigger_value: &str) -> Option<bool> {
    match value {
        Value::String(_) | Value::Number(_) | Value::Bool(_) => {
            Some(stringify(value) == trigger_value)
        }
        Value::Object(fields) => match_object(fields, trigger_value),
        Value::Null | Value::Array(_) => None,
    }
}

fn match_object(fields: &Map<String, Value>, trigger_value: &str) -> Option<bool> {
    if let Some(value) = VALUE_KEYS.iter().find_map(|key| fields.get(*key)) {
        return Some(stringify(value) == trigger_value);
    }

    if fields.values().any(|value| stringify(value) == trigger_value) {
        return Some(true);
    }
    None
}

/// String form of a JSON value as sensor configs spell it.
///
/// Strings are unquoted, booleans are `True`/`False` and null is `None`;
/// numbers, arrays and objects use compact JSON text.
fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Bool(true) => "True".to_string(),
        Value::Bool(false) => "False".to_string(),
        Value::Null => "None".to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_trigger_fires_on_anything() {
        assert!(should_trigger("abc", ""));
        assert!(should_trigger("", ""));
        assert!(should_trigger("{not json", ""));
    }

    #[test]
    fn test_plain_string_match() {
        assert!(should_trigger("open", "open"));
        assert!(should_trigger("  open\n", "open"));
        assert!(!should_trigger("opened", "open"));
    }

    #[test]
    fn test_json_scalars() {
        assert!(should_trigger("\"open\"", "open"));
        assert!(should_trigger("1", "1"));
        assert!(should_trigger("1.5", "1.5"));
        assert!(!should_trigger("\"closed\"", "open"));
    }

    #[test]
    fn test_booleans_and_null_spelling() {
        assert!(should_trigger("true", "True"));
        assert!(should_trigger(" false ", "False"));
        assert!(should_trigger(r#"{"Val": true}"#, "True"));
        assert!(!should_trigger(r#"{"Val": true}"#, "true"));
        assert!(should_trigger(r#"{"state": false}"#, "False"));
        assert!(should_trigger(r#"{"foo": null}"#, "None"));
        assert!(should_trigger(r#"{"Val": null}"#, "None"));
        // A bare payload still matches itself textually.
        assert!(should_trigger("true", "true"));
    }

    #[test]
    fn test_json_scalar_decides_without_numeric_fallback() {
        // 1.0 stringifies to "1.0", which settles the comparison.
        assert!(!should_trigger("1.0", "1"));
    }

    #[test]
    fn test_val_field_first() {
        assert!(should_trigger(r#"{"Val": 1}"#, "1"));
        assert!(!should_trigger(r#"{"Val": 0}"#, "1"));
        // "Val" wins even when another key would match.
        assert!(!should_trigger(r#"{"Val": 0, "value": 1}"#, "1"));
    }

    #[test]
    fn test_common_keys_in_order() {
        assert!(should_trigger(r#"{"value": "on"}"#, "on"));
        assert!(should_trigger(r#"{"state": "on", "ts": 17}"#, "on"));
        assert!(!should_trigger(r#"{"status": "off", "data": "on"}"#, "on"));
        assert!(should_trigger(r#"{"data": 42}"#, "42"));
    }

    #[test]
    fn test_any_value_fallback() {
        assert!(should_trigger(r#"{"foo": 1}"#, "1"));
        assert!(should_trigger(r#"{"a": "x", "b": "hit"}"#, "hit"));
        assert!(!should_trigger(r#"{"a": "x", "b": "y"}"#, "hit"));
        assert!(should_trigger(r#"{"nested": {"k": 1}}"#, r#"{"k":1}"#));
    }

    #[test]
    fn test_numeric_fallback() {
        assert!(should_trigger("+1", "1"));
        assert!(should_trigger("01", "1.0"));
        assert!(should_trigger("inf", "infinity"));
        assert!(should_trigger(" 2.50 ", "2.5"));
        assert!(should_trigger("[1]", "[1]"));
        assert!(!should_trigger("[1]", "1"));
        assert!(!should_trigger("null", "0"));
    }

    #[test]
    fn test_unparseable_is_no_match() {
        assert!(!should_trigger("{broken", "1"));
        assert!(!should_trigger("abc", "1"));
        assert!(!should_trigger("1", "abc"));
    }
}
