// SPDX-License-Identifier: MIT

//! Built-in rule checks over JSON values

use regex::Regex;
use serde_json::Value;

/// Absent, null, empty string, empty array and empty object all count as empty
pub fn is_empty_value(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        Some(Value::Array(items)) => items.is_empty(),
        Some(Value::Object(map)) => map.is_empty(),
        Some(_) => false,
    }
}

/// Quantity compared by `min`/`max`: numbers by value, strings, arrays and
/// objects by length. Other types have no measure.
pub fn measure(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => Some(s.chars().count() as f64),
        Value::Array(items) => Some(items.len() as f64),
        Value::Object(map) => Some(map.len() as f64),
        _ => None,
    }
}

pub fn passes_min(value: &Value, bound: f64) -> bool {
    measure(value).map(|m| m >= bound).unwrap_or(true)
}

pub fn passes_max(value: &Value, bound: f64) -> bool {
    measure(value).map(|m| m <= bound).unwrap_or(true)
}

/// Test a string value against `pattern`. Non-strings pass.
///
/// An uncompilable pattern is logged and passes.
pub fn passes_pattern(value: &Value, pattern: &str) -> bool {
    let Some(text) = value.as_str() else {
        return true;
    };
    match Regex::new(pattern) {
        Ok(re) => re.is_match(text),
        Err(e) => {
            log::warn!("Invalid validation pattern '{}': {}", pattern, e);
            true
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_is_empty_value() {
        assert!(is_empty_value(None));
        assert!(is_empty_value(Some(&json!(null))));
        assert!(is_empty_value(Some(&json!(""))));
        assert!(is_empty_value(Some(&json!("   "))));
        assert!(is_empty_value(Some(&json!([]))));
        assert!(!is_empty_value(Some(&json!(0))));
        assert!(!is_empty_value(Some(&json!(false))));
        assert!(!is_empty_value(Some(&json!("x"))));
    }

    #[test]
    fn test_min_max_numbers() {
        assert!(passes_min(&json!(5), 5.0));
        assert!(!passes_min(&json!(4.9), 5.0));
        assert!(passes_max(&json!(10), 10.0));
        assert!(!passes_max(&json!(11), 10.0));
    }

    #[test]
    fn test_min_max_lengths() {
        assert!(!passes_min(&json!("ab"), 3.0));
        assert!(passes_min(&json!("abc"), 3.0));
        assert!(!passes_max(&json!([1, 2, 3]), 2.0));
    }

    #[test]
    fn test_min_ignores_unmeasurable() {
        assert!(passes_min(&json!(true), 100.0));
        assert!(passes_max(&json!(null), 0.0));
    }

    #[test]
    fn test_pattern() {
        assert!(!passes_pattern(&json!("abc"), "^[A-Z]+$"));
        assert!(passes_pattern(&json!("ABC"), "^[A-Z]+$"));
        assert!(passes_pattern(&json!(42), "^[A-Z]+$"));
    }

    #[test]
    fn test_invalid_pattern_fails_open() {
        assert!(passes_pattern(&json!("abc"), "(unclosed"));
    }
}
