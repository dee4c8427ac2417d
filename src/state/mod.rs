//! State values and the pure transitions applied to them.

mod readonly;

use serde_json::{Map, Value};

pub use readonly::{ReadOnlyList, ReadOnlyState, ReadOnlyValue};

/// Canonical state: an ordered mapping from keys to JSON values.
pub type AtomState = Map<String, Value>;

/// Shallow merge of `partial` over `current`.
///
/// This is the only state transition the container performs. Keys in
/// `partial` replace the whole value under that key; nested objects and
/// arrays are never merged.
pub fn merge_state(current: &AtomState, partial: AtomState) -> AtomState {
    let mut next = current.clone();
    for (key, value) in partial {
        next.insert(key, value);
    }
    next
}

/// Converts anything that serialises to a JSON object into a partial.
///
/// Non-object values yield an empty partial.
pub fn into_partial(value: Value) -> AtomState {
    match value {
        Value::Object(map) => map,
        _ => AtomState::new(),
    }
}

/// String form of a value as markup text.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                i.to_string()
            } else if let Some(u) = n.as_u64() {
                u.to_string()
            } else {
                display_number(n.as_f64().unwrap_or(f64::NAN))
            }
        }
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::Null => String::new(),
                other => display_value(other),
            })
            .collect::<Vec<_>>()
            .join(","),
        Value::Object(_) => "[object Object]".to_string(),
    }
}

/// Number formatting without a trailing `.0` for integral values.
///
/// Magnitudes of `1e21` and above, or below `1e-6`, switch to exponent
/// form with an explicit sign (`1e+21`, `1e-7`).
pub fn display_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        let text = if n > 0.0 { "Infinity" } else { "-Infinity" };
        text.to_string()
    } else if n != 0.0 && (n.abs() >= 1e21 || n.abs() < 1e-6) {
        let text = format!("{n:e}");
        match text.split_once('e') {
            Some((mantissa, exponent)) if !exponent.starts_with('-') => {
                format!("{mantissa}e+{exponent}")
            }
            _ => text,
        }
    } else if n == n.trunc() {
        // -0 renders as 0
        format!("{}", n as i128)
    } else {
        format!("{}", n)
    }
}

/// `false`, `0`, `""` and `null` are falsy; everything else is truthy.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Follows a dotted path through nested objects.
///
/// Numeric segments index into arrays. Returns `None` as soon as a
/// segment is missing.
pub fn resolve_path<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(value, |current, segment| match current {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_merge_replaces_whole_values() {
        let current = into_partial(json!({"a": 1, "nested": {"x": 1, "y": 2}, "list": [1, 2]}));
        let next = merge_state(&current, into_partial(json!({"nested": {"x": 9}, "list": []})));

        assert_eq!(next["a"], json!(1));
        assert_eq!(next["nested"], json!({"x": 9}));
        assert_eq!(next["list"], json!([]));
        assert_eq!(current["list"], json!([1, 2]));
    }

    #[test]
    fn test_merge_keeps_key_order() {
        let current = into_partial(json!({"b": 1, "a": 2}));
        let next = merge_state(&current, into_partial(json!({"c": 3, "b": 4})));
        let keys: Vec<_> = next.keys().cloned().collect();
        assert_eq!(keys, vec!["b", "a", "c"]);
    }

    #[test]
    fn test_display_value_forms() {
        assert_eq!(display_value(&json!(5)), "5");
        assert_eq!(display_value(&json!(5.0)), "5");
        assert_eq!(display_value(&json!(1.5)), "1.5");
        assert_eq!(display_value(&json!(true)), "true");
        assert_eq!(display_value(&json!(null)), "null");
        assert_eq!(display_value(&json!("hi")), "hi");
        assert_eq!(display_value(&json!(["a", null, 2])), "a,,2");
        assert_eq!(display_value(&json!({"k": 1})), "[object Object]");
    }

    #[test]
    fn test_display_number_specials() {
        assert_eq!(display_number(f64::NAN), "NaN");
        assert_eq!(display_number(f64::NEG_INFINITY), "-Infinity");
        assert_eq!(display_number(-0.0), "0");
        assert_eq!(display_number(0.1 + 0.2), "0.30000000000000004");
    }

    #[test]
    fn test_display_number_exponent_form() {
        assert_eq!(display_number(1e21), "1e+21");
        assert_eq!(display_number(-1.5e300), "-1.5e+300");
        assert_eq!(display_number(1e-7), "1e-7");
        assert_eq!(display_number(2.5e-8), "2.5e-8");
        assert_eq!(display_number(1e20), "100000000000000000000");
        assert_eq!(display_number(0.000001), "0.000001");
    }

    #[test]
    fn test_truthiness() {
        for falsy in [json!(false), json!(0), json!(""), json!(null), json!(0.0)] {
            assert!(!is_truthy(&falsy), "{falsy} should be falsy");
        }
        for truthy in [json!(true), json!(-1), json!("0"), json!([]), json!({})] {
            assert!(is_truthy(&truthy), "{truthy} should be truthy");
        }
    }

    #[test]
    fn test_resolve_path() {
        let value = json!({"address": {"city": "Oslo"}, "tags": ["a", "b"]});
        assert_eq!(resolve_path(&value, "address.city"), Some(&json!("Oslo")));
        assert_eq!(resolve_path(&value, "tags.1"), Some(&json!("b")));
        assert_eq!(resolve_path(&value, "address.zip"), None);
        assert_eq!(resolve_path(&json!("x"), "len"), None);
    }
}
