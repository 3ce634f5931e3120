//! Blank and null coalescing helpers shared by every builder

use serde::Serialize;
use serde_json::Value;

/// Returns `None` for missing, empty or whitespace-only strings.
pub fn or_none_if_blank<S: AsRef<str>>(value: Option<S>) -> Option<S> {
    value.filter(|s| !s.as_ref().trim().is_empty())
}

/// Owned copy of `value` unless it is blank.
pub(crate) fn non_blank(value: &str) -> Option<String> {
    or_none_if_blank(Some(value)).map(str::to_string)
}

/// Serializes `value` into JSON, returning `None` for missing values,
/// JSON `null` and blank strings.
///
/// Serialization failures are treated like missing input.
pub fn to_json_data_or_none<T: Serialize>(value: Option<T>) -> Option<Value> {
    let value = serde_json::to_value(value?).ok()?;
    match &value {
        Value::Null => None,
        Value::String(s) if s.trim().is_empty() => None,
        _ => Some(value),
    }
}

/// Keeps only non-blank strings, in order.
pub(crate) fn non_blank_strings<I, S>(values: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    values
        .into_iter()
        .filter_map(|s| non_blank(s.as_ref()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_or_none_if_blank() {
        assert_eq!(or_none_if_blank(Some("a")), Some("a"));
        assert_eq!(or_none_if_blank(Some(" x ")), Some(" x "));
        assert_eq!(or_none_if_blank(Some("")), None);
        assert_eq!(or_none_if_blank(Some("  \t")), None);
        assert_eq!(or_none_if_blank::<&str>(None), None);
        assert_eq!(
            or_none_if_blank(Some("owned".to_string())),
            Some("owned".to_string())
        );
    }

    #[test]
    fn test_to_json_data_or_none() {
        assert_eq!(to_json_data_or_none(Some(5)), Some(json!(5)));
        assert_eq!(to_json_data_or_none(Some("now-1d")), Some(json!("now-1d")));
        assert_eq!(to_json_data_or_none(Some("")), None);
        assert_eq!(to_json_data_or_none(Some(" ")), None);
        assert_eq!(to_json_data_or_none::<i32>(None), None);
        assert_eq!(to_json_data_or_none(Some(Value::Null)), None);
        assert_eq!(
            to_json_data_or_none(Some(json!({"lat": 1.0, "lon": 2.0}))),
            Some(json!({"lat": 1.0, "lon": 2.0}))
        );
    }

    #[test]
    fn test_non_blank_strings() {
        assert_eq!(
            non_blank_strings(["a", "", " ", "b"]),
            vec!["a".to_string(), "b".to_string()]
        );
    }
}
