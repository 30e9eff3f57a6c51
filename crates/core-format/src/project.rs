//! Field projection: builds a narrowed object from `returned_fields`.
//!
//! Ported from `RunReturnedFieldsAndFormat`'s field-selection `switch` in
//! `examples/original_source/internal/logs/pipeline/pipeline.go` — wildcard
//! patterns (`*X*`, `*X`, `X*`) match key substrings/suffixes/prefixes
//! against the top-level object; a bare dotted path walks nested objects and
//! preserves their shape in the result.

use serde_json::{Map, Value};

/// Project `parsed` down to the fields named in `fields`. An empty `fields`
/// list is the identity projection (handled by the caller, which skips
/// calling this at all — see spec.md §8's "projection with `returned_fields
/// = []` equals full-object formatting" law).
pub fn project(parsed: &Map<String, Value>, fields: &[String]) -> Map<String, Value> {
    let mut result = Map::new();
    for field in fields {
        let field = field.trim();
        if field.is_empty() {
            continue;
        }
        if field.len() > 1 && field.starts_with('*') && field.ends_with('*') {
            let middle = &field[1..field.len() - 1];
            for (key, value) in parsed {
                if key.contains(middle) {
                    result.insert(key.clone(), value.clone());
                }
            }
        } else if let Some(suffix) = field.strip_prefix('*') {
            for (key, value) in parsed {
                if key.ends_with(suffix) {
                    result.insert(key.clone(), value.clone());
                }
            }
        } else if let Some(prefix) = field.strip_suffix('*') {
            for (key, value) in parsed {
                if key.starts_with(prefix) {
                    result.insert(key.clone(), value.clone());
                }
            }
        } else {
            let parts: Vec<&str> = field.split('.').collect();
            add_to_result(parsed, &parts, 0, &mut result);
        }
    }
    result
}

/// Walks `current` following `parts[index..]`, mirroring nested objects into
/// `result` as it goes, and assigns the leaf value if the full path exists.
fn add_to_result(
    current: &Map<String, Value>,
    parts: &[&str],
    index: usize,
    result: &mut Map<String, Value>,
) {
    if index == parts.len() - 1 {
        if let Some(value) = current.get(parts[index]) {
            result.insert(parts[index].to_string(), value.clone());
        }
        return;
    }
    if let Some(Value::Object(next)) = current.get(parts[index]) {
        let entry = result
            .entry(parts[index].to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if let Value::Object(nested) = entry {
            add_to_result(next, parts, index + 1, nested);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn obj(v: Value) -> Map<String, Value> {
        match v {
            Value::Object(m) => m,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn selects_named_top_level_fields() {
        let parsed = obj(json!({"level": "info", "msg": "hi", "n": 3}));
        let projected = project(&parsed, &["msg".into(), "n".into()]);
        assert_eq!(projected.len(), 2);
        assert_eq!(projected.get("msg"), Some(&json!("hi")));
        assert_eq!(projected.get("n"), Some(&json!(3)));
        assert!(!projected.contains_key("level"));
    }

    #[test]
    fn prefix_wildcard_matches_keys_starting_with() {
        let parsed = obj(json!({"req_id": "A", "req_path": "/x", "res_code": 200}));
        let projected = project(&parsed, &["req_*".into()]);
        assert_eq!(projected.len(), 2);
        assert!(projected.contains_key("req_id"));
        assert!(projected.contains_key("req_path"));
        assert!(!projected.contains_key("res_code"));
    }

    #[test]
    fn suffix_wildcard_matches_keys_ending_with() {
        let parsed = obj(json!({"start_time": 1, "end_time": 2, "other": 3}));
        let projected = project(&parsed, &["*_time".into()]);
        assert_eq!(projected.len(), 2);
        assert!(projected.contains_key("start_time"));
        assert!(projected.contains_key("end_time"));
    }

    #[test]
    fn infix_wildcard_matches_keys_containing() {
        let parsed = obj(json!({"http_status": 1, "status_code": 2, "other": 3}));
        let projected = project(&parsed, &["*status*".into()]);
        assert_eq!(projected.len(), 2);
    }

    #[test]
    fn dotted_path_preserves_nested_shape() {
        let parsed = obj(json!({"req": {"id": "A", "path": "/x"}, "res": {"code": 200}}));
        let projected = project(&parsed, &["req.id".into()]);
        assert_eq!(projected, obj(json!({"req": {"id": "A"}})));
    }

    #[test]
    fn missing_path_is_silently_dropped() {
        let parsed = obj(json!({"a": 1}));
        let projected = project(&parsed, &["b.c".into()]);
        assert!(projected.is_empty());
    }
}
