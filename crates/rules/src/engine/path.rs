//! Resolution of the JSONPath subset used in rule leaves.
//!
//! Rule paths address values at document level (`$.devices[*].osVersion`),
//! but the evaluator always works on one entity at a time. [`simplify`]
//! rewrites a document-level path into the intra-entity remainder, and
//! [`resolve`] fetches the value it names.

use serde_json::Value;

/// Rewrite a document-level path for use against a single entity.
///
/// Strips a leading `$.`, then drops the first segment when it carries a
/// bracket expression: that segment names the entity collection, which has
/// already been extracted.
pub fn simplify(path: &str) -> &str {
    let path = path.strip_prefix("$.").unwrap_or(path);

    match path.split_once('.') {
        Some((first, rest)) if first.contains('[') => rest,
        _ => path,
    }
}

/// Fetch the value at `path` inside `entity`.
///
/// Segments are dot-separated field names; a segment of the shape
/// `name[N]` descends into the field `name` and then indexes into the
/// sequence at `N`. Anything that does not resolve yields `Null`, the
/// sentinel for "absent".
pub fn resolve(entity: &Value, path: &str) -> Value {
    if path.is_empty() {
        return Value::Null;
    }

    let mut current = entity;
    for part in path.split('.') {
        if let Some((field, index_part)) = part.split_once('[') {
            let Some(index) = index_part
                .strip_suffix(']')
                .and_then(|i| i.parse::<usize>().ok())
            else {
                return Value::Null;
            };
            let Some(element) = current.get(field).and_then(|v| v.get(index)) else {
                return Value::Null;
            };
            current = element;
        } else {
            let Some(next) = current.as_object().and_then(|map| map.get(part)) else {
                return Value::Null;
            };
            current = next;
        }
    }

    current.clone()
}

/// Extract the entity list from an input document.
///
/// Tries the pluralised key first, then the entity type verbatim; returns
/// the first value that is a list, or an empty list.
pub fn extract_entities(data: &Value, entity_type: &str) -> Vec<Value> {
    let plural = format!("{entity_type}s");

    for key in [plural.as_str(), entity_type] {
        if let Some(list) = data.get(key).and_then(Value::as_array) {
            return list.clone();
        }
    }

    Vec::new()
}
