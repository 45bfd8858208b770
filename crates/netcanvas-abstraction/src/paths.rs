//! Dot-path access into serialized entities.
//!
//! Field updates address nested values with dot-separated keys such as
//! `hardware.firmware.version`. Paths are resolved against the camelCase
//! JSON form of an entity.

use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Proposed field updates keyed by dot-path.
pub type UpdateMap = BTreeMap<String, Value>;

/// Splits a dot-path into its non-empty segments.
pub fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('.').map(str::trim).filter(|s| !s.is_empty())
}

/// Returns the value stored at `path`, walking nested objects.
#[must_use]
pub fn get_path<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    segments(path).try_fold(value, |current, key| current.as_object()?.get(key))
}

/// Returns the value at `path`, or `Value::Null` when any segment is missing.
#[must_use]
pub fn get_path_or_null(value: &Value, path: &str) -> Value {
    get_path(value, path).cloned().unwrap_or(Value::Null)
}

/// Sets `path` to `new_value`, creating intermediate objects as needed.
///
/// A non-object value sitting on an intermediate segment is replaced by an
/// empty object.
pub fn set_path(target: &mut Value, path: &str, new_value: Value) {
    let keys: Vec<&str> = segments(path).collect();
    let Some((last, parents)) = keys.split_last() else {
        return;
    };

    let mut current = target;
    for key in parents {
        let map = ensure_object(current);
        current = map.entry((*key).to_string()).or_insert_with(|| Value::Object(Map::new()));
    }
    ensure_object(current).insert((*last).to_string(), new_value);
}

fn ensure_object(value: &mut Value) -> &mut Map<String, Value> {
    if !value.is_object() {
        *value = Value::Object(Map::new());
    }
    match value {
        Value::Object(map) => map,
        _ => unreachable!("value was just replaced with an object"),
    }
}

/// Returns a copy of `entity` with every update applied.
///
/// The input is left untouched.
#[must_use]
pub fn apply_nested_updates(entity: &Value, updates: &UpdateMap) -> Value {
    let mut next = entity.clone();
    for (path, value) in updates {
        set_path(&mut next, path, value.clone());
    }
    next
}
