//! Per-field validation of proposed device updates.

use netcanvas_abstraction::{paths::segments, DeviceStatus, DeviceType, UpdateMap};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::tools::status_names;
use crate::validation::{is_valid_ipv4, is_valid_mac, is_valid_vlan};

/// Outcome of validating an update map.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub valid: bool,
    /// One message per offending dot-path.
    pub errors: BTreeMap<String, String>,
}

impl ValidationResult {
    fn from_errors(errors: BTreeMap<String, String>) -> Self {
        Self { valid: errors.is_empty(), errors }
    }
}

/// Validates every update independently.
///
/// Keys address the serialized device (`ip`, `hardware.firmware.version`).
/// Paths that overlap another path in the same map are rejected so that the
/// recorded diff always matches the applied result.
pub fn validate(updates: &UpdateMap) -> ValidationResult {
    let mut errors = BTreeMap::new();

    for (path, value) in updates {
        if let Err(message) = check_path_shape(path, updates) {
            errors.insert(path.clone(), message);
            continue;
        }
        let keys: Vec<&str> = segments(path).collect();
        check_field(path, &keys, value, &mut errors);
    }

    ValidationResult::from_errors(errors)
}

fn check_path_shape(path: &str, updates: &UpdateMap) -> Result<(), String> {
    if path.split('.').any(|s| s.trim().is_empty() || s != s.trim()) {
        return Err("malformed field path".to_string());
    }
    let prefix = format!("{}.", path);
    if let Some(child) = updates.keys().find(|k| k.starts_with(&prefix)) {
        return Err(format!("overlaps with '{}'", child));
    }
    Ok(())
}

fn insert(errors: &mut BTreeMap<String, String>, path: &str, message: impl Into<String>) {
    errors.entry(path.to_string()).or_insert_with(|| message.into());
}

fn check_field(path: &str, keys: &[&str], value: &Value, errors: &mut BTreeMap<String, String>) {
    let Some((field, rest)) = keys.split_first() else {
        insert(errors, path, "malformed field path");
        return;
    };

    if *field == "hardware" {
        check_hardware(path, rest, value, errors);
        return;
    }
    if !rest.is_empty() {
        insert(errors, path, format!("'{}' has no nested fields", field));
        return;
    }

    let problem = match *field {
        "name" => match value.as_str() {
            Some(s) if !s.trim().is_empty() => None,
            _ => Some("name must be a non-blank string".to_string()),
        },
        "ip" => match value {
            Value::Null => None,
            Value::String(s) if is_valid_ipv4(s) => None,
            _ => Some("must be an IPv4 address like 192.168.1.10".to_string()),
        },
        "mac" => match value {
            Value::Null => None,
            Value::String(s) if is_valid_mac(s) => None,
            _ => Some("must be a MAC address like 00:1a:2b:3c:4d:5e".to_string()),
        },
        "status" => match serde_json::from_value::<DeviceStatus>(value.clone()) {
            Ok(_) => None,
            Err(_) => Some(format!("status must be one of: {}", status_names().join(", "))),
        },
        "type" => match value.as_str() {
            Some(s) if DeviceType::ALL.iter().any(|t| t.as_str() == s) => None,
            _ => Some(format!("unknown device type {}", value)),
        },
        "floor" => match value {
            Value::Null => None,
            Value::Number(n) if n.as_u64().is_some_and(|f| f >= 1 && u32::try_from(f).is_ok()) => None,
            _ => Some("floor must be a positive integer".to_string()),
        },
        "vlans" => match value.as_array() {
            Some(items) if items.iter().all(|v| v.as_i64().is_some_and(is_valid_vlan)) => None,
            _ => Some("vlans must be a list of VLAN ids between 1 and 4094".to_string()),
        },
        "buildingId" | "notes" => match value {
            Value::Null | Value::String(_) => None,
            _ => Some(format!("{} must be a string", field)),
        },
        "id" => Some("device ids cannot be changed".to_string()),
        other => Some(format!("unknown field '{}'", other)),
    };

    if let Some(message) = problem {
        insert(errors, path, message);
    }
}

/// Hardware updates may be nested objects or dot-paths; every leaf must be a
/// string (or null to clear it).
fn check_hardware(path: &str, rel: &[&str], value: &Value, errors: &mut BTreeMap<String, String>) {
    match rel {
        [] | ["firmware"] => match value {
            Value::Null => {}
            Value::Object(map) => {
                for (key, child) in map {
                    let child_rel: Vec<&str> = rel.iter().copied().chain(std::iter::once(key.as_str())).collect();
                    check_hardware(&format!("{}.{}", path, key), &child_rel, child, errors);
                }
            }
            _ => insert(errors, path, "must be an object"),
        },
        [_] | ["firmware", _] => {
            if !matches!(value, Value::Null | Value::String(_)) {
                insert(errors, path, "hardware fields must be strings");
            }
        }
        _ => insert(errors, path, "not an updatable hardware field"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn updates(pairs: Value) -> UpdateMap {
        serde_json::from_value(pairs).unwrap()
    }

    #[test]
    fn test_valid_updates() {
        let result = validate(&updates(json!({
            "name": "Core Switch",
            "ip": "10.1.0.1",
            "mac": "00-1a-2b-3c-4d-5e",
            "status": "maintenance",
            "type": "core_switch",
            "floor": 3,
            "vlans": [10, 20],
            "notes": null,
            "hardware.firmware.version": "2.1",
        })));
        assert!(result.valid, "{:?}", result.errors);
        assert!(result.errors.is_empty());
    }

    #[test]
    fn test_each_bad_field_gets_its_own_error() {
        let result = validate(&updates(json!({
            "name": "  ",
            "ip": "10.1.0.256",
            "mac": "001a2b3c4d5e",
            "status": "broken",
            "type": "toaster",
            "floor": 0,
            "vlans": [0, 10],
            "colour": "red",
        })));
        assert!(!result.valid);
        assert_eq!(result.errors.len(), 8);
        assert!(result.errors["status"].contains("online"));
        assert!(result.errors["colour"].contains("unknown field"));
    }

    #[test]
    fn test_type_accepts_only_canonical_names() {
        assert!(validate(&updates(json!({ "type": "ap" }))).valid);
        for alias in ["access_point", "core", "Router"] {
            let result = validate(&updates(json!({ "type": alias })));
            assert!(result.errors["type"].contains("unknown device type"), "{}", alias);
        }
    }

    #[test]
    fn test_floor_rejects_non_integers() {
        for bad in [json!(1.5), json!("2"), json!(-1)] {
            let result = validate(&updates(json!({ "floor": bad })));
            assert!(!result.valid);
        }
    }

    #[test]
    fn test_hardware_leaves_must_be_strings() {
        let nested = validate(&updates(json!({
            "hardware": {"vendor": "Acme", "firmware": {"version": 2}}
        })));
        assert_eq!(nested.errors.get("hardware.firmware.version").map(String::as_str), Some("hardware fields must be strings"));

        let dotted = validate(&updates(json!({ "hardware.serialNumber": 1234 })));
        assert!(dotted.errors.contains_key("hardware.serialNumber"));

        let firmware_scalar = validate(&updates(json!({ "hardware.firmware": "2.1" })));
        assert_eq!(firmware_scalar.errors["hardware.firmware"], "must be an object");

        let too_deep = validate(&updates(json!({ "hardware.firmware.version.major": "2" })));
        assert!(!too_deep.valid);
    }

    #[test]
    fn test_nested_path_under_scalar_rejected() {
        let result = validate(&updates(json!({ "ip.address": "10.0.0.1" })));
        assert!(result.errors["ip.address"].contains("no nested fields"));
    }

    #[test]
    fn test_overlapping_paths_rejected() {
        let result = validate(&updates(json!({
            "hardware": {"vendor": "Acme"},
            "hardware.firmware.version": "2.1",
        })));
        assert!(result.errors["hardware"].contains("overlaps"));
        assert!(!result.errors.contains_key("hardware.firmware.version"));
    }

    #[test]
    fn test_malformed_path() {
        let result = validate(&updates(json!({ "hardware..vendor": "Acme" })));
        assert_eq!(result.errors["hardware..vendor"], "malformed field path");
    }

    #[test]
    fn test_empty_updates_are_valid() {
        assert!(validate(&UpdateMap::new()).valid);
    }
}
