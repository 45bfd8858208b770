//! Before/after diffs of proposed field updates.

use netcanvas_abstraction::{get_path_or_null, Device, TopologySnapshot, UpdateMap};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;

/// The stored and proposed value of one field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldChange {
    pub old: Value,
    pub new: Value,
}

impl FieldChange {
    /// Whether applying the update would alter the stored value.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.old == self.new
    }
}

/// One device touched by a proposal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AffectedDevice {
    pub id: String,
    pub name: String,
    pub changes: BTreeMap<String, FieldChange>,
}

/// Devices named by a proposal that are not in the snapshot.
///
/// Devices that were found are still diffed so the caller can show them.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("Unknown device ids: {}", missing.join(", "))]
pub struct UnknownDevices {
    pub missing: Vec<String>,
    pub resolved: Vec<AffectedDevice>,
}

fn device_value(device: &Device) -> Value {
    serde_json::to_value(device).unwrap_or(Value::Null)
}

/// Pairs each update with the value currently stored at its path.
pub fn diff_device(device: &Device, updates: &UpdateMap) -> AffectedDevice {
    let current = device_value(device);
    let changes = updates
        .iter()
        .map(|(path, new)| (path.clone(), FieldChange { old: get_path_or_null(&current, path), new: new.clone() }))
        .collect();
    AffectedDevice { id: device.id.clone(), name: device.name.clone(), changes }
}

/// Diffs `updates` against every device in `device_ids`.
///
/// Repeated ids are diffed once, in first-seen order. Any id missing from the
/// snapshot turns the whole result into [`UnknownDevices`].
pub fn build_diff(
    device_ids: &[String],
    updates: &UpdateMap,
    snapshot: &TopologySnapshot,
) -> Result<Vec<AffectedDevice>, UnknownDevices> {
    let mut resolved: Vec<AffectedDevice> = Vec::new();
    let mut missing: Vec<String> = Vec::new();

    for id in device_ids {
        if resolved.iter().any(|a| &a.id == id) || missing.contains(id) {
            continue;
        }
        match snapshot.device(id) {
            Some(device) => resolved.push(diff_device(device, updates)),
            None => missing.push(id.clone()),
        }
    }

    if missing.is_empty() { Ok(resolved) } else { Err(UnknownDevices { missing, resolved }) }
}

/// Re-derives field changes from a pre-image and a post-image.
pub fn derive_changes<'a, I>(pre: &Value, post: &Value, paths: I) -> BTreeMap<String, FieldChange>
where
    I: IntoIterator<Item = &'a String>,
{
    paths
        .into_iter()
        .map(|path| {
            (path.clone(), FieldChange { old: get_path_or_null(pre, path), new: get_path_or_null(post, path) })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use netcanvas_abstraction::{apply_nested_updates, DeviceType, FirmwareInfo, HardwareInfo};
    use serde_json::json;

    fn switch() -> Device {
        let mut d = Device::new("sw1", "SW-1", DeviceType::Switch).with_ip("10.0.0.2");
        d.hardware = Some(HardwareInfo {
            vendor: Some("Acme".to_string()),
            firmware: Some(FirmwareInfo { version: Some("2.0".to_string()), ..FirmwareInfo::default() }),
            ..HardwareInfo::default()
        });
        d
    }

    fn updates(v: Value) -> UpdateMap {
        serde_json::from_value(v).unwrap()
    }

    #[test]
    fn test_nested_old_value_is_resolved() {
        let affected = diff_device(&switch(), &updates(json!({"hardware.firmware.version": "2.1", "floor": 2})));
        assert_eq!(
            affected.changes["hardware.firmware.version"],
            FieldChange { old: json!("2.0"), new: json!("2.1") }
        );
        assert_eq!(affected.changes["floor"], FieldChange { old: Value::Null, new: json!(2) });
        assert_eq!(affected.name, "SW-1");
    }

    #[test]
    fn test_missing_devices_are_reported_not_dropped() {
        let snapshot = TopologySnapshot::with_devices(vec![switch()]);
        let ids = vec!["sw1".to_string(), "ghost".to_string(), "sw1".to_string()];
        let err = build_diff(&ids, &updates(json!({"notes": "x"})), &snapshot).unwrap_err();
        assert_eq!(err.missing, vec!["ghost".to_string()]);
        assert_eq!(err.resolved.len(), 1);
    }

    #[test]
    fn test_repeated_ids_diffed_once() {
        let snapshot = TopologySnapshot::with_devices(vec![switch()]);
        let ids = vec!["sw1".to_string(), "sw1".to_string()];
        assert_eq!(build_diff(&ids, &updates(json!({"notes": "x"})), &snapshot).unwrap().len(), 1);
    }

    #[test]
    fn test_derive_changes_matches_recorded_diff() {
        let device = switch();
        let u = updates(json!({"hardware.firmware.version": "2.1", "ip": "10.0.0.3", "hardware.model": "X1"}));
        let recorded = diff_device(&device, &u);

        let pre = serde_json::to_value(&device).unwrap();
        let post = apply_nested_updates(&pre, &u);
        assert_eq!(derive_changes(&pre, &post, u.keys()), recorded.changes);
    }

    #[test]
    fn test_noop_change() {
        let affected = diff_device(&switch(), &updates(json!({"ip": "10.0.0.2"})));
        assert!(affected.changes["ip"].is_noop());
    }
}
