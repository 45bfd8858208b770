//! Read-only view of the topology at a point in time.

use serde::{Deserialize, Serialize};

use crate::model::{Building, Connection, Device, Position, Vlan};

/// Normalizes a device name for comparison: trimmed and lower-cased.
#[must_use]
pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// An immutable copy of the registry contents.
///
/// Matching, placement and diffing are pure functions of a snapshot, so a
/// proposal computed against one can be reviewed without holding any lock on
/// the registry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopologySnapshot {
    #[serde(default)]
    pub devices: Vec<Device>,
    #[serde(default)]
    pub connections: Vec<Connection>,
    #[serde(default)]
    pub vlans: Vec<Vlan>,
    #[serde(default)]
    pub buildings: Vec<Building>,
}

impl TopologySnapshot {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_devices(devices: Vec<Device>) -> Self {
        Self { devices, ..Self::default() }
    }

    /// Looks up a device by id.
    #[must_use]
    pub fn device(&self, id: &str) -> Option<&Device> {
        self.devices.iter().find(|d| d.id == id)
    }

    /// Looks up a device by name, ignoring case and surrounding whitespace.
    #[must_use]
    pub fn device_by_name(&self, name: &str) -> Option<&Device> {
        let wanted = normalize_name(name);
        if wanted.is_empty() {
            return None;
        }
        self.devices.iter().find(|d| normalize_name(&d.name) == wanted)
    }

    #[must_use]
    pub fn building(&self, id: &str) -> Option<&Building> {
        self.buildings.iter().find(|b| b.id == id)
    }

    #[must_use]
    pub fn vlan_by_number(&self, vlan_id: u16) -> Option<&Vlan> {
        self.vlans.iter().find(|v| v.vlan_id == vlan_id)
    }

    #[must_use]
    pub fn connection(&self, id: &str) -> Option<&Connection> {
        self.connections.iter().find(|c| c.id == id)
    }

    /// Finds a connection joining two devices, in either direction.
    #[must_use]
    pub fn connection_between(&self, a: &str, b: &str) -> Option<&Connection> {
        self.connections.iter().find(|c| c.joins(a, b))
    }

    /// Positions of every device that has been laid out.
    pub fn occupied_positions(&self) -> impl Iterator<Item = Position> + '_ {
        self.devices.iter().filter_map(|d| d.position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DeviceType;

    #[test]
    fn test_device_by_name_is_case_and_whitespace_insensitive() {
        let snapshot =
            TopologySnapshot::with_devices(vec![Device::new("d1", "SW-1", DeviceType::Switch)]);
        assert_eq!(snapshot.device_by_name(" sw-1 ").map(|d| d.id.as_str()), Some("d1"));
        assert!(snapshot.device_by_name("sw-10").is_none());
        assert!(snapshot.device_by_name("   ").is_none());
    }

    #[test]
    fn test_occupied_positions_skips_unplaced_devices() {
        let snapshot = TopologySnapshot::with_devices(vec![
            Device::new("d1", "a", DeviceType::Switch).with_position(10.0, 20.0),
            Device::new("d2", "b", DeviceType::Switch),
        ]);
        assert_eq!(snapshot.occupied_positions().count(), 1);
    }
}
