//! Write contract for the topology registry.
//!
//! The registry is the only owner of committed topology state. Approved
//! suggestions reach it as a single [`TopologyMutation`], which must be applied
//! all-or-nothing.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{Result, TopologyError};
use crate::model::{Connection, Device, Vlan};
use crate::paths::{apply_nested_updates, UpdateMap};
use crate::snapshot::TopologySnapshot;

/// Link attributes shared by every way of creating a connection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionSpec {
    #[serde(default)]
    pub from_port: Option<String>,
    #[serde(default)]
    pub to_port: Option<String>,
    #[serde(rename = "type", default)]
    pub connection_type: Option<String>,
    #[serde(default)]
    pub speed: Option<String>,
    #[serde(default)]
    pub vlans: Vec<u16>,
    #[serde(default)]
    pub cable_type: Option<String>,
}

/// A connection from a new device to a device identified by name.
///
/// The target may be an existing device or another device created by the
/// same mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceLink {
    pub to_device_name: String,
    #[serde(flatten)]
    pub spec: ConnectionSpec,
}

/// A fully-formed device to add, with its connections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewDevice {
    pub device: Device,
    #[serde(default)]
    pub links: Vec<DeviceLink>,
}

/// Nested field updates for one device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceUpdate {
    pub device_id: String,
    pub updates: UpdateMap,
}

/// One reviewed change to commit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum TopologyMutation {
    AddDevices {
        devices: Vec<NewDevice>,
    },
    UpdateDevices {
        updates: Vec<DeviceUpdate>,
    },
    AddConnection {
        from_device_id: String,
        to_device_id: String,
        spec: ConnectionSpec,
    },
    UpdateConnection {
        connection_id: String,
        updates: UpdateMap,
    },
    RemoveConnection {
        connection_id: String,
    },
    CreateVlan {
        vlan_id: u16,
        name: String,
        subnet: Option<String>,
        description: Option<String>,
    },
    AssignVlans {
        device_id: String,
        vlan_ids: Vec<u16>,
    },
}

impl TopologyMutation {
    /// Short operation name for logs.
    #[must_use]
    pub fn op_name(&self) -> &'static str {
        match self {
            Self::AddDevices { .. } => "add_devices",
            Self::UpdateDevices { .. } => "update_devices",
            Self::AddConnection { .. } => "add_connection",
            Self::UpdateConnection { .. } => "update_connection",
            Self::RemoveConnection { .. } => "remove_connection",
            Self::CreateVlan { .. } => "create_vlan",
            Self::AssignVlans { .. } => "assign_vlans",
        }
    }
}

/// Ids touched by a successful commit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitReceipt {
    pub created: Vec<String>,
    pub updated: Vec<String>,
    pub removed: Vec<String>,
}

/// The topology registry seen by the approval pipeline.
pub trait TopologyRegistry: Send + Sync {
    /// Returns a point-in-time copy of the registry contents.
    fn snapshot(&self) -> TopologySnapshot;

    /// Applies a mutation as a single unit.
    ///
    /// On error nothing has been written.
    fn commit(&mut self, mutation: TopologyMutation) -> Result<CommitReceipt>;
}

/// Registry held entirely in memory.
///
/// Mutations are applied to a working copy which replaces the live state only
/// once every step has succeeded.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTopology {
    state: TopologySnapshot,
}

impl InMemoryTopology {
    #[must_use]
    pub fn new(state: TopologySnapshot) -> Self {
        Self { state }
    }

    /// Borrows the live state.
    #[must_use]
    pub fn state(&self) -> &TopologySnapshot {
        &self.state
    }

    #[must_use]
    pub fn into_state(self) -> TopologySnapshot {
        self.state
    }
}

impl TopologyRegistry for InMemoryTopology {
    fn snapshot(&self) -> TopologySnapshot {
        self.state.clone()
    }

    fn commit(&mut self, mutation: TopologyMutation) -> Result<CommitReceipt> {
        let op = mutation.op_name();
        let mut working = self.state.clone();
        let receipt = apply_mutation(&mut working, mutation)?;
        self.state = working;
        info!(
            op,
            created = receipt.created.len(),
            updated = receipt.updated.len(),
            removed = receipt.removed.len(),
            "Committed topology mutation"
        );
        Ok(receipt)
    }
}

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// Applies `mutation` to `state` in place.
///
/// Callers wanting atomicity apply to a clone and swap on success, as
/// [`InMemoryTopology`] does.
pub fn apply_mutation(
    state: &mut TopologySnapshot,
    mutation: TopologyMutation,
) -> Result<CommitReceipt> {
    let mut receipt = CommitReceipt::default();

    match mutation {
        TopologyMutation::AddDevices { devices } => {
            let mut pending_links = Vec::new();
            for NewDevice { mut device, links } in devices {
                if state.device_by_name(&device.name).is_some() {
                    return Err(TopologyError::DuplicateDevice(device.name));
                }
                if device.id.trim().is_empty() {
                    device.id = new_id();
                }
                debug!(device_id = %device.id, name = %device.name, "Adding device");
                receipt.created.push(device.id.clone());
                pending_links.push((device.id.clone(), links));
                state.devices.push(device);
            }

            // Links resolve after every device exists so batch members can
            // reference each other.
            for (from_id, links) in pending_links {
                for link in links {
                    let to_id = state
                        .device_by_name(&link.to_device_name)
                        .map(|d| d.id.clone())
                        .ok_or_else(|| TopologyError::UnknownDevice(link.to_device_name.clone()))?;
                    let connection = connection_from_spec(new_id(), from_id.clone(), to_id, link.spec);
                    receipt.created.push(connection.id.clone());
                    state.connections.push(connection);
                }
            }
        }
        TopologyMutation::UpdateDevices { updates } => {
            for DeviceUpdate { device_id, updates } in updates {
                let index = state
                    .devices
                    .iter()
                    .position(|d| d.id == device_id)
                    .ok_or_else(|| TopologyError::UnknownDevice(device_id.clone()))?;
                let current = serde_json::to_value(&state.devices[index])?;
                let next = apply_nested_updates(&current, &updates);
                let mut device: Device = serde_json::from_value(next).map_err(|e| {
                    TopologyError::InvalidEntity { id: device_id.clone(), reason: e.to_string() }
                })?;
                device.id.clone_from(&device_id);
                state.devices[index] = device;
                receipt.updated.push(device_id);
            }
        }
        TopologyMutation::AddConnection { from_device_id, to_device_id, spec } => {
            for id in [&from_device_id, &to_device_id] {
                if state.device(id).is_none() {
                    return Err(TopologyError::UnknownDevice(id.clone()));
                }
            }
            let connection = connection_from_spec(new_id(), from_device_id, to_device_id, spec);
            receipt.created.push(connection.id.clone());
            state.connections.push(connection);
        }
        TopologyMutation::UpdateConnection { connection_id, updates } => {
            let index = state
                .connections
                .iter()
                .position(|c| c.id == connection_id)
                .ok_or_else(|| TopologyError::UnknownConnection(connection_id.clone()))?;
            let current: Value = serde_json::to_value(&state.connections[index])?;
            let next = apply_nested_updates(&current, &updates);
            let mut connection: Connection = serde_json::from_value(next).map_err(|e| {
                TopologyError::InvalidEntity { id: connection_id.clone(), reason: e.to_string() }
            })?;
            connection.id.clone_from(&connection_id);
            state.connections[index] = connection;
            receipt.updated.push(connection_id);
        }
        TopologyMutation::RemoveConnection { connection_id } => {
            let before = state.connections.len();
            state.connections.retain(|c| c.id != connection_id);
            if state.connections.len() == before {
                return Err(TopologyError::UnknownConnection(connection_id));
            }
            receipt.removed.push(connection_id);
        }
        TopologyMutation::CreateVlan { vlan_id, name, subnet, description } => {
            if state.vlan_by_number(vlan_id).is_some() {
                return Err(TopologyError::DuplicateVlan(vlan_id));
            }
            let vlan = Vlan { id: new_id(), vlan_id, name, subnet, description };
            receipt.created.push(vlan.id.clone());
            state.vlans.push(vlan);
        }
        TopologyMutation::AssignVlans { device_id, vlan_ids } => {
            let device = state
                .devices
                .iter_mut()
                .find(|d| d.id == device_id)
                .ok_or_else(|| TopologyError::UnknownDevice(device_id.clone()))?;
            for vlan in vlan_ids {
                if !device.vlans.contains(&vlan) {
                    device.vlans.push(vlan);
                }
            }
            receipt.updated.push(device_id);
        }
    }

    Ok(receipt)
}

fn connection_from_spec(id: String, from: String, to: String, spec: ConnectionSpec) -> Connection {
    Connection {
        id,
        from_device_id: from,
        to_device_id: to,
        from_port: spec.from_port,
        to_port: spec.to_port,
        connection_type: spec.connection_type,
        speed: spec.speed,
        vlans: spec.vlans,
        cable_type: spec.cable_type,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DeviceType;
    use serde_json::json;

    fn registry() -> InMemoryTopology {
        InMemoryTopology::new(TopologySnapshot::with_devices(vec![
            Device::new("core", "CORE-1", DeviceType::CoreSwitch).with_position(400.0, 250.0),
        ]))
    }

    fn link(to: &str) -> DeviceLink {
        DeviceLink { to_device_name: to.to_string(), spec: ConnectionSpec::default() }
    }

    #[test]
    fn test_add_devices_links_batch_members() {
        let mut reg = registry();
        let receipt = reg
            .commit(TopologyMutation::AddDevices {
                devices: vec![
                    NewDevice {
                        device: Device::new("", "SW-1", DeviceType::Switch),
                        links: vec![link("core-1")],
                    },
                    NewDevice {
                        device: Device::new("", "AP-1", DeviceType::AccessPoint),
                        links: vec![link("SW-1")],
                    },
                ],
            })
            .unwrap();

        assert_eq!(receipt.created.len(), 4);
        assert_eq!(reg.state().devices.len(), 3);
        assert_eq!(reg.state().connections.len(), 2);
        assert!(reg.state().devices.iter().all(|d| !d.id.is_empty()));
    }

    #[test]
    fn test_add_devices_is_all_or_nothing() {
        let mut reg = registry();
        let err = reg
            .commit(TopologyMutation::AddDevices {
                devices: vec![
                    NewDevice { device: Device::new("", "SW-1", DeviceType::Switch), links: vec![] },
                    NewDevice {
                        device: Device::new("", "SW-2", DeviceType::Switch),
                        links: vec![link("missing")],
                    },
                ],
            })
            .unwrap_err();

        assert!(matches!(err, TopologyError::UnknownDevice(name) if name == "missing"));
        assert_eq!(reg.state().devices.len(), 1);
        assert!(reg.state().connections.is_empty());
    }

    #[test]
    fn test_update_devices_applies_nested_paths() {
        let mut reg = registry();
        let mut updates = UpdateMap::new();
        updates.insert("hardware.firmware.version".to_string(), json!("2.1"));
        updates.insert("floor".to_string(), json!(2));

        reg.commit(TopologyMutation::UpdateDevices {
            updates: vec![DeviceUpdate { device_id: "core".to_string(), updates }],
        })
        .unwrap();

        let device = reg.state().device("core").unwrap();
        assert_eq!(device.floor, Some(2));
        assert_eq!(
            device.hardware.as_ref().and_then(|h| h.firmware.as_ref()).and_then(|f| f.version.as_deref()),
            Some("2.1")
        );
    }

    #[test]
    fn test_update_rejects_ill_typed_value() {
        let mut reg = registry();
        let mut updates = UpdateMap::new();
        updates.insert("floor".to_string(), json!("second"));

        let err = reg
            .commit(TopologyMutation::UpdateDevices {
                updates: vec![DeviceUpdate { device_id: "core".to_string(), updates }],
            })
            .unwrap_err();
        assert!(matches!(err, TopologyError::InvalidEntity { .. }));
        assert_eq!(reg.state().device("core").unwrap().floor, None);
    }

    #[test]
    fn test_vlan_creation_and_assignment() {
        let mut reg = registry();
        reg.commit(TopologyMutation::CreateVlan {
            vlan_id: 20,
            name: "voice".to_string(),
            subnet: None,
            description: None,
        })
        .unwrap();
        let dup = reg.commit(TopologyMutation::CreateVlan {
            vlan_id: 20,
            name: "again".to_string(),
            subnet: None,
            description: None,
        });
        assert!(matches!(dup, Err(TopologyError::DuplicateVlan(20))));

        reg.commit(TopologyMutation::AssignVlans { device_id: "core".to_string(), vlan_ids: vec![20, 20] })
            .unwrap();
        assert_eq!(reg.state().device("core").unwrap().vlans, vec![20]);
    }

    #[test]
    fn test_remove_unknown_connection_fails() {
        let mut reg = registry();
        let err = reg
            .commit(TopologyMutation::RemoveConnection { connection_id: "nope".to_string() })
            .unwrap_err();
        assert!(matches!(err, TopologyError::UnknownConnection(_)));
    }
}
