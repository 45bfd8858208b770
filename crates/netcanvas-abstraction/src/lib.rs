//! Topology abstraction layer for NetCanvas.
//!
//! This crate defines the committed topology entities, the read-only
//! [`TopologySnapshot`] the suggestion pipeline computes against, and the
//! [`TopologyRegistry`] write contract that approved changes go through.

pub mod error;
pub mod model;
pub mod paths;
pub mod registry;
pub mod snapshot;

pub use error::{Result, TopologyError};
pub use model::{
    Bounds, Building, Connection, Device, DeviceStatus, DeviceType, FirmwareInfo, HardwareInfo,
    Position, Vlan,
};
pub use paths::{apply_nested_updates, get_path, get_path_or_null, set_path, UpdateMap};
pub use registry::{
    apply_mutation, CommitReceipt, ConnectionSpec, DeviceLink, DeviceUpdate, InMemoryTopology,
    NewDevice, TopologyMutation, TopologyRegistry,
};
pub use snapshot::{normalize_name, TopologySnapshot};
