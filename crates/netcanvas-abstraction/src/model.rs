//! Topology entities: devices, connections, VLANs and buildings.
//!
//! These are the committed shapes owned by the topology registry. Field names
//! serialize in camelCase because dot-path updates (`hardware.firmware.version`,
//! `buildingId`) address them by their serialized names.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Kind of network device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceType {
    /// Edge or internal router.
    Router,
    /// Access or distribution switch.
    Switch,
    /// Core/backbone switch.
    CoreSwitch,
    /// Firewall or security appliance.
    Firewall,
    /// Wireless access point.
    #[serde(rename = "ap", alias = "access_point")]
    AccessPoint,
    /// Physical or virtual server.
    Server,
    /// End-user workstation.
    Workstation,
    /// Network printer.
    Printer,
    /// IP camera.
    Camera,
    /// VoIP phone.
    Phone,
    /// IoT / embedded device.
    Iot,
    /// WAN uplink or ISP handoff.
    Wan,
    /// Anything else.
    Other,
}

impl DeviceType {
    /// Every accepted device type, in declaration order.
    pub const ALL: [Self; 13] = [
        Self::Router,
        Self::Switch,
        Self::CoreSwitch,
        Self::Firewall,
        Self::AccessPoint,
        Self::Server,
        Self::Workstation,
        Self::Printer,
        Self::Camera,
        Self::Phone,
        Self::Iot,
        Self::Wan,
        Self::Other,
    ];

    /// Parses a device type name, case-insensitively.
    ///
    /// Accepts the serialized names plus a few common spellings
    /// (`access_point`, `core`).
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "router" => Some(Self::Router),
            "switch" => Some(Self::Switch),
            "core_switch" | "core" => Some(Self::CoreSwitch),
            "firewall" => Some(Self::Firewall),
            "ap" | "access_point" => Some(Self::AccessPoint),
            "server" => Some(Self::Server),
            "workstation" => Some(Self::Workstation),
            "printer" => Some(Self::Printer),
            "camera" => Some(Self::Camera),
            "phone" => Some(Self::Phone),
            "iot" => Some(Self::Iot),
            "wan" => Some(Self::Wan),
            "other" => Some(Self::Other),
            _ => None,
        }
    }

    /// Returns the serialized name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Router => "router",
            Self::Switch => "switch",
            Self::CoreSwitch => "core_switch",
            Self::Firewall => "firewall",
            Self::AccessPoint => "ap",
            Self::Server => "server",
            Self::Workstation => "workstation",
            Self::Printer => "printer",
            Self::Camera => "camera",
            Self::Phone => "phone",
            Self::Iot => "iot",
            Self::Wan => "wan",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for DeviceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Operational status of a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceStatus {
    Online,
    Offline,
    Warning,
    Maintenance,
    #[default]
    Unknown,
}

impl DeviceStatus {
    /// Every accepted status value.
    pub const ALL: [Self; 5] =
        [Self::Online, Self::Offline, Self::Warning, Self::Maintenance, Self::Unknown];

    /// Parses a status name, case-insensitively.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "online" => Some(Self::Online),
            "offline" => Some(Self::Offline),
            "warning" => Some(Self::Warning),
            "maintenance" => Some(Self::Maintenance),
            "unknown" => Some(Self::Unknown),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Online => "online",
            Self::Offline => "offline",
            Self::Warning => "warning",
            Self::Maintenance => "maintenance",
            Self::Unknown => "unknown",
        }
    }
}

/// Firmware details nested under [`HardwareInfo`].
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FirmwareInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_date: Option<String>,
    /// Vendor-specific firmware attributes.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// Hardware inventory details for a device.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HardwareInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vendor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serial_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub firmware: Option<FirmwareInfo>,
    /// Any other inventory attributes.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// A point on the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    #[must_use]
    pub fn distance_to(&self, other: &Self) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// A committed network device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub device_type: DeviceType,
    #[serde(default)]
    pub ip: Option<String>,
    #[serde(default)]
    pub mac: Option<String>,
    #[serde(default)]
    pub status: DeviceStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hardware: Option<HardwareInfo>,
    #[serde(default)]
    pub vlans: Vec<u16>,
    #[serde(default)]
    pub building_id: Option<String>,
    #[serde(default)]
    pub floor: Option<u32>,
    #[serde(default)]
    pub notes: Option<String>,
    /// Canvas position; `None` for devices never laid out.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
}

impl Device {
    /// Creates a device with only the required fields set.
    pub fn new(id: impl Into<String>, name: impl Into<String>, device_type: DeviceType) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            device_type,
            ip: None,
            mac: None,
            status: DeviceStatus::Unknown,
            hardware: None,
            vlans: Vec::new(),
            building_id: None,
            floor: None,
            notes: None,
            position: None,
        }
    }

    #[must_use]
    pub fn with_position(mut self, x: f64, y: f64) -> Self {
        self.position = Some(Position::new(x, y));
        self
    }

    #[must_use]
    pub fn with_ip(mut self, ip: impl Into<String>) -> Self {
        self.ip = Some(ip.into());
        self
    }

    #[must_use]
    pub fn with_mac(mut self, mac: impl Into<String>) -> Self {
        self.mac = Some(mac.into());
        self
    }
}

/// A link between two devices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    pub id: String,
    pub from_device_id: String,
    pub to_device_id: String,
    #[serde(default)]
    pub from_port: Option<String>,
    #[serde(default)]
    pub to_port: Option<String>,
    /// Link medium, e.g. `ethernet`, `fiber`, `wireless`.
    #[serde(rename = "type", default)]
    pub connection_type: Option<String>,
    #[serde(default)]
    pub speed: Option<String>,
    #[serde(default)]
    pub vlans: Vec<u16>,
    #[serde(default)]
    pub cable_type: Option<String>,
}

impl Connection {
    /// Whether this connection joins `a` and `b`, in either direction.
    #[must_use]
    pub fn joins(&self, a: &str, b: &str) -> bool {
        (self.from_device_id == a && self.to_device_id == b)
            || (self.from_device_id == b && self.to_device_id == a)
    }
}

/// A VLAN definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vlan {
    pub id: String,
    pub vlan_id: u16,
    pub name: String,
    #[serde(default)]
    pub subnet: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Canvas-space rectangle occupied by a building.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Bounds {
    #[must_use]
    pub fn center(&self) -> Position {
        Position::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

/// A building that devices can be assigned to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Building {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub bounds: Option<Bounds>,
}
