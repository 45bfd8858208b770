//! Typed tool inputs.
//!
//! Tool inputs come from an external model and are untrusted. Each tool's
//! input decodes into its own payload type and is then checked by that type's
//! validator; anything unrecognized or ill-formed becomes a [`PayloadError`].

use netcanvas_abstraction::{ConnectionSpec, DeviceLink, DeviceType, HardwareInfo, UpdateMap};
use netcanvas_stream::ToolInvocation;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use thiserror::Error;

use super::catalog::ToolKind;
use crate::validation::{is_valid_ipv4, is_valid_mac, is_valid_vlan};

/// Why a tool invocation could not become a payload.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PayloadError {
    /// The tool name is not in the catalogue.
    #[error("Unknown tool '{0}'")]
    UnknownTool(String),

    /// The input did not satisfy the tool's schema or field rules.
    #[error("Malformed input for '{tool}': {}", reasons.join("; "))]
    Malformed {
        /// Tool name
        tool: String,
        /// Every problem found
        reasons: Vec<String>,
    },
}

/// How sure the model is about a suggestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

/// Severity of a reported security finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Low,
    Medium,
    High,
    Critical,
}

fn lenient_device_type<'de, D>(deserializer: D) -> Result<DeviceType, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    DeviceType::parse(&raw).ok_or_else(|| serde::de::Error::custom(format!("unknown device type '{}'", raw)))
}

/// A device as proposed by the model, before it has an id or position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposedDevice {
    pub name: String,
    #[serde(rename = "type", deserialize_with = "lenient_device_type")]
    pub device_type: DeviceType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mac: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hardware: Option<HardwareInfo>,
    #[serde(default)]
    pub vlans: Vec<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub building_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub floor: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl ProposedDevice {
    pub fn new(name: impl Into<String>, device_type: DeviceType) -> Self {
        Self {
            name: name.into(),
            device_type,
            ip: None,
            mac: None,
            hardware: None,
            vlans: Vec::new(),
            building_id: None,
            floor: None,
            notes: None,
        }
    }
}

/// A connection from a proposed device to a device named in the same turn or
/// already in the topology.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposedConnection {
    pub to_device_name: String,
    #[serde(flatten)]
    pub spec: ConnectionSpec,
}

impl From<ProposedConnection> for DeviceLink {
    fn from(c: ProposedConnection) -> Self {
        DeviceLink { to_device_name: c.to_device_name, spec: c.spec }
    }
}

/// Input of `suggest_device_addition`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceSuggestion {
    pub device: ProposedDevice,
    #[serde(default)]
    pub connections: Vec<ProposedConnection>,
    pub reasoning: String,
    pub confidence: Confidence,
}

/// Input of `suggest_connection_addition`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionAddition {
    pub from_device_name: String,
    pub to_device_name: String,
    #[serde(flatten)]
    pub spec: ConnectionSpec,
    pub reasoning: String,
    pub confidence: Confidence,
}

/// Identifies an existing connection by id or by its endpoints' names.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionSelector {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_device_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_device_name: Option<String>,
}

impl ConnectionSelector {
    fn check(&self, reasons: &mut Vec<String>) {
        let has_id = self.connection_id.as_deref().is_some_and(|s| !s.trim().is_empty());
        let has_ends = [&self.from_device_name, &self.to_device_name]
            .iter()
            .all(|n| n.as_deref().is_some_and(|s| !s.trim().is_empty()));
        if !has_id && !has_ends {
            reasons.push("either connectionId or both fromDeviceName and toDeviceName are required".to_string());
        }
    }
}

/// Link attributes to change; absent fields are left alone.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionChanges {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_port: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_port: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub connection_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vlans: Option<Vec<u16>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cable_type: Option<String>,
}

impl ConnectionChanges {
    /// The changed fields as dot-path updates on a serialized connection.
    pub fn to_updates(&self) -> UpdateMap {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map.into_iter().collect(),
            _ => UpdateMap::new(),
        }
    }
}

/// Input of `suggest_connection_modification`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionModification {
    #[serde(flatten)]
    pub target: ConnectionSelector,
    pub changes: ConnectionChanges,
    pub reasoning: String,
    pub confidence: Confidence,
}

/// Input of `suggest_connection_removal`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionRemoval {
    #[serde(flatten)]
    pub target: ConnectionSelector,
    pub reasoning: String,
    pub confidence: Confidence,
}

/// Input of `suggest_vlan_creation`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VlanCreation {
    pub vlan_id: u16,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subnet: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub reasoning: String,
    pub confidence: Confidence,
}

/// Input of `suggest_vlan_assignment`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VlanAssignment {
    pub device_name: String,
    pub vlan_ids: Vec<u16>,
    pub reasoning: String,
    pub confidence: Confidence,
}

/// Input of `report_security_finding`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityFinding {
    pub severity: Severity,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub affected_devices: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommendation: Option<String>,
}

/// Input of `request_import`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportRequest {
    pub reason: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
}

/// A validated tool input, one variant per catalogue entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "tool", content = "input", rename_all = "snake_case")]
pub enum ToolPayload {
    DeviceAddition(DeviceSuggestion),
    ConnectionAddition(ConnectionAddition),
    ConnectionModification(ConnectionModification),
    ConnectionRemoval(ConnectionRemoval),
    VlanCreation(VlanCreation),
    VlanAssignment(VlanAssignment),
    SecurityFinding(SecurityFinding),
    ImportRequest(ImportRequest),
}

impl ToolPayload {
    /// Decodes and validates an invocation's input.
    pub fn parse(invocation: &ToolInvocation) -> Result<Self, PayloadError> {
        let kind = ToolKind::from_tool_name(&invocation.name)
            .ok_or_else(|| PayloadError::UnknownTool(invocation.name.clone()))?;

        if let Some(reason) = &invocation.parse_error {
            return Err(PayloadError::Malformed {
                tool: kind.tool_name().to_string(),
                reasons: vec![format!("input was not valid JSON: {}", reason)],
            });
        }

        let input = &invocation.input;
        Ok(match kind {
            ToolKind::DeviceAddition => Self::DeviceAddition(decode(kind, input)?),
            ToolKind::ConnectionAddition => Self::ConnectionAddition(decode(kind, input)?),
            ToolKind::ConnectionModification => Self::ConnectionModification(decode(kind, input)?),
            ToolKind::ConnectionRemoval => Self::ConnectionRemoval(decode(kind, input)?),
            ToolKind::VlanCreation => Self::VlanCreation(decode(kind, input)?),
            ToolKind::VlanAssignment => Self::VlanAssignment(decode(kind, input)?),
            ToolKind::SecurityFinding => Self::SecurityFinding(decode(kind, input)?),
            ToolKind::ImportRequest => Self::ImportRequest(decode(kind, input)?),
        })
    }

    #[must_use]
    pub fn kind(&self) -> ToolKind {
        match self {
            Self::DeviceAddition(_) => ToolKind::DeviceAddition,
            Self::ConnectionAddition(_) => ToolKind::ConnectionAddition,
            Self::ConnectionModification(_) => ToolKind::ConnectionModification,
            Self::ConnectionRemoval(_) => ToolKind::ConnectionRemoval,
            Self::VlanCreation(_) => ToolKind::VlanCreation,
            Self::VlanAssignment(_) => ToolKind::VlanAssignment,
            Self::SecurityFinding(_) => ToolKind::SecurityFinding,
            Self::ImportRequest(_) => ToolKind::ImportRequest,
        }
    }
}

/// Field rules a payload must satisfy after decoding.
trait CheckedPayload: DeserializeOwned {
    /// Clears optional fields that were sent as blank strings.
    fn normalize(&mut self) {}

    fn check(&self, reasons: &mut Vec<String>);
}

fn decode<T: CheckedPayload>(kind: ToolKind, input: &Value) -> Result<T, PayloadError> {
    let malformed = |reasons| PayloadError::Malformed { tool: kind.tool_name().to_string(), reasons };

    let mut payload: T = serde_json::from_value(input.clone()).map_err(|e| malformed(vec![e.to_string()]))?;
    payload.normalize();

    let mut reasons = Vec::new();
    payload.check(&mut reasons);
    if reasons.is_empty() { Ok(payload) } else { Err(malformed(reasons)) }
}

fn blank_to_none(field: &mut Option<String>) {
    if field.as_deref().is_some_and(|s| s.trim().is_empty()) {
        *field = None;
    }
}

fn require_text(field: &str, value: &str, reasons: &mut Vec<String>) {
    if value.trim().is_empty() {
        reasons.push(format!("{}: must not be blank", field));
    }
}

fn check_vlans(field: &str, vlans: &[u16], reasons: &mut Vec<String>) {
    for vlan in vlans {
        if !is_valid_vlan(i64::from(*vlan)) {
            reasons.push(format!("{}: VLAN {} is outside 1-4094", field, vlan));
        }
    }
}

impl CheckedPayload for DeviceSuggestion {
    fn normalize(&mut self) {
        let d = &mut self.device;
        for field in [&mut d.ip, &mut d.mac, &mut d.building_id, &mut d.notes] {
            blank_to_none(field);
        }
    }

    fn check(&self, reasons: &mut Vec<String>) {
        require_text("reasoning", &self.reasoning, reasons);
        let d = &self.device;
        require_text("device.name", &d.name, reasons);
        if let Some(ip) = &d.ip {
            if !is_valid_ipv4(ip) {
                reasons.push(format!("device.ip: '{}' is not a valid IPv4 address", ip));
            }
        }
        if let Some(mac) = &d.mac {
            if !is_valid_mac(mac) {
                reasons.push(format!("device.mac: '{}' is not a valid MAC address", mac));
            }
        }
        if d.floor == Some(0) {
            reasons.push("device.floor: must be a positive integer".to_string());
        }
        check_vlans("device.vlans", &d.vlans, reasons);
        for (i, c) in self.connections.iter().enumerate() {
            require_text(&format!("connections[{}].toDeviceName", i), &c.to_device_name, reasons);
            check_vlans(&format!("connections[{}].vlans", i), &c.spec.vlans, reasons);
        }
    }
}

impl CheckedPayload for ConnectionAddition {
    fn check(&self, reasons: &mut Vec<String>) {
        require_text("reasoning", &self.reasoning, reasons);
        require_text("fromDeviceName", &self.from_device_name, reasons);
        require_text("toDeviceName", &self.to_device_name, reasons);
        check_vlans("vlans", &self.spec.vlans, reasons);
    }
}

impl CheckedPayload for ConnectionModification {
    fn check(&self, reasons: &mut Vec<String>) {
        require_text("reasoning", &self.reasoning, reasons);
        self.target.check(reasons);
        if self.changes.to_updates().is_empty() {
            reasons.push("changes: at least one attribute must change".to_string());
        }
        if let Some(vlans) = &self.changes.vlans {
            check_vlans("changes.vlans", vlans, reasons);
        }
    }
}

impl CheckedPayload for ConnectionRemoval {
    fn check(&self, reasons: &mut Vec<String>) {
        require_text("reasoning", &self.reasoning, reasons);
        self.target.check(reasons);
    }
}

impl CheckedPayload for VlanCreation {
    fn normalize(&mut self) {
        blank_to_none(&mut self.subnet);
        blank_to_none(&mut self.description);
    }

    fn check(&self, reasons: &mut Vec<String>) {
        require_text("reasoning", &self.reasoning, reasons);
        check_vlans("vlanId", &[self.vlan_id], reasons);
        require_text("name", &self.name, reasons);
    }
}

impl CheckedPayload for VlanAssignment {
    fn check(&self, reasons: &mut Vec<String>) {
        require_text("reasoning", &self.reasoning, reasons);
        require_text("deviceName", &self.device_name, reasons);
        if self.vlan_ids.is_empty() {
            reasons.push("vlanIds: at least one VLAN is required".to_string());
        }
        check_vlans("vlanIds", &self.vlan_ids, reasons);
    }
}

impl CheckedPayload for SecurityFinding {
    fn check(&self, reasons: &mut Vec<String>) {
        require_text("title", &self.title, reasons);
        require_text("description", &self.description, reasons);
    }
}

impl CheckedPayload for ImportRequest {
    fn check(&self, reasons: &mut Vec<String>) {
        require_text("reason", &self.reason, reasons);
    }
}
