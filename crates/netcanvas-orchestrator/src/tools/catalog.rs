//! The fixed set of tools the pipeline dispatches on, and their schemas.

use netcanvas_abstraction::{DeviceStatus, DeviceType};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::definition::{ToolDefinition, ToolParameters, ToolPropertySchema};

/// Every supported suggestion kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolKind {
    DeviceAddition,
    ConnectionAddition,
    ConnectionModification,
    ConnectionRemoval,
    VlanCreation,
    VlanAssignment,
    SecurityFinding,
    ImportRequest,
}

impl ToolKind {
    pub const ALL: [Self; 8] = [
        Self::DeviceAddition,
        Self::ConnectionAddition,
        Self::ConnectionModification,
        Self::ConnectionRemoval,
        Self::VlanCreation,
        Self::VlanAssignment,
        Self::SecurityFinding,
        Self::ImportRequest,
    ];

    /// Tool name as offered to the LLM.
    #[must_use]
    pub fn tool_name(&self) -> &'static str {
        match self {
            Self::DeviceAddition => "suggest_device_addition",
            Self::ConnectionAddition => "suggest_connection_addition",
            Self::ConnectionModification => "suggest_connection_modification",
            Self::ConnectionRemoval => "suggest_connection_removal",
            Self::VlanCreation => "suggest_vlan_creation",
            Self::VlanAssignment => "suggest_vlan_assignment",
            Self::SecurityFinding => "report_security_finding",
            Self::ImportRequest => "request_import",
        }
    }

    /// Resolves a tool name; `None` for anything outside the catalogue.
    pub fn from_tool_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.tool_name() == name)
    }
}

impl fmt::Display for ToolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tool_name())
    }
}

fn reasoning_and_confidence(params: ToolParameters) -> ToolParameters {
    params
        .add_property("reasoning", "string", "Why this change is being suggested", true)
        .add_schema(
            "confidence",
            ToolPropertySchema::string_enum("How certain the suggestion is", ["high", "medium", "low"]),
            true,
        )
}

fn vlan_list(description: &str) -> ToolPropertySchema {
    ToolPropertySchema::array(description, ToolPropertySchema::new("integer", "802.1Q VLAN id (1-4094)"))
}

fn link_properties(params: ToolParameters) -> ToolParameters {
    params
        .add_property("fromPort", "string", "Port on the source device", false)
        .add_property("toPort", "string", "Port on the target device", false)
        .add_schema(
            "type",
            ToolPropertySchema::string_enum("Link medium", ["ethernet", "fiber", "wireless", "vpn"]),
            false,
        )
        .add_property("speed", "string", "Link speed, e.g. 1G or 10G", false)
        .add_schema("vlans", vlan_list("VLANs carried on the link"), false)
        .add_property("cableType", "string", "Cable category, e.g. cat6 or om4", false)
}

fn connection_selector(params: ToolParameters) -> ToolParameters {
    params
        .add_property("connectionId", "string", "Id of the existing connection", false)
        .add_property("fromDeviceName", "string", "Name of one endpoint (when the id is unknown)", false)
        .add_property("toDeviceName", "string", "Name of the other endpoint (when the id is unknown)", false)
}

fn device_schema() -> ToolPropertySchema {
    let firmware = ToolParameters::new()
        .add_property("version", "string", "Firmware version", false)
        .add_property("releaseDate", "string", "Firmware release date", false)
        .into_object("Firmware details");
    let hardware = ToolParameters::new()
        .add_property("vendor", "string", "Manufacturer", false)
        .add_property("model", "string", "Model number", false)
        .add_property("serialNumber", "string", "Serial number", false)
        .add_schema("firmware", firmware, false)
        .into_object("Hardware inventory");

    ToolParameters::new()
        .add_property("name", "string", "Unique device name", true)
        .add_schema(
            "type",
            ToolPropertySchema::string_enum("Device type", DeviceType::ALL.iter().map(DeviceType::as_str)),
            true,
        )
        .add_property("ip", "string", "IPv4 address", false)
        .add_property("mac", "string", "MAC address (colon or hyphen separated)", false)
        .add_schema("hardware", hardware, false)
        .add_schema("vlans", vlan_list("VLANs the device belongs to"), false)
        .add_property("buildingId", "string", "Building the device is installed in", false)
        .add_property("floor", "integer", "Floor number, starting at 1", false)
        .add_property("notes", "string", "Free-form notes", false)
        .into_object("The device to add")
}

fn definition(kind: ToolKind) -> ToolDefinition {
    match kind {
        ToolKind::DeviceAddition => {
            let link = link_properties(
                ToolParameters::new().add_property("toDeviceName", "string", "Name of the device to connect to", true),
            )
            .into_object("A connection from the new device");
            ToolDefinition::new(
                kind.tool_name(),
                "Suggest adding a new device to the topology, with optional connections to other devices.",
                reasoning_and_confidence(
                    ToolParameters::new()
                        .add_schema("device", device_schema(), true)
                        .add_schema("connections", ToolPropertySchema::array("Connections to create", link), false),
                ),
            )
        }
        ToolKind::ConnectionAddition => ToolDefinition::new(
            kind.tool_name(),
            "Suggest a new connection between two existing devices.",
            reasoning_and_confidence(link_properties(
                ToolParameters::new()
                    .add_property("fromDeviceName", "string", "Name of the source device", true)
                    .add_property("toDeviceName", "string", "Name of the target device", true),
            )),
        ),
        ToolKind::ConnectionModification => {
            let changes = link_properties(ToolParameters::new()).into_object("Link attributes to change");
            ToolDefinition::new(
                kind.tool_name(),
                "Suggest changing attributes of an existing connection.",
                reasoning_and_confidence(connection_selector(ToolParameters::new()).add_schema("changes", changes, true)),
            )
        }
        ToolKind::ConnectionRemoval => ToolDefinition::new(
            kind.tool_name(),
            "Suggest removing an existing connection.",
            reasoning_and_confidence(connection_selector(ToolParameters::new())),
        ),
        ToolKind::VlanCreation => ToolDefinition::new(
            kind.tool_name(),
            "Suggest creating a new VLAN.",
            reasoning_and_confidence(
                ToolParameters::new()
                    .add_property("vlanId", "integer", "802.1Q VLAN id (1-4094)", true)
                    .add_property("name", "string", "VLAN name", true)
                    .add_property("subnet", "string", "Subnet in CIDR notation", false)
                    .add_property("description", "string", "What the VLAN is for", false),
            ),
        ),
        ToolKind::VlanAssignment => ToolDefinition::new(
            kind.tool_name(),
            "Suggest assigning existing VLANs to a device.",
            reasoning_and_confidence(
                ToolParameters::new()
                    .add_property("deviceName", "string", "Name of the device", true)
                    .add_schema("vlanIds", vlan_list("VLANs to assign"), true),
            ),
        ),
        ToolKind::SecurityFinding => ToolDefinition::new(
            kind.tool_name(),
            "Report a security concern found in the topology. Informational only.",
            ToolParameters::new()
                .add_schema(
                    "severity",
                    ToolPropertySchema::string_enum("Severity", ["critical", "high", "medium", "low", "info"]),
                    true,
                )
                .add_property("title", "string", "Short summary", true)
                .add_property("description", "string", "Details of the finding", true)
                .add_schema(
                    "affectedDevices",
                    ToolPropertySchema::array("Names of affected devices", ToolPropertySchema::new("string", "Device name")),
                    false,
                )
                .add_property("recommendation", "string", "Suggested remediation", false),
        ),
        ToolKind::ImportRequest => ToolDefinition::new(
            kind.tool_name(),
            "Ask the operator to import a topology file instead of adding devices one by one.",
            ToolParameters::new()
                .add_property("reason", "string", "Why an import is preferable", true)
                .add_property("format", "string", "Expected file format, e.g. csv or json", false),
        ),
    }
}

/// Returns the schema of every supported tool, in catalogue order.
pub fn tool_definitions() -> Vec<ToolDefinition> {
    ToolKind::ALL.into_iter().map(definition).collect()
}

/// Status values accepted by field updates, as listed to the LLM.
pub fn status_names() -> Vec<&'static str> {
    DeviceStatus::ALL.iter().map(DeviceStatus::as_str).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalogue_covers_every_kind() {
        let defs = tool_definitions();
        assert_eq!(defs.len(), ToolKind::ALL.len());
        for (def, kind) in defs.iter().zip(ToolKind::ALL) {
            assert_eq!(def.name, kind.tool_name());
            assert_eq!(ToolKind::from_tool_name(&def.name), Some(kind));
        }
    }

    #[test]
    fn test_unknown_tool_name() {
        assert_eq!(ToolKind::from_tool_name("delete_everything"), None);
    }

    #[test]
    fn test_device_schema_requires_name_and_type() {
        let def = definition(ToolKind::DeviceAddition);
        let device = &def.parameters.properties["device"];
        let required = device.required.as_ref().unwrap();
        assert!(required.contains(&"name".to_string()));
        assert!(required.contains(&"type".to_string()));
        let types = device.properties.as_ref().unwrap()["type"].enum_values.as_ref().unwrap();
        assert!(types.contains(&"ap".to_string()));
    }

    #[test]
    fn test_status_names() {
        assert!(status_names().contains(&"maintenance"));
    }
}
