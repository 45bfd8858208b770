// Tool schema definitions
//
// Each supported suggestion kind is offered to the LLM as a named tool with a
// JSON-schema input. These types build and serialize those schemas.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A tool offered to the LLM.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Tool name the LLM invokes
    pub name: String,
    /// What the tool is for
    pub description: String,
    /// Input schema
    #[serde(rename = "input_schema")]
    pub parameters: ToolParameters,
}

impl ToolDefinition {
    pub fn new(name: impl Into<String>, description: impl Into<String>, parameters: ToolParameters) -> Self {
        Self { name: name.into(), description: description.into(), parameters }
    }
}

/// Tool parameters schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolParameters {
    /// Type (always "object" for tool inputs)
    #[serde(rename = "type")]
    pub param_type: String,
    /// Property definitions
    pub properties: BTreeMap<String, ToolPropertySchema>,
    /// Required property names
    pub required: Vec<String>,
}

impl ToolParameters {
    /// Create a new tool parameters schema
    pub fn new() -> Self {
        Self { param_type: "object".to_string(), properties: BTreeMap::new(), required: Vec::new() }
    }

    /// Add a scalar property to the schema
    #[must_use]
    pub fn add_property(
        self,
        name: impl Into<String>,
        property_type: impl Into<String>,
        description: impl Into<String>,
        required: bool,
    ) -> Self {
        self.add_schema(name, ToolPropertySchema::new(property_type, description), required)
    }

    /// Add a property with a fully-built schema
    #[must_use]
    pub fn add_schema(mut self, name: impl Into<String>, schema: ToolPropertySchema, required: bool) -> Self {
        let name = name.into();
        self.properties.insert(name.clone(), schema);
        if required {
            self.required.push(name);
        }
        self
    }

    /// Converts the parameters into a nested object property.
    pub fn into_object(self, description: impl Into<String>) -> ToolPropertySchema {
        ToolPropertySchema {
            property_type: self.param_type,
            description: description.into(),
            enum_values: None,
            items: None,
            properties: Some(self.properties),
            required: Some(self.required),
        }
    }
}

impl Default for ToolParameters {
    fn default() -> Self {
        Self::new()
    }
}

/// Tool property schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolPropertySchema {
    /// Property type
    #[serde(rename = "type")]
    pub property_type: String,
    /// Property description
    pub description: String,
    /// Allowed values for enumerated strings
    #[serde(rename = "enum", default, skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<String>>,
    /// Element schema for arrays
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<ToolPropertySchema>>,
    /// Member schemas for nested objects
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<BTreeMap<String, ToolPropertySchema>>,
    /// Required members of nested objects
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<Vec<String>>,
}

impl ToolPropertySchema {
    pub fn new(property_type: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            property_type: property_type.into(),
            description: description.into(),
            enum_values: None,
            items: None,
            properties: None,
            required: None,
        }
    }

    /// A string restricted to `values`.
    pub fn string_enum<I, S>(description: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            enum_values: Some(values.into_iter().map(Into::into).collect()),
            ..Self::new("string", description)
        }
    }

    /// An array whose elements follow `items`.
    pub fn array(description: impl Into<String>, items: ToolPropertySchema) -> Self {
        Self { items: Some(Box::new(items)), ..Self::new("array", description) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parameters_builder_tracks_required() {
        let params = ToolParameters::new()
            .add_property("name", "string", "Device name", true)
            .add_property("notes", "string", "Free text", false);
        assert_eq!(params.required, vec!["name".to_string()]);
        assert_eq!(params.properties.len(), 2);
    }

    #[test]
    fn test_nested_schema_serialization() {
        let def = ToolDefinition::new(
            "suggest_vlan_assignment",
            "Assign VLANs",
            ToolParameters::new().add_schema(
                "vlanIds",
                ToolPropertySchema::array("VLAN ids", ToolPropertySchema::new("integer", "VLAN id")),
                true,
            ),
        );
        let value = serde_json::to_value(&def).unwrap();
        assert_eq!(value["input_schema"]["type"], json!("object"));
        assert_eq!(value["input_schema"]["properties"]["vlanIds"]["items"]["type"], json!("integer"));
        assert!(value["input_schema"]["properties"]["vlanIds"].get("enum").is_none());
    }
}
