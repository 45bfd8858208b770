//! Tool catalogue and typed tool payloads.

pub mod catalog;
pub mod definition;
pub mod payload;

pub use catalog::{status_names, tool_definitions, ToolKind};
pub use definition::{ToolDefinition, ToolParameters, ToolPropertySchema};
pub use payload::{
    Confidence, ConnectionAddition, ConnectionChanges, ConnectionModification, ConnectionRemoval,
    ConnectionSelector, DeviceSuggestion, ImportRequest, PayloadError, ProposedConnection, ProposedDevice,
    SecurityFinding, Severity, ToolPayload, VlanAssignment, VlanCreation,
};
