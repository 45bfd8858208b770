//! Suggestion resolution and approval for NetCanvas.
//!
//! This crate turns completed tool invocations and assistant text into
//! reviewable topology changes:
//!
//! - [`tools`]: the tool catalogue offered to the LLM and typed payload parsing
//! - [`matcher`]: duplicate detection against the current topology
//! - [`placement`]: non-overlapping canvas positions for new devices
//! - [`proposal`]: extraction, validation and diffing of field-update proposals
//! - [`session`]: the approve/decline workflow gating every registry write

pub mod config;
pub mod error;
pub mod events;
pub mod matcher;
pub mod placement;
pub mod proposal;
pub mod resolver;
pub mod session;
pub mod tools;
pub mod validation;

pub use config::{ConfigError, PipelineConfig, PipelineConfigLoader, PlacementConfig, ProposalConfig};
pub use error::{ApprovalError, PipelineError, Result};
pub use events::{
    Notice, OutcomeKind, PendingApproval, PendingBatch, PendingChange, PendingDevice, PendingProposal,
    PlacedSuggestion, ResolvedChange, TurnOutcome,
};
pub use matcher::{find_existing, MatchReason};
pub use placement::{PlacementEngine, PlacementResult, PlacementStrategy};
pub use proposal::{
    build_diff, derive_changes, extract_proposal, extract_request, validate, AffectedDevice, ChangeProposal,
    FieldChange, ProposalRequest, UnknownDevices, ValidationResult,
};
pub use resolver::{resolve_turn, Resolution};
pub use session::ApprovalSession;
pub use tools::{tool_definitions, DeviceSuggestion, PayloadError, ToolDefinition, ToolKind, ToolPayload};

pub use netcanvas_abstraction::{apply_nested_updates, get_path, set_path};
