// Turn outcomes and pending approvals
//
// Everything the chat surface is told after a turn completes. Serialized
// with a `kind` tag so a UI can switch on it.

use chrono::{DateTime, Utc};
use netcanvas_abstraction::{Device, DeviceStatus, NewDevice, TopologyMutation};
use serde::{Deserialize, Serialize};

use crate::placement::PlacementResult;
use crate::proposal::ChangeProposal;
use crate::tools::{Confidence, DeviceSuggestion, SecurityFinding, ToolKind};

/// A device suggestion together with where it will be placed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacedSuggestion {
    /// Tool invocation the suggestion came from.
    pub invocation_id: String,
    pub suggestion: DeviceSuggestion,
    pub placement: PlacementResult,
}

impl PlacedSuggestion {
    /// The registry input for this suggestion, position included.
    #[must_use]
    pub fn to_new_device(&self) -> NewDevice {
        let proposed = &self.suggestion.device;
        let device = Device {
            id: String::new(),
            name: proposed.name.trim().to_string(),
            device_type: proposed.device_type,
            ip: proposed.ip.clone(),
            mac: proposed.mac.clone(),
            status: DeviceStatus::Unknown,
            hardware: proposed.hardware.clone(),
            vlans: proposed.vlans.clone(),
            building_id: proposed.building_id.clone(),
            floor: proposed.floor,
            notes: proposed.notes.clone(),
            position: Some(self.placement.position()),
        };
        NewDevice {
            device,
            links: self.suggestion.connections.iter().cloned().map(Into::into).collect(),
        }
    }
}

/// A non-device suggestion resolved against the snapshot into a registry write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedChange {
    pub invocation_id: String,
    pub tool: ToolKind,
    /// One-line description for the approval prompt.
    pub description: String,
    pub reasoning: String,
    pub confidence: Confidence,
    pub mutation: TopologyMutation,
}

/// One device awaiting approval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingDevice {
    pub id: String,
    pub suggestion: PlacedSuggestion,
    pub message_text: String,
    pub timestamp: DateTime<Utc>,
}

/// Several devices from one turn, approved or declined together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingBatch {
    pub id: String,
    pub suggestions: Vec<PlacedSuggestion>,
    pub message_text: String,
    pub timestamp: DateTime<Utc>,
}

/// A connection or VLAN change awaiting approval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingChange {
    pub id: String,
    pub change: ResolvedChange,
    pub message_text: String,
    pub timestamp: DateTime<Utc>,
}

/// A field-update proposal awaiting approval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingProposal {
    pub id: String,
    pub proposal: ChangeProposal,
    pub message_text: String,
    pub timestamp: DateTime<Utc>,
}

/// The single item a session holds for approval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PendingApproval {
    Device(PendingDevice),
    Batch(PendingBatch),
    Change(PendingChange),
    Proposal(PendingProposal),
}

impl PendingApproval {
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::Device(p) => &p.id,
            Self::Batch(p) => &p.id,
            Self::Change(p) => &p.id,
            Self::Proposal(p) => &p.id,
        }
    }

    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Device(_) => "device",
            Self::Batch(_) => "batch",
            Self::Change(_) => "change",
            Self::Proposal(_) => "proposal",
        }
    }

    /// The registry write approving this item performs.
    #[must_use]
    pub fn to_mutation(&self) -> TopologyMutation {
        match self {
            Self::Device(p) => TopologyMutation::AddDevices { devices: vec![p.suggestion.to_new_device()] },
            Self::Batch(p) => TopologyMutation::AddDevices {
                devices: p.suggestions.iter().map(PlacedSuggestion::to_new_device).collect(),
            },
            Self::Change(p) => p.change.mutation.clone(),
            Self::Proposal(p) => p.proposal.to_mutation(),
        }
    }
}

/// Informational or error messages produced by a turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum Notice {
    /// A suggested entity is already in the topology or earlier in the turn.
    AlreadyExists {
        invocation_id: String,
        subject: String,
        /// Id of the existing entity; `None` when the duplicate is within the turn.
        existing_id: Option<String>,
        matched_on: String,
    },
    /// A tool input failed structural or field validation.
    Malformed { invocation_id: String, tool: String, reasons: Vec<String> },
    /// The model called a tool outside the catalogue.
    UnknownTool { invocation_id: String, tool: String },
    /// A suggestion referenced entities that do not exist.
    Unresolvable { invocation_id: String, tool: String, reason: String },
    /// Security observation; never approved or applied.
    SecurityFinding { invocation_id: String, finding: SecurityFinding },
    /// The model asked for a file import instead of individual suggestions.
    ImportRequested { invocation_id: String, reason: String, format: Option<String> },
    /// A valid suggestion lost to a higher-priority outcome in the same turn.
    Skipped { invocation_id: Option<String>, tool: String, reason: String },
    /// The previous pending item was discarded by a new turn.
    PendingReplaced { discarded_id: String, discarded_kind: String },
    /// The stream ended with an error.
    TurnFailed { error: String, dropped_blocks: usize },
}

impl Notice {
    /// Whether the notice reports a failure rather than information.
    #[must_use]
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Malformed { .. } | Self::Unresolvable { .. } | Self::TurnFailed { .. })
    }

    /// Human-readable one-liner.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::AlreadyExists { subject, existing_id: Some(id), matched_on, .. } => {
                format!("{} already exists (matched {} with {})", subject, matched_on, id)
            }
            Self::AlreadyExists { subject, existing_id: None, .. } => {
                format!("{} was suggested more than once in this reply", subject)
            }
            Self::Malformed { tool, reasons, .. } => format!("Ignored malformed {}: {}", tool, reasons.join("; ")),
            Self::UnknownTool { tool, .. } => format!("Ignored unknown tool '{}'", tool),
            Self::Unresolvable { tool, reason, .. } => format!("Cannot apply {}: {}", tool, reason),
            Self::SecurityFinding { finding, .. } => {
                format!("[{:?}] {}: {}", finding.severity, finding.title, finding.description)
            }
            Self::ImportRequested { reason, .. } => format!("Import suggested: {}", reason),
            Self::Skipped { tool, reason, .. } => format!("Not surfaced {}: {}", tool, reason),
            Self::PendingReplaced { discarded_id, discarded_kind } => {
                format!("Discarded pending {} {}", discarded_kind, discarded_id)
            }
            Self::TurnFailed { error, .. } => format!("Response interrupted: {}", error),
        }
    }
}

/// What the user is shown once a turn completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeKind {
    SingleDevice,
    Batch,
    Change,
    Proposal,
    /// Plain assistant text with nothing to approve.
    Message,
    /// No text and nothing to approve; only notices.
    Notice,
}

/// Result of completing one conversational turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnOutcome {
    pub text: String,
    /// Newly surfaced item, now held by the session.
    pub pending: Option<PendingApproval>,
    pub notices: Vec<Notice>,
    pub failed: bool,
    /// The user's input for this turn, returned when the turn failed.
    pub restored_input: Option<String>,
}

impl TurnOutcome {
    #[must_use]
    pub fn kind(&self) -> OutcomeKind {
        match &self.pending {
            Some(PendingApproval::Device(_)) => OutcomeKind::SingleDevice,
            Some(PendingApproval::Batch(_)) => OutcomeKind::Batch,
            Some(PendingApproval::Change(_)) => OutcomeKind::Change,
            Some(PendingApproval::Proposal(_)) => OutcomeKind::Proposal,
            None if !self.text.trim().is_empty() => OutcomeKind::Message,
            None => OutcomeKind::Notice,
        }
    }
}
