//! Change proposals: field-level updates to existing devices.
//!
//! A proposal is extracted from assistant text ([`parser`]), its values are
//! checked field by field ([`validator`]) and it is diffed against the
//! snapshot it was made against ([`diff`]). Everything shown to the user is a
//! deterministic function of the request and that snapshot.

pub mod diff;
pub mod parser;
pub mod validator;

use netcanvas_abstraction::{DeviceUpdate, TopologyMutation, TopologySnapshot, UpdateMap};
use serde::{Deserialize, Serialize};

use crate::config::ProposalConfig;
pub use diff::{build_diff, derive_changes, diff_device, AffectedDevice, FieldChange, UnknownDevices};
pub use parser::{extract_request, ProposalRequest};
pub use validator::{validate, ValidationResult};

/// A reviewed set of field updates awaiting approval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeProposal {
    pub action: String,
    pub device_ids: Vec<String>,
    pub updates: UpdateMap,
    pub summary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
    pub affected_devices: Vec<AffectedDevice>,
    pub validation: ValidationResult,
    /// Requested ids absent from the snapshot; any entry blocks approval.
    #[serde(default)]
    pub missing_device_ids: Vec<String>,
}

impl ChangeProposal {
    /// Validates and diffs a request against `snapshot`.
    #[must_use]
    pub fn build(request: ProposalRequest, snapshot: &TopologySnapshot) -> Self {
        let validation = validate(&request.updates);
        let (affected_devices, missing_device_ids) = match build_diff(&request.device_ids, &request.updates, snapshot)
        {
            Ok(affected) => (affected, Vec::new()),
            Err(UnknownDevices { missing, resolved }) => (resolved, missing),
        };

        Self {
            action: request.action,
            device_ids: request.device_ids,
            updates: request.updates,
            summary: request.summary,
            reasoning: request.reasoning,
            affected_devices,
            validation,
            missing_device_ids,
        }
    }

    /// Whether the proposal may be committed.
    #[must_use]
    pub fn is_approvable(&self) -> bool {
        self.validation.valid && self.missing_device_ids.is_empty() && !self.affected_devices.is_empty()
    }

    /// Messages explaining why approval is blocked; empty when approvable.
    #[must_use]
    pub fn blocking_reasons(&self) -> Vec<String> {
        let mut reasons: Vec<String> =
            self.validation.errors.iter().map(|(path, message)| format!("{}: {}", path, message)).collect();
        reasons.extend(self.missing_device_ids.iter().map(|id| format!("unknown device '{}'", id)));
        if reasons.is_empty() && self.affected_devices.is_empty() {
            reasons.push("no devices to update".to_string());
        }
        reasons
    }

    /// The registry write for exactly the reviewed devices and updates.
    #[must_use]
    pub fn to_mutation(&self) -> TopologyMutation {
        TopologyMutation::UpdateDevices {
            updates: self
                .affected_devices
                .iter()
                .map(|a| DeviceUpdate { device_id: a.id.clone(), updates: self.updates.clone() })
                .collect(),
        }
    }
}

/// Extracts and builds the proposal embedded in `text`, if any.
pub fn extract_proposal(text: &str, snapshot: &TopologySnapshot, config: &ProposalConfig) -> Option<ChangeProposal> {
    extract_request(text, config).map(|request| ChangeProposal::build(request, snapshot))
}
