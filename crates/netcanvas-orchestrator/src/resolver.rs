//! Turns a turn's tool invocations into surfaced candidates and notices.
//!
//! Resolution is a pure function of the invocations, the assistant text, the
//! snapshot and the random source used for placement.

use netcanvas_abstraction::{normalize_name, Connection, TopologyMutation, TopologySnapshot};
use netcanvas_stream::ToolInvocation;
use rand::Rng;
use std::collections::HashSet;
use tracing::{debug, warn};

use crate::config::PipelineConfig;
use crate::events::{Notice, PlacedSuggestion, ResolvedChange};
use crate::matcher::find_existing;
use crate::placement::PlacementEngine;
use crate::proposal::{extract_proposal, ChangeProposal};
use crate::tools::{
    ConnectionAddition, ConnectionModification, ConnectionRemoval, ConnectionSelector, DeviceSuggestion,
    PayloadError, ToolKind, ToolPayload, VlanAssignment, VlanCreation,
};

/// Everything a turn produced, before outcome precedence is applied.
#[derive(Debug, Clone, Default)]
pub struct Resolution {
    /// New, non-duplicate devices in invocation order, already placed.
    pub devices: Vec<PlacedSuggestion>,
    /// Connection and VLAN changes in invocation order.
    pub changes: Vec<ResolvedChange>,
    pub proposal: Option<ChangeProposal>,
    pub notices: Vec<Notice>,
}

/// Resolves a completed turn against `snapshot`.
pub fn resolve_turn<R: Rng + ?Sized>(
    text: &str,
    invocations: &[ToolInvocation],
    snapshot: &TopologySnapshot,
    config: &PipelineConfig,
    rng: &mut R,
) -> Resolution {
    let mut resolution = Resolution::default();
    let mut accepted: Vec<(String, DeviceSuggestion)> = Vec::new();
    let mut seen_names: HashSet<String> = HashSet::new();

    for invocation in invocations {
        let payload = match ToolPayload::parse(invocation) {
            Ok(payload) => payload,
            Err(PayloadError::UnknownTool(tool)) => {
                warn!(tool = %tool, invocation_id = %invocation.id, "Ignoring unknown tool");
                resolution.notices.push(Notice::UnknownTool { invocation_id: invocation.id.clone(), tool });
                continue;
            }
            Err(PayloadError::Malformed { tool, reasons }) => {
                debug!(tool = %tool, invocation_id = %invocation.id, ?reasons, "Malformed tool input");
                resolution.notices.push(Notice::Malformed { invocation_id: invocation.id.clone(), tool, reasons });
                continue;
            }
        };

        let id = invocation.id.clone();
        match payload {
            ToolPayload::DeviceAddition(suggestion) => {
                let name = suggestion.device.name.trim().to_string();
                if let Some((existing, reason)) = find_existing(&suggestion.device, snapshot) {
                    resolution.notices.push(Notice::AlreadyExists {
                        invocation_id: id,
                        subject: format!("Device '{}'", name),
                        existing_id: Some(existing.id.clone()),
                        matched_on: reason.as_str().to_string(),
                    });
                } else if !seen_names.insert(normalize_name(&name)) {
                    resolution.notices.push(Notice::AlreadyExists {
                        invocation_id: id,
                        subject: format!("Device '{}'", name),
                        existing_id: None,
                        matched_on: "name".to_string(),
                    });
                } else {
                    accepted.push((id, suggestion));
                }
            }
            ToolPayload::ConnectionAddition(add) => push(&mut resolution, resolve_connection_addition(id, add, snapshot)),
            ToolPayload::ConnectionModification(m) => {
                push(&mut resolution, resolve_connection_modification(id, m, snapshot));
            }
            ToolPayload::ConnectionRemoval(r) => push(&mut resolution, resolve_connection_removal(id, r, snapshot)),
            ToolPayload::VlanCreation(v) => push(&mut resolution, resolve_vlan_creation(id, v, snapshot)),
            ToolPayload::VlanAssignment(v) => push(&mut resolution, resolve_vlan_assignment(id, v, snapshot)),
            ToolPayload::SecurityFinding(finding) => {
                resolution.notices.push(Notice::SecurityFinding { invocation_id: id, finding });
            }
            ToolPayload::ImportRequest(request) => {
                resolution.notices.push(Notice::ImportRequested {
                    invocation_id: id,
                    reason: request.reason,
                    format: request.format,
                });
            }
        }
    }

    drop_dangling_links(&mut accepted, &seen_names, snapshot, &mut resolution.notices);

    let engine = PlacementEngine::new(config.placement.clone());
    let placements = engine.place_all(
        accepted.iter().map(|(_, s)| (&s.device, s.connections.as_slice())),
        snapshot,
        rng,
    );
    resolution.devices = accepted
        .into_iter()
        .zip(placements)
        .map(|((invocation_id, suggestion), placement)| PlacedSuggestion { invocation_id, suggestion, placement })
        .collect();

    resolution.proposal = extract_proposal(text, snapshot, &config.proposal);
    resolution
}

/// Removes connections whose target is neither in the snapshot nor suggested
/// in the same turn; a commit would otherwise fail on them.
fn drop_dangling_links(
    accepted: &mut [(String, DeviceSuggestion)],
    batch_names: &HashSet<String>,
    snapshot: &TopologySnapshot,
    notices: &mut Vec<Notice>,
) {
    for (invocation_id, suggestion) in accepted.iter_mut() {
        suggestion.connections.retain(|c| {
            let known = snapshot.device_by_name(&c.to_device_name).is_some()
                || batch_names.contains(&normalize_name(&c.to_device_name));
            if !known {
                notices.push(unresolvable(
                    invocation_id.clone(),
                    ToolKind::DeviceAddition,
                    format!("no device named '{}'; link dropped", c.to_device_name.trim()),
                ));
            }
            known
        });
    }
}

fn push(resolution: &mut Resolution, result: Result<ResolvedChange, Notice>) {
    match result {
        Ok(change) => resolution.changes.push(change),
        Err(notice) => resolution.notices.push(notice),
    }
}

fn unresolvable(invocation_id: String, kind: ToolKind, reason: String) -> Notice {
    Notice::Unresolvable { invocation_id, tool: kind.tool_name().to_string(), reason }
}

fn device_id(snapshot: &TopologySnapshot, name: &str) -> Result<String, String> {
    snapshot.device_by_name(name).map(|d| d.id.clone()).ok_or_else(|| format!("no device named '{}'", name.trim()))
}

fn select_connection<'a>(selector: &ConnectionSelector, snapshot: &'a TopologySnapshot) -> Result<&'a Connection, String> {
    if let Some(id) = selector.connection_id.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        return snapshot.connection(id).ok_or_else(|| format!("no connection with id '{}'", id));
    }
    let from = device_id(snapshot, selector.from_device_name.as_deref().unwrap_or_default())?;
    let to = device_id(snapshot, selector.to_device_name.as_deref().unwrap_or_default())?;
    snapshot.connection_between(&from, &to).ok_or_else(|| {
        format!(
            "no connection between '{}' and '{}'",
            selector.from_device_name.as_deref().unwrap_or_default(),
            selector.to_device_name.as_deref().unwrap_or_default()
        )
    })
}

fn describe_connection(connection: &Connection, snapshot: &TopologySnapshot) -> String {
    let name = |id: &str| snapshot.device(id).map_or_else(|| id.to_string(), |d| d.name.clone());
    format!("{} <-> {}", name(&connection.from_device_id), name(&connection.to_device_id))
}

fn resolve_connection_addition(
    invocation_id: String,
    add: ConnectionAddition,
    snapshot: &TopologySnapshot,
) -> Result<ResolvedChange, Notice> {
    let kind = ToolKind::ConnectionAddition;
    let ends = device_id(snapshot, &add.from_device_name).and_then(|from| Ok((from, device_id(snapshot, &add.to_device_name)?)));
    let (from, to) = match ends {
        Ok(ends) => ends,
        Err(reason) => return Err(unresolvable(invocation_id, kind, reason)),
    };

    if let Some(existing) = snapshot.connection_between(&from, &to) {
        return Err(Notice::AlreadyExists {
            invocation_id,
            subject: format!("Connection {} <-> {}", add.from_device_name.trim(), add.to_device_name.trim()),
            existing_id: Some(existing.id.clone()),
            matched_on: "endpoints".to_string(),
        });
    }

    Ok(ResolvedChange {
        invocation_id,
        tool: kind,
        description: format!("Connect {} to {}", add.from_device_name.trim(), add.to_device_name.trim()),
        reasoning: add.reasoning,
        confidence: add.confidence,
        mutation: TopologyMutation::AddConnection { from_device_id: from, to_device_id: to, spec: add.spec },
    })
}

fn resolve_connection_modification(
    invocation_id: String,
    modification: ConnectionModification,
    snapshot: &TopologySnapshot,
) -> Result<ResolvedChange, Notice> {
    let kind = ToolKind::ConnectionModification;
    let connection = select_connection(&modification.target, snapshot)
        .map_err(|reason| unresolvable(invocation_id.clone(), kind, reason))?;
    let updates = modification.changes.to_updates();
    let fields: Vec<&str> = updates.keys().map(String::as_str).collect();

    Ok(ResolvedChange {
        description: format!("Update {} ({})", describe_connection(connection, snapshot), fields.join(", ")),
        mutation: TopologyMutation::UpdateConnection { connection_id: connection.id.clone(), updates },
        invocation_id,
        tool: kind,
        reasoning: modification.reasoning,
        confidence: modification.confidence,
    })
}

fn resolve_connection_removal(
    invocation_id: String,
    removal: ConnectionRemoval,
    snapshot: &TopologySnapshot,
) -> Result<ResolvedChange, Notice> {
    let kind = ToolKind::ConnectionRemoval;
    let connection = select_connection(&removal.target, snapshot)
        .map_err(|reason| unresolvable(invocation_id.clone(), kind, reason))?;

    Ok(ResolvedChange {
        description: format!("Remove {}", describe_connection(connection, snapshot)),
        mutation: TopologyMutation::RemoveConnection { connection_id: connection.id.clone() },
        invocation_id,
        tool: kind,
        reasoning: removal.reasoning,
        confidence: removal.confidence,
    })
}

fn resolve_vlan_creation(
    invocation_id: String,
    vlan: VlanCreation,
    snapshot: &TopologySnapshot,
) -> Result<ResolvedChange, Notice> {
    if let Some(existing) = snapshot.vlan_by_number(vlan.vlan_id) {
        return Err(Notice::AlreadyExists {
            invocation_id,
            subject: format!("VLAN {}", vlan.vlan_id),
            existing_id: Some(existing.id.clone()),
            matched_on: "vlan_id".to_string(),
        });
    }

    Ok(ResolvedChange {
        invocation_id,
        tool: ToolKind::VlanCreation,
        description: format!("Create VLAN {} ({})", vlan.vlan_id, vlan.name.trim()),
        reasoning: vlan.reasoning,
        confidence: vlan.confidence,
        mutation: TopologyMutation::CreateVlan {
            vlan_id: vlan.vlan_id,
            name: vlan.name.trim().to_string(),
            subnet: vlan.subnet,
            description: vlan.description,
        },
    })
}

fn resolve_vlan_assignment(
    invocation_id: String,
    assignment: VlanAssignment,
    snapshot: &TopologySnapshot,
) -> Result<ResolvedChange, Notice> {
    let kind = ToolKind::VlanAssignment;
    let Some(device) = snapshot.device_by_name(&assignment.device_name) else {
        return Err(unresolvable(invocation_id, kind, format!("no device named '{}'", assignment.device_name.trim())));
    };

    let mut new_ids: Vec<u16> = Vec::new();
    for vlan in assignment.vlan_ids {
        if !device.vlans.contains(&vlan) && !new_ids.contains(&vlan) {
            new_ids.push(vlan);
        }
    }
    if new_ids.is_empty() {
        return Err(Notice::AlreadyExists {
            invocation_id,
            subject: format!("VLAN assignment on '{}'", device.name),
            existing_id: Some(device.id.clone()),
            matched_on: "vlans".to_string(),
        });
    }

    let listed: Vec<String> = new_ids.iter().map(u16::to_string).collect();
    Ok(ResolvedChange {
        invocation_id,
        tool: kind,
        description: format!("Assign VLAN {} to {}", listed.join(", "), device.name),
        reasoning: assignment.reasoning,
        confidence: assignment.confidence,
        mutation: TopologyMutation::AssignVlans { device_id: device.id.clone(), vlan_ids: new_ids },
    })
}
