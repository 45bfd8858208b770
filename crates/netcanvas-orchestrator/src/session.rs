//! The approval workflow for one conversation.
//!
//! A session holds at most one item awaiting approval. Each completed turn
//! surfaces at most one new item, chosen by precedence: device batch, single
//! device, single connection/VLAN change, then change proposal. Nothing
//! reaches the topology registry except through [`ApprovalSession::approve`].

use chrono::Utc;
use netcanvas_abstraction::{CommitReceipt, TopologyRegistry, TopologySnapshot};
use netcanvas_stream::StreamTurn;
use rand::Rng;
use std::path::Path;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::config::{PipelineConfig, PipelineConfigLoader};
use crate::error::{ApprovalError, Result};
use crate::events::{
    Notice, PendingApproval, PendingBatch, PendingChange, PendingDevice, PendingProposal, TurnOutcome,
};
use crate::resolver::{resolve_turn, Resolution};

/// Pending-approval state for one conversation.
#[derive(Debug, Default)]
pub struct ApprovalSession {
    config: PipelineConfig,
    pending: Option<PendingApproval>,
    turn_input: Option<String>,
    replaced: Option<PendingApproval>,
}

impl ApprovalSession {
    #[must_use]
    pub fn new(config: PipelineConfig) -> Self {
        Self { config, pending: None, turn_input: None, replaced: None }
    }

    /// Builds a session from a pipeline configuration file.
    pub fn from_config_file(path: &Path) -> Result<Self> {
        Ok(Self::new(PipelineConfigLoader::load(path)?))
    }

    #[must_use]
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// The item awaiting approval, if any.
    #[must_use]
    pub fn pending(&self) -> Option<&PendingApproval> {
        self.pending.as_ref()
    }

    /// Starts a turn for `user_input`.
    ///
    /// Any outstanding item is discarded; the next [`TurnOutcome`] reports it
    /// as [`Notice::PendingReplaced`].
    pub fn begin_turn(&mut self, user_input: impl Into<String>) {
        if let Some(previous) = self.pending.take() {
            warn!(
                discarded_id = previous.id(),
                kind = previous.kind_name(),
                "New turn replaces pending approval"
            );
            self.replaced = Some(previous);
        }
        self.turn_input = Some(user_input.into());
    }

    /// Finishes the current turn with what the stream produced.
    ///
    /// An interrupted stream marks the turn failed and hands back the user's
    /// input; invocations that completed before the interruption are still
    /// resolved and may surface an item.
    pub fn complete_turn<R: Rng + ?Sized>(
        &mut self,
        turn: StreamTurn,
        snapshot: &TopologySnapshot,
        rng: &mut R,
    ) -> TurnOutcome {
        let input = self.turn_input.take();
        let mut notices = Vec::new();

        if let Some(previous) = self.replaced.take() {
            notices.push(Notice::PendingReplaced {
                discarded_id: previous.id().to_string(),
                discarded_kind: previous.kind_name().to_string(),
            });
        }

        let failed = turn.interruption.is_some();
        if let Some(e) = &turn.interruption {
            notices.push(Notice::TurnFailed { error: e.to_string(), dropped_blocks: turn.summary.dropped_blocks.len() });
        }

        let resolution = resolve_turn(&turn.text, &turn.invocations, snapshot, &self.config, rng);
        let pending = surface(resolution, &turn.text, &mut notices);

        if let Some(surfaced) = &pending {
            // Only reachable when complete_turn runs without begin_turn.
            if let Some(previous) = self.pending.replace(surfaced.clone()) {
                warn!(discarded_id = previous.id(), "Completed turn replaces pending approval");
                notices.push(Notice::PendingReplaced {
                    discarded_id: previous.id().to_string(),
                    discarded_kind: previous.kind_name().to_string(),
                });
            }
        }

        let outcome = TurnOutcome {
            text: turn.text,
            pending,
            notices,
            failed,
            restored_input: if failed { input } else { None },
        };
        info!(
            outcome = ?outcome.kind(),
            notices = outcome.notices.len(),
            failed,
            "Turn completed"
        );
        outcome
    }

    /// Commits the pending item named `id`.
    ///
    /// The reviewed data is committed as is; nothing is re-validated against
    /// the registry's current state. On any error the item stays pending.
    pub fn approve(
        &mut self,
        id: &str,
        registry: &mut dyn TopologyRegistry,
    ) -> std::result::Result<CommitReceipt, ApprovalError> {
        let pending = self.expect_pending(id)?;

        if let PendingApproval::Proposal(p) = pending {
            if !p.proposal.is_approvable() {
                return Err(ApprovalError::Blocked { reasons: p.proposal.blocking_reasons() });
            }
        }

        let mutation = pending.to_mutation();
        let receipt = registry.commit(mutation).map_err(|e| {
            error!(pending_id = id, error = %e, "Registry rejected approved change");
            ApprovalError::Registry(e)
        })?;

        if let Some(done) = self.pending.take() {
            info!(pending_id = done.id(), kind = done.kind_name(), created = receipt.created.len(), "Approved");
        }
        Ok(receipt)
    }

    /// Discards the pending item named `id` without committing anything.
    pub fn decline(&mut self, id: &str) -> std::result::Result<PendingApproval, ApprovalError> {
        self.expect_pending(id)?;
        let declined = self.pending.take().ok_or(ApprovalError::NothingPending)?;
        info!(pending_id = declined.id(), kind = declined.kind_name(), "Declined");
        Ok(declined)
    }

    fn expect_pending(&self, id: &str) -> std::result::Result<&PendingApproval, ApprovalError> {
        let pending = self.pending.as_ref().ok_or(ApprovalError::NothingPending)?;
        if pending.id() == id {
            Ok(pending)
        } else {
            Err(ApprovalError::NotPending { requested: id.to_string(), pending: pending.id().to_string() })
        }
    }
}

/// Applies outcome precedence, returning the surfaced item.
fn surface(resolution: Resolution, text: &str, notices: &mut Vec<Notice>) -> Option<PendingApproval> {
    let Resolution { mut devices, mut changes, proposal, notices: resolved_notices } = resolution;
    notices.extend(resolved_notices);

    let id = Uuid::new_v4().to_string();
    let timestamp = Utc::now();
    let message_text = text.to_string();

    let surfaced = if devices.len() > 1 {
        PendingApproval::Batch(PendingBatch { id, suggestions: devices, message_text, timestamp })
    } else if let Some(suggestion) = devices.pop() {
        PendingApproval::Device(PendingDevice { id, suggestion, message_text, timestamp })
    } else if !changes.is_empty() {
        let change = changes.remove(0);
        PendingApproval::Change(PendingChange { id, change, message_text, timestamp })
    } else if let Some(proposal) = proposal {
        return Some(PendingApproval::Proposal(PendingProposal { id, proposal, message_text, timestamp }));
    } else {
        return None;
    };

    let reason = format!("a {} was surfaced in the same reply", surfaced.kind_name());
    for change in changes {
        notices.push(Notice::Skipped {
            invocation_id: Some(change.invocation_id),
            tool: change.tool.tool_name().to_string(),
            reason: reason.clone(),
        });
    }
    if let Some(proposal) = proposal {
        warn!(summary = %proposal.summary, "Change proposal not surfaced; reply also carried suggestions");
        notices.push(Notice::Skipped { invocation_id: None, tool: "change_proposal".to_string(), reason });
    }

    Some(surfaced)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::OutcomeKind;
    use netcanvas_abstraction::{Device, DeviceType, InMemoryTopology, TopologyError, TopologyMutation};
    use netcanvas_stream::{StreamError, ToolInvocation};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use serde_json::json;

    fn registry() -> InMemoryTopology {
        InMemoryTopology::new(TopologySnapshot::with_devices(vec![
            Device::new("sw1", "SW-1", DeviceType::Switch).with_position(400.0, 400.0),
        ]))
    }

    fn turn(text: &str, invocations: Vec<ToolInvocation>) -> StreamTurn {
        StreamTurn { text: text.to_string(), invocations, ..StreamTurn::default() }
    }

    fn add_device(id: &str, name: &str) -> ToolInvocation {
        ToolInvocation::new(
            id,
            "suggest_device_addition",
            json!({"device": {"name": name, "type": "ap"}, "connections": [{"toDeviceName": "SW-1"}], "reasoning": "r", "confidence": "medium"}),
        )
    }

    fn run(session: &mut ApprovalSession, registry: &InMemoryTopology, t: StreamTurn) -> TurnOutcome {
        session.begin_turn("add stuff");
        session.complete_turn(t, &registry.snapshot(), &mut StdRng::seed_from_u64(9))
    }

    #[test]
    fn test_single_device_approve_commits_position_and_link() {
        let mut reg = registry();
        let mut session = ApprovalSession::default();
        let outcome = run(&mut session, &reg, turn("Adding AP", vec![add_device("t1", "AP-1")]));
        assert_eq!(outcome.kind(), OutcomeKind::SingleDevice);

        let id = outcome.pending.as_ref().unwrap().id().to_string();
        let receipt = session.approve(&id, &mut reg).unwrap();
        assert_eq!(receipt.created.len(), 2);
        assert!(session.pending().is_none());

        let ap = reg.state().device_by_name("AP-1").unwrap();
        assert!(ap.position.is_some());
        assert_eq!(reg.state().connections.len(), 1);
    }

    #[test]
    fn test_multiple_devices_form_one_batch() {
        let reg = registry();
        let mut session = ApprovalSession::default();
        let outcome = run(
            &mut session,
            &reg,
            turn("", vec![add_device("t1", "AP-1"), add_device("t2", "AP-2")]),
        );
        let Some(PendingApproval::Batch(batch)) = &outcome.pending else { panic!("expected batch") };
        assert_eq!(batch.suggestions.len(), 2);
        assert_eq!(outcome.kind(), OutcomeKind::Batch);
    }

    #[test]
    fn test_batch_outranks_other_suggestions() {
        let reg = registry();
        let mut session = ApprovalSession::default();
        let text = "```json\n{\"action\":\"propose_changes\",\"deviceIds\":[\"sw1\"],\"updates\":{\"status\":\"online\"},\"summary\":\"s\"}\n```";
        let outcome = run(
            &mut session,
            &reg,
            turn(
                text,
                vec![
                    add_device("t1", "AP-1"),
                    ToolInvocation::new("t2", "suggest_vlan_creation", json!({"vlanId": 20, "name": "voice", "reasoning": "r", "confidence": "medium"})),
                    add_device("t3", "AP-2"),
                ],
            ),
        );
        assert_eq!(outcome.kind(), OutcomeKind::Batch);
        let skipped: Vec<_> = outcome.notices.iter().filter(|n| matches!(n, Notice::Skipped { .. })).collect();
        assert_eq!(skipped.len(), 2);
    }

    #[test]
    fn test_new_turn_replaces_pending() {
        let reg = registry();
        let mut session = ApprovalSession::default();
        let first = run(&mut session, &reg, turn("", vec![add_device("t1", "AP-1")]));
        let first_id = first.pending.unwrap().id().to_string();

        let second = run(&mut session, &reg, turn("just chatting", vec![]));
        assert_eq!(second.kind(), OutcomeKind::Message);
        assert!(matches!(
            &second.notices[0],
            Notice::PendingReplaced { discarded_id, .. } if *discarded_id == first_id
        ));
        assert!(session.pending().is_none());
    }

    #[test]
    fn test_blocked_proposal_stays_pending() {
        let mut reg = registry();
        let mut session = ApprovalSession::default();
        let text = "```json\n{\"action\":\"propose_changes\",\"deviceIds\":[\"sw1\",\"ghost\"],\"updates\":{\"status\":\"online\"},\"summary\":\"s\"}\n```";
        let outcome = run(&mut session, &reg, turn(text, vec![]));
        assert_eq!(outcome.kind(), OutcomeKind::Proposal);
        let id = outcome.pending.unwrap().id().to_string();

        let err = session.approve(&id, &mut reg).unwrap_err();
        assert!(matches!(err, ApprovalError::Blocked { ref reasons } if reasons[0].contains("ghost")));
        assert!(session.pending().is_some());
        assert!(session.decline(&id).is_ok());
        assert!(session.pending().is_none());
    }

    #[test]
    fn test_interrupted_turn_restores_input_and_keeps_completed_work() {
        let reg = registry();
        let mut session = ApprovalSession::default();
        session.begin_turn("add an AP near SW-1");
        let mut t = turn("Sure", vec![add_device("t1", "AP-1")]);
        t.interruption = Some(StreamError::Transport("reset".to_string()));
        let outcome = session.complete_turn(t, &reg.snapshot(), &mut StdRng::seed_from_u64(1));

        assert!(outcome.failed);
        assert_eq!(outcome.restored_input.as_deref(), Some("add an AP near SW-1"));
        assert_eq!(outcome.kind(), OutcomeKind::SingleDevice);
        assert!(outcome.notices.iter().any(Notice::is_error));
    }

    #[test]
    fn test_approve_wrong_id_and_nothing_pending() {
        let mut reg = registry();
        let mut session = ApprovalSession::default();
        assert!(matches!(session.approve("x", &mut reg), Err(ApprovalError::NothingPending)));

        run(&mut session, &reg, turn("", vec![add_device("t1", "AP-1")]));
        assert!(matches!(session.approve("x", &mut reg), Err(ApprovalError::NotPending { .. })));
        assert!(matches!(session.decline("x"), Err(ApprovalError::NotPending { .. })));
    }

    struct RejectingRegistry(TopologySnapshot);

    impl TopologyRegistry for RejectingRegistry {
        fn snapshot(&self) -> TopologySnapshot {
            self.0.clone()
        }

        fn commit(&mut self, _mutation: TopologyMutation) -> netcanvas_abstraction::Result<CommitReceipt> {
            Err(TopologyError::Rejected("read-only".to_string()))
        }
    }

    #[test]
    fn test_registry_rejection_keeps_pending() {
        let reg = registry();
        let mut session = ApprovalSession::default();
        let outcome = run(&mut session, &reg, turn("", vec![add_device("t1", "AP-1")]));
        let id = outcome.pending.unwrap().id().to_string();

        let mut rejecting = RejectingRegistry(reg.snapshot());
        let err = session.approve(&id, &mut rejecting).unwrap_err();
        assert!(matches!(err, ApprovalError::Registry(TopologyError::Rejected(_))));
        assert_eq!(session.pending().map(PendingApproval::id), Some(id.as_str()));
    }
}
