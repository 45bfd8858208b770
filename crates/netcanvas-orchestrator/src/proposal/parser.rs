//! Extraction of a change request embedded in assistant text.

use netcanvas_abstraction::UpdateMap;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::config::ProposalConfig;

static FENCED_BLOCK_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?ms)^[ \t]*```[^\n]*\n(.*?)^[ \t]*```[ \t]*\r?$").expect("Fenced block regex should be valid")
});

/// The structured part of a change proposal, as written by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposalRequest {
    pub action: String,
    #[serde(alias = "device_ids")]
    pub device_ids: Vec<String>,
    pub updates: UpdateMap,
    pub summary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawRequest {
    action: String,
    #[serde(alias = "device_ids")]
    device_ids: Vec<String>,
    updates: Map<String, Value>,
    summary: String,
    #[serde(default)]
    reasoning: Option<String>,
}

/// Returns the contents of every fenced block in `text`.
///
/// Fences must start a line; the opening fence may carry any info string.
fn fenced_blocks(text: &str) -> impl Iterator<Item = &str> {
    FENCED_BLOCK_REGEX.captures_iter(text).filter_map(|caps| caps.get(1)).map(|m| m.as_str())
}

/// Whether a block carries a recognized action tag.
fn declares_action(block: &Value, config: &ProposalConfig) -> bool {
    block.get("action").and_then(Value::as_str).is_some_and(|a| config.recognizes(a))
}

/// Finds the single proposal block in `text`.
///
/// Returns `None` when there is no qualifying block, when more than one block
/// declares a recognized action, or when the block lacks a non-empty device
/// list, a non-empty updates map or a summary.
pub fn extract_request(text: &str, config: &ProposalConfig) -> Option<ProposalRequest> {
    let mut candidates = fenced_blocks(text)
        .filter_map(|block| serde_json::from_str::<Value>(block.trim()).ok())
        .filter(|value| declares_action(value, config));

    let candidate = candidates.next()?;
    if candidates.next().is_some() {
        warn!("Several change proposals in one message; ignoring all of them");
        return None;
    }

    let raw: RawRequest = match serde_json::from_value(candidate) {
        Ok(raw) => raw,
        Err(e) => {
            debug!(error = %e, "Proposal block is missing required fields");
            return None;
        }
    };

    let device_ids: Vec<String> =
        raw.device_ids.into_iter().map(|id| id.trim().to_string()).filter(|id| !id.is_empty()).collect();
    if device_ids.is_empty() || raw.updates.is_empty() || raw.summary.trim().is_empty() {
        debug!("Proposal block has no device ids, no updates or no summary");
        return None;
    }

    Some(ProposalRequest {
        action: raw.action,
        device_ids,
        updates: raw.updates.into_iter().collect(),
        summary: raw.summary,
        reasoning: raw.reasoning.filter(|r| !r.trim().is_empty()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn config() -> ProposalConfig {
        ProposalConfig::default()
    }

    #[test]
    fn test_extracts_json_fenced_block() {
        let text = "I'll bump the firmware.\n\n```json\n{\"action\":\"propose_changes\",\"deviceIds\":[\"sw1\"],\"updates\":{\"hardware.firmware.version\":\"2.1\"},\"summary\":\"Upgrade firmware\"}\n```\nLet me know.";
        let req = extract_request(text, &config()).unwrap();
        assert_eq!(req.device_ids, vec!["sw1".to_string()]);
        assert_eq!(req.updates.get("hardware.firmware.version"), Some(&json!("2.1")));
        assert_eq!(req.summary, "Upgrade firmware");
        assert_eq!(req.reasoning, None);
    }

    #[test]
    fn test_plain_fence_and_snake_case_ids() {
        let text = "```\n{\"action\":\"update_devices\",\"device_ids\":[\"a\",\" \"],\"updates\":{\"status\":\"online\"},\"summary\":\"s\",\"reasoning\":\"r\"}\n```";
        let req = extract_request(text, &config()).unwrap();
        assert_eq!(req.device_ids, vec!["a".to_string()]);
        assert_eq!(req.reasoning.as_deref(), Some("r"));
    }

    #[test]
    fn test_no_block_yields_none() {
        assert!(extract_request("Nothing structured here.", &config()).is_none());
    }

    #[test]
    fn test_unrecognized_action_is_ignored() {
        let text = "```json\n{\"action\":\"delete_devices\",\"deviceIds\":[\"a\"],\"updates\":{},\"summary\":\"s\"}\n```";
        assert!(extract_request(text, &config()).is_none());
    }

    #[test]
    fn test_missing_required_parts_yield_none() {
        for body in [
            r#"{"action":"propose_changes","deviceIds":[],"updates":{"name":"x"},"summary":"s"}"#,
            r#"{"action":"propose_changes","deviceIds":["a"],"summary":"s"}"#,
            r#"{"action":"propose_changes","deviceIds":["a"],"updates":{"name":"x"}}"#,
            r#"{"action":"propose_changes","deviceIds":["a"],"updates":{"name":"x"},"summary":"  "}"#,
            r#"{"action":"propose_changes","deviceIds":["a"],"updates":["name"],"summary":"s"}"#,
            r#"{"action":"propose_changes","deviceIds":["a"],"updates":{},"summary":"s"}"#,
        ] {
            let text = format!("```json\n{}\n```", body);
            assert!(extract_request(&text, &config()).is_none(), "accepted {}", body);
        }
    }

    #[test]
    fn test_two_proposals_are_ambiguous() {
        let block = "```json\n{\"action\":\"propose_changes\",\"deviceIds\":[\"a\"],\"updates\":{\"name\":\"x\"},\"summary\":\"s\"}\n```";
        let text = format!("{}\nand also\n{}", block, block);
        assert!(extract_request(&text, &config()).is_none());
    }

    #[test]
    fn test_unrelated_code_blocks_do_not_count() {
        let text = "Run this:\n```\nshow vlan brief\n```\n```json\n{\"action\":\"propose_changes\",\"deviceIds\":[\"a\"],\"updates\":{\"notes\":\"rack 4\"},\"summary\":\"Add note\"}\n```";
        assert!(extract_request(text, &config()).is_some());
    }

    #[test]
    fn test_tagged_command_block_before_proposal() {
        let text = "Check first:\n```bash\nshow version\n```\nThen apply:\n```json\n{\"action\":\"propose_changes\",\"deviceIds\":[\"a\"],\"updates\":{\"notes\":\"rack 4\"},\"summary\":\"Add note\"}\n```\n";
        let req = extract_request(text, &config()).unwrap();
        assert_eq!(req.updates.get("notes"), Some(&json!("rack 4")));
    }

    #[test]
    fn test_inline_backticks_do_not_open_a_block() {
        let text = "Use ```json``` blocks.\n```JSON\n{\"action\":\"propose_changes\",\"deviceIds\":[\"a\"],\"updates\":{\"floor\":2},\"summary\":\"Move\"}\n```";
        assert!(extract_request(text, &config()).is_some());
    }
}
