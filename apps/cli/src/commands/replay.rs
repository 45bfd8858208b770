//! Replays a recorded LLM response through the suggestion pipeline.

use anyhow::{bail, Context, Result};
use bytes::Bytes;
use colored::*;
use futures::stream;
use netcanvas_abstraction::{CommitReceipt, InMemoryTopology, TopologyRegistry};
use netcanvas_orchestrator::{ApprovalSession, PipelineConfig, TurnOutcome};
use netcanvas_stream::{
    drive_stream, ProtocolEvent, SseEventStream, StreamError, StreamSink, StreamTurn, ToolInvocation,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::{print_json, read_topology, render, write_topology};

/// Options of `ncv replay`.
#[derive(Debug, Clone)]
pub struct ReplayOptions {
    pub events: PathBuf,
    pub topology: PathBuf,
    pub sse: bool,
    pub input: Option<String>,
    pub approve: bool,
    pub out: Option<PathBuf>,
    pub seed: Option<u64>,
    pub json: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ReplayReport {
    outcome: TurnOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    receipt: Option<CommitReceipt>,
}

/// Echoes assistant text as it streams in.
struct ConsoleSink {
    quiet: bool,
}

impl StreamSink for ConsoleSink {
    fn on_text(&mut self, _index: usize, text: &str) {
        if !self.quiet {
            eprint!("{}", text.dimmed());
        }
    }

    fn on_tool_invocation(&mut self, invocation: ToolInvocation) {
        debug!(id = %invocation.id, tool = %invocation.name, "Tool invocation completed");
    }
}

pub async fn execute(options: ReplayOptions, config: PipelineConfig) -> Result<()> {
    let snapshot = read_topology(&options.topology)?;
    let turn = read_turn(&options.events, options.sse, options.json).await?;

    let mut session = ApprovalSession::new(config);
    session.begin_turn(options.input.clone().unwrap_or_default());

    let mut rng = match options.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let outcome = session.complete_turn(turn, &snapshot, &mut rng);

    let receipt = if options.approve {
        let Some(pending) = session.pending() else {
            bail!("Nothing to approve: the replayed turn surfaced no suggestion");
        };
        let id = pending.id().to_string();

        let mut registry = InMemoryTopology::new(snapshot);
        let receipt = session.approve(&id, &mut registry).with_context(|| format!("Approval of {} failed", id))?;
        info!(pending_id = %id, "Approved replayed suggestion");

        if let Some(out) = &options.out {
            write_topology(out, &registry.snapshot())?;
        }
        Some(receipt)
    } else {
        None
    };

    if options.json {
        print_json(&ReplayReport { outcome, receipt })?;
    } else {
        render::render_outcome(&outcome);
        if let Some(receipt) = &receipt {
            println!();
            render::render_receipt(receipt);
            if let Some(out) = &options.out {
                println!("  {}", format!("written to {}", out.display()).dimmed());
            }
        }
    }

    Ok(())
}

async fn read_turn(path: &Path, sse: bool, quiet: bool) -> Result<StreamTurn> {
    let content = std::fs::read(path).with_context(|| format!("Failed to read events file {}", path.display()))?;
    let mut sink = ConsoleSink { quiet };

    let turn = if sse {
        let source = stream::iter(vec![Ok::<_, std::io::Error>(Bytes::from(content))]);
        drive_stream(SseEventStream::new(source), &mut sink).await
    } else {
        let text = String::from_utf8(content).context("Events file is not valid UTF-8")?;
        let events = parse_event_lines(&text)?;
        drive_stream(stream::iter(events), &mut sink).await
    };

    if !quiet && !turn.text.is_empty() {
        eprintln!();
    }
    Ok(turn)
}

/// Parses a JSONL recording into stream items.
///
/// A line of kind `transport_error` stands for the connection failing at
/// that point of the response.
pub fn parse_event_lines(text: &str) -> Result<Vec<std::result::Result<ProtocolEvent, StreamError>>> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| -> Result<std::result::Result<ProtocolEvent, StreamError>> {
            let value: Value =
                serde_json::from_str(line).with_context(|| format!("Line {}: not valid JSON", i + 1))?;
            if value.get("kind").and_then(Value::as_str) == Some("transport_error") {
                let message = value.get("message").and_then(Value::as_str).unwrap_or("connection lost");
                return Ok(Err(StreamError::Transport(message.to_string())));
            }
            let event = serde_json::from_value(value).with_context(|| format!("Line {}: not a protocol event", i + 1))?;
            Ok(Ok(event))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_event_lines_skips_blank_lines() {
        let text = "{\"kind\":\"text_delta\",\"index\":0,\"text\":\"hi\"}\n\n{\"kind\":\"block_stop\",\"index\":0}\n";
        let events = parse_event_lines(text).unwrap();
        assert_eq!(events, vec![Ok(ProtocolEvent::text(0, "hi")), Ok(ProtocolEvent::stop(0))]);
    }

    #[test]
    fn test_parse_event_lines_transport_error() {
        let events = parse_event_lines("{\"kind\":\"transport_error\",\"message\":\"reset\"}").unwrap();
        assert_eq!(events, vec![Err(StreamError::Transport("reset".to_string()))]);
    }

    #[test]
    fn test_parse_event_lines_reports_line_number() {
        let err = parse_event_lines("{\"kind\":\"block_stop\",\"index\":0}\nnot json").unwrap_err();
        assert!(err.to_string().contains("Line 2"));
    }
}
