//! Stream demultiplexer.
//!
//! Folds an ordered sequence of [`ProtocolEvent`]s into two outputs: live text
//! deltas, forwarded the moment they arrive, and completed
//! [`ToolInvocation`]s, emitted once their block has been closed.
//!
//! A demultiplexer instance lives for exactly one streamed response. Its
//! per-block accumulators and the set of already-emitted ids are never shared
//! across turns.

use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, error, trace, warn};

use crate::event::{BlockType, ProtocolEvent, ToolInvocation};

/// Receiver of demultiplexed output.
pub trait StreamSink {
    /// Called for every text delta, in arrival order, without buffering.
    fn on_text(&mut self, index: usize, text: &str);

    /// Called once per completed tool invocation.
    fn on_tool_invocation(&mut self, invocation: ToolInvocation);
}

/// One item of demultiplexed output, for channel- or vector-backed sinks.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamOutput {
    Text(String),
    Tool(ToolInvocation),
}

impl StreamSink for Vec<StreamOutput> {
    fn on_text(&mut self, _index: usize, text: &str) {
        self.push(StreamOutput::Text(text.to_string()));
    }

    fn on_tool_invocation(&mut self, invocation: ToolInvocation) {
        self.push(StreamOutput::Tool(invocation));
    }
}

impl StreamSink for UnboundedSender<StreamOutput> {
    fn on_text(&mut self, _index: usize, text: &str) {
        if self.send(StreamOutput::Text(text.to_string())).is_err() {
            trace!("Text receiver dropped");
        }
    }

    fn on_tool_invocation(&mut self, invocation: ToolInvocation) {
        if self.send(StreamOutput::Tool(invocation)).is_err() {
            trace!("Tool receiver dropped");
        }
    }
}

/// Sink that keeps the full text and every invocation.
#[derive(Debug, Clone, Default)]
pub struct CollectingSink {
    pub text: String,
    pub invocations: Vec<ToolInvocation>,
}

impl StreamSink for CollectingSink {
    fn on_text(&mut self, _index: usize, text: &str) {
        self.text.push_str(text);
    }

    fn on_tool_invocation(&mut self, invocation: ToolInvocation) {
        self.invocations.push(invocation);
    }
}

/// Forwards to two sinks in order.
pub struct TeeSink<'a, A: ?Sized, B: ?Sized> {
    pub first: &'a mut A,
    pub second: &'a mut B,
}

impl<A: StreamSink + ?Sized, B: StreamSink + ?Sized> StreamSink for TeeSink<'_, A, B> {
    fn on_text(&mut self, index: usize, text: &str) {
        self.first.on_text(index, text);
        self.second.on_text(index, text);
    }

    fn on_tool_invocation(&mut self, invocation: ToolInvocation) {
        self.first.on_tool_invocation(invocation.clone());
        self.second.on_tool_invocation(invocation);
    }
}

/// Partially received tool block.
#[derive(Debug, Clone)]
struct ToolAccumulator {
    id: String,
    name: String,
    partial_json: String,
    stopped: bool,
}

/// A tool block that never saw its `block_stop`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DroppedBlock {
    pub index: usize,
    pub id: String,
    pub name: String,
    pub buffered_bytes: usize,
}

/// Counters collected over one response.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DemuxStats {
    pub text_deltas: usize,
    pub invocations: usize,
    pub malformed_inputs: usize,
    pub duplicate_stops: usize,
    pub ignored_events: usize,
}

/// Final accounting returned by [`StreamDemultiplexer::finish`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DemuxSummary {
    pub stats: DemuxStats,
    pub dropped_blocks: Vec<DroppedBlock>,
}

/// Reconstructs tool invocations from chunked protocol events.
#[derive(Debug, Default)]
pub struct StreamDemultiplexer {
    accumulators: HashMap<usize, ToolAccumulator>,
    emitted: HashSet<String>,
    stats: DemuxStats,
}

impl StreamDemultiplexer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Processes one event, pushing any output into `sink`.
    ///
    /// Never fails: malformed input degrades to a logged error and an empty
    /// payload, unknown events are skipped.
    pub fn handle<S: StreamSink + ?Sized>(&mut self, event: ProtocolEvent, sink: &mut S) {
        match event {
            ProtocolEvent::TextDelta { index, text } => {
                self.stats.text_deltas += 1;
                sink.on_text(index, &text);
            }
            ProtocolEvent::BlockStart { index, block_type: BlockType::ToolUse, block_id, tool_name } => {
                let block_id = if block_id.trim().is_empty() {
                    let synthesized = format!("block-{}", index);
                    warn!(index, block_id = %synthesized, "Tool block has no id; keying it by index");
                    synthesized
                } else {
                    block_id
                };
                debug!(index, block_id = %block_id, tool = ?tool_name, "Tool block opened");
                let previous = self.accumulators.insert(
                    index,
                    ToolAccumulator {
                        id: block_id,
                        name: tool_name.unwrap_or_default(),
                        partial_json: String::new(),
                        stopped: false,
                    },
                );
                if let Some(prev) = previous.filter(|p| !p.stopped) {
                    warn!(index, block_id = %prev.id, "Tool block reopened before it was closed; discarding");
                }
            }
            ProtocolEvent::BlockStart { index, block_type, .. } => {
                trace!(index, ?block_type, "Non-tool block opened");
            }
            ProtocolEvent::JsonDelta { index, fragment } => match self.accumulators.get_mut(&index) {
                Some(acc) if !acc.stopped => acc.partial_json.push_str(&fragment),
                _ => {
                    self.stats.ignored_events += 1;
                    trace!(index, "JSON fragment for a block that is not an open tool block");
                }
            },
            ProtocolEvent::BlockStop { index } => self.close_block(index, sink),
            ProtocolEvent::Unknown => {
                self.stats.ignored_events += 1;
                trace!("Ignoring unknown protocol event");
            }
        }
    }

    fn close_block<S: StreamSink + ?Sized>(&mut self, index: usize, sink: &mut S) {
        let Some(acc) = self.accumulators.get_mut(&index) else {
            trace!(index, "Block stop for a non-tool block");
            return;
        };
        acc.stopped = true;

        if self.emitted.contains(&acc.id) {
            self.stats.duplicate_stops += 1;
            debug!(index, block_id = %acc.id, "Tool block already emitted; ignoring repeated stop");
            return;
        }

        let invocation = finalize(acc);
        if invocation.is_malformed() {
            self.stats.malformed_inputs += 1;
        }
        self.emitted.insert(invocation.id.clone());
        self.stats.invocations += 1;
        sink.on_tool_invocation(invocation);
    }

    /// Whether an invocation with `id` has already been emitted.
    #[must_use]
    pub fn has_emitted(&self, id: &str) -> bool {
        self.emitted.contains(id)
    }

    #[must_use]
    pub fn stats(&self) -> DemuxStats {
        self.stats
    }

    /// Ends the response, discarding any tool block never closed.
    #[must_use]
    pub fn finish(self) -> DemuxSummary {
        let mut dropped_blocks: Vec<DroppedBlock> = self
            .accumulators
            .into_iter()
            .filter(|(_, acc)| !acc.stopped)
            .map(|(index, acc)| DroppedBlock {
                index,
                id: acc.id,
                name: acc.name,
                buffered_bytes: acc.partial_json.len(),
            })
            .collect();
        dropped_blocks.sort_by_key(|b| b.index);

        for block in &dropped_blocks {
            warn!(
                index = block.index,
                block_id = %block.id,
                tool = %block.name,
                "Discarding incomplete tool block"
            );
        }

        DemuxSummary { stats: self.stats, dropped_blocks }
    }
}

fn finalize(acc: &ToolAccumulator) -> ToolInvocation {
    let raw = acc.partial_json.trim();
    // A tool called with no arguments streams no fragments at all.
    if raw.is_empty() {
        return ToolInvocation::new(acc.id.clone(), acc.name.clone(), Value::Object(Map::new()));
    }

    match serde_json::from_str::<Value>(raw) {
        Ok(input) => ToolInvocation::new(acc.id.clone(), acc.name.clone(), input),
        Err(e) => {
            error!(
                block_id = %acc.id,
                tool = %acc.name,
                error = %e,
                "Failed to parse tool input JSON; using empty input"
            );
            ToolInvocation {
                id: acc.id.clone(),
                name: acc.name.clone(),
                input: Value::Object(Map::new()),
                parse_error: Some(e.to_string()),
            }
        }
    }
}
