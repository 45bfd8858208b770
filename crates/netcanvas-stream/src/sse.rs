// Server-Sent Events decoding for streamed LLM responses
//
// Turns a raw byte stream of SSE frames (as produced by the Messages
// streaming API) into ProtocolEvents. Frames are separated by a blank line;
// only `data:` lines are interpreted.

use bytes::Bytes;
use futures::Stream;
use serde_json::Value;
use std::collections::VecDeque;
use std::fmt::Display;
use std::pin::Pin;
use std::task::{Context, Poll};
use tracing::{debug, trace};

use crate::error::StreamError;
use crate::event::{BlockType, ProtocolEvent};

/// Meaning of one decoded SSE `data:` payload.
#[derive(Debug, Clone, PartialEq)]
pub enum SseFrame {
    /// A protocol event to forward.
    Event(ProtocolEvent),
    /// Bookkeeping frame with no pipeline meaning (ping, usage, ...).
    Skip,
    /// The response is complete.
    Stop,
    /// The service reported an error.
    Error(StreamError),
}

/// Decodes the JSON payload of a single `data:` line.
#[must_use]
pub fn decode_data(data: &str) -> SseFrame {
    let data = data.trim();
    if data == "[DONE]" {
        return SseFrame::Stop;
    }

    let payload: Value = match serde_json::from_str(data) {
        Ok(v) => v,
        Err(e) => {
            // Some servers interleave empty keep-alive payloads.
            debug!(error = %e, "Skipping undecodable SSE payload");
            return SseFrame::Skip;
        }
    };

    let index = payload.get("index").and_then(Value::as_u64).unwrap_or(0) as usize;
    let str_at = |v: &Value, key: &str| v.get(key).and_then(Value::as_str).map(str::to_string);

    match payload.get("type").and_then(Value::as_str).unwrap_or("") {
        "content_block_start" => {
            let block = payload.get("content_block").cloned().unwrap_or(Value::Null);
            let block_type = match block.get("type").and_then(Value::as_str) {
                Some("tool_use") => BlockType::ToolUse,
                Some("text") => BlockType::Text,
                _ => BlockType::Other,
            };
            SseFrame::Event(ProtocolEvent::BlockStart {
                index,
                block_type,
                block_id: str_at(&block, "id").unwrap_or_default(),
                tool_name: str_at(&block, "name"),
            })
        }
        "content_block_delta" => {
            let delta = payload.get("delta").cloned().unwrap_or(Value::Null);
            match delta.get("type").and_then(Value::as_str) {
                Some("text_delta") => str_at(&delta, "text")
                    .map_or(SseFrame::Skip, |text| SseFrame::Event(ProtocolEvent::TextDelta { index, text })),
                Some("input_json_delta") => str_at(&delta, "partial_json").map_or(SseFrame::Skip, |fragment| {
                    SseFrame::Event(ProtocolEvent::JsonDelta { index, fragment })
                }),
                _ => SseFrame::Skip,
            }
        }
        "content_block_stop" => SseFrame::Event(ProtocolEvent::BlockStop { index }),
        "message_stop" => SseFrame::Stop,
        "error" => {
            let message = payload
                .get("error")
                .and_then(|e| str_at(e, "message"))
                .unwrap_or_else(|| "unknown upstream error".to_string());
            SseFrame::Error(StreamError::Upstream(message))
        }
        other => {
            trace!(event_type = other, "Skipping SSE frame");
            SseFrame::Skip
        }
    }
}

/// Adapts a byte stream of SSE frames into protocol events.
pub struct SseEventStream<S> {
    inner: S,
    buffer: Vec<u8>,
    queued: VecDeque<Result<ProtocolEvent, StreamError>>,
    done: bool,
}

impl<S> SseEventStream<S> {
    pub fn new(inner: S) -> Self {
        Self { inner, buffer: Vec::new(), queued: VecDeque::new(), done: false }
    }

    /// Decodes every complete frame currently buffered.
    fn drain_frames(&mut self) {
        while let Some(end) = find_frame_end(&self.buffer) {
            let frame: Vec<u8> = self.buffer.drain(..end.frame_len).collect();
            self.buffer.drain(..end.separator_len);
            self.decode_frame(&frame);
            if self.done {
                self.buffer.clear();
                return;
            }
        }
    }

    /// Decodes one frame. Multiple `data:` lines form a single payload,
    /// joined with newlines.
    fn decode_frame(&mut self, frame: &[u8]) {
        let text = String::from_utf8_lossy(frame);
        let lines: Vec<&str> = text
            .lines()
            .filter_map(|line| line.strip_prefix("data:"))
            .map(|data| data.strip_prefix(' ').unwrap_or(data))
            .collect();
        if lines.is_empty() {
            return;
        }

        match decode_data(&lines.join("\n")) {
            SseFrame::Event(event) => self.queued.push_back(Ok(event)),
            SseFrame::Skip => {}
            SseFrame::Stop => self.done = true,
            SseFrame::Error(e) => {
                self.queued.push_back(Err(e));
                self.done = true;
            }
        }
    }
}

struct FrameEnd {
    frame_len: usize,
    separator_len: usize,
}

fn find_frame_end(buffer: &[u8]) -> Option<FrameEnd> {
    let lf = buffer.windows(2).position(|w| w == b"\n\n").map(|i| (i, 2));
    let crlf = buffer.windows(4).position(|w| w == b"\r\n\r\n").map(|i| (i, 4));
    let (frame_len, separator_len) = match (lf, crlf) {
        (Some(a), Some(b)) => {
            if a.0 <= b.0 {
                a
            } else {
                b
            }
        }
        (Some(a), None) => a,
        (None, Some(b)) => b,
        (None, None) => return None,
    };
    Some(FrameEnd { frame_len, separator_len })
}

impl<S, E> Stream for SseEventStream<S>
where
    S: Stream<Item = Result<Bytes, E>> + Unpin,
    E: Display,
{
    type Item = Result<ProtocolEvent, StreamError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        loop {
            if let Some(item) = self.queued.pop_front() {
                return Poll::Ready(Some(item));
            }
            if self.done {
                return Poll::Ready(None);
            }

            match Pin::new(&mut self.inner).poll_next(cx) {
                Poll::Ready(Some(Ok(bytes))) => {
                    self.buffer.extend_from_slice(&bytes);
                    self.drain_frames();
                }
                Poll::Ready(Some(Err(e))) => {
                    self.done = true;
                    return Poll::Ready(Some(Err(StreamError::Transport(e.to_string()))));
                }
                Poll::Ready(None) => {
                    // Flush a trailing frame that was not followed by a blank line.
                    if !self.buffer.is_empty() {
                        let rest = std::mem::take(&mut self.buffer);
                        self.decode_frame(&rest);
                    }
                    self.done = true;
                }
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}
