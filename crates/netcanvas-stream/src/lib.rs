//! Streaming tool-call reconstruction for NetCanvas.
//!
//! An LLM response arrives as an ordered sequence of low-level
//! [`ProtocolEvent`]s: blocks open, receive text or JSON fragments, and close.
//! The [`StreamDemultiplexer`] folds those events into live text deltas and
//! completed [`ToolInvocation`]s, emitting each invocation id at most once.
//!
//! # Sources
//!
//! - [`drive_stream`] consumes any `futures::Stream` of events and tolerates
//!   the producer failing mid-response.
//! - [`SseEventStream`] decodes a raw SSE byte stream into events.

pub mod demux;
pub mod driver;
pub mod error;
pub mod event;
pub mod sse;

pub use demux::{
    CollectingSink, DemuxStats, DemuxSummary, DroppedBlock, StreamDemultiplexer, StreamOutput,
    StreamSink, TeeSink,
};
pub use driver::{drive_stream, StreamTurn};
pub use error::{Result, StreamError};
pub use event::{BlockType, ProtocolEvent, ToolInvocation};
pub use sse::{decode_data, SseEventStream, SseFrame};
