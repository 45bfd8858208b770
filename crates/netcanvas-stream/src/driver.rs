//! Drives a demultiplexer over an asynchronous event source.

use futures::{Stream, StreamExt};
use tracing::{debug, warn};

use crate::demux::{CollectingSink, DemuxSummary, StreamDemultiplexer, StreamSink, TeeSink};
use crate::error::StreamError;
use crate::event::{ProtocolEvent, ToolInvocation};

/// Everything one streamed response produced.
#[derive(Debug, Clone, Default)]
pub struct StreamTurn {
    /// Concatenated assistant text.
    pub text: String,
    /// Invocations completed before the stream ended.
    pub invocations: Vec<ToolInvocation>,
    /// Set when the stream ended with a transport or upstream error.
    pub interruption: Option<StreamError>,
    pub summary: DemuxSummary,
}

impl StreamTurn {
    #[must_use]
    pub fn is_interrupted(&self) -> bool {
        self.interruption.is_some()
    }
}

/// Consumes `events` until it ends or yields an error.
///
/// Output is forwarded to `sink` as it is produced and also collected into
/// the returned [`StreamTurn`]. An error item stops consumption; everything
/// emitted before it remains in the result.
pub async fn drive_stream<St, S>(events: St, sink: &mut S) -> StreamTurn
where
    St: Stream<Item = Result<ProtocolEvent, StreamError>>,
    S: StreamSink + ?Sized,
{
    let mut events = std::pin::pin!(events);
    let mut demux = StreamDemultiplexer::new();
    let mut collected = CollectingSink::default();
    let mut interruption = None;

    while let Some(item) = events.next().await {
        match item {
            Ok(event) => {
                let mut tee = TeeSink { first: &mut *sink, second: &mut collected };
                demux.handle(event, &mut tee);
            }
            Err(e) => {
                warn!(error = %e, "Event stream interrupted");
                interruption = Some(e);
                break;
            }
        }
    }

    let summary = demux.finish();
    debug!(
        invocations = summary.stats.invocations,
        dropped = summary.dropped_blocks.len(),
        interrupted = interruption.is_some(),
        "Stream finished"
    );

    StreamTurn { text: collected.text, invocations: collected.invocations, interruption, summary }
}
