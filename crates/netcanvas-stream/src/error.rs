use thiserror::Error;

/// Result type for stream operations.
pub type Result<T> = std::result::Result<T, StreamError>;

/// Failures of the event transport feeding the demultiplexer.
///
/// None of these abort a turn on their own; tool invocations completed before
/// the failure stay valid.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StreamError {
    /// The connection to the LLM service failed mid-response.
    #[error("Transport error: {0}")]
    Transport(String),

    /// A frame could not be decoded into a protocol event.
    #[error("Decode error: {0}")]
    Decode(String),

    /// The LLM service reported an error inside the stream.
    #[error("Upstream error: {0}")]
    Upstream(String),
}
