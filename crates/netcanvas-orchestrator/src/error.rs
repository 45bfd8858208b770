// Error types for the suggestion pipeline

use netcanvas_abstraction::TopologyError;
use thiserror::Error;

use crate::config::ConfigError;

/// Result type for pipeline operations
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Errors returned when acting on pending state.
#[derive(Debug, Error)]
pub enum ApprovalError {
    /// Nothing is awaiting approval.
    #[error("Nothing is pending approval")]
    NothingPending,

    /// The id does not name the pending item.
    #[error("'{requested}' is not pending (pending: '{pending}')")]
    NotPending {
        /// Id the caller asked for
        requested: String,
        /// Id actually pending
        pending: String,
    },

    /// The pending change proposal failed validation or names missing devices.
    #[error("Approval blocked: {}", reasons.join("; "))]
    Blocked {
        /// Human-readable reasons, one per failed field or missing device
        reasons: Vec<String>,
    },

    /// The registry refused the write; nothing was committed.
    #[error("Topology registry rejected the change: {0}")]
    Registry(#[from] TopologyError),
}

/// Top-level pipeline errors
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Approval workflow error
    #[error(transparent)]
    Approval(#[from] ApprovalError),

    /// Configuration error
    #[error(transparent)]
    Config(#[from] ConfigError),
}
