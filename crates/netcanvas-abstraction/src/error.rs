use thiserror::Error;

/// Result type for registry operations.
pub type Result<T> = std::result::Result<T, TopologyError>;

/// Errors raised by a topology registry when a mutation cannot be committed.
#[derive(Debug, Error)]
pub enum TopologyError {
    /// A referenced device does not exist.
    #[error("unknown device: {0}")]
    UnknownDevice(String),

    /// A referenced connection does not exist.
    #[error("unknown connection: {0}")]
    UnknownConnection(String),

    /// A device with the same name is already registered.
    #[error("device already exists: {0}")]
    DuplicateDevice(String),

    /// A VLAN with the same number is already registered.
    #[error("VLAN {0} already exists")]
    DuplicateVlan(u16),

    /// The entity produced by an update is not well-formed.
    #[error("invalid entity '{id}': {reason}")]
    InvalidEntity {
        /// Entity id
        id: String,
        /// What made it invalid
        reason: String,
    },

    /// The registry refused the write for its own reasons.
    #[error("registry write rejected: {0}")]
    Rejected(String),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
