//! Error types for the core library.

use crate::node::NodeId;
use thiserror::Error;

/// Result type alias for the core library.
pub type Result<T> = std::result::Result<T, RingError>;

/// Errors that can occur in ring membership and placement operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RingError {
    /// Node is already a ring member
    #[error("node {0} is already on the ring")]
    DuplicateNode(NodeId),
    /// Node is not a ring member
    #[error("node {0} is not on the ring")]
    UnknownNode(NodeId),
    /// Every node is at or above the bound. Indicates a bug in the bound
    /// computation rather than a capacity problem.
    #[error("no node admits key {key:?} under max load {max_load}")]
    NoAdmissibleNode { key: String, max_load: u64 },
    /// Load update would push a node or the ring total past `u64::MAX`
    #[error("load on node {0} overflows")]
    LoadOverflow(NodeId),
    /// Lookup on a ring without nodes
    #[error("ring has no nodes")]
    EmptyRing,
    /// Rejected ring parameters
    #[error("invalid ring configuration: {0}")]
    InvalidConfig(String),
}
