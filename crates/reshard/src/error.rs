//! Error types for placement replay and growth simulation.

use crate::workspace::WorkspaceId;
use corelib::{NodeId, RingError};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ReshardError>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ReshardError {
    #[error(transparent)]
    Ring(#[from] RingError),

    #[error("no workspaces to place")]
    EmptyKeys,

    #[error("workspace {0} has no load entry")]
    MissingLoad(WorkspaceId),

    #[error("pregenerated id pool for node {0} is exhausted")]
    PoolExhausted(NodeId),

    #[error("no node reached load {threshold} after {admissions} admissions")]
    ThresholdNotReached { threshold: u64, admissions: usize },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}
