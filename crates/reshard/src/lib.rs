//! Reshard churn measurement on top of the bounded-load ring.
//!
//! This crate provides:
//! - The workspace population as an explicit value object
//! - Order-preserving initial placement and replay (churn counting)
//! - Pregenerated id pools and the capacity-growth simulator
//! - Summary statistics for repeated runs

pub mod error;
pub mod growth;
pub mod ids;
pub mod pool;
pub mod replay;
pub mod stats;
pub mod workspace;

pub use error::{ReshardError, Result};
pub use growth::{
    admit_workload, least_loaded_node, threshold_reached, Admission, CapacityGrowthSimulator,
    GrowthConfig, GrowthOutcome, PlacementAnomaly,
};
pub use ids::{IdGenerator, SequentialIds, UuidGenerator};
pub use pool::PregenPool;
pub use replay::{place_workspaces, replay_assignment};
pub use stats::ChurnStats;
pub use workspace::{Assignment, LoadSnapshot, WorkspaceId, WorkspaceSet};
