//! Capacity-growth simulation.
//!
//! New workspaces are admitted one at a time onto the globally least-loaded
//! node until some node reaches an absolute capacity threshold. At that point
//! the cluster grows by one node, every workspace is replayed onto a fresh
//! ring, and the number that moved is the cost of the growth.

use crate::error::{ReshardError, Result};
use crate::ids::IdGenerator;
use crate::pool::PregenPool;
use crate::workspace::{WorkspaceId, WorkspaceSet};
use corelib::{HashRing, NodeId, RingError};
use rand::Rng;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use tracing::{info, warn};

/// Node load that triggers growth: 70% of the in-memory graph budget of one
/// index node, in vectors.
pub const DEFAULT_CAPACITY_THRESHOLD: u64 = 657_944;
pub const DEFAULT_SAMPLE_SIZE: usize = 10_000;
/// Synthetic workspace loads are drawn from `[0, DEFAULT_LOAD_CEILING)`.
pub const DEFAULT_LOAD_CEILING: u64 = 2_000;
pub const DEFAULT_MAX_ADMISSIONS: usize = 1_000_000;

/// Admission disagreed with the ring.
///
/// The least-loaded node, the popped id's native node and the bounded
/// resolver's choice for that id should all be the same node. When they are
/// not, the pool and the resolver have drifted apart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlacementAnomaly {
    pub workspace: WorkspaceId,
    pub least_loaded: NodeId,
    pub native: NodeId,
    pub bounded: NodeId,
}

impl fmt::Display for PlacementAnomaly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "workspace {} assigned to least-loaded node {} but hashes to {} (bounded: {})",
            self.workspace, self.least_loaded, self.native, self.bounded
        )
    }
}

/// Result of admitting one new workspace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Admission {
    pub workspace: WorkspaceId,
    pub node: NodeId,
    pub load: u64,
    pub anomaly: Option<PlacementAnomaly>,
}

/// Least-loaded member by linear scan; ties go to the lowest node id.
pub fn least_loaded_node(ring: &HashRing) -> Result<(NodeId, u64)> {
    let mut best: Option<(&NodeId, u64)> = None;
    for (node, load) in ring.load_table().iter() {
        if best.map_or(true, |(_, min)| load < min) {
            best = Some((node, load));
        }
    }
    best.map(|(node, load)| (node.clone(), load))
        .ok_or(ReshardError::Ring(RingError::EmptyRing))
}

/// Admit one new workspace onto the least-loaded node.
///
/// The id comes from that node's pregenerated bucket and the workspace gets a
/// load uniform in `[0, load_ceiling)`, which is committed to the node and
/// recorded in `workspaces` (appended to the arrival order). A disagreement
/// between the least-loaded node and the ring is reported in the returned
/// [`Admission`], logged and counted, but the admission still goes through.
pub fn admit_workload<R: Rng>(
    ring: &mut HashRing,
    pool: &mut PregenPool,
    workspaces: &mut WorkspaceSet,
    rng: &mut R,
    load_ceiling: u64,
) -> Result<Admission> {
    if load_ceiling == 0 {
        return Err(ReshardError::InvalidConfig(
            "load ceiling must be positive".to_string(),
        ));
    }

    let (node, current) = least_loaded_node(ring)?;
    let workspace = pool
        .pop(&node)
        .ok_or_else(|| ReshardError::PoolExhausted(node.clone()))?;

    let native = ring.get(&workspace)?;
    let bounded = ring.get_least(&workspace)?;
    let anomaly = if native != node || bounded != node {
        let anomaly = PlacementAnomaly {
            workspace: workspace.clone(),
            least_loaded: node.clone(),
            native,
            bounded,
        };
        warn!(%anomaly, "placement anomaly");
        metrics::counter!("reshard_placement_anomalies_total").increment(1);
        Some(anomaly)
    } else {
        None
    };

    let load = rng.gen_range(0..load_ceiling);
    let updated = current
        .checked_add(load)
        .ok_or_else(|| RingError::LoadOverflow(node.clone()))?;
    ring.update_load(&node, updated)?;
    workspaces.insert(workspace.clone(), load);
    workspaces.assign(workspace.clone(), node.clone());

    Ok(Admission {
        workspace,
        node,
        load,
        anomaly,
    })
}

/// Whether `node` carries `threshold` or more.
pub fn threshold_reached(ring: &HashRing, node: &NodeId, threshold: u64) -> Result<bool> {
    Ok(ring.load_of(node)? >= threshold)
}

/// Parameters of a growth run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GrowthConfig {
    /// Absolute node load that triggers adding a node.
    pub threshold: u64,
    /// Ids hashed into the pregenerated pool.
    pub sample_size: usize,
    /// Exclusive upper bound of a new workspace's load.
    pub load_ceiling: u64,
    /// Give up after this many admissions.
    pub max_admissions: usize,
}

impl Default for GrowthConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_CAPACITY_THRESHOLD,
            sample_size: DEFAULT_SAMPLE_SIZE,
            load_ceiling: DEFAULT_LOAD_CEILING,
            max_admissions: DEFAULT_MAX_ADMISSIONS,
        }
    }
}

impl GrowthConfig {
    fn validate(&self) -> Result<()> {
        if self.load_ceiling == 0 {
            return Err(ReshardError::InvalidConfig(
                "load ceiling must be positive".to_string(),
            ));
        }
        if self.max_admissions == 0 {
            return Err(ReshardError::InvalidConfig(
                "max admissions must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// What a growth run measured.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GrowthOutcome {
    /// Workspaces admitted, including the one that crossed the threshold.
    pub admissions: usize,
    pub nodes_before: usize,
    pub nodes_after: usize,
    /// Workspaces whose node changed when replayed on the grown ring.
    pub churn: usize,
    pub total_keys: usize,
    pub loads_before: BTreeMap<NodeId, u64>,
    pub loads_after: BTreeMap<NodeId, u64>,
    pub anomalies: Vec<PlacementAnomaly>,
}

impl GrowthOutcome {
    pub fn churn_fraction(&self) -> f64 {
        if self.total_keys == 0 {
            return 0.0;
        }
        self.churn as f64 / self.total_keys as f64
    }
}

/// Drives admissions against one ring until it has to grow.
#[derive(Debug, Clone)]
pub struct CapacityGrowthSimulator {
    config: GrowthConfig,
    ring: HashRing,
    pool: PregenPool,
    workspaces: WorkspaceSet,
}

impl CapacityGrowthSimulator {
    /// `ring` and `workspaces` are the placed starting population. The pool
    /// is built once here from `ids`.
    pub fn new<G: IdGenerator + ?Sized>(
        config: GrowthConfig,
        ring: HashRing,
        workspaces: WorkspaceSet,
        ids: &mut G,
    ) -> Result<Self> {
        config.validate()?;
        let pool = PregenPool::build(&ring, config.sample_size, ids)?;
        Ok(Self::with_pool(config, ring, workspaces, pool))
    }

    pub fn with_pool(
        config: GrowthConfig,
        ring: HashRing,
        workspaces: WorkspaceSet,
        pool: PregenPool,
    ) -> Self {
        Self {
            config,
            ring,
            pool,
            workspaces,
        }
    }

    /// Admit workspaces until a node reaches the threshold, then grow the
    /// ring by one node and replay every workspace onto it.
    pub fn run<R: Rng>(&mut self, rng: &mut R) -> Result<GrowthOutcome> {
        self.config.validate()?;
        let nodes_before = self.ring.node_count();
        let mut anomalies = Vec::new();

        for admissions in 1..=self.config.max_admissions {
            let admission = admit_workload(
                &mut self.ring,
                &mut self.pool,
                &mut self.workspaces,
                rng,
                self.config.load_ceiling,
            )?;
            anomalies.extend(admission.anomaly);

            if !threshold_reached(&self.ring, &admission.node, self.config.threshold)? {
                continue;
            }

            let loads_before = self.ring.loads();
            info!(
                node = %admission.node,
                threshold = self.config.threshold,
                admissions,
                "capacity threshold reached, adding a node"
            );

            let mut grown = self.ring.resized(nodes_before + 1)?;
            let churn = self.workspaces.replay(&mut grown, true)?;
            self.ring = grown;

            let outcome = GrowthOutcome {
                admissions,
                nodes_before,
                nodes_after: self.ring.node_count(),
                churn,
                total_keys: self.workspaces.len(),
                loads_before,
                loads_after: self.ring.loads(),
                anomalies,
            };
            info!(
                churn = outcome.churn,
                total_keys = outcome.total_keys,
                nodes = outcome.nodes_after,
                "node added"
            );
            return Ok(outcome);
        }

        Err(ReshardError::ThresholdNotReached {
            threshold: self.config.threshold,
            admissions: self.config.max_admissions,
        })
    }

    pub fn ring(&self) -> &HashRing {
        &self.ring
    }

    pub fn workspaces(&self) -> &WorkspaceSet {
        &self.workspaces
    }

    pub fn pool(&self) -> &PregenPool {
        &self.pool
    }

    pub fn into_parts(self) -> (HashRing, WorkspaceSet) {
        (self.ring, self.workspaces)
    }
}
