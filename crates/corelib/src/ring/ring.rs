//! Hash ring data structure.
//!
//! The ring is a sorted `Vec<VirtualNode>` searched with a binary search, plus
//! the [`LoadTable`] of its members. Keeping both in one value means a ring
//! generation and its load accounting are always built, cloned and dropped
//! together.

use crate::error::{Result, RingError};
use crate::node::NodeId;
use crate::partitioner::{Partitioner, Xxh3Partitioner};
use crate::ring::load::LoadTable;
use crate::token::Token;
use crate::vnode::VirtualNode;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

/// Points per node when none is configured.
pub const DEFAULT_POINTS_PER_NODE: usize = 64;

/// Headroom over the average load a node may carry before keys skip it.
pub const DEFAULT_LOAD_FACTOR: f64 = 1.25;

/// Consistent hash ring with bounded-load placement.
#[derive(Debug, Clone)]
pub struct HashRing {
    /// Sorted by token; tokens are unique.
    pub(crate) points: Vec<VirtualNode>,
    pub(crate) loads: LoadTable,
    points_per_node: usize,
    pub(crate) load_factor: f64,
    pub(crate) partitioner: Arc<dyn Partitioner>,
}

impl Default for HashRing {
    fn default() -> Self {
        Self::new()
    }
}

impl HashRing {
    /// Empty ring with default settings.
    pub fn new() -> Self {
        Self::with_settings(
            DEFAULT_POINTS_PER_NODE,
            DEFAULT_LOAD_FACTOR,
            Arc::new(Xxh3Partitioner),
        )
    }

    fn with_settings(
        points_per_node: usize,
        load_factor: f64,
        partitioner: Arc<dyn Partitioner>,
    ) -> Self {
        Self {
            points: Vec::new(),
            loads: LoadTable::new(),
            points_per_node,
            load_factor,
            partitioner,
        }
    }

    /// Ring with nodes `"1"` through `"{node_count}"`, all at zero load.
    pub fn with_node_count(node_count: usize) -> Result<Self> {
        if node_count == 0 {
            return Err(RingError::InvalidConfig(
                "node count must be at least 1".to_string(),
            ));
        }
        RingBuilder::new().with_node_count(node_count).build()
    }

    /// Fresh ring with this ring's settings, nodes `"1"` through
    /// `"{node_count}"` and an empty load table.
    pub fn resized(&self, node_count: usize) -> Result<Self> {
        if node_count == 0 {
            return Err(RingError::InvalidConfig(
                "node count must be at least 1".to_string(),
            ));
        }
        let mut ring = Self::with_settings(
            self.points_per_node,
            self.load_factor,
            Arc::clone(&self.partitioner),
        );
        for index in 1..=node_count {
            ring.add_node(NodeId::numbered(index))?;
        }
        Ok(ring)
    }

    /// Add a node and its points, starting at zero load.
    pub fn add_node(&mut self, node_id: impl Into<NodeId>) -> Result<()> {
        let node_id = node_id.into();
        if self.loads.contains(&node_id) {
            return Err(RingError::DuplicateNode(node_id));
        }

        for index in 0..self.points_per_node {
            let vnode = VirtualNode::from_index(self.partitioner.as_ref(), node_id.clone(), index);
            match self.points.binary_search_by_key(&vnode.token, |p| p.token) {
                Ok(existing) => {
                    debug!(
                        node = %node_id,
                        index,
                        owner = %self.points[existing].node_id,
                        "token collision, point skipped"
                    );
                }
                Err(pos) => self.points.insert(pos, vnode),
            }
        }

        self.loads.insert(node_id.clone());
        debug!(node = %node_id, points = self.points_per_node, "added node to ring");
        Ok(())
    }

    /// Remove a node and its points. Returns the load it was carrying.
    pub fn remove_node(&mut self, node_id: &NodeId) -> Result<u64> {
        let load = self
            .loads
            .remove(node_id)
            .ok_or_else(|| RingError::UnknownNode(node_id.clone()))?;
        self.points.retain(|p| &p.node_id != node_id);
        debug!(node = %node_id, load, "removed node from ring");
        Ok(load)
    }

    /// Index of the first point at or after `token`, wrapping to 0.
    pub(crate) fn search(&self, token: Token) -> Result<usize> {
        if self.points.is_empty() {
            return Err(RingError::EmptyRing);
        }
        let idx = self.points.partition_point(|p| p.token < token);
        Ok(if idx == self.points.len() { 0 } else { idx })
    }

    /// Native owner of `key`: the node of the first point clockwise from the
    /// key's token. Load is not considered.
    pub fn get(&self, key: impl AsRef<[u8]>) -> Result<NodeId> {
        let idx = self.search(self.partitioner.partition(key.as_ref()))?;
        Ok(self.points[idx].node_id.clone())
    }

    /// Set the absolute load of `node_id`.
    pub fn update_load(&mut self, node_id: &NodeId, load: u64) -> Result<()> {
        self.loads.set(node_id, load)?;
        Ok(())
    }

    pub fn load_of(&self, node_id: &NodeId) -> Result<u64> {
        self.loads
            .get(node_id)
            .ok_or_else(|| RingError::UnknownNode(node_id.clone()))
    }

    /// Snapshot of every member's load, ordered by node id.
    pub fn loads(&self) -> BTreeMap<NodeId, u64> {
        self.loads.snapshot()
    }

    pub fn load_table(&self) -> &LoadTable {
        &self.loads
    }

    pub fn total_load(&self) -> u64 {
        self.loads.total()
    }

    pub fn contains(&self, node_id: &NodeId) -> bool {
        self.loads.contains(node_id)
    }

    pub fn node_count(&self) -> usize {
        self.loads.len()
    }

    pub fn token_count(&self) -> usize {
        self.points.len()
    }

    /// Member ids in id order.
    pub fn nodes(&self) -> Vec<NodeId> {
        self.loads.iter().map(|(node, _)| node.clone()).collect()
    }

    /// All `(token, node)` pairs in ring order.
    pub fn tokens(&self) -> Vec<(Token, NodeId)> {
        self.points
            .iter()
            .map(|p| (p.token, p.node_id.clone()))
            .collect()
    }

    pub fn points_per_node(&self) -> usize {
        self.points_per_node
    }

    pub fn load_factor(&self) -> f64 {
        self.load_factor
    }

    pub fn partitioner_name(&self) -> &'static str {
        self.partitioner.name()
    }
}

/// Builder for [`HashRing`].
#[derive(Debug, Clone)]
pub struct RingBuilder {
    points_per_node: usize,
    load_factor: f64,
    partitioner: Arc<dyn Partitioner>,
    nodes: Vec<NodeId>,
}

impl Default for RingBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RingBuilder {
    pub fn new() -> Self {
        Self {
            points_per_node: DEFAULT_POINTS_PER_NODE,
            load_factor: DEFAULT_LOAD_FACTOR,
            partitioner: Arc::new(Xxh3Partitioner),
            nodes: Vec::new(),
        }
    }

    pub fn with_points(mut self, points_per_node: usize) -> Self {
        self.points_per_node = points_per_node;
        self
    }

    pub fn with_load_factor(mut self, load_factor: f64) -> Self {
        self.load_factor = load_factor;
        self
    }

    pub fn with_partitioner(mut self, partitioner: impl Partitioner) -> Self {
        self.partitioner = Arc::new(partitioner);
        self
    }

    pub fn add_node(mut self, node_id: impl Into<NodeId>) -> Self {
        self.nodes.push(node_id.into());
        self
    }

    /// Adds nodes `"1"` through `"{node_count}"`.
    pub fn with_node_count(mut self, node_count: usize) -> Self {
        self.nodes.extend((1..=node_count).map(NodeId::numbered));
        self
    }

    pub fn build(self) -> Result<HashRing> {
        if self.points_per_node == 0 {
            return Err(RingError::InvalidConfig(
                "points per node must be at least 1".to_string(),
            ));
        }
        // The bound must not drop below the average load. At exactly 1.0 a
        // perfectly balanced table admits nothing.
        if !self.load_factor.is_finite() || self.load_factor < 1.0 {
            return Err(RingError::InvalidConfig(format!(
                "load factor must be a finite value >= 1.0, got {}",
                self.load_factor
            )));
        }

        let mut ring = HashRing::with_settings(self.points_per_node, self.load_factor, self.partitioner);
        for node in self.nodes {
            ring.add_node(node)?;
        }
        Ok(ring)
    }
}
