//! Virtual node abstractions.
//!
//! # Virtual Nodes (VNodes) Concept
//!
//! Each physical node owns several points on the ring instead of one. With
//! only a handful of nodes (the growth scenarios start at three) a single
//! point per node leaves wildly uneven arcs; a few dozen points per node
//! smooth the native distribution so the load bound is the exception rather
//! than the rule.
//!
//! # Point Labels
//!
//! Point `i` of node `n` sits at `partition("{n}#{i}")`. Labels depend only on
//! the node id and the index, so a ring rebuilt with the same nodes has the
//! same layout and adding a node never moves another node's points.
//!
//! # Performance Characteristics
//!
//! - **Memory**: one token and one shared node id per point
//! - **Lookup**: O(log n) binary search over all points

use crate::node::NodeId;
use crate::partitioner::Partitioner;
use crate::token::Token;

/// A virtual node on the hash ring.
///
/// # Invariants
///
/// - Every `VirtualNode` on a ring has a unique token
/// - Every `VirtualNode` belongs to exactly one physical node
///
/// Ordering is by token first, so a sorted `Vec<VirtualNode>` is the ring.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VirtualNode {
    /// Token position on the ring.
    pub token: Token,

    /// The physical node that owns this virtual node.
    pub node_id: NodeId,
}

impl VirtualNode {
    /// Create a new virtual node.
    #[inline]
    pub fn new(token: Token, node_id: NodeId) -> Self {
        Self { token, node_id }
    }

    /// Create a virtual node from a node ID and vnode index.
    ///
    /// # Example
    /// ```rust
    /// use corelib::{NodeId, VirtualNode};
    /// use corelib::partitioner::Xxh3Partitioner;
    ///
    /// let vnode0 = VirtualNode::from_index(&Xxh3Partitioner, NodeId::from("1"), 0);
    /// let vnode1 = VirtualNode::from_index(&Xxh3Partitioner, NodeId::from("1"), 1);
    /// assert_ne!(vnode0.token(), vnode1.token());
    /// ```
    pub fn from_index(partitioner: &dyn Partitioner, node_id: NodeId, vnode_index: usize) -> Self {
        let label = point_label(&node_id, vnode_index);
        let token = partitioner.partition(label.as_bytes());
        Self::new(token, node_id)
    }

    /// Get the token position.
    #[inline]
    pub fn token(&self) -> Token {
        self.token
    }

    /// Get the owning node ID.
    #[inline]
    pub fn node_id(&self) -> &NodeId {
        &self.node_id
    }

    /// Clockwise distance to another virtual node.
    #[inline]
    pub fn distance_to(&self, other: &Self) -> u64 {
        self.token.distance_to(&other.token)
    }
}

/// Label hashed to place point `index` of `node_id`.
pub fn point_label(node_id: &NodeId, index: usize) -> String {
    format!("{}#{}", node_id, index)
}

impl std::fmt::Display for VirtualNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "VNode(token={}, node={})", self.token, self.node_id)
    }
}
