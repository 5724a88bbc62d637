//! Pregenerated workspace ids bucketed by native node.
//!
//! New workspaces are created on demand for a specific node. Drawing the id
//! from that node's bucket means the id's native hash already points at the
//! node, so the bounded resolver and the plain hash agree on where it lives.

use crate::error::{ReshardError, Result};
use crate::ids::IdGenerator;
use crate::workspace::WorkspaceId;
use corelib::{HashRing, NodeId, RingError};
use std::collections::BTreeMap;
use tracing::debug;

/// Per-node LIFO queues of ids whose native node is that node.
#[derive(Debug, Clone, Default)]
pub struct PregenPool {
    queues: BTreeMap<NodeId, Vec<WorkspaceId>>,
}

impl PregenPool {
    /// Hash `sample_size` fresh ids against `ring` and bucket them by native
    /// node. Every ring member gets a queue, possibly empty.
    pub fn build<G: IdGenerator + ?Sized>(
        ring: &HashRing,
        sample_size: usize,
        ids: &mut G,
    ) -> Result<Self> {
        if ring.node_count() == 0 {
            return Err(ReshardError::Ring(RingError::EmptyRing));
        }

        let mut queues: BTreeMap<NodeId, Vec<WorkspaceId>> =
            ring.nodes().into_iter().map(|n| (n, Vec::new())).collect();
        for _ in 0..sample_size {
            let id = ids.next_id();
            let node = ring.get(&id)?;
            queues.entry(node).or_default().push(id);
        }

        debug!(
            sample_size,
            buckets = ?queues.iter().map(|(n, q)| (n.as_str(), q.len())).collect::<Vec<_>>(),
            "pregenerated id pool built"
        );
        Ok(Self { queues })
    }

    /// Pool from existing buckets. The caller vouches that each id's native
    /// node matches its bucket; admission reports an anomaly if it does not.
    pub fn from_queues(queues: BTreeMap<NodeId, Vec<WorkspaceId>>) -> Self {
        Self { queues }
    }

    /// Take the most recently generated id for `node`.
    pub fn pop(&mut self, node: &NodeId) -> Option<WorkspaceId> {
        self.queues.get_mut(node)?.pop()
    }

    pub fn remaining(&self, node: &NodeId) -> usize {
        self.queues.get(node).map_or(0, Vec::len)
    }

    pub fn total_remaining(&self) -> usize {
        self.queues.values().map(Vec::len).sum()
    }

    pub fn bucket(&self, node: &NodeId) -> &[WorkspaceId] {
        self.queues.get(node).map(Vec::as_slice).unwrap_or(&[])
    }
}
