//! Ring shared between threads.
//!
//! Resolving a key and committing its load must happen under one lock: two
//! writers that both read a node as admissible would otherwise both land on
//! it and push it past the bound.

use crate::error::Result;
use crate::node::NodeId;
use crate::ring::HashRing;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Single-writer handle to a [`HashRing`] and its load table.
#[derive(Debug, Clone)]
pub struct SharedRing {
    inner: Arc<Mutex<HashRing>>,
}

impl SharedRing {
    pub fn new(ring: HashRing) -> Self {
        Self {
            inner: Arc::new(Mutex::new(ring)),
        }
    }

    /// Resolve and commit `key` atomically.
    pub fn place(&self, key: impl AsRef<[u8]>, load: u64) -> Result<NodeId> {
        self.inner.lock().place(key, load)
    }

    pub fn get(&self, key: impl AsRef<[u8]>) -> Result<NodeId> {
        self.inner.lock().get(key)
    }

    pub fn get_least(&self, key: impl AsRef<[u8]>) -> Result<NodeId> {
        self.inner.lock().get_least(key)
    }

    pub fn update_load(&self, node_id: &NodeId, load: u64) -> Result<()> {
        self.inner.lock().update_load(node_id, load)
    }

    pub fn add_node(&self, node_id: impl Into<NodeId>) -> Result<()> {
        self.inner.lock().add_node(node_id)
    }

    pub fn remove_node(&self, node_id: &NodeId) -> Result<u64> {
        self.inner.lock().remove_node(node_id)
    }

    pub fn loads(&self) -> BTreeMap<NodeId, u64> {
        self.inner.lock().loads()
    }

    pub fn max_load(&self) -> u64 {
        self.inner.lock().max_load()
    }

    /// Copy of the ring as it is right now.
    pub fn snapshot(&self) -> HashRing {
        self.inner.lock().clone()
    }

    /// Run `f` with exclusive access to the ring.
    pub fn with_ring<R>(&self, f: impl FnOnce(&mut HashRing) -> R) -> R {
        f(&mut *self.inner.lock())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_concurrent_placements_are_all_counted() {
        let shared = SharedRing::new(HashRing::with_node_count(4).unwrap());

        crossbeam::thread::scope(|s| {
            for t in 0..4 {
                let shared = &shared;
                s.spawn(move |_| {
                    for i in 0..250 {
                        shared.place(format!("t{t}-ws-{i}"), 3).unwrap();
                    }
                });
            }
        })
        .unwrap();

        let loads = shared.loads();
        assert_eq!(loads.values().sum::<u64>(), 3_000);
        assert_eq!(shared.snapshot().total_load(), 3_000);
    }

    #[test]
    fn test_with_ring_mutates_in_place() {
        let shared = SharedRing::new(HashRing::with_node_count(2).unwrap());
        shared.with_ring(|ring| ring.add_node("3")).unwrap();
        assert_eq!(shared.loads().len(), 3);
    }
}
