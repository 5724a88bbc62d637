//! Bounded-load resolution.
//!
//! A key goes to its native node unless that node already carries
//! [`HashRing::max_load`] or more. Then the walk continues clockwise, node by
//! distinct node, and the first node under the bound wins. Ring order is the
//! only tie-break: a lightly loaded node further round the ring never beats an
//! admissible node that comes earlier.

use crate::error::{Result, RingError};
use crate::node::NodeId;
use crate::ring::HashRing;

impl HashRing {
    /// Current admission bound. Recomputed from the load table on every call.
    pub fn max_load(&self) -> u64 {
        self.loads.max_load(self.load_factor)
    }

    /// Whether `node_id` may take another key under the current bound.
    pub fn is_admissible(&self, node_id: &NodeId) -> Result<bool> {
        Ok(admits(self.load_of(node_id)?, self.max_load()))
    }

    /// Bounded-load owner of `key`. Pure query: loads are not touched.
    pub fn get_least(&self, key: impl AsRef<[u8]>) -> Result<NodeId> {
        let key = key.as_ref();
        let start = self.search(self.partitioner.partition(key))?;
        let max_load = self.max_load();
        let node_count = self.loads.len();
        let mut visited: Vec<&NodeId> = Vec::with_capacity(node_count);

        for offset in 0..self.points.len() {
            let point = &self.points[(start + offset) % self.points.len()];
            if visited.contains(&&point.node_id) {
                continue;
            }
            let load = self.loads.get(&point.node_id).unwrap_or(0);
            if admits(load, max_load) {
                return Ok(point.node_id.clone());
            }
            visited.push(&point.node_id);
            if visited.len() == node_count {
                break;
            }
        }

        Err(RingError::NoAdmissibleNode {
            key: String::from_utf8_lossy(key).into_owned(),
            max_load,
        })
    }

    /// Resolve `key` with [`get_least`](Self::get_least) and add `load` to the
    /// chosen node.
    pub fn place(&mut self, key: impl AsRef<[u8]>, load: u64) -> Result<NodeId> {
        let node = self.get_least(key)?;
        let current = self.load_of(&node)?;
        let updated = current
            .checked_add(load)
            .ok_or_else(|| RingError::LoadOverflow(node.clone()))?;
        self.loads.set(&node, updated)?;
        Ok(node)
    }
}

/// Admission rule: strictly under the bound.
fn admits(load: u64, max_load: u64) -> bool {
    load < max_load
}

#[cfg(test)]
mod tests {
    use crate::ring::RingBuilder;
    use crate::{HashRing, NodeId, RingError};

    fn ring(nodes: usize) -> HashRing {
        RingBuilder::new().with_points(16).with_node_count(nodes).build().unwrap()
    }

    /// First generated key whose native node is `node`.
    fn key_native_to(ring: &HashRing, node: &str) -> String {
        (0..)
            .map(|i| format!("key-{i}"))
            .find(|k| ring.get(k).unwrap().as_str() == node)
            .unwrap()
    }

    #[test]
    fn test_native_node_when_under_bound() {
        let ring = ring(3);
        for i in 0..50 {
            let key = format!("ws-{i}");
            assert_eq!(ring.get_least(&key).unwrap(), ring.get(&key).unwrap());
        }
    }

    #[test]
    fn test_overloaded_native_is_skipped() {
        let mut ring = ring(3);
        let key = key_native_to(&ring, "1");
        ring.update_load(&NodeId::from("1"), 900).unwrap();
        // avg = 300, bound = 375
        assert_eq!(ring.max_load(), 375);

        let chosen = ring.get_least(&key).unwrap();
        assert_ne!(chosen.as_str(), "1");
    }

    #[test]
    fn test_skip_follows_ring_order() {
        let mut ring = ring(3);
        let key = key_native_to(&ring, "1");
        ring.update_load(&NodeId::from("1"), 900).unwrap();

        // The next distinct node clockwise, ignoring loads.
        let start = ring.search(ring.partitioner.partition(key.as_bytes())).unwrap();
        let next = (0..ring.points.len())
            .map(|o| &ring.points[(start + o) % ring.points.len()].node_id)
            .find(|n| n.as_str() != "1")
            .unwrap()
            .clone();

        assert_eq!(ring.get_least(&key).unwrap(), next);
    }

    #[test]
    fn test_is_admissible_matches_resolver() {
        let mut ring = ring(3);
        ring.update_load(&NodeId::from("1"), 900).unwrap();
        ring.update_load(&NodeId::from("2"), 374).unwrap();
        ring.update_load(&NodeId::from("3"), 0).unwrap();
        // total 1274, avg 424, bound 530
        assert_eq!(ring.max_load(), 530);
        assert!(!ring.is_admissible(&NodeId::from("1")).unwrap());
        assert!(ring.is_admissible(&NodeId::from("2")).unwrap());
        assert!(ring.is_admissible(&NodeId::from("3")).unwrap());
        assert!(ring.is_admissible(&NodeId::from("9")).is_err());

        let key = key_native_to(&ring, "1");
        let chosen = ring.get_least(&key).unwrap();
        assert!(ring.is_admissible(&chosen).unwrap());
    }

    #[test]
    fn test_place_overflow_leaves_ring_untouched() {
        let mut ring = ring(2);
        ring.update_load(&NodeId::from("1"), u64::MAX - 10).unwrap();
        assert_eq!(
            ring.update_load(&NodeId::from("2"), 11).unwrap_err(),
            RingError::LoadOverflow(NodeId::from("2"))
        );

        let before = ring.loads();
        assert!(matches!(
            ring.place("ws", 11),
            Err(RingError::LoadOverflow(_))
        ));
        assert_eq!(ring.loads(), before);
        assert_eq!(ring.total_load(), u64::MAX - 10);
    }

    #[test]
    fn test_get_least_is_pure() {
        let ring = ring(3);
        let before = ring.loads();
        ring.get_least("anything").unwrap();
        assert_eq!(ring.loads(), before);
    }

    #[test]
    fn test_place_commits_load() {
        let mut ring = ring(2);
        let node = ring.place("ws-1", 700).unwrap();
        assert_eq!(ring.load_of(&node).unwrap(), 700);
        assert_eq!(ring.total_load(), 700);
    }

    #[test]
    fn test_no_admissible_node() {
        // A single node is always at or above a bound derived from its own load
        // once the factor leaves no headroom.
        let mut ring = RingBuilder::new()
            .with_points(4)
            .with_load_factor(1.0)
            .add_node("solo")
            .build()
            .unwrap();
        ring.update_load(&NodeId::from("solo"), 10).unwrap();

        let err = ring.get_least("key").unwrap_err();
        assert_eq!(
            err,
            RingError::NoAdmissibleNode { key: "key".to_string(), max_load: 10 }
        );
    }

    #[test]
    fn test_empty_ring() {
        let ring = HashRing::new();
        assert_eq!(ring.get_least("key").unwrap_err(), RingError::EmptyRing);
    }
}
