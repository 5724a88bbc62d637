//! Per-node load accounting.

use crate::error::{Result, RingError};
use crate::node::NodeId;
use std::collections::BTreeMap;

/// Accumulated load per ring member.
///
/// Holds exactly one entry per node on the owning ring and keeps a running
/// total so the bound can be computed without a scan. Only the ring mutates
/// it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadTable {
    loads: BTreeMap<NodeId, u64>,
    total: u64,
}

impl LoadTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `node` at zero load. Returns false if it was already present.
    pub(crate) fn insert(&mut self, node: NodeId) -> bool {
        if self.loads.contains_key(&node) {
            return false;
        }
        self.loads.insert(node, 0);
        true
    }

    /// Drops `node`, returning the load it carried.
    pub(crate) fn remove(&mut self, node: &NodeId) -> Option<u64> {
        let load = self.loads.remove(node)?;
        self.total -= load;
        Some(load)
    }

    /// Replaces the load of `node`, returning the previous value. Fails without
    /// touching the table if the new total does not fit in a `u64`.
    pub(crate) fn set(&mut self, node: &NodeId, load: u64) -> Result<u64> {
        let slot = self
            .loads
            .get_mut(node)
            .ok_or_else(|| RingError::UnknownNode(node.clone()))?;
        // total >= previous always holds, so only the add can overflow.
        let total = (self.total - *slot)
            .checked_add(load)
            .ok_or_else(|| RingError::LoadOverflow(node.clone()))?;
        let previous = std::mem::replace(slot, load);
        self.total = total;
        Ok(previous)
    }

    pub fn get(&self, node: &NodeId) -> Option<u64> {
        self.loads.get(node).copied()
    }

    pub fn contains(&self, node: &NodeId) -> bool {
        self.loads.contains_key(node)
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn len(&self) -> usize {
        self.loads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.loads.is_empty()
    }

    /// Nodes and loads in node id order.
    pub fn iter(&self) -> impl Iterator<Item = (&NodeId, u64)> {
        self.loads.iter().map(|(node, load)| (node, *load))
    }

    pub fn snapshot(&self) -> BTreeMap<NodeId, u64> {
        self.loads.clone()
    }

    /// Admission bound: `ceil(avg * factor)` where `avg` is the integer
    /// average load per node, floored at 1 so an idle table still admits.
    ///
    /// Returns 0 for an empty table.
    pub fn max_load(&self, factor: f64) -> u64 {
        if self.loads.is_empty() {
            return 0;
        }
        let avg = (self.total / self.loads.len() as u64).max(1);
        (avg as f64 * factor).ceil() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(loads: &[(&str, u64)]) -> LoadTable {
        let mut table = LoadTable::new();
        for (node, load) in loads {
            let node = NodeId::from(*node);
            table.insert(node.clone());
            table.set(&node, *load).unwrap();
        }
        table
    }

    #[test]
    fn test_total_tracks_updates() {
        let mut t = table(&[("1", 10), ("2", 30)]);
        assert_eq!(t.total(), 40);

        let previous = t.set(&NodeId::from("1"), 4).unwrap();
        assert_eq!(previous, 10);
        assert_eq!(t.total(), 34);

        assert_eq!(t.remove(&NodeId::from("2")), Some(30));
        assert_eq!(t.total(), 4);
        assert_eq!(t.len(), 1);
    }

    #[test]
    fn test_insert_is_not_a_reset() {
        let mut t = table(&[("1", 10)]);
        assert!(!t.insert(NodeId::from("1")));
        assert_eq!(t.get(&NodeId::from("1")), Some(10));
    }

    #[test]
    fn test_set_unknown_node() {
        let mut t = LoadTable::new();
        let err = t.set(&NodeId::from("9"), 1).unwrap_err();
        assert_eq!(err, RingError::UnknownNode(NodeId::from("9")));
    }

    #[test]
    fn test_total_overflow_is_rejected() {
        let mut t = table(&[("1", u64::MAX), ("2", 0)]);
        let err = t.set(&NodeId::from("2"), 1).unwrap_err();
        assert_eq!(err, RingError::LoadOverflow(NodeId::from("2")));
        assert_eq!(t.get(&NodeId::from("2")), Some(0));
        assert_eq!(t.total(), u64::MAX);

        // Lowering a load still works at the limit.
        assert_eq!(t.set(&NodeId::from("1"), 7).unwrap(), u64::MAX);
        assert_eq!(t.total(), 7);
    }

    #[test]
    fn test_max_load_formula() {
        // avg = 3000 / 3 = 1000, bound = ceil(1250.0)
        assert_eq!(table(&[("1", 1000), ("2", 1500), ("3", 500)]).max_load(1.25), 1250);
        // avg = 10 / 3 = 3 (integer), bound = ceil(3.75)
        assert_eq!(table(&[("1", 10), ("2", 0), ("3", 0)]).max_load(1.25), 4);
    }

    #[test]
    fn test_max_load_idle_table() {
        assert_eq!(table(&[("1", 0), ("2", 0)]).max_load(1.25), 2);
        assert_eq!(LoadTable::new().max_load(1.25), 0);
    }
}
