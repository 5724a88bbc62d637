//! Node identity for the consistent hash ring.
//!
//! Nodes are identified by an opaque string. `NodeId` wraps it in an
//! `Arc<str>` so the id can be cloned into every virtual node, load table
//! entry and assignment map without copying the bytes.

use serde::{Serialize, Serializer};
use std::fmt;
use std::sync::Arc;

/// Identifier for a node in the cluster.
///
/// Ordering is plain string ordering, which is also the iteration order of
/// load snapshots.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct NodeId(Arc<str>);

impl NodeId {
    pub fn new(id: impl AsRef<str>) -> Self {
        Self(Arc::from(id.as_ref()))
    }

    /// Id of the `index`-th node (1-based) of a ring built from a node count.
    pub fn numbered(index: usize) -> Self {
        Self::new(index.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for NodeId {
    fn from(id: String) -> Self {
        Self(Arc::from(id))
    }
}

impl Serialize for NodeId {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}
