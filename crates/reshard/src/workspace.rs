//! Workspaces and the value object that carries them between runs.

use crate::error::{ReshardError, Result};
use crate::ids::IdGenerator;
use crate::replay;
use corelib::{HashRing, NodeId};
use rand::Rng;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

/// Opaque workspace identifier.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize)]
#[serde(transparent)]
pub struct WorkspaceId(String);

impl WorkspaceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WorkspaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<[u8]> for WorkspaceId {
    fn as_ref(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl From<String> for WorkspaceId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for WorkspaceId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Load of every workspace at one point in time.
pub type LoadSnapshot = HashMap<WorkspaceId, u64>;

/// Current node of every placed workspace.
pub type Assignment = HashMap<WorkspaceId, NodeId>;

/// A workspace population: arrival order, loads and current placement.
///
/// Arrival order is kept separately from the maps because placement is
/// order-dependent and every replay must walk the keys in the order they
/// were first placed.
#[derive(Debug, Clone, Default)]
pub struct WorkspaceSet {
    keys: Vec<WorkspaceId>,
    loads: LoadSnapshot,
    assignment: Assignment,
}

impl WorkspaceSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// `count` fresh workspaces with loads uniform in `[0, ceiling)`, not yet
    /// placed.
    pub fn generate<G, R>(count: usize, ids: &mut G, rng: &mut R, ceiling: u64) -> Result<Self>
    where
        G: IdGenerator + ?Sized,
        R: Rng,
    {
        if ceiling == 0 {
            return Err(ReshardError::InvalidConfig(
                "load ceiling must be positive".to_string(),
            ));
        }
        let mut set = Self::new();
        for _ in 0..count {
            let load = rng.gen_range(0..ceiling);
            set.insert(ids.next_id(), load);
        }
        Ok(set)
    }

    /// Add a workspace at the end of the arrival order, or overwrite the load
    /// of an existing one. Returns true if the workspace is new.
    pub fn insert(&mut self, id: WorkspaceId, load: u64) -> bool {
        let is_new = self.loads.insert(id.clone(), load).is_none();
        if is_new {
            self.keys.push(id);
        }
        is_new
    }

    pub fn assign(&mut self, id: WorkspaceId, node: NodeId) -> Option<NodeId> {
        self.assignment.insert(id, node)
    }

    pub fn keys(&self) -> &[WorkspaceId] {
        &self.keys
    }

    pub fn loads(&self) -> &LoadSnapshot {
        &self.loads
    }

    pub fn assignment(&self) -> &Assignment {
        &self.assignment
    }

    pub fn load_of(&self, id: &WorkspaceId) -> Option<u64> {
        self.loads.get(id).copied()
    }

    pub fn node_of(&self, id: &WorkspaceId) -> Option<&NodeId> {
        self.assignment.get(id)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn total_load(&self) -> u64 {
        self.loads.values().sum()
    }

    /// Initial placement on `ring`, replacing any previous assignment.
    pub fn place_all(&mut self, ring: &mut HashRing) -> Result<()> {
        self.assignment = replay::place_workspaces(ring, &self.keys, &self.loads)?;
        Ok(())
    }

    /// Replay every workspace onto `ring` and count moves against the current
    /// assignment. The assignment is overwritten only when `commit` is set.
    pub fn replay(&mut self, ring: &mut HashRing, commit: bool) -> Result<usize> {
        replay::replay_assignment(ring, &self.keys, &self.loads, &mut self.assignment, commit)
    }

    /// Every load uniform in `[0, ceiling)`.
    pub fn randomize_loads<R: Rng>(&mut self, rng: &mut R, ceiling: u64) -> Result<()> {
        if ceiling == 0 {
            return Err(ReshardError::InvalidConfig(
                "load ceiling must be positive".to_string(),
            ));
        }
        for key in &self.keys {
            self.loads.insert(key.clone(), rng.gen_range(0..ceiling));
        }
        Ok(())
    }

    pub fn reset_loads(&mut self) {
        self.loads.values_mut().for_each(|load| *load = 0);
    }

    /// Shift every load by a delta uniform in `[min_delta, max_delta]`,
    /// clamping at zero.
    pub fn perturb_loads<R: Rng>(
        &mut self,
        rng: &mut R,
        min_delta: i64,
        max_delta: i64,
    ) -> Result<()> {
        if min_delta > max_delta {
            return Err(ReshardError::InvalidConfig(format!(
                "delta range [{min_delta}, {max_delta}] is empty"
            )));
        }
        // Arrival order, so a seeded rng gives the same perturbation every time.
        for key in &self.keys {
            let delta = rng.gen_range(min_delta..=max_delta);
            if let Some(load) = self.loads.get_mut(key) {
                let shifted = i128::from(*load) + i128::from(delta);
                *load = shifted.clamp(0, i128::from(u64::MAX)) as u64;
            }
        }
        Ok(())
    }
}
