//! Initial placement and churn measurement.
//!
//! Both walk the keys in arrival order and place each one with
//! [`HashRing::place`], so the load every key sees is the sum of the keys
//! before it. Replaying in any other order measures something else.

use crate::error::{ReshardError, Result};
use crate::workspace::{Assignment, LoadSnapshot, WorkspaceId};
use corelib::HashRing;
use tracing::debug;

fn load_for(loads: &LoadSnapshot, key: &WorkspaceId) -> Result<u64> {
    loads
        .get(key)
        .copied()
        .ok_or_else(|| ReshardError::MissingLoad(key.clone()))
}

/// Place `keys` in order on `ring`, committing each key's load before the next
/// key is resolved.
pub fn place_workspaces(
    ring: &mut HashRing,
    keys: &[WorkspaceId],
    loads: &LoadSnapshot,
) -> Result<Assignment> {
    if keys.is_empty() {
        return Err(ReshardError::EmptyKeys);
    }

    let mut assignment = Assignment::with_capacity(keys.len());
    for key in keys {
        let load = load_for(loads, key)?;
        let node = ring.place(key, load)?;
        assignment.insert(key.clone(), node);
    }
    debug!(workspaces = keys.len(), total_load = ring.total_load(), "initial placement done");
    Ok(assignment)
}

/// Replay `keys` onto `ring` and count those that land somewhere other than
/// `prior` says. A key missing from `prior` counts as moved.
///
/// `prior` is rewritten with the new placement only when `commit` is true.
pub fn replay_assignment(
    ring: &mut HashRing,
    keys: &[WorkspaceId],
    loads: &LoadSnapshot,
    prior: &mut Assignment,
    commit: bool,
) -> Result<usize> {
    if keys.is_empty() {
        return Err(ReshardError::EmptyKeys);
    }

    let mut churn = 0;
    for key in keys {
        let load = load_for(loads, key)?;
        let node = ring.place(key, load)?;
        let previous = prior.get(key);
        if previous != Some(&node) {
            churn += 1;
            debug!(
                workspace = %key,
                from = previous.map(|n| n.as_str()).unwrap_or("-"),
                to = %node,
                "workspace moved"
            );
        }
        if commit {
            prior.insert(key.clone(), node);
        }
    }

    metrics::counter!("reshard_churn_total").increment(churn as u64);
    debug!(workspaces = keys.len(), churn, nodes = ring.node_count(), "replay done");
    Ok(churn)
}
