//! Independent simulation trials.
//!
//! Each trial builds its own ring and workspace population from a seed, so
//! trials share nothing and run in parallel on scoped threads. Trial `i`
//! always gets seed `base_seed + i`, which keeps results independent of the
//! thread count.

use anyhow::{anyhow, Context, Result};
use corelib::HashRing;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use reshard::{CapacityGrowthSimulator, GrowthConfig, GrowthOutcome, UuidGenerator, WorkspaceSet};

/// Separates the id stream from the load stream of the same seed.
const ID_STREAM: u64 = 0x9e37_79b9_7f4a_7c15;

/// Starting population of a trial.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RealmParams {
    pub nodes: usize,
    pub workspaces: usize,
    pub load_ceiling: u64,
}

/// Generated and placed realm for `seed`.
pub fn build_realm(params: RealmParams, seed: u64) -> Result<(HashRing, WorkspaceSet, StdRng)> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut ids = UuidGenerator::seeded(seed ^ ID_STREAM);
    let mut ring = HashRing::with_node_count(params.nodes)?;
    let mut set = WorkspaceSet::generate(params.workspaces, &mut ids, &mut rng, params.load_ceiling)?;
    set.place_all(&mut ring).context("initial placement")?;
    Ok((ring, set, rng))
}

/// One load-change trial: place, shift every load by a random delta range,
/// replay on a fresh ring and count moves.
pub fn perturbation_trial(params: RealmParams, seed: u64) -> Result<usize> {
    let (_, mut set, mut rng) = build_realm(params, seed)?;
    let min_delta = rng.gen_range(-200..=0);
    let max_delta = rng.gen_range(1..=2000);
    set.perturb_loads(&mut rng, min_delta, max_delta)?;

    let mut ring = HashRing::with_node_count(params.nodes)?;
    Ok(set.replay(&mut ring, false)?)
}

/// One capacity-growth trial.
pub fn growth_trial(params: RealmParams, config: GrowthConfig, seed: u64) -> Result<GrowthOutcome> {
    let (ring, set, mut rng) = build_realm(params, seed)?;
    let mut ids = UuidGenerator::seeded(seed.rotate_left(32) ^ ID_STREAM);
    let mut sim = CapacityGrowthSimulator::new(config, ring, set, &mut ids)?;
    sim.run(&mut rng).with_context(|| format!("growth trial with seed {seed}"))
}

/// Run `trials` calls of `trial` over `threads` workers. Results are in trial
/// order.
pub fn run_trials<T, F>(trials: usize, threads: usize, base_seed: u64, trial: F) -> Result<Vec<T>>
where
    T: Send,
    F: Fn(u64) -> Result<T> + Sync,
{
    let threads = threads.clamp(1, trials.max(1));

    let per_worker = crossbeam::thread::scope(|s| {
        let handles: Vec<_> = (0..threads)
            .map(|worker| {
                let trial = &trial;
                s.spawn(move |_| -> Result<Vec<(usize, T)>> {
                    (worker..trials)
                        .step_by(threads)
                        .map(|i| trial(base_seed.wrapping_add(i as u64)).map(|r| (i, r)))
                        .collect()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join()).collect::<Vec<_>>()
    })
    .map_err(|_| anyhow!("trial worker panicked"))?;

    let mut results = Vec::with_capacity(trials);
    for joined in per_worker {
        let batch = joined.map_err(|_| anyhow!("trial worker panicked"))??;
        results.extend(batch);
    }
    results.sort_by_key(|(i, _)| *i);
    Ok(results.into_iter().map(|(_, r)| r).collect())
}
