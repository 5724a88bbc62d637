//! End-to-end placement, replay and growth scenarios.

use corelib::{HashRing, NodeId};
use rand::rngs::StdRng;
use rand::SeedableRng;
use reshard::{
    admit_workload, CapacityGrowthSimulator, GrowthConfig, PregenPool, SequentialIds,
    UuidGenerator, WorkspaceSet,
};

const LOAD_CEILING: u64 = 2_000;

/// Placed population of `workspaces` on `nodes` nodes, reproducible per seed.
fn realm(nodes: usize, workspaces: usize, seed: u64) -> (HashRing, WorkspaceSet) {
    let mut ids = UuidGenerator::seeded(seed);
    let mut rng = StdRng::seed_from_u64(seed);
    let mut ring = HashRing::with_node_count(nodes).unwrap();
    let mut set = WorkspaceSet::generate(workspaces, &mut ids, &mut rng, LOAD_CEILING).unwrap();
    set.place_all(&mut ring).unwrap();
    (ring, set)
}

#[test]
fn test_placement_is_reproducible() {
    let (ring_a, set_a) = realm(5, 2000, 7);
    let (ring_b, set_b) = realm(5, 2000, 7);

    assert_eq!(set_a.keys(), set_b.keys());
    assert_eq!(set_a.assignment(), set_b.assignment());
    assert_eq!(ring_a.loads(), ring_b.loads());
    assert_eq!(ring_a.total_load(), set_a.total_load());
}

#[test]
fn test_replay_without_change_has_no_churn() {
    let (ring, mut set) = realm(5, 2000, 8);
    let mut fresh = HashRing::with_node_count(5).unwrap();

    assert_eq!(set.replay(&mut fresh, false).unwrap(), 0);
    assert_eq!(fresh.loads(), ring.loads());
}

#[test]
fn test_load_perturbation_moves_some_workspaces() {
    let (_, mut set) = realm(5, 2000, 9);
    let mut rng = StdRng::seed_from_u64(90);
    set.perturb_loads(&mut rng, -50, 500).unwrap();

    let before = set.assignment().clone();
    let mut fresh = HashRing::with_node_count(5).unwrap();
    let churn = set.replay(&mut fresh, false).unwrap();

    assert!(churn > 0);
    assert!(churn < set.len());
    assert_eq!(set.assignment(), &before, "replay without commit must not rewrite");
}

#[test]
fn test_admitted_ids_hash_to_their_node() {
    let (mut ring, mut set) = realm(3, 600, 10);
    let mut pool = PregenPool::build(&ring, 3_000, &mut UuidGenerator::seeded(100)).unwrap();
    let mut rng = StdRng::seed_from_u64(101);

    for _ in 0..200 {
        let admission =
            admit_workload(&mut ring, &mut pool, &mut set, &mut rng, LOAD_CEILING).unwrap();
        assert_eq!(admission.anomaly, None);
        assert_eq!(ring.get(&admission.workspace).unwrap(), admission.node);
        assert_eq!(set.node_of(&admission.workspace), Some(&admission.node));
    }
    assert_eq!(set.len(), 800);
    assert_eq!(pool.total_remaining(), 2_800);
    assert_eq!(ring.total_load(), set.total_load());
}

#[test]
fn test_capacity_growth_scenario() {
    let (ring, set) = realm(3, 1500, 2024);
    let config = GrowthConfig {
        threshold: 657_944,
        sample_size: 10_000,
        load_ceiling: LOAD_CEILING,
        ..GrowthConfig::default()
    };
    let mut sim =
        CapacityGrowthSimulator::new(config, ring, set, &mut UuidGenerator::seeded(4048)).unwrap();
    let outcome = sim.run(&mut StdRng::seed_from_u64(2025)).unwrap();

    assert_eq!(outcome.nodes_before, 3);
    assert_eq!(outcome.nodes_after, 4);
    assert_eq!(outcome.total_keys, 1500 + outcome.admissions);
    assert!(outcome.churn > 0);
    assert!(outcome.churn < outcome.total_keys);
    assert!(outcome.anomalies.is_empty());
    assert!(outcome.loads_before.values().any(|&l| l >= 657_944));
    assert!(outcome.loads_after.contains_key(&NodeId::from("4")));

    // The committed assignment is the grown ring's placement.
    let (_, mut set) = sim.into_parts();
    let mut again = HashRing::with_node_count(4).unwrap();
    assert_eq!(set.replay(&mut again, false).unwrap(), 0);
}

#[test]
fn test_growth_churn_beats_naive_rehash() {
    let mut fractions = Vec::new();
    for seed in 0..5u64 {
        let (ring, set) = realm(3, 600, 500 + seed);
        let threshold = ring.loads().values().max().copied().unwrap() + 20_000;
        let config = GrowthConfig {
            threshold,
            sample_size: 6_000,
            ..GrowthConfig::default()
        };
        let mut sim =
            CapacityGrowthSimulator::new(config, ring, set, &mut SequentialIds::new(format!("s{seed}")))
                .unwrap();
        let outcome = sim.run(&mut StdRng::seed_from_u64(seed)).unwrap();
        assert!(outcome.churn <= outcome.total_keys);
        fractions.push(outcome.churn_fraction());
    }

    let mean = fractions.iter().sum::<f64>() / fractions.len() as f64;
    // Rehashing without consistency would move 1 - 1/4 of the keys.
    assert!(mean < 0.75, "mean churn fraction {mean}");
}
