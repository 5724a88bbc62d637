use corelib::{HashRing, NodeId};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

fn bench_get(c: &mut Criterion) {
    let ring = HashRing::with_node_count(8).unwrap();
    let keys: Vec<String> = (0..1024).map(|i| format!("workspace-{i}")).collect();

    c.bench_function("get", |b| {
        let mut i = 0;
        b.iter(|| {
            i = (i + 1) % keys.len();
            black_box(ring.get(&keys[i]).unwrap())
        })
    });
}

fn bench_get_least_under_pressure(c: &mut Criterion) {
    let mut ring = HashRing::with_node_count(8).unwrap();
    // Half the nodes sit above the bound so most walks skip at least once.
    for n in 1..=4 {
        ring.update_load(&NodeId::numbered(n), 10_000).unwrap();
    }
    let keys: Vec<String> = (0..1024).map(|i| format!("workspace-{i}")).collect();

    c.bench_function("get_least_skewed", |b| {
        let mut i = 0;
        b.iter(|| {
            i = (i + 1) % keys.len();
            black_box(ring.get_least(&keys[i]).unwrap())
        })
    });
}

criterion_group!(benches, bench_get, bench_get_least_under_pressure);
criterion_main!(benches);
