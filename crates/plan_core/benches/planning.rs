//! Planner benchmarks for plan_core.
//!
//! Run with: `cargo bench -p plan_core`

// Benchmark binaries don't need docs on macro-generated functions
#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use plan_core::config::HeuristicKind;
use plan_core::search::Planner;
use plan_core::state::SearchNode;
use plan_test_utils::fixtures::{self, Fixture};

fn bench_fixture(c: &mut Criterion, fixture: &Fixture) {
    let planner = Planner::new(fixture.config.clone());
    c.bench_function(&format!("plan/{}", fixture.name), |b| {
        b.iter(|| planner.plan(black_box(&fixture.snapshot), black_box(fixture.goal)))
    });
}

/// Full searches over the shared fixtures.
pub fn planning_benchmark(c: &mut Criterion) {
    bench_fixture(c, &fixtures::single_trip());
    bench_fixture(c, &fixtures::two_small_mines());
    bench_fixture(c, &fixtures::mixed_resources());

    let fixture = fixtures::mixed_resources();
    let config = fixture.config.clone().with_heuristic(HeuristicKind::HarvestLowerBound);
    let fixture = fixture.with_config(config);
    let planner = Planner::new(fixture.config.clone());
    c.bench_function("plan/mixed-resources/harvest-lower-bound", |b| {
        b.iter(|| planner.plan(black_box(&fixture.snapshot), black_box(fixture.goal)))
    });
}

/// Successor generation and state keys, the inner loop of the search.
pub fn expansion_benchmark(c: &mut Criterion) {
    let fixture = fixtures::two_small_mines();
    let root = SearchNode::root(&fixture.snapshot, fixture.goal, &fixture.config)
        .expect("fixture should validate");

    c.bench_function("expand/successors", |b| {
        b.iter(|| black_box(&root).successors())
    });
    c.bench_function("expand/state_key", |b| b.iter(|| black_box(&root).key()));
}

criterion_group!(benches, planning_benchmark, expansion_benchmark);
criterion_main!(benches);
