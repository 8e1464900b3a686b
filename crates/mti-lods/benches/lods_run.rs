//! Full-run benchmarks.
//!
//! Benchmarks a complete LODS pass through the simulation kernel.

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use mti_lods::{LodsConfig, LodsEngine};
use mti_sim::{Scenario, run_simulation};
use mti_types::SimulationConfig;

// ============================================================================
// Run Benchmarks
// ============================================================================

fn bench_clean_run(c: &mut Criterion) {
    let mut group = c.benchmark_group("lods_clean_run");

    for total in [100usize, 1_000, 10_000] {
        let tags = Scenario::new(total, 0.2).with_seed(1).generate();
        let config = SimulationConfig::ideal();
        group.throughput(Throughput::Elements(total as u64));

        group.bench_with_input(BenchmarkId::from_parameter(total), &tags, |b, tags| {
            b.iter(|| {
                let mut engine = LodsEngine::new(LodsConfig::default());
                let stats = run_simulation(&mut engine, black_box(&config), black_box(tags));
                let _ = black_box(stats);
            });
        });
    }

    group.finish();
}

fn bench_noisy_run(c: &mut Criterion) {
    let mut group = c.benchmark_group("lods_noisy_run");
    let tags = Scenario::new(1_000, 0.2).with_seed(1).generate();

    for ber in [0.001, 0.01, 0.05] {
        let config = SimulationConfig::ideal()
            .with_seed(7)
            .with_noise(0.01, ber)
            .with_clock_drift(0.002);

        group.bench_with_input(BenchmarkId::from_parameter(ber), &config, |b, config| {
            b.iter(|| {
                let mut engine = LodsEngine::new(LodsConfig::default());
                let stats = run_simulation(&mut engine, black_box(config), black_box(&tags));
                let _ = black_box(stats);
            });
        });
    }

    group.finish();
}

// ============================================================================
// Criterion Configuration
// ============================================================================

criterion_group!(lods_benches, bench_clean_run, bench_noisy_run);

criterion_main!(lods_benches);
