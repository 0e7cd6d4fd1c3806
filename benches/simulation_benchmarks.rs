//! Orbit and tidal-locking benchmarks with 95% confidence intervals.
//!
//! Run with: cargo bench
//!
//! - Kernel cost per step across substep counts (Cartesian vs polar)
//! - Full host tick, continuous and discrete spin coupling
//! - Tidal ring sampling across ring sizes

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use tidelock::prelude::*;

/// One integrator step per iteration, both kernels.
fn bench_kernel_step(c: &mut Criterion) {
    let mut group = c.benchmark_group("orbit_step");
    group.sample_size(100);
    group.confidence_level(0.95);

    let config = Scenario::Eccentric.config();
    for kernel in [KernelChoice::Cartesian, KernelChoice::Polar] {
        for n in [10_u32, 100, 1_000] {
            let label = format!("{kernel:?}").to_lowercase();
            group.bench_with_input(BenchmarkId::new(label, n), &n, |b, &n| {
                let (mut state, _) = tidelock::orbit::build_orbit(&config).expect("build");
                let mut int = OrbitIntegrator::new(n).expect("substeps").with_kernel(kernel);
                int.prepare(&state);
                b.iter(|| {
                    int.step(&mut state, black_box(0.05), 1.0).expect("step");
                    black_box(state.relative_position())
                });
            });
        }
    }

    group.finish();
}

/// Full `Simulation::tick` as a 60 Hz host drives it.
fn bench_full_tick(c: &mut Criterion) {
    let mut group = c.benchmark_group("simulation_tick");
    group.sample_size(100);
    group.confidence_level(0.95);

    for scenario in [Scenario::EarthMoon, Scenario::TidalLockingAnimation, Scenario::LunarRatio] {
        group.bench_function(scenario.name(), |b| {
            let mut sim = Simulation::from_scenario(scenario).expect("preset");
            b.iter(|| black_box(sim.tick(1.0 / 60.0).expect("tick")));
        });
    }

    group.finish();
}

/// Tidal force ring around the secondary.
fn bench_tidal_ring(c: &mut Criterion) {
    let mut group = c.benchmark_group("tidal_ring");
    let mut config = Scenario::TidalLockingAnimation.config();

    for n in [8_usize, 32, 100] {
        config.tidal.ring_samples = n;
        let sim = Simulation::new(config.clone()).expect("config");
        group.bench_with_input(BenchmarkId::new("samples", n), &n, |b, _| {
            b.iter(|| black_box(sim.tidal_samples()));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_kernel_step, bench_full_tick, bench_tidal_ring);
criterion_main!(benches);
