mod common;

use std::hint::black_box;
use std::sync::Arc;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use grass_scatter::density::{DensityField, RadiusThresholds};
use grass_scatter::scatter::runner::{ScatterConfig, ScatterRunner};
use rand::rngs::StdRng;
use rand::SeedableRng;

const SEGMENT_WIDTHS: [f32; 3] = [2048.0, 1024.0, 512.0];

fn scatter_fixed_benches(c: &mut Criterion) {
    let bounds = common::square(2048.0);
    let mut group = c.benchmark_group("scatter/fixed_radius");

    for &width in &SEGMENT_WIDTHS {
        let config = ScatterConfig::fixed(16.0).with_max_segment_width(width);
        let mut runner = ScatterRunner::new(config);
        let mut rng = StdRng::seed_from_u64(0xA11CE_u64 ^ (width as u64));

        group.bench_with_input(BenchmarkId::from_parameter(width), &width, |b, _| {
            b.iter(|| {
                let result = runner.run(bounds, &mut rng).map(|r| r.len());
                black_box(result.ok());
            });
        });
    }

    group.finish();
}

fn scatter_adaptive_benches(c: &mut Criterion) {
    let bounds = common::square(2048.0);
    let Ok(field) = DensityField::from_fn(256, 256, |x, y| ((x ^ y) & 0xFF) as u8) else {
        return;
    };
    let field = Arc::new(field);
    let mut group = c.benchmark_group("scatter/adaptive");

    for &width in &SEGMENT_WIDTHS {
        let config = ScatterConfig::adaptive("bench.png", RadiusThresholds::new(8.0, 64.0))
            .with_max_segment_width(width);
        let mut runner = ScatterRunner::new(config).with_density_field(field.clone());
        let mut rng = StdRng::seed_from_u64(0xD1CE_u64 ^ (width as u64));
        if let Ok(result) = runner.run(bounds, &mut rng) {
            group.throughput(common::elements_throughput(result.len()));
        }

        group.bench_with_input(BenchmarkId::from_parameter(width), &width, |b, _| {
            b.iter(|| {
                let result = runner.run(bounds, &mut rng).map(|r| r.len());
                black_box(result.ok());
            });
        });
    }

    group.finish();
}

criterion_group! {
    name = benches;
    config = common::default_criterion();
    targets = scatter_fixed_benches, scatter_adaptive_benches
}
criterion_main!(benches);
