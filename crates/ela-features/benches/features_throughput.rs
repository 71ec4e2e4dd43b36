use criterion::{criterion_group, criterion_main, Criterion};
use ela_core::{Bounds, RngHandle};
use ela_features::{
    calculate_gradient, calculate_length_scales, calculate_sobol_indices, GradientOptions,
    LengthScaleOptions, SobolIndicesOptions,
};

fn rastrigin(x: &[f64]) -> f64 {
    10.0 * x.len() as f64
        + x.iter()
            .map(|v| v * v - 10.0 * (2.0 * std::f64::consts::PI * v).cos())
            .sum::<f64>()
}

fn bench_extractors(c: &mut Criterion) {
    let bounds = Bounds::normalize(5, -5.0, 5.0).expect("bounds");
    let mut group = c.benchmark_group("extractors_d5");
    group.bench_function("gradient", |b| {
        let options = GradientOptions {
            budget_per_random_walk: 200,
            ..GradientOptions::default()
        };
        b.iter(|| {
            let mut rng = RngHandle::from_seed(1);
            calculate_gradient(&rastrigin, &bounds, &options, &mut rng).unwrap()
        })
    });
    group.bench_function("length_scales", |b| {
        let options = LengthScaleOptions {
            budget_factor_per_dim: 8,
            ..LengthScaleOptions::default()
        };
        b.iter(|| {
            let mut rng = RngHandle::from_seed(2);
            calculate_length_scales(&rastrigin, &bounds, &options, &mut rng).unwrap()
        })
    });
    group.bench_function("sobol_indices", |b| {
        let options = SobolIndicesOptions {
            sampling_coefficient: 512,
            ..SobolIndicesOptions::default()
        };
        b.iter(|| {
            let mut rng = RngHandle::from_seed(3);
            calculate_sobol_indices(&rastrigin, &bounds, &options, &mut rng).unwrap()
        })
    });
    group.finish();
}

criterion_group!(benches, bench_extractors);
criterion_main!(benches);
