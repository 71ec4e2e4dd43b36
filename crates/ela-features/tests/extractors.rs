use ela_core::{Bounds, ElaError, RngHandle, Sample};
use ela_features::sampling::{create_initial_sample, SampleMethod, SampleSize};
use ela_features::{
    calculate_fitness_distance_correlation, calculate_gradient, calculate_hill_climbing,
    calculate_length_scales, calculate_sobol_indices, FitnessDistanceOptions, GradientOptions,
    HillClimbingOptions, LengthScaleOptions, SobolIndicesOptions,
};

fn sphere(x: &[f64]) -> f64 {
    x.iter().map(|v| v * v).sum()
}

fn rastrigin(x: &[f64]) -> f64 {
    10.0 * x.len() as f64
        + x.iter()
            .map(|v| v * v - 10.0 * (2.0 * std::f64::consts::PI * v).cos())
            .sum::<f64>()
}

fn bounds(dim: usize) -> Bounds {
    Bounds::normalize(dim, -5.0, 5.0).expect("bounds")
}

fn small_hill_climbing(n_runs: usize) -> HillClimbingOptions {
    HillClimbingOptions {
        n_runs,
        budget_factor_per_run: 200,
        ..HillClimbingOptions::default()
    }
}

#[test]
fn hill_climbing_single_run_is_nan_safe() {
    let mut rng = RngHandle::from_seed(1);
    let features = calculate_hill_climbing(&sphere, &bounds(2), &small_hill_climbing(1), &mut rng)
        .expect("hill climbing");
    assert!(features.avg_dist_between_opt.is_nan());
    assert!(features.std_dist_between_opt.is_nan());
    assert_eq!(features.avg_dist_local_to_global, 0.0);
    assert!(features.additional_function_eval > 0);
}

#[test]
fn hill_climbing_distances_are_non_negative() {
    let mut rng = RngHandle::from_seed(2);
    let features =
        calculate_hill_climbing(&rastrigin, &bounds(2), &small_hill_climbing(10), &mut rng)
            .expect("hill climbing");
    assert!(features.avg_dist_between_opt >= 0.0);
    assert!(features.std_dist_between_opt >= 0.0);
    assert!(features.avg_dist_local_to_global >= 0.0);
    assert!(features.additional_function_eval <= 10 * 200);
}

#[test]
fn hill_climbing_on_a_bowl_collapses_optima() {
    let mut rng = RngHandle::from_seed(3);
    let features = calculate_hill_climbing(&sphere, &bounds(3), &small_hill_climbing(5), &mut rng)
        .expect("hill climbing");
    assert!(features.avg_dist_between_opt < 1e-2);
}

#[test]
fn hill_climbing_counts_every_tied_optimum_as_global() {
    let mut rng = RngHandle::from_seed(21);
    let plateau = |_: &[f64]| 0.0;
    let features = calculate_hill_climbing(&plateau, &bounds(2), &small_hill_climbing(6), &mut rng)
        .expect("hill climbing");
    // every optimum is global, so the rows cover the whole square matrix
    let expected = features.avg_dist_between_opt * 5.0 / 6.0;
    assert!(features.avg_dist_between_opt > 0.0);
    assert!((features.avg_dist_local_to_global - expected).abs() < 1e-9);
}

#[test]
fn hill_climbing_maximizes_when_asked() {
    let mut rng = RngHandle::from_seed(22);
    let cap = |x: &[f64]| -sphere(x);
    let options = HillClimbingOptions {
        minimize: false,
        ..small_hill_climbing(5)
    };
    let features =
        calculate_hill_climbing(&cap, &bounds(3), &options, &mut rng).expect("hill climbing");
    assert!(features.avg_dist_between_opt < 1e-2);
    assert!(features.avg_dist_local_to_global < 1e-2);
}

#[test]
fn hill_climbing_rejects_zero_runs() {
    let mut rng = RngHandle::from_seed(4);
    let err = calculate_hill_climbing(&sphere, &bounds(2), &small_hill_climbing(0), &mut rng)
        .unwrap_err();
    assert!(matches!(err, ElaError::InvalidParameter(_)));
}

#[test]
fn gradient_counts_every_walk_point() {
    let options = GradientOptions {
        budget_per_random_walk: 100,
        ..GradientOptions::default()
    };
    let mut rng = RngHandle::from_seed(5);
    let features = calculate_gradient(&rastrigin, &bounds(3), &options, &mut rng).expect("gradient");
    assert_eq!(features.additional_function_eval, 300);
    assert!(features.g_avg.is_finite() && features.g_avg > 0.0);
    assert!(features.g_std >= 0.0);
}

#[test]
fn gradient_rejects_walks_shorter_than_two() {
    let options = GradientOptions {
        budget_per_random_walk: 1,
        ..GradientOptions::default()
    };
    let mut rng = RngHandle::from_seed(6);
    let err = calculate_gradient(&sphere, &bounds(2), &options, &mut rng).unwrap_err();
    assert_eq!(err.info().code, "gradient_budget");
}

#[test]
fn gradient_on_constant_objective_is_not_finite() {
    let options = GradientOptions {
        budget_per_random_walk: 20,
        ..GradientOptions::default()
    };
    let mut rng = RngHandle::from_seed(7);
    let flat = |_: &[f64]| 3.0;
    let features = calculate_gradient(&flat, &bounds(2), &options, &mut rng).expect("gradient");
    assert!(!features.g_avg.is_finite());
}

fn sphere_sample(seed: u64) -> Sample {
    let b = bounds(3);
    let mut rng = RngHandle::from_seed(seed);
    let points = create_initial_sample(&b, SampleSize::Coefficient(100), SampleMethod::LatinHypercube, &mut rng)
        .expect("sample");
    Sample::evaluate(3, points, &sphere).expect("evaluate")
}

#[test]
fn fitness_distance_is_strongly_positive_on_sphere() {
    let sample = sphere_sample(8);
    let features =
        calculate_fitness_distance_correlation(&sample, &FitnessDistanceOptions::default())
            .expect("fdc");
    assert!(features.fd_correlation > 0.8, "rfd = {}", features.fd_correlation);
    assert!(features.fd_cov > 0.0);
}

#[test]
fn fitness_distance_proportion_filter() {
    let sample = sphere_sample(9);
    let options = FitnessDistanceOptions {
        proportion_of_best: 0.25,
        ..FitnessDistanceOptions::default()
    };
    let features = calculate_fitness_distance_correlation(&sample, &options).expect("fdc");
    assert!(features.distance_mean.is_finite());

    let too_few = FitnessDistanceOptions {
        proportion_of_best: 0.001,
        ..FitnessDistanceOptions::default()
    };
    let err = calculate_fitness_distance_correlation(&sample, &too_few).unwrap_err();
    assert!(matches!(err, ElaError::InsufficientSample(_)));

    let invalid = FitnessDistanceOptions {
        proportion_of_best: 1.5,
        ..FitnessDistanceOptions::default()
    };
    let err = calculate_fitness_distance_correlation(&sample, &invalid).unwrap_err();
    assert!(matches!(err, ElaError::InvalidParameter(_)));
}

#[test]
fn fitness_distance_maximization_mirrors_negated_objective() {
    let sample = sphere_sample(10);
    let negated = Sample::new(
        3,
        sample.points().to_vec(),
        sample.values().iter().map(|v| -v).collect(),
    )
    .expect("sample");
    let minimized =
        calculate_fitness_distance_correlation(&sample, &FitnessDistanceOptions::default())
            .expect("fdc");
    let maximized = calculate_fitness_distance_correlation(
        &negated,
        &FitnessDistanceOptions {
            minimize: false,
            ..FitnessDistanceOptions::default()
        },
    )
    .expect("fdc");
    assert!((minimized.fd_correlation - maximized.fd_correlation).abs() < 1e-12);
}

#[test]
fn length_scales_report_walk_budget() {
    let options = LengthScaleOptions {
        budget_factor_per_dim: 20,
        ..LengthScaleOptions::default()
    };
    let mut rng = RngHandle::from_seed(11);
    let features = calculate_length_scales(&sphere, &bounds(2), &options, &mut rng).expect("ls");
    assert_eq!(features.additional_function_eval, 80);
    assert!(features.shanon_entropy >= 0.0);
    assert!(features.second_moment >= 0.0);
    assert!(features.mean >= 0.0);
}

#[test]
fn length_scales_kernel_entropy_is_finite() {
    let options = LengthScaleOptions {
        budget_factor_per_dim: 10,
        use_kernel: true,
        sample_size_from_kde: 100,
        ..LengthScaleOptions::default()
    };
    let mut rng = RngHandle::from_seed(12);
    let features = calculate_length_scales(&sphere, &bounds(2), &options, &mut rng).expect("ls");
    assert!(features.shanon_entropy.is_finite());
}

#[test]
fn sobol_on_constant_objective_has_no_interaction() {
    let options = SobolIndicesOptions {
        sampling_coefficient: 64,
        ..SobolIndicesOptions::default()
    };
    let mut rng = RngHandle::from_seed(13);
    let flat = |_: &[f64]| 1.0;
    let features = calculate_sobol_indices(&flat, &bounds(3), &options, &mut rng).expect("sobol");
    assert_eq!(features.degree_of_variable_interaction, 1.0);
    assert_eq!(features.fitness_variance, 0.0);
    assert_eq!(features.additional_function_eval, 64 * 5);
}

#[test]
fn sobol_on_additive_objective_has_little_interaction() {
    let options = SobolIndicesOptions {
        sampling_coefficient: 1024,
        ..SobolIndicesOptions::default()
    };
    let mut rng = RngHandle::from_seed(14);
    let additive = |x: &[f64]| x[0] + 2.0 * x[1];
    let features =
        calculate_sobol_indices(&additive, &bounds(2), &options, &mut rng).expect("sobol");
    assert!(features.degree_of_variable_interaction.abs() < 0.1);
    assert!(features.state_variance >= 0.0);
}

#[test]
fn sobol_on_nan_objective_does_not_invent_interaction() {
    let options = SobolIndicesOptions {
        sampling_coefficient: 64,
        ..SobolIndicesOptions::default()
    };
    let mut rng = RngHandle::from_seed(15);
    let holed = |x: &[f64]| if x[0] > 4.5 { f64::NAN } else { x[0] + x[1] };
    let features = calculate_sobol_indices(&holed, &bounds(2), &options, &mut rng).expect("sobol");
    assert!(features.degree_of_variable_interaction.is_nan());
    assert!(features.coeff_var_x_sensitivity.is_nan());
}

#[test]
fn seeded_extractors_ignore_the_caller_rng() {
    let options = GradientOptions {
        budget_per_random_walk: 50,
        seed: Some(99),
        ..GradientOptions::default()
    };
    let mut first = RngHandle::from_seed(1);
    let mut second = RngHandle::from_seed(2);
    let a = calculate_gradient(&rastrigin, &bounds(2), &options, &mut first).expect("gradient");
    let b = calculate_gradient(&rastrigin, &bounds(2), &options, &mut second).expect("gradient");
    assert_eq!(a.g_avg, b.g_avg);
    assert_eq!(a.g_std, b.g_std);
}
