use ela_core::{Bounds, ElaError, RngHandle};
use ela_features::{run_multi_start, LocalSearchMethod, LocalSearchOptions};

fn bounds() -> Bounds {
    Bounds::normalize(2, -5.0, 5.0).expect("bounds")
}

#[test]
fn maximization_returns_values_in_caller_orientation() {
    let cap = |x: &[f64]| 4.0 - x.iter().map(|v| v * v).sum::<f64>();
    let options = LocalSearchOptions {
        n_runs: 4,
        budget_factor_per_run: 300,
        minimize: false,
        ..LocalSearchOptions::default()
    };
    let mut rng = RngHandle::from_seed(21);
    let (sample, evaluations) = run_multi_start(&cap, &bounds(), &options, &mut rng).expect("runs");
    assert_eq!(sample.len(), 4);
    assert!(evaluations <= 4 * 300);
    assert!(sample.values().iter().all(|v| (v - 4.0).abs() < 1e-4));
}

#[test]
fn nelder_mead_runs_stay_inside_bounds() {
    let shifted = |x: &[f64]| (x[0] - 9.0).powi(2) + (x[1] + 1.0).powi(2);
    let options = LocalSearchOptions {
        n_runs: 3,
        budget_factor_per_run: 400,
        method: LocalSearchMethod::NelderMead,
        ..LocalSearchOptions::default()
    };
    let mut rng = RngHandle::from_seed(22);
    let (sample, _) = run_multi_start(&shifted, &bounds(), &options, &mut rng).expect("runs");
    assert!(sample.points().iter().all(|p| bounds().contains(p)));
}

#[test]
fn all_runs_diverging_is_an_error() {
    let broken = |_: &[f64]| f64::NAN;
    let options = LocalSearchOptions {
        n_runs: 3,
        budget_factor_per_run: 20,
        ..LocalSearchOptions::default()
    };
    let mut rng = RngHandle::from_seed(23);
    let err = run_multi_start(&broken, &bounds(), &options, &mut rng).unwrap_err();
    assert!(matches!(err, ElaError::OptimizationDiverged(_)));
}

#[test]
fn method_tags_parse() {
    assert_eq!("L-BFGS-B".parse::<LocalSearchMethod>().unwrap(), LocalSearchMethod::LBfgsB);
    assert_eq!("nelder_mead".parse::<LocalSearchMethod>().unwrap(), LocalSearchMethod::NelderMead);
    assert!("cobyla".parse::<LocalSearchMethod>().is_err());
}
