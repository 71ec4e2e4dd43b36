use std::time::Instant;

use ela_core::errors::ElaError;
use ela_core::{Bounds, Objective, RngHandle};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::distance::{pdist, squareform};
use crate::local_search::{run_multi_start, LocalSearchMethod, LocalSearchOptions};
use crate::row::{ExtractorKind, FeatureSet};
use crate::stat::{mean, std_dev};

/// Options of [`calculate_hill_climbing`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HillClimbingOptions {
    /// Number of local searches.
    #[serde(default = "default_n_runs")]
    pub n_runs: usize,
    /// Evaluation budget of each local search.
    #[serde(default = "default_budget_factor_per_run")]
    pub budget_factor_per_run: usize,
    /// Local optimizer.
    #[serde(default)]
    pub method: LocalSearchMethod,
    /// Whether the objective is minimized.
    #[serde(default = "default_minimize")]
    pub minimize: bool,
    /// Minkowski exponent of the optimum distances.
    #[serde(default = "default_minkowski_p")]
    pub minkowski_p: f64,
    /// Replaces the caller's RNG when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

fn default_n_runs() -> usize {
    100
}

fn default_budget_factor_per_run() -> usize {
    1000
}

fn default_minimize() -> bool {
    true
}

fn default_minkowski_p() -> f64 {
    2.0
}

impl Default for HillClimbingOptions {
    fn default() -> Self {
        Self {
            n_runs: default_n_runs(),
            budget_factor_per_run: default_budget_factor_per_run(),
            method: LocalSearchMethod::default(),
            minimize: default_minimize(),
            minkowski_p: default_minkowski_p(),
            seed: None,
        }
    }
}

/// Dispersion of the optima found by multi-start local search.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HillClimbingFeatures {
    /// Mean pairwise distance between optima.
    pub avg_dist_between_opt: f64,
    /// Sample standard deviation of the pairwise distances.
    pub std_dist_between_opt: f64,
    /// Mean distance from the best optima to every optimum.
    pub avg_dist_local_to_global: f64,
    /// Sample standard deviation of those distances.
    pub std_dist_local_to_global: f64,
    /// Objective evaluations spent by the local searches.
    pub additional_function_eval: usize,
    /// Wall-clock seconds.
    pub costs_runtime: f64,
}

impl FeatureSet for HillClimbingFeatures {
    fn kind(&self) -> ExtractorKind {
        ExtractorKind::HillClimbing
    }

    fn values(&self) -> Vec<f64> {
        vec![
            self.avg_dist_between_opt,
            self.std_dist_between_opt,
            self.avg_dist_local_to_global,
            self.std_dist_local_to_global,
            self.additional_function_eval as f64,
            self.costs_runtime,
        ]
    }
}

/// Distance rows of every optimum sharing the best value, self-distance included.
fn local_to_global_distances(values: &[f64], square: &[Vec<f64>], minimize: bool) -> Vec<f64> {
    let best = if minimize {
        values.iter().copied().fold(f64::INFINITY, f64::min)
    } else {
        values.iter().copied().fold(f64::NEG_INFINITY, f64::max)
    };
    values
        .iter()
        .zip(square)
        .filter(|(value, _)| **value == best)
        .flat_map(|(_, row)| row.iter().copied())
        .collect()
}

/// Hill-climbing features of `f` inside `bounds`.
///
/// A single run leaves the spread statistics NaN; ties for the best value all
/// count as global optima.
pub fn calculate_hill_climbing(
    f: &dyn Objective,
    bounds: &Bounds,
    options: &HillClimbingOptions,
    rng: &mut RngHandle,
) -> Result<HillClimbingFeatures, ElaError> {
    let started = Instant::now();
    let search = LocalSearchOptions {
        n_runs: options.n_runs,
        budget_factor_per_run: options.budget_factor_per_run,
        method: options.method,
        minimize: options.minimize,
        seed: options.seed,
    };
    let (optima, evaluations) = run_multi_start(f, bounds, &search, rng)?;

    let condensed = pdist(optima.points(), options.minkowski_p);
    let square = squareform(&condensed).unwrap_or_default();

    let local_to_global = local_to_global_distances(optima.values(), &square, options.minimize);

    let features = HillClimbingFeatures {
        avg_dist_between_opt: mean(&condensed),
        std_dist_between_opt: std_dev(&condensed, 1),
        avg_dist_local_to_global: mean(&local_to_global),
        std_dist_local_to_global: std_dev(&local_to_global, 1),
        additional_function_eval: evaluations,
        costs_runtime: started.elapsed().as_secs_f64(),
    };
    debug!(
        runs = options.n_runs,
        evaluations,
        global_optima = local_to_global.len() / optima.len().max(1),
        "hill climbing features computed"
    );
    Ok(features)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line_square() -> Vec<Vec<f64>> {
        let points = vec![vec![0.0], vec![1.0], vec![3.0], vec![6.0]];
        squareform(&pdist(&points, 2.0)).expect("square")
    }

    #[test]
    fn tied_best_optima_all_contribute_rows() {
        let values = [1.0, 0.5, 0.5, 2.0];
        let distances = local_to_global_distances(&values, &line_square(), true);
        assert_eq!(distances, vec![1.0, 0.0, 2.0, 5.0, 3.0, 2.0, 0.0, 3.0]);
        assert_eq!(mean(&distances), 2.0);
    }

    #[test]
    fn maximization_picks_the_largest_value() {
        let values = [1.0, 0.5, 0.5, 2.0];
        let distances = local_to_global_distances(&values, &line_square(), false);
        assert_eq!(distances, vec![6.0, 5.0, 3.0, 0.0]);
        assert_eq!(mean(&distances), 3.5);
    }
}
