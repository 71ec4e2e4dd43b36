use std::time::Instant;

use ela_core::errors::{ElaError, ErrorInfo};
use ela_core::Sample;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::distance::minkowski;
use crate::row::{ExtractorKind, FeatureSet};
use crate::stat::{mean, std_dev};

/// Options of [`calculate_fitness_distance_correlation`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitnessDistanceOptions {
    /// Known optimum value; the sample minimum is used when absent or not present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub f_opt: Option<f64>,
    /// Fraction of the best rows kept, in `(0, 1]`.
    #[serde(default = "default_proportion_of_best")]
    pub proportion_of_best: f64,
    /// Whether the objective is minimized.
    #[serde(default = "default_minimize")]
    pub minimize: bool,
    /// Minkowski exponent of the distances to the reference point.
    #[serde(default = "default_minkowski_p")]
    pub minkowski_p: f64,
}

fn default_proportion_of_best() -> f64 {
    1.0
}

fn default_minimize() -> bool {
    true
}

fn default_minkowski_p() -> f64 {
    2.0
}

impl Default for FitnessDistanceOptions {
    fn default() -> Self {
        Self {
            f_opt: None,
            proportion_of_best: default_proportion_of_best(),
            minimize: default_minimize(),
            minkowski_p: default_minkowski_p(),
        }
    }
}

/// Fitness-distance correlation of an evaluated sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FitnessDistanceFeatures {
    /// Correlation between fitness and distance to the reference point.
    pub fd_correlation: f64,
    /// Population covariance of fitness and distance.
    pub fd_cov: f64,
    /// Mean distance to the reference point.
    pub distance_mean: f64,
    /// Sample standard deviation of the distances.
    pub distance_std: f64,
    /// Mean fitness.
    pub fitness_mean: f64,
    /// Sample standard deviation of the fitness.
    pub fitness_std: f64,
    /// Wall-clock seconds.
    pub costs_runtime: f64,
}

impl FeatureSet for FitnessDistanceFeatures {
    fn kind(&self) -> ExtractorKind {
        ExtractorKind::FitnessDistance
    }

    fn values(&self) -> Vec<f64> {
        vec![
            self.fd_correlation,
            self.fd_cov,
            self.distance_mean,
            self.distance_std,
            self.fitness_mean,
            self.fitness_std,
            self.costs_runtime,
        ]
    }
}

/// Fitness-distance correlation features of `sample`; performs no evaluations.
///
/// Values are negated when maximizing so the reference point is always the
/// row with the lowest oriented fitness (or the first row matching `f_opt`).
pub fn calculate_fitness_distance_correlation(
    sample: &Sample,
    options: &FitnessDistanceOptions,
) -> Result<FitnessDistanceFeatures, ElaError> {
    let started = Instant::now();
    let proportion = options.proportion_of_best;
    if !(proportion > 0.0 && proportion <= 1.0) {
        return Err(ElaError::invalid_parameter(
            "fdc_proportion",
            "proportion_of_best",
            proportion,
            "proportion of best samples must lie in (0, 1]",
        ));
    }
    if sample.is_empty() {
        return Err(ElaError::InsufficientSample(
            ErrorInfo::new("fdc_empty", "fitness-distance correlation needs a non-empty sample")
                .with_context("rows", "0"),
        ));
    }

    let sign = if options.minimize { 1.0 } else { -1.0 };
    let y: Vec<f64> = sample.values().iter().map(|v| sign * v).collect();
    let f_opt = options.f_opt.map(|v| sign * v);

    let argmin = y
        .iter()
        .enumerate()
        .fold(0, |best, (idx, v)| if *v < y[best] { idx } else { best });
    let reference = f_opt
        .and_then(|target| y.iter().position(|v| *v == target))
        .unwrap_or(argmin);
    let reference_point = &sample.points()[reference];

    let mut kept: Vec<usize> = (0..y.len()).collect();
    if proportion < 1.0 {
        let keep = (y.len() as f64 * proportion).round_ties_even() as usize;
        if keep < 2 {
            return Err(ElaError::InsufficientSample(
                ErrorInfo::new(
                    "fdc_proportion_too_small",
                    "selecting the best rows leaves fewer than two observations",
                )
                .with_context("rows", y.len().to_string())
                .with_context("proportion_of_best", proportion.to_string()),
            ));
        }
        kept.sort_by(|a, b| y[*a].total_cmp(&y[*b]));
        kept.truncate(keep);
    }

    let fitness: Vec<f64> = kept.iter().map(|i| y[*i]).collect();
    let distances: Vec<f64> = kept
        .iter()
        .map(|i| minkowski(reference_point, &sample.points()[*i], options.minkowski_p))
        .collect();
    let fitness_mean = mean(&fitness);
    let distance_mean = mean(&distances);
    let fd_cov = fitness
        .iter()
        .zip(&distances)
        .map(|(y, d)| (y - fitness_mean) * (d - distance_mean))
        .sum::<f64>()
        / fitness.len() as f64;
    let fitness_std = std_dev(&fitness, 1);
    let distance_std = std_dev(&distances, 1);

    let features = FitnessDistanceFeatures {
        fd_correlation: fd_cov / (fitness_std * distance_std),
        fd_cov,
        distance_mean,
        distance_std,
        fitness_mean,
        fitness_std,
        costs_runtime: started.elapsed().as_secs_f64(),
    };
    debug!(rows = kept.len(), reference, "fitness distance features computed");
    Ok(features)
}
