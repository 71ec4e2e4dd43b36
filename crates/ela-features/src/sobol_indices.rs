//! Variable-interaction metrics: Sobol sensitivity indices on a Saltelli
//! design, plus fitness/state variance and skewness of the same sample.

use std::time::Instant;

use ela_core::errors::{ElaError, ErrorInfo};
use ela_core::{Bounds, Objective, RngHandle};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::row::{ExtractorKind, FeatureSet};
use crate::sampling::{quasi_random_unit, scale_to_bounds, MAX_QUASI_RANDOM_DIM};
use crate::stat::{self, mean, std_dev, variance};

/// Options of [`calculate_sobol_indices`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SobolIndicesOptions {
    /// Base rows `N` of the Saltelli design; `N * (dim + 2)` points are evaluated.
    #[serde(default = "default_sampling_coefficient")]
    pub sampling_coefficient: usize,
    /// Equal-width fitness bins used for the state variance.
    #[serde(default = "default_n_bins")]
    pub n_bins: usize,
    /// Bins with fewer than `factor * dim` members count as zero dispersion.
    #[serde(default = "default_min_obs_per_bin_factor")]
    pub min_obs_per_bin_factor: f64,
    /// Replaces the caller's RNG when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

fn default_sampling_coefficient() -> usize {
    10_000
}

fn default_n_bins() -> usize {
    20
}

fn default_min_obs_per_bin_factor() -> f64 {
    1.5
}

impl Default for SobolIndicesOptions {
    fn default() -> Self {
        Self {
            sampling_coefficient: default_sampling_coefficient(),
            n_bins: default_n_bins(),
            min_obs_per_bin_factor: default_min_obs_per_bin_factor(),
            seed: None,
        }
    }
}

/// First- and total-order Sobol indices, one entry per variable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensitivityIndices {
    /// First-order indices.
    pub first_order: Vec<f64>,
    /// Total-order indices.
    pub total_order: Vec<f64>,
}

/// Variable-interaction features.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SobolFeatures {
    /// `1 - Σ S1`.
    pub degree_of_variable_interaction: f64,
    /// Coefficient of variation of the total-order indices.
    pub coeff_var_x_sensitivity: f64,
    /// Variance of the mean-normalized objective values.
    pub fitness_variance: f64,
    /// Variance of the per-point bin dispersion.
    pub state_variance: f64,
    /// Skewness of the objective values around their range midpoint.
    pub fitness_skewness: f64,
    /// Skewness of the member dispersions around their range midpoint.
    pub state_skewness: f64,
    /// Points evaluated.
    pub additional_function_eval: usize,
    /// Wall-clock seconds.
    pub costs_runtime: f64,
}

impl FeatureSet for SobolFeatures {
    fn kind(&self) -> ExtractorKind {
        ExtractorKind::SobolIndices
    }

    fn values(&self) -> Vec<f64> {
        vec![
            self.degree_of_variable_interaction,
            self.coeff_var_x_sensitivity,
            self.fitness_variance,
            self.state_variance,
            self.fitness_skewness,
            self.state_skewness,
            self.additional_function_eval as f64,
            self.costs_runtime,
        ]
    }
}

/// Saltelli design inside `bounds`.
///
/// Rows come in `n` blocks `[A_j, AB_j1, .., AB_jD, B_j]` where `AB_ji` is
/// `A_j` with coordinate `i` taken from `B_j`.
pub fn saltelli_design(
    bounds: &Bounds,
    n: usize,
    rng: &mut RngHandle,
) -> Result<Vec<Vec<f64>>, ElaError> {
    let dim = bounds.dim();
    if 2 * dim > MAX_QUASI_RANDOM_DIM {
        return Err(ElaError::InvalidParameter(
            ErrorInfo::new("saltelli_dim", "dimension too large for the Saltelli design")
                .with_context("dim", dim.to_string())
                .with_context("max", (MAX_QUASI_RANDOM_DIM / 2).to_string()),
        ));
    }
    let base = quasi_random_unit(n, 2 * dim, rng)?;
    let mut design = Vec::with_capacity(n * (dim + 2));
    for row in base {
        let (a, b) = row.split_at(dim);
        design.push(scale_to_bounds(a, bounds));
        for i in 0..dim {
            let mut hybrid = a.to_vec();
            hybrid[i] = b[i];
            design.push(scale_to_bounds(&hybrid, bounds));
        }
        design.push(scale_to_bounds(b, bounds));
    }
    Ok(design)
}

/// First- and total-order indices from values laid out like [`saltelli_design`].
///
/// Values are standardized first. A constant response yields all-zero indices;
/// non-finite responses propagate as NaN.
pub fn analyze_sensitivity(values: &[f64], dim: usize) -> SensitivityIndices {
    let stride = dim + 2;
    let n = values.len() / stride;
    let mu = mean(values);
    let sigma = std_dev(values, 0);
    if n == 0 || sigma == 0.0 {
        return SensitivityIndices {
            first_order: vec![0.0; dim],
            total_order: vec![0.0; dim],
        };
    }
    let y: Vec<f64> = values.iter().map(|v| (v - mu) / sigma).collect();
    let f_a: Vec<f64> = (0..n).map(|j| y[j * stride]).collect();
    let f_b: Vec<f64> = (0..n).map(|j| y[j * stride + dim + 1]).collect();
    let pooled: Vec<f64> = f_a.iter().chain(&f_b).copied().collect();
    let v = variance(&pooled, 0);
    if v == 0.0 {
        return SensitivityIndices {
            first_order: vec![0.0; dim],
            total_order: vec![0.0; dim],
        };
    }

    let mut first_order = Vec::with_capacity(dim);
    let mut total_order = Vec::with_capacity(dim);
    for i in 0..dim {
        let f_ab: Vec<f64> = (0..n).map(|j| y[j * stride + 1 + i]).collect();
        let s1 = (0..n).map(|j| f_b[j] * (f_ab[j] - f_a[j])).sum::<f64>() / n as f64 / v;
        let st = (0..n).map(|j| (f_a[j] - f_ab[j]).powi(2)).sum::<f64>() / n as f64 / (2.0 * v);
        first_order.push(s1);
        total_order.push(st);
    }
    SensitivityIndices {
        first_order,
        total_order,
    }
}

/// Bin index of every value in `n_bins` right-closed equal-width bins over its range.
pub fn fitness_bins(values: &[f64], n_bins: usize) -> Vec<usize> {
    let lo = stat::min(values);
    let hi = stat::max(values);
    let width = (hi - lo) / n_bins as f64;
    values
        .iter()
        .map(|v| {
            if !(width > 0.0) {
                return 0;
            }
            let idx = ((v - lo) / width).ceil() as isize - 1;
            idx.clamp(0, n_bins as isize - 1) as usize
        })
        .collect()
}

/// Mean of `(midpoint - v) / half_range` over `values`.
fn midpoint_skewness(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    let lo = stat::min(values);
    let hi = stat::max(values);
    let half = (hi - lo) / 2.0;
    let reference = half + lo;
    mean(
        &values
            .iter()
            .map(|v| (reference - v) / half.abs())
            .collect::<Vec<_>>(),
    )
}

/// Per-point bin dispersion and the member dispersions of every populated bin.
///
/// Bins with fewer than `threshold` members count as dispersion 0 and
/// contribute no member dispersions.
fn bin_dispersions(
    points: &[Vec<f64>],
    values: &[f64],
    n_bins: usize,
    threshold: f64,
) -> (Vec<f64>, Vec<f64>) {
    let dim = points.first().map_or(0, Vec::len);
    let bins = fitness_bins(values, n_bins);
    let mut distribution = Vec::with_capacity(values.len());
    let mut member_dispersion = Vec::new();
    for bin in 0..n_bins {
        let members: Vec<&[f64]> = bins
            .iter()
            .zip(points)
            .filter(|(b, _)| **b == bin)
            .map(|(_, x)| x.as_slice())
            .collect();
        let dispersion = if members.is_empty() || (members.len() as f64) < threshold {
            0.0
        } else {
            let centroid: Vec<f64> = (0..dim)
                .map(|k| members.iter().map(|x| x[k]).sum::<f64>() / members.len() as f64)
                .collect();
            let d_j: Vec<f64> = members
                .iter()
                .map(|x| {
                    x.iter().zip(&centroid).map(|(a, c)| (a - c).abs()).sum::<f64>() / dim as f64
                })
                .collect();
            let bin_mean = mean(&d_j);
            member_dispersion.extend(d_j);
            bin_mean
        };
        distribution.extend(std::iter::repeat(dispersion).take(members.len()));
    }
    (distribution, member_dispersion)
}

/// Sobol-index and binning features of `f` inside `bounds`.
pub fn calculate_sobol_indices(
    f: &dyn Objective,
    bounds: &Bounds,
    options: &SobolIndicesOptions,
    rng: &mut RngHandle,
) -> Result<SobolFeatures, ElaError> {
    let started = Instant::now();
    let dim = bounds.dim();
    if options.sampling_coefficient == 0 {
        return Err(ElaError::invalid_parameter(
            "sobol_sampling_coefficient",
            "sampling_coefficient",
            options.sampling_coefficient,
            "the Saltelli design needs at least one base row",
        ));
    }
    if options.n_bins == 0 {
        return Err(ElaError::invalid_parameter(
            "sobol_bins",
            "n_bins",
            options.n_bins,
            "at least one bin is required",
        ));
    }
    let mut seeded;
    let rng = match options.seed {
        Some(seed) => {
            seeded = RngHandle::from_seed(seed);
            &mut seeded
        }
        None => rng,
    };

    let design = saltelli_design(bounds, options.sampling_coefficient, rng)?;
    let y: Vec<f64> = design.iter().map(|x| f.evaluate(x)).collect();

    let indices = analyze_sensitivity(&y, dim);
    let degree_of_variable_interaction = 1.0 - indices.first_order.iter().sum::<f64>();
    let coeff_var_x_sensitivity = std_dev(&indices.total_order, 0) / mean(&indices.total_order);

    let y_mean = mean(&y);
    let normalized: Vec<f64> = y.iter().map(|v| v / y_mean).collect();
    let fitness_variance = variance(&normalized, 0);

    let threshold = options.min_obs_per_bin_factor * dim as f64;
    let (distribution, member_dispersion) =
        bin_dispersions(&design, &y, options.n_bins, threshold);

    let features = SobolFeatures {
        degree_of_variable_interaction,
        coeff_var_x_sensitivity,
        fitness_variance,
        state_variance: variance(&distribution, 0),
        fitness_skewness: midpoint_skewness(&y),
        state_skewness: midpoint_skewness(&member_dispersion),
        additional_function_eval: y.len(),
        costs_runtime: started.elapsed().as_secs_f64(),
    };
    debug!(
        points = y.len(),
        interaction = features.degree_of_variable_interaction,
        "sobol index features computed"
    );
    Ok(features)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bins_are_right_closed_and_equal_width() {
        assert_eq!(fitness_bins(&[0.0, 5.0, 5.5, 10.0], 2), vec![0, 0, 1, 1]);
        assert_eq!(fitness_bins(&[0.0, 1.0, 2.0, 10.0], 2), vec![0, 0, 0, 1]);
        assert_eq!(fitness_bins(&[3.0, 3.0, 3.0], 4), vec![0, 0, 0]);
    }

    #[test]
    fn midpoint_skewness_measures_distance_from_range_centre() {
        // midpoint 5, half range 5: (1 + 0.8 + 0.6 - 1) / 4
        let skew = midpoint_skewness(&[0.0, 1.0, 2.0, 10.0]);
        assert!((skew - 0.35).abs() < 1e-12);
        assert!((midpoint_skewness(&[1.0, 0.0, 1.0]) + 1.0 / 3.0).abs() < 1e-12);
        assert!(midpoint_skewness(&[]).is_nan());
    }

    #[test]
    fn sparse_bins_have_zero_dispersion() {
        let points = vec![vec![0.0], vec![1.0], vec![2.0], vec![10.0]];
        let values = [0.0, 1.0, 2.0, 10.0];
        let (distribution, members) = bin_dispersions(&points, &values, 2, 1.5);
        // bin 0 holds x = 0, 1, 2 around centroid 1; bin 1 has a single member
        assert_eq!(members, vec![1.0, 0.0, 1.0]);
        let spread = 2.0 / 3.0;
        assert_eq!(distribution.len(), 4);
        for value in &distribution[..3] {
            assert!((value - spread).abs() < 1e-12);
        }
        assert_eq!(distribution[3], 0.0);
        assert!((variance(&distribution, 0) - 1.0 / 12.0).abs() < 1e-12);
        assert!((midpoint_skewness(&members) + 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn threshold_above_every_bin_leaves_no_member_dispersion() {
        let points = vec![vec![0.0, 0.0], vec![1.0, 1.0], vec![2.0, 4.0]];
        let (distribution, members) = bin_dispersions(&points, &[0.0, 1.0, 2.0], 2, 3.0);
        assert_eq!(distribution, vec![0.0; 3]);
        assert!(members.is_empty());
        assert!(midpoint_skewness(&members).is_nan());
    }

    #[test]
    fn constant_response_has_zero_indices() {
        let indices = analyze_sensitivity(&[2.0; 16], 2);
        assert_eq!(indices.first_order, vec![0.0, 0.0]);
        assert_eq!(indices.total_order, vec![0.0, 0.0]);
    }

    #[test]
    fn non_finite_response_propagates_nan() {
        let mut values: Vec<f64> = (0..16).map(|v| v as f64).collect();
        values[5] = f64::NAN;
        let indices = analyze_sensitivity(&values, 2);
        assert!(indices.first_order.iter().all(|v| v.is_nan()));
        assert!(indices.total_order.iter().all(|v| v.is_nan()));
    }
}
