use std::time::Instant;

use ela_core::errors::ElaError;
use ela_core::{Bounds, Objective, RngHandle};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::distance::{pdist, pdist_cityblock};
use crate::row::{ExtractorKind, FeatureSet};
use crate::sampling::{clip_to_bounds, levy_random_walk_step_with, uniform_point, LevyStep};
use crate::stat::{self, GaussianKde};

/// Options of [`calculate_length_scales`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LengthScaleOptions {
    /// The walk takes `budget_factor_per_dim * dim²` steps.
    #[serde(default = "default_budget_factor_per_dim")]
    pub budget_factor_per_dim: usize,
    /// Estimate the entropy from a kernel density instead of value counts.
    #[serde(default)]
    pub use_kernel: bool,
    /// Density evaluations used by the kernel estimate.
    #[serde(default = "default_sample_size_from_kde")]
    pub sample_size_from_kde: usize,
    /// Step distribution of the walk.
    #[serde(default)]
    pub levy: LevyStep,
    /// Replaces the caller's RNG when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

fn default_budget_factor_per_dim() -> usize {
    1000
}

fn default_sample_size_from_kde() -> usize {
    500
}

impl Default for LengthScaleOptions {
    fn default() -> Self {
        Self {
            budget_factor_per_dim: default_budget_factor_per_dim(),
            use_kernel: false,
            sample_size_from_kde: default_sample_size_from_kde(),
            levy: LevyStep::default(),
            seed: None,
        }
    }
}

/// Distribution of length scales `|Δf| / ‖Δx‖` along a Lévy walk.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LengthScaleFeatures {
    /// Entropy of the length-scale distribution.
    pub shanon_entropy: f64,
    /// Mean length scale.
    pub mean: f64,
    /// Sample standard deviation.
    pub std: f64,
    /// Second central moment.
    pub second_moment: f64,
    /// Third central moment.
    pub third_moment: f64,
    /// Fourth central moment.
    pub fourth_moment: f64,
    /// Objective evaluations along the walk.
    pub additional_function_eval: usize,
    /// Wall-clock seconds.
    pub costs_runtime: f64,
}

impl FeatureSet for LengthScaleFeatures {
    fn kind(&self) -> ExtractorKind {
        ExtractorKind::LengthScale
    }

    fn values(&self) -> Vec<f64> {
        vec![
            self.shanon_entropy,
            self.mean,
            self.std,
            self.second_moment,
            self.third_moment,
            self.fourth_moment,
            self.additional_function_eval as f64,
            self.costs_runtime,
        ]
    }
}

/// Length-scale features of `f` from a clipped Lévy-flight walk.
pub fn calculate_length_scales(
    f: &dyn Objective,
    bounds: &Bounds,
    options: &LengthScaleOptions,
    rng: &mut RngHandle,
) -> Result<LengthScaleFeatures, ElaError> {
    let started = Instant::now();
    let dim = bounds.dim();
    let steps = options.budget_factor_per_dim * dim * dim;
    if steps < 2 {
        return Err(ElaError::invalid_parameter(
            "length_scale_budget",
            "budget_factor_per_dim",
            options.budget_factor_per_dim,
            "the walk needs at least two points",
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

    let mut x = uniform_point(bounds, rng);
    let mut points = Vec::with_capacity(steps);
    let mut fvals = Vec::with_capacity(steps);
    for _ in 0..steps {
        x = clip_to_bounds(&levy_random_walk_step_with(&x, options.levy, rng), bounds);
        fvals.push(f.evaluate(&x));
        points.push(x.clone());
    }

    let r: Vec<f64> = pdist_cityblock(&fvals)
        .into_iter()
        .zip(pdist(&points, 2.0))
        .map(|(df, dx)| df / dx)
        .filter(|ratio| !ratio.is_nan())
        .collect();

    let shanon_entropy = if options.use_kernel {
        kernel_entropy(&r, options.sample_size_from_kde, rng)
    } else {
        let counts: Vec<f64> = stat::rounded_value_counts(&r, 6)
            .into_iter()
            .map(|c| c as f64)
            .collect();
        stat::entropy(&counts)
    };

    let features = LengthScaleFeatures {
        shanon_entropy,
        mean: stat::mean(&r),
        std: stat::std_dev(&r, 1),
        second_moment: stat::central_moment(&r, 2),
        third_moment: stat::central_moment(&r, 3),
        fourth_moment: stat::central_moment(&r, 4),
        additional_function_eval: steps,
        costs_runtime: started.elapsed().as_secs_f64(),
    };
    debug!(steps, pairs = r.len(), "length scale features computed");
    Ok(features)
}

/// Base-2 entropy of kernel densities evaluated at uniform draws over `[min r, max r]`.
fn kernel_entropy(r: &[f64], draws: usize, rng: &mut RngHandle) -> f64 {
    let lo = stat::min(r);
    let hi = stat::max(r);
    if r.len() < 2 || !lo.is_finite() || !hi.is_finite() || draws == 0 {
        return f64::NAN;
    }
    let kde = GaussianKde::fit(r);
    let densities: Vec<f64> = (0..draws)
        .map(|_| kde.pdf(rng.gen_range(lo..=hi)))
        .collect();
    stat::entropy_base(&densities, 2.0)
}
