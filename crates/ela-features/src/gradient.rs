use std::time::Instant;

use ela_core::errors::ElaError;
use ela_core::{Bounds, Objective, RngHandle, ScalarOrVec};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::row::{ExtractorKind, FeatureSet};
use crate::sampling::random_vertex;
use crate::stat::mean;

/// Options of [`calculate_gradient`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradientOptions {
    /// Step length per coordinate; defaults to `range_i * dim / 1000`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step_size: Option<ScalarOrVec>,
    /// Points visited by each walk, start included.
    #[serde(default = "default_budget_per_random_walk")]
    pub budget_per_random_walk: usize,
    /// Replaces the caller's RNG when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

fn default_budget_per_random_walk() -> usize {
    1000
}

impl Default for GradientOptions {
    fn default() -> Self {
        Self {
            step_size: None,
            budget_per_random_walk: default_budget_per_random_walk(),
            seed: None,
        }
    }
}

/// Ruggedness along axis-parallel random walks.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GradientFeatures {
    /// Mean absolute normalized gradient, averaged over walks.
    pub g_avg: f64,
    /// Deviation of the absolute gradients, averaged over walks.
    pub g_std: f64,
    /// Objective evaluations along all walks.
    pub additional_function_eval: usize,
    /// Wall-clock seconds.
    pub costs_runtime: f64,
}

impl FeatureSet for GradientFeatures {
    fn kind(&self) -> ExtractorKind {
        ExtractorKind::Gradient
    }

    fn values(&self) -> Vec<f64> {
        vec![
            self.g_avg,
            self.g_std,
            self.additional_function_eval as f64,
            self.costs_runtime,
        ]
    }
}

/// Gradient features from `dim` walks starting at random corners of the box.
///
/// Each step moves one random coordinate by its step size and reverses that
/// coordinate's direction when the step would leave the box. A walk with a
/// constant objective divides by a zero range and yields non-finite values.
pub fn calculate_gradient(
    f: &dyn Objective,
    bounds: &Bounds,
    options: &GradientOptions,
    rng: &mut RngHandle,
) -> Result<GradientFeatures, ElaError> {
    let started = Instant::now();
    let dim = bounds.dim();
    if options.budget_per_random_walk < 2 {
        return Err(ElaError::invalid_parameter(
            "gradient_budget",
            "budget_per_random_walk",
            options.budget_per_random_walk,
            "a walk needs at least two points",
        ));
    }
    let step_size = match &options.step_size {
        None => bounds.ranges().iter().map(|r| r * dim as f64 / 1000.0).collect(),
        Some(step) => step.resolve(dim).ok_or_else(|| {
            ElaError::invalid_parameter(
                "gradient_step_size",
                "step_size",
                format!("{step:?}"),
                "step size vector length does not match dimension",
            )
        })?,
    };
    let mut seeded;
    let rng = match options.seed {
        Some(seed) => {
            seeded = RngHandle::from_seed(seed);
            &mut seeded
        }
        None => rng,
    };

    let span: f64 = bounds.ranges().iter().sum();
    let denominator = mean(&step_size) / span;
    let lower = bounds.lower();
    let upper = bounds.upper();

    let mut evaluations = 0usize;
    let mut g_avgs = Vec::with_capacity(dim);
    let mut g_devs = Vec::with_capacity(dim);
    for _ in 0..dim {
        let (mut x, at_upper) = random_vertex(bounds, rng);
        let mut signs: Vec<f64> = at_upper
            .iter()
            .map(|upper| if *upper { -1.0 } else { 1.0 })
            .collect();
        let mut fvals = Vec::with_capacity(options.budget_per_random_walk);
        fvals.push(f.evaluate(&x));
        for _ in 1..options.budget_per_random_walk {
            let cd = rng.gen_range(0..dim);
            let next = x[cd] + signs[cd] * step_size[cd];
            if next > upper[cd] || next < lower[cd] {
                signs[cd] = -signs[cd];
            }
            x[cd] += signs[cd] * step_size[cd];
            fvals.push(f.evaluate(&x));
        }
        evaluations += fvals.len();

        let fmax = fvals.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let fmin = fvals.iter().copied().fold(f64::INFINITY, f64::min);
        let range = fmax - fmin;
        let g_t: Vec<f64> = fvals
            .windows(2)
            .map(|w| ((w[1] - w[0]) / range) / denominator)
            .collect();
        let g_avg = g_t.iter().map(|g| g.abs()).sum::<f64>() / g_t.len() as f64;
        let dev_sum: f64 = g_t.iter().map(|g| (g_avg - g.abs()).powi(2)).sum();
        g_avgs.push(g_avg);
        g_devs.push((dev_sum / (g_t.len() as f64 - 1.0)).sqrt());
    }

    let features = GradientFeatures {
        g_avg: mean(&g_avgs),
        g_std: mean(&g_devs),
        additional_function_eval: evaluations,
        costs_runtime: started.elapsed().as_secs_f64(),
    };
    debug!(walks = dim, evaluations, "gradient features computed");
    Ok(features)
}
