use std::fmt;
use std::str::FromStr;

use ela_core::errors::{ElaError, ErrorInfo};
use ela_core::{Bounds, CountingObjective, Objective, RngHandle, Sample};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::optimize::{self, LbfgsbSettings, NelderMeadSettings, Termination};
use crate::sampling::uniform_point;

/// Bounded local optimizer driving each run of a multi-start search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum LocalSearchMethod {
    /// Projected limited-memory BFGS with finite-difference gradients.
    #[default]
    LBfgsB,
    /// Nelder-Mead simplex with clipped vertices.
    NelderMead,
}

impl LocalSearchMethod {
    /// Canonical tag used in configuration files.
    pub fn as_str(&self) -> &'static str {
        match self {
            LocalSearchMethod::LBfgsB => "l-bfgs-b",
            LocalSearchMethod::NelderMead => "nelder-mead",
        }
    }
}

impl fmt::Display for LocalSearchMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LocalSearchMethod {
    type Err = ElaError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().replace('_', "-").as_str() {
            "l-bfgs-b" | "lbfgsb" => Ok(LocalSearchMethod::LBfgsB),
            "nelder-mead" | "neldermead" => Ok(LocalSearchMethod::NelderMead),
            other => Err(ElaError::invalid_parameter(
                "local_search_method",
                "method",
                other,
                "unknown local search method",
            )),
        }
    }
}

/// Options of [`run_multi_start`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalSearchOptions {
    /// Number of independent starts.
    #[serde(default = "default_n_runs")]
    pub n_runs: usize,
    /// Evaluation budget of each run.
    #[serde(default = "default_budget_factor_per_run")]
    pub budget_factor_per_run: usize,
    /// Optimizer used by every run.
    #[serde(default)]
    pub method: LocalSearchMethod,
    /// Whether the objective is minimized.
    #[serde(default = "default_minimize")]
    pub minimize: bool,
    /// Replaces the caller's RNG for this call when set.
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

impl Default for LocalSearchOptions {
    fn default() -> Self {
        Self {
            n_runs: default_n_runs(),
            budget_factor_per_run: default_budget_factor_per_run(),
            method: LocalSearchMethod::default(),
            minimize: default_minimize(),
            seed: None,
        }
    }
}

/// Runs `n_runs` bounded local optimizations from uniform random starts.
///
/// Returns one row per run holding the optimum and its objective value in the
/// caller's orientation, plus the number of objective evaluations consumed.
/// Runs that never see a finite value keep a NaN row; the call only fails when
/// every run diverges.
pub fn run_multi_start(
    f: &dyn Objective,
    bounds: &Bounds,
    options: &LocalSearchOptions,
    rng: &mut RngHandle,
) -> Result<(Sample, usize), ElaError> {
    if options.n_runs == 0 {
        return Err(ElaError::invalid_parameter(
            "local_search_runs",
            "n_runs",
            options.n_runs,
            "at least one local search run is required",
        ));
    }
    if options.budget_factor_per_run == 0 {
        return Err(ElaError::invalid_parameter(
            "local_search_budget",
            "budget_factor_per_run",
            options.budget_factor_per_run,
            "every run needs a positive evaluation budget",
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

    let counting = CountingObjective::minimizing(f, options.minimize);
    let mut points = Vec::with_capacity(options.n_runs);
    let mut values = Vec::with_capacity(options.n_runs);
    let mut diverged = 0usize;
    for run in 0..options.n_runs {
        let start = uniform_point(bounds, rng);
        let result = match options.method {
            LocalSearchMethod::LBfgsB => optimize::lbfgsb(
                &counting,
                bounds,
                &start,
                options.budget_factor_per_run,
                LbfgsbSettings::default(),
            ),
            LocalSearchMethod::NelderMead => optimize::nelder_mead(
                &counting,
                bounds,
                &start,
                options.budget_factor_per_run,
                NelderMeadSettings::default(),
            ),
        };
        if result.termination == Termination::Diverged {
            diverged += 1;
        }
        debug!(
            run,
            evaluations = result.evaluations,
            termination = ?result.termination,
            "local search run finished"
        );
        values.push(counting.sign() * result.f);
        points.push(result.x);
    }
    if diverged == options.n_runs {
        return Err(ElaError::OptimizationDiverged(
            ErrorInfo::new("local_search_diverged", "no run produced a finite optimum")
                .with_context("n_runs", options.n_runs.to_string())
                .with_context("method", options.method.as_str())
                .with_hint("check that the objective is finite inside the bounds"),
        ));
    }
    let sample = Sample::new(bounds.dim(), points, values)?;
    Ok((sample, counting.evaluations()))
}
