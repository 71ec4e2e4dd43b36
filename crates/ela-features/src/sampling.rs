use std::fmt;
use std::str::FromStr;

use ela_core::errors::{ElaError, ErrorInfo};
use ela_core::{Bounds, RngHandle};
use rand::seq::SliceRandom;
use rand::{Rng, RngCore};
use rand_distr::StandardNormal;
use serde::{Deserialize, Serialize};

/// Highest dimension supported by the quasi-random generator.
pub const MAX_QUASI_RANDOM_DIM: usize = sobol_burley::NUM_DIMENSIONS as usize;

/// Highest number of points the quasi-random generator can produce.
pub const MAX_QUASI_RANDOM_POINTS: usize = 1 << 16;

/// Space-filling design used for initial samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum SampleMethod {
    /// Latin hypercube design with randomly placed points inside each stratum.
    #[default]
    LatinHypercube,
    /// Owen-scrambled Sobol low-discrepancy sequence.
    QuasiRandom,
}

impl SampleMethod {
    /// Canonical tag used in configuration files.
    pub fn as_str(&self) -> &'static str {
        match self {
            SampleMethod::LatinHypercube => "latin-hypercube",
            SampleMethod::QuasiRandom => "quasi-random",
        }
    }
}

impl fmt::Display for SampleMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SampleMethod {
    type Err = ElaError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "lhs" | "latin-hypercube" => Ok(SampleMethod::LatinHypercube),
            "sobol" | "quasi-random" => Ok(SampleMethod::QuasiRandom),
            other => Err(ElaError::invalid_parameter(
                "sample_method",
                "method",
                other,
                "unknown sampling method",
            )),
        }
    }
}

/// Requested number of rows of an initial sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SampleSize {
    /// `coefficient * dim` rows.
    Coefficient(usize),
    /// Exactly this many rows.
    Count(usize),
}

impl SampleSize {
    /// Resolves the row count for a `dim`-dimensional problem.
    pub fn rows(&self, dim: usize) -> usize {
        match *self {
            SampleSize::Coefficient(coefficient) => coefficient * dim,
            SampleSize::Count(count) => count,
        }
    }
}

/// Draws an initial space-filling sample inside `bounds`.
///
/// Only the points are produced; evaluating the objective is left to the caller.
pub fn create_initial_sample(
    bounds: &Bounds,
    size: SampleSize,
    method: SampleMethod,
    rng: &mut RngHandle,
) -> Result<Vec<Vec<f64>>, ElaError> {
    let n = size.rows(bounds.dim());
    if n == 0 {
        return Err(ElaError::invalid_parameter(
            "sample_size",
            "size",
            format!("{size:?}"),
            "initial sample must contain at least one point",
        ));
    }
    let unit = match method {
        SampleMethod::LatinHypercube => latin_hypercube_unit(n, bounds.dim(), rng),
        SampleMethod::QuasiRandom => quasi_random_unit(n, bounds.dim(), rng)?,
    };
    Ok(unit
        .into_iter()
        .map(|row| scale_to_bounds(&row, bounds))
        .collect())
}

/// Latin hypercube design on the unit cube.
pub fn latin_hypercube_unit(n: usize, dim: usize, rng: &mut RngHandle) -> Vec<Vec<f64>> {
    let mut samples = vec![vec![0.0; dim]; n];
    // one stratum per row and dimension, shuffled independently per column
    for j in 0..dim {
        let mut column: Vec<f64> = (0..n)
            .map(|k| (k as f64 + rng.gen::<f64>()) / n as f64)
            .collect();
        column.shuffle(rng);
        for (row, value) in samples.iter_mut().zip(column) {
            row[j] = value;
        }
    }
    samples
}

/// Scrambled Sobol points on the unit cube.
///
/// The scrambling seed is drawn from `rng`, so repeated calls with the same
/// handle state reproduce the same design.
pub fn quasi_random_unit(
    n: usize,
    dim: usize,
    rng: &mut RngHandle,
) -> Result<Vec<Vec<f64>>, ElaError> {
    if dim > MAX_QUASI_RANDOM_DIM {
        return Err(ElaError::InvalidParameter(
            ErrorInfo::new("sobol_dim", "too many dimensions for the Sobol generator")
                .with_context("dim", dim.to_string())
                .with_context("max", MAX_QUASI_RANDOM_DIM.to_string()),
        ));
    }
    if n > MAX_QUASI_RANDOM_POINTS {
        return Err(ElaError::InvalidParameter(
            ErrorInfo::new("sobol_points", "too many points for the Sobol generator")
                .with_context("points", n.to_string())
                .with_context("max", MAX_QUASI_RANDOM_POINTS.to_string()),
        ));
    }
    let seed = rng.next_u32();
    Ok((0..n as u32)
        .map(|index| {
            (0..dim as u32)
                .map(|d| f64::from(sobol_burley::sample(index, d, seed)))
                .collect()
        })
        .collect())
}

/// Maps a unit-cube point into `bounds`.
pub fn scale_to_bounds(unit: &[f64], bounds: &Bounds) -> Vec<f64> {
    unit.iter()
        .zip(bounds.pairs())
        .map(|(u, (lo, hi))| (lo + u * (hi - lo)).clamp(lo, hi))
        .collect()
}

/// Draws a point uniformly at random inside `bounds`.
pub fn uniform_point(bounds: &Bounds, rng: &mut RngHandle) -> Vec<f64> {
    bounds.pairs().map(|(lo, hi)| rng.gen_range(lo..hi)).collect()
}

/// Picks a random vertex of the box.
///
/// Returns the vertex and, per coordinate, whether it sits on the upper bound.
pub fn random_vertex(bounds: &Bounds, rng: &mut RngHandle) -> (Vec<f64>, Vec<bool>) {
    bounds
        .pairs()
        .map(|(lo, hi)| {
            let at_upper = rng.gen::<bool>();
            (if at_upper { hi } else { lo }, at_upper)
        })
        .unzip()
}

/// Clamps every coordinate of `point` into `bounds`.
pub fn clip_to_bounds(point: &[f64], bounds: &Bounds) -> Vec<f64> {
    point
        .iter()
        .zip(bounds.pairs())
        .map(|(x, (lo, hi))| x.clamp(lo, hi))
        .collect()
}

/// Location and scale of the Lévy distribution used for walk steps.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LevyStep {
    /// Location parameter.
    pub loc: f64,
    /// Scale parameter.
    pub scale: f64,
}

impl Default for LevyStep {
    fn default() -> Self {
        Self {
            loc: 0.0,
            scale: 1e-3,
        }
    }
}

/// One Lévy-flight step from `point` with the default distribution.
///
/// The result is not clipped; callers clamp it with [`clip_to_bounds`].
pub fn levy_random_walk_step(point: &[f64], rng: &mut RngHandle) -> Vec<f64> {
    levy_random_walk_step_with(point, LevyStep::default(), rng)
}

/// One Lévy-flight step with an explicit step distribution.
pub fn levy_random_walk_step_with(
    point: &[f64],
    step: LevyStep,
    rng: &mut RngHandle,
) -> Vec<f64> {
    point
        .iter()
        .map(|x| {
            let direction = rng.gen_range(-1.0..1.0);
            let z = loop {
                let z: f64 = rng.sample(StandardNormal);
                if z != 0.0 {
                    break z;
                }
            };
            x + direction * (step.loc + step.scale / (z * z))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_method_tag_is_rejected() {
        let err = "grid".parse::<SampleMethod>().unwrap_err();
        assert!(matches!(err, ElaError::InvalidParameter(_)));
        assert_eq!("lhs".parse::<SampleMethod>().unwrap(), SampleMethod::LatinHypercube);
        assert_eq!("sobol".parse::<SampleMethod>().unwrap(), SampleMethod::QuasiRandom);
    }

    #[test]
    fn latin_hypercube_hits_every_stratum() {
        let mut rng = RngHandle::from_seed(7);
        let n = 40;
        let design = latin_hypercube_unit(n, 3, &mut rng);
        for j in 0..3 {
            let mut strata: Vec<usize> = design
                .iter()
                .map(|row| (row[j] * n as f64).floor() as usize)
                .collect();
            strata.sort_unstable();
            assert_eq!(strata, (0..n).collect::<Vec<_>>());
        }
    }

    #[test]
    fn levy_steps_are_heavy_tailed_but_finite() {
        let mut rng = RngHandle::from_seed(11);
        let origin = vec![0.0; 4];
        for _ in 0..200 {
            let next = levy_random_walk_step(&origin, &mut rng);
            assert!(next.iter().all(|x| !x.is_nan()));
        }
    }
}
