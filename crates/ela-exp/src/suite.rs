//! Benchmark suites the driver draws problems from.
//!
//! The built-in [`TestSuite`] holds classical continuous test functions. Each
//! instance moves the optimum to a pseudo-random location inside `[-4, 4]^dim`
//! and adds a pseudo-random offset to the objective value, both derived
//! deterministically from `(fid, iid, dim)`.

use std::f64::consts::PI;

use ela_core::errors::{ElaError, ErrorInfo};
use ela_core::{derive_substream_seed, Objective, Problem, RngHandle};
use rand::Rng;

/// Source of benchmark problems addressed by function, dimension and instance.
pub trait Suite: Sync {
    /// Function identifiers available in the suite.
    fn function_ids(&self) -> Vec<u64>;

    /// Builds the problem `(fid, dim, iid)`.
    fn problem(&self, fid: u64, dim: usize, iid: u64) -> Result<Box<dyn Problem + Send>, ElaError>;
}

/// Classical test function underlying a [`TestProblem`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestFunction {
    /// Sum of squares.
    Sphere,
    /// Axis-aligned ellipsoid with condition number 1e6.
    Ellipsoid,
    /// Cosine-modulated sphere with a regular lattice of local optima.
    Rastrigin,
    /// Curved valley.
    Rosenbrock,
    /// Nearly flat outer region around a central funnel.
    Ackley,
    /// Product-coupled cosines on a shallow bowl.
    Griewank,
    /// Sum of linear terms and a squared weighted sum.
    Zakharov,
    /// Plateaus of the rounded sphere.
    Step,
}

impl TestFunction {
    /// Every function, indexed by `fid - 1`.
    pub const ALL: [TestFunction; 8] = [
        TestFunction::Sphere,
        TestFunction::Ellipsoid,
        TestFunction::Rastrigin,
        TestFunction::Rosenbrock,
        TestFunction::Ackley,
        TestFunction::Griewank,
        TestFunction::Zakharov,
        TestFunction::Step,
    ];

    /// Function for a one-based identifier.
    pub fn from_id(fid: u64) -> Option<Self> {
        fid.checked_sub(1)
            .and_then(|idx| Self::ALL.get(idx as usize))
            .copied()
    }

    /// Value at `z`, with the optimum at the origin (Rosenbrock at the ones vector).
    pub fn raw(&self, z: &[f64]) -> f64 {
        let n = z.len() as f64;
        match self {
            TestFunction::Sphere => z.iter().map(|v| v * v).sum(),
            TestFunction::Ellipsoid => {
                let denom = (z.len().max(2) - 1) as f64;
                z.iter()
                    .enumerate()
                    .map(|(i, v)| 1e6f64.powf(i as f64 / denom) * v * v)
                    .sum()
            }
            TestFunction::Rastrigin => {
                10.0 * n + z.iter().map(|v| v * v - 10.0 * (2.0 * PI * v).cos()).sum::<f64>()
            }
            TestFunction::Rosenbrock => z
                .windows(2)
                .map(|w| {
                    let a = w[1] - w[0] * w[0];
                    let b = 1.0 - w[0];
                    100.0 * a * a + b * b
                })
                .sum(),
            TestFunction::Ackley => {
                let sum_sq: f64 = z.iter().map(|v| v * v).sum();
                let sum_cos: f64 = z.iter().map(|v| (2.0 * PI * v).cos()).sum();
                -20.0 * (-0.2 * (sum_sq / n).sqrt()).exp() - (sum_cos / n).exp()
                    + 20.0
                    + std::f64::consts::E
            }
            TestFunction::Griewank => {
                let sum: f64 = z.iter().map(|v| v * v).sum::<f64>() / 4000.0;
                let prod: f64 = z
                    .iter()
                    .enumerate()
                    .map(|(i, v)| (v / ((i + 1) as f64).sqrt()).cos())
                    .product();
                sum - prod + 1.0
            }
            TestFunction::Zakharov => {
                let sum1: f64 = z.iter().map(|v| v * v).sum();
                let sum2: f64 = z
                    .iter()
                    .enumerate()
                    .map(|(i, v)| 0.5 * (i + 1) as f64 * v)
                    .sum();
                sum1 + sum2.powi(2) + sum2.powi(4)
            }
            TestFunction::Step => z.iter().map(|v| (v + 0.5).floor().powi(2)).sum(),
        }
    }

    fn optimum_offset(&self) -> f64 {
        match self {
            TestFunction::Rosenbrock => 1.0,
            _ => 0.0,
        }
    }
}

/// One shifted instance of a [`TestFunction`].
#[derive(Debug, Clone, PartialEq)]
pub struct TestProblem {
    function: TestFunction,
    fid: u64,
    iid: u64,
    x_opt: Vec<f64>,
    f_opt: f64,
}

impl TestProblem {
    /// Builds instance `iid` of function `fid` in `dim` dimensions.
    pub fn new(fid: u64, dim: usize, iid: u64) -> Result<Self, ElaError> {
        let function = TestFunction::from_id(fid).ok_or_else(|| {
            ElaError::InvalidParameter(
                ErrorInfo::new("suite_fid", "unknown function identifier")
                    .with_context("fid", fid.to_string())
                    .with_context("available", format!("1..={}", TestFunction::ALL.len())),
            )
        })?;
        if dim == 0 {
            return Err(ElaError::invalid_parameter(
                "suite_dim",
                "dim",
                dim,
                "dimension must be positive",
            ));
        }
        let seed = derive_substream_seed(fid.wrapping_mul(1_000_003).wrapping_add(iid), dim as u64);
        let mut rng = RngHandle::from_seed(seed);
        let x_opt = (0..dim).map(|_| rng.gen_range(-4.0..4.0)).collect();
        let f_opt = (rng.gen_range(-1000.0f64..1000.0) * 100.0).round() / 100.0;
        Ok(Self {
            function,
            fid,
            iid,
            x_opt,
            f_opt,
        })
    }

    /// Location of the global optimum.
    pub fn x_opt(&self) -> &[f64] {
        &self.x_opt
    }

    /// Objective value at the global optimum.
    pub fn f_opt(&self) -> f64 {
        self.f_opt
    }

    /// Underlying test function.
    pub fn function(&self) -> TestFunction {
        self.function
    }
}

impl Objective for TestProblem {
    fn evaluate(&self, x: &[f64]) -> f64 {
        let shift = self.function.optimum_offset();
        let z: Vec<f64> = x
            .iter()
            .zip(&self.x_opt)
            .map(|(xi, oi)| xi - oi + shift)
            .collect();
        self.function.raw(&z) + self.f_opt
    }
}

impl Problem for TestProblem {
    fn id_function(&self) -> u64 {
        self.fid
    }

    fn id_instance(&self) -> u64 {
        self.iid
    }

    fn dimension(&self) -> usize {
        self.x_opt.len()
    }
}

/// Suite of the eight [`TestFunction`]s with identifiers `1..=8`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TestSuite;

impl Suite for TestSuite {
    fn function_ids(&self) -> Vec<u64> {
        (1..=TestFunction::ALL.len() as u64).collect()
    }

    fn problem(&self, fid: u64, dim: usize, iid: u64) -> Result<Box<dyn Problem + Send>, ElaError> {
        Ok(Box::new(TestProblem::new(fid, dim, iid)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn optimum_value_is_attained_at_x_opt() {
        for fid in 1..=8 {
            let problem = TestProblem::new(fid, 4, 3).unwrap();
            let at_opt = problem.evaluate(problem.x_opt());
            assert!((at_opt - problem.f_opt()).abs() < 1e-9, "fid {fid}");
        }
    }

    #[test]
    fn instances_differ_but_are_reproducible() {
        let a = TestProblem::new(3, 5, 1).unwrap();
        let b = TestProblem::new(3, 5, 2).unwrap();
        assert_ne!(a.x_opt(), b.x_opt());
        assert_eq!(a, TestProblem::new(3, 5, 1).unwrap());
        assert!(TestProblem::new(9, 2, 1).is_err());
        assert!(TestProblem::new(0, 2, 1).is_err());
    }
}
