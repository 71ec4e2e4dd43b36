//! Objective-function abstractions and evaluation accounting.

use std::cell::Cell;

/// A black-box objective `f(x) -> f64` over a real vector.
pub trait Objective {
    /// Evaluates the objective at `x`.
    fn evaluate(&self, x: &[f64]) -> f64;
}

impl<F> Objective for F
where
    F: Fn(&[f64]) -> f64,
{
    fn evaluate(&self, x: &[f64]) -> f64 {
        self(x)
    }
}

/// An objective that also carries benchmark metadata.
///
/// The metadata is consumed by the experiment driver; extractors only ever
/// see the [`Objective`] side.
pub trait Problem: Objective {
    /// Benchmark function identifier.
    fn id_function(&self) -> u64;

    /// Benchmark instance identifier.
    fn id_instance(&self) -> u64;

    /// Search-space dimension.
    fn dimension(&self) -> usize;
}

/// Wraps an objective and counts every evaluation made through it.
pub struct CountingObjective<'a> {
    inner: &'a dyn Objective,
    sign: f64,
    evaluations: Cell<usize>,
}

impl<'a> CountingObjective<'a> {
    /// Wraps `inner` so that the wrapper always presents a minimization problem.
    pub fn minimizing(inner: &'a dyn Objective, minimize: bool) -> Self {
        Self {
            inner,
            sign: if minimize { 1.0 } else { -1.0 },
            evaluations: Cell::new(0),
        }
    }

    /// Number of evaluations performed so far.
    pub fn evaluations(&self) -> usize {
        self.evaluations.get()
    }

    /// Multiplier applied to raw objective values (`1` or `-1`).
    pub fn sign(&self) -> f64 {
        self.sign
    }
}

impl Objective for CountingObjective<'_> {
    fn evaluate(&self, x: &[f64]) -> f64 {
        self.evaluations.set(self.evaluations.get() + 1);
        self.sign * self.inner.evaluate(x)
    }
}
