//! Canonical per-dimension search-space bounds.

use serde::{Deserialize, Serialize};

use crate::errors::{ElaError, ErrorInfo};

/// A value given either once for all dimensions or once per dimension.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScalarOrVec {
    /// Broadcast to every dimension.
    Scalar(f64),
    /// Explicit per-dimension values.
    PerDimension(Vec<f64>),
}

impl ScalarOrVec {
    /// Expands the value into a vector of length `dim`.
    ///
    /// Returns `None` when a per-dimension vector has the wrong length.
    pub fn resolve(&self, dim: usize) -> Option<Vec<f64>> {
        match self {
            ScalarOrVec::Scalar(value) => Some(vec![*value; dim]),
            ScalarOrVec::PerDimension(values) if values.len() == dim => Some(values.clone()),
            ScalarOrVec::PerDimension(_) => None,
        }
    }
}

impl From<f64> for ScalarOrVec {
    fn from(value: f64) -> Self {
        ScalarOrVec::Scalar(value)
    }
}

impl From<Vec<f64>> for ScalarOrVec {
    fn from(values: Vec<f64>) -> Self {
        ScalarOrVec::PerDimension(values)
    }
}

impl From<&[f64]> for ScalarOrVec {
    fn from(values: &[f64]) -> Self {
        ScalarOrVec::PerDimension(values.to_vec())
    }
}

/// Validated box constraints, one `(lower, upper)` pair per dimension.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    lower: Vec<f64>,
    upper: Vec<f64>,
}

impl Bounds {
    /// Canonicalizes scalar-or-vector bounds into per-dimension vectors.
    ///
    /// Fails with [`ElaError::InvalidBounds`] when `dim` is zero, a vector has a
    /// length other than `dim`, a bound is not finite, or `lower[i] >= upper[i]`.
    pub fn normalize(
        dim: usize,
        lower: impl Into<ScalarOrVec>,
        upper: impl Into<ScalarOrVec>,
    ) -> Result<Self, ElaError> {
        if dim == 0 {
            return Err(ElaError::InvalidBounds(
                ErrorInfo::new("bounds_dim", "dimension must be positive")
                    .with_context("dim", "0"),
            ));
        }
        let lower = lower
            .into()
            .resolve(dim)
            .ok_or_else(|| length_error("lower", dim))?;
        let upper = upper
            .into()
            .resolve(dim)
            .ok_or_else(|| length_error("upper", dim))?;
        for (idx, (lo, hi)) in lower.iter().zip(upper.iter()).enumerate() {
            if !lo.is_finite() || !hi.is_finite() {
                return Err(ElaError::InvalidBounds(
                    ErrorInfo::new("bounds_non_finite", "bounds must be finite")
                        .with_context("index", idx.to_string()),
                ));
            }
            if lo >= hi {
                return Err(ElaError::InvalidBounds(
                    ErrorInfo::new("bounds_order", "lower bound must be below upper bound")
                        .with_context("index", idx.to_string())
                        .with_context("lower", lo.to_string())
                        .with_context("upper", hi.to_string()),
                ));
            }
        }
        Ok(Self { lower, upper })
    }

    /// Number of dimensions.
    pub fn dim(&self) -> usize {
        self.lower.len()
    }

    /// Per-dimension lower bounds.
    pub fn lower(&self) -> &[f64] {
        &self.lower
    }

    /// Per-dimension upper bounds.
    pub fn upper(&self) -> &[f64] {
        &self.upper
    }

    /// Iterates over `(lower, upper)` pairs.
    pub fn pairs(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.lower.iter().copied().zip(self.upper.iter().copied())
    }

    /// Width `upper[i] - lower[i]` of every dimension.
    pub fn ranges(&self) -> Vec<f64> {
        self.pairs().map(|(lo, hi)| hi - lo).collect()
    }

    /// Returns true when `point` lies inside the box (inclusive).
    pub fn contains(&self, point: &[f64]) -> bool {
        point.len() == self.dim()
            && point
                .iter()
                .zip(self.pairs())
                .all(|(x, (lo, hi))| *x >= lo && *x <= hi)
    }
}

fn length_error(side: &str, dim: usize) -> ElaError {
    ElaError::InvalidBounds(
        ErrorInfo::new("bounds_length", format!("{side} bound length does not match dimension"))
            .with_context("side", side)
            .with_context("dim", dim.to_string()),
    )
}
