//! Evaluated sample tables.

use serde::{Deserialize, Serialize};

use crate::errors::{ElaError, ErrorInfo};
use crate::objective::Objective;

/// Points in the search space together with their objective values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    dim: usize,
    points: Vec<Vec<f64>>,
    values: Vec<f64>,
}

impl Sample {
    /// Builds a sample from pre-computed points and values.
    pub fn new(dim: usize, points: Vec<Vec<f64>>, values: Vec<f64>) -> Result<Self, ElaError> {
        if points.len() != values.len() {
            return Err(ElaError::InvalidParameter(
                ErrorInfo::new("sample_shape", "point and value counts differ")
                    .with_context("points", points.len().to_string())
                    .with_context("values", values.len().to_string()),
            ));
        }
        if let Some(row) = points.iter().position(|point| point.len() != dim) {
            return Err(ElaError::InvalidParameter(
                ErrorInfo::new("sample_shape", "point width does not match dimension")
                    .with_context("row", row.to_string())
                    .with_context("dim", dim.to_string()),
            ));
        }
        Ok(Self {
            dim,
            points,
            values,
        })
    }

    /// Evaluates `objective` on every point.
    pub fn evaluate(
        dim: usize,
        points: Vec<Vec<f64>>,
        objective: &dyn Objective,
    ) -> Result<Self, ElaError> {
        let values = points.iter().map(|x| objective.evaluate(x)).collect();
        Self::new(dim, points, values)
    }

    /// Number of coordinate columns.
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true when the sample has no rows.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Coordinate rows.
    pub fn points(&self) -> &[Vec<f64>] {
        &self.points
    }

    /// Objective column.
    pub fn values(&self) -> &[f64] {
        &self.values
    }
}
