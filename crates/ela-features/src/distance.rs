//! Pairwise distance computations over point tables.
//!
//! Condensed vectors follow the usual upper-triangle, row-major layout: the
//! entry for the pair `(i, j)` with `i < j` sits at
//! `n * i - i * (i + 1) / 2 + (j - i - 1)`.

/// Minkowski distance `(Σ|a_i - b_i|^p)^(1/p)`.
///
/// `p = 1` and `p = 2` use exact cityblock and Euclidean formulas, `p = inf`
/// the Chebyshev distance.
pub fn minkowski(a: &[f64], b: &[f64], p: f64) -> f64 {
    let diffs = a.iter().zip(b.iter()).map(|(x, y)| (x - y).abs());
    if p == 1.0 {
        diffs.sum()
    } else if p == 2.0 {
        diffs.map(|d| d * d).sum::<f64>().sqrt()
    } else if p.is_infinite() {
        diffs.fold(0.0, f64::max)
    } else {
        diffs.map(|d| d.powf(p)).sum::<f64>().powf(1.0 / p)
    }
}

/// Cityblock (Manhattan) distance.
pub fn cityblock(a: &[f64], b: &[f64]) -> f64 {
    minkowski(a, b, 1.0)
}

/// Full distance matrix between the rows of `a` and the rows of `b`.
pub fn cdist(a: &[Vec<f64>], b: &[Vec<f64>], p: f64) -> Vec<Vec<f64>> {
    a.iter()
        .map(|row| b.iter().map(|other| minkowski(row, other, p)).collect())
        .collect()
}

/// Condensed pairwise Minkowski distances between the rows of `points`.
pub fn pdist(points: &[Vec<f64>], p: f64) -> Vec<f64> {
    let n = points.len();
    let mut out = Vec::with_capacity(n * n.saturating_sub(1) / 2);
    for i in 0..n {
        for j in (i + 1)..n {
            out.push(minkowski(&points[i], &points[j], p));
        }
    }
    out
}

/// Condensed pairwise cityblock distances between scalar values.
pub fn pdist_cityblock(values: &[f64]) -> Vec<f64> {
    let n = values.len();
    let mut out = Vec::with_capacity(n * n.saturating_sub(1) / 2);
    for i in 0..n {
        for j in (i + 1)..n {
            out.push((values[i] - values[j]).abs());
        }
    }
    out
}

/// Expands a condensed vector into a symmetric matrix with zero diagonal.
///
/// Returns `None` when the length is not a triangular number.
pub fn squareform(condensed: &[f64]) -> Option<Vec<Vec<f64>>> {
    let n = points_for_condensed(condensed.len())?;
    let mut matrix = vec![vec![0.0; n]; n];
    let mut idx = 0;
    for i in 0..n {
        for j in (i + 1)..n {
            matrix[i][j] = condensed[idx];
            matrix[j][i] = condensed[idx];
            idx += 1;
        }
    }
    Some(matrix)
}

/// Collapses a square distance matrix into its condensed upper triangle.
pub fn to_condensed(matrix: &[Vec<f64>]) -> Vec<f64> {
    let n = matrix.len();
    let mut out = Vec::with_capacity(n * n.saturating_sub(1) / 2);
    for (i, row) in matrix.iter().enumerate() {
        out.extend_from_slice(&row[(i + 1).min(row.len())..]);
    }
    out
}

fn points_for_condensed(len: usize) -> Option<usize> {
    // n (n - 1) / 2 = len
    let n = ((1.0 + (1.0 + 8.0 * len as f64).sqrt()) / 2.0).round() as usize;
    (n * n.saturating_sub(1) / 2 == len).then_some(n.max(1))
}
