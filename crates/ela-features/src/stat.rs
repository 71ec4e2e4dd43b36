use std::collections::BTreeMap;

/// Arithmetic mean; NaN for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Variance with `ddof` delta degrees of freedom.
///
/// NaN when fewer than `ddof + 1` values are available.
pub fn variance(values: &[f64], ddof: usize) -> f64 {
    if values.len() <= ddof {
        return f64::NAN;
    }
    let mu = mean(values);
    let sum_sq: f64 = values.iter().map(|v| (v - mu) * (v - mu)).sum();
    sum_sq / (values.len() - ddof) as f64
}

/// Standard deviation with `ddof` delta degrees of freedom.
pub fn std_dev(values: &[f64], ddof: usize) -> f64 {
    variance(values, ddof).sqrt()
}

/// Population central moment of order `order`.
pub fn central_moment(values: &[f64], order: i32) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    let mu = mean(values);
    values.iter().map(|v| (v - mu).powi(order)).sum::<f64>() / values.len() as f64
}

/// Minimum ignoring nothing; NaN values poison the result.
pub fn min(values: &[f64]) -> f64 {
    values.iter().copied().fold(f64::INFINITY, f64::min)
}

/// Maximum counterpart of [`min`].
pub fn max(values: &[f64]) -> f64 {
    values.iter().copied().fold(f64::NEG_INFINITY, f64::max)
}

/// Shannon entropy (natural log) of a distribution given by raw weights.
///
/// Weights are normalized to sum to one; zero weights contribute nothing.
pub fn entropy(weights: &[f64]) -> f64 {
    entropy_base(weights, std::f64::consts::E)
}

/// Shannon entropy in the given logarithm base.
pub fn entropy_base(weights: &[f64], base: f64) -> f64 {
    let total: f64 = weights.iter().sum();
    if weights.is_empty() || total == 0.0 {
        return f64::NAN;
    }
    let nats: f64 = weights
        .iter()
        .filter(|w| **w > 0.0)
        .map(|w| {
            let p = w / total;
            -p * p.ln()
        })
        .sum();
    nats / base.ln()
}

/// Frequency of every distinct value after rounding to `decimals` places.
///
/// Rounding uses round-half-to-even. The counts are returned in ascending
/// order of the rounded value so that the result is deterministic.
pub fn rounded_value_counts(values: &[f64], decimals: i32) -> Vec<usize> {
    let factor = 10f64.powi(decimals);
    let mut counts: BTreeMap<OrderedBits, usize> = BTreeMap::new();
    for value in values {
        let rounded = (value * factor).round_ties_even() / factor;
        *counts.entry(OrderedBits::new(rounded)).or_insert(0) += 1;
    }
    counts.into_values().collect()
}

/// Total order over finite and infinite floats via their bit patterns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct OrderedBits(i64);

impl OrderedBits {
    fn new(value: f64) -> Self {
        // -0.0 and 0.0 share one bucket
        let value = if value == 0.0 { 0.0 } else { value };
        let bits = value.to_bits() as i64;
        Self(if bits < 0 { bits ^ i64::MAX } else { bits })
    }
}

/// One-dimensional Gaussian kernel density estimate with Scott's bandwidth.
#[derive(Debug, Clone)]
pub struct GaussianKde {
    data: Vec<f64>,
    bandwidth: f64,
}

impl GaussianKde {
    /// Fits the estimate; the bandwidth is `σ · n^(-1/5)` with `σ` the sample
    /// standard deviation.
    pub fn fit(data: &[f64]) -> Self {
        let factor = (data.len() as f64).powf(-0.2);
        Self {
            data: data.to_vec(),
            bandwidth: std_dev(data, 1) * factor,
        }
    }

    /// Density at `x`.
    pub fn pdf(&self, x: f64) -> f64 {
        let norm = 1.0 / (self.bandwidth * (2.0 * std::f64::consts::PI).sqrt());
        let sum: f64 = self
            .data
            .iter()
            .map(|d| {
                let z = (x - d) / self.bandwidth;
                (-0.5 * z * z).exp()
            })
            .sum();
        norm * sum / self.data.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn variance_respects_ddof() {
        let values = [1.0, 2.0, 3.0, 4.0];
        assert!((variance(&values, 0) - 1.25).abs() < 1e-12);
        assert!((variance(&values, 1) - 5.0 / 3.0).abs() < 1e-12);
        assert!(std_dev(&[1.0], 1).is_nan());
        assert!(mean(&[]).is_nan());
    }

    #[test]
    fn central_moments_of_symmetric_data() {
        let values = [-2.0, -1.0, 1.0, 2.0];
        assert!((central_moment(&values, 2) - 2.5).abs() < 1e-12);
        assert!(central_moment(&values, 3).abs() < 1e-12);
        assert!((central_moment(&values, 4) - 8.5).abs() < 1e-12);
    }

    #[test]
    fn entropy_of_uniform_counts() {
        let h = entropy(&[1.0, 1.0, 1.0, 1.0]);
        assert!((h - 4f64.ln()).abs() < 1e-12);
        assert!((entropy_base(&[2.0, 2.0], 2.0) - 1.0).abs() < 1e-12);
        assert!(entropy(&[]).is_nan());
    }

    #[test]
    fn rounding_merges_near_duplicates() {
        let counts = rounded_value_counts(&[0.1234561, 0.1234564, 2.0, f64::INFINITY], 6);
        assert_eq!(counts, vec![2, 1, 1]);
        let negatives = rounded_value_counts(&[-1.0, -2.0, -0.0, 0.0], 6);
        assert_eq!(negatives, vec![1, 1, 2]);
    }

    #[test]
    fn kde_integrates_to_about_one() {
        let data: Vec<f64> = (0..50).map(|i| (i as f64 * 0.37).sin()).collect();
        let kde = GaussianKde::fit(&data);
        let step = 0.01;
        let area: f64 = (-600..600).map(|i| kde.pdf(i as f64 * step) * step).sum();
        assert!((area - 1.0).abs() < 1e-3);
    }
}
