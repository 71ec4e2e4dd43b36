//! Typed feature blocks and the flat per-repetition feature row.

use std::collections::BTreeMap;
use std::fmt;

use ela_core::ElaError;
use serde::{Deserialize, Serialize};

/// Closed set of feature extractors, in output order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ExtractorKind {
    /// Dispersion of multi-start local optima.
    HillClimbing,
    /// Ruggedness along axis-parallel random walks.
    Gradient,
    /// Fitness-distance correlation.
    FitnessDistance,
    /// Entropy of the length-scale distribution along a Lévy walk.
    LengthScale,
    /// Variable-interaction metrics from Sobol indices and binning.
    SobolIndices,
}

const HILL_CLIMBING_METRICS: &[&str] = &[
    "avg_dist_between_opt",
    "std_dist_between_opt",
    "avg_dist_local_to_global",
    "std_dist_local_to_global",
    "additional_function_eval",
    "costs_runtime",
];

const GRADIENT_METRICS: &[&str] = &[
    "g_avg",
    "g_std",
    "additional_function_eval",
    "costs_runtime",
];

const FITNESS_DISTANCE_METRICS: &[&str] = &[
    "fd_correlation",
    "fd_cov",
    "distance_mean",
    "distance_std",
    "fitness_mean",
    "fitness_std",
    "costs_runtime",
];

const LENGTH_SCALE_METRICS: &[&str] = &[
    "shanon_entropy",
    "mean",
    "std",
    "distribution.second_moment",
    "distribution.third_moment",
    "distribution.fourth_moment",
    "additional_function_eval",
    "costs_runtime",
];

const SOBOL_METRICS: &[&str] = &[
    "sobol_indices.degree_of_variable_interaction",
    "sobol_indices.coeff_var_x_sensitivy",
    "fitness_variance",
    "state_variance",
    "fitness_skewness",
    "state_skewness",
    "additional_function_eval",
    "costs_runtime",
];

/// Metric name shared by every block for its wall-clock cost.
pub const RUNTIME_METRIC: &str = "costs_runtime";

impl ExtractorKind {
    /// Every extractor in output order.
    pub const ALL: [ExtractorKind; 5] = [
        ExtractorKind::HillClimbing,
        ExtractorKind::Gradient,
        ExtractorKind::FitnessDistance,
        ExtractorKind::LengthScale,
        ExtractorKind::SobolIndices,
    ];

    /// Key prefix of the extractor's metrics.
    pub fn namespace(&self) -> &'static str {
        match self {
            ExtractorKind::HillClimbing => "hill_climbing",
            ExtractorKind::Gradient => "gradient",
            ExtractorKind::FitnessDistance => "fitness_distance",
            ExtractorKind::LengthScale => "length_scale",
            ExtractorKind::SobolIndices => "fla_metrics",
        }
    }

    /// Metric names, in the order [`FeatureSet::values`] reports them.
    pub fn metrics(&self) -> &'static [&'static str] {
        match self {
            ExtractorKind::HillClimbing => HILL_CLIMBING_METRICS,
            ExtractorKind::Gradient => GRADIENT_METRICS,
            ExtractorKind::FitnessDistance => FITNESS_DISTANCE_METRICS,
            ExtractorKind::LengthScale => LENGTH_SCALE_METRICS,
            ExtractorKind::SobolIndices => SOBOL_METRICS,
        }
    }

    /// Fully qualified `"<namespace>.<metric>"` keys.
    pub fn keys(&self) -> Vec<String> {
        self.metrics()
            .iter()
            .map(|metric| format!("{}.{}", self.namespace(), metric))
            .collect()
    }
}

impl fmt::Display for ExtractorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.namespace())
    }
}

/// Typed output of one extractor.
pub trait FeatureSet {
    /// Extractor that produced the values.
    fn kind(&self) -> ExtractorKind;

    /// Values aligned with `self.kind().metrics()`.
    fn values(&self) -> Vec<f64>;

    /// Converts the typed output into a row block.
    fn to_block(&self) -> FeatureBlock {
        FeatureBlock {
            kind: self.kind(),
            values: self.values(),
        }
    }
}

/// Values of one extractor, aligned with its metric list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureBlock {
    /// Producing extractor.
    pub kind: ExtractorKind,
    /// One value per metric.
    pub values: Vec<f64>,
}

impl FeatureBlock {
    /// Placeholder block for a failed extractor.
    pub fn nan(kind: ExtractorKind) -> Self {
        Self {
            kind,
            values: vec![f64::NAN; kind.metrics().len()],
        }
    }

    /// `(key, value)` pairs of the block.
    pub fn entries(&self) -> impl Iterator<Item = (String, f64)> + '_ {
        self.kind
            .metrics()
            .iter()
            .zip(self.values.iter().copied())
            .map(|(metric, value)| (format!("{}.{}", self.kind.namespace(), metric), value))
    }
}

/// Extractor failure recorded alongside its NaN block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractorFailure {
    /// Failed extractor.
    pub kind: ExtractorKind,
    /// Error returned by the extractor.
    pub error: ElaError,
}

/// Features of one repetition on one `(fid, dim, iid)` problem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRow {
    /// Benchmark function identifier.
    pub fid: u64,
    /// Search-space dimension.
    pub dim: usize,
    /// Benchmark instance identifier.
    pub iid: u64,
    /// Repetition index.
    pub rep: usize,
    blocks: BTreeMap<ExtractorKind, FeatureBlock>,
    failures: Vec<ExtractorFailure>,
}

impl FeatureRow {
    /// Creates an empty row.
    pub fn new(fid: u64, dim: usize, iid: u64, rep: usize) -> Self {
        Self {
            fid,
            dim,
            iid,
            rep,
            blocks: BTreeMap::new(),
            failures: Vec::new(),
        }
    }

    /// Stores the block of an extractor, replacing an earlier one of the same kind.
    pub fn insert(&mut self, block: FeatureBlock) {
        self.blocks.insert(block.kind, block);
    }

    /// Stores the outcome of an extractor; failures become NaN blocks.
    pub fn record<S: FeatureSet>(&mut self, kind: ExtractorKind, outcome: Result<S, ElaError>) {
        match outcome {
            Ok(features) => self.insert(features.to_block()),
            Err(error) => {
                self.insert(FeatureBlock::nan(kind));
                self.failures.retain(|failure| failure.kind != kind);
                self.failures.push(ExtractorFailure { kind, error });
            }
        }
    }

    /// Sets every `costs_runtime` value to zero.
    pub fn clear_runtimes(&mut self) {
        for block in self.blocks.values_mut() {
            if let Some(idx) = block.kind.metrics().iter().position(|m| *m == RUNTIME_METRIC) {
                block.values[idx] = 0.0;
            }
        }
    }

    /// Block of `kind`, if present.
    pub fn block(&self, kind: ExtractorKind) -> Option<&FeatureBlock> {
        self.blocks.get(&kind)
    }

    /// Blocks in output order.
    pub fn blocks(&self) -> impl Iterator<Item = &FeatureBlock> {
        self.blocks.values()
    }

    /// Extractors that failed for this row.
    pub fn failures(&self) -> &[ExtractorFailure] {
        &self.failures
    }

    /// Looks up a value by its full key.
    pub fn get(&self, key: &str) -> Option<f64> {
        self.entries()
            .into_iter()
            .find_map(|(k, v)| (k == key).then_some(v))
    }

    /// Flat view: identifiers first, then every block in output order.
    pub fn entries(&self) -> Vec<(String, f64)> {
        let mut out = vec![
            ("fid".to_string(), self.fid as f64),
            ("dim".to_string(), self.dim as f64),
            ("iid".to_string(), self.iid as f64),
            ("rep".to_string(), self.rep as f64),
        ];
        for block in self.blocks.values() {
            out.extend(block.entries());
        }
        out
    }

    /// [`entries`](Self::entries) without wall-clock timings.
    pub fn deterministic_entries(&self) -> Vec<(String, f64)> {
        self.entries()
            .into_iter()
            .filter(|(key, _)| !is_runtime_key(key))
            .collect()
    }
}

/// Returns true for `*.costs_runtime` keys.
pub fn is_runtime_key(key: &str) -> bool {
    key.rsplit('.').next() == Some(RUNTIME_METRIC)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ela_core::ErrorInfo;

    struct Fixed(Vec<f64>);

    impl FeatureSet for Fixed {
        fn kind(&self) -> ExtractorKind {
            ExtractorKind::Gradient
        }

        fn values(&self) -> Vec<f64> {
            self.0.clone()
        }
    }

    #[test]
    fn namespaces_are_unique() {
        let mut seen: Vec<&str> = ExtractorKind::ALL.iter().map(|k| k.namespace()).collect();
        seen.sort_unstable();
        seen.dedup();
        assert_eq!(seen.len(), ExtractorKind::ALL.len());
    }

    #[test]
    fn failures_keep_the_key_set() {
        let mut ok = FeatureRow::new(1, 2, 3, 0);
        ok.record(ExtractorKind::Gradient, Ok(Fixed(vec![1.0, 2.0, 3.0, 0.5])));
        let mut failed = FeatureRow::new(1, 2, 3, 0);
        failed.record::<Fixed>(
            ExtractorKind::Gradient,
            Err(ElaError::InvalidParameter(ErrorInfo::new("x", "boom"))),
        );
        let keys = |row: &FeatureRow| row.entries().into_iter().map(|(k, _)| k).collect::<Vec<_>>();
        assert_eq!(keys(&ok), keys(&failed));
        assert_eq!(failed.failures().len(), 1);
        assert!(failed.get("gradient.g_avg").unwrap().is_nan());
        assert_eq!(ok.get("gradient.g_std"), Some(2.0));
    }

    #[test]
    fn deterministic_view_drops_timings() {
        let mut row = FeatureRow::new(1, 2, 3, 0);
        row.insert(FeatureBlock::nan(ExtractorKind::SobolIndices));
        let keys: Vec<String> = row.deterministic_entries().into_iter().map(|(k, _)| k).collect();
        assert!(!keys.iter().any(|k| k.ends_with("costs_runtime")));
        assert!(keys.contains(&"fla_metrics.sobol_indices.coeff_var_x_sensitivy".to_string()));
    }
}
