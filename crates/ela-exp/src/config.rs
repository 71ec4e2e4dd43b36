use std::fs;
use std::path::Path;

use ela_core::errors::ElaError;
use ela_core::{Bounds, ScalarOrVec};
use ela_features::{
    ExtractorKind, FitnessDistanceOptions, GradientOptions, HillClimbingOptions,
    LengthScaleOptions, SampleMethod, SobolIndicesOptions,
};
use serde::{Deserialize, Serialize};

use crate::hash::stable_hash_string;
use crate::serde::{from_yaml_slice, serde_error, to_yaml_string};

/// Search-space box shared by every problem of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundsSpec {
    /// Lower bound, scalar or per dimension.
    #[serde(default = "BoundsSpec::default_lower")]
    pub lower: ScalarOrVec,
    /// Upper bound, scalar or per dimension.
    #[serde(default = "BoundsSpec::default_upper")]
    pub upper: ScalarOrVec,
}

impl BoundsSpec {
    fn default_lower() -> ScalarOrVec {
        ScalarOrVec::Scalar(-5.0)
    }

    fn default_upper() -> ScalarOrVec {
        ScalarOrVec::Scalar(5.0)
    }

    /// Validated bounds for a `dim`-dimensional problem.
    pub fn resolve(&self, dim: usize) -> Result<Bounds, ElaError> {
        Bounds::normalize(dim, self.lower.clone(), self.upper.clone())
    }
}

impl Default for BoundsSpec {
    fn default() -> Self {
        Self {
            lower: Self::default_lower(),
            upper: Self::default_upper(),
        }
    }
}

/// Options of every extractor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ExtractorConfig {
    /// Hill-climbing options.
    #[serde(default)]
    pub hill_climbing: HillClimbingOptions,
    /// Gradient options.
    #[serde(default)]
    pub gradient: GradientOptions,
    /// Fitness-distance options.
    #[serde(default)]
    pub fitness_distance: FitnessDistanceOptions,
    /// Length-scale options.
    #[serde(default)]
    pub length_scale: LengthScaleOptions,
    /// Sobol-index options.
    #[serde(default)]
    pub sobol_indices: SobolIndicesOptions,
}

impl ExtractorConfig {
    /// Budgets used together with a sample-size factor of 500.
    pub fn large_budget() -> Self {
        Self {
            hill_climbing: HillClimbingOptions {
                n_runs: 200,
                budget_factor_per_run: 80,
                ..HillClimbingOptions::default()
            },
            gradient: GradientOptions {
                budget_per_random_walk: 1000,
                ..GradientOptions::default()
            },
            fitness_distance: FitnessDistanceOptions::default(),
            length_scale: LengthScaleOptions {
                budget_factor_per_dim: 100,
                ..LengthScaleOptions::default()
            },
            sobol_indices: SobolIndicesOptions::default(),
        }
    }

    /// Budget preset of a sample-size factor: large for 500, small otherwise.
    pub fn for_sample_size_factor(factor: usize) -> Self {
        if factor == 500 {
            Self::large_budget()
        } else {
            Self::small_budget()
        }
    }

    /// Budgets used with every other sample-size factor.
    pub fn small_budget() -> Self {
        Self {
            hill_climbing: HillClimbingOptions {
                n_runs: 50,
                budget_factor_per_run: 50,
                ..HillClimbingOptions::default()
            },
            gradient: GradientOptions {
                budget_per_random_walk: 50,
                ..GradientOptions::default()
            },
            fitness_distance: FitnessDistanceOptions::default(),
            length_scale: LengthScaleOptions {
                budget_factor_per_dim: 50,
                ..LengthScaleOptions::default()
            },
            sobol_indices: SobolIndicesOptions {
                sampling_coefficient: 50,
                ..SobolIndicesOptions::default()
            },
        }
    }
}

/// Configuration of one feature-computation job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Search-space bounds.
    #[serde(default)]
    pub bounds: BoundsSpec,
    /// Repetitions per `(fid, dim, iid)`.
    #[serde(default = "EngineConfig::default_repetitions")]
    pub repetitions: usize,
    /// Initial sample has `sample_size_factor * dim` rows.
    #[serde(default = "EngineConfig::default_sample_size_factor")]
    pub sample_size_factor: usize,
    /// Design of the initial sample.
    #[serde(default)]
    pub sample_method: SampleMethod,
    /// Extractors to run, in any order; output order is fixed.
    #[serde(default = "EngineConfig::default_extractors")]
    pub extractors: Vec<ExtractorKind>,
    /// Per-extractor options; when absent the budget preset of
    /// `sample_size_factor` applies.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<ExtractorConfig>,
    /// When false every `costs_runtime` value is written as zero.
    #[serde(default = "EngineConfig::default_record_runtime")]
    pub record_runtime: bool,
}

impl EngineConfig {
    fn default_repetitions() -> usize {
        10
    }

    fn default_sample_size_factor() -> usize {
        50
    }

    fn default_extractors() -> Vec<ExtractorKind> {
        ExtractorKind::ALL.to_vec()
    }

    fn default_record_runtime() -> bool {
        true
    }

    /// Default configuration with the budgets matching `factor`.
    pub fn for_sample_size_factor(factor: usize) -> Self {
        Self {
            sample_size_factor: factor,
            options: Some(ExtractorConfig::for_sample_size_factor(factor)),
            ..Self::default()
        }
    }

    /// Extractor options in effect: the explicit ones, else the preset of
    /// `sample_size_factor`.
    pub fn extractor_options(&self) -> ExtractorConfig {
        self.options
            .clone()
            .unwrap_or_else(|| ExtractorConfig::for_sample_size_factor(self.sample_size_factor))
    }

    /// Whether `kind` is enabled.
    pub fn runs(&self, kind: ExtractorKind) -> bool {
        self.extractors.contains(&kind)
    }

    /// Hash of the configuration contents.
    pub fn config_hash(&self) -> Result<String, ElaError> {
        stable_hash_string(self)
    }

    /// YAML representation of the configuration.
    pub fn to_yaml_string(&self) -> Result<String, ElaError> {
        to_yaml_string(self)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            bounds: BoundsSpec::default(),
            repetitions: Self::default_repetitions(),
            sample_size_factor: Self::default_sample_size_factor(),
            sample_method: SampleMethod::default(),
            extractors: Self::default_extractors(),
            options: None,
            record_runtime: Self::default_record_runtime(),
        }
    }
}

/// Loads an engine configuration from a YAML file.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<EngineConfig, ElaError> {
    let bytes = fs::read(path.as_ref()).map_err(|err| serde_error("config_read", err))?;
    from_yaml_slice(&bytes)
}
