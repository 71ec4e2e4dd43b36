#![deny(missing_docs)]
#![doc = "Sampling strategies, local search and exploratory landscape analysis feature extractors."]

/// Pairwise Minkowski distances and condensed/square conversions.
pub mod distance;
/// Fitness-distance correlation of an evaluated sample.
pub mod fitness_distance;
/// Gradient-based ruggedness along axis-parallel random walks.
pub mod gradient;
/// Dispersion of multi-start local optima.
pub mod hill_climbing;
/// Length-scale entropy along a Lévy-flight walk.
pub mod length_scales;
/// Multi-start bounded local search.
pub mod local_search;
/// Box-constrained local optimizers.
pub mod optimize;
/// Typed feature blocks and feature rows.
pub mod row;
/// Initial designs, uniform draws and Lévy-flight steps.
pub mod sampling;
/// Sobol sensitivity indices and fitness/state binning metrics.
pub mod sobol_indices;
/// Descriptive statistics, entropy and kernel density estimation.
pub mod stat;

pub use fitness_distance::{
    calculate_fitness_distance_correlation, FitnessDistanceFeatures, FitnessDistanceOptions,
};
pub use gradient::{calculate_gradient, GradientFeatures, GradientOptions};
pub use hill_climbing::{calculate_hill_climbing, HillClimbingFeatures, HillClimbingOptions};
pub use length_scales::{calculate_length_scales, LengthScaleFeatures, LengthScaleOptions};
pub use local_search::{run_multi_start, LocalSearchMethod, LocalSearchOptions};
pub use row::{ExtractorFailure, ExtractorKind, FeatureBlock, FeatureRow, FeatureSet};
pub use sampling::{create_initial_sample, levy_random_walk_step, SampleMethod, SampleSize};
pub use sobol_indices::{calculate_sobol_indices, SobolFeatures, SobolIndicesOptions};
