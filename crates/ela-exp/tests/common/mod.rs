use ela_exp::{EngineConfig, ExtractorConfig};
use ela_features::{
    FitnessDistanceOptions, GradientOptions, HillClimbingOptions, LengthScaleOptions,
    SobolIndicesOptions,
};

/// Tiny budgets so that a full repetition runs in milliseconds.
pub fn tiny_config(repetitions: usize) -> EngineConfig {
    EngineConfig {
        repetitions,
        sample_size_factor: 20,
        options: Some(ExtractorConfig {
            hill_climbing: HillClimbingOptions {
                n_runs: 4,
                budget_factor_per_run: 40,
                ..HillClimbingOptions::default()
            },
            gradient: GradientOptions {
                budget_per_random_walk: 20,
                ..GradientOptions::default()
            },
            fitness_distance: FitnessDistanceOptions::default(),
            length_scale: LengthScaleOptions {
                budget_factor_per_dim: 5,
                ..LengthScaleOptions::default()
            },
            sobol_indices: SobolIndicesOptions {
                sampling_coefficient: 16,
                ..SobolIndicesOptions::default()
            },
        }),
        ..EngineConfig::default()
    }
}
