use std::time::Instant;

use ela_core::errors::ElaError;
use ela_core::{repetition_seed, Bounds, Objective, Problem, RngHandle, Sample};
use ela_features::{
    calculate_fitness_distance_correlation, calculate_gradient, calculate_hill_climbing,
    calculate_length_scales, calculate_sobol_indices, create_initial_sample, ExtractorKind,
    FeatureRow, SampleSize,
};
use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::suite::Suite;

/// Substream of the repetition seed that draws the initial sample.
pub const INITIAL_SAMPLE_STREAM: u64 = 0;

/// Substream of the repetition seed handed to `kind`.
pub fn extractor_stream(kind: ExtractorKind) -> u64 {
    match kind {
        ExtractorKind::HillClimbing => 1,
        ExtractorKind::Gradient => 2,
        ExtractorKind::FitnessDistance => 3,
        ExtractorKind::LengthScale => 4,
        ExtractorKind::SobolIndices => 5,
    }
}

/// Computes one feature row per repetition for problem `(fid, dim, iid)` of `suite`.
pub fn compute(
    suite: &dyn Suite,
    fid: u64,
    dim: usize,
    iid: u64,
    config: &EngineConfig,
) -> Result<Vec<FeatureRow>, ElaError> {
    let problem = suite.problem(fid, dim, iid)?;
    compute_problem(problem.as_ref(), config)
}

/// Computes one feature row per repetition for an already built problem.
///
/// Only configuration errors (bounds, initial sample) abort the call; an
/// extractor failure becomes a NaN block in the affected row.
pub fn compute_problem(
    problem: &dyn Problem,
    config: &EngineConfig,
) -> Result<Vec<FeatureRow>, ElaError> {
    let started = Instant::now();
    let fid = problem.id_function();
    let iid = problem.id_instance();
    let dim = problem.dimension();
    let bounds = config.bounds.resolve(dim)?;

    let mut rows = Vec::with_capacity(config.repetitions);
    for rep in 0..config.repetitions {
        let master = repetition_seed(fid, iid, dim as u64, rep as u64);
        rows.push(compute_repetition(problem, &bounds, config, rep, master)?);
    }
    info!(
        fid,
        dim,
        iid,
        repetitions = rows.len(),
        elapsed_s = started.elapsed().as_secs_f64(),
        "feature job finished"
    );
    Ok(rows)
}

fn compute_repetition(
    problem: &dyn Problem,
    bounds: &Bounds,
    config: &EngineConfig,
    rep: usize,
    master: u64,
) -> Result<FeatureRow, ElaError> {
    let dim = bounds.dim();
    let mut row = FeatureRow::new(problem.id_function(), dim, problem.id_instance(), rep);
    let objective = |x: &[f64]| problem.evaluate(x);
    let f: &dyn Objective = &objective;

    let sample = if config.runs(ExtractorKind::FitnessDistance) {
        let mut rng = RngHandle::substream(master, INITIAL_SAMPLE_STREAM);
        let points = create_initial_sample(
            bounds,
            SampleSize::Coefficient(config.sample_size_factor),
            config.sample_method,
            &mut rng,
        )?;
        Some(Sample::evaluate(dim, points, f)?)
    } else {
        None
    };
    debug!(rep, master, "repetition started");

    let options = config.extractor_options();
    for kind in ExtractorKind::ALL {
        if !config.runs(kind) {
            continue;
        }
        let mut rng = RngHandle::substream(master, extractor_stream(kind));
        match kind {
            ExtractorKind::HillClimbing => row.record(
                kind,
                calculate_hill_climbing(f, bounds, &options.hill_climbing, &mut rng),
            ),
            ExtractorKind::Gradient => {
                row.record(kind, calculate_gradient(f, bounds, &options.gradient, &mut rng))
            }
            ExtractorKind::FitnessDistance => {
                if let Some(sample) = &sample {
                    row.record(
                        kind,
                        calculate_fitness_distance_correlation(sample, &options.fitness_distance),
                    )
                }
            }
            ExtractorKind::LengthScale => row.record(
                kind,
                calculate_length_scales(f, bounds, &options.length_scale, &mut rng),
            ),
            ExtractorKind::SobolIndices => row.record(
                kind,
                calculate_sobol_indices(f, bounds, &options.sobol_indices, &mut rng),
            ),
        }
    }
    for failure in row.failures() {
        warn!(
            extractor = %failure.kind,
            rep,
            error = %failure.error,
            "extractor failed; writing NaN features"
        );
    }
    if !config.record_runtime {
        row.clear_runtimes();
    }
    Ok(row)
}
