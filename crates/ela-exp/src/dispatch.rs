use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use ela_core::errors::ElaError;
use rayon::prelude::*;
use tracing::{info, warn};

use crate::driver::compute;
use crate::output::write_feature_csv;
use crate::plan::{load_plan, Job, Plan};
use crate::report::{JobReport, JobState, RunReport};
use crate::serde::{serde_error, to_canonical_json_bytes};
use crate::suite::Suite;

/// File name of the batch report inside the output directory.
pub const REPORT_FILE: &str = "ela_report.json";

/// Options governing batch execution.
#[derive(Debug, Clone)]
pub struct RunOpts {
    /// Number of jobs executed in parallel.
    pub concurrency: usize,
    /// Skip jobs whose feature table already exists.
    pub resume: bool,
}

impl Default for RunOpts {
    fn default() -> Self {
        Self {
            concurrency: 1,
            resume: false,
        }
    }
}

/// Runs every job of `plan`, writing one CSV per job and a JSON report into `out`.
///
/// A failing job is recorded in the report and does not stop the others.
pub fn run_plan(
    plan: &Plan,
    suite: &dyn Suite,
    out: &Path,
    opts: &RunOpts,
) -> Result<RunReport, ElaError> {
    fs::create_dir_all(out).map_err(|err| serde_error("plan_out_dir", err))?;
    let jobs = plan.jobs();
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(opts.concurrency.max(1))
        .build()
        .map_err(|err| serde_error("thread_pool", err))?;
    info!(jobs = jobs.len(), concurrency = opts.concurrency.max(1), "running plan");

    let mut reports: Vec<JobReport> = pool.install(|| {
        jobs.par_iter()
            .map(|job| process_job(plan, suite, out, *job, opts))
            .collect()
    });
    reports.sort_by_key(|report| report.job);

    let report = RunReport::new(plan, reports)?;
    let bytes = to_canonical_json_bytes(&report)?;
    fs::write(out.join(REPORT_FILE), bytes).map_err(|err| serde_error("report_write", err))?;
    Ok(report)
}

/// Loads a plan from disk and runs it.
pub fn run_plan_from_path(
    plan_path: &Path,
    suite: &dyn Suite,
    out: &Path,
    opts: &RunOpts,
) -> Result<RunReport, ElaError> {
    let plan = load_plan(plan_path)?;
    run_plan(&plan, suite, out, opts)
}

fn process_job(plan: &Plan, suite: &dyn Suite, out: &Path, job: Job, opts: &RunOpts) -> JobReport {
    let file_name =
        crate::output::feature_file_name(job.fid, job.dim, job.iid, plan.config.sample_size_factor);
    if opts.resume && out.join(&file_name).exists() {
        info!(fid = job.fid, dim = job.dim, iid = job.iid, "feature table exists; skipping");
        return JobReport {
            job,
            state: JobState::Complete,
            rows: plan.config.repetitions,
            file: Some(file_name),
            extractor_failures: BTreeMap::new(),
            error: None,
        };
    }

    let outcome = compute(suite, job.fid, job.dim, job.iid, &plan.config).and_then(|rows| {
        let path = write_feature_csv(out, &rows, plan.config.sample_size_factor)?;
        Ok((rows, path))
    });
    match outcome {
        Ok((rows, path)) => {
            let mut extractor_failures = BTreeMap::new();
            for failure in rows.iter().flat_map(|row| row.failures()) {
                *extractor_failures
                    .entry(failure.kind.namespace().to_string())
                    .or_insert(0) += 1;
            }
            JobReport {
                job,
                state: JobState::Complete,
                rows: rows.len(),
                file: path
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned()),
                extractor_failures,
                error: None,
            }
        }
        Err(err) => {
            warn!(fid = job.fid, dim = job.dim, iid = job.iid, error = %err, "feature job failed");
            JobReport {
                job,
                state: JobState::Failed,
                rows: 0,
                file: None,
                extractor_failures: BTreeMap::new(),
                error: Some(err.to_string()),
            }
        }
    }
}
