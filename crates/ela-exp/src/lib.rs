#![deny(missing_docs)]
#![doc = "Experiment driver for ELA feature computation: configuration, benchmark suites, repetitions, CSV output and batch plans."]

/// Engine configuration and YAML loading.
pub mod config;
/// Batch execution on a thread pool.
pub mod dispatch;
/// Per-problem repetition driver.
pub mod driver;
/// Canonical hashing helpers.
pub mod hash;
/// Feature tables, CSV persistence and sanitization.
pub mod output;
/// Batch plans.
pub mod plan;
/// Run reports.
pub mod report;
/// Canonical JSON and YAML helpers.
pub mod serde;
/// Benchmark suites and built-in test problems.
pub mod suite;

pub use config::{load_config, BoundsSpec, EngineConfig, ExtractorConfig};
pub use dispatch::{run_plan, run_plan_from_path, RunOpts};
pub use driver::{compute, compute_problem};
pub use output::{feature_file_name, write_feature_csv, FeatureMatrix};
pub use plan::{load_plan, Job, Plan};
pub use report::{JobReport, JobState, RunReport};
pub use suite::{Suite, TestFunction, TestProblem, TestSuite};
