use std::collections::BTreeMap;

use chrono::Utc;
use ela_core::errors::ElaError;
use ela_core::provenance::{RunProvenance, SchemaVersion};
use serde::{Deserialize, Serialize};

use crate::plan::{Job, Plan};

/// Execution state of one job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum JobState {
    /// Every repetition was written.
    Complete,
    /// The job aborted before writing its table.
    Failed,
}

/// Report entry of one job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobReport {
    /// Job identifiers.
    pub job: Job,
    /// Final state.
    pub state: JobState,
    /// Rows written.
    pub rows: usize,
    /// File name of the feature table, relative to the output directory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    /// Extractor failures per extractor namespace, summed over repetitions.
    #[serde(default)]
    pub extractor_failures: BTreeMap<String, usize>,
    /// Error message of a failed job.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Report of a batch run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    /// Hash of the executed plan.
    pub plan_hash: String,
    /// Per-job results in job order.
    pub jobs: Vec<JobReport>,
    /// Provenance of the run.
    pub provenance: RunProvenance,
}

impl RunReport {
    /// Assembles the report of `plan`.
    pub fn new(plan: &Plan, jobs: Vec<JobReport>) -> Result<Self, ElaError> {
        Ok(Self {
            plan_hash: plan.plan_hash()?,
            jobs,
            provenance: provenance(plan)?,
        })
    }

    /// Number of jobs that completed.
    pub fn completed(&self) -> usize {
        self.jobs
            .iter()
            .filter(|job| job.state == JobState::Complete)
            .count()
    }
}

fn provenance(plan: &Plan) -> Result<RunProvenance, ElaError> {
    let mut versions = BTreeMap::new();
    versions.insert("ela-exp".to_string(), env!("CARGO_PKG_VERSION").to_string());
    Ok(RunProvenance {
        schema_version: SchemaVersion::default(),
        config_hash: plan.config.config_hash()?,
        created_at: Utc::now().to_rfc3339(),
        tool_versions: versions,
    })
}
