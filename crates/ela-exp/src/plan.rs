use std::fs;
use std::path::Path;

use ela_core::errors::ElaError;
use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::hash::stable_hash_string;
use crate::serde::{from_yaml_slice, serde_error, to_yaml_string};

/// One `(fid, dim, iid)` feature job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Job {
    /// Benchmark function identifier.
    pub fid: u64,
    /// Search-space dimension.
    pub dim: usize,
    /// Benchmark instance identifier.
    pub iid: u64,
}

/// Batch of feature jobs: the cross product of functions, dimensions and instances.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    /// Function identifiers.
    pub fids: Vec<u64>,
    /// Dimensions.
    pub dims: Vec<usize>,
    /// Instance identifiers.
    #[serde(default = "Plan::default_iids")]
    pub iids: Vec<u64>,
    /// Configuration shared by every job.
    #[serde(default)]
    pub config: EngineConfig,
}

impl Plan {
    fn default_iids() -> Vec<u64> {
        vec![1]
    }

    /// Jobs in ascending `(fid, dim, iid)` order.
    pub fn jobs(&self) -> Vec<Job> {
        let mut jobs = Vec::with_capacity(self.fids.len() * self.dims.len() * self.iids.len());
        for &fid in &self.fids {
            for &dim in &self.dims {
                for &iid in &self.iids {
                    jobs.push(Job { fid, dim, iid });
                }
            }
        }
        jobs.sort_unstable();
        jobs.dedup();
        jobs
    }

    /// Hash of the plan contents.
    pub fn plan_hash(&self) -> Result<String, ElaError> {
        stable_hash_string(self)
    }

    /// YAML representation of the plan.
    pub fn to_yaml_string(&self) -> Result<String, ElaError> {
        to_yaml_string(self)
    }
}

/// Loads a plan from disk with identifiers sorted and deduplicated.
pub fn load_plan<P: AsRef<Path>>(path: P) -> Result<Plan, ElaError> {
    let bytes = fs::read(path.as_ref()).map_err(|err| serde_error("plan_read", err))?;
    let mut plan: Plan = from_yaml_slice(&bytes)?;
    plan.fids.sort_unstable();
    plan.fids.dedup();
    plan.dims.sort_unstable();
    plan.dims.dedup();
    plan.iids.sort_unstable();
    plan.iids.dedup();
    Ok(plan)
}
