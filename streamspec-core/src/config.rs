//! Environment configuration.
//!
//! Defaults name the job `streamspec-job` and freeze every stream a plan or
//! walk covers.

use serde::{Deserialize, Serialize};

/// Builder-side configuration of a stream environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphConfig {
    /// Name carried into every [`GraphPlan`](crate::plan::GraphPlan).
    pub job_name: String,
    /// Freeze the reachable streams when a plan or walk snapshots them.
    pub freeze_on_plan: bool,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            job_name: "streamspec-job".to_string(),
            freeze_on_plan: true,
        }
    }
}

impl GraphConfig {
    /// Default configuration for the job `job_name`.
    pub fn new(job_name: impl Into<String>) -> Self {
        Self {
            job_name: job_name.into(),
            ..Self::default()
        }
    }

    /// Choose whether planning and walking freeze the covered streams.
    pub fn with_freeze_on_plan(mut self, freeze_on_plan: bool) -> Self {
        self.freeze_on_plan = freeze_on_plan;
        self
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
