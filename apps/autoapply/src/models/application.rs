use serde::{Deserialize, Serialize};

use super::posting::JobPosting;

/// Outcome of one job's attempt loop. Built once per job per `apply` run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationResult {
    pub job: JobPosting,
    pub success: bool,
    /// Always >= 1.
    pub attempts: u32,
    pub message: String,
}

impl ApplicationResult {
    /// Status marker used by the CLI summary.
    pub fn status_marker(&self) -> &'static str {
        if self.success {
            "✅"
        } else {
            "⚠️"
        }
    }
}
