//! Result and summary types for plan/apply runs

use crate::error::NodeError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome of one node in an apply run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeResult {
    /// Identity of the node
    pub id: String,
    /// Whether the node ended in its desired state
    pub success: bool,
    /// Why the node failed, if it did
    pub error: Option<NodeError>,
    /// State reported by the check before applying
    pub old_state: String,
    /// Whether apply was invoked and succeeded
    pub changed: bool,
}

impl NodeResult {
    pub(crate) fn no_change(id: &str, current: &str) -> Self {
        Self {
            id: id.to_string(),
            success: true,
            error: None,
            old_state: current.to_string(),
            changed: false,
        }
    }

    pub(crate) fn applied(id: &str, current: &str) -> Self {
        Self {
            id: id.to_string(),
            success: true,
            error: None,
            old_state: current.to_string(),
            changed: true,
        }
    }

    pub(crate) fn failed(id: &str, current: &str, error: NodeError) -> Self {
        Self {
            id: id.to_string(),
            success: false,
            error: Some(error),
            old_state: current.to_string(),
            changed: false,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.error.as_ref().is_some_and(NodeError::is_cancelled)
    }

    /// Short human-readable description of what happened
    pub fn description(&self) -> String {
        match &self.error {
            None if self.changed => format!("{:?} => converged", self.old_state),
            None => format!("{:?} (no change)", self.old_state),
            Some(NodeError::Cancelled) => "cancelled".to_string(),
            Some(NodeError::UpstreamFailed { .. }) => "skipped".to_string(),
            Some(NodeError::Check(_)) => "check failed".to_string(),
            Some(NodeError::Apply(_)) => format!("{:?} => apply failed", self.old_state),
        }
    }
}

impl fmt::Display for NodeResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:\n\tStatus: {}\n\tSuccess: {}",
            self.id,
            self.description(),
            self.success
        )?;
        if let Some(err) = &self.error {
            write!(f, "\n\tError: {err}")?;
        }
        Ok(())
    }
}

/// Counts derived from a result collection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub total: usize,
    pub success: usize,
    pub failures: usize,
    /// Failures caused by cancellation (subset of `failures`)
    pub cancelled: usize,
}

impl RunSummary {
    pub fn from_results(results: &[NodeResult]) -> Self {
        let mut summary = Self::default();
        for result in results {
            summary.add_result(result);
        }
        summary
    }

    /// Add a result to the summary
    pub fn add_result(&mut self, result: &NodeResult) {
        self.total += 1;
        if result.success {
            self.success += 1;
        } else {
            self.failures += 1;
            if result.is_cancelled() {
                self.cancelled += 1;
            }
        }
    }

    /// Merge another summary into this one
    pub fn merge(&mut self, other: &RunSummary) {
        self.total += other.total;
        self.success += other.success;
        self.failures += other.failures;
        self.cancelled += other.cancelled;
    }

    /// Check if the run was fully successful (no failures)
    pub fn is_success(&self) -> bool {
        self.failures == 0
    }
}

/// Options for plan and apply runs
#[derive(Debug, Clone)]
pub struct ExecuteOptions {
    /// Maximum number of nodes checked or applied at the same time
    pub jobs: usize,
}

impl Default for ExecuteOptions {
    fn default() -> Self {
        Self { jobs: 4 }
    }
}
