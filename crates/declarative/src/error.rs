//! Error taxonomy for graph construction, task execution and run control.
//!
//! Errors are split by who produces them and how far they reach:
//! - [`TaskError`]: returned by a single task's check or apply
//! - [`NodeError`]: the per-node record attached to a plan entry or result
//! - [`GraphError`]: rejects a graph before anything runs
//! - [`ExecError`]: aborts a whole plan/apply run

use serde::{Deserialize, Serialize};
use std::io;
use thiserror::Error;

/// Errors returned by [`Task::check`](crate::Task::check) and
/// [`Task::apply`](crate::Task::apply).
#[derive(Debug, Error)]
pub enum TaskError {
    /// The operation failed for a task-specific reason
    #[error("{0}")]
    Failed(String),

    /// An I/O operation against the managed resource failed
    #[error("{context}: {source}")]
    Io {
        /// What was being attempted
        context: String,
        #[source]
        source: io::Error,
    },

    /// The run's cancel token was triggered
    #[error("operation cancelled")]
    Cancelled,
}

impl TaskError {
    /// Create a task-specific failure from a message.
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }

    /// Wrap an I/O error with a description of the attempted operation.
    pub fn io(context: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

/// Error recorded against a single node in a [`Plan`](crate::Plan) or
/// [`NodeResult`](crate::NodeResult).
///
/// Node errors never abort a run; they only decide what happens to the
/// node itself and to the nodes that depend on it.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum NodeError {
    /// The current state could not be determined
    #[error("{0}")]
    Check(String),

    /// The mutation failed
    #[error("{0}")]
    Apply(String),

    /// A dependency of this node failed, so it was never applied
    #[error("dependency {dependency:?} failed")]
    UpstreamFailed { dependency: String },

    /// The run was cancelled before or while this node executed
    #[error("cancelled")]
    Cancelled,
}

impl NodeError {
    /// Convert a check-phase task error
    pub fn from_check(err: &TaskError) -> Self {
        if err.is_cancelled() {
            Self::Cancelled
        } else {
            Self::Check(err.to_string())
        }
    }

    /// Convert an apply-phase task error
    pub fn from_apply(err: &TaskError) -> Self {
        if err.is_cancelled() {
            Self::Cancelled
        } else {
            Self::Apply(err.to_string())
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

/// Errors detected while constructing a [`Graph`](crate::Graph).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    /// Two nodes share the same identity
    #[error("duplicate node: {id}")]
    DuplicateNode { id: String },

    /// A node depends on an identity that is not in the graph
    #[error("{node} depends on {dependency}, which does not exist")]
    MissingDependency { node: String, dependency: String },

    /// The dependency relation contains at least one cycle
    #[error("cyclic dependency between: {}", nodes.join(", "))]
    CyclicDependency {
        /// Nodes on (or between) the cycles, sorted
        nodes: Vec<String>,
    },
}

/// Fatal errors outside the scope of any single node.
#[derive(Debug, Error)]
pub enum ExecError {
    /// The worker pool could not be created
    #[error("failed to create worker pool: {0}")]
    ThreadPool(String),

    /// The plan does not describe the graph it is applied against
    #[error("plan does not match graph: expected node {expected:?}, found {found:?}")]
    PlanMismatch {
        expected: String,
        found: Option<String>,
    },
}
