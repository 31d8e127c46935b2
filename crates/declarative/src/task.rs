//! Task capability for declarative state convergence
//!
//! A Task owns one managed resource. It can report the resource's current
//! state and whether it differs from the desired state, and it can perform
//! the mutation that converges the two.

use crate::cancel::CancelToken;
use crate::error::TaskError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome of a successful [`Task::check`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Status {
    /// Human-readable description of the observed state
    pub current: String,
    /// Whether `apply` is needed to reach the desired state
    pub will_change: bool,
}

impl Status {
    /// The resource already matches its desired state
    pub fn converged(current: impl Into<String>) -> Self {
        Self {
            current: current.into(),
            will_change: false,
        }
    }

    /// The resource differs from its desired state
    pub fn changes(current: impl Into<String>) -> Self {
        Self {
            current: current.into(),
            will_change: true,
        }
    }
}

/// Core trait for every resource kind the engine can converge
///
/// New resource kinds implement this trait; the planner and applier never
/// need to know which concrete kind they are driving.
///
/// # Example
///
/// ```ignore
/// use declarative::{CancelToken, Status, Task, TaskError};
///
/// #[derive(Debug)]
/// struct Marker { path: std::path::PathBuf }
///
/// impl Task for Marker {
///     fn check(&self, cancel: &CancelToken) -> Result<Status, TaskError> {
///         cancel.check()?;
///         if self.path.exists() {
///             Ok(Status::converged("present"))
///         } else {
///             Ok(Status::changes("absent"))
///         }
///     }
///
///     fn apply(&self, cancel: &CancelToken) -> Result<(), TaskError> {
///         cancel.check()?;
///         std::fs::write(&self.path, b"")
///             .map_err(|e| TaskError::io(format!("failed to create {}", self.path.display()), e))
///     }
/// }
/// ```
pub trait Task: Send + Sync + fmt::Debug {
    /// Probe the current state without modifying anything
    ///
    /// Must report `will_change = true` whenever the current state does
    /// not match, or cannot be shown to match, the desired state. When the
    /// state cannot be determined at all, return an error; the planner
    /// then records the node as changing with that error attached.
    fn check(&self, cancel: &CancelToken) -> Result<Status, TaskError>;

    /// Perform the minimal mutation needed to converge
    ///
    /// Must be idempotent: after a successful apply, a following check
    /// reports `will_change = false`.
    fn apply(&self, cancel: &CancelToken) -> Result<(), TaskError>;
}

/// A boxed task for type-erased storage in a graph
pub type BoxedTask = Box<dyn Task>;
