//! # Declarative
//!
//! A dependency-ordered plan/apply engine for declarative resources.
//!
//! Callers build a [`Graph`] of [`Task`]s, [`plan`] it to learn which
//! tasks differ from their desired state, then [`apply`] the plan to
//! converge them. Results are summarized with [`RunSummary`].
//!
//! ## Core Concepts
//!
//! - **Task**: a managed resource that can be checked (read-only) and applied
//! - **Graph**: tasks plus dependency edges, grouped into levels
//! - **Plan**: one [`DiffEntry`] per node, produced before any mutation
//! - **NodeResult**: one outcome per node after applying
//! - **CancelToken**: a single run-wide cancellation flag
//!
//! ## Execution Model
//!
//! Levels run one after another. The nodes inside a level run on a bounded
//! rayon pool and are joined before the next level begins, so a node never
//! starts before all of its dependencies have finished. A node whose check
//! errored or whose apply failed marks every dependent as failed without
//! applying it; unrelated branches keep going.
//!
//! ## Example
//!
//! ```ignore
//! use declarative::{CancelToken, ExecuteOptions, Graph, RunSummary, apply, plan};
//!
//! let mut builder = Graph::builder();
//! builder
//!     .add("dir", Box::new(dir_task), Vec::<String>::new())
//!     .add("config", Box::new(file_task), ["dir"]);
//! let graph = builder.build()?;
//!
//! let cancel = CancelToken::new();
//! let opts = ExecuteOptions::default();
//! let plan = plan(&graph, &cancel, &opts)?;
//! let results = apply(&graph, &plan, &cancel, &opts)?;
//!
//! let summary = RunSummary::from_results(&results);
//! assert!(summary.is_success());
//! ```
//!
//! ## Provider Traits
//!
//! - [`Task`]: implemented by every resource kind
//! - [`ProgressCallback`]: receives per-level progress updates
//!
//! The engine has no dependency on a particular UI, resource library or
//! module format.

pub mod cancel;
pub mod context;
pub mod diff;
pub mod error;
pub mod executor;
pub mod graph;
pub mod planner;
pub mod task;
pub mod types;

#[cfg(test)]
mod testing;

// Re-export main types at crate root
pub use cancel::CancelToken;
pub use context::{NoProgress, ProgressCallback};
pub use diff::{DiffEntry, Plan};
pub use error::{ExecError, GraphError, NodeError, TaskError};
pub use executor::{apply, apply_with_progress};
pub use graph::{Graph, GraphBuilder, Node};
pub use planner::plan;
pub use task::{BoxedTask, Status, Task};
pub use types::{ExecuteOptions, NodeResult, RunSummary};
