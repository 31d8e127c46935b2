//! Planner - checks every node and records what would change

use crate::cancel::CancelToken;
use crate::diff::{DiffEntry, Plan};
use crate::error::{ExecError, NodeError};
use crate::graph::{Graph, Node};
use crate::types::ExecuteOptions;
use rayon::prelude::*;

/// Check every node in the graph, level by level
///
/// Checks never mutate anything, so the whole graph is probed regardless
/// of what earlier levels report. A failing check is recorded on its entry
/// and does not stop planning of any other node.
pub fn plan(graph: &Graph, cancel: &CancelToken, opts: &ExecuteOptions) -> Result<Plan, ExecError> {
    let pool = worker_pool(opts.jobs)?;
    let mut entries = Vec::with_capacity(graph.len());

    for (level_no, level) in graph.levels().iter().enumerate() {
        log::debug!("Checking level {} ({} nodes)", level_no, level.len());

        let checked: Vec<DiffEntry> = pool.install(|| {
            level
                .par_iter()
                .map(|&idx| check_node(graph.node(idx), cancel))
                .collect()
        });
        entries.extend(checked);
    }

    let plan = Plan::new(entries);
    log::info!(
        "Planned {} nodes: {} will change, {} check errors",
        plan.len(),
        plan.changes(),
        plan.errors()
    );
    Ok(plan)
}

/// Check a single node
fn check_node(node: &Node, cancel: &CancelToken) -> DiffEntry {
    if cancel.is_cancelled() {
        return DiffEntry {
            id: node.id().to_string(),
            current: String::new(),
            will_change: true,
            error: Some(NodeError::Cancelled),
        };
    }

    match node.task().check(cancel) {
        Ok(status) => {
            log::trace!(
                "Checked {}: current={:?} will_change={}",
                node.id(),
                status.current,
                status.will_change
            );
            DiffEntry {
                id: node.id().to_string(),
                current: status.current,
                will_change: status.will_change,
                error: None,
            }
        }
        Err(e) => {
            log::warn!("Check failed for {}: {}", node.id(), e);
            DiffEntry {
                id: node.id().to_string(),
                current: String::new(),
                will_change: true,
                error: Some(NodeError::from_check(&e)),
            }
        }
    }
}

/// Bounded worker pool shared by all levels of one run
///
/// `jobs == 0` lets rayon pick one worker per CPU.
pub(crate) fn worker_pool(jobs: usize) -> Result<rayon::ThreadPool, ExecError> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(jobs)
        .thread_name(|i| format!("converge-worker-{i}"))
        .build()
        .map_err(|e| ExecError::ThreadPool(e.to_string()))
}
