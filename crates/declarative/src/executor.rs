//! Execution engine - applies a plan level by level with parallel workers

use crate::cancel::CancelToken;
use crate::context::{NoProgress, ProgressCallback};
use crate::diff::{DiffEntry, Plan};
use crate::error::{ExecError, NodeError};
use crate::graph::Graph;
use crate::planner::worker_pool;
use crate::types::{ExecuteOptions, NodeResult};
use rayon::prelude::*;

/// Apply a plan with the given options and progress callback
///
/// Levels run strictly one after another; the nodes of one level run on
/// the worker pool and are all joined before the next level starts. A node
/// is applied only if its plan entry says it will change, its check did not
/// fail, and none of its dependencies failed. Failures only affect the
/// failing node's dependents.
///
/// Once `cancel` is triggered no further node is started. Nodes already
/// running finish and report their real outcome; every other node reports
/// [`NodeError::Cancelled`].
///
/// # Returns
/// One result per node in graph level order, including failed ones. An
/// error is returned only when the run cannot proceed at all.
pub fn apply_with_progress<P: ProgressCallback>(
    graph: &Graph,
    plan: &Plan,
    cancel: &CancelToken,
    opts: &ExecuteOptions,
    progress: &mut P,
) -> Result<Vec<NodeResult>, ExecError> {
    let entries = entries_by_node(graph, plan)?;
    let pool = worker_pool(opts.jobs)?;

    let mut failed = vec![false; graph.len()];
    let mut results = Vec::with_capacity(graph.len());

    let mut cancel_reported = false;

    for (level_no, level) in graph.levels().iter().enumerate() {
        if !cancel_reported && cancel.is_cancelled() {
            cancel_reported = true;
            log::warn!(
                "Run cancelled; {} nodes from level {} on will not start",
                unstarted_from(graph, level_no),
                level_no
            );
        }

        progress.on_level_start(level_no, level.len());

        let level_results: Vec<NodeResult> = pool.install(|| {
            level
                .par_iter()
                .map(|&idx| apply_node(graph, idx, entries[idx], &failed, cancel))
                .collect()
        });

        for (&idx, result) in level.iter().zip(&level_results) {
            failed[idx] = !result.success;
            progress.on_node_complete(result);
        }
        results.extend(level_results);

        progress.on_level_complete(level_no);
    }

    Ok(results)
}

/// Nodes in `level` and every later level
fn unstarted_from(graph: &Graph, level: usize) -> usize {
    graph.levels().iter().skip(level).map(Vec::len).sum()
}

/// Pair every graph node with its plan entry, indexed by node
fn entries_by_node<'p>(graph: &Graph, plan: &'p Plan) -> Result<Vec<&'p DiffEntry>, ExecError> {
    let mut by_node: Vec<Option<&DiffEntry>> = vec![None; graph.len()];
    let mut planned = plan.entries().iter();

    for &idx in graph.levels().iter().flatten() {
        let expected = graph.node(idx).id();
        match planned.next() {
            Some(entry) if entry.id == expected => by_node[idx] = Some(entry),
            other => {
                return Err(ExecError::PlanMismatch {
                    expected: expected.to_string(),
                    found: other.map(|e| e.id.clone()),
                });
            }
        }
    }

    if let Some(extra) = planned.next() {
        return Err(ExecError::PlanMismatch {
            expected: String::new(),
            found: Some(extra.id.clone()),
        });
    }

    Ok(by_node.into_iter().flatten().collect())
}

/// Decide and carry out the outcome of a single node
fn apply_node(
    graph: &Graph,
    idx: usize,
    entry: &DiffEntry,
    failed: &[bool],
    cancel: &CancelToken,
) -> NodeResult {
    let id = graph.node(idx).id();

    if cancel.is_cancelled() {
        return NodeResult::failed(id, &entry.current, NodeError::Cancelled);
    }

    if let Some(&dep) = graph.dependencies(idx).iter().find(|&&dep| failed[dep]) {
        let dependency = graph.node(dep).id().to_string();
        log::info!("Skipping {}: dependency {} failed", id, dependency);
        return NodeResult::failed(id, &entry.current, NodeError::UpstreamFailed { dependency });
    }

    if let Some(err) = &entry.error {
        return NodeResult::failed(id, &entry.current, err.clone());
    }

    if !entry.will_change {
        return NodeResult::no_change(id, &entry.current);
    }

    log::debug!("Applying {}", id);
    match graph.node(idx).task().apply(cancel) {
        Ok(()) => NodeResult::applied(id, &entry.current),
        Err(e) => {
            log::warn!("Apply failed for {}: {}", id, e);
            NodeResult::failed(id, &entry.current, NodeError::from_apply(&e))
        }
    }
}

/// Apply without progress reporting
pub fn apply(
    graph: &Graph,
    plan: &Plan,
    cancel: &CancelToken,
    opts: &ExecuteOptions,
) -> Result<Vec<NodeResult>, ExecError> {
    apply_with_progress(graph, plan, cancel, opts, &mut NoProgress)
}
