//! Progress reporting hooks
//!
//! These traits allow the engine to report progress without depending on
//! a specific terminal UI. Callbacks run on the thread that drives the
//! run, after each level's workers have all returned, never from inside a
//! worker.

use crate::types::NodeResult;

/// Progress callback for apply runs
pub trait ProgressCallback {
    /// Called before the nodes of a level are started
    fn on_level_start(&mut self, level: usize, count: usize);

    /// Called once per node, after its level has finished
    fn on_node_complete(&mut self, result: &NodeResult);

    /// Called when every node of a level has a result
    fn on_level_complete(&mut self, level: usize);
}

/// No-op progress callback
pub struct NoProgress;

impl ProgressCallback for NoProgress {
    fn on_level_start(&mut self, _level: usize, _count: usize) {}
    fn on_node_complete(&mut self, _result: &NodeResult) {}
    fn on_level_complete(&mut self, _level: usize) {}
}
