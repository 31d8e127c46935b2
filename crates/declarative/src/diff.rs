//! Plan entries: per-node check outcomes computed before any mutation

use crate::error::NodeError;
use serde::{Deserialize, Serialize};

/// The check outcome for one node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffEntry {
    /// Identity of the node
    pub id: String,
    /// Observed state as reported by the task ("" if unknown)
    pub current: String,
    /// Whether the node needs to be applied
    pub will_change: bool,
    /// Error captured while checking; always paired with `will_change`
    pub error: Option<NodeError>,
}

impl DiffEntry {
    /// Whether the applier may invoke apply for this node
    pub fn is_applicable(&self) -> bool {
        self.will_change && self.error.is_none()
    }

    pub fn has_error(&self) -> bool {
        self.error.is_some()
    }
}

/// One entry per graph node, in graph level order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    entries: Vec<DiffEntry>,
}

impl Plan {
    pub(crate) fn new(entries: Vec<DiffEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[DiffEntry] {
        &self.entries
    }

    pub fn get(&self, id: &str) -> Option<&DiffEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of nodes that will change (including those that failed to check)
    pub fn changes(&self) -> usize {
        self.entries.iter().filter(|e| e.will_change).count()
    }

    /// Number of nodes whose check failed
    pub fn errors(&self) -> usize {
        self.entries.iter().filter(|e| e.has_error()).count()
    }

    /// True when every node already matches its desired state
    pub fn is_converged(&self) -> bool {
        self.changes() == 0
    }
}

impl IntoIterator for Plan {
    type Item = DiffEntry;
    type IntoIter = std::vec::IntoIter<DiffEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}
