//! Dependency graph of tasks
//!
//! Nodes are grouped into levels: level 0 has no dependencies and every
//! node in level `k` depends only on nodes in levels below `k`. Nodes in
//! the same level may run concurrently.

use crate::error::GraphError;
use crate::task::{BoxedTask, Task};
use std::collections::{HashMap, HashSet};

/// One resource instance in the graph
#[derive(Debug)]
pub struct Node {
    id: String,
    task: BoxedTask,
    depends_on: Vec<String>,
}

impl Node {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn task(&self) -> &dyn Task {
        self.task.as_ref()
    }

    /// Identities of the nodes this one directly depends on
    pub fn depends_on(&self) -> &[String] {
        &self.depends_on
    }
}

/// Collects nodes and validates them into a [`Graph`]
#[derive(Debug, Default)]
pub struct GraphBuilder {
    nodes: Vec<Node>,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node owning `task`, depending on the given node identities
    pub fn add<I, S>(&mut self, id: impl Into<String>, task: BoxedTask, depends_on: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut deps: Vec<String> = Vec::new();
        for dep in depends_on {
            let dep = dep.into();
            if !deps.contains(&dep) {
                deps.push(dep);
            }
        }

        self.nodes.push(Node {
            id: id.into(),
            task,
            depends_on: deps,
        });
        self
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Validate identities and edges and compute levels
    ///
    /// Fails on duplicate identities, dependencies that name no node, and
    /// cycles. No graph is produced on failure.
    pub fn build(self) -> Result<Graph, GraphError> {
        let mut index = HashMap::with_capacity(self.nodes.len());
        for (idx, node) in self.nodes.iter().enumerate() {
            if index.insert(node.id.clone(), idx).is_some() {
                return Err(GraphError::DuplicateNode {
                    id: node.id.clone(),
                });
            }
        }

        let mut deps: Vec<Vec<usize>> = Vec::with_capacity(self.nodes.len());
        for node in &self.nodes {
            let mut resolved = Vec::with_capacity(node.depends_on.len());
            for dep in &node.depends_on {
                match index.get(dep) {
                    Some(&dep_idx) => resolved.push(dep_idx),
                    None => {
                        return Err(GraphError::MissingDependency {
                            node: node.id.clone(),
                            dependency: dep.clone(),
                        });
                    }
                }
            }
            deps.push(resolved);
        }

        let levels = compute_levels(&self.nodes, &deps)?;

        log::debug!(
            "Built graph with {} nodes in {} levels",
            self.nodes.len(),
            levels.len()
        );

        Ok(Graph {
            nodes: self.nodes,
            index,
            deps,
            levels,
        })
    }
}

/// Assign each node to a level, or report the nodes caught in cycles
fn compute_levels(nodes: &[Node], deps: &[Vec<usize>]) -> Result<Vec<Vec<usize>>, GraphError> {
    let mut level_of: Vec<Option<usize>> = vec![None; nodes.len()];
    let mut levels: Vec<Vec<usize>> = Vec::new();
    let mut assigned = 0;

    while assigned < nodes.len() {
        let current = levels.len();
        let ready: Vec<usize> = (0..nodes.len())
            .filter(|&idx| level_of[idx].is_none())
            .filter(|&idx| {
                deps[idx]
                    .iter()
                    .all(|&dep| level_of[dep].is_some_and(|l| l < current))
            })
            .collect();

        if ready.is_empty() {
            return Err(GraphError::CyclicDependency {
                nodes: cycle_members(nodes, deps, &level_of),
            });
        }

        for &idx in &ready {
            level_of[idx] = Some(current);
        }
        assigned += ready.len();
        levels.push(ready);
    }

    Ok(levels)
}

/// Names of unlevelled nodes that sit on or between cycles
///
/// Nodes that merely depend on a cycle are peeled off: a node that no
/// other unlevelled node depends on cannot be part of a cycle.
fn cycle_members(nodes: &[Node], deps: &[Vec<usize>], level_of: &[Option<usize>]) -> Vec<String> {
    let mut remaining: HashSet<usize> = (0..nodes.len())
        .filter(|&idx| level_of[idx].is_none())
        .collect();

    loop {
        let depended_on: HashSet<usize> = remaining
            .iter()
            .flat_map(|&idx| deps[idx].iter().copied())
            .filter(|dep| remaining.contains(dep))
            .collect();

        let before = remaining.len();
        remaining.retain(|idx| depended_on.contains(idx));
        if remaining.len() == before {
            break;
        }
    }

    let mut names: Vec<String> = remaining
        .into_iter()
        .map(|idx| nodes[idx].id.clone())
        .collect();
    names.sort();
    names
}

/// A validated, acyclic dependency graph
///
/// Edges are fixed once built; planning and applying only read it.
#[derive(Debug)]
pub struct Graph {
    nodes: Vec<Node>,
    index: HashMap<String, usize>,
    deps: Vec<Vec<usize>>,
    levels: Vec<Vec<usize>>,
}

impl Graph {
    pub fn builder() -> GraphBuilder {
        GraphBuilder::new()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Node indices grouped by level, in execution order
    pub fn levels(&self) -> &[Vec<usize>] {
        &self.levels
    }

    pub fn node(&self, idx: usize) -> &Node {
        &self.nodes[idx]
    }

    /// Indices of the nodes `idx` directly depends on
    pub fn dependencies(&self, idx: usize) -> &[usize] {
        &self.deps[idx]
    }

    /// Look up a node by identity
    pub fn get(&self, id: &str) -> Option<&Node> {
        self.index.get(id).map(|&idx| &self.nodes[idx])
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    /// Level number of a node
    pub fn level_of(&self, id: &str) -> Option<usize> {
        let idx = self.index_of(id)?;
        self.levels.iter().position(|level| level.contains(&idx))
    }

    /// All nodes in dependency-respecting order
    pub fn iter(&self) -> impl Iterator<Item = &Node> + '_ {
        self.levels.iter().flatten().map(|&idx| &self.nodes[idx])
    }
}
