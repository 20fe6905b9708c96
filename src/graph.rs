//! # Dependency and Cycle Analysis
//!
//! This module builds a dependency graph over flattened per-path records and
//! checks it for cycles before any recursive expansion is attempted. An
//! acyclic graph is a hard precondition for composition.
//!
//! ## Process
//!
//! 1.  **Edge collection**: For every known path, one edge per non-deleted
//!     inherit target and one per non-deleted children target. Both
//!     directions are recorded (`depends_on` and `dependents`).
//!
//! 2.  **Three-state depth-first traversal**: Every known path is visited
//!     with an unvisited / in-progress / done marker. Re-entering an
//!     in-progress path is a cycle and aborts the whole analysis; a cycle
//!     anywhere is fatal to the entire composition, even when it is
//!     unreachable from the paths of interest.
//!
//! 3.  **Root discovery**: Root candidates are the known paths with no
//!     incoming dependency edge and no `/` in them, in first-encounter
//!     order. A deeply-nested path that never appears as a target is not a
//!     root: it is only reachable through its parent's own path hierarchy,
//!     not through the dependency graph.

use std::collections::HashMap;

use indexmap::IndexMap;

use crate::error::{Error, Result};
use crate::flatten::PreCompositionNode;
use crate::layer::OverrideMap;

/// Dependency adjacency over flattened nodes.
#[derive(Debug, Default)]
pub struct DependencyGraph {
    /// Outgoing edges: path to the targets it inherits or references.
    depends_on: IndexMap<String, Vec<String>>,
    /// Incoming edges: target to the paths that depend on it.
    dependents: HashMap<String, Vec<String>>,
}

/// Traversal marker for the depth-first cycle walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    InProgress,
    Done,
}

impl DependencyGraph {
    /// Collect inherit and children edges from every flattened node.
    pub fn build(nodes: &IndexMap<String, PreCompositionNode>) -> Self {
        let mut graph = Self::default();
        for (path, node) in nodes {
            graph.add_edges(path, &node.inherits);
            graph.add_edges(path, &node.children);
        }
        graph
    }

    fn add_edges(&mut self, path: &str, overrides: &OverrideMap) {
        for target in overrides.values().flatten() {
            self.depends_on
                .entry(path.to_string())
                .or_default()
                .push(target.clone());
            self.dependents
                .entry(target.clone())
                .or_default()
                .push(path.to_string());
        }
    }

    /// True if nothing inherits this path or references it as a child.
    pub fn has_no_dependents(&self, path: &str) -> bool {
        !self.dependents.contains_key(path)
    }

    /// Depth-first cycle check over every known path.
    ///
    /// Fails with [`Error::CycleDetected`] naming the cyclic trail.
    pub fn check_acyclic(&self, nodes: &IndexMap<String, PreCompositionNode>) -> Result<()> {
        let mut marks: HashMap<&str, Mark> = HashMap::new();
        let mut trail: Vec<&str> = Vec::new();
        for path in nodes.keys() {
            self.visit(path, &mut marks, &mut trail)?;
        }
        Ok(())
    }

    fn visit<'a>(
        &'a self,
        path: &'a str,
        marks: &mut HashMap<&'a str, Mark>,
        trail: &mut Vec<&'a str>,
    ) -> Result<()> {
        match marks.get(path) {
            Some(Mark::Done) => return Ok(()),
            Some(Mark::InProgress) => {
                let mut cycle: Vec<&str> = trail
                    .iter()
                    .copied()
                    .skip_while(|p| *p != path)
                    .collect();
                cycle.push(path);
                return Err(Error::CycleDetected {
                    cycle: cycle.join(" -> "),
                });
            }
            None => {}
        }
        marks.insert(path, Mark::InProgress);
        trail.push(path);
        if let Some(targets) = self.depends_on.get(path) {
            for target in targets {
                self.visit(target, marks, trail)?;
            }
        }
        trail.pop();
        marks.insert(path, Mark::Done);
        Ok(())
    }
}

/// Check the dependency graph for cycles and return the root candidates.
///
/// Roots are known paths with no incoming edge and no `/`, in
/// first-encounter order. Any cycle anywhere fails the whole analysis; no
/// partial root set is returned.
pub fn find_root_candidates(
    nodes: &IndexMap<String, PreCompositionNode>,
) -> Result<Vec<String>> {
    let graph = DependencyGraph::build(nodes);
    graph.check_acyclic(nodes)?;
    Ok(nodes
        .keys()
        .filter(|path| graph.has_no_dependents(path) && !path.contains('/'))
        .cloned()
        .collect())
}
