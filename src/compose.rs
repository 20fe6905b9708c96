//! # Composition Algorithm
//!
//! This module recursively expands flattened per-path override records into
//! a fully-resolved tree of [`PostCompositionNode`]s.
//!
//! ## Expansion order
//!
//! For one path, in this exact order:
//!
//! 1.  **Inherits**, in declared order: each non-deleted base path is
//!     resolved (compose its head segment as a root, descend the tail
//!     through composed children) and the resolved subnode's children and
//!     attributes are copied over same-named entries. A later inherit wins
//!     conflicts with an earlier one.
//! 2.  **Own children overrides**, in declared order: a non-deleted target
//!     resolves the same way and replaces the named slot; a deletion marker
//!     removes the slot even if an inherit populated it.
//! 3.  **Own attribute overrides**, in declared order.
//! 4.  **Recursive re-expansion**: every name now present in the children
//!     map is re-expanded in place at its fully-qualified path, so overrides
//!     declared at the deeper path win over content brought in purely by
//!     reference.
//!
//! No memoization is applied across expansions: a base reached through
//! several references is recomposed independently each time. This is
//! correct because the dependency graph is checked acyclic before any
//! expansion; it can duplicate work on diamond-shaped reference graphs.
//!
//! Composed nodes are constructed fresh on every pass and never mutated
//! once the caller has the resolved tree.

use indexmap::IndexMap;

use crate::error::{Error, Result};
use crate::flatten::PreCompositionNode;
use crate::graph::find_root_candidates;
use crate::layer::AttributeMap;
use crate::path;

/// One fully-resolved node of the composed tree.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PostCompositionNode {
    pub path: String,
    pub children: IndexMap<String, PostCompositionNode>,
    pub attributes: AttributeMap,
}

impl PostCompositionNode {
    pub fn new(path: &str) -> Self {
        Self {
            path: path.to_string(),
            ..Default::default()
        }
    }

    /// Walk a `/`-delimited path through composed children.
    pub fn descend(&self, relative_path: &str) -> Option<&PostCompositionNode> {
        let mut node = self;
        for segment in path::segments(relative_path) {
            node = node.children.get(segment)?;
        }
        Some(node)
    }
}

/// Compose the node at `node_path` into a fully-resolved subtree.
///
/// A path with no flattened record is valid: it composes to an
/// implicitly-created node with no own overrides.
pub fn compose_node_at(
    node_path: &str,
    nodes: &IndexMap<String, PreCompositionNode>,
) -> Result<PostCompositionNode> {
    let mut node = PostCompositionNode::new(node_path);
    expand(node_path, &mut node, nodes)?;
    Ok(node)
}

/// Expand `node` in place with the overrides declared at `node_path`, then
/// re-expand each child slot at its fully-qualified path.
fn expand(
    node_path: &str,
    node: &mut PostCompositionNode,
    nodes: &IndexMap<String, PreCompositionNode>,
) -> Result<()> {
    node.path = node_path.to_string();

    if let Some(input) = nodes.get(node_path) {
        for base in input.inherits.values().flatten() {
            let resolved = resolve_reference(base, nodes)?;
            for (name, child) in resolved.children {
                node.children.insert(name, child);
            }
            for (key, value) in resolved.attributes {
                node.attributes.insert(key, value);
            }
        }

        for (name, target) in &input.children {
            match target {
                Some(target) => {
                    node.children
                        .insert(name.clone(), resolve_reference(target, nodes)?);
                }
                // Deletion marker: remove the slot even if an inherit
                // populated it.
                None => {
                    node.children.shift_remove(name);
                }
            }
        }

        for (key, value) in &input.attributes {
            node.attributes.insert(key.clone(), value.clone());
        }
    }

    for (name, child) in node.children.iter_mut() {
        let child_path = path::join(node_path, name);
        expand(&child_path, child, nodes)?;
    }

    Ok(())
}

/// Resolve an inherit/children target path to a freshly composed subtree.
///
/// The head segment is composed as a root; the tail is descended through
/// the composed children, failing with an unknown-node condition on any
/// missing segment.
fn resolve_reference(
    target: &str,
    nodes: &IndexMap<String, PreCompositionNode>,
) -> Result<PostCompositionNode> {
    let mut node = compose_node_at(path::head(target), nodes)?;
    for segment in path::segments(path::tail(target)) {
        node = node
            .children
            .shift_remove(segment)
            .ok_or_else(|| Error::UnknownReference {
                target: target.to_string(),
                segment: segment.to_string(),
            })?;
    }
    Ok(node)
}

/// Single-root expansion: compose the first discovered root candidate.
///
/// Fails with [`Error::NoRoots`] when the graph has no root candidate, and
/// with [`Error::CycleDetected`] before any expansion on cyclic input.
pub fn compose_first_root(
    nodes: &IndexMap<String, PreCompositionNode>,
) -> Result<PostCompositionNode> {
    let roots = find_root_candidates(nodes)?;
    let first = roots.first().ok_or(Error::NoRoots)?;
    compose_node_at(first, nodes)
}

/// Artificial-root wrapping: always succeeds given an acyclic graph.
///
/// Synthesizes an attribute-less root whose children map has one entry per
/// discovered root candidate, keyed by that root's own path string. Used
/// whenever the caller cannot assume a single unambiguous root.
pub fn compose_with_artificial_root(
    nodes: &IndexMap<String, PreCompositionNode>,
) -> Result<PostCompositionNode> {
    let roots = find_root_candidates(nodes)?;
    let mut root = PostCompositionNode::new("");
    for root_path in roots {
        let composed = compose_node_at(&root_path, nodes)?;
        root.children.insert(root_path, composed);
    }
    Ok(root)
}
