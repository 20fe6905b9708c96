//! # Layer-Stack Building
//!
//! This module assembles a dependency-closed, deduplicated layer list from a
//! single entry URI and drives the composition pipeline over it.
//!
//! ## Process
//!
//! 1.  **Import resolution (`resolve_layer_list`)**: The main layer is
//!     fetched first; any fetch failure propagates and aborts the build.
//!     Its `imports` are then resolved depth-first: an unvisited URI is
//!     fetched, marked visited, appended, and its own imports are resolved
//!     immediately, so each import's full transitive closure sits directly
//!     after it in the list. A visited URI is never re-fetched or
//!     re-expanded, which deduplicates shared imports and terminates import
//!     cycles.
//!
//! 2.  **Recomposition (`LayerStack::recompose`)**: federate the current
//!     layer list, flatten, validate against the effective schema table,
//!     then compose under an artificial root (which performs the cycle/root
//!     analysis first). The previously returned tree and schema table stay
//!     untouched when any step fails; callers never observe a partial
//!     result.
//!
//! The stack is mutable only through explicit layer-list edits followed by
//! `recompose()`; outputs read before the next `recompose()` are stale.

use std::collections::HashSet;

use indexmap::IndexMap;
use log::debug;

use crate::compose::{compose_with_artificial_root, PostCompositionNode};
use crate::error::Result;
use crate::flatten::{federate, flatten};
use crate::layer::IfcxFile;
use crate::provider::LayerProvider;
use crate::schema::{validate, SchemaDescriptor};

/// Resolve a main layer and its transitive imports into an ordered,
/// deduplicated layer list: main layer first, each import's closure
/// inserted depth-first immediately after it.
pub fn resolve_layer_list(
    provider: &dyn LayerProvider,
    main_uri: &str,
) -> Result<Vec<IfcxFile>> {
    let main = provider.layer_by_uri(main_uri)?;
    let mut visited: HashSet<String> = HashSet::new();
    visited.insert(main.header.id.clone());
    let mut layers = vec![main];
    // The main layer was just pushed; resolve from a clone of its imports
    // so the growing list stays append-only.
    let imports = layers[0].imports.clone();
    for import in &imports {
        resolve_import(provider, &import.uri, &mut visited, &mut layers)?;
    }
    Ok(layers)
}

fn resolve_import(
    provider: &dyn LayerProvider,
    uri: &str,
    visited: &mut HashSet<String>,
    layers: &mut Vec<IfcxFile>,
) -> Result<()> {
    if visited.contains(uri) {
        debug!("skipping already-visited layer {}", uri);
        return Ok(());
    }
    let layer = provider.layer_by_uri(uri)?;
    visited.insert(uri.to_string());
    let imports = layer.imports.clone();
    layers.push(layer);
    for import in &imports {
        resolve_import(provider, &import.uri, visited, layers)?;
    }
    Ok(())
}

/// A dependency-closed layer list with its derived, recomposable outputs:
/// the effective schema table and the fully-resolved tree.
#[derive(Debug)]
pub struct LayerStack {
    layers: Vec<IfcxFile>,
    schemas: IndexMap<String, SchemaDescriptor>,
    tree: PostCompositionNode,
}

impl LayerStack {
    /// Build a stack from a main layer URI, resolving transitive imports
    /// through the provider, then compose it.
    pub fn open(provider: &dyn LayerProvider, main_uri: &str) -> Result<Self> {
        Self::from_layers(resolve_layer_list(provider, main_uri)?)
    }

    /// Build a stack from an already-assembled layer list and compose it.
    pub fn from_layers(layers: Vec<IfcxFile>) -> Result<Self> {
        let mut stack = Self {
            layers,
            schemas: IndexMap::new(),
            tree: PostCompositionNode::new(""),
        };
        stack.recompose()?;
        Ok(stack)
    }

    /// Recompute federation, schema table, and resolved tree from the
    /// current layer list.
    ///
    /// On failure the previous outputs are left untouched; no partial tree
    /// is ever exposed.
    pub fn recompose(&mut self) -> Result<()> {
        let federated = federate(&self.layers);
        let flattened = flatten(&federated);
        validate(&federated.schemas, &flattened)?;
        let tree = compose_with_artificial_root(&flattened)?;
        self.schemas = federated.schemas;
        self.tree = tree;
        Ok(())
    }

    /// The resolved tree as of the last successful `recompose()`.
    pub fn tree(&self) -> &PostCompositionNode {
        &self.tree
    }

    /// The effective schema table as of the last successful `recompose()`.
    pub fn schemas(&self) -> &IndexMap<String, SchemaDescriptor> {
        &self.schemas
    }

    /// The current layer list in federation order.
    pub fn layers(&self) -> &[IfcxFile] {
        &self.layers
    }

    /// Append a layer. The tree and schema table are stale until the next
    /// `recompose()`.
    pub fn add_layer(&mut self, layer: IfcxFile) {
        self.layers.push(layer);
    }

    /// Remove every layer with the given declared identity. Returns true
    /// if anything was removed; outputs are stale until `recompose()`.
    pub fn remove_layer(&mut self, id: &str) -> bool {
        let before = self.layers.len();
        self.layers.retain(|layer| layer.header.id != id);
        self.layers.len() != before
    }
}
