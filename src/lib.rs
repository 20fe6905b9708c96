//! # IFCX Composition Engine
//!
//! This library resolves a federated set of hierarchical, schema-typed IFCX
//! layer documents into one fully-resolved scene tree. Each layer
//! contributes sparse, path-addressed overrides to a shared namespace;
//! layers declare inheritance relationships and cross-references; the
//! engine deterministically flattens these into a concrete tree while
//! enforcing schema correctness and rejecting cyclic inputs.
//!
//! ## Quick Example
//!
//! ```
//! use ifcx_core::layer::IfcxFile;
//! use ifcx_core::stack::LayerStack;
//!
//! let layer = IfcxFile::from_str(r#"{
//!     "header": {"id": "demo"},
//!     "schemas": {"x::y": {"dataType": "Integer"}},
//!     "data": [{"path": "a", "attributes": {"x::y": 3}}]
//! }"#).unwrap();
//!
//! let stack = LayerStack::from_layers(vec![layer]).unwrap();
//! let a = stack.tree().descend("a").unwrap();
//! assert_eq!(a.attributes.get("x::y"), Some(&serde_json::json!(3)));
//! ```
//!
//! ## Core Concepts
//!
//! The library is built around a few key concepts:
//!
//! - **Layer documents (`layer`)**: The JSON wire model: header, imports,
//!   schema table, and sparse path-addressed override records with explicit
//!   deletion markers.
//! - **Providers (`provider`)**: The capability of fetching a layer by URI,
//!   with in-memory, fetching (with local import-map redirection), and
//!   stacked variants behind one trait.
//! - **Stack building (`stack`)**: Depth-first resolution of transitive
//!   imports into a deduplicated, dependency-ordered layer list, and the
//!   `LayerStack` that recomposes derived outputs on demand.
//! - **Flattening (`flatten`)**: Federation of many layers into one
//!   document and collapse of all records sharing a path into one per-path
//!   override record.
//! - **Analysis (`graph`)**: Dependency-graph construction, three-state
//!   cycle detection, and root-candidate discovery.
//! - **Composition (`compose`)**: The recursive inherit/override expansion
//!   producing the resolved tree.
//! - **Validation (`schema`)**: Recursive type-checking of attribute values
//!   against declared schema descriptors.
//!
//! ## Execution Flow
//!
//! A full load runs these steps, each depending only on the previous ones:
//!
//! 1.  **Stack building**: Resolve the main layer's transitive imports into
//!     an ordered layer list (fetch failures abort the build).
//! 2.  **Federation**: Merge the layer list into one combined document,
//!     later layers winning ties.
//! 3.  **Flattening**: Collapse records per path, applying deletion markers
//!     for children/inherits and last-write-wins for attributes.
//! 4.  **Validation**: Type-check every non-reserved attribute against the
//!     effective schema table, fail-fast.
//! 5.  **Cycle/root analysis**: Reject cyclic dependency graphs and collect
//!     root candidates.
//! 6.  **Composition**: Recursively expand inherits and overrides into the
//!     resolved tree under an artificial root.
//!
//! Everything after stack building is synchronous, pure-data work scoped to
//! one pass; layer retrieval is the only operation touching the outside
//! world, and it is confined behind the provider seam.

pub mod compose;
pub mod error;
pub mod flatten;
pub mod graph;
pub mod layer;
pub mod path;
pub mod provider;
pub mod schema;
pub mod stack;

#[cfg(test)]
mod path_proptest;
