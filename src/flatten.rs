//! # Federation and Path Flattening
//!
//! This module merges an ordered list of layer documents into one combined
//! document (federation) and collapses all raw records sharing a path into
//! one per-path override record (flattening).
//!
//! ## Ordering rules
//!
//! Federation order determines override precedence: documents later in the
//! list win ties on shared paths and keys. Flattening folds each path's
//! records in encounter order:
//!
//! - `children` / `inherits`: a later record's entry replaces any prior
//!   entry for that name. A deletion marker (`None`) is stored as a marker,
//!   not dropped, because composition still needs it to delete slots
//!   populated by inherits.
//! - `attributes`: last write wins. Attributes honor no deletion marker; a
//!   `null` value is an ordinary value. This asymmetry is part of the
//!   contract.
//!
//! The flattened output is read-only input for cycle analysis, schema
//! validation, and composition; it is scoped to one composition pass.

use indexmap::IndexMap;

use crate::layer::{AttributeMap, IfcxFile, OverrideMap, RawRecord};
use crate::schema::SchemaDescriptor;

/// The flattened result for one path: all sparse overrides for that path
/// folded into a single record.
#[derive(Debug, Clone, Default)]
pub struct PreCompositionNode {
    pub path: String,
    /// Child slot overrides; `None` is a surviving deletion marker.
    pub children: OverrideMap,
    /// Inherit declarations; `None` is a surviving deletion marker.
    pub inherits: OverrideMap,
    pub attributes: AttributeMap,
}

impl PreCompositionNode {
    pub fn new(path: &str) -> Self {
        Self {
            path: path.to_string(),
            ..Default::default()
        }
    }

    /// Fold one raw record into this node, later record winning per key.
    fn apply(&mut self, record: &RawRecord) {
        for (name, target) in &record.children {
            self.children.insert(name.clone(), target.clone());
        }
        for (name, base) in &record.inherits {
            self.inherits.insert(name.clone(), base.clone());
        }
        for (key, value) in &record.attributes {
            self.attributes.insert(key.clone(), value.clone());
        }
    }
}

/// Merge an ordered list of layers into one combined document.
///
/// Schema tables are merged with later layers winning on a shared schema id;
/// data records are concatenated in layer order, preserving each layer's
/// authored record order. The federated header identity is synthetic.
pub fn federate(layers: &[IfcxFile]) -> IfcxFile {
    let mut federated = IfcxFile::new("federation");
    for layer in layers {
        for (id, descriptor) in &layer.schemas {
            federated.schemas.insert(id.clone(), descriptor.clone());
        }
        federated.data.extend(layer.data.iter().cloned());
    }
    federated
}

/// Collapse a federated document's records into one node per path.
///
/// Paths appear in the output in first-encounter order, which downstream
/// root discovery relies on for determinism.
pub fn flatten(file: &IfcxFile) -> IndexMap<String, PreCompositionNode> {
    let mut nodes: IndexMap<String, PreCompositionNode> = IndexMap::new();
    for record in &file.data {
        nodes
            .entry(record.path.clone())
            .or_insert_with(|| PreCompositionNode::new(&record.path))
            .apply(record);
    }
    nodes
}

/// Convenience: the effective schema table of a federated layer list.
pub fn effective_schemas(layers: &[IfcxFile]) -> IndexMap<String, SchemaDescriptor> {
    let mut schemas = IndexMap::new();
    for layer in layers {
        for (id, descriptor) in &layer.schemas {
            schemas.insert(id.clone(), descriptor.clone());
        }
    }
    schemas
}
