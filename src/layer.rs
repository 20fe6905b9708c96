//! # Layer Document Model
//!
//! This module defines the data structures that represent an IFCX layer
//! document, as well as the logic for parsing one from JSON.
//!
//! ## Key Components
//!
//! - **`IfcxFile`**: One authored layer: a header carrying the layer's own
//!   URI/identity, an ordered list of imports, a schema table, and a sparse
//!   sequence of path-addressed override records.
//!
//! - **`RawRecord`**: A single sparse override as authored. Multiple records
//!   may share the same `path` (contributed by different layers, or by
//!   multiple blocks within one layer); they are order-dependent, with
//!   later-in-federation-order records winning per key.
//!
//! - **Deletion markers**: In the `children` and `inherits` maps a JSON
//!   `null` value means "remove this entry", which is distinct from the key
//!   being absent ("no override given"). This maps onto `Option<String>`:
//!   `None` is the deletion marker. Attribute values never carry a deletion
//!   marker; a `null` attribute is just a value.
//!
//! All maps whose declared order is semantically meaningful (inherit
//! application order, override application order) are `IndexMap`s so that
//! authored order survives parsing.

use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;
use crate::schema::SchemaDescriptor;

/// Reserved prefix for internal bookkeeping attribute keys.
///
/// Keys carrying this prefix are excluded from schema validation and from
/// user-facing attribute listings. This is a public contract between the
/// composition engine and consumers that inject provenance metadata into
/// composed nodes.
pub const RESERVED_ATTRIBUTE_PREFIX: &str = "__internal_";

/// Returns true for attribute keys under the reserved internal prefix.
pub fn is_reserved_attribute(key: &str) -> bool {
    key.starts_with(RESERVED_ATTRIBUTE_PREFIX)
}

/// Ordered override map for `children` and `inherits` entries.
///
/// `None` is the explicit deletion marker (JSON `null` on the wire).
pub type OverrideMap = IndexMap<String, Option<String>>;

/// Ordered attribute map, keyed by schema id.
pub type AttributeMap = IndexMap<String, Value>;

/// Layer document header. `id` is the layer's own URI/identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IfcxHeader {
    pub id: String,
    /// Additional header fields (version, author, timestamp, ...) are
    /// carried through untouched.
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

impl IfcxHeader {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            extra: IndexMap::new(),
        }
    }
}

/// A single import declaration referencing another layer by URI.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IfcxImport {
    pub uri: String,
}

/// One sparse, path-addressed override as authored in a layer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawRecord {
    /// Slash-delimited hierarchical path this record overrides.
    pub path: String,
    /// Child slot overrides: name to target path, or `null` to delete.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub children: OverrideMap,
    /// Inherit declarations: name to base path, or `null` to delete.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub inherits: OverrideMap,
    /// Attribute overrides keyed by schema id.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub attributes: AttributeMap,
}

/// One complete IFCX layer document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IfcxFile {
    pub header: IfcxHeader,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub imports: Vec<IfcxImport>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub schemas: IndexMap<String, SchemaDescriptor>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub data: Vec<RawRecord>,
}

impl IfcxFile {
    /// Create an empty layer with the given identity.
    pub fn new(id: &str) -> Self {
        Self {
            header: IfcxHeader::new(id),
            imports: Vec::new(),
            schemas: IndexMap::new(),
            data: Vec::new(),
        }
    }

    /// Parse a layer document from raw JSON bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// Parse a layer document from a JSON string.
    pub fn from_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read and parse a layer document from a file on disk.
    pub fn from_file(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        Self::from_slice(&bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_minimal_file() {
        let file = IfcxFile::from_str(r#"{"header": {"id": "test"}}"#).unwrap();
        assert_eq!(file.header.id, "test");
        assert!(file.imports.is_empty());
        assert!(file.schemas.is_empty());
        assert!(file.data.is_empty());
    }

    #[test]
    fn test_parse_full_file() {
        let doc = json!({
            "header": {"id": "https://example.com/model", "version": "ifcx_alpha"},
            "imports": [{"uri": "https://example.com/base"}],
            "schemas": {
                "x::y": {"dataType": "Integer"}
            },
            "data": [
                {"path": "a", "attributes": {"x::y": 3}}
            ]
        });
        let file = IfcxFile::from_str(&doc.to_string()).unwrap();
        assert_eq!(file.header.id, "https://example.com/model");
        assert_eq!(
            file.header.extra.get("version"),
            Some(&json!("ifcx_alpha"))
        );
        assert_eq!(file.imports.len(), 1);
        assert_eq!(file.imports[0].uri, "https://example.com/base");
        assert!(file.schemas.contains_key("x::y"));
        assert_eq!(file.data.len(), 1);
        assert_eq!(file.data[0].path, "a");
        assert_eq!(file.data[0].attributes.get("x::y"), Some(&json!(3)));
    }

    #[test]
    fn test_parse_deletion_markers() {
        let doc = json!({
            "header": {"id": "test"},
            "data": [
                {"path": "a", "children": {"kept": "base/b", "gone": null}}
            ]
        });
        let file = IfcxFile::from_str(&doc.to_string()).unwrap();
        let record = &file.data[0];
        assert_eq!(record.children.get("kept"), Some(&Some("base/b".to_string())));
        // Present key with None value: explicit deletion marker
        assert_eq!(record.children.get("gone"), Some(&None));
        // Absent key: no override given
        assert_eq!(record.children.get("missing"), None);
    }

    #[test]
    fn test_children_preserve_declared_order() {
        let doc = json!({
            "header": {"id": "test"},
            "data": [
                {"path": "a", "inherits": {"z": "base/z", "a": "base/a", "m": "base/m"}}
            ]
        });
        let file = IfcxFile::from_str(&doc.to_string()).unwrap();
        let names: Vec<&String> = file.data[0].inherits.keys().collect();
        assert_eq!(names, vec!["z", "a", "m"]);
    }

    #[test]
    fn test_parse_rejects_invalid_json() {
        assert!(IfcxFile::from_str("{not json").is_err());
        assert!(IfcxFile::from_str(r#"{"imports": []}"#).is_err()); // header required
    }

    #[test]
    fn test_reserved_attribute_prefix() {
        assert!(is_reserved_attribute("__internal_sourceLayer"));
        assert!(!is_reserved_attribute("bsi::ifc::class"));
        assert!(!is_reserved_attribute("internal_"));
    }

    #[test]
    fn test_roundtrip_serialization() {
        let doc = json!({
            "header": {"id": "test"},
            "data": [
                {"path": "a", "children": {"b": null}, "attributes": {"x::y": true}}
            ]
        });
        let file = IfcxFile::from_str(&doc.to_string()).unwrap();
        let serialized = serde_json::to_string(&file).unwrap();
        let reparsed = IfcxFile::from_str(&serialized).unwrap();
        assert_eq!(reparsed.data[0].children.get("b"), Some(&None));
        assert_eq!(reparsed.data[0].attributes.get("x::y"), Some(&json!(true)));
    }
}
