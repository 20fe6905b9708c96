//! # Schema Descriptors and Validation
//!
//! This module defines the recursive schema descriptor type declared in a
//! layer's schema table, and the validator that type-checks flattened
//! attribute values against it.
//!
//! ## Key Components
//!
//! - **`SchemaDescriptor`**: A recursive type declaration: a data kind plus
//!   the restriction payload relevant to that kind (enum option sets, object
//!   key descriptors, array element descriptors) and an ordered list of
//!   additional descriptors the value must also satisfy (`inherits`).
//!
//! - **`DataType`**: The eight primitive/structural kinds, matched
//!   exhaustively by the validator. An unknown kind string is rejected at
//!   parse time, so no catch-all dispatch arm exists.
//!
//! - **`validate`**: Checks every non-reserved attribute of every flattened
//!   node against the schema table. Validation is fail-fast: the first
//!   violation anywhere aborts the entire pass with an error naming the node
//!   path, the attribute, and a human-readable mismatch description.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::flatten::PreCompositionNode;
use crate::layer::is_reserved_attribute;

/// The data kind a schema descriptor requires of its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataType {
    Boolean,
    String,
    DateTime,
    Enum,
    Integer,
    Real,
    Reference,
    Object,
    Array,
}

/// Restriction payload for `DataType::Enum`: the allowed option set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnumRestrictions {
    pub options: Vec<String>,
}

/// Restriction payload for `DataType::Object`: per-key descriptors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectRestrictions {
    pub values: IndexMap<String, SchemaDescriptor>,
}

/// Restriction payload for `DataType::Array`: the element descriptor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArrayRestrictions {
    pub value: Box<SchemaDescriptor>,
}

/// Recursive schema descriptor for one attribute value shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaDescriptor {
    pub data_type: DataType,
    /// An absent optional value passes validation outright.
    #[serde(default)]
    pub optional: bool,
    /// Additional schema ids the value must also satisfy, checked in order
    /// before the own data-type dispatch. All must pass.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub inherits: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enum_restrictions: Option<EnumRestrictions>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object_restrictions: Option<ObjectRestrictions>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub array_restrictions: Option<ArrayRestrictions>,
}

impl SchemaDescriptor {
    /// Plain descriptor for a data kind with no restrictions.
    pub fn of(data_type: DataType) -> Self {
        Self {
            data_type,
            optional: false,
            inherits: Vec::new(),
            enum_restrictions: None,
            object_restrictions: None,
            array_restrictions: None,
        }
    }
}

/// Validate every flattened node's attributes against the schema table.
///
/// Every attribute key not under the reserved internal prefix must be
/// declared in `schemas`; its value must satisfy the declared descriptor.
/// The first violation aborts the pass.
pub fn validate(
    schemas: &IndexMap<String, SchemaDescriptor>,
    nodes: &IndexMap<String, PreCompositionNode>,
) -> Result<()> {
    for (path, node) in nodes {
        for (key, value) in &node.attributes {
            if is_reserved_attribute(key) {
                continue;
            }
            let descriptor = schemas.get(key).ok_or_else(|| Error::SchemaValidation {
                path: path.clone(),
                attribute: key.clone(),
                message: format!("missing schema \"{}\"", key),
            })?;
            check_value(schemas, descriptor, Some(value), path, key)?;
        }
    }
    Ok(())
}

/// Recursively check one value against a descriptor.
///
/// `value` is `None` when a declared object key is absent; that passes only
/// for optional descriptors. `context` is the attribute key extended with
/// `.key` / `.<array>.` steps as the check descends into nested shapes.
pub fn check_value(
    schemas: &IndexMap<String, SchemaDescriptor>,
    descriptor: &SchemaDescriptor,
    value: Option<&Value>,
    node_path: &str,
    context: &str,
) -> Result<()> {
    let value = match value {
        Some(v) => v,
        None => {
            if descriptor.optional {
                return Ok(());
            }
            return Err(mismatch(node_path, context, "required value is absent"));
        }
    };

    // Inherited descriptors are a logical AND: all must pass, and any
    // failure propagates unchanged.
    for inherited_id in &descriptor.inherits {
        let inherited = schemas
            .get(inherited_id)
            .ok_or_else(|| Error::SchemaValidation {
                path: node_path.to_string(),
                attribute: context.to_string(),
                message: format!("missing inherited schema \"{}\"", inherited_id),
            })?;
        check_value(schemas, inherited, Some(value), node_path, context)?;
    }

    match descriptor.data_type {
        DataType::Boolean => {
            if !value.is_boolean() {
                return Err(type_mismatch(node_path, context, "Boolean", value));
            }
        }
        DataType::String => {
            if !value.is_string() {
                return Err(type_mismatch(node_path, context, "String", value));
            }
        }
        DataType::DateTime => {
            if !value.is_string() {
                return Err(type_mismatch(node_path, context, "DateTime", value));
            }
        }
        DataType::Reference => {
            if !value.is_string() {
                return Err(type_mismatch(node_path, context, "Reference", value));
            }
        }
        DataType::Integer => {
            let is_integer = match value {
                Value::Number(n) => n.is_i64() || n.is_u64(),
                _ => false,
            };
            if !is_integer {
                return Err(type_mismatch(node_path, context, "Integer", value));
            }
        }
        DataType::Real => {
            if !value.is_number() {
                return Err(type_mismatch(node_path, context, "Real", value));
            }
        }
        DataType::Enum => {
            let restrictions = descriptor.enum_restrictions.as_ref().ok_or_else(|| {
                mismatch(node_path, context, "enum schema declares no options")
            })?;
            let matches = value
                .as_str()
                .map(|s| restrictions.options.iter().any(|o| o == s))
                .unwrap_or(false);
            if !matches {
                return Err(mismatch(
                    node_path,
                    context,
                    &format!(
                        "value {} is not one of the allowed options [{}]",
                        value,
                        restrictions.options.join(", ")
                    ),
                ));
            }
        }
        DataType::Object => {
            let object = value
                .as_object()
                .ok_or_else(|| type_mismatch(node_path, context, "Object", value))?;
            if let Some(restrictions) = &descriptor.object_restrictions {
                for (key, key_descriptor) in &restrictions.values {
                    let nested_context = format!("{}.{}", context, key);
                    check_value(
                        schemas,
                        key_descriptor,
                        object.get(key),
                        node_path,
                        &nested_context,
                    )?;
                }
            }
        }
        DataType::Array => {
            let elements = value
                .as_array()
                .ok_or_else(|| type_mismatch(node_path, context, "Array", value))?;
            let restrictions = descriptor.array_restrictions.as_ref().ok_or_else(|| {
                mismatch(node_path, context, "array schema declares no element descriptor")
            })?;
            let nested_context = format!("{}.<array>.", context);
            for element in elements {
                check_value(
                    schemas,
                    &restrictions.value,
                    Some(element),
                    node_path,
                    &nested_context,
                )?;
            }
        }
    }

    Ok(())
}

fn mismatch(node_path: &str, context: &str, message: &str) -> Error {
    Error::SchemaValidation {
        path: node_path.to_string(),
        attribute: context.to_string(),
        message: message.to_string(),
    }
}

fn type_mismatch(node_path: &str, context: &str, expected: &str, value: &Value) -> Error {
    mismatch(
        node_path,
        context,
        &format!("type mismatch: expected {}, found {}", expected, value),
    )
}
