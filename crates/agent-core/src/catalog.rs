//! Tool Catalog
//!
//! Converts provider tool descriptors into the function-calling schema the
//! completion service expects. Built once per session, shared read-only.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::tool::ToolDescriptor;

/// One entry of the catalog as sent on the wire
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Always "function"
    #[serde(rename = "type")]
    pub kind: String,

    pub function: FunctionSpec,
}

/// Function-call schema for a single tool
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FunctionSpec {
    pub name: String,
    pub description: String,

    /// Structured JSON Schema, never a string
    pub parameters: serde_json::Value,
}

/// Immutable, cheaply cloneable session catalog
pub type Catalog = Arc<[CatalogEntry]>;

/// Schema used when a descriptor has none
pub fn empty_object_schema() -> serde_json::Value {
    serde_json::json!({ "type": "object", "properties": {} })
}

/// Map descriptors 1:1 into catalog entries, preserving order
pub fn build_catalog(descriptors: &[ToolDescriptor]) -> Catalog {
    descriptors
        .iter()
        .map(|descriptor| CatalogEntry {
            kind: "function".into(),
            function: FunctionSpec {
                name: descriptor.name.clone(),
                description: descriptor.description.clone(),
                parameters: descriptor
                    .input_schema
                    .clone()
                    .filter(|schema| !schema.is_null())
                    .unwrap_or_else(empty_object_schema),
            },
        })
        .collect()
}
