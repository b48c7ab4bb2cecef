// Wire document types and field access helpers
//
// Field names are the interoperability contract with existing assets. Real
// documents show two key-casing conventions: capitalized top-level keys
// ("EventGraphs", "VarName") and lower-camel-case graph/node/pin keys
// ("graphName", "nodeGuid"). Deserialization accepts both via serde aliases;
// serialization normalizes to camelCase.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::graph::{GraphPin, GraphType};

// ─────────────────────────────────────────────────────────────────────────────
// Graph fragments
// ─────────────────────────────────────────────────────────────────────────────

/// Wire form of a node: `{nodeGuid, nodeClass, nodeTitle, nodeComment,
/// positionX, positionY, pins, ...extra properties merged at top level}`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeDoc {
    #[serde(alias = "NodeGuid")]
    pub node_guid: String,
    #[serde(alias = "NodeClass")]
    pub node_class: String,
    #[serde(default, alias = "NodeTitle")]
    pub node_title: String,
    #[serde(default, alias = "NodeComment")]
    pub node_comment: String,
    #[serde(default, alias = "PositionX")]
    pub position_x: i64,
    #[serde(default, alias = "PositionY")]
    pub position_y: i64,
    #[serde(default, alias = "Pins")]
    pub pins: Vec<GraphPin>,
    /// Class-specific properties the model does not interpret
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

/// Wire form of a graph: `{graphName, graphType, graphGuid, nodes}`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphDoc {
    #[serde(alias = "GraphName")]
    pub graph_name: String,
    #[serde(default, alias = "GraphType")]
    pub graph_type: GraphType,
    #[serde(default, alias = "GraphGuid")]
    pub graph_guid: String,
    #[serde(default, alias = "Nodes")]
    pub nodes: Vec<NodeDoc>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Field access on raw documents
// ─────────────────────────────────────────────────────────────────────────────

/// Look up a key on a raw JSON object, accepting either casing convention:
/// `field(doc, "eventGraphs")` also matches `"EventGraphs"` and vice versa.
pub fn field<'a>(value: &'a Value, name: &str) -> Option<&'a Value> {
    let obj = value.as_object()?;
    if let Some(found) = obj.get(name) {
        return Some(found);
    }
    obj.get(&toggle_case(name))
}

/// Look up a key and read it as a string
pub fn field_str<'a>(value: &'a Value, name: &str) -> Option<&'a str> {
    field(value, name)?.as_str()
}

/// Look up a key and read it as an array, defaulting to empty when absent
pub fn field_array<'a>(value: &'a Value, name: &str) -> &'a [Value] {
    field(value, name)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

/// Flip the case of the leading character ("graphName" <-> "GraphName")
fn toggle_case(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_uppercase() => first.to_lowercase().chain(chars).collect(),
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
