// Graph Store - Named graphs loaded from blueprint documents
//
// A blueprint document keeps graphs in two containers: free-standing event
// graphs under "EventGraphs", and function bodies nested inside entries of
// "Functions". The store resolves a graph name across both in one pass and
// keeps the loaded graphs keyed by that name.
//
// Node classes are optionally validated against an externally supplied
// schema document; with no schema loaded, validation is permissive.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::document::{field, field_array, field_str, GraphDoc};
use crate::graph::BlueprintGraph;

// ─────────────────────────────────────────────────────────────────────────────
// Errors
// ─────────────────────────────────────────────────────────────────────────────

/// Errors reported by the graph store
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Graph '{0}' not found in document")]
    GraphNotFound(String),

    #[error("No loaded graph named '{0}'")]
    GraphNotLoaded(String),

    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse document: {0}")]
    Parse(#[from] serde_json::Error),
}

// ─────────────────────────────────────────────────────────────────────────────
// Node class schema
// ─────────────────────────────────────────────────────────────────────────────

/// Declared metadata for one node class, from an external schema document
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeClassSchema {
    pub node_class: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub properties: Vec<String>,
    #[serde(default)]
    pub has_dynamic_pins: bool,
    #[serde(default)]
    pub is_latent: bool,
    #[serde(default)]
    pub can_be_pure: bool,
}

/// Factory info for creating nodes of a schema-declared class
#[derive(Debug, Clone, Serialize)]
pub struct NodeFactory {
    pub class: String,
    pub display_name: String,
    pub category: String,
    pub description: String,
    pub properties: Vec<String>,
    pub has_dynamic_pins: bool,
    pub is_latent: bool,
    pub can_be_pure: bool,
}

impl NodeFactory {
    fn from_schema(schema: &NodeClassSchema) -> Self {
        Self {
            class: schema.node_class.clone(),
            display_name: if schema.display_name.is_empty() {
                schema.node_class.clone()
            } else {
                schema.display_name.clone()
            },
            category: if schema.category.is_empty() {
                "Unknown".to_string()
            } else {
                schema.category.clone()
            },
            description: schema.description.clone(),
            properties: schema.properties.clone(),
            has_dynamic_pins: schema.has_dynamic_pins,
            is_latent: schema.is_latent,
            can_be_pure: schema.can_be_pure,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Graph lookup
// ─────────────────────────────────────────────────────────────────────────────

/// Which document container a graph fragment was found in
enum GraphSlot<'a> {
    /// Free-standing graph from the event-graph list
    EventGraph(&'a Value),
    /// Graph nested inside a function entry
    Function(&'a Value),
}

impl<'a> GraphSlot<'a> {
    fn fragment(&self) -> &'a Value {
        match self {
            GraphSlot::EventGraph(value) | GraphSlot::Function(value) => value,
        }
    }
}

/// Resolve a graph name across both containers in one pass
fn find_graph_fragment<'a>(document: &'a Value, graph_name: &str) -> Option<GraphSlot<'a>> {
    for graph in field_array(document, "eventGraphs") {
        if field_str(graph, "graphName") == Some(graph_name) {
            return Some(GraphSlot::EventGraph(graph));
        }
    }
    for function in field_array(document, "functions") {
        if field_str(function, "functionName") == Some(graph_name) {
            return field(function, "graph").map(GraphSlot::Function);
        }
    }
    None
}

// ─────────────────────────────────────────────────────────────────────────────
// Graph store
// ─────────────────────────────────────────────────────────────────────────────

/// Holds zero or more named graphs plus an optional node-class schema
#[derive(Debug, Default)]
pub struct GraphStore {
    graphs: IndexMap<String, BlueprintGraph>,
    schema: HashMap<String, NodeClassSchema>,
}

impl GraphStore {
    /// Create an empty store with no schema (permissive validation)
    pub fn new() -> Self {
        Self::default()
    }

    // ── Schema ───────────────────────────────────────────────────────────────

    /// Ingest a schema document (`{"nodeSchemas": [...]}`), replacing any
    /// previously loaded schema. Returns the number of node classes loaded.
    pub fn load_schema_value(&mut self, document: &Value) -> Result<usize, StoreError> {
        let schemas: Vec<NodeClassSchema> = field(document, "nodeSchemas")
            .cloned()
            .map(serde_json::from_value)
            .transpose()?
            .unwrap_or_default();

        self.schema = schemas
            .into_iter()
            .map(|s| (s.node_class.clone(), s))
            .collect();
        debug!("Loaded schema for {} node classes", self.schema.len());
        Ok(self.schema.len())
    }

    /// Check a node class against the schema.
    ///
    /// True unconditionally when no schema was loaded.
    pub fn validate_node_class(&self, node_class: &str) -> bool {
        self.schema.is_empty() || self.schema.contains_key(node_class)
    }

    /// Get factory info for a schema-declared node class
    pub fn node_factory(&self, node_class: &str) -> Option<NodeFactory> {
        match self.schema.get(node_class) {
            Some(schema) => Some(NodeFactory::from_schema(schema)),
            None => {
                warn!("Node class '{}' not found in schema", node_class);
                None
            }
        }
    }

    // ── Loading and saving ───────────────────────────────────────────────────

    /// Load a named graph from a blueprint document.
    ///
    /// Searches the event-graph list by graph name first, then the function
    /// list by function name (the graph is nested in the function entry).
    pub fn load_graph(&mut self, document: &Value, graph_name: &str) -> Result<(), StoreError> {
        let Some(slot) = find_graph_fragment(document, graph_name) else {
            warn!("Graph '{}' not found in document", graph_name);
            return Err(StoreError::GraphNotFound(graph_name.to_string()));
        };

        let doc: GraphDoc = serde_json::from_value(slot.fragment().clone())?;
        let graph = BlueprintGraph::from_document(doc);
        debug!("Loaded graph '{}' ({} nodes)", graph_name, graph.len());
        self.graphs.insert(graph_name.to_string(), graph);
        Ok(())
    }

    /// Load a named graph from a blueprint JSON file
    pub fn load_graph_file(
        &mut self,
        path: impl AsRef<Path>,
        graph_name: &str,
    ) -> Result<(), StoreError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| StoreError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let document: Value = serde_json::from_str(&content)?;
        self.load_graph(&document, graph_name)
    }

    /// Serialize a loaded graph back to its wire form
    pub fn save_graph(&self, graph_name: &str) -> Result<GraphDoc, StoreError> {
        self.graphs
            .get(graph_name)
            .map(BlueprintGraph::to_document)
            .ok_or_else(|| StoreError::GraphNotLoaded(graph_name.to_string()))
    }

    /// Write a loaded graph to a JSON file
    pub fn save_graph_file(
        &self,
        graph_name: &str,
        path: impl AsRef<Path>,
    ) -> Result<(), StoreError> {
        let doc = self.save_graph(graph_name)?;
        let path = path.as_ref();
        let content = serde_json::to_string_pretty(&doc)?;
        std::fs::write(path, content).map_err(|source| StoreError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    // ── Access ───────────────────────────────────────────────────────────────

    /// Get a loaded graph by name
    pub fn graph(&self, graph_name: &str) -> Option<&BlueprintGraph> {
        self.graphs.get(graph_name)
    }

    /// Get a loaded graph by name, mutably
    pub fn graph_mut(&mut self, graph_name: &str) -> Option<&mut BlueprintGraph> {
        self.graphs.get_mut(graph_name)
    }

    /// List the names of all loaded graphs
    pub fn list_graphs(&self) -> Vec<&str> {
        self.graphs.keys().map(String::as_str).collect()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_document() -> Value {
        json!({
            "Metadata": {"BlueprintName": "BP_Gate", "ParentClass": "Actor"},
            "EventGraphs": [{
                "graphName": "EventGraph",
                "graphType": "EventGraph",
                "graphGuid": "EG1",
                "nodes": [{
                    "nodeGuid": "N1",
                    "nodeClass": "K2Node_Event",
                    "pins": [
                        {"pinId": "P1", "pinName": "then", "direction": "output",
                         "pinType": "exec", "linkedTo": ["P2"]},
                    ]
                }, {
                    "nodeGuid": "N2",
                    "nodeClass": "K2Node_CallFunction",
                    "pins": [
                        {"pinId": "P2", "pinName": "exec", "direction": "input",
                         "pinType": "exec", "linkedTo": ["P1"]},
                    ]
                }]
            }],
            "Functions": [{
                "functionName": "OpenGate",
                "graph": {
                    "graphName": "OpenGate",
                    "graphType": "Function",
                    "graphGuid": "FG1",
                    "nodes": []
                }
            }]
        })
    }

    #[test]
    fn test_load_event_graph() {
        let mut store = GraphStore::new();
        store.load_graph(&sample_document(), "EventGraph").unwrap();

        let graph = store.graph("EventGraph").unwrap();
        assert_eq!(graph.len(), 2);
        // Connections index derived from the link lists in the document.
        assert!(graph.connections["P1"].contains("P2"));
        assert!(graph.connections["P2"].contains("P1"));
    }

    #[test]
    fn test_load_function_graph_by_function_name() {
        let mut store = GraphStore::new();
        store.load_graph(&sample_document(), "OpenGate").unwrap();

        let graph = store.graph("OpenGate").unwrap();
        assert_eq!(graph.graph_guid, "FG1");
        assert!(graph.is_empty());
        assert_eq!(store.list_graphs(), vec!["OpenGate"]);
    }

    #[test]
    fn test_load_missing_graph_reports() {
        let mut store = GraphStore::new();
        let err = store.load_graph(&sample_document(), "Nope").unwrap_err();
        assert!(matches!(err, StoreError::GraphNotFound(name) if name == "Nope"));
        assert!(store.graph("Nope").is_none());
    }

    #[test]
    fn test_validation_permissive_without_schema() {
        let store = GraphStore::new();
        assert!(store.validate_node_class("K2Node_Anything"));
    }

    #[test]
    fn test_validation_with_schema() {
        let mut store = GraphStore::new();
        let count = store
            .load_schema_value(&json!({
                "nodeSchemas": [
                    {"nodeClass": "K2Node_Event", "displayName": "Event", "category": "Events"},
                    {"nodeClass": "K2Node_CallFunction"}
                ]
            }))
            .unwrap();
        assert_eq!(count, 2);

        assert!(store.validate_node_class("K2Node_Event"));
        assert!(!store.validate_node_class("K2Node_Bogus"));
    }

    #[test]
    fn test_node_factory_fallbacks() {
        let mut store = GraphStore::new();
        store
            .load_schema_value(&json!({
                "nodeSchemas": [{"nodeClass": "K2Node_CallFunction"}]
            }))
            .unwrap();

        let factory = store.node_factory("K2Node_CallFunction").unwrap();
        assert_eq!(factory.display_name, "K2Node_CallFunction");
        assert_eq!(factory.category, "Unknown");
        assert!(store.node_factory("K2Node_Bogus").is_none());
    }

    #[test]
    fn test_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let in_path = dir.path().join("bp.json");
        let out_path = dir.path().join("graph.json");
        std::fs::write(&in_path, sample_document().to_string()).unwrap();

        let mut store = GraphStore::new();
        store.load_graph_file(&in_path, "EventGraph").unwrap();
        store.save_graph_file("EventGraph", &out_path).unwrap();

        let saved: Value = serde_json::from_str(&std::fs::read_to_string(&out_path).unwrap()).unwrap();
        assert_eq!(saved["graphName"], json!("EventGraph"));
        assert_eq!(saved["nodes"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_save_unloaded_graph_fails() {
        let store = GraphStore::new();
        assert!(matches!(
            store.save_graph("EventGraph"),
            Err(StoreError::GraphNotLoaded(_))
        ));
    }
}
