// Blueprint Graph - In-memory graph model and mutation operations
//
// A graph owns its nodes, each node owns its pins, and the graph keeps a
// derived `connections` index over pin ids. Per-pin link lists are the
// single source of truth; the index is rebuilt on load and maintained by
// every mutating operation so the two representations never disagree.

use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::document::{GraphDoc, NodeDoc};

// ─────────────────────────────────────────────────────────────────────────────
// Pins
// ─────────────────────────────────────────────────────────────────────────────

/// Direction of a pin on a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PinDirection {
    #[serde(rename = "input", alias = "Input")]
    Input,
    #[serde(rename = "output", alias = "Output")]
    Output,
}

/// A typed connection point on a node
///
/// Doubles as the wire form: serializes to the `{pinId, pinName, direction,
/// pinType, defaultValue, linkedTo}` contract used by existing assets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphPin {
    /// Pin id, unique within the owning graph's pin space
    #[serde(alias = "PinId")]
    pub pin_id: String,
    /// Pin name, unique within the owning node
    #[serde(alias = "PinName")]
    pub pin_name: String,
    #[serde(alias = "Direction")]
    pub direction: PinDirection,
    /// Declared type, opaque to the model (e.g. "exec", "bool")
    #[serde(alias = "PinType")]
    pub pin_type: String,
    /// Only meaningful while the pin has no incoming connection
    #[serde(default, alias = "DefaultValue")]
    pub default_value: String,
    /// Ids of every pin this pin is linked to (symmetric with the peers)
    #[serde(default, alias = "LinkedTo")]
    pub linked_to: Vec<String>,
}

impl GraphPin {
    /// Create an unconnected pin with no default value
    pub fn new(
        pin_id: impl Into<String>,
        pin_name: impl Into<String>,
        direction: PinDirection,
        pin_type: impl Into<String>,
    ) -> Self {
        Self {
            pin_id: pin_id.into(),
            pin_name: pin_name.into(),
            direction,
            pin_type: pin_type.into(),
            default_value: String::new(),
            linked_to: Vec::new(),
        }
    }

    /// Set the default value (builder style, for tests and factories)
    pub fn with_default(mut self, value: impl Into<String>) -> Self {
        self.default_value = value.into();
        self
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Nodes
// ─────────────────────────────────────────────────────────────────────────────

/// One instruction/operation in a graph
#[derive(Debug, Clone, PartialEq)]
pub struct GraphNode {
    /// Stable guid, unique within the graph
    pub node_guid: String,
    /// Node class/shape name, validated only against an optional schema
    pub node_class: String,
    pub node_title: String,
    pub node_comment: String,
    pub position_x: i64,
    pub position_y: i64,
    /// Pins keyed by pin name (names unique per node, insertion order kept)
    pub pins: IndexMap<String, GraphPin>,
    /// Class-specific extra properties, preserved verbatim through load/save
    pub properties: IndexMap<String, Value>,
}

impl GraphNode {
    /// Get a pin by name
    pub fn pin(&self, pin_name: &str) -> Option<&GraphPin> {
        self.pins.get(pin_name)
    }

    /// Get a pin by name, mutably
    pub fn pin_mut(&mut self, pin_name: &str) -> Option<&mut GraphPin> {
        self.pins.get_mut(pin_name)
    }

    /// Add a pin to the node (replaces any pin with the same name)
    pub fn add_pin(&mut self, pin: GraphPin) {
        self.pins.insert(pin.pin_name.clone(), pin);
    }

    /// Remove a pin from the node
    pub fn remove_pin(&mut self, pin_name: &str) -> bool {
        self.pins.shift_remove(pin_name).is_some()
    }

    /// Convert to the wire form (pins as a list, extras merged at top level)
    pub fn to_doc(&self) -> NodeDoc {
        NodeDoc {
            node_guid: self.node_guid.clone(),
            node_class: self.node_class.clone(),
            node_title: self.node_title.clone(),
            node_comment: self.node_comment.clone(),
            position_x: self.position_x,
            position_y: self.position_y,
            pins: self.pins.values().cloned().collect(),
            extra: self.properties.clone(),
        }
    }

    /// Build from the wire form, keying pins by name
    pub fn from_doc(doc: NodeDoc) -> Self {
        let mut pins = IndexMap::new();
        for pin in doc.pins {
            pins.insert(pin.pin_name.clone(), pin);
        }
        Self {
            node_guid: doc.node_guid,
            node_class: doc.node_class,
            node_title: doc.node_title,
            node_comment: doc.node_comment,
            position_x: doc.position_x,
            position_y: doc.position_y,
            pins,
            properties: doc.extra,
        }
    }
}

/// Summary projection of a node, as returned by [`BlueprintGraph::list_nodes`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeSummary {
    pub guid: String,
    pub class: String,
    pub title: String,
    pub position: (i64, i64),
    pub pins: usize,
}

// ─────────────────────────────────────────────────────────────────────────────
// Graphs
// ─────────────────────────────────────────────────────────────────────────────

/// Kind of executable unit a graph represents
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum GraphType {
    #[default]
    EventGraph,
    Function,
    Macro,
}

/// A named collection of nodes forming one executable unit
#[derive(Debug, Clone)]
pub struct BlueprintGraph {
    pub graph_name: String,
    pub graph_type: GraphType,
    /// Generated once, stable for the graph's lifetime
    pub graph_guid: String,
    /// Nodes keyed by node guid, insertion order kept
    pub nodes: IndexMap<String, GraphNode>,
    /// Derived index: pin id -> set of linked pin ids. Never serialized;
    /// always re-derivable from the pins' link lists.
    pub connections: HashMap<String, HashSet<String>>,
}

/// Generate a guid in the format used by existing assets:
/// 32 uppercase hex chars, no hyphens.
pub(crate) fn new_guid() -> String {
    Uuid::new_v4().simple().to_string().to_uppercase()
}

impl BlueprintGraph {
    /// Create an empty graph, assigning a fresh guid when none is supplied
    pub fn new(
        graph_name: impl Into<String>,
        graph_type: GraphType,
        graph_guid: Option<String>,
    ) -> Self {
        Self {
            graph_name: graph_name.into(),
            graph_type,
            graph_guid: graph_guid.filter(|g| !g.is_empty()).unwrap_or_else(new_guid),
            nodes: IndexMap::new(),
            connections: HashMap::new(),
        }
    }

    // ── Serialization ────────────────────────────────────────────────────────

    /// Convert to the wire form. `connections` is intentionally absent: it is
    /// a derived cache and is rebuilt from the pins' link lists on load.
    pub fn to_document(&self) -> GraphDoc {
        GraphDoc {
            graph_name: self.graph_name.clone(),
            graph_type: self.graph_type,
            graph_guid: self.graph_guid.clone(),
            nodes: self.nodes.values().map(GraphNode::to_doc).collect(),
        }
    }

    /// Build from the wire form, rebuilding the connections index.
    ///
    /// Rebuilding rather than deserializing also self-heals documents produced
    /// by tools that edited link lists without maintaining an index.
    pub fn from_document(doc: GraphDoc) -> Self {
        let mut graph = Self::new(doc.graph_name, doc.graph_type, Some(doc.graph_guid));
        for node in doc.nodes {
            let node = GraphNode::from_doc(node);
            graph.nodes.insert(node.node_guid.clone(), node);
        }
        graph.rebuild_connections();
        graph
    }

    /// Re-derive the connections index from every pin's link list
    pub fn rebuild_connections(&mut self) {
        self.connections.clear();
        for node in self.nodes.values() {
            for pin in node.pins.values() {
                if !pin.linked_to.is_empty() {
                    self.connections
                        .entry(pin.pin_id.clone())
                        .or_default()
                        .extend(pin.linked_to.iter().cloned());
                }
            }
        }
    }

    // ── Mutation ─────────────────────────────────────────────────────────────

    /// Add a new node with a freshly generated guid and no pins.
    ///
    /// Returns the guid of the new node. Never fails.
    pub fn add_node(
        &mut self,
        node_class: impl Into<String>,
        position: (i64, i64),
        node_title: impl Into<String>,
        node_comment: impl Into<String>,
        properties: IndexMap<String, Value>,
    ) -> String {
        let node_guid = new_guid();
        let node = GraphNode {
            node_guid: node_guid.clone(),
            node_class: node_class.into(),
            node_title: node_title.into(),
            node_comment: node_comment.into(),
            position_x: position.0,
            position_y: position.1,
            pins: IndexMap::new(),
            properties,
        };
        self.nodes.insert(node_guid.clone(), node);
        node_guid
    }

    /// Remove a node, severing every connection it participates in.
    ///
    /// Peer pins' link lists and the connections index are both cleaned so
    /// nothing keeps referencing the removed pins. Returns false if the guid
    /// is absent.
    pub fn remove_node(&mut self, node_guid: &str) -> bool {
        let Some(node) = self.nodes.shift_remove(node_guid) else {
            return false;
        };

        for pin in node.pins.values() {
            let Some(peers) = self.connections.remove(&pin.pin_id) else {
                continue;
            };
            for peer_id in peers {
                if let Some(set) = self.connections.get_mut(&peer_id) {
                    set.remove(&pin.pin_id);
                    if set.is_empty() {
                        self.connections.remove(&peer_id);
                    }
                }
                // Linear scan; a pin-id -> (node, pin) index would make this
                // O(degree) instead of O(total pins).
                if let Some(peer) = self.pin_by_id_mut(&peer_id) {
                    peer.linked_to.retain(|id| id != &pin.pin_id);
                }
            }
        }
        true
    }

    /// Connect two pins by node guid and pin name.
    ///
    /// Fails (false) if either node or pin is missing, or if both pins have
    /// the same direction. Idempotent: connecting an already-linked pair
    /// returns true without appending a duplicate link.
    pub fn connect_pins(
        &mut self,
        from_node_guid: &str,
        from_pin_name: &str,
        to_node_guid: &str,
        to_pin_name: &str,
    ) -> bool {
        let Some((from_id, from_dir)) = self.pin_identity(from_node_guid, from_pin_name) else {
            return false;
        };
        let Some((to_id, to_dir)) = self.pin_identity(to_node_guid, to_pin_name) else {
            return false;
        };

        // An input cannot connect to an input, nor an output to an output.
        if from_dir == to_dir {
            return false;
        }

        if self
            .connections
            .get(&from_id)
            .is_some_and(|set| set.contains(&to_id))
        {
            return true;
        }

        if let Some(pin) = self
            .nodes
            .get_mut(from_node_guid)
            .and_then(|n| n.pin_mut(from_pin_name))
        {
            pin.linked_to.push(to_id.clone());
        }
        if let Some(pin) = self
            .nodes
            .get_mut(to_node_guid)
            .and_then(|n| n.pin_mut(to_pin_name))
        {
            pin.linked_to.push(from_id.clone());
        }

        self.connections
            .entry(from_id.clone())
            .or_default()
            .insert(to_id.clone());
        self.connections.entry(to_id).or_default().insert(from_id);

        true
    }

    /// Disconnect two pins by node guid and pin name.
    ///
    /// Fails (false) if either node or pin is missing, or if no link exists
    /// between the pair. Removes both directions from the link lists and the
    /// connections index, pruning entries that become empty.
    pub fn disconnect_pins(
        &mut self,
        from_node_guid: &str,
        from_pin_name: &str,
        to_node_guid: &str,
        to_pin_name: &str,
    ) -> bool {
        let Some((from_id, _)) = self.pin_identity(from_node_guid, from_pin_name) else {
            return false;
        };
        let Some((to_id, _)) = self.pin_identity(to_node_guid, to_pin_name) else {
            return false;
        };

        let linked = self
            .connections
            .get(&from_id)
            .is_some_and(|set| set.contains(&to_id));
        if !linked {
            return false;
        }

        if let Some(pin) = self
            .nodes
            .get_mut(from_node_guid)
            .and_then(|n| n.pin_mut(from_pin_name))
        {
            pin.linked_to.retain(|id| id != &to_id);
        }
        if let Some(pin) = self
            .nodes
            .get_mut(to_node_guid)
            .and_then(|n| n.pin_mut(to_pin_name))
        {
            pin.linked_to.retain(|id| id != &from_id);
        }

        self.prune_connection(&from_id, &to_id);
        self.prune_connection(&to_id, &from_id);

        true
    }

    /// Set the default value of a pin.
    ///
    /// Unconditional overwrite, even when the pin currently has incoming
    /// links; honoring "only settable when unconnected" is left to callers.
    pub fn set_pin_default(&mut self, node_guid: &str, pin_name: &str, value: &str) -> bool {
        let Some(pin) = self
            .nodes
            .get_mut(node_guid)
            .and_then(|n| n.pin_mut(pin_name))
        else {
            return false;
        };
        pin.default_value = value.to_string();
        true
    }

    // ── Queries ──────────────────────────────────────────────────────────────

    /// Get a node by guid
    pub fn get_node(&self, node_guid: &str) -> Option<&GraphNode> {
        self.nodes.get(node_guid)
    }

    /// Get a node by guid, mutably
    pub fn get_node_mut(&mut self, node_guid: &str) -> Option<&mut GraphNode> {
        self.nodes.get_mut(node_guid)
    }

    /// Find all nodes of a specific class
    pub fn find_nodes_by_class(&self, node_class: &str) -> Vec<&GraphNode> {
        self.nodes
            .values()
            .filter(|n| n.node_class == node_class)
            .collect()
    }

    /// List all nodes with summary info
    pub fn list_nodes(&self) -> Vec<NodeSummary> {
        self.nodes
            .values()
            .map(|n| NodeSummary {
                guid: n.node_guid.clone(),
                class: n.node_class.clone(),
                title: n.node_title.clone(),
                position: (n.position_x, n.position_y),
                pins: n.pins.len(),
            })
            .collect()
    }

    /// Get node count
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if the graph has no nodes
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    // ── Internals ────────────────────────────────────────────────────────────

    /// Resolve a (node guid, pin name) pair to the pin's id and direction
    fn pin_identity(&self, node_guid: &str, pin_name: &str) -> Option<(String, PinDirection)> {
        let pin = self.nodes.get(node_guid)?.pin(pin_name)?;
        Some((pin.pin_id.clone(), pin.direction))
    }

    /// Find a pin anywhere in the graph by pin id
    fn pin_by_id_mut(&mut self, pin_id: &str) -> Option<&mut GraphPin> {
        self.nodes
            .values_mut()
            .flat_map(|n| n.pins.values_mut())
            .find(|p| p.pin_id == pin_id)
    }

    /// Drop `to` from `from`'s connection set, removing the set when empty.
    /// A pin with zero links has no connections key, not an empty set.
    fn prune_connection(&mut self, from: &str, to: &str) {
        if let Some(set) = self.connections.get_mut(from) {
            set.remove(to);
            if set.is_empty() {
                self.connections.remove(from);
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
