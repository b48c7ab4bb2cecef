//! Blueprint Graph - In-memory model of blueprint node graphs
//!
//! This crate holds the structured representation of a blueprint asset's
//! graphs: nodes, pins, and the derived bidirectional connections index.
//! Graphs round-trip losslessly through the JSON wire form and are edited
//! through mutation operations that keep link lists and the connections
//! index mutually consistent.

pub mod document;
mod graph;
mod store;

pub use document::{GraphDoc, NodeDoc};
pub use graph::{BlueprintGraph, GraphNode, GraphPin, GraphType, NodeSummary, PinDirection};
pub use store::{GraphStore, NodeClassSchema, NodeFactory, StoreError};
