//! Layout graph shared by every diagram kind
//!
//! Renderers translate their diagram model into a [`DiagramGraph`]: a flat
//! node table with measured sizes plus directed edges. The graph is built once
//! per render call and stays immutable while layout runs.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::Size;

/// Semantic kind of a graph edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    /// Plain directed edge (flow, transition, dependency arrow)
    #[default]
    Directed,
    /// Child extends parent
    Extends,
    /// Class implements interface
    Implements,
    /// Whole owns part
    Composition,
    /// Whole aggregates part
    Aggregation,
    Association,
    Dependency,
}

impl EdgeKind {
    /// Edges that point child→parent in the model but layer parent-first
    pub fn is_inverted(&self) -> bool {
        matches!(self, EdgeKind::Extends | EdgeKind::Implements)
    }
}

/// A node with its measured box size
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: String,
    pub width: i32,
    pub height: i32,
}

impl GraphNode {
    pub fn new(id: impl Into<String>, width: i32, height: i32) -> Self {
        Self {
            id: id.into(),
            width,
            height,
        }
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }
}

/// A directed edge between two node ids
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub from: String,
    pub to: String,
    pub kind: EdgeKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl GraphEdge {
    pub fn new(from: impl Into<String>, to: impl Into<String>, kind: EdgeKind) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            kind,
            label: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn is_self_loop(&self) -> bool {
        self.from == self.to
    }

    /// Endpoints in layering direction: inverted kinds are reversed
    pub fn layering_endpoints(&self) -> (&str, &str) {
        if self.kind.is_inverted() {
            (&self.to, &self.from)
        } else {
            (&self.from, &self.to)
        }
    }
}

/// Node table plus directed edges
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiagramGraph {
    nodes: IndexMap<String, GraphNode>,
    edges: Vec<GraphEdge>,
}

impl DiagramGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a graph from nodes and edges, dropping edges with unknown endpoints
    pub fn from_parts(
        nodes: impl IntoIterator<Item = GraphNode>,
        edges: impl IntoIterator<Item = GraphEdge>,
    ) -> Self {
        let mut graph = Self::new();
        for node in nodes {
            graph.add_node(node);
        }
        for edge in edges {
            graph.add_edge(edge);
        }
        graph
    }

    /// Insert a node; a repeated id replaces the earlier size but keeps its position
    pub fn add_node(&mut self, node: GraphNode) {
        self.nodes.insert(node.id.clone(), node);
    }

    /// Insert an edge. Returns false (and drops the edge) when either endpoint is unknown.
    pub fn add_edge(&mut self, edge: GraphEdge) -> bool {
        if !self.nodes.contains_key(&edge.from) || !self.nodes.contains_key(&edge.to) {
            debug!(from = %edge.from, to = %edge.to, "Dropping edge with unknown endpoint");
            return false;
        }
        self.edges.push(edge);
        true
    }

    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.nodes.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    /// Nodes in insertion order
    pub fn nodes(&self) -> impl Iterator<Item = &GraphNode> {
        self.nodes.values()
    }

    pub fn node_ids(&self) -> impl Iterator<Item = &str> {
        self.nodes.keys().map(|k| k.as_str())
    }

    pub fn edges(&self) -> &[GraphEdge] {
        &self.edges
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Adjacency in layering direction, ignoring self-loops
    pub fn adjacency(&self) -> Adjacency {
        let mut adjacency = Adjacency::default();
        for id in self.nodes.keys() {
            adjacency.successors.insert(id.clone(), Vec::new());
            adjacency.predecessors.insert(id.clone(), Vec::new());
        }
        for edge in self.edges.iter().filter(|e| !e.is_self_loop()) {
            let (from, to) = edge.layering_endpoints();
            adjacency.add(from, to);
        }
        adjacency
    }
}

/// Predecessor/successor lists keyed by node id
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Adjacency {
    successors: IndexMap<String, Vec<String>>,
    predecessors: IndexMap<String, Vec<String>>,
}

impl Adjacency {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a directed edge; multi-edges are kept
    pub fn add(&mut self, from: &str, to: &str) {
        self.successors
            .entry(from.to_string())
            .or_default()
            .push(to.to_string());
        self.predecessors
            .entry(to.to_string())
            .or_default()
            .push(from.to_string());
        self.successors.entry(to.to_string()).or_default();
        self.predecessors.entry(from.to_string()).or_default();
    }

    pub fn successors(&self, id: &str) -> &[String] {
        self.successors.get(id).map(|v| v.as_slice()).unwrap_or(&[])
    }

    pub fn predecessors(&self, id: &str) -> &[String] {
        self.predecessors.get(id).map(|v| v.as_slice()).unwrap_or(&[])
    }

    /// Node ids in first-seen order
    pub fn node_ids(&self) -> impl Iterator<Item = &str> {
        self.successors.keys().map(|k| k.as_str())
    }

    pub fn node_count(&self) -> usize {
        self.successors.len()
    }
}
