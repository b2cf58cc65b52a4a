//! Flowchart model

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::core::LineStyle;

/// Node shape in a flowchart
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowShape {
    Start,
    End,
    #[default]
    Process,
    Decision,
    InputOutput,
    Subroutine,
}

impl FlowShape {
    /// Shapes that represent a unit of work
    pub fn is_process(&self) -> bool {
        matches!(
            self,
            FlowShape::Process | FlowShape::InputOutput | FlowShape::Subroutine
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, FlowShape::Start | FlowShape::End)
    }
}

/// A flowchart node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowNode {
    pub id: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub shape: FlowShape,
}

impl FlowNode {
    pub fn new(id: impl Into<String>, label: impl Into<String>, shape: FlowShape) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            shape,
        }
    }

    /// Label to draw; falls back to the id
    pub fn text(&self) -> &str {
        if self.label.is_empty() {
            &self.id
        } else {
            &self.label
        }
    }
}

/// A directed flowchart edge
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowEdge {
    pub from: String,
    pub to: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default)]
    pub style: LineStyle,
}

impl FlowEdge {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            label: None,
            style: LineStyle::Solid,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_style(mut self, style: LineStyle) -> Self {
        self.style = style;
        self
    }

    /// Label reads as the affirmative branch of a decision
    pub fn is_affirmative(&self) -> bool {
        self.label
            .as_deref()
            .map(|l| matches!(l.trim().to_lowercase().as_str(), "yes" | "true" | "y"))
            .unwrap_or(false)
    }
}

/// A flowchart
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowDiagram {
    #[serde(default)]
    pub nodes: Vec<FlowNode>,
    #[serde(default)]
    pub edges: Vec<FlowEdge>,
}

impl FlowDiagram {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_node(mut self, node: FlowNode) -> Self {
        self.nodes.push(node);
        self
    }

    pub fn with_edge(mut self, edge: FlowEdge) -> Self {
        self.edges.push(edge);
        self
    }

    pub fn node(&self, id: &str) -> Option<&FlowNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Edges whose endpoints both exist
    pub fn valid_edges(&self) -> impl Iterator<Item = &FlowEdge> {
        self.edges
            .iter()
            .filter(|e| self.node(&e.from).is_some() && self.node(&e.to).is_some())
    }

    /// Outgoing valid edges per node, in edge order
    pub fn outgoing(&self) -> IndexMap<&str, Vec<&FlowEdge>> {
        let mut out: IndexMap<&str, Vec<&FlowEdge>> =
            self.nodes.iter().map(|n| (n.id.as_str(), Vec::new())).collect();
        for edge in self.valid_edges() {
            if let Some(edges) = out.get_mut(edge.from.as_str()) {
                edges.push(edge);
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_flow_diagram() {
        let json = r#"{
            "nodes": [
                {"id": "s", "label": "Start", "shape": "start"},
                {"id": "d", "label": "ok?", "shape": "decision"}
            ],
            "edges": [{"from": "s", "to": "d", "style": "dashed"}]
        }"#;
        let diagram: FlowDiagram = serde_json::from_str(json).unwrap();
        assert_eq!(diagram.nodes[1].shape, FlowShape::Decision);
        assert_eq!(diagram.edges[0].style, LineStyle::Dashed);
        assert_eq!(diagram.edges[0].label, None);
    }

    #[test]
    fn test_affirmative_labels() {
        assert!(FlowEdge::new("a", "b").with_label(" Yes ").is_affirmative());
        assert!(FlowEdge::new("a", "b").with_label("true").is_affirmative());
        assert!(!FlowEdge::new("a", "b").with_label("no").is_affirmative());
        assert!(!FlowEdge::new("a", "b").is_affirmative());
    }

    #[test]
    fn test_outgoing_skips_dangling_edges() {
        let diagram = FlowDiagram::new()
            .with_node(FlowNode::new("a", "A", FlowShape::Process))
            .with_edge(FlowEdge::new("a", "missing"));
        assert!(diagram.outgoing()["a"].is_empty());
        assert_eq!(FlowNode::new("x", "", FlowShape::Process).text(), "x");
    }
}
