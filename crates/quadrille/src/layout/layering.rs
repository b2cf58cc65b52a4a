//! Topological layer assignment
//!
//! Each round collects every unassigned node whose predecessors all sit in
//! earlier layers and places them, in input order, into the next layer.
//! When a round finds nothing (a residual cycle) the remaining nodes are
//! flushed into the current layer and recorded as forced.

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use tracing::{debug, span, trace, warn, Level};

use crate::core::{Adjacency, DiagramGraph};

/// Result of layer assignment
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerAssignment {
    /// Layers top to bottom, each an ordered list of node ids
    pub layers: Vec<Vec<String>>,
    /// Nodes placed by a cycle break rather than by topological order
    pub forced: Vec<String>,
}

impl LayerAssignment {
    /// Index of the layer holding `id`
    pub fn layer_of(&self, id: &str) -> Option<usize> {
        self.layers
            .iter()
            .position(|layer| layer.iter().any(|n| n == id))
    }

    pub fn is_forced(&self, id: &str) -> bool {
        self.forced.iter().any(|n| n == id)
    }

    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    pub fn node_count(&self) -> usize {
        self.layers.iter().map(|l| l.len()).sum()
    }

    /// Map from node id to layer index
    pub fn ranks(&self) -> IndexMap<&str, usize> {
        self.layers
            .iter()
            .enumerate()
            .flat_map(|(rank, layer)| layer.iter().map(move |id| (id.as_str(), rank)))
            .collect()
    }
}

/// Assign the nodes of a graph to layers.
///
/// Inverted edge kinds (extends, implements) are reversed before layering so
/// parents land above children. Self-loops are ignored.
pub fn assign_layers(graph: &DiagramGraph) -> LayerAssignment {
    let adjacency = graph.adjacency();
    let order: Vec<&str> = graph.node_ids().collect();
    assign_layers_with(&order, &adjacency)
}

/// Layer assignment over an explicit node order and adjacency
pub fn assign_layers_with(order: &[&str], adjacency: &Adjacency) -> LayerAssignment {
    let layering_span = span!(Level::DEBUG, "assign_layers", nodes = order.len());
    let _enter = layering_span.enter();

    let mut result = LayerAssignment::default();
    let mut assigned: IndexSet<&str> = IndexSet::new();
    let mut remaining: Vec<&str> = order.to_vec();

    // Each round assigns at least one node, so |V| rounds suffice
    while !remaining.is_empty() {
        let ready: Vec<&str> = remaining
            .iter()
            .copied()
            .filter(|&id| {
                adjacency
                    .predecessors(id)
                    .iter()
                    .all(|p| p == id || assigned.contains(p.as_str()))
            })
            .collect();

        if ready.is_empty() {
            warn!(
                layer = result.layers.len(),
                count = remaining.len(),
                "Cycle detected, forcing remaining nodes into layer"
            );
            result.forced.extend(remaining.iter().map(|s| s.to_string()));
            result
                .layers
                .push(remaining.iter().map(|s| s.to_string()).collect());
            break;
        }

        trace!(layer = result.layers.len(), nodes = ?ready, "Layer assigned");
        assigned.extend(ready.iter().copied());
        remaining.retain(|id| !ready.contains(id));
        result
            .layers
            .push(ready.iter().map(|s| s.to_string()).collect());
    }

    debug!(
        layers = result.layers.len(),
        forced = result.forced.len(),
        "Layer assignment completed"
    );
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{EdgeKind, GraphEdge, GraphNode};

    fn graph(nodes: &[&str], edges: &[(&str, &str, EdgeKind)]) -> DiagramGraph {
        DiagramGraph::from_parts(
            nodes.iter().map(|id| GraphNode::new(*id, 40, 20)),
            edges
                .iter()
                .map(|(from, to, kind)| GraphEdge::new(*from, *to, *kind)),
        )
    }

    #[test]
    fn test_two_node_chain() {
        let g = graph(&["A", "B"], &[("A", "B", EdgeKind::Dependency)]);
        let result = assign_layers(&g);
        assert_eq!(result.layers, vec![vec!["A"], vec!["B"]]);
        assert!(result.forced.is_empty());
    }

    #[test]
    fn test_independent_nodes_share_first_layer() {
        let g = graph(&["A", "B", "C"], &[]);
        let result = assign_layers(&g);
        assert_eq!(result.layers, vec![vec!["A", "B", "C"]]);
    }

    #[test]
    fn test_diamond_layers() {
        let g = graph(
            &["A", "B", "C", "D"],
            &[
                ("A", "B", EdgeKind::Directed),
                ("A", "C", EdgeKind::Directed),
                ("B", "D", EdgeKind::Directed),
                ("C", "D", EdgeKind::Directed),
            ],
        );
        let result = assign_layers(&g);
        assert_eq!(result.layers, vec![vec!["A"], vec!["B", "C"], vec!["D"]]);
    }

    #[test]
    fn test_long_edge_waits_for_all_predecessors() {
        let g = graph(
            &["A", "B", "C"],
            &[
                ("A", "B", EdgeKind::Directed),
                ("B", "C", EdgeKind::Directed),
                ("A", "C", EdgeKind::Directed),
            ],
        );
        let result = assign_layers(&g);
        assert_eq!(result.layer_of("C"), Some(2));
    }

    #[test]
    fn test_extends_puts_parent_first() {
        // Child listed first; the inverted edge still puts Parent on top
        let g = graph(
            &["Child", "Parent"],
            &[("Child", "Parent", EdgeKind::Extends)],
        );
        let result = assign_layers(&g);
        assert_eq!(result.layers, vec![vec!["Parent"], vec!["Child"]]);
    }

    #[test]
    fn test_two_node_cycle_terminates() {
        let g = graph(
            &["A", "B"],
            &[("A", "B", EdgeKind::Directed), ("B", "A", EdgeKind::Directed)],
        );
        let result = assign_layers(&g);
        assert_eq!(result.node_count(), 2);
        assert!(result.is_forced("A"));
        assert!(result.is_forced("B"));
        assert_eq!(result.layer_of("A"), result.layer_of("B"));
    }

    #[test]
    fn test_cycle_below_acyclic_prefix() {
        let g = graph(
            &["R", "A", "B"],
            &[
                ("R", "A", EdgeKind::Directed),
                ("A", "B", EdgeKind::Directed),
                ("B", "A", EdgeKind::Directed),
            ],
        );
        let result = assign_layers(&g);
        assert_eq!(result.layers[0], vec!["R"]);
        assert_eq!(result.layers[1], vec!["A", "B"]);
        assert!(!result.is_forced("R"));
        assert_eq!(result.forced, vec!["A", "B"]);
    }

    #[test]
    fn test_self_loop_ignored() {
        let g = graph(
            &["A", "B"],
            &[("A", "A", EdgeKind::Directed), ("A", "B", EdgeKind::Directed)],
        );
        let result = assign_layers(&g);
        assert_eq!(result.layers, vec![vec!["A"], vec!["B"]]);
        assert!(result.forced.is_empty());
    }

    #[test]
    fn test_empty_graph() {
        let result = assign_layers(&DiagramGraph::new());
        assert!(result.layers.is_empty());
        assert_eq!(result.layer_of("A"), None);
    }

    #[test]
    fn test_ranks_map() {
        let g = graph(&["A", "B"], &[("A", "B", EdgeKind::Directed)]);
        let result = assign_layers(&g);
        let ranks = result.ranks();
        assert_eq!(ranks.get("A"), Some(&0));
        assert_eq!(ranks.get("B"), Some(&1));
    }
}
