//! Layered (Sugiyama-style) layout
//!
//! Layers become rows, centred on the widest row. Edges get fanned-out
//! attachment points and are routed around every other node.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, span, Level};

use super::layering::assign_layers;
use super::ordering::reorder;
use super::ports::{PortAssigner, PortRequest};
use super::routing::{Route, RouteStrategy, Router};
use super::{LayoutAlgorithm, NodeBox};
use crate::core::{DiagramGraph, EdgeKind, LayoutConfig, Point, Rect, Side};

/// A routed edge of a layered layout
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayeredEdge {
    pub from: String,
    pub to: String,
    pub kind: EdgeKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub points: Vec<Point>,
    pub strategy: RouteStrategy,
    pub source_offset: i32,
    pub target_offset: i32,
    pub label_x: i32,
    pub label_y: i32,
}

/// Output of [`LayeredLayoutAlgorithm`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeuristicLayout {
    /// Layers top to bottom after crossing minimization
    pub layers: Vec<Vec<String>>,
    /// Nodes placed by a cycle break
    pub forced: Vec<String>,
    pub nodes: Vec<NodeBox>,
    pub edges: Vec<LayeredEdge>,
    pub width: i32,
    pub height: i32,
}

impl HeuristicLayout {
    pub fn node(&self, id: &str) -> Option<&NodeBox> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Shift everything so no coordinate is negative, then grow the canvas
    /// to cover every node and route point plus `padding`
    fn normalize(&mut self, padding: i32) {
        let xs = self
            .nodes
            .iter()
            .map(|n| n.x)
            .chain(self.edges.iter().flat_map(|e| e.points.iter().map(|p| p.x)));
        let ys = self
            .nodes
            .iter()
            .map(|n| n.y)
            .chain(self.edges.iter().flat_map(|e| e.points.iter().map(|p| p.y)));
        let (min_x, min_y) = (xs.min().unwrap_or(0), ys.min().unwrap_or(0));
        let dx = if min_x < 0 { -min_x } else { 0 };
        let dy = if min_y < 0 { -min_y } else { 0 };

        if dx != 0 || dy != 0 {
            debug!(dx, dy, "Normalizing layout origin");
            for node in &mut self.nodes {
                node.x += dx;
                node.y += dy;
            }
            for edge in &mut self.edges {
                for p in &mut edge.points {
                    *p = p.offset(dx, dy);
                }
                edge.label_x += dx;
                edge.label_y += dy;
            }
        }

        let max_x = self
            .nodes
            .iter()
            .map(|n| n.x + n.width)
            .chain(self.edges.iter().flat_map(|e| e.points.iter().map(|p| p.x)))
            .max()
            .unwrap_or(0);
        let max_y = self
            .nodes
            .iter()
            .map(|n| n.y + n.height)
            .chain(self.edges.iter().flat_map(|e| e.points.iter().map(|p| p.y)))
            .max()
            .unwrap_or(0);
        self.width = (self.width + dx).max(max_x + padding);
        self.height = (self.height + dy).max(max_y + padding);
    }
}

/// Layered layout algorithm
pub struct LayeredLayoutAlgorithm {
    config: LayoutConfig,
}

impl LayeredLayoutAlgorithm {
    pub fn new() -> Self {
        Self {
            config: LayoutConfig::default(),
        }
    }

    pub fn with_config(config: LayoutConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    /// Place layers as rows centred on the widest row
    fn place(&self, graph: &DiagramGraph, layers: &[Vec<String>]) -> (IndexMap<String, Rect>, i32, i32) {
        let node_sep = self.config.node_sep;
        let padding = self.config.padding;
        let size_of = |id: &str| graph.node(id).map(|n| (n.width, n.height)).unwrap_or((0, 0));

        let row_width = |layer: &Vec<String>| -> i32 {
            let total: i32 = layer.iter().map(|id| size_of(id.as_str()).0).sum();
            total + (layer.len() as i32 - 1).max(0) * node_sep
        };
        let widest = layers.iter().map(&row_width).max().unwrap_or(0);
        let center_x = padding + widest / 2;

        let mut placed: IndexMap<String, Rect> = IndexMap::new();
        let mut y = padding;
        for layer in layers {
            let mut x = center_x - row_width(layer) / 2;
            let mut layer_height = 0;
            for id in layer {
                let (width, height) = size_of(id.as_str());
                placed.insert(id.clone(), Rect::new(x, y, width, height));
                x += width + node_sep;
                layer_height = layer_height.max(height);
            }
            y += layer_height + self.config.rank_sep;
        }

        let height = if layers.is_empty() {
            padding * 2
        } else {
            y - self.config.rank_sep + padding
        };
        (placed, widest + padding * 2, height)
    }
}

impl Default for LayeredLayoutAlgorithm {
    fn default() -> Self {
        Self::new()
    }
}

impl LayoutAlgorithm for LayeredLayoutAlgorithm {
    type Output = HeuristicLayout;

    fn layout(&self, graph: &DiagramGraph) -> HeuristicLayout {
        let layout_span = span!(
            Level::INFO,
            "layered_layout",
            node_count = graph.node_count(),
            edge_count = graph.edge_count()
        );
        let _enter = layout_span.enter();

        if graph.is_empty() {
            debug!("Empty graph, returning empty layout");
            return HeuristicLayout {
                width: self.config.padding * 2,
                height: self.config.padding * 2,
                ..HeuristicLayout::default()
            };
        }

        let assignment = assign_layers(graph);
        let adjacency = graph.adjacency();
        let layers = reorder(assignment.layers, &adjacency, &self.config.ordering);

        let position_span = span!(Level::DEBUG, "calculate_positions");
        let _position_enter = position_span.enter();
        let (boxes, width, height) = self.place(graph, &layers);
        debug!(width, height, "Node positioning completed");
        drop(_position_enter);

        let edge_span = span!(Level::DEBUG, "route_edges", edge_count = graph.edge_count());
        let _edge_enter = edge_span.enter();

        let requests: Vec<PortRequest> = graph
            .edges()
            .iter()
            .map(|e| {
                let request = PortRequest::new(e.from.clone(), e.to.clone());
                if e.kind.is_inverted() {
                    request.with_sides(Side::Top, Side::Bottom)
                } else {
                    request
                }
            })
            .collect();
        let ports = PortAssigner::new(&self.config.routing).assign(&boxes, &requests);
        let router = Router::new(&self.config.routing);

        let mut edges = Vec::with_capacity(graph.edge_count());
        for (edge, port) in graph.edges().iter().zip(ports) {
            let (Some(source), Some(target), Some(port)) =
                (boxes.get(&edge.from), boxes.get(&edge.to), port)
            else {
                continue;
            };

            let obstacles: Vec<Rect> = boxes
                .iter()
                .filter(|(id, _)| **id != edge.from && **id != edge.to)
                .map(|(_, r)| *r)
                .collect();

            let route: Route = if edge.is_self_loop() {
                router.route_self_loop(source)
            } else if edge.kind.is_inverted() {
                router.route_vertical_first(
                    source,
                    target,
                    port.source_offset,
                    port.target_offset,
                    &obstacles,
                )
            } else {
                router.route(port.start, port.end, &obstacles)
            };

            let anchor = route.label_anchor();
            edges.push(LayeredEdge {
                from: edge.from.clone(),
                to: edge.to.clone(),
                kind: edge.kind,
                label: edge.label.clone(),
                points: route.points,
                strategy: route.strategy,
                source_offset: port.source_offset,
                target_offset: port.target_offset,
                label_x: anchor.x,
                label_y: anchor.y,
            });
        }

        let fallbacks = edges
            .iter()
            .filter(|e| e.strategy == RouteStrategy::Fallback)
            .count();
        debug!(routed = edges.len(), fallbacks, "Edge routing completed");
        drop(_edge_enter);

        let mut result = HeuristicLayout {
            layers,
            forced: assignment.forced,
            nodes: boxes
                .iter()
                .map(|(id, rect)| NodeBox::new(id.clone(), *rect))
                .collect(),
            edges,
            width,
            height,
        };
        result.normalize(self.config.padding);

        info!(
            layers = result.layers.len(),
            width = result.width,
            height = result.height,
            "Layered layout completed"
        );
        result
    }

    fn name(&self) -> &'static str {
        "layered"
    }

    fn version(&self) -> &'static str {
        "0.1.0"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{path_intersects_any, path_is_orthogonal, GraphEdge, GraphNode};

    fn graph(nodes: &[(&str, i32, i32)], edges: &[(&str, &str, EdgeKind)]) -> DiagramGraph {
        DiagramGraph::from_parts(
            nodes.iter().map(|(id, w, h)| GraphNode::new(*id, *w, *h)),
            edges
                .iter()
                .map(|(from, to, kind)| GraphEdge::new(*from, *to, *kind)),
        )
    }

    #[test]
    fn test_layout_algorithm_metadata() {
        let layout = LayeredLayoutAlgorithm::new();
        assert_eq!(layout.name(), "layered");
        assert_eq!(layout.version(), "0.1.0");
    }

    #[test]
    fn test_two_node_dependency() {
        let g = graph(
            &[("A", 80, 40), ("B", 80, 40)],
            &[("A", "B", EdgeKind::Dependency)],
        );
        let layout = LayeredLayoutAlgorithm::new().layout(&g);

        assert_eq!(layout.layers, vec![vec!["A"], vec!["B"]]);
        assert_eq!(layout.edges.len(), 1);
        let edge = &layout.edges[0];
        assert_eq!(edge.strategy, RouteStrategy::Direct);
        assert_eq!(edge.points.len(), 2);
        let a = layout.node("A").unwrap();
        let b = layout.node("B").unwrap();
        assert_eq!(edge.points[0], Point::new(a.center().x, a.y + a.height));
        assert_eq!(edge.points[1], Point::new(b.center().x, b.y));
    }

    #[test]
    fn test_rows_are_centered() {
        let g = graph(
            &[("P", 100, 40), ("L", 60, 40), ("R", 60, 40)],
            &[("P", "L", EdgeKind::Directed), ("P", "R", EdgeKind::Directed)],
        );
        let layout = LayeredLayoutAlgorithm::new().layout(&g);
        let p = layout.node("P").unwrap();
        let l = layout.node("L").unwrap();
        let r = layout.node("R").unwrap();
        let row_center = (l.x + r.x + r.width) / 2;
        assert_eq!(p.center().x, row_center);
        assert!(l.y > p.y + p.height);
    }

    #[test]
    fn test_inheritance_routes_child_top_to_parent_bottom() {
        let g = graph(
            &[("Base", 80, 40), ("Left", 80, 40), ("Right", 80, 40)],
            &[
                ("Left", "Base", EdgeKind::Extends),
                ("Right", "Base", EdgeKind::Extends),
            ],
        );
        let layout = LayeredLayoutAlgorithm::new().layout(&g);
        assert_eq!(layout.layers[0], vec!["Base"]);

        let base = layout.node("Base").unwrap();
        for edge in &layout.edges {
            let child = layout.node(&edge.from).unwrap();
            assert_eq!(edge.points.first().unwrap().y, child.y);
            assert_eq!(edge.points.last().unwrap().y, base.y + base.height);
        }
        // Two children share the parent's bottom side and fan out
        assert_ne!(layout.edges[0].target_offset, layout.edges[1].target_offset);
    }

    #[test]
    fn test_routes_avoid_other_nodes() {
        let g = graph(
            &[
                ("A", 60, 30),
                ("B", 60, 30),
                ("C", 60, 30),
                ("D", 60, 30),
                ("E", 60, 30),
            ],
            &[
                ("A", "B", EdgeKind::Directed),
                ("B", "C", EdgeKind::Directed),
                ("A", "C", EdgeKind::Directed),
                ("A", "D", EdgeKind::Directed),
                ("D", "E", EdgeKind::Directed),
                ("C", "E", EdgeKind::Directed),
            ],
        );
        let layout = LayeredLayoutAlgorithm::new().layout(&g);
        for edge in &layout.edges {
            assert!(path_is_orthogonal(&edge.points));
            if edge.strategy != RouteStrategy::Fallback {
                let obstacles: Vec<Rect> = layout
                    .nodes
                    .iter()
                    .filter(|n| n.id != edge.from && n.id != edge.to)
                    .map(|n| n.rect())
                    .collect();
                assert!(!path_intersects_any(&edge.points, &obstacles, 5));
            }
        }
    }

    #[test]
    fn test_coordinates_are_non_negative() {
        let g = graph(
            &[("A", 60, 30), ("B", 200, 30), ("C", 60, 30)],
            &[
                ("A", "B", EdgeKind::Directed),
                ("B", "C", EdgeKind::Directed),
                ("C", "A", EdgeKind::Directed),
                ("A", "A", EdgeKind::Directed),
            ],
        );
        let layout = LayeredLayoutAlgorithm::new().layout(&g);
        for node in &layout.nodes {
            assert!(node.x >= 0 && node.y >= 0);
            assert!(node.x + node.width <= layout.width);
            assert!(node.y + node.height <= layout.height);
        }
        for edge in &layout.edges {
            for p in &edge.points {
                assert!(p.x >= 0 && p.y >= 0);
                assert!(p.x <= layout.width && p.y <= layout.height);
            }
        }
    }

    #[test]
    fn test_self_loop_edge() {
        let g = graph(&[("A", 60, 30)], &[("A", "A", EdgeKind::Directed)]);
        let layout = LayeredLayoutAlgorithm::new().layout(&g);
        assert_eq!(layout.edges.len(), 1);
        assert_eq!(layout.edges[0].strategy, RouteStrategy::SelfLoop);
    }

    #[test]
    fn test_empty_graph() {
        let layout = LayeredLayoutAlgorithm::new().layout(&DiagramGraph::new());
        assert!(layout.nodes.is_empty());
        assert!(layout.edges.is_empty());
        assert_eq!(layout.width, 40);
    }

    #[test]
    fn test_forced_nodes_are_reported() {
        let g = graph(
            &[("A", 60, 30), ("B", 60, 30)],
            &[("A", "B", EdgeKind::Directed), ("B", "A", EdgeKind::Directed)],
        );
        let layout = LayeredLayoutAlgorithm::new().layout(&g);
        assert_eq!(layout.forced.len(), 2);
        assert_eq!(layout.nodes.len(), 2);
    }
}
