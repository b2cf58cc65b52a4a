//! Diagram kind plugins
//!
//! Each plugin owns a diagram model, its structural pattern detectors and a
//! renderer that turns the model into a [`DiagramLayout`] plus drawing
//! primitives. Class, state and flow diagrams share the graph path below;
//! sequence diagrams lay out participants and messages on their own.

pub mod class;
pub mod flowchart;
pub mod orchestrator;
pub mod sequence;
pub mod state;

pub use class::*;
pub use flowchart::*;
pub use orchestrator::*;
pub use sequence::*;
pub use state::*;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::core::{
    path_label_anchor, Canvas, DiagramError, DiagramGraph, DiagramKind, LayoutConfig,
    LayoutStrategy, Point, Rect, Size, TextAnchor, TextMeasurer,
};
use crate::layout::{
    anchor_point, attachment_sides, HeuristicLayout, LayeredLayoutAlgorithm, LayoutAlgorithm, Route,
    Router,
};
use crate::patterns::{apply, select_best, AppliedLayout, EdgeLayout, PatternMatch, PatternRegistry};

/// Positioned result of a render call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "layout", rename_all = "snake_case")]
pub enum DiagramLayout {
    Layered(HeuristicLayout),
    Pattern(AppliedLayout),
    Sequence(SequenceLayout),
}

impl DiagramLayout {
    pub fn width(&self) -> i32 {
        match self {
            DiagramLayout::Layered(l) => l.width,
            DiagramLayout::Pattern(l) => l.width,
            DiagramLayout::Sequence(l) => l.width,
        }
    }

    pub fn height(&self) -> i32 {
        match self {
            DiagramLayout::Layered(l) => l.height,
            DiagramLayout::Pattern(l) => l.height,
            DiagramLayout::Sequence(l) => l.height,
        }
    }

    /// Name of the template used, if any
    pub fn template(&self) -> Option<&str> {
        match self {
            DiagramLayout::Layered(_) => None,
            DiagramLayout::Pattern(l) => Some(&l.template),
            DiagramLayout::Sequence(l) => l.template.as_deref(),
        }
    }

    pub fn is_pattern(&self) -> bool {
        self.template().is_some()
    }

    /// Box of a placed node (participant head for sequence diagrams)
    pub fn node_rect(&self, id: &str) -> Option<Rect> {
        match self {
            DiagramLayout::Layered(l) => l.node(id).map(|n| n.rect()),
            DiagramLayout::Pattern(l) => l.node(id).map(|n| n.rect()),
            DiagramLayout::Sequence(l) => l.participant(id).map(|p| p.head.rect()),
        }
    }
}

/// A renderer for one diagram kind
pub trait DiagramRenderer: Send + Sync {
    /// Diagram model this renderer understands
    type Model;

    /// Position the model without drawing it
    fn layout(&self, model: &Self::Model, registry: &PatternRegistry) -> Result<DiagramLayout, DiagramError>;

    /// Position the model and issue its primitives to `canvas`
    fn render(
        &self,
        model: &Self::Model,
        registry: &PatternRegistry,
        canvas: &mut dyn Canvas,
    ) -> Result<DiagramLayout, DiagramError>;

    fn kind(&self) -> DiagramKind;

    /// Get the name of this renderer
    fn name(&self) -> &'static str;

    /// Get the version of this renderer
    fn version(&self) -> &'static str;
}

/// Route of one graph edge in a finished layout
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdgePath {
    /// Index of the edge in the graph's edge list
    pub index: usize,
    pub from: String,
    pub to: String,
    pub points: Vec<Point>,
    pub label_at: Point,
}

/// Pick the match the configured strategy wants, if any.
///
/// `Heuristic` never uses a pattern. `Auto` takes the best match when its
/// score reaches `min_score`, its template is registered and (when
/// configured) it binds every id in `ids`. `Pattern` requires a match and
/// a registered template.
pub fn choose_pattern<'a>(
    kind: DiagramKind,
    matches: Vec<PatternMatch>,
    ids: impl IntoIterator<Item = &'a str>,
    registry: &PatternRegistry,
    config: &LayoutConfig,
) -> Result<Option<PatternMatch>, DiagramError> {
    let ids: Vec<&str> = ids.into_iter().collect();
    match config.strategy {
        LayoutStrategy::Heuristic => Ok(None),
        LayoutStrategy::Pattern => {
            if ids.is_empty() {
                return Err(DiagramError::empty_diagram(kind));
            }
            let best = select_best(matches, registry)
                .ok_or_else(|| DiagramError::pattern_unavailable(kind))?;
            if registry.get(&best.template).is_none() {
                return Err(DiagramError::template_missing(best.template));
            }
            info!(template = %best.template, score = best.score, "Using required pattern");
            Ok(Some(best))
        }
        LayoutStrategy::Auto => {
            let Some(best) = select_best(matches, registry) else {
                debug!("No pattern matched, using layered layout");
                return Ok(None);
            };
            if registry.get(&best.template).is_none() {
                warn!(template = %best.template, "Best match names an unregistered template");
                return Ok(None);
            }
            if best.score < config.patterns.min_score {
                debug!(template = %best.template, score = best.score, "Best match scored too low");
                return Ok(None);
            }
            if config.patterns.require_full_coverage && !best.covers(ids.iter().copied()) {
                debug!(template = %best.template, "Best match leaves nodes unbound");
                return Ok(None);
            }
            info!(template = %best.template, score = best.score, "Using pattern layout");
            Ok(Some(best))
        }
    }
}

/// Lay out a graph with a chosen pattern or the layered algorithm
pub fn layout_graph(
    kind: DiagramKind,
    graph: &DiagramGraph,
    matches: Vec<PatternMatch>,
    registry: &PatternRegistry,
    config: &LayoutConfig,
) -> Result<DiagramLayout, DiagramError> {
    let chosen = choose_pattern(kind, matches, graph.node_ids(), registry, config)?;
    if let Some(pattern) = chosen {
        if let Some(template) = registry.get(&pattern.template) {
            let sizes: IndexMap<String, Size> = graph
                .nodes()
                .map(|n| (n.id.clone(), n.size()))
                .collect();
            let mut applied = apply(&pattern, template, &sizes);
            route_uncovered_edges(&mut applied, graph, &Router::new(&config.routing));
            return Ok(DiagramLayout::Pattern(applied));
        }
    }
    let algorithm = LayeredLayoutAlgorithm::with_config(config.clone());
    Ok(DiagramLayout::Layered(algorithm.layout(graph)))
}

/// Route the graph edges a template has no path for and fit the canvas.
///
/// Routes go around the other placed boxes and may leave the template
/// canvas, so the layout is shifted and grown until every point is on it.
pub fn route_uncovered_edges(applied: &mut AppliedLayout, graph: &DiagramGraph, router: &Router) {
    let mut routed = Vec::new();
    for edge in graph.edges() {
        if applied.edge_between(&edge.from, &edge.to).is_some()
            || routed.iter().any(|e: &EdgeLayout| e.from == edge.from && e.to == edge.to)
        {
            continue;
        }
        let (Some(source), Some(target)) = (
            applied.node(&edge.from).map(|n| n.rect()),
            applied.node(&edge.to).map(|n| n.rect()),
        ) else {
            continue;
        };
        let route: Route = if edge.is_self_loop() {
            router.route_self_loop(&source)
        } else {
            let obstacles: Vec<Rect> = applied
                .nodes
                .iter()
                .filter(|n| n.id != edge.from && n.id != edge.to)
                .map(|n| n.rect())
                .collect();
            let (source_side, target_side) = attachment_sides(&source, &target);
            let start = anchor_point(&source, source_side, 0);
            let end = anchor_point(&target, target_side, 0);
            router.route(start, end, &obstacles)
        };
        let anchor = route.label_anchor();
        routed.push(EdgeLayout {
            from: edge.from.clone(),
            to: edge.to.clone(),
            waypoints: route.points,
            label_x: anchor.x,
            label_y: anchor.y,
        });
    }

    if routed.is_empty() {
        return;
    }
    debug!(count = routed.len(), template = %applied.template, "Routed edges outside the template");
    applied.edges.extend(routed);
    applied.fit_contents();
}

/// Paths for every edge of `graph`, in edge order.
///
/// Layered layouts already carry routes. Pattern layouts reuse the stored
/// path between the two nodes, reversed when it runs the other way. Edges
/// with an unplaced endpoint are skipped.
pub fn edge_paths(layout: &DiagramLayout, graph: &DiagramGraph, router: &Router) -> Vec<EdgePath> {
    let mut paths = Vec::with_capacity(graph.edge_count());
    for (i, edge) in graph.edges().iter().enumerate() {
        if let DiagramLayout::Layered(layered) = layout {
            if let Some(routed) = layered
                .edges
                .get(i)
                .filter(|e| e.from == edge.from && e.to == edge.to)
            {
                paths.push(EdgePath {
                    index: i,
                    from: edge.from.clone(),
                    to: edge.to.clone(),
                    points: routed.points.clone(),
                    label_at: Point::new(routed.label_x, routed.label_y),
                });
                continue;
            }
        }

        if let DiagramLayout::Pattern(applied) = layout {
            let templated = applied
                .edges
                .iter()
                .find(|e| e.from == edge.from && e.to == edge.to)
                .map(|e| e.waypoints.clone())
                .or_else(|| {
                    applied
                        .edges
                        .iter()
                        .find(|e| e.from == edge.to && e.to == edge.from)
                        .map(|e| e.waypoints.iter().rev().copied().collect())
                });
            if let Some(points) = templated {
                let label_at = path_label_anchor(&points);
                paths.push(EdgePath {
                    index: i,
                    from: edge.from.clone(),
                    to: edge.to.clone(),
                    points,
                    label_at,
                });
                continue;
            }
        }

        let (Some(source), Some(target)) = (layout.node_rect(&edge.from), layout.node_rect(&edge.to))
        else {
            debug!(from = %edge.from, to = %edge.to, "Endpoint not placed, skipping edge");
            continue;
        };
        let route: Route = if edge.is_self_loop() {
            router.route_self_loop(&source)
        } else {
            let obstacles: Vec<Rect> = graph
                .node_ids()
                .filter(|id| *id != edge.from && *id != edge.to)
                .filter_map(|id| layout.node_rect(id))
                .collect();
            let (source_side, target_side) = attachment_sides(&source, &target);
            let start = anchor_point(&source, source_side, 0);
            let end = anchor_point(&target, target_side, 0);
            router.route(start, end, &obstacles)
        };
        let label_at = route.label_anchor();
        paths.push(EdgePath {
            index: i,
            from: edge.from.clone(),
            to: edge.to.clone(),
            points: route.points,
            label_at,
        });
    }
    paths
}

/// Box size for a block of text lines, padded and clamped to the minimum
pub fn padded_size<S: AsRef<str>>(measurer: &TextMeasurer, lines: &[S], config: &LayoutConfig) -> Size {
    let text = measurer.measure_lines(lines);
    Size::new(
        (text.width + config.char_width * 4).max(config.min_node_width),
        (text.height + config.line_height).max(config.min_node_height),
    )
}

/// Draw wrapped lines centred in `rect`
pub fn draw_centered_lines<S: AsRef<str>>(canvas: &mut dyn Canvas, rect: &Rect, lines: &[S], line_height: i32) {
    let center = rect.center();
    let block = lines.len() as i32 * line_height;
    let mut y = center.y - block / 2 + line_height * 3 / 4;
    for line in lines {
        canvas.text(Point::new(center.x, y), line.as_ref(), TextAnchor::Middle);
        y += line_height;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{EdgeKind, GraphEdge, GraphNode, PatternConfig};
    use crate::layout::NodeBox;
    use crate::patterns::INHERITANCE_TREE;

    fn tree_graph() -> DiagramGraph {
        DiagramGraph::from_parts(
            ["P", "C1", "C2"].iter().map(|id| GraphNode::new(*id, 80, 40)),
            vec![
                GraphEdge::new("C1", "P", EdgeKind::Extends),
                GraphEdge::new("C2", "P", EdgeKind::Extends),
            ],
        )
    }

    fn tree_match(score: f64) -> PatternMatch {
        PatternMatch::new(INHERITANCE_TREE)
            .with_role("parent", "P")
            .with_indexed_roles("child", &["C1", "C2"], 4)
            .with_score(score)
    }

    #[test]
    fn test_auto_uses_good_match() {
        let registry = PatternRegistry::with_builtin();
        let config = LayoutConfig::default();
        let graph = tree_graph();
        let chosen = choose_pattern(DiagramKind::Class, vec![tree_match(0.67)], graph.node_ids(), &registry, &config)
            .unwrap();
        assert_eq!(chosen.map(|m| m.template), Some(INHERITANCE_TREE.to_string()));
    }

    #[test]
    fn test_auto_rejects_low_score_and_partial_coverage() {
        let registry = PatternRegistry::with_builtin();
        let config = LayoutConfig::default();
        let graph = tree_graph();
        let low = choose_pattern(DiagramKind::Class, vec![tree_match(0.2)], graph.node_ids(), &registry, &config)
            .unwrap();
        assert!(low.is_none());

        let partial = PatternMatch::new(INHERITANCE_TREE)
            .with_role("parent", "P")
            .with_role("child_0", "C1")
            .with_score(0.9);
        let chosen = choose_pattern(DiagramKind::Class, vec![partial.clone()], graph.node_ids(), &registry, &config)
            .unwrap();
        assert!(chosen.is_none());

        let relaxed = config.with_patterns(PatternConfig {
            min_score: 0.5,
            require_full_coverage: false,
        });
        let chosen = choose_pattern(DiagramKind::Class, vec![partial], graph.node_ids(), &registry, &relaxed)
            .unwrap();
        assert!(chosen.is_some());
    }

    #[test]
    fn test_pattern_strategy_errors() {
        let registry = PatternRegistry::with_builtin();
        let config = LayoutConfig::default().with_strategy(LayoutStrategy::Pattern);
        let graph = tree_graph();

        let err = choose_pattern(DiagramKind::Class, Vec::new(), graph.node_ids(), &registry, &config)
            .unwrap_err();
        assert!(matches!(err, DiagramError::PatternUnavailable { kind: DiagramKind::Class }));

        let err = choose_pattern(DiagramKind::Flow, Vec::new(), std::iter::empty(), &registry, &config)
            .unwrap_err();
        assert!(matches!(err, DiagramError::EmptyDiagram { .. }));

        let unknown = PatternMatch::new("Spiral").with_score(1.0);
        let err = choose_pattern(DiagramKind::Class, vec![unknown], graph.node_ids(), &registry, &config)
            .unwrap_err();
        assert!(matches!(err, DiagramError::TemplateMissing { ref name } if name == "Spiral"));
    }

    #[test]
    fn test_heuristic_ignores_matches() {
        let registry = PatternRegistry::with_builtin();
        let config = LayoutConfig::default().with_strategy(LayoutStrategy::Heuristic);
        let graph = tree_graph();
        let layout = layout_graph(DiagramKind::Class, &graph, vec![tree_match(1.0)], &registry, &config).unwrap();
        assert!(matches!(layout, DiagramLayout::Layered(_)));
        assert!(!layout.is_pattern());
    }

    #[test]
    fn test_edge_paths_cover_every_edge() {
        let registry = PatternRegistry::with_builtin();
        let graph = tree_graph();
        let router = Router::default();
        for strategy in [LayoutStrategy::Heuristic, LayoutStrategy::Pattern] {
            let config = LayoutConfig::default().with_strategy(strategy);
            let layout = layout_graph(DiagramKind::Class, &graph, vec![tree_match(1.0)], &registry, &config).unwrap();
            let paths = edge_paths(&layout, &graph, &router);
            assert_eq!(paths.len(), 2);
            for (path, edge) in paths.iter().zip(graph.edges()) {
                assert_eq!(path.from, edge.from);
                assert!(path.points.len() >= 2);
            }
        }
    }

    #[test]
    fn test_detours_around_pattern_nodes_stay_on_canvas() {
        let mut applied = AppliedLayout {
            template: "Manual".to_string(),
            nodes: vec![
                NodeBox::new("A", Rect::new(0, 0, 40, 40)),
                NodeBox::new("C", Rect::new(100, 0, 40, 40)),
                NodeBox::new("B", Rect::new(200, 0, 40, 40)),
            ],
            edges: Vec::new(),
            decorators: Vec::new(),
            width: 240,
            height: 40,
        };
        let graph = DiagramGraph::from_parts(
            ["A", "B", "C"].iter().map(|id| GraphNode::new(*id, 40, 40)),
            vec![
                GraphEdge::new("A", "B", EdgeKind::Association),
                GraphEdge::new("A", "A", EdgeKind::Association),
            ],
        );
        route_uncovered_edges(&mut applied, &graph, &Router::default());

        assert_eq!(applied.edges.len(), 2);
        // C sits between A and B, so the route has to bend around it
        assert!(applied.edges[0].waypoints.len() > 2);
        for edge in &applied.edges {
            for p in &edge.waypoints {
                assert!((0..=applied.width).contains(&p.x), "{:?}", p);
                assert!((0..=applied.height).contains(&p.y), "{:?}", p);
            }
        }
        for node in &applied.nodes {
            assert!(node.x >= 0 && node.y >= 0);
            assert!(node.x + node.width <= applied.width);
            assert!(node.y + node.height <= applied.height);
        }

        let layout = DiagramLayout::Pattern(applied.clone());
        let paths = edge_paths(&layout, &graph, &Router::default());
        assert_eq!(paths[0].points, applied.edges[0].waypoints);
        assert_eq!(paths[1].points, applied.edges[1].waypoints);
    }

    #[test]
    fn test_padded_size_respects_minimum() {
        let config = LayoutConfig::default();
        let measurer = TextMeasurer::from_config(&config);
        let size = padded_size(&measurer, &["A"], &config);
        assert_eq!(size, Size::new(config.min_node_width, config.min_node_height));
        let wide = padded_size(&measurer, &["AbstractFactoryBean"], &config);
        assert_eq!(wide.width, 19 * 8 + 32);
    }
}
