//! End-to-end checks of the reference scenarios
//!
//! Each test drives the public API the way a caller would: build a graph or
//! model, run one stage, inspect the result.

use indexmap::IndexMap;
use quadrille::core::{path_intersects_any, path_is_orthogonal, DiagramGraph, EdgeKind, GraphEdge, GraphNode, Point, Rect, Size};
use quadrille::layout::{assign_layers, RouteStrategy, Router};
use quadrille::patterns::{apply, PatternDetector, PatternMatch, PatternRegistry, DIAMOND_INHERITANCE};
use quadrille::plugins::{ClassDiagram, ClassNode, ClassPatternDetector, FlowDiagram, FlowEdge, FlowNode, FlowPatternDetector, FlowShape, Relation, RelationKind};

fn graph(nodes: &[&str], edges: &[(&str, &str)]) -> DiagramGraph {
    DiagramGraph::from_parts(
        nodes.iter().map(|id| GraphNode::new(*id, 100, 40)),
        edges
            .iter()
            .map(|(from, to)| GraphEdge::new(*from, *to, EdgeKind::Dependency)),
    )
}

// === Layering and routing ===

#[test]
fn test_two_nodes_one_edge() {
    let g = graph(&["A", "B"], &[("A", "B")]);
    let layers = assign_layers(&g);
    assert_eq!(layers.layers, vec![vec!["A".to_string()], vec!["B".to_string()]]);
    assert!(layers.forced.is_empty());

    let route = Router::default().route(Point::new(50, 40), Point::new(50, 120), &[]);
    assert_eq!(route.strategy, RouteStrategy::Direct);
    assert_eq!(route.points.len(), 2);
}

#[test]
fn test_route_around_obstacle_on_straight_line() {
    let obstacle = Rect::new(80, 180, 40, 40);
    let router = Router::default();

    let straight = [Point::new(100, 100), Point::new(100, 300)];
    assert!(!router.is_clear(&straight, &[obstacle]));

    let route = router.route(Point::new(100, 100), Point::new(100, 300), &[obstacle]);
    assert_eq!(route.strategy, RouteStrategy::ZShape);
    assert_eq!(route.points.len(), 4);
    assert!(path_is_orthogonal(&route.points));
    assert!(!path_intersects_any(&route.points, &[obstacle], router.margin()));
}

#[test]
fn test_two_node_cycle_is_forced() {
    let g = graph(&["A", "B"], &[("A", "B"), ("B", "A")]);
    let layers = assign_layers(&g);
    assert_eq!(layers.node_count(), 2);
    assert!(layers.is_forced("A") || layers.is_forced("B"));
    assert!(layers.layer_of("A").is_some());
    assert!(layers.layer_of("B").is_some());
}

// === Pattern detection ===

#[test]
fn test_inheritance_tree_scores_share_of_nodes() {
    let diagram = ClassDiagram::new()
        .with_class(ClassNode::new("P"))
        .with_class(ClassNode::new("C1"))
        .with_class(ClassNode::new("C2"))
        .with_class(ClassNode::new("C3"))
        .with_relation(Relation::new("C1", "P", RelationKind::Extends))
        .with_relation(Relation::new("C2", "P", RelationKind::Extends))
        .with_relation(Relation::new("C3", "P", RelationKind::Extends));

    let matches = ClassPatternDetector::new().detect(&diagram);
    let tree = matches
        .iter()
        .find(|m| m.template == "Inheritance Tree")
        .expect("inheritance tree detected");
    assert_eq!(tree.role("parent"), Some("P"));
    assert_eq!(tree.role("child_0"), Some("C1"));
    assert_eq!(tree.role("child_1"), Some("C2"));
    assert_eq!(tree.role("child_2"), Some("C3"));
    assert_eq!(tree.score, 0.75);
}

#[test]
fn test_if_else_roles() {
    let diagram = FlowDiagram::new()
        .with_node(FlowNode::new("D", "ready?", FlowShape::Decision))
        .with_node(FlowNode::new("T", "go", FlowShape::Process))
        .with_node(FlowNode::new("F", "wait", FlowShape::Process))
        .with_node(FlowNode::new("M", "done", FlowShape::Process))
        .with_edge(FlowEdge::new("D", "T").with_label("yes"))
        .with_edge(FlowEdge::new("D", "F").with_label("no"))
        .with_edge(FlowEdge::new("T", "M"))
        .with_edge(FlowEdge::new("F", "M"));

    let matches = FlowPatternDetector::new().detect(&diagram);
    let branch = matches
        .iter()
        .find(|m| m.template == "If Else")
        .expect("if/else detected");
    assert_eq!(branch.role("decision"), Some("D"));
    assert_eq!(branch.role("true_process"), Some("T"));
    assert_eq!(branch.role("false_process"), Some("F"));
    assert_eq!(branch.role("merge"), Some("M"));
    assert_eq!(branch.score, 1.0);
}

// === Pattern application ===

#[test]
fn test_diamond_template_places_boxes_around_slot_centres() {
    let registry = PatternRegistry::with_builtin();
    let template = registry.get(DIAMOND_INHERITANCE).expect("built-in template");
    let pattern = PatternMatch::new(DIAMOND_INHERITANCE)
        .with_role("top", "Base")
        .with_role("left", "Left")
        .with_role("right", "Right")
        .with_role("bottom", "Leaf")
        .with_score(1.0);
    let sizes: IndexMap<String, Size> = ["Base", "Left", "Right", "Leaf"]
        .iter()
        .map(|id| (id.to_string(), Size::new(100, 40)))
        .collect();

    let applied = apply(&pattern, template, &sizes);
    assert_eq!((applied.width, applied.height), (400, 400));

    let top = applied.node("Base").expect("top placed").rect();
    assert_eq!(top.center(), Point::new(200, 48));
    assert_eq!(top, Rect::new(150, 28, 100, 40));

    let left = applied.node("Left").expect("left placed").rect();
    assert_eq!(left.center(), Point::new(88, 180));
    assert_eq!(left.size(), Size::new(100, 40));
}
