//! Public API: JSON models in, layouts and primitives out

use quadrille::prelude::*;
use quadrille::{layout_diagram, layout_json, render_diagram};

const CLASS_JSON: &str = r#"{
    "kind": "class",
    "classes": [
        {"id": "Shape", "name": "Shape", "stereotype": "abstract", "methods": ["area()"]},
        {"id": "Circle", "name": "Circle", "attributes": ["r: f64"]},
        {"id": "Square", "name": "Square", "attributes": ["side: f64"]}
    ],
    "relations": [
        {"from": "Circle", "to": "Shape", "kind": "extends"},
        {"from": "Square", "to": "Shape", "kind": "extends"},
        {"from": "Square", "to": "Nowhere", "kind": "association"}
    ]
}"#;

const SEQUENCE_JSON: &str = r#"{
    "kind": "sequence",
    "participants": [{"id": "client"}, {"id": "server"}],
    "events": [
        {"type": "message", "from": "client", "to": "server", "label": "GET /"},
        {"type": "message", "from": "server", "to": "client", "label": "200", "style": "reply"}
    ]
}"#;

#[test]
fn test_class_json_uses_inheritance_template() {
    let layout = layout_json(CLASS_JSON).unwrap();
    assert_eq!(layout.template(), Some("Inheritance Tree"));
    let parent = layout.node_rect("Shape").unwrap();
    let child = layout.node_rect("Circle").unwrap();
    assert!(parent.bottom() < child.y);
    assert!(layout.node_rect("Nowhere").is_none());
}

#[test]
fn test_sequence_json_uses_request_response() {
    let layout = layout_json(SEQUENCE_JSON).unwrap();
    assert_eq!(layout.template(), Some("Request Response"));
    let client = layout.node_rect("client").unwrap();
    let server = layout.node_rect("server").unwrap();
    assert!(client.right() < server.x);
}

#[test]
fn test_layout_serializes_with_tag() {
    let layout = layout_json(CLASS_JSON).unwrap();
    let value = serde_json::to_value(&layout).unwrap();
    assert_eq!(value["layout"], "pattern");

    let back: DiagramLayout = serde_json::from_value(value).unwrap();
    assert_eq!(back, layout);
}

#[test]
fn test_heuristic_layout_is_non_negative() {
    let diagram: Diagram = serde_json::from_str(CLASS_JSON).unwrap();
    let config = LayoutConfig::default().with_strategy(LayoutStrategy::Heuristic);
    let (layout, canvas) = render_diagram(&diagram, config).unwrap();

    let DiagramLayout::Layered(layered) = &layout else {
        panic!("expected layered layout, got {:?}", layout.template());
    };
    for node in &layered.nodes {
        assert!(node.x >= 0 && node.y >= 0);
    }
    for edge in &layered.edges {
        assert!(edge.points.iter().all(|p| p.x >= 0 && p.y >= 0));
    }
    assert_eq!(layered.edges.len(), 2);
    assert!(canvas.texts().any(|t| t == "Circle"));
}

#[test]
fn test_primitives_serialize() {
    let diagram: Diagram = serde_json::from_str(SEQUENCE_JSON).unwrap();
    let (_, canvas) = render_diagram(&diagram, LayoutConfig::default()).unwrap();
    let json = serde_json::to_string(&canvas).unwrap();
    assert!(json.contains("\"type\":\"polyline\""));
    assert!(json.contains("GET /"));
}

#[test]
fn test_every_kind_renders() {
    let diagrams: Vec<Diagram> = vec![
        ClassDiagram::new().with_class(ClassNode::new("Solo")).into(),
        StateDiagram::new().with_state(StateNode::simple("Solo")).into(),
        FlowDiagram::new()
            .with_node(FlowNode::new("solo", "Solo", FlowShape::Process))
            .into(),
        SequenceDiagram::new().with_participant(Participant::new("Solo")).into(),
    ];
    for diagram in &diagrams {
        let (layout, canvas) = render_diagram(diagram, LayoutConfig::default()).unwrap();
        assert!(layout.width() > 0 && layout.height() > 0, "{}", diagram.kind());
        assert!(canvas.texts().any(|t| t == "Solo"), "{}", diagram.kind());
    }
}

#[test]
fn test_required_pattern_reports_kind() {
    let diagram: Diagram = ClassDiagram::new()
        .with_class(ClassNode::new("A"))
        .with_class(ClassNode::new("B"))
        .into();
    let config = LayoutConfig::default().with_strategy(LayoutStrategy::Pattern);
    let err = layout_diagram(&diagram, config).unwrap_err();
    let err = err.downcast::<DiagramError>().unwrap();
    assert!(matches!(err, DiagramError::PatternUnavailable { kind: DiagramKind::Class }));
}
