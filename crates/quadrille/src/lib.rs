//! Quadrille - layout and routing engine for structured diagrams
//!
//! Turns class, state, flow and sequence diagram models into positioned
//! boxes, orthogonal edge paths and vector drawing primitives.
//!
//! Two layout paths exist side by side:
//!
//! - the **layered** path assigns layers, reduces crossings with barycenter
//!   sweeps, spreads connection points and routes edges around obstacles;
//! - the **pattern** path recognises a known structure (an inheritance tree,
//!   an if/else, a request/response exchange, ...) and places it with a
//!   hand-tuned template from the [`PatternRegistry`].
//!
//! # Quick Start
//!
//! ```rust
//! use quadrille::prelude::*;
//!
//! let diagram: Diagram = ClassDiagram::new()
//!     .with_class(ClassNode::new("Animal"))
//!     .with_class(ClassNode::new("Dog"))
//!     .with_relation(Relation::new("Dog", "Animal", RelationKind::Extends))
//!     .into();
//!
//! let mut canvas = DrawList::new();
//! let layout = Orchestrator::new().render(&diagram, &mut canvas).unwrap();
//! assert!(layout.node_rect("Dog").is_some());
//! assert!(canvas.texts().any(|t| t == "Animal"));
//! ```
//!
//! # JSON
//!
//! ```rust
//! let json = r#"{
//!     "kind": "flow",
//!     "nodes": [{"id": "a", "label": "Start", "shape": "start"}, {"id": "b", "label": "Work"}],
//!     "edges": [{"from": "a", "to": "b"}]
//! }"#;
//! let layout = quadrille::layout_json(json).unwrap();
//! assert!(layout.width() > 0);
//! ```

pub mod core;
pub mod layout;
pub mod patterns;
pub mod plugins;

pub use core::*;
pub use plugins::{Diagram, DiagramLayout, Orchestrator};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::core::{
        Canvas, DiagramError, DiagramKind, DrawList, LayoutConfig, LayoutStrategy, OrderingConfig,
        PatternConfig, Point, Primitive, Rect, RoutingConfig, Size,
    };
    pub use crate::layout::{LayeredLayoutAlgorithm, LayoutAlgorithm, RouteStrategy, Router};
    pub use crate::patterns::{PatternDetector, PatternLayout, PatternMatch, PatternRegistry};
    pub use crate::plugins::{
        ClassDiagram, ClassNode, Diagram, DiagramLayout, DiagramRenderer, FlowDiagram, FlowEdge,
        FlowNode, FlowShape, Orchestrator, Participant, Relation, RelationKind, SequenceDiagram,
        SequenceEvent, StateDiagram, StateKind, StateNode, Transition, Trigger,
    };
}

/// Lay out a diagram with the given configuration and the built-in templates
///
/// # Example
/// ```rust
/// use quadrille::prelude::*;
///
/// let diagram: Diagram = StateDiagram::new()
///     .with_state(StateNode::simple("Idle"))
///     .with_state(StateNode::simple("Busy"))
///     .with_transition(Transition::new("Idle", "Busy").on("start"))
///     .into();
/// let layout = quadrille::layout_diagram(&diagram, LayoutConfig::default()).unwrap();
/// assert_eq!(layout.template(), Some("Linear Chain"));
/// ```
pub fn layout_diagram(diagram: &Diagram, config: LayoutConfig) -> anyhow::Result<DiagramLayout> {
    let orchestrator = Orchestrator::with_config(config);
    Ok(orchestrator.layout(diagram)?)
}

/// Lay out and draw a diagram, returning the layout and the recorded primitives
pub fn render_diagram(diagram: &Diagram, config: LayoutConfig) -> anyhow::Result<(DiagramLayout, DrawList)> {
    let orchestrator = Orchestrator::with_config(config);
    let mut canvas = DrawList::new();
    let layout = orchestrator.render(diagram, &mut canvas)?;
    Ok((layout, canvas))
}

/// Parse a JSON diagram model and lay it out with default settings
pub fn layout_json(input: &str) -> anyhow::Result<DiagramLayout> {
    let diagram: Diagram = serde_json::from_str(input)?;
    layout_diagram(&diagram, LayoutConfig::default())
}
