//! Plugin orchestrator for the layout and render pipeline
//!
//! The orchestrator owns the configuration and the template registry and
//! hands a [`Diagram`] to the renderer of its kind:
//! Detector → Strategy → Layout → Canvas

use serde::{Deserialize, Serialize};
use tracing::{debug, info, span, Level};

use super::{
    ClassDiagram, ClassPatternDetector, ClassRenderer, DiagramLayout, DiagramRenderer, FlowDiagram,
    FlowPatternDetector, FlowRenderer, SequenceDiagram, SequencePatternDetector, SequenceRenderer,
    StateDiagram, StatePatternDetector, StateRenderer,
};
use crate::core::{Canvas, DiagramError, DiagramKind, LayoutConfig};
use crate::patterns::{PatternDetector, PatternMatch, PatternRegistry};

/// Any supported diagram model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagram {
    Class(ClassDiagram),
    State(StateDiagram),
    Flow(FlowDiagram),
    Sequence(SequenceDiagram),
}

impl Diagram {
    pub fn kind(&self) -> DiagramKind {
        match self {
            Diagram::Class(_) => DiagramKind::Class,
            Diagram::State(_) => DiagramKind::State,
            Diagram::Flow(_) => DiagramKind::Flow,
            Diagram::Sequence(_) => DiagramKind::Sequence,
        }
    }

    /// Number of laid-out elements (classes, states, nodes or participants)
    pub fn element_count(&self) -> usize {
        match self {
            Diagram::Class(d) => d.classes.len(),
            Diagram::State(d) => d.states.len(),
            Diagram::Flow(d) => d.nodes.len(),
            Diagram::Sequence(d) => d.participants.len(),
        }
    }
}

impl From<ClassDiagram> for Diagram {
    fn from(diagram: ClassDiagram) -> Self {
        Diagram::Class(diagram)
    }
}

impl From<StateDiagram> for Diagram {
    fn from(diagram: StateDiagram) -> Self {
        Diagram::State(diagram)
    }
}

impl From<FlowDiagram> for Diagram {
    fn from(diagram: FlowDiagram) -> Self {
        Diagram::Flow(diagram)
    }
}

impl From<SequenceDiagram> for Diagram {
    fn from(diagram: SequenceDiagram) -> Self {
        Diagram::Sequence(diagram)
    }
}

/// Coordinates detection, strategy choice, layout and drawing
///
/// The registry is built once and shared by every call; the orchestrator
/// holds no other state, so one instance can serve many diagrams.
pub struct Orchestrator {
    config: LayoutConfig,
    registry: PatternRegistry,
    class: ClassRenderer,
    state: StateRenderer,
    flow: FlowRenderer,
    sequence: SequenceRenderer,
}

impl Orchestrator {
    /// Default configuration and the built-in templates
    pub fn new() -> Self {
        Self::with_config(LayoutConfig::default())
    }

    pub fn with_config(config: LayoutConfig) -> Self {
        Self::with_parts(config, PatternRegistry::with_builtin())
    }

    pub fn with_parts(config: LayoutConfig, registry: PatternRegistry) -> Self {
        Self {
            class: ClassRenderer::with_config(config.clone()),
            state: StateRenderer::with_config(config.clone()),
            flow: FlowRenderer::with_config(config.clone()),
            sequence: SequenceRenderer::with_config(config.clone()),
            config,
            registry,
        }
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    pub fn registry(&self) -> &PatternRegistry {
        &self.registry
    }

    /// Names and versions of the registered renderers
    pub fn renderers(&self) -> Vec<(DiagramKind, &'static str, &'static str)> {
        vec![
            (self.class.kind(), self.class.name(), self.class.version()),
            (self.state.kind(), self.state.name(), self.state.version()),
            (self.flow.kind(), self.flow.name(), self.flow.version()),
            (self.sequence.kind(), self.sequence.name(), self.sequence.version()),
        ]
    }

    /// Every pattern match for the diagram, in detector order
    pub fn detect(&self, diagram: &Diagram) -> Vec<PatternMatch> {
        let detect_span = span!(Level::INFO, "detect_patterns", kind = %diagram.kind());
        let _enter = detect_span.enter();

        let matches = match diagram {
            Diagram::Class(d) => ClassPatternDetector::new().detect(d),
            Diagram::State(d) => StatePatternDetector::new().detect(d),
            Diagram::Flow(d) => FlowPatternDetector::new().detect(d),
            Diagram::Sequence(d) => SequencePatternDetector::new().detect(d),
        };
        debug!(match_count = matches.len(), "Pattern detection completed");
        matches
    }

    /// Lay the diagram out without drawing
    pub fn layout(&self, diagram: &Diagram) -> Result<DiagramLayout, DiagramError> {
        let layout_span = span!(
            Level::INFO,
            "orchestrate_layout",
            kind = %diagram.kind(),
            elements = diagram.element_count(),
            strategy = ?self.config.strategy
        );
        let _enter = layout_span.enter();

        let layout = match diagram {
            Diagram::Class(d) => self.class.layout(d, &self.registry),
            Diagram::State(d) => self.state.layout(d, &self.registry),
            Diagram::Flow(d) => self.flow.layout(d, &self.registry),
            Diagram::Sequence(d) => self.sequence.layout(d, &self.registry),
        }?;
        info!(
            template = layout.template().unwrap_or("layered"),
            width = layout.width(),
            height = layout.height(),
            "Layout completed"
        );
        Ok(layout)
    }

    /// Lay the diagram out and draw it onto `canvas`
    pub fn render(&self, diagram: &Diagram, canvas: &mut dyn Canvas) -> Result<DiagramLayout, DiagramError> {
        let render_span = span!(
            Level::INFO,
            "orchestrate_render",
            kind = %diagram.kind(),
            elements = diagram.element_count()
        );
        let _enter = render_span.enter();

        match diagram {
            Diagram::Class(d) => self.class.render(d, &self.registry, canvas),
            Diagram::State(d) => self.state.render(d, &self.registry, canvas),
            Diagram::Flow(d) => self.flow.render(d, &self.registry, canvas),
            Diagram::Sequence(d) => self.sequence.render(d, &self.registry, canvas),
        }
    }
}

impl Default for Orchestrator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{DrawList, LayoutStrategy};
    use crate::patterns::IF_ELSE;
    use crate::plugins::{FlowEdge, FlowNode, FlowShape, StateNode, Transition};

    fn branch() -> Diagram {
        FlowDiagram::new()
            .with_node(FlowNode::new("D", "ok?", FlowShape::Decision))
            .with_node(FlowNode::new("T", "yes path", FlowShape::Process))
            .with_node(FlowNode::new("F", "no path", FlowShape::Process))
            .with_node(FlowNode::new("M", "merge", FlowShape::Process))
            .with_edge(FlowEdge::new("D", "T").with_label("yes"))
            .with_edge(FlowEdge::new("D", "F").with_label("no"))
            .with_edge(FlowEdge::new("T", "M"))
            .with_edge(FlowEdge::new("F", "M"))
            .into()
    }

    #[test]
    fn test_orchestrator_default() {
        let orchestrator = Orchestrator::default();
        assert_eq!(orchestrator.config().strategy, LayoutStrategy::Auto);
        assert_eq!(orchestrator.registry().len(), 14);
        let names: Vec<&str> = orchestrator.renderers().iter().map(|r| r.1).collect();
        assert_eq!(names, vec!["class", "state", "flowchart", "sequence"]);
    }

    #[test]
    fn test_diagram_json_is_tagged_by_kind() {
        let json = r#"{"kind": "state", "states": [{"id": "a"}], "transitions": []}"#;
        let diagram: Diagram = serde_json::from_str(json).unwrap();
        assert_eq!(diagram.kind(), DiagramKind::State);
        assert_eq!(diagram.element_count(), 1);
    }

    #[test]
    fn test_detect_dispatches_by_kind() {
        let matches = Orchestrator::new().detect(&branch());
        assert!(matches.iter().any(|m| m.template == IF_ELSE));
    }

    #[test]
    fn test_render_uses_pattern_when_auto() {
        let mut canvas = DrawList::new();
        let layout = Orchestrator::new().render(&branch(), &mut canvas).unwrap();
        assert_eq!(layout.template(), Some(IF_ELSE));
        assert_eq!(canvas.width, layout.width());
        assert!(!canvas.is_empty());
    }

    #[test]
    fn test_heuristic_strategy_skips_patterns() {
        let config = LayoutConfig::default().with_strategy(LayoutStrategy::Heuristic);
        let layout = Orchestrator::with_config(config).layout(&branch()).unwrap();
        assert!(matches!(layout, DiagramLayout::Layered(_)));
    }

    #[test]
    fn test_pattern_strategy_errors_surface() {
        let config = LayoutConfig::default().with_strategy(LayoutStrategy::Pattern);
        let orchestrator = Orchestrator::with_config(config);

        let empty = Diagram::from(StateDiagram::new());
        assert!(matches!(
            orchestrator.layout(&empty),
            Err(DiagramError::EmptyDiagram { kind: DiagramKind::State })
        ));

        let lonely = Diagram::from(
            StateDiagram::new()
                .with_state(StateNode::simple("A"))
                .with_state(StateNode::simple("B"))
                .with_transition(Transition::new("A", "A")),
        );
        assert!(matches!(
            orchestrator.layout(&lonely),
            Err(DiagramError::PatternUnavailable { kind: DiagramKind::State })
        ));
    }

    #[test]
    fn test_missing_template_is_reported() {
        let config = LayoutConfig::default().with_strategy(LayoutStrategy::Pattern);
        let orchestrator = Orchestrator::with_parts(config, PatternRegistry::new());
        let err = orchestrator.layout(&branch()).unwrap_err();
        assert!(matches!(err, DiagramError::TemplateMissing { .. }));
    }
}
