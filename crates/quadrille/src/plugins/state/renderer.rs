//! State diagram renderer
//!
//! Leaf states are laid out as graph nodes. Composite states that contain
//! other states are drawn afterwards as frames around their descendants.

use indexmap::IndexMap;
use tracing::{debug, info, span, trace, Level};

use super::model::{StateDiagram, StateKind, StateNode, Transition};
use super::patterns::StatePatternDetector;
use crate::core::{
    bounding_box, ArrowHead, Canvas, DiagramError, DiagramGraph, DiagramKind, GraphEdge,
    GraphNode, LayoutConfig, LineStyle, Point, Rect, ShapeStyle, Size, Stroke, TextAnchor,
    TextMeasurer,
};
use crate::layout::Router;
use crate::patterns::{PatternDetector, PatternRegistry};
use crate::plugins::{
    draw_centered_lines, edge_paths, layout_graph, padded_size, DiagramLayout, DiagramRenderer,
};

const INK: &str = "black";

/// Measured box of a laid-out state
pub fn state_size(state: &StateNode, measurer: &TextMeasurer, config: &LayoutConfig) -> Size {
    match state.kind {
        StateKind::Initial => Size::new(20, 20),
        StateKind::Final => Size::new(24, 24),
        StateKind::Choice => Size::new(32, 32),
        StateKind::Fork | StateKind::Join => Size::new(config.min_node_width, 8),
        StateKind::Simple | StateKind::Composite => padded_size(measurer, &measurer.wrap(state.text()), config),
    }
}

/// State diagram renderer
pub struct StateRenderer {
    config: LayoutConfig,
    detector: StatePatternDetector,
}

impl StateRenderer {
    pub fn new() -> Self {
        Self::with_config(LayoutConfig::default())
    }

    pub fn with_config(config: LayoutConfig) -> Self {
        Self {
            config,
            detector: StatePatternDetector::new(),
        }
    }

    /// Layout graph of the leaf states; returns the transitions that became
    /// edges, in edge order
    pub fn build_graph<'a>(&self, diagram: &'a StateDiagram) -> (DiagramGraph, Vec<&'a Transition>) {
        let measurer = TextMeasurer::from_config(&self.config);
        let mut graph = DiagramGraph::new();
        for state in diagram.states.iter().filter(|s| !diagram.is_container(&s.id)) {
            let size = state_size(state, &measurer, &self.config);
            graph.add_node(GraphNode::new(state.id.clone(), size.width, size.height));
        }

        let mut accepted = Vec::new();
        for transition in &diagram.transitions {
            let from = diagram.layout_id(&transition.from);
            let to = diagram.layout_id(&transition.to);
            let mut edge = GraphEdge::new(from, to, Default::default());
            if let Some(label) = transition.label() {
                edge = edge.with_label(label);
            }
            if graph.add_edge(edge) {
                accepted.push(transition);
            }
        }
        (graph, accepted)
    }

    /// Frames of every container, innermost first
    pub fn container_frames(&self, diagram: &StateDiagram, layout: &DiagramLayout) -> IndexMap<String, Rect> {
        let mut frames: IndexMap<String, Rect> = IndexMap::new();
        let margin = self.config.padding / 2;
        let title = self.config.line_height;

        // Each pass frames containers whose children are all resolved
        for _ in 0..diagram.states.len() {
            let mut progressed = false;
            for state in &diagram.states {
                if frames.contains_key(&state.id) || !diagram.is_container(&state.id) {
                    continue;
                }
                let children: Vec<&StateNode> = diagram.children_of(&state.id).collect();
                let pending = children
                    .iter()
                    .any(|c| diagram.is_container(&c.id) && !frames.contains_key(&c.id));
                if pending {
                    continue;
                }
                let rects: Vec<Rect> = children
                    .iter()
                    .filter_map(|c| frames.get(&c.id).copied().or_else(|| layout.node_rect(&c.id)))
                    .collect();
                if let Some(inner) = bounding_box(&rects) {
                    let frame = inner.expand(margin);
                    let (x, y) = (frame.x.max(0), (frame.y - title).max(0));
                    frames.insert(
                        state.id.clone(),
                        Rect::new(x, y, frame.right() - x, frame.bottom() - y),
                    );
                    progressed = true;
                }
            }
            if !progressed {
                break;
            }
        }
        trace!(frames = frames.len(), "Container frames resolved");
        frames
    }

    fn draw_state(&self, canvas: &mut dyn Canvas, state: &StateNode, rect: Rect, measurer: &TextMeasurer) {
        match state.kind {
            StateKind::Initial => canvas.ellipse(rect, ShapeStyle::filled(INK)),
            StateKind::Final => {
                canvas.ellipse(rect, ShapeStyle::default());
                canvas.ellipse(rect.expand(-4), ShapeStyle::filled(INK));
            }
            StateKind::Choice => canvas.diamond(rect, ShapeStyle::default()),
            StateKind::Fork | StateKind::Join => canvas.rect(rect, ShapeStyle::filled(INK)),
            StateKind::Simple | StateKind::Composite => {
                canvas.rounded_rect(rect, 8, ShapeStyle::default());
                draw_centered_lines(canvas, &rect, &measurer.wrap(state.text()), measurer.line_height());
            }
        }
    }

    /// Detect patterns and place the already built layout graph
    fn layout_graph_of(
        &self,
        diagram: &StateDiagram,
        graph: &DiagramGraph,
        registry: &PatternRegistry,
    ) -> Result<DiagramLayout, DiagramError> {
        let layout_span = span!(
            Level::INFO,
            "layout_state_diagram",
            state_count = diagram.states.len(),
            transition_count = diagram.transitions.len()
        );
        let _enter = layout_span.enter();

        let matches = self.detector.detect(diagram);
        debug!(match_count = matches.len(), "State pattern detection completed");
        layout_graph(DiagramKind::State, graph, matches, registry, &self.config)
    }
}

impl Default for StateRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl DiagramRenderer for StateRenderer {
    type Model = StateDiagram;

    fn layout(&self, diagram: &StateDiagram, registry: &PatternRegistry) -> Result<DiagramLayout, DiagramError> {
        let (graph, _) = self.build_graph(diagram);
        self.layout_graph_of(diagram, &graph, registry)
    }

    fn render(
        &self,
        diagram: &StateDiagram,
        registry: &PatternRegistry,
        canvas: &mut dyn Canvas,
    ) -> Result<DiagramLayout, DiagramError> {
        let render_span = span!(Level::INFO, "render_state_diagram");
        let _enter = render_span.enter();

        let (graph, transitions) = self.build_graph(diagram);
        let layout = self.layout_graph_of(diagram, &graph, registry)?;
        let measurer = TextMeasurer::from_config(&self.config);
        let frames = self.container_frames(diagram, &layout);

        // Frames may reach past the layout's padding
        let extent = bounding_box(frames.values())
            .map(|f| (f.right() + self.config.padding, f.bottom() + self.config.padding))
            .unwrap_or((0, 0));
        canvas.begin(layout.width().max(extent.0), layout.height().max(extent.1));

        // Outermost frames first so inner ones draw on top
        for (id, frame) in frames.iter().rev() {
            canvas.rounded_rect(*frame, 10, ShapeStyle::outlined(LineStyle::Solid));
            let label = diagram.state(id).map(|s| s.text()).unwrap_or(id);
            canvas.text(
                Point::new(frame.x + self.config.char_width, frame.y + self.config.line_height),
                label,
                TextAnchor::Start,
            );
        }

        for state in &diagram.states {
            if let Some(rect) = layout.node_rect(&state.id) {
                self.draw_state(canvas, state, rect, &measurer);
            }
        }

        let router = Router::new(&self.config.routing);
        let paths = edge_paths(&layout, &graph, &router);
        for path in &paths {
            canvas.polyline(path.points.clone(), Stroke::new(LineStyle::Solid).with_end(ArrowHead::Filled));
            if let Some(label) = transitions.get(path.index).and_then(|t| t.label()) {
                canvas.text(path.label_at, &label, TextAnchor::Middle);
            }
        }

        info!(
            width = layout.width(),
            height = layout.height(),
            frames = frames.len(),
            edges = paths.len(),
            "State diagram rendered"
        );
        Ok(layout)
    }

    fn kind(&self) -> DiagramKind {
        DiagramKind::State
    }

    fn name(&self) -> &'static str {
        "state"
    }

    fn version(&self) -> &'static str {
        "0.1.0"
    }
}
