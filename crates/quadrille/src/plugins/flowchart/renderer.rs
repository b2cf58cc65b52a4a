//! Flowchart renderer

use tracing::{debug, info, span, Level};

use super::model::{FlowDiagram, FlowEdge, FlowNode, FlowShape};
use super::patterns::FlowPatternDetector;
use crate::core::{
    ArrowHead, Canvas, DiagramError, DiagramGraph, DiagramKind, GraphEdge, GraphNode,
    LayoutConfig, Point, Rect, ShapeStyle, Size, Stroke, TextAnchor, TextMeasurer,
};
use crate::layout::Router;
use crate::patterns::{PatternDetector, PatternRegistry};
use crate::plugins::{
    draw_centered_lines, edge_paths, layout_graph, padded_size, DiagramLayout, DiagramRenderer,
};

/// Box size of a node; decisions and slanted shapes need room around the text
pub fn shape_size(node: &FlowNode, measurer: &TextMeasurer, config: &LayoutConfig) -> Size {
    let base = padded_size(measurer, &measurer.wrap(node.text()), config);
    match node.shape {
        FlowShape::Decision => Size::new(base.width * 3 / 2, base.height * 3 / 2),
        FlowShape::InputOutput => Size::new(base.width + base.height / 2, base.height),
        FlowShape::Subroutine => Size::new(base.width + config.char_width * 2, base.height),
        FlowShape::Start | FlowShape::End => Size::new(base.width + base.height / 2, base.height),
        FlowShape::Process => base,
    }
}

/// Flowchart renderer
pub struct FlowRenderer {
    config: LayoutConfig,
    detector: FlowPatternDetector,
}

impl FlowRenderer {
    pub fn new() -> Self {
        Self::with_config(LayoutConfig::default())
    }

    pub fn with_config(config: LayoutConfig) -> Self {
        Self {
            config,
            detector: FlowPatternDetector::new(),
        }
    }

    /// Layout graph with measured node shapes; returns the edges that were
    /// kept, in edge order
    pub fn build_graph<'a>(&self, diagram: &'a FlowDiagram) -> (DiagramGraph, Vec<&'a FlowEdge>) {
        let measurer = TextMeasurer::from_config(&self.config);
        let nodes = diagram.nodes.iter().map(|n| {
            let size = shape_size(n, &measurer, &self.config);
            GraphNode::new(n.id.clone(), size.width, size.height)
        });
        let mut graph = DiagramGraph::from_parts(nodes, Vec::new());

        let mut accepted = Vec::new();
        for edge in &diagram.edges {
            let mut graph_edge = GraphEdge::new(edge.from.clone(), edge.to.clone(), Default::default());
            if let Some(label) = &edge.label {
                graph_edge = graph_edge.with_label(label.clone());
            }
            if graph.add_edge(graph_edge) {
                accepted.push(edge);
            }
        }
        (graph, accepted)
    }

    fn draw_node(&self, canvas: &mut dyn Canvas, node: &FlowNode, rect: Rect, measurer: &TextMeasurer) {
        let style = ShapeStyle::default();
        match node.shape {
            FlowShape::Start | FlowShape::End => canvas.rounded_rect(rect, rect.height / 2, style),
            FlowShape::Process => canvas.rect(rect, style),
            FlowShape::Decision => canvas.diamond(rect, style),
            FlowShape::InputOutput => {
                let skew = rect.height / 4;
                canvas.polyline(
                    vec![
                        Point::new(rect.x + skew, rect.y),
                        Point::new(rect.right(), rect.y),
                        Point::new(rect.right() - skew, rect.bottom()),
                        Point::new(rect.x, rect.bottom()),
                        Point::new(rect.x + skew, rect.y),
                    ],
                    Stroke::default(),
                );
            }
            FlowShape::Subroutine => {
                canvas.rect(rect, style);
                let inset = self.config.char_width;
                for x in [rect.x + inset, rect.right() - inset] {
                    canvas.line(Point::new(x, rect.y), Point::new(x, rect.bottom()), Stroke::default());
                }
            }
        }
        draw_centered_lines(canvas, &rect, &measurer.wrap(node.text()), measurer.line_height());
    }

    /// Detect patterns and place the already built layout graph
    fn layout_graph_of(
        &self,
        diagram: &FlowDiagram,
        graph: &DiagramGraph,
        registry: &PatternRegistry,
    ) -> Result<DiagramLayout, DiagramError> {
        let layout_span = span!(
            Level::INFO,
            "layout_flow_diagram",
            node_count = diagram.nodes.len(),
            edge_count = diagram.edges.len()
        );
        let _enter = layout_span.enter();

        let matches = self.detector.detect(diagram);
        debug!(match_count = matches.len(), "Flow pattern detection completed");
        layout_graph(DiagramKind::Flow, graph, matches, registry, &self.config)
    }
}

impl Default for FlowRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl DiagramRenderer for FlowRenderer {
    type Model = FlowDiagram;

    fn layout(&self, diagram: &FlowDiagram, registry: &PatternRegistry) -> Result<DiagramLayout, DiagramError> {
        let (graph, _) = self.build_graph(diagram);
        self.layout_graph_of(diagram, &graph, registry)
    }

    fn render(
        &self,
        diagram: &FlowDiagram,
        registry: &PatternRegistry,
        canvas: &mut dyn Canvas,
    ) -> Result<DiagramLayout, DiagramError> {
        let render_span = span!(Level::INFO, "render_flow_diagram");
        let _enter = render_span.enter();

        let (graph, edges) = self.build_graph(diagram);
        let layout = self.layout_graph_of(diagram, &graph, registry)?;
        let measurer = TextMeasurer::from_config(&self.config);

        canvas.begin(layout.width(), layout.height());
        for node in &diagram.nodes {
            if let Some(rect) = layout.node_rect(&node.id) {
                self.draw_node(canvas, node, rect, &measurer);
            }
        }

        let router = Router::new(&self.config.routing);
        let paths = edge_paths(&layout, &graph, &router);
        for path in &paths {
            let Some(edge) = edges.get(path.index) else {
                continue;
            };
            canvas.polyline(path.points.clone(), Stroke::new(edge.style).with_end(ArrowHead::Filled));
            if let Some(label) = &edge.label {
                canvas.text(path.label_at, label, TextAnchor::Middle);
            }
        }

        info!(
            width = layout.width(),
            height = layout.height(),
            edges = paths.len(),
            "Flowchart rendered"
        );
        Ok(layout)
    }

    fn kind(&self) -> DiagramKind {
        DiagramKind::Flow
    }

    fn name(&self) -> &'static str {
        "flowchart"
    }

    fn version(&self) -> &'static str {
        "0.1.0"
    }
}
