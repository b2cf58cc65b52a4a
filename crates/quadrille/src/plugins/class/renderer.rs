//! Class diagram renderer
//!
//! Classes become three-compartment boxes; relations become orthogonal
//! polylines with UML arrowheads.

use tracing::{debug, info, span, Level};

use super::model::{ClassDiagram, ClassNode, Relation, RelationKind};
use super::patterns::ClassPatternDetector;
use crate::core::{
    ArrowHead, Canvas, DiagramError, DiagramGraph, DiagramKind, GraphEdge, GraphNode,
    LayoutConfig, LineStyle, Point, Rect, ShapeStyle, Size, Stroke, TextAnchor, TextMeasurer,
};
use crate::layout::Router;
use crate::patterns::{PatternDetector, PatternRegistry};
use crate::plugins::{edge_paths, layout_graph, DiagramLayout, DiagramRenderer};

/// Stroke for a relation; diamonds sit on the owner (`from`) end
pub fn relation_stroke(kind: RelationKind) -> Stroke {
    match kind {
        RelationKind::Extends => Stroke::new(LineStyle::Solid).with_end(ArrowHead::Hollow),
        RelationKind::Implements => Stroke::new(LineStyle::Dashed).with_end(ArrowHead::Hollow),
        RelationKind::Composition => Stroke::new(LineStyle::Solid).with_start(ArrowHead::FilledDiamond),
        RelationKind::Aggregation => Stroke::new(LineStyle::Solid).with_start(ArrowHead::HollowDiamond),
        RelationKind::Association => Stroke::new(LineStyle::Solid).with_end(ArrowHead::Open),
        RelationKind::Dependency => Stroke::new(LineStyle::Dashed).with_end(ArrowHead::Open),
        RelationKind::Link => Stroke::new(LineStyle::Solid),
    }
}

/// Text of a class box, split by compartment
struct Compartments {
    header: Vec<String>,
    attributes: Vec<String>,
    methods: Vec<String>,
}

impl Compartments {
    fn of(class: &ClassNode, measurer: &TextMeasurer) -> Self {
        let mut header = Vec::new();
        if let Some(stereotype) = &class.stereotype {
            header.push(format!("«{}»", stereotype.label()));
        }
        header.extend(measurer.wrap(&class.name));
        Self {
            header,
            attributes: class.attributes.clone(),
            methods: class.methods.clone(),
        }
    }

    fn all_lines(&self) -> impl Iterator<Item = &String> {
        self.header
            .iter()
            .chain(self.attributes.iter())
            .chain(self.methods.iter())
    }

    /// Sections drawn below the header
    fn sections(&self) -> Vec<&[String]> {
        let mut sections = Vec::new();
        if !self.attributes.is_empty() || !self.methods.is_empty() {
            sections.push(self.attributes.as_slice());
        }
        if !self.methods.is_empty() {
            sections.push(self.methods.as_slice());
        }
        sections
    }

    fn size(&self, measurer: &TextMeasurer, config: &LayoutConfig) -> Size {
        let lines: Vec<&String> = self.all_lines().collect();
        let text = measurer.measure_lines(&lines);
        let line_height = measurer.line_height();
        let sections = self.sections();
        let height = text.height + line_height / 2 * (sections.len() as i32 + 1) + line_height / 2;
        Size::new(
            (text.width + config.char_width * 4).max(config.min_node_width),
            height.max(config.min_node_height),
        )
    }
}

/// Class diagram renderer
pub struct ClassRenderer {
    config: LayoutConfig,
    detector: ClassPatternDetector,
}

impl ClassRenderer {
    pub fn new() -> Self {
        Self::with_config(LayoutConfig::default())
    }

    pub fn with_config(config: LayoutConfig) -> Self {
        Self {
            config,
            detector: ClassPatternDetector::new(),
        }
    }

    /// Layout graph with measured class boxes; returns the relations that
    /// became edges, in edge order
    pub fn build_graph<'a>(&self, diagram: &'a ClassDiagram) -> (DiagramGraph, Vec<&'a Relation>) {
        let measurer = TextMeasurer::from_config(&self.config);
        let mut graph = DiagramGraph::new();
        for class in &diagram.classes {
            let size = Compartments::of(class, &measurer).size(&measurer, &self.config);
            graph.add_node(GraphNode::new(class.id.clone(), size.width, size.height));
        }

        let mut accepted = Vec::new();
        for relation in &diagram.relations {
            let mut edge = GraphEdge::new(relation.from.clone(), relation.to.clone(), relation.kind.edge_kind());
            if let Some(label) = &relation.label {
                edge = edge.with_label(label.clone());
            }
            if graph.add_edge(edge) {
                accepted.push(relation);
            }
        }
        (graph, accepted)
    }

    fn draw_class(&self, canvas: &mut dyn Canvas, class: &ClassNode, rect: Rect, measurer: &TextMeasurer) {
        let compartments = Compartments::of(class, measurer);
        let line_height = measurer.line_height();
        let gap = line_height / 2;
        canvas.rect(rect, ShapeStyle::default());

        let center_x = rect.center().x;
        let mut y = rect.y + gap;
        for line in &compartments.header {
            y += line_height;
            canvas.text(Point::new(center_x, y - line_height / 4), line, TextAnchor::Middle);
        }

        let left = rect.x + self.config.char_width;
        for section in compartments.sections() {
            y += gap;
            canvas.line(Point::new(rect.x, y), Point::new(rect.right(), y), Stroke::default());
            for member in section {
                y += line_height;
                canvas.text(Point::new(left, y - line_height / 4), member, TextAnchor::Start);
            }
        }
    }

    /// Detect patterns and place the already built layout graph
    fn layout_graph_of(
        &self,
        diagram: &ClassDiagram,
        graph: &DiagramGraph,
        registry: &PatternRegistry,
    ) -> Result<DiagramLayout, DiagramError> {
        let layout_span = span!(
            Level::INFO,
            "layout_class_diagram",
            class_count = diagram.classes.len(),
            relation_count = diagram.relations.len()
        );
        let _enter = layout_span.enter();

        let matches = self.detector.detect(diagram);
        debug!(match_count = matches.len(), "Class pattern detection completed");
        layout_graph(DiagramKind::Class, graph, matches, registry, &self.config)
    }
}

impl Default for ClassRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl DiagramRenderer for ClassRenderer {
    type Model = ClassDiagram;

    fn layout(&self, diagram: &ClassDiagram, registry: &PatternRegistry) -> Result<DiagramLayout, DiagramError> {
        let (graph, _) = self.build_graph(diagram);
        self.layout_graph_of(diagram, &graph, registry)
    }

    fn render(
        &self,
        diagram: &ClassDiagram,
        registry: &PatternRegistry,
        canvas: &mut dyn Canvas,
    ) -> Result<DiagramLayout, DiagramError> {
        let render_span = span!(Level::INFO, "render_class_diagram");
        let _enter = render_span.enter();

        let (graph, relations) = self.build_graph(diagram);
        let layout = self.layout_graph_of(diagram, &graph, registry)?;
        let measurer = TextMeasurer::from_config(&self.config);

        canvas.begin(layout.width(), layout.height());
        for class in &diagram.classes {
            if let Some(rect) = layout.node_rect(&class.id) {
                self.draw_class(canvas, class, rect, &measurer);
            }
        }

        let router = Router::new(&self.config.routing);
        let paths = edge_paths(&layout, &graph, &router);
        for path in &paths {
            let Some(relation) = relations.get(path.index) else {
                continue;
            };
            canvas.polyline(path.points.clone(), relation_stroke(relation.kind));
            if let Some(label) = &relation.label {
                canvas.text(path.label_at, label, TextAnchor::Middle);
            }
            if let (Some(first), Some(text)) = (path.points.first(), &relation.from_cardinality) {
                canvas.text(first.offset(4, -4), text, TextAnchor::Start);
            }
            if let (Some(last), Some(text)) = (path.points.last(), &relation.to_cardinality) {
                canvas.text(last.offset(4, -4), text, TextAnchor::Start);
            }
        }

        info!(
            width = layout.width(),
            height = layout.height(),
            edges = paths.len(),
            "Class diagram rendered"
        );
        Ok(layout)
    }

    fn kind(&self) -> DiagramKind {
        DiagramKind::Class
    }

    fn name(&self) -> &'static str {
        "class"
    }

    fn version(&self) -> &'static str {
        "0.1.0"
    }
}
