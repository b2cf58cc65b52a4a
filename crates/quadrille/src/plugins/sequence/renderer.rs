//! Sequence diagram renderer
//!
//! Participants are laid out left to right, events top to bottom. A matched
//! template only decides the horizontal placement of the participants it
//! binds; the timeline always follows event order.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, span, trace, Level};

use super::model::{MessageStyle, ParticipantKind, SequenceDiagram, SequenceEvent};
use super::patterns::SequencePatternDetector;
use crate::core::{
    Canvas, DiagramError, DiagramKind, LayoutConfig, LineStyle, Point, Rect, ShapeStyle, Size,
    Stroke, TextAnchor, TextMeasurer,
};
use crate::layout::NodeBox;
use crate::patterns::{apply, PatternDetector, PatternRegistry};
use crate::plugins::{choose_pattern, draw_centered_lines, padded_size, DiagramLayout, DiagramRenderer};

/// Width of an activation bar
const ACTIVATION_WIDTH: i32 = 10;

/// A participant head and its lifeline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantLayout {
    pub id: String,
    pub head: NodeBox,
    pub lifeline_x: i32,
    pub lifeline_top: i32,
    pub lifeline_bottom: i32,
}

/// A message arrow
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageLayout {
    pub from: String,
    pub to: String,
    pub label: String,
    pub style: MessageStyle,
    pub points: Vec<Point>,
    pub label_x: i32,
    pub label_y: i32,
}

/// A note box over one or more lifelines
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteLayout {
    pub text: String,
    pub rect: Rect,
}

/// An activation bar on a lifeline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivationLayout {
    pub id: String,
    pub rect: Rect,
}

/// Output of the sequence layout
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequenceLayout {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
    pub participants: Vec<ParticipantLayout>,
    pub messages: Vec<MessageLayout>,
    pub notes: Vec<NoteLayout>,
    pub activations: Vec<ActivationLayout>,
    pub width: i32,
    pub height: i32,
}

impl SequenceLayout {
    pub fn participant(&self, id: &str) -> Option<&ParticipantLayout> {
        self.participants.iter().find(|p| p.id == id)
    }

    /// Move every element `dx` to the right and widen the canvas to match
    pub fn shift_right(&mut self, dx: i32) {
        if dx == 0 {
            return;
        }
        for participant in &mut self.participants {
            participant.head.x += dx;
            participant.lifeline_x += dx;
        }
        for message in &mut self.messages {
            for point in &mut message.points {
                *point = point.offset(dx, 0);
            }
            message.label_x += dx;
        }
        for note in &mut self.notes {
            note.rect = note.rect.offset(dx, 0);
        }
        for activation in &mut self.activations {
            activation.rect = activation.rect.offset(dx, 0);
        }
        self.width += dx;
    }
}

/// Sequence diagram renderer
pub struct SequenceRenderer {
    config: LayoutConfig,
    detector: SequencePatternDetector,
}

impl SequenceRenderer {
    pub fn new() -> Self {
        Self::with_config(LayoutConfig::default())
    }

    pub fn with_config(config: LayoutConfig) -> Self {
        Self {
            config,
            detector: SequencePatternDetector::new(),
        }
    }

    /// Lifeline x for every participant, in left-to-right order
    fn columns(
        &self,
        diagram: &SequenceDiagram,
        sizes: &IndexMap<String, Size>,
        registry: &PatternRegistry,
    ) -> Result<(Option<String>, IndexMap<String, i32>), DiagramError> {
        let matches = self.detector.detect(diagram);
        debug!(match_count = matches.len(), "Sequence pattern detection completed");
        let ids = diagram.participants.iter().map(|p| p.id.as_str());
        let chosen = choose_pattern(DiagramKind::Sequence, matches, ids, registry, &self.config)?;

        let padding = self.config.padding;
        let gap = self.config.node_sep;
        let mut columns: IndexMap<String, i32> = IndexMap::new();
        let mut template = None;

        if let Some(pattern) = chosen {
            if let Some(layout) = registry.get(&pattern.template) {
                let applied = apply(&pattern, layout, sizes);
                let mut placed: Vec<(&str, i32)> = applied
                    .nodes
                    .iter()
                    .map(|n| (n.id.as_str(), n.center().x))
                    .collect();
                placed.sort_by_key(|(_, x)| *x);
                for (id, x) in placed {
                    columns.insert(id.to_string(), x);
                }
                template = Some(pattern.template.clone());
            }
        }

        // Evenly spaced columns for everyone the template did not place
        let widest = sizes.values().map(|s| s.width).max().unwrap_or(0);
        let mut right = columns
            .iter()
            .filter_map(|(id, x)| sizes.get(id).map(|s| x + s.width / 2))
            .max();
        for participant in &diagram.participants {
            if columns.contains_key(&participant.id) {
                continue;
            }
            let x = match right {
                Some(r) => r + gap + widest / 2,
                None => padding + widest / 2,
            };
            right = Some(x + widest / 2);
            columns.insert(participant.id.clone(), x);
        }
        Ok((template, columns))
    }

    /// Lay the diagram out without drawing
    pub fn layout_sequence(
        &self,
        diagram: &SequenceDiagram,
        registry: &PatternRegistry,
    ) -> Result<SequenceLayout, DiagramError> {
        let layout_span = span!(
            Level::INFO,
            "layout_sequence_diagram",
            participant_count = diagram.participants.len(),
            event_count = diagram.events.len()
        );
        let _enter = layout_span.enter();

        let measurer = TextMeasurer::from_config(&self.config);
        let line_height = measurer.line_height();
        let padding = self.config.padding;

        let sizes: IndexMap<String, Size> = diagram
            .participants
            .iter()
            .map(|p| (p.id.clone(), padded_size(&measurer, &measurer.wrap(p.text()), &self.config)))
            .collect();
        let head_height = sizes.values().map(|s| s.height).max().unwrap_or(0);
        let (template, columns) = self.columns(diagram, &sizes, registry)?;

        let mut y = padding + head_height + self.config.rank_sep / 2;
        let mut messages = Vec::new();
        let mut notes = Vec::new();
        let mut activations = Vec::new();
        let mut open: Vec<(String, i32, usize)> = Vec::new();
        let mut max_x = columns
            .iter()
            .filter_map(|(id, x)| sizes.get(id).map(|s| x + s.width / 2))
            .max()
            .unwrap_or(padding);

        for event in &diagram.events {
            match event {
                SequenceEvent::Message {
                    from,
                    to,
                    label,
                    style,
                } => {
                    let (Some(&fx), Some(&tx)) = (columns.get(from), columns.get(to)) else {
                        debug!(from = %from, to = %to, "Message to unknown participant skipped");
                        continue;
                    };
                    let label_lines = measurer.wrap(label).len() as i32;
                    y += label_lines * line_height;
                    let points = if from == to {
                        let reach = self.config.node_sep;
                        max_x = max_x.max(fx + reach);
                        let points = vec![
                            Point::new(fx, y),
                            Point::new(fx + reach, y),
                            Point::new(fx + reach, y + line_height),
                            Point::new(fx, y + line_height),
                        ];
                        y += line_height;
                        points
                    } else {
                        vec![Point::new(fx, y), Point::new(tx, y)]
                    };
                    let anchor = if from == to {
                        points[0].offset(4, -4)
                    } else {
                        Point::new((fx + tx) / 2, points[0].y - 4)
                    };
                    messages.push(MessageLayout {
                        from: from.clone(),
                        to: to.clone(),
                        label: label.clone(),
                        style: *style,
                        points,
                        label_x: anchor.x,
                        label_y: anchor.y,
                    });
                    y += line_height;
                }
                SequenceEvent::Note { over, text } => {
                    let xs: Vec<i32> = over.iter().filter_map(|id| columns.get(id).copied()).collect();
                    let (Some(&left), Some(&right)) = (xs.iter().min(), xs.iter().max()) else {
                        debug!("Note over unknown participants skipped");
                        continue;
                    };
                    let lines = measurer.wrap(text);
                    let size = padded_size(&measurer, &lines, &self.config);
                    let width = size.width.max(right - left + self.config.node_sep);
                    let rect = Rect::new((left + right) / 2 - width / 2, y, width, size.height);
                    max_x = max_x.max(rect.right());
                    notes.push(NoteLayout {
                        text: text.clone(),
                        rect,
                    });
                    y += size.height + line_height / 2;
                }
                SequenceEvent::Activate { id } => {
                    if columns.contains_key(id) {
                        let depth = open.iter().filter(|(open_id, _, _)| open_id == id).count();
                        open.push((id.clone(), y, depth));
                    }
                }
                SequenceEvent::Deactivate { id } => {
                    if let Some(pos) = open.iter().rposition(|(open_id, _, _)| open_id == id) {
                        let (id, start, depth) = open.remove(pos);
                        activations.push(self.activation(&columns, id, start, y, depth));
                    } else {
                        trace!(id = %id, "Deactivate without activation ignored");
                    }
                }
            }
        }

        let bottom = y + line_height;
        for (id, start, depth) in open.drain(..).rev() {
            activations.push(self.activation(&columns, id, start, bottom, depth));
        }

        let participants = columns
            .iter()
            .filter_map(|(id, &x)| {
                let size = sizes.get(id)?;
                let head = Rect::new(x - size.width / 2, padding, size.width, head_height);
                Some(ParticipantLayout {
                    id: id.clone(),
                    head: NodeBox::new(id.clone(), head),
                    lifeline_x: x,
                    lifeline_top: head.bottom(),
                    lifeline_bottom: bottom,
                })
            })
            .collect::<Vec<_>>();

        // Notes wider than their columns may hang past the left margin
        let overhang = notes
            .iter()
            .map(|n| padding - n.rect.x)
            .max()
            .unwrap_or(0)
            .max(0);
        let mut layout = SequenceLayout {
            template,
            participants,
            messages,
            notes,
            activations,
            width: max_x + padding,
            height: bottom + padding,
        };
        if overhang > 0 {
            trace!(overhang, "Shifting sequence layout right");
            layout.shift_right(overhang);
        }
        debug!(
            width = layout.width,
            height = layout.height,
            messages = layout.messages.len(),
            "Sequence layout completed"
        );
        Ok(layout)
    }

    fn activation(&self, columns: &IndexMap<String, i32>, id: String, start: i32, end: i32, depth: usize) -> ActivationLayout {
        let x = columns.get(&id).copied().unwrap_or(0) - ACTIVATION_WIDTH / 2 + depth as i32 * 4;
        ActivationLayout {
            id,
            rect: Rect::new(x, start, ACTIVATION_WIDTH, (end - start).max(1)),
        }
    }
}

impl Default for SequenceRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl DiagramRenderer for SequenceRenderer {
    type Model = SequenceDiagram;

    fn layout(&self, diagram: &SequenceDiagram, registry: &PatternRegistry) -> Result<DiagramLayout, DiagramError> {
        self.layout_sequence(diagram, registry).map(DiagramLayout::Sequence)
    }

    fn render(
        &self,
        diagram: &SequenceDiagram,
        registry: &PatternRegistry,
        canvas: &mut dyn Canvas,
    ) -> Result<DiagramLayout, DiagramError> {
        let render_span = span!(Level::INFO, "render_sequence_diagram");
        let _enter = render_span.enter();

        let layout = self.layout_sequence(diagram, registry)?;
        let measurer = TextMeasurer::from_config(&self.config);
        let line_height = measurer.line_height();
        canvas.begin(layout.width, layout.height);

        for column in &layout.participants {
            let Some(participant) = diagram.participant(&column.id) else {
                continue;
            };
            let head = column.head.rect();
            canvas.line(
                Point::new(column.lifeline_x, column.lifeline_top),
                Point::new(column.lifeline_x, column.lifeline_bottom),
                Stroke::new(LineStyle::Dashed),
            );
            match participant.kind {
                ParticipantKind::Participant => canvas.rect(head, ShapeStyle::default()),
                ParticipantKind::Actor => {
                    let d = line_height;
                    let face = Rect::new(column.lifeline_x - d / 2, head.y, d, d);
                    canvas.ellipse(face, ShapeStyle::default());
                }
            }
            draw_centered_lines(canvas, &head, &measurer.wrap(participant.text()), line_height);
        }

        for activation in &layout.activations {
            canvas.rect(activation.rect, ShapeStyle::filled("white"));
        }

        for message in &layout.messages {
            canvas.polyline(message.points.clone(), message.style.stroke());
            let anchor = if message.from == message.to {
                TextAnchor::Start
            } else {
                TextAnchor::Middle
            };
            canvas.text(Point::new(message.label_x, message.label_y), &message.label, anchor);
        }

        for note in &layout.notes {
            canvas.rect(note.rect, ShapeStyle::filled("lightyellow"));
            draw_centered_lines(canvas, &note.rect, &measurer.wrap(&note.text), line_height);
        }

        info!(
            width = layout.width,
            height = layout.height,
            messages = layout.messages.len(),
            "Sequence diagram rendered"
        );
        Ok(DiagramLayout::Sequence(layout))
    }

    fn kind(&self) -> DiagramKind {
        DiagramKind::Sequence
    }

    fn name(&self) -> &'static str {
        "sequence"
    }

    fn version(&self) -> &'static str {
        "0.1.0"
    }
}
