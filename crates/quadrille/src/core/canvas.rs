//! Drawing surface shared by all diagram renderers
//!
//! Renderers issue vector primitives through the [`Canvas`] trait. The
//! bundled [`DrawList`] just records them; turning primitives into SVG or
//! pixels happens outside this crate.

use serde::{Deserialize, Serialize};

use super::{Point, Rect, ShapeStyle, Stroke};

/// Horizontal alignment of a text primitive relative to its anchor point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAnchor {
    Start,
    #[default]
    Middle,
    End,
}

/// One vector drawing instruction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Primitive {
    Rect {
        rect: Rect,
        style: ShapeStyle,
    },
    RoundedRect {
        rect: Rect,
        radius: i32,
        style: ShapeStyle,
    },
    /// Ellipse inscribed in `rect`
    Ellipse {
        rect: Rect,
        style: ShapeStyle,
    },
    /// Diamond inscribed in `rect`
    Diamond {
        rect: Rect,
        style: ShapeStyle,
    },
    Polyline {
        points: Vec<Point>,
        stroke: Stroke,
    },
    Line {
        from: Point,
        to: Point,
        stroke: Stroke,
    },
    /// Single line of text; `at` is the baseline anchor
    Text {
        at: Point,
        text: String,
        anchor: TextAnchor,
    },
}

/// Target for drawing primitives
pub trait Canvas {
    /// Announce the output extent before any primitive is drawn
    fn begin(&mut self, width: i32, height: i32);

    /// Draw a primitive
    fn draw(&mut self, primitive: Primitive);

    fn rect(&mut self, rect: Rect, style: ShapeStyle) {
        self.draw(Primitive::Rect { rect, style });
    }

    fn rounded_rect(&mut self, rect: Rect, radius: i32, style: ShapeStyle) {
        self.draw(Primitive::RoundedRect {
            rect,
            radius,
            style,
        });
    }

    fn ellipse(&mut self, rect: Rect, style: ShapeStyle) {
        self.draw(Primitive::Ellipse { rect, style });
    }

    fn diamond(&mut self, rect: Rect, style: ShapeStyle) {
        self.draw(Primitive::Diamond { rect, style });
    }

    fn polyline(&mut self, points: Vec<Point>, stroke: Stroke) {
        if points.len() >= 2 {
            self.draw(Primitive::Polyline { points, stroke });
        }
    }

    fn line(&mut self, from: Point, to: Point, stroke: Stroke) {
        self.draw(Primitive::Line { from, to, stroke });
    }

    fn text(&mut self, at: Point, text: &str, anchor: TextAnchor) {
        if !text.is_empty() {
            self.draw(Primitive::Text {
                at,
                text: text.to_string(),
                anchor,
            });
        }
    }
}

/// Canvas that records primitives in draw order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DrawList {
    pub width: i32,
    pub height: i32,
    pub primitives: Vec<Primitive>,
}

impl DrawList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.primitives.len()
    }

    pub fn is_empty(&self) -> bool {
        self.primitives.is_empty()
    }

    /// All text primitives, in draw order
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.primitives.iter().filter_map(|p| match p {
            Primitive::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }

    /// All polylines, in draw order
    pub fn polylines(&self) -> impl Iterator<Item = &[Point]> {
        self.primitives.iter().filter_map(|p| match p {
            Primitive::Polyline { points, .. } => Some(points.as_slice()),
            _ => None,
        })
    }
}

impl Canvas for DrawList {
    fn begin(&mut self, width: i32, height: i32) {
        self.width = width;
        self.height = height;
        self.primitives.clear();
    }

    fn draw(&mut self, primitive: Primitive) {
        self.primitives.push(primitive);
    }
}
