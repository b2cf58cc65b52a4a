//! Core type definitions shared by every diagram kind
//!
//! Diagram kinds, node sides, line, arrow and shape styles.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The diagram kinds the engine knows how to lay out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagramKind {
    Class,
    State,
    Flow,
    Sequence,
}

impl DiagramKind {
    /// Parse a kind name (case-insensitive)
    pub fn from_name(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "class" => Some(DiagramKind::Class),
            "state" => Some(DiagramKind::State),
            "flow" | "flowchart" => Some(DiagramKind::Flow),
            "sequence" => Some(DiagramKind::Sequence),
            _ => None,
        }
    }

    /// All kinds, in registration order
    pub fn all() -> [DiagramKind; 4] {
        [
            DiagramKind::Class,
            DiagramKind::State,
            DiagramKind::Flow,
            DiagramKind::Sequence,
        ]
    }
}

impl fmt::Display for DiagramKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DiagramKind::Class => "class",
            DiagramKind::State => "state",
            DiagramKind::Flow => "flow",
            DiagramKind::Sequence => "sequence",
        };
        f.pad(name)
    }
}

/// One of the four sides of a node box
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Top,
    Bottom,
    Left,
    Right,
}

impl Side {
    /// Returns true for the top and bottom sides
    pub fn is_horizontal_edge(&self) -> bool {
        matches!(self, Side::Top | Side::Bottom)
    }

    /// The side facing this one
    pub fn opposite(&self) -> Side {
        match self {
            Side::Top => Side::Bottom,
            Side::Bottom => Side::Top,
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Top => write!(f, "top"),
            Side::Bottom => write!(f, "bottom"),
            Side::Left => write!(f, "left"),
            Side::Right => write!(f, "right"),
        }
    }
}

/// Stroke pattern of a line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineStyle {
    #[default]
    Solid,
    Dashed,
    Dotted,
    Thick,
}

impl fmt::Display for LineStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LineStyle::Solid => write!(f, "solid"),
            LineStyle::Dashed => write!(f, "dashed"),
            LineStyle::Dotted => write!(f, "dotted"),
            LineStyle::Thick => write!(f, "thick"),
        }
    }
}

/// Marker drawn at a line end
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArrowHead {
    #[default]
    None,
    /// Filled triangle
    Filled,
    /// Open chevron
    Open,
    /// Hollow triangle (generalization)
    Hollow,
    /// Filled diamond (composition)
    FilledDiamond,
    /// Hollow diamond (aggregation)
    HollowDiamond,
}

/// Stroke settings for a polyline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Stroke {
    pub line: LineStyle,
    pub start: ArrowHead,
    pub end: ArrowHead,
}

impl Stroke {
    pub fn new(line: LineStyle) -> Self {
        Self {
            line,
            ..Self::default()
        }
    }

    pub fn with_end(mut self, head: ArrowHead) -> Self {
        self.end = head;
        self
    }

    pub fn with_start(mut self, head: ArrowHead) -> Self {
        self.start = head;
        self
    }
}

/// Fill and outline of a closed shape
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ShapeStyle {
    /// Fill color; `None` leaves the shape unfilled
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill: Option<String>,
    #[serde(default)]
    pub outline: LineStyle,
}

impl ShapeStyle {
    pub fn filled(color: impl Into<String>) -> Self {
        Self {
            fill: Some(color.into()),
            outline: LineStyle::Solid,
        }
    }

    pub fn outlined(outline: LineStyle) -> Self {
        Self {
            fill: None,
            outline,
        }
    }
}
