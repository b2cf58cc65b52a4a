//! Heuristic layout path
//!
//! Layer assignment, barycenter crossing minimization, connection-point
//! distribution and orthogonal routing, glued together by
//! [`LayeredLayoutAlgorithm`].

mod layered;
pub mod layering;
pub mod ordering;
pub mod ports;
pub mod routing;

pub use layered::*;
pub use layering::{assign_layers, LayerAssignment};
pub use ordering::{cross_count, reorder};
pub use ports::{anchor_point, attachment_sides, distribute, PortAssigner, PortAssignment, PortRequest};
pub use routing::{Route, RouteStrategy, Router};

use serde::{Deserialize, Serialize};

use crate::core::{DiagramGraph, Point, Rect};

/// Absolute box of a placed node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeBox {
    pub id: String,
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl NodeBox {
    pub fn new(id: impl Into<String>, rect: Rect) -> Self {
        Self {
            id: id.into(),
            x: rect.x,
            y: rect.y,
            width: rect.width,
            height: rect.height,
        }
    }

    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }

    pub fn center(&self) -> Point {
        self.rect().center()
    }
}

/// Algorithm that places the nodes of a [`DiagramGraph`]
pub trait LayoutAlgorithm: Send + Sync {
    /// The output type of the layout
    type Output;

    /// Lay out a graph. Layout never fails: malformed input degrades.
    fn layout(&self, graph: &DiagramGraph) -> Self::Output;

    /// Get the name of this layout algorithm
    fn name(&self) -> &'static str;

    /// Get the version of this layout algorithm
    fn version(&self) -> &'static str;
}
