//! Connection-point distribution
//!
//! When several edges attach to the same side of a node they fan out across
//! part of that side instead of stacking on the centre.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::core::{abs_i, Point, Rect, RoutingConfig, Side};

/// Offset of the `index`-th of `total` attachments along a side of length `span`.
///
/// Offsets are evenly spaced over `fraction × span` and centred on zero, so
/// they are symmetric: the first and last attachments mirror each other.
pub fn distribute(span: i32, index: usize, total: usize, fraction: f64) -> i32 {
    if total <= 1 || span <= 0 {
        return 0;
    }
    let usable = f64::from(span) * fraction;
    let step = usable / (total - 1) as f64;
    let offset = -usable / 2.0 + step * index.min(total - 1) as f64;
    offset.round() as i32
}

/// Sides used to connect two boxes, by dominant centre delta.
///
/// Vertical dominance gives bottom/top (or top/bottom when the target sits
/// above), horizontal dominance gives right/left (or left/right).
pub fn attachment_sides(from: &Rect, to: &Rect) -> (Side, Side) {
    let (a, b) = (from.center(), to.center());
    let (dx, dy) = (b.x - a.x, b.y - a.y);
    if abs_i(dy) >= abs_i(dx) {
        if dy >= 0 {
            (Side::Bottom, Side::Top)
        } else {
            (Side::Top, Side::Bottom)
        }
    } else if dx >= 0 {
        (Side::Right, Side::Left)
    } else {
        (Side::Left, Side::Right)
    }
}

/// Point on a side of `rect`, shifted along the side by `offset`
pub fn anchor_point(rect: &Rect, side: Side, offset: i32) -> Point {
    let c = rect.center();
    match side {
        Side::Top => Point::new(c.x + offset, rect.y),
        Side::Bottom => Point::new(c.x + offset, rect.bottom()),
        Side::Left => Point::new(rect.x, c.y + offset),
        Side::Right => Point::new(rect.right(), c.y + offset),
    }
}

/// One edge asking for attachment points
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortRequest {
    pub from: String,
    pub to: String,
    /// Fixed (source, target) sides; `None` picks by dominant direction
    pub sides: Option<(Side, Side)>,
}

impl PortRequest {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            sides: None,
        }
    }

    pub fn with_sides(mut self, source: Side, target: Side) -> Self {
        self.sides = Some((source, target));
        self
    }
}

/// Attachment chosen for one edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortAssignment {
    pub source_side: Side,
    pub target_side: Side,
    pub source_offset: i32,
    pub target_offset: i32,
    pub start: Point,
    pub end: Point,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum End {
    Source,
    Target,
}

/// Groups edge ends by (node, side) and spreads each group
#[derive(Debug, Clone, Copy)]
pub struct PortAssigner {
    horizontal_spread: f64,
    vertical_spread: f64,
}

impl PortAssigner {
    pub fn new(config: &RoutingConfig) -> Self {
        Self {
            horizontal_spread: config.horizontal_spread,
            vertical_spread: config.vertical_spread,
        }
    }

    /// Assign attachment points. Requests naming an unknown box yield `None`.
    pub fn assign(
        &self,
        boxes: &IndexMap<String, Rect>,
        requests: &[PortRequest],
    ) -> Vec<Option<PortAssignment>> {
        let sides: Vec<Option<(Side, Side)>> = requests
            .iter()
            .map(|r| {
                let (from, to) = (boxes.get(&r.from)?, boxes.get(&r.to)?);
                Some(r.sides.unwrap_or_else(|| attachment_sides(from, to)))
            })
            .collect();

        // (node, side) -> [(request index, end, coordinate of the opposite centre)]
        let mut groups: IndexMap<(&str, Side), Vec<(usize, End, i32)>> = IndexMap::new();
        for (i, (request, pair)) in requests.iter().zip(&sides).enumerate() {
            let Some((source_side, target_side)) = *pair else {
                continue;
            };
            let (Some(from), Some(to)) = (boxes.get(&request.from), boxes.get(&request.to))
            else {
                continue;
            };
            groups
                .entry((request.from.as_str(), source_side))
                .or_default()
                .push((i, End::Source, along(source_side, to)));
            groups
                .entry((request.to.as_str(), target_side))
                .or_default()
                .push((i, End::Target, along(target_side, from)));
        }

        let mut offsets: Vec<(i32, i32)> = vec![(0, 0); requests.len()];
        for ((node, side), mut members) in groups {
            let Some(rect) = boxes.get(node) else {
                continue;
            };
            members.sort_by_key(|&(i, _, coord)| (coord, i));
            let (span, fraction) = if side.is_horizontal_edge() {
                (rect.width, self.horizontal_spread)
            } else {
                (rect.height, self.vertical_spread)
            };
            let total = members.len();
            for (rank, (i, end, _)) in members.into_iter().enumerate() {
                let offset = distribute(span, rank, total, fraction);
                match end {
                    End::Source => offsets[i].0 = offset,
                    End::Target => offsets[i].1 = offset,
                }
            }
            trace!(node, side = %side, total, "Distributed attachments");
        }

        requests
            .iter()
            .zip(sides)
            .zip(offsets)
            .map(|((request, pair), (source_offset, target_offset))| {
                let (source_side, target_side) = pair?;
                let from = boxes.get(&request.from)?;
                let to = boxes.get(&request.to)?;
                Some(PortAssignment {
                    source_side,
                    target_side,
                    source_offset,
                    target_offset,
                    start: anchor_point(from, source_side, source_offset),
                    end: anchor_point(to, target_side, target_offset),
                })
            })
            .collect()
    }
}

impl Default for PortAssigner {
    fn default() -> Self {
        Self::new(&RoutingConfig::default())
    }
}

/// Coordinate of the other node's centre along `side`
fn along(side: Side, other: &Rect) -> i32 {
    if side.is_horizontal_edge() {
        other.center().x
    } else {
        other.center().y
    }
}
