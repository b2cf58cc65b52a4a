//! Pattern layout applier
//!
//! Scales a template onto a canvas big enough for the measured node sizes
//! and turns relative slots, waypoints and decorators into absolute boxes.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, span, trace, Level};

use super::{PatternLayout, PatternMatch, RelativePoint};
use crate::core::{path_intersects_any, path_label_anchor, simplify_path, Point, Rect, Side, Size};
use crate::layout::NodeBox;

/// An edge laid out from a template path
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeLayout {
    pub from: String,
    pub to: String,
    pub waypoints: Vec<Point>,
    pub label_x: i32,
    pub label_y: i32,
}

/// A scaled decorator box
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecoratorBox {
    pub kind: String,
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    #[serde(default)]
    pub style: IndexMap<String, String>,
}

impl DecoratorBox {
    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }
}

/// Result of applying a template to one match
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedLayout {
    pub template: String,
    pub nodes: Vec<NodeBox>,
    pub edges: Vec<EdgeLayout>,
    pub decorators: Vec<DecoratorBox>,
    pub width: i32,
    pub height: i32,
}

impl AppliedLayout {
    pub fn node(&self, id: &str) -> Option<&NodeBox> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Template edge laid out between two ids, in either direction
    pub fn edge_between(&self, from: &str, to: &str) -> Option<&EdgeLayout> {
        self.edges
            .iter()
            .find(|e| e.from == from && e.to == to)
            .or_else(|| self.edges.iter().find(|e| e.from == to && e.to == from))
    }

    /// Shift everything onto the canvas and grow it to cover every box and path
    pub fn fit_contents(&mut self) {
        self.normalize();
        let right = self
            .nodes
            .iter()
            .map(|n| n.x + n.width)
            .chain(self.edges.iter().flat_map(|e| e.waypoints.iter().map(|p| p.x)))
            .chain(self.decorators.iter().map(|d| d.x + d.width))
            .max()
            .unwrap_or(0);
        let bottom = self
            .nodes
            .iter()
            .map(|n| n.y + n.height)
            .chain(self.edges.iter().flat_map(|e| e.waypoints.iter().map(|p| p.y)))
            .chain(self.decorators.iter().map(|d| d.y + d.height))
            .max()
            .unwrap_or(0);
        if right > self.width || bottom > self.height {
            debug!(right, bottom, "Growing pattern canvas");
        }
        self.width = self.width.max(right);
        self.height = self.height.max(bottom);
    }

    fn normalize(&mut self) {
        let min_x = self
            .nodes
            .iter()
            .map(|n| n.x)
            .chain(self.edges.iter().flat_map(|e| e.waypoints.iter().map(|p| p.x)))
            .chain(self.decorators.iter().map(|d| d.x))
            .min()
            .unwrap_or(0);
        let min_y = self
            .nodes
            .iter()
            .map(|n| n.y)
            .chain(self.edges.iter().flat_map(|e| e.waypoints.iter().map(|p| p.y)))
            .chain(self.decorators.iter().map(|d| d.y))
            .min()
            .unwrap_or(0);
        let dx = (-min_x).max(0);
        let dy = (-min_y).max(0);
        if dx == 0 && dy == 0 {
            return;
        }

        debug!(dx, dy, "Normalizing pattern origin");
        for node in &mut self.nodes {
            node.x += dx;
            node.y += dy;
        }
        for edge in &mut self.edges {
            for p in &mut edge.waypoints {
                *p = p.offset(dx, dy);
            }
            edge.label_x += dx;
            edge.label_y += dy;
        }
        for decorator in &mut self.decorators {
            decorator.x += dx;
            decorator.y += dy;
        }
        self.width += dx;
        self.height += dy;
    }
}

/// Canvas size needed to fit every mapped node into its slot
pub fn canvas_for(pattern: &PatternMatch, template: &PatternLayout, sizes: &IndexMap<String, Size>) -> (i32, i32) {
    let padding = 2.0 * template.padding as f64;
    let mut width = template.min_width as f64;
    let mut height = template.min_height as f64;

    for slot in &template.slots {
        let Some(size) = pattern.role(&slot.role).and_then(|id| sizes.get(id)) else {
            continue;
        };
        if slot.width > 0.0 {
            width = width.max(size.width as f64 / slot.width + padding);
        }
        if slot.height > 0.0 {
            height = height.max(size.height as f64 / slot.height + padding);
        }
    }
    (width.ceil() as i32, height.ceil() as i32)
}

/// Apply a template, growing its minimum canvas to fit the measured sizes
pub fn apply(pattern: &PatternMatch, template: &PatternLayout, sizes: &IndexMap<String, Size>) -> AppliedLayout {
    let (width, height) = canvas_for(pattern, template, sizes);
    apply_with_canvas(pattern, template, sizes, width, height)
}

/// Apply a template at an explicit canvas size
pub fn apply_with_canvas(
    pattern: &PatternMatch,
    template: &PatternLayout,
    sizes: &IndexMap<String, Size>,
    width: i32,
    height: i32,
) -> AppliedLayout {
    let apply_span = span!(
        Level::DEBUG,
        "apply_pattern",
        template = %template.name,
        width,
        height
    );
    let _enter = apply_span.enter();

    let scale = |p: RelativePoint| {
        Point::new(
            (p.x * width as f64).round() as i32,
            (p.y * height as f64).round() as i32,
        )
    };

    let mut boxes: IndexMap<&str, Rect> = IndexMap::new();
    let mut nodes = Vec::new();
    for slot in &template.slots {
        let Some(id) = pattern.role(&slot.role) else {
            trace!(role = %slot.role, "Role not mapped, skipping slot");
            continue;
        };
        let Some(size) = sizes.get(id) else {
            trace!(role = %slot.role, id, "No measured size, skipping slot");
            continue;
        };
        let center = scale(RelativePoint {
            x: slot.x,
            y: slot.y,
        });
        let rect = Rect::centered_at(center, *size);
        boxes.insert(id, rect);
        nodes.push(NodeBox::new(id, rect));
    }

    let mut edges = Vec::new();
    for edge in &template.edges {
        let endpoints = pattern
            .role(&edge.from)
            .zip(pattern.role(&edge.to))
            .and_then(|(from, to)| Some((from, to, boxes.get(from)?, boxes.get(to)?)));
        let Some((from, to, source, target)) = endpoints else {
            continue;
        };

        let middle: Vec<Point> = edge.waypoints.iter().map(|&p| scale(p)).collect();
        let start = endpoint(source, target, middle.first().copied());
        let end = endpoint(target, source, middle.last().copied());

        let mut points = Vec::with_capacity(middle.len() + 4);
        points.push(start.0);
        match (middle.first(), middle.last()) {
            (Some(&first), Some(&last)) => {
                points.push(elbow(start, first));
                points.extend(middle.iter().copied());
                points.push(elbow(end, last));
            }
            _ => points.extend(connect(start, end)),
        }
        points.push(end.0);
        let waypoints = simplify_path(points);

        let anchor = path_label_anchor(&waypoints);
        edges.push(EdgeLayout {
            from: from.to_string(),
            to: to.to_string(),
            waypoints,
            label_x: anchor.x,
            label_y: anchor.y,
        });
    }

    let decorators = template
        .decorators
        .iter()
        .filter(|d| match &d.role {
            Some(role) => pattern.role(role).is_some_and(|id| boxes.contains_key(id)),
            None => true,
        })
        .map(|d| {
            let origin = scale(RelativePoint { x: d.x, y: d.y });
            DecoratorBox {
                kind: d.kind.clone(),
                x: origin.x,
                y: origin.y,
                width: (d.width * width as f64).round() as i32,
                height: (d.height * height as f64).round() as i32,
                style: d.style.clone(),
            }
        })
        .collect::<Vec<_>>();

    let mut applied = AppliedLayout {
        template: template.name.clone(),
        nodes,
        edges,
        decorators,
        width,
        height,
    };
    applied.normalize();
    debug!(
        nodes = applied.nodes.len(),
        edges = applied.edges.len(),
        decorators = applied.decorators.len(),
        "Pattern applied"
    );
    applied
}

/// Where the ray from the centre of `rect` toward `toward` leaves the box
pub fn boundary_point(rect: &Rect, toward: Point) -> Point {
    boundary_exit(rect, toward).0
}

/// Like [`boundary_point`], also naming the side the ray leaves through
pub fn boundary_exit(rect: &Rect, toward: Point) -> (Point, Side) {
    let center = rect.center();
    let dx = (toward.x - center.x) as f64;
    let dy = (toward.y - center.y) as f64;
    if dx == 0.0 && dy == 0.0 {
        return (center, Side::Bottom);
    }

    let half_w = rect.width as f64 / 2.0;
    let half_h = rect.height as f64 / 2.0;
    // Leaves through a vertical side when the ray is flatter than the box diagonal
    if dx.abs() * half_h > dy.abs() * half_w {
        let x = center.x as f64 + half_w * dx.signum();
        let y = center.y as f64 + dy * half_w / dx.abs();
        let side = if dx > 0.0 { Side::Right } else { Side::Left };
        (Point::new(x.round() as i32, y.round() as i32), side)
    } else {
        let y = center.y as f64 + half_h * dy.signum();
        let x = center.x as f64 + dx * half_h / dy.abs();
        let side = if dy > 0.0 { Side::Bottom } else { Side::Top };
        (Point::new(x.round() as i32, y.round() as i32), side)
    }
}

/// Boundary crossing of `rect` nearest the opposite node
///
/// When the elbow toward the adjacent waypoint would cut back through either
/// box, the edge leaves facing the waypoint instead.
fn endpoint(rect: &Rect, opposite: &Rect, adjacent: Option<Point>) -> (Point, Side) {
    let exit = boundary_exit(rect, opposite.center());
    let Some(adjacent) = adjacent else {
        return exit;
    };
    let leg = [exit.0, elbow(exit, adjacent), adjacent];
    if path_intersects_any(&leg, &[*rect, *opposite], 0) {
        trace!(?exit, "Leg to waypoint crosses a node, facing the waypoint");
        return boundary_exit(rect, adjacent);
    }
    exit
}

/// Corner leaving `point` square to its side and lined up with `toward`
fn elbow((point, side): (Point, Side), toward: Point) -> Point {
    if side.is_horizontal_edge() {
        Point::new(point.x, toward.y)
    } else {
        Point::new(toward.x, point.y)
    }
}

/// Corners joining two boundary points with no waypoints between them
fn connect((s, s_side): (Point, Side), (e, e_side): (Point, Side)) -> Vec<Point> {
    match (s_side.is_horizontal_edge(), e_side.is_horizontal_edge()) {
        (true, true) => {
            let mid = (s.y + e.y) / 2;
            vec![Point::new(s.x, mid), Point::new(e.x, mid)]
        }
        (false, false) => {
            let mid = (s.x + e.x) / 2;
            vec![Point::new(mid, s.y), Point::new(mid, e.y)]
        }
        (true, false) => vec![Point::new(s.x, e.y)],
        (false, true) => vec![Point::new(e.x, s.y)],
    }
}
