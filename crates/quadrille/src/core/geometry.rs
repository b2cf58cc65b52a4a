//! Geometry primitives for layout and routing
//!
//! Integer device-pixel points and rectangles plus the intersection tests
//! the router relies on. Everything here is a pure function.

use serde::{Deserialize, Serialize};

/// Absolute value of an integer coordinate delta
pub fn abs_i(v: i32) -> i32 {
    v.abs()
}

pub fn min_i(a: i32, b: i32) -> i32 {
    a.min(b)
}

pub fn max_i(a: i32, b: i32) -> i32 {
    a.max(b)
}

/// Square root, clamped to zero for negative input
pub fn sqrt_f(v: f64) -> f64 {
    if v <= 0.0 {
        0.0
    } else {
        v.sqrt()
    }
}

/// A point in device pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point
    pub fn distance(&self, other: &Point) -> f64 {
        let dx = f64::from(other.x - self.x);
        let dy = f64::from(other.y - self.y);
        sqrt_f(dx * dx + dy * dy)
    }

    /// Shift by a delta
    pub fn offset(&self, dx: i32, dy: i32) -> Point {
        Point::new(self.x + dx, self.y + dy)
    }
}

/// Width and height in device pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: i32,
    pub height: i32,
}

impl Size {
    pub fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }
}

/// An axis-aligned rectangle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Rectangle of the given size centered on a point
    pub fn centered_at(center: Point, size: Size) -> Self {
        Self::new(
            center.x - size.width / 2,
            center.y - size.height / 2,
            size.width,
            size.height,
        )
    }

    pub fn right(&self) -> i32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.height
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2, self.y + self.height / 2)
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// Grow the rectangle by `margin` on every side
    pub fn expand(&self, margin: i32) -> Rect {
        Rect::new(
            self.x - margin,
            self.y - margin,
            self.width + margin * 2,
            self.height + margin * 2,
        )
    }

    /// Smallest rectangle enclosing both
    pub fn union(&self, other: &Rect) -> Rect {
        let x = min_i(self.x, other.x);
        let y = min_i(self.y, other.y);
        let right = max_i(self.right(), other.right());
        let bottom = max_i(self.bottom(), other.bottom());
        Rect::new(x, y, right - x, bottom - y)
    }

    /// True when the point lies strictly inside the rectangle
    pub fn contains_strict(&self, p: Point) -> bool {
        p.x > self.x && p.x < self.right() && p.y > self.y && p.y < self.bottom()
    }

    /// True when the point lies inside or on the boundary
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.x <= self.right() && p.y >= self.y && p.y <= self.bottom()
    }

    /// True when the interiors overlap
    pub fn intersects(&self, other: &Rect) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }

    /// Translate by a delta
    pub fn offset(&self, dx: i32, dy: i32) -> Rect {
        Rect::new(self.x + dx, self.y + dy, self.width, self.height)
    }

    fn corners(&self) -> [Point; 4] {
        [
            Point::new(self.x, self.y),
            Point::new(self.right(), self.y),
            Point::new(self.right(), self.bottom()),
            Point::new(self.x, self.bottom()),
        ]
    }
}

/// Union bounding box of a set of rectangles
pub fn bounding_box<'a>(rects: impl IntoIterator<Item = &'a Rect>) -> Option<Rect> {
    rects
        .into_iter()
        .fold(None, |acc: Option<Rect>, r| match acc {
            None => Some(*r),
            Some(b) => Some(b.union(r)),
        })
}

fn cross(o: Point, a: Point, b: Point) -> i64 {
    let (ox, oy) = (i64::from(o.x), i64::from(o.y));
    (i64::from(a.x) - ox) * (i64::from(b.y) - oy) - (i64::from(a.y) - oy) * (i64::from(b.x) - ox)
}

fn on_segment(a: Point, b: Point, p: Point) -> bool {
    p.x >= min_i(a.x, b.x) && p.x <= max_i(a.x, b.x) && p.y >= min_i(a.y, b.y) && p.y <= max_i(a.y, b.y)
}

/// Proper or touching intersection of two segments
pub fn segments_intersect(a1: Point, a2: Point, b1: Point, b2: Point) -> bool {
    let d1 = cross(b1, b2, a1);
    let d2 = cross(b1, b2, a2);
    let d3 = cross(a1, a2, b1);
    let d4 = cross(a1, a2, b2);

    if ((d1 > 0 && d2 < 0) || (d1 < 0 && d2 > 0)) && ((d3 > 0 && d4 < 0) || (d3 < 0 && d4 > 0)) {
        return true;
    }

    (d1 == 0 && on_segment(b1, b2, a1))
        || (d2 == 0 && on_segment(b1, b2, a2))
        || (d3 == 0 && on_segment(a1, a2, b1))
        || (d4 == 0 && on_segment(a1, a2, b2))
}

/// Test whether segment `a`–`b` crosses `rect` grown by `margin`.
///
/// Axis-aligned segments are tested against the open interior of the grown
/// rectangle, so a segment running exactly along the grown boundary is
/// clear. Any other segment falls back to explicit edge intersection.
pub fn segment_intersects_rect(a: Point, b: Point, rect: &Rect, margin: i32) -> bool {
    let r = rect.expand(margin);

    if a.x == b.x || a.y == b.y {
        let seg_left = min_i(a.x, b.x);
        let seg_right = max_i(a.x, b.x);
        let seg_top = min_i(a.y, b.y);
        let seg_bottom = max_i(a.y, b.y);

        if a.y == b.y {
            return a.y > r.y && a.y < r.bottom() && seg_right > r.x && seg_left < r.right();
        }
        return a.x > r.x && a.x < r.right() && seg_bottom > r.y && seg_top < r.bottom();
    }

    if r.contains_strict(a) || r.contains_strict(b) {
        return true;
    }
    let c = r.corners();
    (0..4).any(|i| segments_intersect(a, b, c[i], c[(i + 1) % 4]))
}

/// True when every consecutive pair of points differs in at most one coordinate
pub fn path_is_orthogonal(points: &[Point]) -> bool {
    points.windows(2).all(|w| w[0].x == w[1].x || w[0].y == w[1].y)
}

/// True when any segment of the path crosses any obstacle
pub fn path_intersects_any(points: &[Point], obstacles: &[Rect], margin: i32) -> bool {
    points.windows(2).any(|w| {
        obstacles
            .iter()
            .any(|o| segment_intersects_rect(w[0], w[1], o, margin))
    })
}

/// Drop consecutive duplicate points
pub fn dedup_points(points: Vec<Point>) -> Vec<Point> {
    let mut out: Vec<Point> = Vec::with_capacity(points.len());
    for p in points {
        if out.last() != Some(&p) {
            out.push(p);
        }
    }
    out
}

/// Drop duplicates and the middle point of any three that share an axis
pub fn simplify_path(points: Vec<Point>) -> Vec<Point> {
    let mut out: Vec<Point> = Vec::with_capacity(points.len());
    for p in dedup_points(points) {
        while out.len() >= 2 {
            let (a, b) = (out[out.len() - 2], out[out.len() - 1]);
            let collinear = (a.x == b.x && b.x == p.x) || (a.y == b.y && b.y == p.y);
            if !collinear {
                break;
            }
            out.pop();
        }
        if out.last() != Some(&p) {
            out.push(p);
        }
    }
    out
}

/// Midpoint of the middle segment of a path, used for label anchors
pub fn path_label_anchor(points: &[Point]) -> Point {
    match points.len() {
        0 => Point::default(),
        1 => points[0],
        n => {
            let i = (n - 2) / 2;
            let (a, b) = (points[i], points[i + 1]);
            Point::new((a.x + b.x) / 2, (a.y + b.y) / 2)
        }
    }
}
