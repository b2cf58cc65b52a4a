//! Obstacle-aware orthogonal edge routing
//!
//! Routes are built from horizontal and vertical segments only. Shapes are
//! tried from simplest to most elaborate and the first clear one wins:
//!
//! 1. Direct: one straight segment
//! 2. Z: vertical-horizontal-vertical or horizontal-vertical-horizontal
//! 3. L: one bend
//! 4. U: around the bounding box of every obstacle
//! 5. Bypass: five segments wrapping the bounding box
//! 6. Fallback: unchecked Z through the midpoint
//!
//! Obstacles are grown by the routing margin before every test.

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::core::{
    abs_i, bounding_box, dedup_points, path_intersects_any, path_label_anchor, Point, Rect,
    RoutingConfig,
};

/// Which shape produced a route
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteStrategy {
    Direct,
    ZShape,
    LShape,
    UShape,
    Bypass,
    /// Unchecked path; may cross obstacles
    Fallback,
    /// Loop from a node back to itself
    SelfLoop,
}

/// A routed orthogonal path
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    pub points: Vec<Point>,
    pub strategy: RouteStrategy,
}

impl Route {
    fn new(points: Vec<Point>, strategy: RouteStrategy) -> Self {
        Self { points, strategy }
    }

    pub fn is_fallback(&self) -> bool {
        self.strategy == RouteStrategy::Fallback
    }

    pub fn start(&self) -> Option<Point> {
        self.points.first().copied()
    }

    pub fn end(&self) -> Option<Point> {
        self.points.last().copied()
    }

    /// Midpoint of the middle segment
    pub fn label_anchor(&self) -> Point {
        path_label_anchor(&self.points)
    }
}

/// Orthogonal router
#[derive(Debug, Clone)]
pub struct Router {
    margin: i32,
    z_fractions: Vec<f64>,
}

impl Default for Router {
    fn default() -> Self {
        Self::new(&RoutingConfig::default())
    }
}

/// Vertical-horizontal-vertical path bending at `y`
fn vhv(start: Point, end: Point, y: i32) -> Vec<Point> {
    dedup_points(vec![
        start,
        Point::new(start.x, y),
        Point::new(end.x, y),
        end,
    ])
}

/// Horizontal-vertical-horizontal path bending at `x`
fn hvh(start: Point, end: Point, x: i32) -> Vec<Point> {
    dedup_points(vec![
        start,
        Point::new(x, start.y),
        Point::new(x, end.y),
        end,
    ])
}

fn lerp(a: i32, b: i32, t: f64) -> i32 {
    (f64::from(a) + f64::from(b - a) * t).round() as i32
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Orientation {
    /// Bend coordinate is a y value
    Vhv,
    /// Bend coordinate is an x value
    Hvh,
}

impl Router {
    pub fn new(config: &RoutingConfig) -> Self {
        Self {
            margin: config.margin,
            z_fractions: config.z_fractions.clone(),
        }
    }

    pub fn with_margin(mut self, margin: i32) -> Self {
        self.margin = margin;
        self
    }

    pub fn margin(&self) -> i32 {
        self.margin
    }

    /// True when no segment of `points` crosses a grown obstacle
    pub fn is_clear(&self, points: &[Point], obstacles: &[Rect]) -> bool {
        !path_intersects_any(points, obstacles, self.margin)
    }

    fn accept(&self, points: Vec<Point>, obstacles: &[Rect], strategy: RouteStrategy) -> Option<Route> {
        if self.is_clear(&points, obstacles) {
            trace!(?strategy, points = points.len(), "Route candidate accepted");
            Some(Route::new(points, strategy))
        } else {
            trace!(?strategy, "Route candidate blocked");
            None
        }
    }

    /// Obstacles whose grown box overlaps the box spanned by the endpoints
    fn blockers<'a>(&self, start: Point, end: Point, obstacles: &'a [Rect]) -> Vec<&'a Rect> {
        let corridor = Rect::new(
            start.x.min(end.x),
            start.y.min(end.y),
            abs_i(end.x - start.x),
            abs_i(end.y - start.y),
        );
        obstacles
            .iter()
            .filter(|o| o.expand(self.margin).intersects(&corridor))
            .collect()
    }

    /// Bend coordinates for a Z route: fractions of the span, then escapes
    /// just outside each blocking obstacle, nearest to the span centre first
    fn z_candidates(&self, start: Point, end: Point, obstacles: &[Rect], orientation: Orientation) -> Vec<i32> {
        let (from, to) = match orientation {
            Orientation::Vhv => (start.y, end.y),
            Orientation::Hvh => (start.x, end.x),
        };

        let mut candidates: Vec<i32> = self
            .z_fractions
            .iter()
            .map(|&f| lerp(from, to, f))
            .collect();

        let clearance = self.margin * 2;
        let centre = lerp(from, to, 0.5);
        let mut escapes: Vec<i32> = self
            .blockers(start, end, obstacles)
            .into_iter()
            .flat_map(|o| match orientation {
                Orientation::Vhv => [o.y - clearance, o.bottom() + clearance],
                Orientation::Hvh => [o.x - clearance, o.right() + clearance],
            })
            .collect();
        escapes.sort_by_key(|&c| abs_i(c - centre));
        candidates.extend(escapes);

        let mut seen = Vec::with_capacity(candidates.len());
        candidates.retain(|c| {
            if seen.contains(c) {
                false
            } else {
                seen.push(*c);
                true
            }
        });
        candidates
    }

    fn try_z(&self, start: Point, end: Point, obstacles: &[Rect]) -> Option<Route> {
        let dominant = if abs_i(end.y - start.y) >= abs_i(end.x - start.x) {
            [Orientation::Vhv, Orientation::Hvh]
        } else {
            [Orientation::Hvh, Orientation::Vhv]
        };

        dominant.into_iter().find_map(|orientation| {
            self.z_candidates(start, end, obstacles, orientation)
                .into_iter()
                .find_map(|c| {
                    let points = match orientation {
                        Orientation::Vhv => vhv(start, end, c),
                        Orientation::Hvh => hvh(start, end, c),
                    };
                    self.accept(points, obstacles, RouteStrategy::ZShape)
                })
        })
    }

    fn try_l(&self, start: Point, end: Point, obstacles: &[Rect]) -> Option<Route> {
        [Point::new(start.x, end.y), Point::new(end.x, start.y)]
            .into_iter()
            .find_map(|corner| {
                self.accept(
                    dedup_points(vec![start, corner, end]),
                    obstacles,
                    RouteStrategy::LShape,
                )
            })
    }

    fn try_u(&self, start: Point, end: Point, obstacles: &[Rect], hull: &Rect) -> Option<Route> {
        let clearance = self.margin * 2;
        let candidates = [
            vhv(start, end, hull.y - clearance),
            vhv(start, end, hull.bottom() + clearance),
            hvh(start, end, hull.x - clearance),
            hvh(start, end, hull.right() + clearance),
        ];
        candidates
            .into_iter()
            .find_map(|points| self.accept(points, obstacles, RouteStrategy::UShape))
    }

    fn try_bypass(&self, start: Point, end: Point, obstacles: &[Rect], hull: &Rect) -> Option<Route> {
        let clearance = self.margin * 2;
        let above = hull.y - clearance;
        let below = hull.bottom() + clearance;
        let left = hull.x - clearance;
        let right = hull.right() + clearance;

        // Escape vertically, wrap one side of the hull, come back from the other vertical side
        let combos = [
            (above, left, below),
            (above, right, below),
            (below, left, above),
            (below, right, above),
        ];
        combos.into_iter().find_map(|(first_y, x, second_y)| {
            let points = dedup_points(vec![
                start,
                Point::new(start.x, first_y),
                Point::new(x, first_y),
                Point::new(x, second_y),
                Point::new(end.x, second_y),
                end,
            ]);
            self.accept(points, obstacles, RouteStrategy::Bypass)
        })
    }

    fn fallback(&self, start: Point, end: Point) -> Route {
        let points = if abs_i(end.y - start.y) >= abs_i(end.x - start.x) {
            vhv(start, end, lerp(start.y, end.y, 0.5))
        } else {
            hvh(start, end, lerp(start.x, end.x, 0.5))
        };
        debug!(?start, ?end, "No clear route, using fallback");
        Route::new(points, RouteStrategy::Fallback)
    }

    /// Route from `start` to `end` around `obstacles`.
    ///
    /// The obstacles must not include the boxes of the edge's own endpoints.
    /// Every route except `Fallback` is clear of every obstacle.
    pub fn route(&self, start: Point, end: Point, obstacles: &[Rect]) -> Route {
        trace!(?start, ?end, obstacles = obstacles.len(), "Routing edge");

        if start == end {
            return Route::new(vec![start, end], RouteStrategy::Direct);
        }

        if start.x == end.x || start.y == end.y {
            if let Some(route) = self.accept(vec![start, end], obstacles, RouteStrategy::Direct) {
                return route;
            }
        }

        if let Some(route) = self.try_z(start, end, obstacles) {
            return route;
        }
        if let Some(route) = self.try_l(start, end, obstacles) {
            return route;
        }

        if let Some(hull) = bounding_box(obstacles) {
            if let Some(route) = self.try_u(start, end, obstacles, &hull) {
                return route;
            }
            if let Some(route) = self.try_bypass(start, end, obstacles, &hull) {
                return route;
            }
        }

        self.fallback(start, end)
    }

    /// Route a convention-fixed edge: leave the source from its top, enter
    /// the target from its bottom.
    ///
    /// The bend height is picked from fractions of the vertical span, then
    /// from just outside each blocking obstacle (its bottom side first),
    /// and finally the unchecked midpoint.
    pub fn route_vertical_first(
        &self,
        source: &Rect,
        target: &Rect,
        source_offset: i32,
        target_offset: i32,
        obstacles: &[Rect],
    ) -> Route {
        let start = Point::new(source.center().x + source_offset, source.y);
        let end = Point::new(target.center().x + target_offset, target.bottom());

        if start.x == end.x {
            if let Some(route) = self.accept(vec![start, end], obstacles, RouteStrategy::Direct) {
                return route;
            }
        }

        let mut candidates: Vec<i32> = self
            .z_fractions
            .iter()
            .map(|&f| lerp(start.y, end.y, f))
            .collect();

        let clearance = self.margin * 2;
        let mut blockers = self.blockers(start, end, obstacles);
        blockers.sort_by_key(|o| abs_i(o.center().y - start.y));
        for o in blockers {
            candidates.push(o.bottom() + clearance);
            candidates.push(o.y - clearance);
        }

        for y in candidates {
            if let Some(route) = self.accept(vhv(start, end, y), obstacles, RouteStrategy::ZShape) {
                return route;
            }
        }

        debug!(?start, ?end, "Vertical-first route falling back to midpoint");
        Route::new(
            vhv(start, end, lerp(start.y, end.y, 0.5)),
            RouteStrategy::Fallback,
        )
    }

    /// Small loop off the right side of a node, for edges from a node to itself
    pub fn route_self_loop(&self, rect: &Rect) -> Route {
        let c = rect.center();
        let reach = self.margin * 4;
        let rise = (rect.height / 4).max(1);
        Route::new(
            vec![
                Point::new(rect.right(), c.y - rise),
                Point::new(rect.right() + reach, c.y - rise),
                Point::new(rect.right() + reach, c.y + rise),
                Point::new(rect.right(), c.y + rise),
            ],
            RouteStrategy::SelfLoop,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::path_is_orthogonal;

    fn router() -> Router {
        Router::default()
    }

    #[test]
    fn test_direct_route_without_obstacles() {
        let route = router().route(Point::new(50, 40), Point::new(50, 120), &[]);
        assert_eq!(route.strategy, RouteStrategy::Direct);
        assert_eq!(route.points, vec![Point::new(50, 40), Point::new(50, 120)]);
    }

    #[test]
    fn test_z_route_around_obstacle_on_shared_x() {
        let obstacle = Rect::new(80, 180, 40, 40);
        let route = router().route(Point::new(100, 100), Point::new(100, 300), &[obstacle]);

        assert_eq!(route.strategy, RouteStrategy::ZShape);
        assert_eq!(route.points.len(), 4);
        assert_eq!(route.start(), Some(Point::new(100, 100)));
        assert_eq!(route.end(), Some(Point::new(100, 300)));
        assert!(path_is_orthogonal(&route.points));
        assert!(!path_intersects_any(&route.points, &[obstacle], 5));
    }

    #[test]
    fn test_z_route_prefers_dominant_axis_midpoint() {
        let route = router().route(Point::new(0, 0), Point::new(40, 200), &[]);
        assert_eq!(route.strategy, RouteStrategy::ZShape);
        assert_eq!(
            route.points,
            vec![
                Point::new(0, 0),
                Point::new(0, 100),
                Point::new(40, 100),
                Point::new(40, 200)
            ]
        );
    }

    #[test]
    fn test_z_route_skips_blocked_midpoint() {
        // The obstacle sits on the 1/2 bend line but not on the 1/4 line
        let obstacle = Rect::new(10, 90, 20, 20);
        let route = router().route(Point::new(0, 0), Point::new(40, 200), &[obstacle]);
        assert_eq!(route.strategy, RouteStrategy::ZShape);
        assert_eq!(route.points[1], Point::new(0, 50));
        assert!(!path_intersects_any(&route.points, &[obstacle], 5));
    }

    #[test]
    fn test_u_route_when_z_and_l_blocked() {
        // Walls left and right of the corridor plus a block in the middle
        let obstacles = vec![
            Rect::new(-40, 40, 30, 120),
            Rect::new(50, 40, 30, 120),
            Rect::new(0, 40, 40, 120),
        ];
        let start = Point::new(0, 0);
        let end = Point::new(40, 200);
        let route = router().route(start, end, &obstacles);
        assert!(!route.is_fallback());
        assert!(path_is_orthogonal(&route.points));
        assert!(!path_intersects_any(&route.points, &obstacles, 5));
    }

    #[test]
    fn test_fallback_when_enclosed() {
        // Start is boxed in on every side
        let start = Point::new(100, 100);
        let obstacles = vec![
            Rect::new(60, 60, 80, 20),
            Rect::new(60, 120, 80, 20),
            Rect::new(60, 60, 20, 80),
            Rect::new(120, 60, 20, 80),
        ];
        let route = router().route(start, Point::new(400, 400), &obstacles);
        assert!(route.is_fallback());
        assert_eq!(route.start(), Some(start));
        assert_eq!(route.end(), Some(Point::new(400, 400)));
        assert!(path_is_orthogonal(&route.points));
    }

    #[test]
    fn test_route_is_deterministic() {
        let obstacles = vec![Rect::new(80, 180, 40, 40), Rect::new(0, 0, 10, 10)];
        let a = router().route(Point::new(100, 100), Point::new(160, 300), &obstacles);
        let b = router().route(Point::new(100, 100), Point::new(160, 300), &obstacles);
        assert_eq!(a, b);
    }

    #[test]
    fn test_identical_endpoints() {
        let p = Point::new(5, 5);
        let route = router().route(p, p, &[]);
        assert_eq!(route.points, vec![p, p]);
    }

    #[test]
    fn test_vertical_first_straight() {
        let child = Rect::new(0, 200, 100, 40);
        let parent = Rect::new(0, 0, 100, 40);
        let route = router().route_vertical_first(&child, &parent, 0, 0, &[]);
        assert_eq!(route.strategy, RouteStrategy::Direct);
        assert_eq!(route.points, vec![Point::new(50, 200), Point::new(50, 40)]);
    }

    #[test]
    fn test_vertical_first_bends_around_obstacle() {
        let child = Rect::new(0, 200, 100, 40);
        let parent = Rect::new(200, 0, 100, 40);
        // Blocks the half-way bend line but neither vertical leg
        let obstacle = Rect::new(120, 110, 60, 20);
        let route = router().route_vertical_first(&child, &parent, 0, 0, &[obstacle]);
        assert_ne!(route.strategy, RouteStrategy::Fallback);
        assert_eq!(route.start(), Some(Point::new(50, 200)));
        assert_eq!(route.end(), Some(Point::new(250, 40)));
        assert!(!path_intersects_any(&route.points, &[obstacle], 5));
    }

    #[test]
    fn test_self_loop_shape() {
        let route = router().route_self_loop(&Rect::new(0, 0, 40, 40));
        assert_eq!(route.strategy, RouteStrategy::SelfLoop);
        assert_eq!(route.points.len(), 4);
        assert!(path_is_orthogonal(&route.points));
    }

    #[test]
    fn test_label_anchor_on_middle_segment() {
        let route = router().route(Point::new(0, 0), Point::new(40, 200), &[]);
        assert_eq!(route.label_anchor(), Point::new(20, 100));
    }
}
