//! Axis-aligned rectangular obstacles with clearance-inflated segment queries

use std::f64::consts::PI;

use itertools::Itertools;

use crate::common::{mod2pi, Point2D};

/// Angular slack when deciding whether a circle point lies on an arc.
const ARC_EPS: f64 = 1e-12;

/// Axis-aligned rectangle, stored with ordered corners
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RectObstacle {
    pub min: Point2D,
    pub max: Point2D,
}

impl RectObstacle {
    /// Build from two opposite corners given in any order.
    pub fn from_corners(a: Point2D, b: Point2D) -> Self {
        RectObstacle {
            min: Point2D::new(a.x.min(b.x), a.y.min(b.y)),
            max: Point2D::new(a.x.max(b.x), a.y.max(b.y)),
        }
    }

    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    /// Rectangle grown outward by `margin` on every side.
    pub fn inflated(&self, margin: f64) -> RectObstacle {
        RectObstacle {
            min: Point2D::new(self.min.x - margin, self.min.y - margin),
            max: Point2D::new(self.max.x + margin, self.max.y + margin),
        }
    }

    pub fn contains(&self, p: &Point2D) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }

    /// Liang-Barsky clip of segment p-q against the closed rectangle.
    pub fn intersects_segment(&self, p: &Point2D, q: &Point2D) -> bool {
        let dx = q.x - p.x;
        let dy = q.y - p.y;
        let mut t_enter = 0.0_f64;
        let mut t_exit = 1.0_f64;

        let edges = [
            (-dx, p.x - self.min.x),
            (dx, self.max.x - p.x),
            (-dy, p.y - self.min.y),
            (dy, self.max.y - p.y),
        ];

        for &(pk, qk) in &edges {
            if pk == 0.0 {
                // parallel to this edge and outside of it
                if qk < 0.0 {
                    return false;
                }
            } else {
                let r = qk / pk;
                if pk < 0.0 {
                    if r > t_exit {
                        return false;
                    }
                    t_enter = t_enter.max(r);
                } else {
                    if r < t_enter {
                        return false;
                    }
                    t_exit = t_exit.min(r);
                }
            }
        }

        t_enter <= t_exit
    }

    /// Corners in counter-clockwise order starting at `min`.
    pub fn corners(&self) -> [Point2D; 4] {
        [
            self.min,
            Point2D::new(self.max.x, self.min.y),
            self.max,
            Point2D::new(self.min.x, self.max.y),
        ]
    }

    /// Whether the circular arc around `center` touches the closed rectangle.
    ///
    /// The arc starts at `start_angle` and sweeps `sweep` radians,
    /// counter-clockwise when positive.
    pub fn intersects_arc(&self, center: &Point2D, radius: f64, start_angle: f64, sweep: f64) -> bool {
        let at = |angle: f64| {
            Point2D::new(center.x + radius * angle.cos(), center.y + radius * angle.sin())
        };
        if self.contains(&at(start_angle)) || self.contains(&at(start_angle + sweep)) {
            return true;
        }

        // with both ends outside, the arc can only reach the rectangle across its boundary
        let on_arc = |p: &Point2D| {
            let angle = (p.y - center.y).atan2(p.x - center.x);
            let offset = if sweep >= 0.0 {
                mod2pi(angle - start_angle)
            } else {
                mod2pi(start_angle - angle)
            };
            offset <= sweep.abs() + ARC_EPS || offset >= 2.0 * PI - ARC_EPS
        };
        self.corners()
            .iter()
            .circular_tuple_windows()
            .any(|(a, b)| circle_segment_points(center, radius, a, b).iter().any(|p| on_arc(p)))
    }
}

/// Points where segment a-b meets the circle of `radius` around `center`.
fn circle_segment_points(center: &Point2D, radius: f64, a: &Point2D, b: &Point2D) -> Vec<Point2D> {
    let d = b.to_vector() - a.to_vector();
    let f = a.to_vector() - center.to_vector();
    let qa = d.dot(&d);
    if qa == 0.0 {
        return if (f.norm() - radius).abs() <= ARC_EPS {
            vec![*a]
        } else {
            Vec::new()
        };
    }

    let qb = 2.0 * f.dot(&d);
    let qc = f.dot(&f) - radius * radius;
    let disc = qb * qb - 4.0 * qa * qc;
    if disc < 0.0 {
        return Vec::new();
    }
    let root = disc.sqrt();
    [(-qb - root) / (2.0 * qa), (-qb + root) / (2.0 * qa)]
        .iter()
        .filter(|&&t| (0.0..=1.0).contains(&t))
        .map(|&t| Point2D::from(a.to_vector() + d * t))
        .collect()
}

/// The set of obstacles the planner must avoid.
///
/// The clearance margin approximates the robot footprint and is applied on
/// every query; stored rectangles are never modified by it.
#[derive(Debug, Clone, Default)]
pub struct ObstacleField {
    obstacles: Vec<RectObstacle>,
    clearance: f64,
}

impl ObstacleField {
    pub fn new(clearance: f64) -> Self {
        ObstacleField {
            obstacles: Vec::new(),
            clearance,
        }
    }

    pub fn clearance(&self) -> f64 {
        self.clearance
    }

    pub fn set_clearance(&mut self, clearance: f64) {
        self.clearance = clearance;
    }

    /// Append a rectangle given by two opposite corners in any order.
    pub fn add_obstacle(&mut self, corner_a: Point2D, corner_b: Point2D) {
        self.obstacles.push(RectObstacle::from_corners(corner_a, corner_b));
    }

    pub fn obstacles(&self) -> &[RectObstacle] {
        &self.obstacles
    }

    pub fn len(&self) -> usize {
        self.obstacles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.obstacles.is_empty()
    }

    pub fn clear(&mut self) {
        self.obstacles.clear();
    }

    /// True iff segment p-q touches any clearance-inflated rectangle.
    pub fn is_segment_in_obstacle(&self, p: &Point2D, q: &Point2D) -> bool {
        self.obstacles
            .iter()
            .any(|obs| obs.inflated(self.clearance).intersects_segment(p, q))
    }

    /// True iff the arc touches any clearance-inflated rectangle.
    pub fn is_arc_in_obstacle(&self, center: &Point2D, radius: f64, start_angle: f64, sweep: f64) -> bool {
        self.obstacles
            .iter()
            .any(|obs| obs.inflated(self.clearance).intersects_arc(center, radius, start_angle, sweep))
    }

    /// Polyline variant for sampled point sequences.
    pub fn is_path_in_obstacle(&self, points: &[Point2D]) -> bool {
        match points {
            [] => false,
            [single] => self.contains_point(single),
            _ => points
                .iter()
                .tuple_windows()
                .any(|(p, q)| self.is_segment_in_obstacle(p, q)),
        }
    }

    pub fn contains_point(&self, p: &Point2D) -> bool {
        self.obstacles
            .iter()
            .any(|obs| obs.inflated(self.clearance).contains(p))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field_with_box() -> ObstacleField {
        let mut field = ObstacleField::new(1.0);
        // corners deliberately given in reverse order
        field.add_obstacle(Point2D::new(12.0, 12.0), Point2D::new(8.0, 8.0));
        field
    }

    #[test]
    fn test_corners_are_ordered() {
        let rect = RectObstacle::from_corners(Point2D::new(5.0, 1.0), Point2D::new(2.0, 4.0));
        assert_eq!(rect.min, Point2D::new(2.0, 1.0));
        assert_eq!(rect.max, Point2D::new(5.0, 4.0));
        assert!((rect.width() - 3.0).abs() < 1e-12);
        assert!((rect.height() - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_segment_through_obstacle() {
        let field = field_with_box();
        assert!(field.is_segment_in_obstacle(&Point2D::new(0.0, 10.0), &Point2D::new(20.0, 10.0)));
        assert!(field.is_segment_in_obstacle(&Point2D::new(10.0, 0.0), &Point2D::new(10.0, 20.0)));
        // diagonal crossing
        assert!(field.is_segment_in_obstacle(&Point2D::new(0.0, 0.0), &Point2D::new(20.0, 20.0)));
    }

    #[test]
    fn test_segment_inside_obstacle() {
        let field = field_with_box();
        assert!(field.is_segment_in_obstacle(&Point2D::new(9.0, 9.0), &Point2D::new(11.0, 11.0)));
    }

    #[test]
    fn test_segment_clear_of_obstacle() {
        let field = field_with_box();
        assert!(!field.is_segment_in_obstacle(&Point2D::new(0.0, 0.0), &Point2D::new(20.0, 0.0)));
        assert!(!field.is_segment_in_obstacle(&Point2D::new(0.0, 0.0), &Point2D::new(5.0, 5.0)));
        // stops short of the inflated edge at x = 7
        assert!(!field.is_segment_in_obstacle(&Point2D::new(0.0, 10.0), &Point2D::new(6.9, 10.0)));
    }

    #[test]
    fn test_clearance_inflates_obstacle() {
        let field = field_with_box();
        // passes 0.5 above the raw box, inside the 1.0 clearance
        assert!(field.is_segment_in_obstacle(&Point2D::new(0.0, 12.5), &Point2D::new(20.0, 12.5)));
        assert!(!field.is_segment_in_obstacle(&Point2D::new(0.0, 13.5), &Point2D::new(20.0, 13.5)));

        let mut tight = field.clone();
        tight.set_clearance(0.0);
        assert!(!tight.is_segment_in_obstacle(&Point2D::new(0.0, 12.5), &Point2D::new(20.0, 12.5)));
    }

    #[test]
    fn test_polyline_and_point_queries() {
        let field = field_with_box();
        let around = vec![
            Point2D::new(0.0, 0.0),
            Point2D::new(20.0, 0.0),
            Point2D::new(20.0, 20.0),
        ];
        assert!(!field.is_path_in_obstacle(&around));

        let through = vec![Point2D::new(0.0, 0.0), Point2D::new(0.0, 10.0), Point2D::new(20.0, 10.0)];
        assert!(field.is_path_in_obstacle(&through));

        assert!(field.contains_point(&Point2D::new(7.5, 10.0)));
        assert!(!field.contains_point(&Point2D::new(6.5, 10.0)));
        assert!(!field.is_path_in_obstacle(&[]));
    }

    #[test]
    fn test_arc_hits_only_on_its_sweep() {
        let center = Point2D::origin();
        let near_arc = |angle: f64| {
            let (sin, cos) = angle.sin_cos();
            RectObstacle::from_corners(
                Point2D::new(cos - 0.01, sin - 0.01),
                Point2D::new(cos + 0.01, sin + 0.01),
            )
        };

        // counter-clockwise quarter from angle 0 to pi/2
        assert!(near_arc(0.7).intersects_arc(&center, 1.0, 0.0, PI / 2.0));
        assert!(!near_arc(PI).intersects_arc(&center, 1.0, 0.0, PI / 2.0));
        // the same quarter traced clockwise
        assert!(near_arc(0.7).intersects_arc(&center, 1.0, PI / 2.0, -PI / 2.0));
        assert!(!near_arc(-0.7).intersects_arc(&center, 1.0, PI / 2.0, -PI / 2.0));

        // inside the chord region but off the arc
        let under_chord = RectObstacle::from_corners(Point2D::new(0.45, 0.45), Point2D::new(0.55, 0.55));
        assert!(under_chord.intersects_segment(&Point2D::new(1.0, 0.0), &Point2D::new(0.0, 1.0)));
        assert!(!under_chord.intersects_arc(&center, 1.0, 0.0, PI / 2.0));

        // an endpoint inside the rectangle
        let around_start = RectObstacle::from_corners(Point2D::new(0.9, -0.1), Point2D::new(1.1, 0.1));
        assert!(around_start.intersects_arc(&center, 1.0, 0.0, PI / 2.0));
    }

    #[test]
    fn test_arc_between_samples_is_checked() {
        let mut field = ObstacleField::new(0.0);
        // thin box that a left turn of radius 2 from (10, 10) clips below its chord
        field.add_obstacle(Point2D::new(10.48, 10.0), Point2D::new(10.51, 10.07));
        let center = Point2D::new(10.0, 12.0);
        let chord_end = Point2D::new(10.0 + 2.0 * 0.5_f64.sin(), 12.0 - 2.0 * 0.5_f64.cos());

        assert!(!field.is_segment_in_obstacle(&Point2D::new(10.0, 10.0), &chord_end));
        assert!(field.is_arc_in_obstacle(&center, 2.0, -PI / 2.0, 0.5));

        field.clear();
        assert!(!field.is_arc_in_obstacle(&center, 2.0, -PI / 2.0, 0.5));
    }

    #[test]
    fn test_clear() {
        let mut field = field_with_box();
        assert_eq!(field.len(), 1);
        field.clear();
        assert!(field.is_empty());
        assert!(!field.is_segment_in_obstacle(&Point2D::new(0.0, 10.0), &Point2D::new(20.0, 10.0)));
    }
}
