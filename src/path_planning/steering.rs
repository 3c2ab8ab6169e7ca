//! Steering and cost model
//!
//! The planner is generic over a [`Steering`] strategy: the holonomic variant
//! moves in straight lines, the nonholonomic one follows Dubins curves. Both
//! accrue cost as Euclidean length between configurations.

use std::f64::consts::PI;

use rand::Rng;

use crate::common::{Configuration, PlannerError, PlannerResult, Point2D, Pose2D};
use crate::path_planning::dubins_path::{DubinsPath, PathPiece};
use crate::path_planning::obstacles::ObstacleField;

/// Euclidean distance between two positions.
pub fn distance(a: &Point2D, b: &Point2D) -> f64 {
    (a.to_vector() - b.to_vector()).norm()
}

/// Cost of travelling from one configuration to another.
pub fn path_cost(from: &Configuration, to: &Configuration) -> f64 {
    distance(&from.position, &to.position)
}

/// Point exactly `step_size` from `nearest` toward `target`.
///
/// Returns `None` when the two points coincide and no direction exists.
pub fn steer_straight(target: &Point2D, nearest: &Point2D, step_size: f64) -> Option<Point2D> {
    let direction = target.to_vector() - nearest.to_vector();
    let norm = direction.norm();
    if norm == 0.0 {
        return None;
    }
    Some(Point2D::from(nearest.to_vector() + direction * (step_size / norm)))
}

/// Motion model capabilities the planner depends on.
pub trait Steering {
    /// Whether configurations carry a heading that must be sampled.
    fn uses_heading(&self) -> bool;

    /// Candidate configuration `step_size` from `from` toward `toward`.
    fn steer(&self, from: &Configuration, toward: &Configuration, step_size: f64)
        -> Option<Configuration>;

    /// Edge curve from `from` to `to`, first point `from`, last point `to`.
    fn connect(&self, from: &Configuration, to: &Configuration) -> Option<Vec<Point2D>>;

    /// Exact collision test of the edge from `from` to `to`.
    fn is_edge_in_obstacle(&self, from: &Configuration, to: &Configuration, obstacles: &ObstacleField)
        -> bool;

    fn path_cost(&self, from: &Configuration, to: &Configuration) -> f64 {
        path_cost(from, to)
    }

    /// Draw a heading for a freshly sampled position.
    fn sample_heading<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<f64>
    where
        Self: Sized,
    {
        if self.uses_heading() {
            Some(rng.gen_range(0.0..2.0 * PI))
        } else {
            None
        }
    }
}

/// Holonomic straight-line steering
#[derive(Debug, Clone, Copy, Default)]
pub struct StraightLine;

impl Steering for StraightLine {
    fn uses_heading(&self) -> bool {
        false
    }

    fn steer(&self, from: &Configuration, toward: &Configuration, step_size: f64)
        -> Option<Configuration> {
        steer_straight(&toward.position, &from.position, step_size).map(Configuration::from)
    }

    fn connect(&self, from: &Configuration, to: &Configuration) -> Option<Vec<Point2D>> {
        Some(vec![from.position, to.position])
    }

    fn is_edge_in_obstacle(&self, from: &Configuration, to: &Configuration, obstacles: &ObstacleField)
        -> bool {
        obstacles.is_segment_in_obstacle(&from.position, &to.position)
    }
}

/// Curvature-constrained steering along Dubins paths
#[derive(Debug, Clone, Copy)]
pub struct DubinsSteering {
    turning_radius: f64,
    /// Arclength between curve samples used for collision checks and display
    resolution: f64,
}

impl DubinsSteering {
    pub fn new(turning_radius: f64, resolution: f64) -> PlannerResult<Self> {
        if !(turning_radius > 0.0) {
            return Err(PlannerError::InvalidParameter(format!(
                "turning_radius must be positive, got {}",
                turning_radius
            )));
        }
        if !(resolution > 0.0) {
            return Err(PlannerError::InvalidParameter(format!(
                "curve_resolution must be positive, got {}",
                resolution
            )));
        }
        Ok(DubinsSteering {
            turning_radius,
            resolution,
        })
    }

    pub fn turning_radius(&self) -> f64 {
        self.turning_radius
    }

    pub fn resolution(&self) -> f64 {
        self.resolution
    }

    /// Shortest path between two configurations, `None` when degenerate.
    pub fn path(&self, from: &Configuration, to: &Configuration) -> Option<DubinsPath> {
        DubinsPath::shortest(from.pose(), to.pose(), self.turning_radius)
            .ok()
            .filter(|path| !path.is_degenerate())
    }
}

impl Steering for DubinsSteering {
    fn uses_heading(&self) -> bool {
        true
    }

    fn steer(&self, from: &Configuration, toward: &Configuration, step_size: f64)
        -> Option<Configuration> {
        let path = self.path(from, toward)?;
        let pose: Pose2D = path.sample(step_size.min(path.length()))?;
        Some(Configuration::oriented(pose.x, pose.y, pose.yaw))
    }

    fn connect(&self, from: &Configuration, to: &Configuration) -> Option<Vec<Point2D>> {
        self.path(from, to).map(|path| path.points(self.resolution))
    }

    /// Checks every arc and line of the path itself, not the sampled curve.
    /// Degenerate edges count as blocked.
    fn is_edge_in_obstacle(&self, from: &Configuration, to: &Configuration, obstacles: &ObstacleField)
        -> bool {
        let path = match self.path(from, to) {
            Some(path) => path,
            None => return true,
        };
        path.pieces().iter().any(|piece| match *piece {
            PathPiece::Line { from, to } => obstacles.is_segment_in_obstacle(&from, &to),
            PathPiece::Arc { center, radius, start_angle, sweep } => {
                obstacles.is_arc_in_obstacle(&center, radius, start_angle, sweep)
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance_and_cost() {
        let a = Configuration::point(0.0, 0.0);
        let b = Configuration::oriented(3.0, 4.0, 1.0);
        assert!((distance(&a.position, &b.position) - 5.0).abs() < 1e-12);
        assert!((path_cost(&a, &b) - 5.0).abs() < 1e-12);
        assert!((DubinsSteering::new(1.0, 0.5).unwrap().path_cost(&a, &b) - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_steer_straight_exact_step() {
        let p = steer_straight(&Point2D::new(10.0, 0.0), &Point2D::new(1.0, 0.0), 3.0).unwrap();
        assert!((p.x - 4.0).abs() < 1e-12);
        assert!(p.y.abs() < 1e-12);

        // the step is taken even when the target is closer than step_size
        let q = steer_straight(&Point2D::new(0.0, 1.0), &Point2D::origin(), 3.0).unwrap();
        assert!((q.y - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_steer_straight_coincident() {
        let p = Point2D::new(2.0, 2.0);
        assert!(steer_straight(&p, &p, 3.0).is_none());
        assert!(StraightLine
            .steer(&Configuration::from(p), &Configuration::from(p), 3.0)
            .is_none());
    }

    #[test]
    fn test_straight_line_connect() {
        let a = Configuration::point(0.0, 0.0);
        let b = Configuration::point(1.0, 1.0);
        assert_eq!(StraightLine.connect(&a, &b).unwrap(), vec![a.position, b.position]);
        assert!(!StraightLine.uses_heading());
    }

    #[test]
    fn test_dubins_steer_moves_step_along_curve() {
        let steering = DubinsSteering::new(2.0, 0.5).unwrap();
        let from = Configuration::oriented(0.0, 0.0, 0.0);
        let toward = Configuration::oriented(20.0, 0.0, 0.0);
        let q = steering.steer(&from, &toward, 3.0).unwrap();
        assert!((q.position.x - 3.0).abs() < 1e-9);
        assert!(q.position.y.abs() < 1e-9);
        assert!(q.heading.unwrap().abs() < 1e-9);

        // on a curved path the chord is no longer than the step
        let turning = Configuration::oriented(-5.0, 5.0, PI);
        let q = steering.steer(&from, &turning, 3.0).unwrap();
        assert!(distance(&from.position, &q.position) <= 3.0 + 1e-9);
    }

    #[test]
    fn test_dubins_connect_ends_at_target() {
        let steering = DubinsSteering::new(1.0, 0.25).unwrap();
        let from = Configuration::oriented(0.0, 0.0, 0.0);
        let to = Configuration::oriented(3.0, 3.0, PI / 2.0);
        let points = steering.connect(&from, &to).unwrap();
        assert!(points.len() > 2);
        assert!(distance(&points[0], &from.position) < 1e-9);
        assert!(distance(points.last().unwrap(), &to.position) < 1e-6);
        assert!(steering.connect(&from, &from).is_none());
    }

    #[test]
    fn test_straight_edge_check() {
        let mut field = ObstacleField::new(0.0);
        field.add_obstacle(Point2D::new(4.0, -1.0), Point2D::new(5.0, 1.0));
        let from = Configuration::point(0.0, 0.0);
        assert!(StraightLine.is_edge_in_obstacle(&from, &Configuration::point(10.0, 0.0), &field));
        assert!(!StraightLine.is_edge_in_obstacle(&from, &Configuration::point(0.0, 10.0), &field));
    }

    #[test]
    fn test_dubins_edge_check_covers_arc_between_samples() {
        let steering = DubinsSteering::new(2.0, 1.0).unwrap();
        let from = Configuration::oriented(10.0, 10.0, 0.0);
        // three quarters along a left turn of one radian
        let to = Configuration::oriented(10.0 + 2.0 * 0.75_f64.sin(), 12.0 - 2.0 * 0.75_f64.cos(), 0.75);

        let mut field = ObstacleField::new(0.0);
        field.add_obstacle(Point2D::new(10.48, 10.0), Point2D::new(10.51, 10.07));

        // the sampled chords slip past the box, the arc does not
        let curve = steering.connect(&from, &to).unwrap();
        assert!(!field.is_path_in_obstacle(&curve));
        assert!(steering.is_edge_in_obstacle(&from, &to, &field));

        field.clear();
        assert!(!steering.is_edge_in_obstacle(&from, &to, &field));
        assert!(steering.is_edge_in_obstacle(&from, &from, &field));
    }

    #[test]
    fn test_dubins_steering_rejects_bad_parameters() {
        assert!(DubinsSteering::new(0.0, 1.0).is_err());
        assert!(DubinsSteering::new(1.0, 0.0).is_err());
    }
}
