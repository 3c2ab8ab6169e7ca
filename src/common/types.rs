//! Common types used throughout rust_rrt_star

use std::f64::consts::PI;

use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

/// 2D point representation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point2D {
    pub x: f64,
    pub y: f64,
}

impl Point2D {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn origin() -> Self {
        Self { x: 0.0, y: 0.0 }
    }

    pub fn distance(&self, other: &Point2D) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }

    pub fn to_vector(&self) -> Vector2<f64> {
        Vector2::new(self.x, self.y)
    }
}

impl From<(f64, f64)> for Point2D {
    fn from(tuple: (f64, f64)) -> Self {
        Self { x: tuple.0, y: tuple.1 }
    }
}

impl From<Vector2<f64>> for Point2D {
    fn from(v: Vector2<f64>) -> Self {
        Self { x: v[0], y: v[1] }
    }
}

/// 2D pose (position + orientation)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose2D {
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub yaw: f64,
}

impl Pose2D {
    pub fn new(x: f64, y: f64, yaw: f64) -> Self {
        Self { x, y, yaw }
    }

    pub fn origin() -> Self {
        Self { x: 0.0, y: 0.0, yaw: 0.0 }
    }

    pub fn position(&self) -> Point2D {
        Point2D::new(self.x, self.y)
    }
}

/// Wrap an angle into [0, 2pi).
pub fn mod2pi(theta: f64) -> f64 {
    let v = theta.rem_euclid(2.0 * PI);
    // rem_euclid can round up to exactly 2pi for tiny negative inputs
    if v >= 2.0 * PI {
        0.0
    } else {
        v
    }
}

/// A point in the planning space, with a heading when the motion model needs one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Configuration {
    pub position: Point2D,
    pub heading: Option<f64>,
}

impl Configuration {
    /// Position-only configuration for holonomic planning.
    pub fn point(x: f64, y: f64) -> Self {
        Self {
            position: Point2D::new(x, y),
            heading: None,
        }
    }

    /// Oriented configuration; the heading is normalized to [0, 2pi).
    pub fn oriented(x: f64, y: f64, heading: f64) -> Self {
        Self {
            position: Point2D::new(x, y),
            heading: Some(mod2pi(heading)),
        }
    }

    pub fn from_pose(pose: Pose2D, with_heading: bool) -> Self {
        if with_heading {
            Self::oriented(pose.x, pose.y, pose.yaw)
        } else {
            Self::point(pose.x, pose.y)
        }
    }

    /// Pose view; a missing heading reads as zero.
    pub fn pose(&self) -> Pose2D {
        Pose2D::new(self.position.x, self.position.y, self.heading.unwrap_or(0.0))
    }
}

impl From<Point2D> for Configuration {
    fn from(position: Point2D) -> Self {
        Self {
            position,
            heading: None,
        }
    }
}

/// Path represented as a sequence of 2D points
#[derive(Debug, Clone)]
pub struct Path2D {
    pub points: Vec<Point2D>,
}

impl Path2D {
    pub fn new() -> Self {
        Self { points: Vec::new() }
    }

    pub fn from_points(points: Vec<Point2D>) -> Self {
        Self { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first(&self) -> Option<&Point2D> {
        self.points.first()
    }

    pub fn last(&self) -> Option<&Point2D> {
        self.points.last()
    }

    pub fn total_length(&self) -> f64 {
        if self.points.len() < 2 {
            return 0.0;
        }
        self.points.windows(2)
            .map(|w| w[0].distance(&w[1]))
            .sum()
    }
}

impl Default for Path2D {
    fn default() -> Self {
        Self::new()
    }
}
