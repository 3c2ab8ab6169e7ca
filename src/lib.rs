//! rust_rrt_star - incremental RRT* motion planning in the plane
//!
//! This crate grows an asymptotically optimal tree of configurations from a
//! start pose toward a goal region while avoiding rectangular obstacles.
//! Steering is either straight-line (holonomic) or follows Dubins curves for
//! a vehicle with a minimum turning radius.

// Core modules
pub mod common;
pub mod utils;

// Algorithm modules
pub mod path_planning;

// Re-export common types for convenience
pub use common::{Configuration, Point2D, Pose2D, Path2D};
pub use common::{PathPlanner, SamplingBasedPlanner};
pub use common::{PlannerError, PlannerResult};
pub use path_planning::{RRTStar, RRTStarConfig, PlannerState, StepOutcome};
