//! Common traits defining interfaces for planning algorithms

use crate::common::error::PlannerResult;
use crate::common::types::*;
use crate::path_planning::tree::Tree;

/// Trait for path planning algorithms
pub trait PathPlanner {
    /// Plan a path from start to goal
    fn plan(&self, start: Point2D, goal: Point2D) -> PlannerResult<Path2D>;
}

/// Trait for sampling-based path planning algorithms that expose their tree
pub trait SamplingBasedPlanner: PathPlanner {
    /// Get the tree built during planning
    fn tree(&self) -> &Tree;

    /// Set maximum iterations for planning
    fn set_max_iterations(&mut self, max_iter: usize) -> PlannerResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    // Test that traits compile correctly
    struct DummyPlanner;

    impl PathPlanner for DummyPlanner {
        fn plan(&self, start: Point2D, goal: Point2D) -> PlannerResult<Path2D> {
            Ok(Path2D::from_points(vec![start, goal]))
        }
    }

    #[test]
    fn test_path_planner_trait() {
        let planner = DummyPlanner;
        let result = planner.plan(Point2D::origin(), Point2D::new(1.0, 1.0));
        assert_eq!(result.unwrap().len(), 2);
    }
}
