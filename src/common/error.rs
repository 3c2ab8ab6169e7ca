//! Error types for rust_rrt_star

use thiserror::Error;

/// Main error type for the planner
#[derive(Error, Debug)]
pub enum PlannerError {
    /// A configuration value was rejected at the boundary
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
    /// The operation is not allowed in the planner's current state
    #[error("Invalid state: {0}")]
    InvalidState(String),
    /// Planning finished without reaching the goal
    #[error("Planning error: {0}")]
    PlanningError(String),
    /// Configuration text could not be parsed
    #[error("Config error: {0}")]
    ConfigError(#[from] toml::de::Error),
    /// I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
    /// Visualization error
    #[error("Visualization error: {0}")]
    VisualizationError(String),
}

/// Result type alias for planner operations
pub type PlannerResult<T> = Result<T, PlannerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PlannerError::InvalidParameter("step_size must be positive".to_string());
        assert_eq!(format!("{}", err), "Invalid parameter: step_size must be positive");
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: PlannerError = io_err.into();
        assert!(matches!(err, PlannerError::IoError(_)));
    }
}
