//! Utility modules for rust_rrt_star

pub mod visualization;

pub use visualization::{Visualizer, PathStyle, PointStyle, colors};
