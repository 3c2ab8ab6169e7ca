//! Common types, traits, and error definitions for rust_rrt_star
//!
//! This module provides the foundational building blocks shared by the
//! planner, its geometry helpers and the visualization utilities.

pub mod types;
pub mod traits;
pub mod error;

pub use types::*;
pub use traits::*;
pub use error::*;
