// Path Planning algorithms module

pub mod obstacles;
pub mod steering;
pub mod dubins_path;
pub mod tree;
pub mod rrt_star;

pub use obstacles::*;
pub use steering::*;
pub use dubins_path::*;
pub use tree::*;
pub use rrt_star::*;
