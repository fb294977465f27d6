//! # Utilities Module
//!
//! Grid arithmetic and room-local pathfinding.

pub mod math;
pub mod pathfinding;

pub use self::math::*;
pub use self::pathfinding::*;
