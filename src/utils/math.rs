//! # Grid Mathematics
//!
//! Integer distance and interval helpers shared by placement and pathfinding.

use crate::GridPosition;

/// Cost of one straight step between adjacent cells.
pub const STRAIGHT_STEP_COST: i32 = 10;

/// Cost of one diagonal step between adjacent cells.
pub const DIAGONAL_STEP_COST: i32 = 14;

/// Integer octile distance between two cells.
///
/// Diagonal moves cost 14 and straight moves 10, an integer stand-in for
/// 1 and the square root of 2.
///
/// # Examples
///
/// ```
/// use delve::{octile_distance, GridPosition};
///
/// let a = GridPosition::new(0, 0);
/// assert_eq!(octile_distance(a, GridPosition::new(1, 1)), 14);
/// assert_eq!(octile_distance(a, GridPosition::new(0, 1)), 10);
/// assert_eq!(octile_distance(a, GridPosition::new(2, 5)), 2 * 14 + 3 * 10);
/// ```
pub fn octile_distance(a: GridPosition, b: GridPosition) -> i32 {
    let dx = (a.x - b.x).abs();
    let dy = (a.y - b.y).abs();
    let diagonal = dx.min(dy);
    let straight = dx.max(dy) - diagonal;
    DIAGONAL_STEP_COST * diagonal + STRAIGHT_STEP_COST * straight
}

/// Whether the closed intervals `[min1, max1]` and `[min2, max2]` intersect.
///
/// # Examples
///
/// ```
/// use delve::intervals_overlap;
///
/// assert!(intervals_overlap(0, 4, 4, 8));
/// assert!(!intervals_overlap(0, 4, 5, 8));
/// ```
pub fn intervals_overlap(min1: i32, max1: i32, min2: i32, max2: i32) -> bool {
    min1.max(min2) <= max1.min(max2)
}
