//! # Game Module
//!
//! Grid geometry and the runtime room model shared by generation and pathfinding.
//!
//! This module contains the fundamental building blocks of a generated dungeon:
//! - Integer grid cells and doorway orientations
//! - The cell/world transform used at the pathfinding boundary
//! - Placed rooms and their doorways
//! - Per-room movement-penalty grids

pub mod movement_penalty;
pub mod room;

pub use movement_penalty::*;
pub use room::*;

use serde::{Deserialize, Serialize};

/// Represents a 2D integer cell on the dungeon grid.
///
/// The y axis grows northwards, matching tilemap coordinates.
///
/// # Examples
///
/// ```
/// use delve::GridPosition;
///
/// let pos = GridPosition::new(10, 5);
/// assert_eq!(pos.x, 10);
/// assert_eq!(pos.y, 5);
///
/// let neighbours = pos.neighbours();
/// assert_eq!(neighbours.len(), 8); // All 8 surrounding cells
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct GridPosition {
    pub x: i32,
    pub y: i32,
}

impl GridPosition {
    /// Creates a new grid position with the given coordinates.
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Returns the origin cell (0, 0).
    pub fn origin() -> Self {
        Self::new(0, 0)
    }

    /// Component-wise subtraction, or `None` if either axis overflows.
    ///
    /// # Examples
    ///
    /// ```
    /// use delve::GridPosition;
    ///
    /// let cell = GridPosition::new(12, 26);
    /// assert_eq!(cell.checked_sub(GridPosition::new(10, 20)), Some(GridPosition::new(2, 6)));
    /// assert_eq!(GridPosition::new(i32::MIN, 0).checked_sub(GridPosition::new(1, 0)), None);
    /// ```
    pub fn checked_sub(self, other: GridPosition) -> Option<GridPosition> {
        Some(Self::new(
            self.x.checked_sub(other.x)?,
            self.y.checked_sub(other.y)?,
        ))
    }

    /// Returns all 8 surrounding cells in x-major order.
    ///
    /// The order is the pathfinder's expansion order: x offset -1..=1 on the
    /// outside, y offset -1..=1 on the inside, skipping the cell itself.
    pub fn neighbours(self) -> Vec<GridPosition> {
        let mut cells = Vec::with_capacity(8);
        for dx in -1..=1 {
            for dy in -1..=1 {
                if dx == 0 && dy == 0 {
                    continue;
                }
                cells.push(GridPosition::new(self.x + dx, self.y + dy));
            }
        }
        cells
    }

    /// Chebyshev distance to another cell.
    ///
    /// # Examples
    ///
    /// ```
    /// use delve::GridPosition;
    ///
    /// let a = GridPosition::new(0, 0);
    /// let b = GridPosition::new(3, 5);
    /// assert_eq!(a.chebyshev_distance(b), 5);
    /// ```
    pub fn chebyshev_distance(self, other: GridPosition) -> u32 {
        (self.x - other.x).unsigned_abs().max((self.y - other.y).unsigned_abs())
    }
}

impl std::ops::Add for GridPosition {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self::new(self.x + other.x, self.y + other.y)
    }
}

impl std::ops::Sub for GridPosition {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        Self::new(self.x - other.x, self.y - other.y)
    }
}

impl std::fmt::Display for GridPosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Compass side a doorway opens on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Orientation {
    North,
    East,
    South,
    West,
    #[default]
    None,
}

impl Orientation {
    /// Returns the orientation a matching doorway must have.
    ///
    /// # Examples
    ///
    /// ```
    /// use delve::Orientation;
    ///
    /// assert_eq!(Orientation::North.opposite(), Orientation::South);
    /// assert_eq!(Orientation::East.opposite(), Orientation::West);
    /// assert_eq!(Orientation::None.opposite(), Orientation::None);
    /// ```
    pub fn opposite(self) -> Orientation {
        match self {
            Orientation::North => Orientation::South,
            Orientation::South => Orientation::North,
            Orientation::East => Orientation::West,
            Orientation::West => Orientation::East,
            Orientation::None => Orientation::None,
        }
    }

    /// Offset from a parent doorway to a child doorway with this orientation.
    ///
    /// A child whose doorway faces north sits one cell south of the parent's
    /// doorway, and so on around the compass.
    pub fn placement_offset(self) -> GridPosition {
        match self {
            Orientation::North => GridPosition::new(0, -1),
            Orientation::East => GridPosition::new(-1, 0),
            Orientation::South => GridPosition::new(0, 1),
            Orientation::West => GridPosition::new(1, 0),
            Orientation::None => GridPosition::origin(),
        }
    }

    /// True for north and south.
    pub fn is_north_south(self) -> bool {
        matches!(self, Orientation::North | Orientation::South)
    }

    /// True for east and west.
    pub fn is_east_west(self) -> bool {
        matches!(self, Orientation::East | Orientation::West)
    }

    /// Returns the 4 real compass orientations.
    pub fn cardinal() -> [Orientation; 4] {
        [
            Orientation::North,
            Orientation::East,
            Orientation::South,
            Orientation::West,
        ]
    }
}

/// A point in host world space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct WorldPosition {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl WorldPosition {
    /// Creates a new world position.
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Straight-line distance to another point.
    pub fn distance(self, other: WorldPosition) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }
}

/// Converts between grid cells and world positions.
///
/// The host supplies one of these per dungeon; the core only does integer
/// arithmetic and calls into the transform when emitting waypoints.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CellTransform {
    /// World position of cell (0, 0)'s lower-left corner
    pub origin: WorldPosition,
    /// Cell width (x) and height (y) in world units
    pub cell_size: (f32, f32),
}

impl CellTransform {
    /// Creates a transform with the given origin and cell size.
    pub fn new(origin: WorldPosition, cell_width: f32, cell_height: f32) -> Self {
        Self {
            origin,
            cell_size: (cell_width, cell_height),
        }
    }

    /// World position of a cell's lower-left corner.
    pub fn cell_to_world(&self, cell: GridPosition) -> WorldPosition {
        WorldPosition::new(
            self.origin.x + cell.x as f32 * self.cell_size.0,
            self.origin.y + cell.y as f32 * self.cell_size.1,
            self.origin.z,
        )
    }

    /// World position of a cell's centre, with z forced to 0.
    ///
    /// # Examples
    ///
    /// ```
    /// use delve::{CellTransform, GridPosition, WorldPosition};
    ///
    /// let transform = CellTransform::default();
    /// let centre = transform.cell_centre(GridPosition::new(2, 3));
    /// assert_eq!(centre, WorldPosition::new(2.5, 3.5, 0.0));
    /// ```
    pub fn cell_centre(&self, cell: GridPosition) -> WorldPosition {
        let corner = self.cell_to_world(cell);
        WorldPosition::new(
            corner.x + self.cell_size.0 * 0.5,
            corner.y + self.cell_size.1 * 0.5,
            0.0,
        )
    }

    /// Cell containing a world position.
    pub fn world_to_cell(&self, position: WorldPosition) -> GridPosition {
        GridPosition::new(
            ((position.x - self.origin.x) / self.cell_size.0).floor() as i32,
            ((position.y - self.origin.y) / self.cell_size.1).floor() as i32,
        )
    }
}

impl Default for CellTransform {
    fn default() -> Self {
        Self::new(WorldPosition::default(), 1.0, 1.0)
    }
}
