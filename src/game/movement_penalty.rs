//! # Movement Penalties
//!
//! Per-room traversal cost grids read by the pathfinder.
//!
//! A cell value of 0 is impassable; any positive value is added to the cost of
//! stepping onto that cell, so lower values are preferred. The host paints the
//! grid from its collision tilemap once a room has been instantiated.

use crate::{DelveError, GenerationConfig, GridPosition, Room};
use serde::{Deserialize, Serialize};

/// Dense row-major grid of movement penalties indexed from (0, 0).
///
/// Deserializing rejects grids whose cell count is not `width * height`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawMovementPenaltyGrid")]
pub struct MovementPenaltyGrid {
    width: usize,
    height: usize,
    cells: Vec<u32>,
}

#[derive(Deserialize)]
struct RawMovementPenaltyGrid {
    width: usize,
    height: usize,
    cells: Vec<u32>,
}

impl TryFrom<RawMovementPenaltyGrid> for MovementPenaltyGrid {
    type Error = DelveError;

    fn try_from(raw: RawMovementPenaltyGrid) -> Result<Self, Self::Error> {
        if raw.width.checked_mul(raw.height) != Some(raw.cells.len()) {
            return Err(DelveError::InvalidState(format!(
                "Movement penalty grid is {}x{} but has {} cells",
                raw.width,
                raw.height,
                raw.cells.len()
            )));
        }

        Ok(Self {
            width: raw.width,
            height: raw.height,
            cells: raw.cells,
        })
    }
}

impl MovementPenaltyGrid {
    /// Creates a grid where every cell has the same penalty.
    ///
    /// # Examples
    ///
    /// ```
    /// use delve::{GridPosition, MovementPenaltyGrid};
    ///
    /// let grid = MovementPenaltyGrid::uniform(4, 3, 10);
    /// assert_eq!(grid.get(GridPosition::new(3, 2)), Some(10));
    /// assert_eq!(grid.get(GridPosition::new(4, 0)), None);
    /// ```
    pub fn uniform(width: usize, height: usize, penalty: u32) -> Self {
        Self {
            width,
            height,
            cells: vec![penalty; width * height],
        }
    }

    /// Builds a grid from rows listed bottom (y = 0) first.
    ///
    /// Returns `None` when the rows are ragged.
    pub fn from_rows(rows: &[Vec<u32>]) -> Option<Self> {
        let height = rows.len();
        let width = rows.first().map(Vec::len).unwrap_or(0);
        if rows.iter().any(|row| row.len() != width) {
            return None;
        }

        Some(Self {
            width,
            height,
            cells: rows.iter().flatten().copied().collect(),
        })
    }

    /// Number of columns.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Number of rows.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Whether a cell index lies inside the grid.
    pub fn in_bounds(&self, cell: GridPosition) -> bool {
        cell.x >= 0 && cell.y >= 0 && (cell.x as usize) < self.width && (cell.y as usize) < self.height
    }

    fn index(&self, cell: GridPosition) -> Option<usize> {
        if self.in_bounds(cell) {
            Some(cell.y as usize * self.width + cell.x as usize)
        } else {
            None
        }
    }

    /// Penalty of a cell, or `None` outside the grid.
    pub fn get(&self, cell: GridPosition) -> Option<u32> {
        self.index(cell).map(|index| self.cells[index])
    }

    /// Sets the penalty of a cell. Cells outside the grid are ignored.
    pub fn set(&mut self, cell: GridPosition, penalty: u32) {
        if let Some(index) = self.index(cell) {
            self.cells[index] = penalty;
        }
    }

    /// Whether a cell is inside the grid and passable.
    pub fn is_walkable(&self, cell: GridPosition) -> bool {
        self.get(cell).is_some_and(|penalty| penalty > 0)
    }

    /// Paints a room's penalties from its collision tiles.
    ///
    /// Every cell starts at the configured default penalty. Unwalkable tiles
    /// become 0 and preferred-path tiles get the preferred penalty. Doorways
    /// that were never connected are bricked up over their
    /// [`bricked_cells`](crate::Doorway::bricked_cells), so those cells are
    /// impassable regardless of what the layer reports.
    pub fn from_collision_layer<L: CollisionLayer + ?Sized>(
        room: &Room,
        layer: &L,
        config: &GenerationConfig,
    ) -> Self {
        let mut grid = Self::uniform(
            room.template_width(),
            room.template_height(),
            config.default_movement_penalty,
        );

        for y in 0..grid.height as i32 {
            for x in 0..grid.width as i32 {
                let index = GridPosition::new(x, y);
                let tile = layer.tile_at(index + room.template_lower_bounds);
                match tile {
                    CollisionTile::Open => {}
                    CollisionTile::Unwalkable => grid.set(index, 0),
                    CollisionTile::PreferredPath => {
                        grid.set(index, config.preferred_path_movement_penalty)
                    }
                }
            }
        }

        for doorway in room.unconnected_doorways() {
            for cell in doorway.bricked_cells() {
                if let Some(index) = cell.checked_sub(room.template_lower_bounds) {
                    grid.set(index, 0);
                }
            }
        }

        grid
    }
}

/// What the host's collision tilemap holds at a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CollisionTile {
    /// Ordinary floor
    Open,
    /// Walls, pits and anything enemies cannot cross
    Unwalkable,
    /// Floor enemies should favour
    PreferredPath,
}

/// Read access to a room template's collision tiles.
///
/// Cells are in template tilemap coordinates.
pub trait CollisionLayer {
    /// Returns the collision tile at a template-local cell.
    fn tile_at(&self, cell: GridPosition) -> CollisionTile;
}

impl<F> CollisionLayer for F
where
    F: Fn(GridPosition) -> CollisionTile,
{
    fn tile_at(&self, cell: GridPosition) -> CollisionTile {
        self(cell)
    }
}
