//! # Rooms and Doorways
//!
//! Runtime room instances produced by the dungeon builder.
//!
//! A [`Room`] is a placed copy of a [`RoomTemplate`]: the template's bounds are
//! translated into dungeon coordinates and its doorway list is deep-copied so
//! that connection flags can change per room without touching the template.

use crate::config::DOORWAY_OPENING_WIDTH;
use crate::utils::math::intervals_overlap;
use crate::{
    DelveError, DelveResult, GridPosition, MovementPenaltyGrid, Orientation,
    RoomEnemySpawnParameters, RoomNode, RoomTemplate, RoomType,
};
use serde::{Deserialize, Serialize};

/// An opening on one side of a room.
///
/// Doorways are three tiles wide; `position` is the middle tile in
/// template-local tilemap coordinates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Doorway {
    /// Middle tile of the opening (template-local)
    pub position: GridPosition,
    /// Side of the room the doorway opens on
    pub orientation: Orientation,
    /// Host asset handle for the door placed in a connected doorway
    #[serde(default)]
    pub door_prefab: Option<String>,
    /// Whether another room has been attached through this doorway
    #[serde(default)]
    pub is_connected: bool,
    /// Whether placement should skip this doorway
    #[serde(default)]
    pub is_unavailable: bool,
    /// Top-left tile of the wall region pasted over the doorway when it is bricked up
    #[serde(default)]
    pub copy_start_position: GridPosition,
    /// Width of the copy region in tiles
    #[serde(default)]
    pub copy_tile_width: u32,
    /// Height of the copy region in tiles
    #[serde(default)]
    pub copy_tile_height: u32,
}

impl Doorway {
    /// Creates an unconnected doorway whose copy region bricks up exactly its opening.
    ///
    /// # Examples
    ///
    /// ```
    /// use delve::{Doorway, GridPosition, Orientation};
    ///
    /// let doorway = Doorway::new(GridPosition::new(5, 10), Orientation::North);
    /// assert!(doorway.is_available());
    /// assert_eq!(doorway.opening_cells().len(), 3);
    /// ```
    pub fn new(position: GridPosition, orientation: Orientation) -> Self {
        let half = DOORWAY_OPENING_WIDTH / 2;
        let (copy_start_position, copy_tile_width, copy_tile_height) = if orientation.is_east_west() {
            (
                GridPosition::new(position.x, position.y.saturating_add(half + 1)),
                1,
                DOORWAY_OPENING_WIDTH as u32,
            )
        } else {
            (
                GridPosition::new(position.x.saturating_sub(half + 1), position.y),
                DOORWAY_OPENING_WIDTH as u32,
                1,
            )
        };

        Self {
            position,
            orientation,
            door_prefab: None,
            is_connected: false,
            is_unavailable: false,
            copy_start_position,
            copy_tile_width,
            copy_tile_height,
        }
    }

    /// Sets the door asset placed when this doorway is connected.
    pub fn with_door_prefab(mut self, prefab: impl Into<String>) -> Self {
        self.door_prefab = Some(prefab.into());
        self
    }

    /// Whether placement may still try this doorway.
    pub fn is_available(&self) -> bool {
        !self.is_connected && !self.is_unavailable
    }

    /// Marks the doorway as joined to a neighbour. Connected doorways are never reused.
    pub fn connect(&mut self) {
        self.is_connected = true;
        self.is_unavailable = true;
    }

    /// Excludes the doorway from further placement attempts.
    pub fn mark_unavailable(&mut self) {
        self.is_unavailable = true;
    }

    /// Template-local cells covered by the opening.
    pub fn opening_cells(&self) -> Vec<GridPosition> {
        let half = DOORWAY_OPENING_WIDTH / 2;
        match self.orientation {
            Orientation::North | Orientation::South => (-half..=half)
                .map(|dx| GridPosition::new(self.position.x + dx, self.position.y))
                .collect(),
            Orientation::East | Orientation::West => (-half..=half)
                .map(|dy| GridPosition::new(self.position.x, self.position.y + dy))
                .collect(),
            Orientation::None => Vec::new(),
        }
    }

    /// Template-local cells covered when the doorway is bricked up.
    ///
    /// The copy region is pasted one tile along the wall: right for north and
    /// south doorways, down for east and west ones. A doorway with an empty
    /// copy region bricks up its opening instead.
    pub fn bricked_cells(&self) -> Vec<GridPosition> {
        if self.copy_tile_width == 0 || self.copy_tile_height == 0 {
            return self.opening_cells();
        }

        let (shift_x, shift_y) = match self.orientation {
            Orientation::North | Orientation::South => (1, 0),
            Orientation::East | Orientation::West => (0, -1),
            Orientation::None => return Vec::new(),
        };
        let start_x = i64::from(self.copy_start_position.x) + shift_x;
        let start_y = i64::from(self.copy_start_position.y) + shift_y;

        let mut cells = Vec::new();
        for dx in 0..i64::from(self.copy_tile_width) {
            for dy in 0..i64::from(self.copy_tile_height) {
                if let (Ok(x), Ok(y)) = (i32::try_from(start_x + dx), i32::try_from(start_y - dy)) {
                    cells.push(GridPosition::new(x, y));
                }
            }
        }
        cells
    }
}

/// A room template placed in a generated dungeon.
///
/// `lower_bounds`/`upper_bounds` are dungeon coordinates set once at placement;
/// the `template_*` bounds are the template's own tilemap coordinates and never
/// change. Placement only ever translates, so both boxes have the same size.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Room {
    /// Id of the room node this room was built from
    pub id: String,
    /// Id of the template this room copies
    pub template_id: String,
    /// Type of the template (corridors are `CorridorNs`/`CorridorEw` here)
    pub room_type: RoomType,
    /// Lower-left corner in dungeon coordinates
    pub lower_bounds: GridPosition,
    /// Upper-right corner in dungeon coordinates
    pub upper_bounds: GridPosition,
    /// Lower-left corner of the template tilemap
    pub template_lower_bounds: GridPosition,
    /// Upper-right corner of the template tilemap
    pub template_upper_bounds: GridPosition,
    /// Deep copies of the template doorways
    pub doorways: Vec<Doorway>,
    /// Parent room id; empty for the entrance
    pub parent_room_id: String,
    /// Child room ids in graph order
    pub child_room_ids: Vec<String>,
    /// Enemy and chest spawn cells (template-local)
    pub spawn_positions: Vec<GridPosition>,
    /// Per-level enemy spawn settings copied from the template
    pub enemy_spawn_parameters: Vec<RoomEnemySpawnParameters>,
    /// Set once the builder has committed this room's bounds
    pub is_positioned: bool,
    /// Whether the player has entered this room
    pub is_previously_visited: bool,
    /// Whether the room has no enemies left to fight
    pub is_cleared_of_enemies: bool,
    /// Traversal costs painted by the host before pathfinding
    #[serde(default)]
    pub movement_penalty: Option<MovementPenaltyGrid>,
}

impl Room {
    /// Creates an unplaced room for `node` from `template`.
    ///
    /// Doorways and child ids are copied, so mutating this room never affects
    /// the template or other rooms built from it. The room starts at the
    /// template's own bounds. Rooms with nothing to spawn on `dungeon_level`
    /// start cleared.
    pub fn from_template(template: &RoomTemplate, node: &RoomNode, dungeon_level: &str) -> Self {
        let is_entrance = node.parent_ids.is_empty();

        let mut room = Self {
            id: node.id.clone(),
            template_id: template.id.clone(),
            room_type: template.room_type,
            lower_bounds: template.lower_bounds,
            upper_bounds: template.upper_bounds,
            template_lower_bounds: template.lower_bounds,
            template_upper_bounds: template.upper_bounds,
            doorways: template.doorways.clone(),
            parent_room_id: node.parent_ids.first().cloned().unwrap_or_default(),
            child_room_ids: node.child_ids.clone(),
            spawn_positions: template.spawn_positions.clone(),
            enemy_spawn_parameters: template.enemy_spawn_parameters.clone(),
            is_positioned: false,
            is_previously_visited: is_entrance,
            is_cleared_of_enemies: false,
            movement_penalty: None,
        };

        room.is_cleared_of_enemies = room.enemies_to_spawn(dungeon_level) == 0;
        room
    }

    /// Whether this is the graph's root room.
    pub fn is_entrance(&self) -> bool {
        self.parent_room_id.is_empty()
    }

    /// Translation from template tilemap coordinates to dungeon coordinates.
    pub fn world_offset(&self) -> GridPosition {
        self.lower_bounds - self.template_lower_bounds
    }

    /// Number of grid columns covered by the template.
    pub fn template_width(&self) -> usize {
        span(self.template_lower_bounds.x, self.template_upper_bounds.x)
    }

    /// Number of grid rows covered by the template.
    pub fn template_height(&self) -> usize {
        span(self.template_lower_bounds.y, self.template_upper_bounds.y)
    }

    /// Closed-interval overlap on both axes.
    ///
    /// Rooms sharing an edge cell count as overlapping.
    pub fn overlaps(&self, other: &Room) -> bool {
        intervals_overlap(
            self.lower_bounds.x,
            self.upper_bounds.x,
            other.lower_bounds.x,
            other.upper_bounds.x,
        ) && intervals_overlap(
            self.lower_bounds.y,
            self.upper_bounds.y,
            other.lower_bounds.y,
            other.upper_bounds.y,
        )
    }

    /// Indices of doorways that are neither connected nor unavailable.
    pub fn available_doorway_indices(&self) -> Vec<usize> {
        self.doorways
            .iter()
            .enumerate()
            .filter(|(_, doorway)| doorway.is_available())
            .map(|(index, _)| index)
            .collect()
    }

    /// Doorways that never got a neighbour.
    pub fn unconnected_doorways(&self) -> impl Iterator<Item = &Doorway> {
        self.doorways.iter().filter(|doorway| !doorway.is_connected)
    }

    /// Dungeon-space cell of a doorway belonging to this room.
    pub fn doorway_world_position(&self, doorway: &Doorway) -> GridPosition {
        self.lower_bounds + doorway.position - self.template_lower_bounds
    }

    /// Converts a dungeon cell to a zero-based index into this room's grids.
    ///
    /// Returns `None` when the offset does not fit in an `i32`; such a cell is
    /// never inside the room.
    pub fn world_to_grid_index(&self, cell: GridPosition) -> Option<GridPosition> {
        cell.checked_sub(self.lower_bounds)
    }

    /// Converts a zero-based grid index back to a dungeon cell.
    pub fn grid_index_to_world(&self, index: GridPosition) -> GridPosition {
        index + self.lower_bounds
    }

    /// Whether a dungeon cell lies inside the room's bounds.
    pub fn contains(&self, cell: GridPosition) -> bool {
        cell.x >= self.lower_bounds.x
            && cell.x <= self.upper_bounds.x
            && cell.y >= self.lower_bounds.y
            && cell.y <= self.upper_bounds.y
    }

    /// Spawn parameters for a dungeon level, if the template defines any.
    pub fn enemy_spawn_parameters_for(&self, dungeon_level: &str) -> Option<&RoomEnemySpawnParameters> {
        self.enemy_spawn_parameters
            .iter()
            .find(|parameters| parameters.dungeon_level == dungeon_level)
    }

    /// Upper bound on enemies spawned in this room on a dungeon level.
    pub fn enemies_to_spawn(&self, dungeon_level: &str) -> u32 {
        self.enemy_spawn_parameters_for(dungeon_level)
            .map(|parameters| parameters.max_total_enemies)
            .unwrap_or(0)
    }

    /// Attaches the host-painted movement-penalty grid.
    ///
    /// The grid must match the template's dimensions exactly.
    pub fn set_movement_penalty(&mut self, grid: MovementPenaltyGrid) -> DelveResult<()> {
        if grid.width() != self.template_width() || grid.height() != self.template_height() {
            return Err(DelveError::InvalidState(format!(
                "Movement penalty grid is {}x{} but room {} is {}x{}",
                grid.width(),
                grid.height(),
                self.id,
                self.template_width(),
                self.template_height()
            )));
        }
        self.movement_penalty = Some(grid);
        Ok(())
    }

    /// The movement-penalty grid, once the host has painted one.
    pub fn movement_penalty(&self) -> Option<&MovementPenaltyGrid> {
        self.movement_penalty.as_ref()
    }
}

/// Number of cells in the closed interval `lower..=upper`, 0 when reversed.
fn span(lower: i32, upper: i32) -> usize {
    usize::try_from((i64::from(upper) - i64::from(lower) + 1).max(0)).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corridor_template() -> RoomTemplate {
        RoomTemplate::new(
            RoomType::CorridorNs,
            GridPosition::new(-2, -3),
            GridPosition::new(2, 3),
        )
        .with_id("corridor-ns")
        .with_doorway(Doorway::new(GridPosition::new(0, 3), Orientation::North))
        .with_doorway(Doorway::new(GridPosition::new(0, -3), Orientation::South))
    }

    fn node(id: &str, parent: Option<&str>) -> RoomNode {
        let mut node = RoomNode::new(id, RoomType::Corridor);
        if let Some(parent) = parent {
            node.parent_ids.push(parent.to_string());
        }
        node
    }

    #[test]
    fn test_doorway_flags() {
        let mut doorway = Doorway::new(GridPosition::new(2, 0), Orientation::South);
        assert!(doorway.is_available());

        doorway.mark_unavailable();
        assert!(!doorway.is_available());
        assert!(!doorway.is_connected);

        let mut doorway = Doorway::new(GridPosition::new(2, 0), Orientation::South);
        doorway.connect();
        assert!(doorway.is_connected);
        assert!(doorway.is_unavailable);
    }

    #[test]
    fn test_doorway_opening_cells() {
        let horizontal = Doorway::new(GridPosition::new(4, 8), Orientation::North);
        assert_eq!(
            horizontal.opening_cells(),
            vec![
                GridPosition::new(3, 8),
                GridPosition::new(4, 8),
                GridPosition::new(5, 8)
            ]
        );

        let vertical = Doorway::new(GridPosition::new(0, 4), Orientation::West);
        assert_eq!(
            vertical.opening_cells(),
            vec![
                GridPosition::new(0, 3),
                GridPosition::new(0, 4),
                GridPosition::new(0, 5)
            ]
        );

        assert!(Doorway::new(GridPosition::origin(), Orientation::None)
            .opening_cells()
            .is_empty());
    }

    #[test]
    fn test_default_copy_region_bricks_the_opening() {
        for (position, orientation) in [
            (GridPosition::new(4, 8), Orientation::North),
            (GridPosition::new(4, 0), Orientation::South),
            (GridPosition::new(8, 4), Orientation::East),
            (GridPosition::new(0, 4), Orientation::West),
        ] {
            let doorway = Doorway::new(position, orientation);
            let mut bricked = doorway.bricked_cells();
            let mut opening = doorway.opening_cells();
            bricked.sort();
            opening.sort();
            assert_eq!(bricked, opening, "{:?} doorway", orientation);
        }
    }

    #[test]
    fn test_bricked_cells_follow_copy_region() {
        let mut doorway = Doorway::new(GridPosition::new(4, 8), Orientation::North);
        doorway.copy_start_position = GridPosition::new(1, 8);
        doorway.copy_tile_width = 5;
        doorway.copy_tile_height = 2;

        let cells = doorway.bricked_cells();
        assert_eq!(cells.len(), 10);
        assert_eq!(cells[0], GridPosition::new(2, 8));
        assert_eq!(cells[1], GridPosition::new(2, 7));
        assert!(cells.contains(&GridPosition::new(6, 7)));
        assert!(!cells.contains(&GridPosition::new(1, 8)));

        let mut vertical = Doorway::new(GridPosition::new(0, 4), Orientation::West);
        vertical.copy_start_position = GridPosition::new(0, 7);
        vertical.copy_tile_height = 5;
        assert_eq!(
            vertical.bricked_cells(),
            (2..=6).rev().map(|y| GridPosition::new(0, y)).collect::<Vec<_>>()
        );

        // Hand-written doorways without a copy region brick their opening
        vertical.copy_tile_width = 0;
        assert_eq!(vertical.bricked_cells(), vertical.opening_cells());
    }

    #[test]
    fn test_extreme_template_bounds_do_not_overflow() {
        let mut room = Room::from_template(&corridor_template(), &node("a", None), "level-1");
        room.template_lower_bounds = GridPosition::new(i32::MIN, 0);
        room.template_upper_bounds = GridPosition::new(i32::MAX, -1);
        assert_eq!(room.template_width() as u64, 1u64 << 32);
        assert_eq!(room.template_height(), 0);
    }

    #[test]
    fn test_room_copies_template_doorways() {
        let template = corridor_template();
        let mut room = Room::from_template(&template, &node("a", Some("root")), "level-1");

        room.doorways[0].connect();
        assert!(!template.doorways[0].is_connected);
        assert_eq!(room.parent_room_id, "root");
        assert!(!room.is_entrance());
        assert!(!room.is_previously_visited);
        assert!(!room.is_positioned);
    }

    #[test]
    fn test_entrance_room_starts_visited() {
        let room = Room::from_template(&corridor_template(), &node("root", None), "level-1");
        assert!(room.is_entrance());
        assert!(room.is_previously_visited);
        assert_eq!(room.parent_room_id, "");
    }

    #[test]
    fn test_room_cleared_when_nothing_spawns() {
        let template = corridor_template().with_enemy_spawn_parameters(RoomEnemySpawnParameters::new(
            "level-1", 2, 4,
        ));

        let busy = Room::from_template(&template, &node("a", Some("root")), "level-1");
        assert!(!busy.is_cleared_of_enemies);
        assert_eq!(busy.enemies_to_spawn("level-1"), 4);

        let quiet = Room::from_template(&template, &node("a", Some("root")), "level-2");
        assert!(quiet.is_cleared_of_enemies);
    }

    #[test]
    fn test_room_geometry() {
        let mut room = Room::from_template(&corridor_template(), &node("a", Some("root")), "level-1");
        assert_eq!(room.template_width(), 5);
        assert_eq!(room.template_height(), 7);
        assert_eq!(room.world_offset(), GridPosition::origin());

        room.lower_bounds = GridPosition::new(10, 20);
        room.upper_bounds = GridPosition::new(14, 26);
        assert_eq!(room.world_offset(), GridPosition::new(12, 23));

        let north = room.doorways[0].clone();
        assert_eq!(room.doorway_world_position(&north), GridPosition::new(12, 26));

        assert_eq!(room.world_to_grid_index(GridPosition::new(12, 26)), Some(GridPosition::new(2, 6)));
        assert_eq!(room.world_to_grid_index(GridPosition::new(i32::MIN, 26)), None);
        assert_eq!(room.grid_index_to_world(GridPosition::new(2, 6)), GridPosition::new(12, 26));
        assert!(room.contains(GridPosition::new(14, 26)));
        assert!(!room.contains(GridPosition::new(15, 26)));
    }

    #[test]
    fn test_room_overlap_is_closed_interval() {
        let template = corridor_template();
        let mut a = Room::from_template(&template, &node("a", None), "level-1");
        let mut b = Room::from_template(&template, &node("b", Some("a")), "level-1");

        a.lower_bounds = GridPosition::new(0, 0);
        a.upper_bounds = GridPosition::new(4, 6);

        // Shares the column x = 4
        b.lower_bounds = GridPosition::new(4, 0);
        b.upper_bounds = GridPosition::new(8, 6);
        assert!(a.overlaps(&b));
        assert!(b.overlaps(&a));

        b.lower_bounds = GridPosition::new(5, 0);
        b.upper_bounds = GridPosition::new(9, 6);
        assert!(!a.overlaps(&b));

        // Overlapping on x alone is not enough
        b.lower_bounds = GridPosition::new(2, 7);
        b.upper_bounds = GridPosition::new(6, 13);
        assert!(!a.overlaps(&b));
    }

    #[test]
    fn test_available_doorway_indices() {
        let mut room = Room::from_template(&corridor_template(), &node("a", None), "level-1");
        assert_eq!(room.available_doorway_indices(), vec![0, 1]);

        room.doorways[0].mark_unavailable();
        assert_eq!(room.available_doorway_indices(), vec![1]);
        assert_eq!(room.unconnected_doorways().count(), 2);

        room.doorways[1].connect();
        assert!(room.available_doorway_indices().is_empty());
        assert_eq!(room.unconnected_doorways().count(), 1);
    }

    #[test]
    fn test_movement_penalty_dimensions_checked() {
        let mut room = Room::from_template(&corridor_template(), &node("a", None), "level-1");

        assert!(room.movement_penalty().is_none());
        assert!(room.set_movement_penalty(MovementPenaltyGrid::uniform(4, 7, 10)).is_err());
        assert!(room.set_movement_penalty(MovementPenaltyGrid::uniform(5, 7, 10)).is_ok());
        assert!(room.movement_penalty().is_some());
    }
}
