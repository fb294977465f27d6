//! # Pathfinding
//!
//! A* search over a single room's movement-penalty grid.
//!
//! Every call allocates its own [`GridNodes`] and open/closed collections, so
//! concurrent searches for different enemies or rooms never share state. The
//! search is a plain blocking call; throttling how often it runs is up to the
//! caller.
//!
//! Behaviour worth knowing before changing anything here:
//! - The open list is re-sorted by `f_cost` every iteration with a stable sort,
//!   so among equal costs the node inserted first wins. Recorded paths depend
//!   on this tie-break.
//! - Diagonal steps are allowed even when both orthogonal cells are blocked,
//!   so paths can clip the corner of an obstacle.

use crate::utils::math::octile_distance;
use crate::{CellTransform, GridPosition, MovementPenaltyGrid, Room, WorldPosition};
use log::{debug, trace};

/// Cost sentinel for nodes the search has not reached.
const UNREACHED_COST: i32 = i32::MAX;

/// One cell of the search grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridNode {
    /// Zero-based cell index inside the room
    pub position: GridPosition,
    /// Cost of the best known route from the start
    pub g_cost: i32,
    /// Octile estimate to the target
    pub h_cost: i32,
    /// Index of the node this one was reached from
    pub parent: Option<usize>,
}

impl GridNode {
    fn new(position: GridPosition) -> Self {
        Self {
            position,
            g_cost: UNREACHED_COST,
            h_cost: 0,
            parent: None,
        }
    }

    /// Total estimated cost through this node.
    pub fn f_cost(&self) -> i32 {
        self.g_cost.saturating_add(self.h_cost)
    }
}

/// Dense grid holding exactly one [`GridNode`] per cell.
#[derive(Debug, Clone)]
pub struct GridNodes {
    width: usize,
    height: usize,
    nodes: Vec<GridNode>,
}

impl GridNodes {
    /// Allocates a fresh grid of unreached nodes.
    pub fn new(width: usize, height: usize) -> Self {
        let mut nodes = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                nodes.push(GridNode::new(GridPosition::new(x as i32, y as i32)));
            }
        }
        Self { width, height, nodes }
    }

    /// Flat index of a cell, or `None` outside the grid.
    pub fn index(&self, position: GridPosition) -> Option<usize> {
        if position.x < 0
            || position.y < 0
            || position.x as usize >= self.width
            || position.y as usize >= self.height
        {
            return None;
        }
        Some(position.y as usize * self.width + position.x as usize)
    }

    /// The node at a cell, or `None` outside the grid.
    pub fn node(&self, position: GridPosition) -> Option<&GridNode> {
        self.index(position).map(|index| &self.nodes[index])
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the grid has no cells.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Waypoints returned by [`build_path`], stored as a stack.
///
/// The start cell is on top, so the first [`pop`](MovementPath::pop) yields the
/// cell the mover already stands on; callers that only want cells to walk to
/// pop once before following the path. The target cell is at the bottom.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MovementPath {
    stack: Vec<WorldPosition>,
}

impl MovementPath {
    /// Removes and returns the next waypoint.
    pub fn pop(&mut self) -> Option<WorldPosition> {
        self.stack.pop()
    }

    /// The next waypoint without removing it.
    pub fn peek(&self) -> Option<&WorldPosition> {
        self.stack.last()
    }

    /// Number of waypoints left.
    pub fn len(&self) -> usize {
        self.stack.len()
    }

    /// Whether every waypoint has been consumed.
    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    /// Remaining waypoints in walking order.
    pub fn waypoints(&self) -> impl Iterator<Item = &WorldPosition> {
        self.stack.iter().rev()
    }
}

/// Finds the cheapest route between two dungeon cells inside `room`.
///
/// Returns the dungeon cells from `start` to `end` inclusive, or `None` when
/// either end lies outside the room, the room has no movement-penalty grid
/// matching its template size, or the target cannot be reached.
///
/// # Examples
///
/// ```
/// use delve::{find_path_cells, GridPosition, MovementPenaltyGrid, Room, RoomNode, RoomTemplate, RoomType};
///
/// let template = RoomTemplate::new(RoomType::Small, GridPosition::new(0, 0), GridPosition::new(4, 4));
/// let mut room = Room::from_template(&template, &RoomNode::new("r", RoomType::Small), "level-1");
/// room.set_movement_penalty(MovementPenaltyGrid::uniform(5, 5, 1)).unwrap();
///
/// let cells = find_path_cells(&room, GridPosition::new(0, 0), GridPosition::new(4, 4)).unwrap();
/// assert_eq!(cells.len(), 5);
/// assert_eq!(cells[0], GridPosition::new(0, 0));
/// assert_eq!(cells[4], GridPosition::new(4, 4));
/// ```
pub fn find_path_cells(room: &Room, start: GridPosition, end: GridPosition) -> Option<Vec<GridPosition>> {
    let Some(penalty) = room.movement_penalty() else {
        debug!("Room {} has no movement penalty grid", room.id);
        return None;
    };

    if penalty.width() != room.template_width() || penalty.height() != room.template_height() {
        debug!(
            "Room {} is {}x{} but its movement penalty grid is {}x{}",
            room.id,
            room.template_width(),
            room.template_height(),
            penalty.width(),
            penalty.height()
        );
        return None;
    }

    let mut nodes = GridNodes::new(penalty.width(), penalty.height());

    let start_index = room.world_to_grid_index(start).and_then(|cell| nodes.index(cell));
    let target_index = room.world_to_grid_index(end).and_then(|cell| nodes.index(cell));
    let (Some(start_index), Some(target_index)) = (start_index, target_index) else {
        debug!("Path {} -> {} leaves room {}", start, end, room.id);
        return None;
    };

    let end_index = find_shortest_path(&mut nodes, penalty, start_index, target_index)?;

    let mut cells = Vec::new();
    let mut next = Some(end_index);
    while let Some(index) = next {
        let node = &nodes.nodes[index];
        cells.push(room.grid_index_to_world(node.position));
        next = node.parent;
    }
    cells.reverse();

    trace!("Path {} -> {} in room {} has {} cells", start, end, room.id, cells.len());
    Some(cells)
}

/// Builds the waypoint stack for walking from `start` to `end` inside `room`.
///
/// Each waypoint is the world-space centre of a path cell with z set to 0.
pub fn build_path(
    room: &Room,
    transform: &CellTransform,
    start: GridPosition,
    end: GridPosition,
) -> Option<MovementPath> {
    let cells = find_path_cells(room, start, end)?;
    let stack = cells
        .into_iter()
        .rev()
        .map(|cell| transform.cell_centre(cell))
        .collect();
    Some(MovementPath { stack })
}

/// Moves a target cell off an obstacle.
///
/// Returns `cell` when it is walkable, otherwise the first walkable
/// neighbour in x-major order, otherwise `cell` unchanged. Cells with no
/// neighbour inside the room are returned unchanged. Chasers use this so
/// a player standing against a wall still gives them somewhere to path to.
pub fn nearest_walkable_cell(room: &Room, cell: GridPosition) -> GridPosition {
    let Some(penalty) = room.movement_penalty() else {
        return cell;
    };

    let Some(index) = room.world_to_grid_index(cell) else {
        return cell;
    };
    if penalty.is_walkable(index) {
        return cell;
    }

    let near_grid = (-1..=penalty.width() as i64).contains(&i64::from(index.x))
        && (-1..=penalty.height() as i64).contains(&i64::from(index.y));
    if !near_grid {
        return cell;
    }

    index
        .neighbours()
        .into_iter()
        .find(|neighbour| penalty.is_walkable(*neighbour))
        .map(|neighbour| room.grid_index_to_world(neighbour))
        .unwrap_or(cell)
}

fn find_shortest_path(
    nodes: &mut GridNodes,
    penalty: &MovementPenaltyGrid,
    start: usize,
    target: usize,
) -> Option<usize> {
    let mut open_list = vec![start];
    let mut in_open = vec![false; nodes.len()];
    let mut closed = vec![false; nodes.len()];

    nodes.nodes[start].g_cost = 0;
    in_open[start] = true;

    while !open_list.is_empty() {
        // Stable: equal costs keep insertion order
        open_list.sort_by_key(|&index| nodes.nodes[index].f_cost());

        let current = open_list.remove(0);
        in_open[current] = false;

        if current == target {
            return Some(current);
        }

        closed[current] = true;

        evaluate_neighbours(nodes, penalty, current, target, &mut open_list, &mut in_open, &closed);
    }

    None
}

fn evaluate_neighbours(
    nodes: &mut GridNodes,
    penalty: &MovementPenaltyGrid,
    current: usize,
    target: usize,
    open_list: &mut Vec<usize>,
    in_open: &mut [bool],
    closed: &[bool],
) {
    let current_position = nodes.nodes[current].position;
    let current_g_cost = nodes.nodes[current].g_cost;
    let target_position = nodes.nodes[target].position;

    for neighbour_position in current_position.neighbours() {
        let Some(neighbour) = nodes.index(neighbour_position) else {
            continue;
        };

        let cell_penalty = match penalty.get(neighbour_position) {
            Some(0) | None => continue,
            Some(value) => i32::try_from(value).unwrap_or(i32::MAX),
        };

        if closed[neighbour] {
            continue;
        }

        let new_cost = current_g_cost
            .saturating_add(octile_distance(current_position, neighbour_position))
            .saturating_add(cell_penalty);

        let node = &mut nodes.nodes[neighbour];
        if new_cost < node.g_cost || !in_open[neighbour] {
            node.g_cost = new_cost;
            node.h_cost = octile_distance(neighbour_position, target_position);
            node.parent = Some(current);

            if !in_open[neighbour] {
                in_open[neighbour] = true;
                open_list.push(neighbour);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{RoomNode, RoomTemplate, RoomType};

    fn room_with_grid(width: i32, height: i32, grid: MovementPenaltyGrid) -> Room {
        let template = RoomTemplate::new(
            RoomType::Medium,
            GridPosition::new(0, 0),
            GridPosition::new(width - 1, height - 1),
        );
        let mut room = Room::from_template(&template, &RoomNode::new("r", RoomType::Medium), "level-1");
        room.set_movement_penalty(grid).unwrap();
        room
    }

    #[test]
    fn test_grid_nodes_start_unreached() {
        let nodes = GridNodes::new(3, 2);
        assert_eq!(nodes.len(), 6);
        let node = nodes.node(GridPosition::new(2, 1)).unwrap();
        assert_eq!(node.position, GridPosition::new(2, 1));
        assert_eq!(node.g_cost, UNREACHED_COST);
        assert!(node.parent.is_none());
        assert!(nodes.node(GridPosition::new(3, 0)).is_none());
        assert!(nodes.node(GridPosition::new(0, -1)).is_none());
    }

    #[test]
    fn test_start_equals_target() {
        let room = room_with_grid(3, 3, MovementPenaltyGrid::uniform(3, 3, 1));
        let cells = find_path_cells(&room, GridPosition::new(1, 1), GridPosition::new(1, 1)).unwrap();
        assert_eq!(cells, vec![GridPosition::new(1, 1)]);
    }

    #[test]
    fn test_straight_line() {
        let room = room_with_grid(5, 1, MovementPenaltyGrid::uniform(5, 1, 1));
        let cells = find_path_cells(&room, GridPosition::new(0, 0), GridPosition::new(4, 0)).unwrap();
        assert_eq!(cells.len(), 5);
        for (x, cell) in cells.iter().enumerate() {
            assert_eq!(*cell, GridPosition::new(x as i32, 0));
        }
    }

    #[test]
    fn test_far_edge_cells_are_reachable() {
        let room = room_with_grid(4, 4, MovementPenaltyGrid::uniform(4, 4, 1));
        let cells = find_path_cells(&room, GridPosition::new(0, 3), GridPosition::new(3, 0)).unwrap();
        assert_eq!(cells.last(), Some(&GridPosition::new(3, 0)));
    }

    #[test]
    fn test_out_of_room_returns_none() {
        let room = room_with_grid(3, 3, MovementPenaltyGrid::uniform(3, 3, 1));
        assert!(find_path_cells(&room, GridPosition::new(-1, 0), GridPosition::new(2, 2)).is_none());
        assert!(find_path_cells(&room, GridPosition::new(0, 0), GridPosition::new(3, 2)).is_none());
    }

    #[test]
    fn test_missing_penalty_grid_returns_none() {
        let template = RoomTemplate::new(RoomType::Small, GridPosition::new(0, 0), GridPosition::new(2, 2));
        let room = Room::from_template(&template, &RoomNode::new("r", RoomType::Small), "level-1");
        assert!(find_path_cells(&room, GridPosition::new(0, 0), GridPosition::new(2, 2)).is_none());
    }

    #[test]
    fn test_diagonal_may_clip_corners() {
        // 1 0
        // 0 1   (rows listed bottom first)
        let grid = MovementPenaltyGrid::from_rows(&[vec![1, 0], vec![0, 1]]).unwrap();
        let room = room_with_grid(2, 2, grid);
        let cells = find_path_cells(&room, GridPosition::new(0, 0), GridPosition::new(1, 1)).unwrap();
        assert_eq!(cells, vec![GridPosition::new(0, 0), GridPosition::new(1, 1)]);
    }

    #[test]
    fn test_prefers_cheap_cells() {
        // Row y = 1 is expensive, row y = 0 is cheap; going straight along y = 1
        // costs more than dipping down and back.
        let grid = MovementPenaltyGrid::from_rows(&[vec![1, 1, 1, 1, 1], vec![1, 200, 200, 200, 1]]).unwrap();
        let room = room_with_grid(5, 2, grid);
        let cells = find_path_cells(&room, GridPosition::new(0, 1), GridPosition::new(4, 1)).unwrap();
        assert!(cells[1..cells.len() - 1].iter().all(|cell| cell.y == 0));
    }

    #[test]
    fn test_build_path_stack_order() {
        let room = room_with_grid(3, 1, MovementPenaltyGrid::uniform(3, 1, 1));
        let transform = CellTransform::default();
        let mut path = build_path(&room, &transform, GridPosition::new(0, 0), GridPosition::new(2, 0)).unwrap();

        assert_eq!(path.len(), 3);
        let walking: Vec<_> = path.waypoints().copied().collect();
        assert_eq!(walking[0], WorldPosition::new(0.5, 0.5, 0.0));
        assert_eq!(walking[2], WorldPosition::new(2.5, 0.5, 0.0));

        assert_eq!(path.peek(), Some(&WorldPosition::new(0.5, 0.5, 0.0)));
        assert_eq!(path.pop(), Some(WorldPosition::new(0.5, 0.5, 0.0)));
        assert_eq!(path.pop(), Some(WorldPosition::new(1.5, 0.5, 0.0)));
        assert_eq!(path.pop(), Some(WorldPosition::new(2.5, 0.5, 0.0)));
        assert!(path.is_empty());
    }

    #[test]
    fn test_nearest_walkable_cell() {
        let mut grid = MovementPenaltyGrid::uniform(3, 3, 1);
        grid.set(GridPosition::new(1, 1), 0);
        grid.set(GridPosition::new(0, 0), 0);
        let room = room_with_grid(3, 3, grid);

        assert_eq!(nearest_walkable_cell(&room, GridPosition::new(2, 2)), GridPosition::new(2, 2));
        // (0, 0) is blocked, so the x-major scan lands on (0, 1)
        assert_eq!(nearest_walkable_cell(&room, GridPosition::new(1, 1)), GridPosition::new(0, 1));
    }

    #[test]
    fn test_equal_cost_ties_keep_insertion_order() {
        // (1, 0) and (1, 1) both reach (2, 1) for the same cost; (1, 0) is
        // expanded first because it was queued first
        let room = room_with_grid(3, 3, MovementPenaltyGrid::uniform(3, 3, 1));
        let cells = find_path_cells(&room, GridPosition::new(0, 0), GridPosition::new(2, 1)).unwrap();
        assert_eq!(
            cells,
            vec![
                GridPosition::new(0, 0),
                GridPosition::new(1, 0),
                GridPosition::new(2, 1)
            ]
        );
    }

    #[test]
    fn test_extreme_cells_have_no_path() {
        let mut room = room_with_grid(5, 5, MovementPenaltyGrid::uniform(5, 5, 1));
        room.lower_bounds = GridPosition::new(10, 10);
        room.upper_bounds = GridPosition::new(14, 14);
        let inside = GridPosition::new(12, 12);

        assert!(find_path_cells(&room, GridPosition::new(i32::MIN, 0), inside).is_none());
        assert!(find_path_cells(&room, inside, GridPosition::new(0, i32::MIN)).is_none());
        assert!(find_path_cells(&room, GridPosition::new(i32::MAX, i32::MAX), inside).is_none());

        let far = GridPosition::new(i32::MIN, i32::MAX);
        assert_eq!(nearest_walkable_cell(&room, far), far);
        let far = GridPosition::new(i32::MAX, 12);
        assert_eq!(nearest_walkable_cell(&room, far), far);
    }

    #[test]
    fn test_mismatched_grid_has_no_path() {
        let json = r#"{"width": 2, "height": 2, "cells": [1, 1, 1, 1]}"#;
        let mut room = room_with_grid(5, 5, MovementPenaltyGrid::uniform(5, 5, 1));
        room.movement_penalty = Some(serde_json::from_str(json).unwrap());

        assert!(find_path_cells(&room, GridPosition::new(0, 0), GridPosition::new(1, 1)).is_none());
    }

    #[test]
    fn test_nearest_walkable_cell_from_outside_edge() {
        let room = room_with_grid(3, 3, MovementPenaltyGrid::uniform(3, 3, 1));
        assert_eq!(nearest_walkable_cell(&room, GridPosition::new(-1, 1)), GridPosition::new(0, 0));
        assert_eq!(nearest_walkable_cell(&room, GridPosition::new(5, 1)), GridPosition::new(5, 1));
    }

    #[test]
    fn test_nearest_walkable_cell_gives_up() {
        let room = room_with_grid(1, 1, MovementPenaltyGrid::uniform(1, 1, 0));
        assert_eq!(nearest_walkable_cell(&room, GridPosition::new(0, 0)), GridPosition::new(0, 0));
    }
}
