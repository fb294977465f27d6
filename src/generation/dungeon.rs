//! # Dungeon Builder
//!
//! Backtracking placement of room-node graphs.
//!
//! The builder draws a graph from the level, walks it breadth-first from the
//! entrance and attaches every node to its parent's room through a pair of
//! facing doorways:
//!
//! 1. Pick a random free doorway on the parent room
//! 2. Pick a template for the node (corridors follow the doorway's axis)
//! 3. Align the template's opposite doorway one cell beyond the parent's
//! 4. Reject the spot if it overlaps any placed room and try another doorway
//!
//! A node with no doorway left fails the whole attempt. Failed attempts are
//! torn down and rebuilt from scratch, first with the same graph, then with a
//! freshly drawn one, until both attempt caps of the [`GenerationConfig`] run
//! out.

use crate::{
    DungeonLevel, GenerationConfig, Orientation, Room, RoomNode, RoomNodeGraph, RoomTemplate,
    RoomTemplateRegistry, RoomType,
};
use log::{debug, info, trace, warn};
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::{HashMap, VecDeque};
use std::fmt;

/// Attempt counters of the most recent [`DungeonBuilder::generate_dungeon`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BuildStats {
    /// Graphs drawn
    pub build_attempts: u32,
    /// Layouts tried, summed over all drawn graphs
    pub rebuild_attempts: u32,
}

/// Why a node could not be attached through a particular parent doorway.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PlacementFailure {
    NoTemplate,
    NoOppositeDoorway,
    Overlaps,
}

impl fmt::Display for PlacementFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            PlacementFailure::NoTemplate => "no matching template",
            PlacementFailure::NoOppositeDoorway => "no facing doorway",
            PlacementFailure::Overlaps => "overlaps a placed room",
        };
        f.write_str(reason)
    }
}

/// Turns room-node graphs into non-overlapping room layouts.
///
/// The builder owns the room dictionary of the last successful build. Other
/// systems read it through [`rooms`](Self::rooms) and friends; only doorway
/// lock state and cleared flags are expected to change afterwards.
#[derive(Debug, Clone)]
pub struct DungeonBuilder {
    config: GenerationConfig,
    rooms: HashMap<String, Room>,
    templates: RoomTemplateRegistry,
    dungeon_level: String,
    stats: BuildStats,
}

impl DungeonBuilder {
    /// Creates a builder with an empty room dictionary.
    pub fn new(config: GenerationConfig) -> Self {
        Self {
            config,
            rooms: HashMap::new(),
            templates: RoomTemplateRegistry::default(),
            dungeon_level: String::new(),
            stats: BuildStats::default(),
        }
    }

    /// The configuration this builder runs with.
    pub fn config(&self) -> &GenerationConfig {
        &self.config
    }

    /// Generates a dungeon for `level`, replacing any previous one.
    ///
    /// Returns `false` when every attempt failed; the room dictionary is left
    /// empty in that case. Failure is an expected outcome for over-constrained
    /// levels, so it is logged rather than raised.
    ///
    /// # Examples
    ///
    /// ```
    /// use delve::{DungeonBuilder, DungeonLevel, GenerationConfig};
    ///
    /// let config = GenerationConfig::for_testing(3);
    /// let mut rng = delve::generation::utils::create_rng(&config);
    /// let mut builder = DungeonBuilder::new(config);
    /// let level = DungeonLevel::demo();
    ///
    /// assert!(builder.generate_dungeon(&level, &mut rng));
    /// assert!(builder.rooms().values().all(|room| room.is_positioned));
    /// ```
    pub fn generate_dungeon<R: Rng + ?Sized>(&mut self, level: &DungeonLevel, rng: &mut R) -> bool {
        self.templates = level.template_registry();
        self.dungeon_level = level.name.clone();
        self.stats = BuildStats::default();
        self.rooms.clear();

        if level.room_node_graphs.is_empty() {
            warn!("Level {} has no room node graphs", level.name);
            return false;
        }

        while self.stats.build_attempts < self.config.max_dungeon_build_attempts {
            self.stats.build_attempts += 1;

            let Some(graph) = level.room_node_graphs.choose(rng) else {
                break;
            };
            debug!(
                "Build attempt {} for level {} using graph {}",
                self.stats.build_attempts, level.name, graph.name
            );

            if self.try_build_dungeon(graph, rng) {
                info!(
                    "Built level {} from graph {}: {} rooms after {} build and {} layout attempts",
                    level.name,
                    graph.name,
                    self.rooms.len(),
                    self.stats.build_attempts,
                    self.stats.rebuild_attempts
                );
                return true;
            }
        }

        self.rooms.clear();
        warn!(
            "Failed to build level {} after {} build and {} layout attempts",
            level.name, self.stats.build_attempts, self.stats.rebuild_attempts
        );
        false
    }

    fn try_build_dungeon<R: Rng + ?Sized>(&mut self, graph: &RoomNodeGraph, rng: &mut R) -> bool {
        for _ in 0..self.config.max_dungeon_rebuild_attempts_for_room_graph {
            self.rooms.clear();
            self.stats.rebuild_attempts += 1;

            if self.attempt_to_build_random_dungeon(graph, rng) {
                return true;
            }
            trace!("Layout attempt {} for graph {} failed", self.stats.rebuild_attempts, graph.name);
        }
        false
    }

    fn attempt_to_build_random_dungeon<R: Rng + ?Sized>(&mut self, graph: &RoomNodeGraph, rng: &mut R) -> bool {
        let Some(entrance) = graph.entrance() else {
            warn!("Room node graph {} has no entrance", graph.name);
            return false;
        };

        let mut open_nodes = VecDeque::from([entrance]);
        while let Some(node) = open_nodes.pop_front() {
            if self.rooms.contains_key(&node.id) {
                trace!("Room node {} already placed", node.id);
                continue;
            }
            open_nodes.extend(graph.children(node));

            let placed = if node.id == entrance.id {
                self.place_entrance(node, rng)
            } else {
                self.place_child(node, rng)
            };
            if !placed {
                return false;
            }
        }

        true
    }

    fn place_entrance<R: Rng + ?Sized>(&mut self, node: &RoomNode, rng: &mut R) -> bool {
        let Some(template) = self.templates.random_of_type(node.room_type, rng) else {
            warn!("No {} template for entrance node {}", node.room_type, node.id);
            return false;
        };

        let mut room = Room::from_template(template, node, &self.dungeon_level);
        room.is_positioned = true;
        trace!("Placed entrance {} at {} .. {}", room.id, room.lower_bounds, room.upper_bounds);
        self.rooms.insert(room.id.clone(), room);
        true
    }

    fn place_child<R: Rng + ?Sized>(&mut self, node: &RoomNode, rng: &mut R) -> bool {
        let Some(parent_id) = node.parent_id() else {
            debug!("Room node {} has no parent", node.id);
            return false;
        };

        loop {
            let Some(parent) = self.rooms.get(parent_id) else {
                debug!("Parent {} of room node {} is not placed", parent_id, node.id);
                return false;
            };

            let available = parent.available_doorway_indices();
            let Some(&parent_doorway) = available.choose(rng) else {
                trace!("Room {} has no free doorway left for {}", parent_id, node.id);
                return false;
            };
            let orientation = parent.doorways[parent_doorway].orientation;

            let outcome = match self.template_for_child(node, orientation, rng) {
                Some(template) => {
                    let mut room = Room::from_template(template, node, &self.dungeon_level);
                    self.position_room(parent, parent_doorway, &mut room).map(|()| room)
                }
                None => Err(PlacementFailure::NoTemplate),
            };

            match outcome {
                Ok(room) => {
                    if let Some(parent) = self.rooms.get_mut(parent_id) {
                        parent.doorways[parent_doorway].connect();
                    }
                    trace!(
                        "Placed {} {} at {} .. {} off {:?} doorway of {}",
                        room.room_type, room.id, room.lower_bounds, room.upper_bounds, orientation, parent_id
                    );
                    self.rooms.insert(room.id.clone(), room);
                    return true;
                }
                Err(failure) => {
                    if failure == PlacementFailure::NoTemplate {
                        warn!("No template for {} node {} off a {:?} doorway", node.room_type, node.id, orientation);
                    } else {
                        trace!("{:?} doorway of {} rejected for {}: {}", orientation, parent_id, node.id, failure);
                    }
                    if let Some(parent) = self.rooms.get_mut(parent_id) {
                        parent.doorways[parent_doorway].mark_unavailable();
                    }
                }
            }
        }
    }

    fn template_for_child<R: Rng + ?Sized>(
        &self,
        node: &RoomNode,
        parent_orientation: Orientation,
        rng: &mut R,
    ) -> Option<&RoomTemplate> {
        let room_type = if node.room_type.is_corridor() {
            if parent_orientation.is_north_south() {
                RoomType::CorridorNs
            } else if parent_orientation.is_east_west() {
                RoomType::CorridorEw
            } else {
                return None;
            }
        } else {
            node.room_type
        };

        self.templates.random_of_type(room_type, rng)
    }

    /// Aligns `room` against a parent doorway and checks it for overlaps.
    ///
    /// On success the room's bounds are set and its facing doorway is
    /// connected; the parent side is left to the caller.
    fn position_room(&self, parent: &Room, parent_doorway: usize, room: &mut Room) -> Result<(), PlacementFailure> {
        let parent_door = &parent.doorways[parent_doorway];
        let wanted = parent_door.orientation.opposite();
        let Some(child_doorway) = room
            .doorways
            .iter()
            .position(|doorway| doorway.orientation == wanted)
        else {
            return Err(PlacementFailure::NoOppositeDoorway);
        };

        let parent_door_position = parent.doorway_world_position(parent_door);
        let child_door = &room.doorways[child_doorway];
        room.lower_bounds = parent_door_position + child_door.orientation.placement_offset()
            + room.template_lower_bounds
            - child_door.position;
        room.upper_bounds = room.lower_bounds + room.template_upper_bounds - room.template_lower_bounds;

        let overlaps = self
            .rooms
            .values()
            .any(|other| other.is_positioned && other.id != room.id && room.overlaps(other));
        if overlaps {
            return Err(PlacementFailure::Overlaps);
        }

        room.doorways[child_doorway].connect();
        room.is_positioned = true;
        Ok(())
    }

    /// Rooms of the current dungeon keyed by room-node id.
    pub fn rooms(&self) -> &HashMap<String, Room> {
        &self.rooms
    }

    /// Looks up a room by id.
    pub fn room(&self, id: &str) -> Option<&Room> {
        self.rooms.get(id)
    }

    /// Mutable access for doorway locks, visit and cleared flags, and penalty grids.
    pub fn room_mut(&mut self, id: &str) -> Option<&mut Room> {
        self.rooms.get_mut(id)
    }

    /// The room built from the graph's entrance node.
    pub fn entrance_room(&self) -> Option<&Room> {
        self.rooms.values().find(|room| room.is_entrance())
    }

    /// Looks up a template of the level last passed to
    /// [`generate_dungeon`](Self::generate_dungeon).
    pub fn template(&self, id: &str) -> Option<&RoomTemplate> {
        self.templates.get(id)
    }

    /// Attempt counters of the last generation.
    pub fn stats(&self) -> BuildStats {
        self.stats
    }

    /// Drops the current dungeon.
    pub fn clear(&mut self) {
        self.rooms.clear();
    }
}
