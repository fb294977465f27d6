//! # Generation Module
//!
//! Procedural dungeon layout generation from room templates and room-node graphs.
//!
//! A level supplies a set of hand-authored [`RoomTemplate`]s and one or more
//! abstract [`RoomNodeGraph`]s describing which kinds of room hang off which.
//! The [`DungeonBuilder`] picks a graph, walks it breadth-first from the
//! entrance, and attaches a concrete template to every node through a pair of
//! facing doorways, backtracking whenever a room would overlap another.

pub mod dungeon;
pub mod encounters;
pub mod graph;
pub mod level;
pub mod templates;

pub use dungeon::*;
pub use encounters::*;
pub use graph::*;
pub use level::*;
pub use templates::*;

use crate::config;
use serde::{Deserialize, Serialize};

/// Configuration for dungeon generation and penalty painting.
///
/// The two attempt caps bound the total work of
/// [`DungeonBuilder::generate_dungeon`]: at most
/// `max_dungeon_build_attempts * max_dungeon_rebuild_attempts_for_room_graph`
/// layouts are tried before it reports failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Random seed for reproducible generation
    pub seed: u64,
    /// Number of room-node graphs drawn before giving up
    pub max_dungeon_build_attempts: u32,
    /// Number of layouts tried for each drawn graph
    pub max_dungeon_rebuild_attempts_for_room_graph: u32,
    /// Penalty painted on ordinary floor
    pub default_movement_penalty: u32,
    /// Penalty painted on preferred-path tiles
    pub preferred_path_movement_penalty: u32,
}

impl GenerationConfig {
    /// Creates a configuration with the default attempt caps and penalties.
    ///
    /// # Examples
    ///
    /// ```
    /// use delve::GenerationConfig;
    ///
    /// let config = GenerationConfig::new(12345);
    /// assert_eq!(config.seed, 12345);
    /// assert!(config.default_movement_penalty > config.preferred_path_movement_penalty);
    /// ```
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            max_dungeon_build_attempts: config::MAX_DUNGEON_BUILD_ATTEMPTS,
            max_dungeon_rebuild_attempts_for_room_graph:
                config::MAX_DUNGEON_REBUILD_ATTEMPTS_FOR_ROOM_GRAPH,
            default_movement_penalty: config::DEFAULT_MOVEMENT_PENALTY,
            preferred_path_movement_penalty: config::PREFERRED_PATH_MOVEMENT_PENALTY,
        }
    }

    /// Creates a configuration with small attempt caps for fast tests.
    pub fn for_testing(seed: u64) -> Self {
        Self {
            max_dungeon_build_attempts: 3,
            max_dungeon_rebuild_attempts_for_room_graph: 50,
            ..Self::new(seed)
        }
    }

    /// Overrides both attempt caps.
    pub fn with_attempt_limits(mut self, build_attempts: u32, rebuild_attempts: u32) -> Self {
        self.max_dungeon_build_attempts = build_attempts;
        self.max_dungeon_rebuild_attempts_for_room_graph = rebuild_attempts;
        self
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self::new(42)
    }
}

/// Classification shared by room nodes and room templates.
///
/// Graphs only use the generic `Corridor`; templates use `CorridorNs` or
/// `CorridorEw` and the builder picks between them from the orientation of
/// the doorway the corridor attaches to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum RoomType {
    /// Placeholder for unassigned graph nodes
    #[default]
    None,
    /// Root of every room-node graph
    Entrance,
    /// Graph-level corridor, resolved to north-south or east-west on placement
    Corridor,
    /// Corridor template running north to south
    CorridorNs,
    /// Corridor template running east to west
    CorridorEw,
    /// Small standard room
    Small,
    /// Medium standard room
    Medium,
    /// Large standard room
    Large,
    /// Room holding a chest
    Chest,
    /// Boss room
    Boss,
}

impl RoomType {
    /// True for all three corridor variants.
    pub fn is_corridor(self) -> bool {
        matches!(self, RoomType::Corridor | RoomType::CorridorNs | RoomType::CorridorEw)
    }

    /// True for the entrance.
    pub fn is_entrance(self) -> bool {
        self == RoomType::Entrance
    }

    /// True for the boss room.
    pub fn is_boss(self) -> bool {
        self == RoomType::Boss
    }

    /// True for the unassigned placeholder.
    pub fn is_none(self) -> bool {
        self == RoomType::None
    }
}

impl std::fmt::Display for RoomType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            RoomType::None => "none",
            RoomType::Entrance => "entrance",
            RoomType::Corridor => "corridor",
            RoomType::CorridorNs => "corridor-ns",
            RoomType::CorridorEw => "corridor-ew",
            RoomType::Small => "small",
            RoomType::Medium => "medium",
            RoomType::Large => "large",
            RoomType::Chest => "chest",
            RoomType::Boss => "boss",
        };
        f.write_str(name)
    }
}

/// Utility functions for generation.
pub mod utils {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    /// Creates a seeded random number generator from the config.
    pub fn create_rng(config: &GenerationConfig) -> StdRng {
        StdRng::seed_from_u64(config.seed)
    }
}
