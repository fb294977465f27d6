//! # Delve
//!
//! Dungeon layout generation and room-local pathfinding for 2D dungeon crawlers.
//!
//! ## Architecture Overview
//!
//! Delve is the placement and navigation core of a room-based dungeon crawler.
//! The host game owns rendering, physics and input; this crate owns the two
//! pieces with real search in them:
//!
//! - **Geometry**: integer grid cells, doorway orientations and the cell/world transform
//! - **Rooms**: placed instances of room templates, with deep-copied doorways
//! - **Generation**: room templates, abstract room-node graphs, and the backtracking
//!   [`DungeonBuilder`] that turns a graph into a non-overlapping layout
//! - **Pathfinding**: A* over a room's movement-penalty grid
//!
//! ## Quick Start
//!
//! ```
//! use delve::{DungeonBuilder, DungeonLevel, GenerationConfig};
//!
//! let config = GenerationConfig::for_testing(7);
//! let mut rng = delve::generation::utils::create_rng(&config);
//! let mut builder = DungeonBuilder::new(config);
//!
//! assert!(builder.generate_dungeon(&DungeonLevel::demo(), &mut rng));
//! assert!(builder.entrance_room().is_some());
//! ```

pub mod game;
pub mod generation;
pub mod utils;

pub use game::*;
pub use generation::*;
pub use utils::*;

pub use game::{
    CellTransform, CollisionLayer, CollisionTile, Doorway, GridPosition, MovementPenaltyGrid,
    Orientation, Room, WorldPosition,
};

pub use generation::{
    BuildStats, DungeonBuilder, DungeonLevel, GenerationConfig, RoomEnemySpawnParameters,
    RoomNode, RoomNodeGraph, RoomTemplate, RoomTemplateRegistry, RoomType,
};

pub use utils::{build_path, find_path_cells, nearest_walkable_cell, MovementPath};

/// Core error type for the Delve crate.
#[derive(thiserror::Error, Debug)]
pub enum DelveError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// Runtime state does not fit the operation
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Room-node graph breaks a connection rule
    #[error("Invalid room node graph: {0}")]
    InvalidGraph(String),

    /// Room template data is malformed
    #[error("Invalid room template: {0}")]
    InvalidTemplate(String),

    /// Generation failed
    #[error("Generation failed: {0}")]
    GenerationFailed(String),
}

/// Result type used throughout the Delve codebase.
pub type DelveResult<T> = Result<T, DelveError>;

/// Version information for the crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Generation and pathfinding defaults.
pub mod config {
    /// Number of room-node graphs tried before generation gives up
    pub const MAX_DUNGEON_BUILD_ATTEMPTS: u32 = 10;

    /// Number of layouts tried for one room-node graph
    pub const MAX_DUNGEON_REBUILD_ATTEMPTS_FOR_ROOM_GRAPH: u32 = 1000;

    /// Movement penalty of an ordinary floor cell
    pub const DEFAULT_MOVEMENT_PENALTY: u32 = 40;

    /// Movement penalty of a cell painted as a preferred enemy path
    pub const PREFERRED_PATH_MOVEMENT_PENALTY: u32 = 1;

    /// Maximum corridor children of a single room node
    pub const MAX_CHILD_CORRIDORS: usize = 3;

    /// Width in tiles of every doorway opening
    pub const DOORWAY_OPENING_WIDTH: i32 = 3;
}
