//! # Encounter Parameters
//!
//! Per-level enemy spawn settings carried by room templates.
//!
//! Spawning itself belongs to the host. The builder only needs the totals to
//! decide whether a freshly created room starts out cleared.

use crate::{DelveError, DelveResult};
use serde::{Deserialize, Serialize};

/// Enemy spawn settings of one room template on one dungeon level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomEnemySpawnParameters {
    /// Name of the dungeon level these settings apply to
    pub dungeon_level: String,
    /// Fewest enemies spawned over the whole encounter
    pub min_total_enemies: u32,
    /// Most enemies spawned over the whole encounter
    pub max_total_enemies: u32,
    /// Fewest enemies alive at once
    #[serde(default)]
    pub min_concurrent_enemies: u32,
    /// Most enemies alive at once
    #[serde(default)]
    pub max_concurrent_enemies: u32,
    /// Shortest gap between spawns, in seconds
    #[serde(default)]
    pub min_spawn_interval: u32,
    /// Longest gap between spawns, in seconds
    #[serde(default)]
    pub max_spawn_interval: u32,
}

impl RoomEnemySpawnParameters {
    /// Creates settings with the given totals and one enemy alive at a time.
    ///
    /// # Examples
    ///
    /// ```
    /// use delve::RoomEnemySpawnParameters;
    ///
    /// let parameters = RoomEnemySpawnParameters::new("level-1", 2, 5);
    /// assert!(parameters.validate().is_ok());
    /// assert!(parameters.spawns_enemies());
    /// ```
    pub fn new(dungeon_level: impl Into<String>, min_total_enemies: u32, max_total_enemies: u32) -> Self {
        Self {
            dungeon_level: dungeon_level.into(),
            min_total_enemies,
            max_total_enemies,
            min_concurrent_enemies: 1,
            max_concurrent_enemies: 1,
            min_spawn_interval: 0,
            max_spawn_interval: 0,
        }
    }

    /// Sets the concurrent enemy range.
    pub fn with_concurrency(mut self, min: u32, max: u32) -> Self {
        self.min_concurrent_enemies = min;
        self.max_concurrent_enemies = max;
        self
    }

    /// Sets the spawn interval range.
    pub fn with_spawn_interval(mut self, min: u32, max: u32) -> Self {
        self.min_spawn_interval = min;
        self.max_spawn_interval = max;
        self
    }

    /// Whether any enemy can spawn with these settings.
    pub fn spawns_enemies(&self) -> bool {
        self.max_total_enemies > 0
    }

    /// Checks that every min/max pair is ordered.
    pub fn validate(&self) -> DelveResult<()> {
        let ranges = [
            ("total enemies", self.min_total_enemies, self.max_total_enemies),
            ("concurrent enemies", self.min_concurrent_enemies, self.max_concurrent_enemies),
            ("spawn interval", self.min_spawn_interval, self.max_spawn_interval),
        ];

        for (name, min, max) in ranges {
            if min > max {
                return Err(DelveError::InvalidTemplate(format!(
                    "{} range {}..{} is reversed for level {}",
                    name, min, max, self.dungeon_level
                )));
            }
        }

        Ok(())
    }
}
