//! # Dungeon Levels
//!
//! The input to the dungeon builder: a level's room templates plus the
//! candidate room-node graphs one layout is drawn from.

use crate::{
    DelveResult, Doorway, GridPosition, Orientation, RoomEnemySpawnParameters, RoomNode,
    RoomNodeGraph, RoomTemplate, RoomTemplateRegistry, RoomType,
};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Everything the builder needs to lay out one dungeon level.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DungeonLevel {
    /// Level name; matched against per-level enemy spawn settings
    pub name: String,
    /// Templates available on this level
    #[serde(default)]
    pub room_templates: Vec<RoomTemplate>,
    /// Candidate graphs; each build attempt draws one at random
    #[serde(default)]
    pub room_node_graphs: Vec<RoomNodeGraph>,
}

impl DungeonLevel {
    /// Creates an empty level.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Parses and validates a level from JSON.
    pub fn from_json_str(json: &str) -> DelveResult<Self> {
        let level: Self = serde_json::from_str(json)?;
        level.validate()?;
        Ok(level)
    }

    /// Serializes the level to pretty-printed JSON.
    pub fn to_json_string(&self) -> DelveResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reads and validates a level file.
    pub fn load_from_file(path: impl AsRef<Path>) -> DelveResult<Self> {
        let path = path.as_ref();
        debug!("Loading dungeon level from {}", path.display());
        let json = fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Writes the level as JSON, replacing any existing file.
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> DelveResult<()> {
        let path = path.as_ref();
        debug!("Saving dungeon level {} to {}", self.name, path.display());
        fs::write(path, self.to_json_string()?)?;
        Ok(())
    }

    /// Builds the template lookup for this level.
    pub fn template_registry(&self) -> RoomTemplateRegistry {
        RoomTemplateRegistry::from_templates(self.room_templates.iter().cloned())
    }

    /// Looks up a graph by name.
    pub fn graph(&self, name: &str) -> Option<&RoomNodeGraph> {
        self.room_node_graphs.iter().find(|graph| graph.name == name)
    }

    /// Validates every template and graph.
    ///
    /// Graph nodes whose type no template can fill are only logged: the
    /// builder treats them as unplaceable and retries, which is legitimate
    /// for levels that are still being authored.
    pub fn validate(&self) -> DelveResult<()> {
        for template in &self.room_templates {
            template.validate()?;
        }

        for graph in &self.room_node_graphs {
            graph.validate()?;

            for node in &graph.nodes {
                let fillable = if node.room_type.is_corridor() {
                    self.has_template(RoomType::CorridorNs) || self.has_template(RoomType::CorridorEw)
                } else {
                    self.has_template(node.room_type)
                };
                if !fillable {
                    warn!(
                        "Level {} graph {}: no template for {} node {}",
                        self.name, graph.name, node.room_type, node.id
                    );
                }
            }
        }

        Ok(())
    }

    fn has_template(&self, room_type: RoomType) -> bool {
        self.room_templates
            .iter()
            .any(|template| template.room_type == room_type)
    }

    /// A small built-in level with two graph variants.
    ///
    /// # Examples
    ///
    /// ```
    /// use delve::DungeonLevel;
    ///
    /// let level = DungeonLevel::demo();
    /// assert!(level.validate().is_ok());
    /// assert_eq!(level.room_node_graphs.len(), 2);
    /// ```
    pub fn demo() -> Self {
        let level_name = "level-1";
        let all_sides = Orientation::cardinal();

        let small_offset = RoomTemplate::new(
            RoomType::Small,
            GridPosition::new(-4, -4),
            GridPosition::new(4, 4),
        )
        .with_id("small-centred")
        .with_doorway(Doorway::new(GridPosition::new(0, 4), Orientation::North))
        .with_doorway(Doorway::new(GridPosition::new(4, 0), Orientation::East))
        .with_doorway(Doorway::new(GridPosition::new(0, -4), Orientation::South))
        .with_doorway(Doorway::new(GridPosition::new(-4, 0), Orientation::West))
        .with_spawn_position(GridPosition::new(-2, 2))
        .with_spawn_position(GridPosition::new(2, -2))
        .with_enemy_spawn_parameters(RoomEnemySpawnParameters::new(level_name, 1, 3));

        let room_templates = vec![
            RoomTemplate::rectangle("entrance", RoomType::Entrance, 11, 11, &all_sides),
            RoomTemplate::rectangle("corridor-ns", RoomType::CorridorNs, 5, 8, &[Orientation::North, Orientation::South]),
            RoomTemplate::rectangle("corridor-ew", RoomType::CorridorEw, 8, 5, &[Orientation::East, Orientation::West]),
            RoomTemplate::rectangle("small", RoomType::Small, 9, 9, &all_sides)
                .with_spawn_position(GridPosition::new(2, 2))
                .with_spawn_position(GridPosition::new(6, 6))
                .with_enemy_spawn_parameters(RoomEnemySpawnParameters::new(level_name, 2, 4)),
            small_offset,
            RoomTemplate::rectangle("medium", RoomType::Medium, 13, 11, &all_sides)
                .with_spawn_position(GridPosition::new(3, 3))
                .with_spawn_position(GridPosition::new(9, 7))
                .with_enemy_spawn_parameters(
                    RoomEnemySpawnParameters::new(level_name, 3, 6).with_concurrency(1, 3),
                ),
            RoomTemplate::rectangle("chest", RoomType::Chest, 7, 7, &all_sides)
                .with_spawn_position(GridPosition::new(3, 3)),
            RoomTemplate::rectangle("boss", RoomType::Boss, 15, 15, &all_sides)
                .with_spawn_position(GridPosition::new(7, 9))
                .with_enemy_spawn_parameters(RoomEnemySpawnParameters::new(level_name, 1, 1)),
        ];

        Self {
            name: level_name.to_string(),
            room_templates,
            room_node_graphs: vec![demo_branching_graph(), demo_linear_graph()],
        }
    }
}

fn linked_graph(name: &str, nodes: &[(&str, RoomType)], links: &[(&str, &str)]) -> RoomNodeGraph {
    let mut graph = RoomNodeGraph::new(name);
    for (id, room_type) in nodes {
        graph.nodes.push(RoomNode::new(*id, *room_type));
    }
    for (parent_id, child_id) in links {
        if let Err(err) = graph.connect(parent_id, child_id) {
            warn!("Built-in graph {}: {}", name, err);
        }
    }
    graph
}

fn demo_branching_graph() -> RoomNodeGraph {
    linked_graph(
        "branching",
        &[
            ("entrance", RoomType::Entrance),
            ("corridor-1", RoomType::Corridor),
            ("corridor-2", RoomType::Corridor),
            ("corridor-3", RoomType::Corridor),
            ("corridor-4", RoomType::Corridor),
            ("small-1", RoomType::Small),
            ("medium-1", RoomType::Medium),
            ("chest-1", RoomType::Chest),
            ("boss", RoomType::Boss),
        ],
        &[
            ("entrance", "corridor-1"),
            ("entrance", "corridor-2"),
            ("entrance", "corridor-3"),
            ("corridor-1", "small-1"),
            ("corridor-2", "medium-1"),
            ("corridor-3", "chest-1"),
            ("medium-1", "corridor-4"),
            ("corridor-4", "boss"),
        ],
    )
}

fn demo_linear_graph() -> RoomNodeGraph {
    linked_graph(
        "linear",
        &[
            ("entrance", RoomType::Entrance),
            ("corridor-1", RoomType::Corridor),
            ("small-1", RoomType::Small),
            ("corridor-2", RoomType::Corridor),
            ("medium-1", RoomType::Medium),
            ("corridor-3", RoomType::Corridor),
            ("boss", RoomType::Boss),
        ],
        &[
            ("entrance", "corridor-1"),
            ("corridor-1", "small-1"),
            ("small-1", "corridor-2"),
            ("corridor-2", "medium-1"),
            ("medium-1", "corridor-3"),
            ("corridor-3", "boss"),
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DelveError;

    #[test]
    fn test_demo_level_is_valid() {
        let level = DungeonLevel::demo();
        assert!(level.validate().is_ok());
        assert_eq!(level.template_registry().len(), level.room_templates.len());

        let branching = level.graph("branching").unwrap();
        assert_eq!(branching.entrance().unwrap().child_ids.len(), 3);
        assert_eq!(branching.nodes.len(), 9);
        assert!(level.graph("linear").is_some());
        assert!(level.graph("missing").is_none());
    }

    #[test]
    fn test_json_round_trip() {
        let level = DungeonLevel::demo();
        let json = level.to_json_string().unwrap();
        let restored = DungeonLevel::from_json_str(&json).unwrap();
        assert_eq!(restored, level);
    }

    #[test]
    fn test_invalid_json_is_a_serde_error() {
        let err = DungeonLevel::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, DelveError::Serde(_)));
    }

    #[test]
    fn test_invalid_graph_rejected_on_load() {
        let mut level = DungeonLevel::demo();
        level.room_node_graphs[0].nodes.retain(|node| !node.room_type.is_entrance());
        let json = serde_json::to_string(&level).unwrap();

        let err = DungeonLevel::from_json_str(&json).unwrap_err();
        assert!(matches!(err, DelveError::InvalidGraph(_)));
    }

    #[test]
    fn test_invalid_template_rejected_on_load() {
        let mut level = DungeonLevel::new("broken");
        level.room_templates.push(RoomTemplate::rectangle("c", RoomType::Corridor, 3, 8, &[]));
        let json = serde_json::to_string(&level).unwrap();

        let err = DungeonLevel::from_json_str(&json).unwrap_err();
        assert!(matches!(err, DelveError::InvalidTemplate(_)));
    }

    #[test]
    fn test_unfillable_node_only_warns() {
        let mut level = DungeonLevel::demo();
        level.room_templates.retain(|template| template.room_type != RoomType::Chest);
        assert!(level.validate().is_ok());
    }
}
