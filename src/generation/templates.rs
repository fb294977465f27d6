//! # Room Templates
//!
//! Static room shapes and the registry the builder draws them from.

use crate::{
    DelveError, DelveResult, Doorway, GridPosition, Orientation, RoomEnemySpawnParameters, RoomType,
};
use log::warn;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

fn new_template_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// An authored room shape.
///
/// Bounds are the corners of the smallest rectangle enclosing the room's
/// tilemap, in the tilemap's own coordinates. Doorway and spawn positions use
/// the same coordinates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomTemplate {
    /// Unique template id
    #[serde(default = "new_template_id")]
    pub id: String,
    /// Kind of room this template can stand in for
    pub room_type: RoomType,
    /// Lower-left corner of the tilemap
    pub lower_bounds: GridPosition,
    /// Upper-right corner of the tilemap
    pub upper_bounds: GridPosition,
    /// At most one doorway per compass side
    #[serde(default)]
    pub doorways: Vec<Doorway>,
    /// Cells where enemies and chests may appear
    #[serde(default)]
    pub spawn_positions: Vec<GridPosition>,
    /// Enemy settings per dungeon level
    #[serde(default)]
    pub enemy_spawn_parameters: Vec<RoomEnemySpawnParameters>,
}

impl RoomTemplate {
    /// Creates a doorless template with a fresh unique id.
    pub fn new(room_type: RoomType, lower_bounds: GridPosition, upper_bounds: GridPosition) -> Self {
        Self {
            id: new_template_id(),
            room_type,
            lower_bounds,
            upper_bounds,
            doorways: Vec::new(),
            spawn_positions: Vec::new(),
            enemy_spawn_parameters: Vec::new(),
        }
    }

    /// Creates a `width` x `height` template anchored at (0, 0) with a
    /// doorway in the middle of each listed side.
    ///
    /// # Examples
    ///
    /// ```
    /// use delve::{GridPosition, Orientation, RoomTemplate, RoomType};
    ///
    /// let template = RoomTemplate::rectangle(
    ///     "hall",
    ///     RoomType::Medium,
    ///     9,
    ///     7,
    ///     &[Orientation::North, Orientation::West],
    /// );
    /// assert_eq!(template.upper_bounds, GridPosition::new(8, 6));
    /// assert_eq!(template.doorways[0].position, GridPosition::new(4, 6));
    /// assert_eq!(template.doorways[1].position, GridPosition::new(0, 3));
    /// assert!(template.validate().is_ok());
    /// ```
    pub fn rectangle(
        id: impl Into<String>,
        room_type: RoomType,
        width: i32,
        height: i32,
        sides: &[Orientation],
    ) -> Self {
        let upper = GridPosition::new(width - 1, height - 1);
        let mut template = Self::new(room_type, GridPosition::origin(), upper).with_id(id);

        for &side in sides {
            let position = match side {
                Orientation::North => GridPosition::new(upper.x / 2, upper.y),
                Orientation::South => GridPosition::new(upper.x / 2, 0),
                Orientation::East => GridPosition::new(upper.x, upper.y / 2),
                Orientation::West => GridPosition::new(0, upper.y / 2),
                Orientation::None => continue,
            };
            template.doorways.push(Doorway::new(position, side));
        }

        template
    }

    /// Replaces the generated id.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Adds a doorway.
    pub fn with_doorway(mut self, doorway: Doorway) -> Self {
        self.doorways.push(doorway);
        self
    }

    /// Adds a spawn position.
    pub fn with_spawn_position(mut self, position: GridPosition) -> Self {
        self.spawn_positions.push(position);
        self
    }

    /// Adds enemy settings for one dungeon level.
    pub fn with_enemy_spawn_parameters(mut self, parameters: RoomEnemySpawnParameters) -> Self {
        self.enemy_spawn_parameters.push(parameters);
        self
    }

    /// Grid columns covered by the template.
    pub fn width(&self) -> i64 {
        i64::from(self.upper_bounds.x) - i64::from(self.lower_bounds.x) + 1
    }

    /// Grid rows covered by the template.
    pub fn height(&self) -> i64 {
        i64::from(self.upper_bounds.y) - i64::from(self.lower_bounds.y) + 1
    }

    fn contains(&self, cell: GridPosition) -> bool {
        cell.x >= self.lower_bounds.x
            && cell.x <= self.upper_bounds.x
            && cell.y >= self.lower_bounds.y
            && cell.y <= self.upper_bounds.y
    }

    /// Checks the authoring rules for a template.
    ///
    /// Bounds must be ordered with each side at most `i32::MAX` cells long, the
    /// id non-empty, doorways, their bricked-up cells and spawn positions
    /// inside the bounds, at most one doorway per side, no doorway facing
    /// `None`, and graph-only types (`None`, `Corridor`) are rejected because
    /// corridor templates must commit to a direction.
    pub fn validate(&self) -> DelveResult<()> {
        if self.id.is_empty() {
            return Err(DelveError::InvalidTemplate("template id is empty".to_string()));
        }

        let max_side = i64::from(i32::MAX);
        if !(1..=max_side).contains(&self.width()) || !(1..=max_side).contains(&self.height()) {
            return Err(DelveError::InvalidTemplate(format!(
                "template {} has bounds {} .. {}",
                self.id, self.lower_bounds, self.upper_bounds
            )));
        }

        if matches!(self.room_type, RoomType::None | RoomType::Corridor) {
            return Err(DelveError::InvalidTemplate(format!(
                "template {} has graph-only type {}",
                self.id, self.room_type
            )));
        }

        for (index, doorway) in self.doorways.iter().enumerate() {
            if doorway.orientation == Orientation::None {
                return Err(DelveError::InvalidTemplate(format!(
                    "template {} has a doorway without orientation at {}",
                    self.id, doorway.position
                )));
            }
            if !self.contains(doorway.position) {
                return Err(DelveError::InvalidTemplate(format!(
                    "template {} doorway at {} lies outside its bounds",
                    self.id, doorway.position
                )));
            }
            if i64::from(doorway.copy_tile_width) > self.width()
                || i64::from(doorway.copy_tile_height) > self.height()
                || !doorway.bricked_cells().into_iter().all(|cell| self.contains(cell))
            {
                return Err(DelveError::InvalidTemplate(format!(
                    "template {} {:?} doorway is bricked up outside its bounds",
                    self.id, doorway.orientation
                )));
            }
            if self.doorways[..index]
                .iter()
                .any(|other| other.orientation == doorway.orientation)
            {
                return Err(DelveError::InvalidTemplate(format!(
                    "template {} has two {:?} doorways",
                    self.id, doorway.orientation
                )));
            }
        }

        if let Some(position) = self.spawn_positions.iter().find(|p| !self.contains(**p)) {
            return Err(DelveError::InvalidTemplate(format!(
                "template {} spawn position {} lies outside its bounds",
                self.id, position
            )));
        }

        for parameters in &self.enemy_spawn_parameters {
            parameters.validate()?;
        }

        Ok(())
    }
}

/// Read-only lookup of the templates available to one level.
#[derive(Debug, Clone, Default)]
pub struct RoomTemplateRegistry {
    templates: Vec<RoomTemplate>,
    by_id: HashMap<String, usize>,
}

impl RoomTemplateRegistry {
    /// Builds a registry, keeping the first template for each id.
    ///
    /// Later templates that reuse an id are logged and dropped.
    pub fn from_templates<I>(templates: I) -> Self
    where
        I: IntoIterator<Item = RoomTemplate>,
    {
        let mut registry = Self::default();
        for template in templates {
            if registry.by_id.contains_key(&template.id) {
                warn!("Duplicate room template id: {}", template.id);
                continue;
            }
            registry.by_id.insert(template.id.clone(), registry.templates.len());
            registry.templates.push(template);
        }
        registry
    }

    /// Looks up a template by id.
    pub fn get(&self, id: &str) -> Option<&RoomTemplate> {
        self.by_id.get(id).map(|&index| &self.templates[index])
    }

    /// All templates in insertion order.
    pub fn templates(&self) -> &[RoomTemplate] {
        &self.templates
    }

    /// Number of templates.
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    /// Whether the registry holds no templates.
    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Picks a template of the given type uniformly at random.
    pub fn random_of_type<R: Rng + ?Sized>(&self, room_type: RoomType, rng: &mut R) -> Option<&RoomTemplate> {
        let matching: Vec<&RoomTemplate> = self
            .templates
            .iter()
            .filter(|template| template.room_type == room_type)
            .collect();
        matching.choose(rng).copied()
    }
}
