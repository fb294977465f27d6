//! # Room Node Graphs
//!
//! Abstract dungeon shapes: which kinds of room hang off which, with no
//! geometry attached.
//!
//! A graph is a tree rooted at a single entrance. Rooms and corridors
//! alternate along every branch, so every pair of rooms is joined by exactly
//! one corridor. [`RoomNodeGraph::connect`] enforces the authoring rules as
//! links are added, and [`RoomNodeGraph::validate`] re-checks the shape of a
//! graph loaded from disk.

use crate::config::MAX_CHILD_CORRIDORS;
use crate::{DelveError, DelveResult, RoomType};
use serde::{Deserialize, Serialize};
use std::collections::{HashSet, VecDeque};

/// One node of a room graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomNode {
    /// Unique id within the graph; placed rooms reuse it
    pub id: String,
    /// Kind of room required here
    pub room_type: RoomType,
    /// Parent ids; a well-formed node has at most one
    #[serde(default)]
    pub parent_ids: Vec<String>,
    /// Child ids in authoring order
    #[serde(default)]
    pub child_ids: Vec<String>,
}

impl RoomNode {
    /// Creates an unlinked node.
    pub fn new(id: impl Into<String>, room_type: RoomType) -> Self {
        Self {
            id: id.into(),
            room_type,
            parent_ids: Vec::new(),
            child_ids: Vec::new(),
        }
    }

    /// First parent id, if any.
    pub fn parent_id(&self) -> Option<&str> {
        self.parent_ids.first().map(String::as_str)
    }
}

/// A named tree of [`RoomNode`]s.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RoomNodeGraph {
    /// Display name of the graph
    pub name: String,
    /// All nodes, in authoring order
    #[serde(default)]
    pub nodes: Vec<RoomNode>,
}

impl RoomNodeGraph {
    /// Creates an empty graph.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            nodes: Vec::new(),
        }
    }

    /// Adds an unlinked node.
    ///
    /// Fails when the id is already taken. Links carried by `node` are dropped;
    /// use [`connect`](Self::connect) to wire it up.
    pub fn add_node(&mut self, mut node: RoomNode) -> DelveResult<()> {
        if self.node(&node.id).is_some() {
            return Err(DelveError::InvalidGraph(format!(
                "duplicate room node id {}",
                node.id
            )));
        }
        node.parent_ids.clear();
        node.child_ids.clear();
        self.nodes.push(node);
        Ok(())
    }

    /// Looks up a node by id.
    pub fn node(&self, id: &str) -> Option<&RoomNode> {
        self.nodes.iter().find(|node| node.id == id)
    }

    fn node_mut(&mut self, id: &str) -> Option<&mut RoomNode> {
        self.nodes.iter_mut().find(|node| node.id == id)
    }

    /// The first node typed as an entrance.
    pub fn entrance(&self) -> Option<&RoomNode> {
        self.nodes.iter().find(|node| node.room_type.is_entrance())
    }

    /// Children of `node` that exist in this graph, in authoring order.
    pub fn children<'a>(&'a self, node: &'a RoomNode) -> impl Iterator<Item = &'a RoomNode> + 'a {
        node.child_ids.iter().filter_map(move |id| self.node(id))
    }

    fn has_connected_boss(&self) -> bool {
        self.nodes
            .iter()
            .any(|node| node.room_type.is_boss() && !node.parent_ids.is_empty())
    }

    /// Checks whether `child_id` may become a child of `parent_id`.
    ///
    /// # Examples
    ///
    /// ```
    /// use delve::{RoomNode, RoomNodeGraph, RoomType};
    ///
    /// let mut graph = RoomNodeGraph::new("tiny");
    /// graph.add_node(RoomNode::new("entrance", RoomType::Entrance)).unwrap();
    /// graph.add_node(RoomNode::new("corridor", RoomType::Corridor)).unwrap();
    /// graph.add_node(RoomNode::new("room", RoomType::Small)).unwrap();
    ///
    /// assert!(graph.can_connect("entrance", "corridor").is_ok());
    /// // Rooms only link through corridors
    /// assert!(graph.can_connect("entrance", "room").is_err());
    /// ```
    pub fn can_connect(&self, parent_id: &str, child_id: &str) -> DelveResult<()> {
        let reject = |reason: &str| {
            Err(DelveError::InvalidGraph(format!(
                "cannot link {} -> {}: {}",
                parent_id, child_id, reason
            )))
        };

        let Some(parent) = self.node(parent_id) else {
            return reject("parent does not exist");
        };
        let Some(child) = self.node(child_id) else {
            return reject("child does not exist");
        };

        if child.room_type.is_none() {
            return reject("child has no room type");
        }
        if parent.id == child.id {
            return reject("a node cannot link to itself");
        }
        if parent.child_ids.iter().any(|id| id == child_id) {
            return reject("already linked");
        }
        if parent.parent_ids.iter().any(|id| id == child_id) {
            return reject("child is the parent's parent");
        }
        if !child.parent_ids.is_empty() {
            return reject("child already has a parent");
        }
        if child.room_type.is_entrance() {
            return reject("the entrance cannot be a child");
        }
        if child.room_type.is_boss() && self.has_connected_boss() {
            return reject("a boss room is already connected");
        }

        let parent_is_corridor = parent.room_type.is_corridor();
        let child_is_corridor = child.room_type.is_corridor();

        if parent_is_corridor && child_is_corridor {
            return reject("corridors cannot link to corridors");
        }
        if !parent_is_corridor && !child_is_corridor {
            return reject("rooms must link through a corridor");
        }
        if parent_is_corridor && !parent.child_ids.is_empty() {
            return reject("a corridor leads to a single room");
        }
        if child_is_corridor {
            let corridor_children = self
                .children(parent)
                .filter(|node| node.room_type.is_corridor())
                .count();
            if corridor_children >= MAX_CHILD_CORRIDORS {
                return reject("too many corridors");
            }
        }

        Ok(())
    }

    /// Links `child_id` under `parent_id` after checking [`can_connect`](Self::can_connect).
    pub fn connect(&mut self, parent_id: &str, child_id: &str) -> DelveResult<()> {
        self.can_connect(parent_id, child_id)?;

        if let Some(parent) = self.node_mut(parent_id) {
            parent.child_ids.push(child_id.to_string());
        }
        if let Some(child) = self.node_mut(child_id) {
            child.parent_ids.push(parent_id.to_string());
        }
        Ok(())
    }

    /// Checks the shape of a graph built outside [`connect`](Self::connect).
    ///
    /// Node ids must be unique and typed, there must be exactly one entrance
    /// with no parent, every other node must have exactly one parent that
    /// lists it as a child, and every node must be reachable from the
    /// entrance.
    pub fn validate(&self) -> DelveResult<()> {
        let invalid = |message: String| Err(DelveError::InvalidGraph(format!("{}: {}", self.name, message)));

        let mut ids = HashSet::new();
        for node in &self.nodes {
            if !ids.insert(node.id.as_str()) {
                return invalid(format!("duplicate room node id {}", node.id));
            }
            if node.room_type.is_none() {
                return invalid(format!("room node {} has no room type", node.id));
            }
        }

        let entrances: Vec<&RoomNode> = self
            .nodes
            .iter()
            .filter(|node| node.room_type.is_entrance())
            .collect();
        let entrance = match entrances.as_slice() {
            [entrance] => *entrance,
            [] => return invalid("no entrance".to_string()),
            _ => return invalid(format!("{} entrances", entrances.len())),
        };
        if !entrance.parent_ids.is_empty() {
            return invalid("the entrance has a parent".to_string());
        }

        for node in &self.nodes {
            for child_id in &node.child_ids {
                match self.node(child_id) {
                    Some(child) if child.parent_ids.iter().any(|id| *id == node.id) => {}
                    Some(_) => {
                        return invalid(format!("{} does not list {} as parent", child_id, node.id))
                    }
                    None => return invalid(format!("{} has unknown child {}", node.id, child_id)),
                }
            }

            if node.id == entrance.id {
                continue;
            }
            match node.parent_ids.as_slice() {
                [parent_id] => {
                    let listed = self
                        .node(parent_id)
                        .is_some_and(|parent| parent.child_ids.iter().any(|id| *id == node.id));
                    if !listed {
                        return invalid(format!("{} is not a child of {}", node.id, parent_id));
                    }
                }
                [] => return invalid(format!("{} has no parent", node.id)),
                _ => return invalid(format!("{} has several parents", node.id)),
            }
        }

        let mut reached = HashSet::from([entrance.id.as_str()]);
        let mut queue = VecDeque::from([entrance]);
        while let Some(node) = queue.pop_front() {
            for child in self.children(node) {
                if reached.insert(child.id.as_str()) {
                    queue.push_back(child);
                }
            }
        }
        if reached.len() != self.nodes.len() {
            return invalid("some nodes are unreachable from the entrance".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph_with(nodes: &[(&str, RoomType)]) -> RoomNodeGraph {
        let mut graph = RoomNodeGraph::new("test");
        for (id, room_type) in nodes {
            graph.add_node(RoomNode::new(*id, *room_type)).unwrap();
        }
        graph
    }

    #[test]
    fn test_add_node_rejects_duplicates() {
        let mut graph = graph_with(&[("a", RoomType::Entrance)]);
        assert!(graph.add_node(RoomNode::new("a", RoomType::Small)).is_err());
        assert_eq!(graph.nodes.len(), 1);
    }

    #[test]
    fn test_connect_links_both_ways() {
        let mut graph = graph_with(&[("entrance", RoomType::Entrance), ("c1", RoomType::Corridor)]);
        graph.connect("entrance", "c1").unwrap();

        let entrance = graph.entrance().unwrap();
        assert_eq!(entrance.child_ids, vec!["c1".to_string()]);
        assert_eq!(graph.node("c1").unwrap().parent_id(), Some("entrance"));
        assert_eq!(graph.children(entrance).count(), 1);
    }

    #[test]
    fn test_room_and_corridor_must_alternate() {
        let mut graph = graph_with(&[
            ("entrance", RoomType::Entrance),
            ("c1", RoomType::Corridor),
            ("c2", RoomType::Corridor),
            ("small", RoomType::Small),
        ]);

        assert!(graph.can_connect("entrance", "small").is_err());
        graph.connect("entrance", "c1").unwrap();
        assert!(graph.can_connect("c1", "c2").is_err());
        graph.connect("c1", "small").unwrap();
    }

    #[test]
    fn test_structural_rejections() {
        let mut graph = graph_with(&[
            ("entrance", RoomType::Entrance),
            ("c1", RoomType::Corridor),
            ("small", RoomType::Small),
            ("medium", RoomType::Medium),
            ("blank", RoomType::None),
        ]);
        graph.connect("entrance", "c1").unwrap();
        graph.connect("c1", "small").unwrap();

        // Self link, duplicate link, second parent, missing child
        assert!(graph.can_connect("c1", "c1").is_err());
        assert!(graph.can_connect("entrance", "c1").is_err());
        assert!(graph.can_connect("small", "c1").is_err());
        assert!(graph.can_connect("c1", "ghost").is_err());

        // Corridor already leads somewhere
        assert!(graph.can_connect("c1", "medium").is_err());

        // Untyped node and the entrance can never be children
        assert!(graph.can_connect("entrance", "blank").is_err());
        assert!(graph.can_connect("c1", "entrance").is_err());
    }

    #[test]
    fn test_corridor_limit_per_room() {
        let mut graph = graph_with(&[
            ("entrance", RoomType::Entrance),
            ("c1", RoomType::Corridor),
            ("c2", RoomType::Corridor),
            ("c3", RoomType::Corridor),
            ("c4", RoomType::Corridor),
        ]);
        for id in ["c1", "c2", "c3"] {
            graph.connect("entrance", id).unwrap();
        }
        assert!(graph.can_connect("entrance", "c4").is_err());
    }

    #[test]
    fn test_single_boss_room() {
        let mut graph = graph_with(&[
            ("entrance", RoomType::Entrance),
            ("c1", RoomType::Corridor),
            ("c2", RoomType::Corridor),
            ("boss", RoomType::Boss),
            ("boss2", RoomType::Boss),
        ]);
        graph.connect("entrance", "c1").unwrap();
        graph.connect("entrance", "c2").unwrap();
        graph.connect("c1", "boss").unwrap();

        let err = graph.can_connect("c2", "boss2").unwrap_err();
        assert!(err.to_string().contains("boss"));
    }

    #[test]
    fn test_validate_connected_graph() {
        let mut graph = graph_with(&[
            ("entrance", RoomType::Entrance),
            ("c1", RoomType::Corridor),
            ("small", RoomType::Small),
        ]);
        graph.connect("entrance", "c1").unwrap();
        graph.connect("c1", "small").unwrap();
        assert!(graph.validate().is_ok());
    }

    #[test]
    fn test_validate_rejections() {
        let no_entrance = graph_with(&[("small", RoomType::Small)]);
        assert!(no_entrance.validate().is_err());

        let two_entrances = graph_with(&[("a", RoomType::Entrance), ("b", RoomType::Entrance)]);
        assert!(two_entrances.validate().is_err());

        let orphan = graph_with(&[("entrance", RoomType::Entrance), ("c1", RoomType::Corridor)]);
        assert!(orphan.validate().is_err());

        let mut dangling = graph_with(&[("entrance", RoomType::Entrance)]);
        dangling.nodes[0].child_ids.push("ghost".to_string());
        assert!(dangling.validate().is_err());

        // Two corridors pointing at each other, detached from the entrance
        let mut cycle = graph_with(&[
            ("entrance", RoomType::Entrance),
            ("a", RoomType::Corridor),
            ("b", RoomType::Small),
        ]);
        cycle.nodes[1].parent_ids.push("b".to_string());
        cycle.nodes[1].child_ids.push("b".to_string());
        cycle.nodes[2].parent_ids.push("a".to_string());
        cycle.nodes[2].child_ids.push("a".to_string());
        assert!(cycle.validate().is_err());
    }

    #[test]
    fn test_graph_json_defaults() {
        let json = r#"{"name":"g","nodes":[{"id":"entrance","room_type":"Entrance"}]}"#;
        let graph: RoomNodeGraph = serde_json::from_str(json).unwrap();
        assert!(graph.entrance().unwrap().parent_ids.is_empty());
        assert!(graph.validate().is_ok());
    }
}
