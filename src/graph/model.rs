//! Graph of QR marker locations
//!
//! Nodes are identified by the string encoded in their QR marker. Edges are
//! directed and carry the turn a walker takes to reach the neighbor. Nothing
//! here mutates after construction.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Turn instruction attached to an edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Forward,
    Left,
    Right,
    Back,
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Forward => write!(f, "forward"),
            Direction::Left => write!(f, "left"),
            Direction::Right => write!(f, "right"),
            Direction::Back => write!(f, "back"),
        }
    }
}

/// A node as authored in a graph file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeSpec {
    /// Marker payload identifying the node
    pub id: String,
    /// Destination label, `None` for plain waypoints
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,
}

/// A directed edge as authored in a graph file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeSpec {
    pub from: String,
    pub to: String,
    pub direction: Direction,
}

/// Serializable description of a graph
///
/// Edge order is significant: it becomes each node's neighbor order and
/// therefore the pathfinder's tie-break.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphSpec {
    #[serde(default)]
    pub nodes: Vec<NodeSpec>,
    #[serde(default)]
    pub edges: Vec<EdgeSpec>,
}

/// Errors raised while building or loading a graph
#[derive(Debug, Error)]
pub enum GraphError {
    #[error("node {0} is declared more than once")]
    DuplicateNode(String),

    #[error("edge {from} -> {to} references an undeclared node")]
    UnknownEndpoint { from: String, to: String },

    #[error("failed to read graph file {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid graph file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Immutable marker graph
#[derive(Debug, Clone)]
pub struct Graph {
    /// Nodes in declaration order
    nodes: Vec<NodeSpec>,
    /// Node id -> position in `nodes`
    index: HashMap<String, usize>,
    /// Outgoing edges per node, in authored order
    adjacency: HashMap<String, Vec<(String, Direction)>>,
}

impl Graph {
    /// Build a graph, validating ids and edge endpoints
    pub fn from_spec(spec: GraphSpec) -> Result<Self, GraphError> {
        let mut index = HashMap::with_capacity(spec.nodes.len());
        for (i, node) in spec.nodes.iter().enumerate() {
            if index.insert(node.id.clone(), i).is_some() {
                return Err(GraphError::DuplicateNode(node.id.clone()));
            }
        }

        let mut adjacency: HashMap<String, Vec<(String, Direction)>> = HashMap::new();
        for edge in spec.edges {
            if !index.contains_key(&edge.from) || !index.contains_key(&edge.to) {
                return Err(GraphError::UnknownEndpoint {
                    from: edge.from,
                    to: edge.to,
                });
            }
            adjacency
                .entry(edge.from)
                .or_default()
                .push((edge.to, edge.direction));
        }

        Ok(Self {
            nodes: spec.nodes,
            index,
            adjacency,
        })
    }

    /// Load a graph from a TOML file
    pub fn load(path: &Path) -> Result<Self, GraphError> {
        let contents = std::fs::read_to_string(path).map_err(|source| GraphError::Read {
            path: path.to_owned(),
            source,
        })?;
        let spec: GraphSpec = toml::from_str(&contents)?;
        Self::from_spec(spec)
    }

    /// Whether `id` names a node
    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Outgoing edges of `id` in authored order, empty for unknown nodes
    pub fn neighbors(&self, id: &str) -> &[(String, Direction)] {
        self.adjacency.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Direction label on the edge `from -> to`, if such an edge exists
    pub fn direction_between(&self, from: &str, to: &str) -> Option<Direction> {
        self.neighbors(from)
            .iter()
            .find(|(neighbor, _)| neighbor == to)
            .map(|(_, direction)| *direction)
    }

    /// Node declaring the destination `label`
    ///
    /// Labels are expected to be unique; with duplicates the first declared
    /// node is returned.
    pub fn destination_node_for(&self, label: &str) -> Option<&str> {
        self.nodes
            .iter()
            .find(|node| node.destination.as_deref() == Some(label))
            .map(|node| node.id.as_str())
    }

    /// All destination labels in declaration order
    pub fn destinations(&self) -> Vec<&str> {
        self.nodes
            .iter()
            .filter_map(|node| node.destination.as_deref())
            .collect()
    }

    /// Node ids in declaration order
    pub fn node_ids(&self) -> impl Iterator<Item = &str> {
        self.nodes.iter().map(|node| node.id.as_str())
    }

    /// Number of nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the graph has no nodes
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: &str, destination: Option<&str>) -> NodeSpec {
        NodeSpec {
            id: id.to_string(),
            destination: destination.map(str::to_string),
        }
    }

    fn edge(from: &str, to: &str, direction: Direction) -> EdgeSpec {
        EdgeSpec {
            from: from.to_string(),
            to: to.to_string(),
            direction,
        }
    }

    #[test]
    fn test_neighbors_keep_authored_order() {
        let graph = Graph::from_spec(GraphSpec {
            nodes: vec![node("A", None), node("B", None), node("C", None)],
            edges: vec![
                edge("A", "C", Direction::Right),
                edge("A", "B", Direction::Left),
            ],
        })
        .unwrap();

        let ids: Vec<&str> = graph.neighbors("A").iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(ids, vec!["C", "B"]);
        assert!(graph.neighbors("B").is_empty());
        assert!(graph.neighbors("missing").is_empty());
    }

    #[test]
    fn test_edges_are_directed() {
        let graph = Graph::from_spec(GraphSpec {
            nodes: vec![node("A", None), node("B", None)],
            edges: vec![edge("A", "B", Direction::Forward)],
        })
        .unwrap();

        assert_eq!(graph.direction_between("A", "B"), Some(Direction::Forward));
        assert_eq!(graph.direction_between("B", "A"), None);
    }

    #[test]
    fn test_destination_lookup() {
        let graph = Graph::from_spec(GraphSpec {
            nodes: vec![node("A", Some("Lab")), node("B", None), node("C", Some("Office"))],
            edges: vec![],
        })
        .unwrap();

        assert_eq!(graph.destination_node_for("Office"), Some("C"));
        assert_eq!(graph.destination_node_for("Cafeteria"), None);
        assert_eq!(graph.destinations(), vec!["Lab", "Office"]);
    }

    #[test]
    fn test_duplicate_node_rejected() {
        let result = Graph::from_spec(GraphSpec {
            nodes: vec![node("A", None), node("A", None)],
            edges: vec![],
        });
        assert!(matches!(result, Err(GraphError::DuplicateNode(id)) if id == "A"));
    }

    #[test]
    fn test_edge_to_undeclared_node_rejected() {
        let result = Graph::from_spec(GraphSpec {
            nodes: vec![node("A", None)],
            edges: vec![edge("A", "Z", Direction::Left)],
        });
        assert!(matches!(result, Err(GraphError::UnknownEndpoint { .. })));
    }

    #[test]
    fn test_load_from_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("graph.toml");
        std::fs::write(
            &path,
            r#"
[[nodes]]
id = "A"

[[nodes]]
id = "B"
destination = "Library"

[[edges]]
from = "A"
to = "B"
direction = "right"
"#,
        )
        .unwrap();

        let graph = Graph::load(&path).unwrap();
        assert_eq!(graph.len(), 2);
        assert_eq!(graph.direction_between("A", "B"), Some(Direction::Right));
        assert_eq!(graph.destination_node_for("Library"), Some("B"));
    }

    #[test]
    fn test_load_missing_file() {
        let result = Graph::load(Path::new("/nonexistent/graph.toml"));
        assert!(matches!(result, Err(GraphError::Read { .. })));
    }
}
