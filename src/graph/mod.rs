pub mod spatial;

use std::{fs, io::BufReader, path::Path};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::collections::FxIndexMap;
use crate::errors::{GraphError, SnapshotError};
use crate::geometry::Coordinate;

pub use spatial::SpatialIndex;


/// Node identifier, shared by waypoints and eateries
pub type NodeId = String;

/// Adjacency of a single node: neighbor -> edge cost in meters
pub type Neighbors = FxIndexMap<NodeId, f64>;


/// Read-only view of a graph consumed by the search engine
/// The engine never mutates a graph, it only walks it for the duration of one call
pub trait Graph {

    /// Graph-owned id for `node`, lets searches borrow ids from the graph
    fn node_id(&self, node: &str) -> Option<&str>;

    fn coordinate(&self, node: &str) -> Option<Coordinate>;

    /// Outgoing edges, `None` when the node has no adjacency entry
    fn neighbors(&self, node: &str) -> Option<&Neighbors>;

    fn contains(&self, node: &str) -> bool {
        self.node_id(node).is_some()
    }
}


/// Undirected weighted campus graph
/// Serialized in the campus data file layout:
/// `{"nodes": {id: [lat, lng]}, "edges": {id: {neighbor: cost}}}`
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CampusGraph {
    nodes: FxIndexMap<NodeId, Coordinate>,
    #[serde(default)]
    edges: FxIndexMap<NodeId, Neighbors>,
}

impl CampusGraph {

    pub fn new() -> Self {
        Self::default()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of undirected edges
    pub fn edge_count(&self) -> usize {
        self.edges.values().map(|n| n.len()).sum::<usize>() / 2
    }

    /// Nodes with their coordinates in insertion order
    pub fn nodes(&self) -> impl Iterator<Item = (&str, Coordinate)> {
        self.nodes.iter().map(|(id, c)| (id.as_str(), *c))
    }

    pub fn edge_cost(&self, a: &str, b: &str) -> Option<f64> {
        self.edges.get(a).and_then(|n| n.get(b)).copied()
    }

    /// Add a waypoint, the id must be new and the coordinate in range
    pub fn add_node(&mut self, id: &str, coordinate: Coordinate) -> Result<(), GraphError> {
        if id.trim().is_empty() {
            return Err(GraphError::EmptyId);
        }
        if !coordinate.is_valid() {
            return Err(GraphError::InvalidCoordinate { id: id.to_string(), lat: coordinate.lat, lon: coordinate.lon });
        }
        if self.nodes.contains_key(id) {
            return Err(GraphError::DuplicateNode(id.to_string()));
        }

        self.nodes.insert(id.to_string(), coordinate);
        self.edges.insert(id.to_string(), Neighbors::default());
        Ok(())
    }

    /// Add or overwrite an undirected edge
    /// Both directions are written with the same cost so they can never disagree
    pub fn add_edge(&mut self, a: &str, b: &str, cost: f64) -> Result<(), GraphError> {
        for id in [a, b] {
            if !self.nodes.contains_key(id) {
                return Err(GraphError::UnknownNode(id.to_string()));
            }
        }
        if a == b {
            return Err(GraphError::SelfLoop(a.to_string()));
        }
        if !(cost.is_finite() && cost > 0.0) {
            return Err(GraphError::InvalidWeight { from: a.to_string(), to: b.to_string(), cost });
        }

        self.edges.entry(a.to_string()).or_default().insert(b.to_string(), cost);
        self.edges.entry(b.to_string()).or_default().insert(a.to_string(), cost);
        Ok(())
    }

    /// Remove a node and every edge that references it
    pub fn remove_node(&mut self, id: &str) -> Result<Coordinate, GraphError> {
        let coordinate = self.nodes.shift_remove(id)
            .ok_or_else(|| GraphError::UnknownNode(id.to_string()))?;

        self.edges.shift_remove(id);
        for neighbors in self.edges.values_mut() {
            neighbors.shift_remove(id);
        }
        Ok(coordinate)
    }

    /// Remove both directions of an edge
    pub fn remove_edge(&mut self, a: &str, b: &str) -> Result<(), GraphError> {
        for id in [a, b] {
            if !self.nodes.contains_key(id) {
                return Err(GraphError::UnknownNode(id.to_string()));
            }
        }

        let forward = self.edges.get_mut(a).and_then(|n| n.shift_remove(b)).is_some();
        let backward = self.edges.get_mut(b).and_then(|n| n.shift_remove(a)).is_some();

        if !forward && !backward {
            return Err(GraphError::MissingEdge(a.to_string(), b.to_string()));
        }
        Ok(())
    }

    /// Check a whole snapshot: coordinates, dangling references, self-loops,
    /// weights and that every edge has a matching reverse edge
    pub fn validate(&self) -> Result<(), GraphError> {
        for (id, coordinate) in &self.nodes {
            if id.trim().is_empty() {
                return Err(GraphError::EmptyId);
            }
            if !coordinate.is_valid() {
                return Err(GraphError::InvalidCoordinate { id: id.clone(), lat: coordinate.lat, lon: coordinate.lon });
            }
        }

        for (node, neighbors) in &self.edges {
            if !self.nodes.contains_key(node) {
                return Err(GraphError::UnknownNode(node.clone()));
            }
            for (neighbor, &cost) in neighbors {
                if neighbor == node {
                    return Err(GraphError::SelfLoop(node.clone()));
                }
                if !self.nodes.contains_key(neighbor) {
                    return Err(GraphError::UnknownNode(neighbor.clone()));
                }
                if !(cost.is_finite() && cost > 0.0) {
                    return Err(GraphError::InvalidWeight { from: node.clone(), to: neighbor.clone(), cost });
                }
                match self.edge_cost(neighbor, node) {
                    Some(backward) if backward == cost => {}
                    Some(backward) => {
                        return Err(GraphError::AsymmetricEdge {
                            from: node.clone(),
                            to: neighbor.clone(),
                            forward: cost,
                            backward,
                        });
                    }
                    None => {
                        return Err(GraphError::OneWayEdge { from: node.clone(), to: neighbor.clone() });
                    }
                }
            }
        }
        Ok(())
    }

    /// Load and validate a graph document
    pub fn load(path: &Path) -> Result<Self, SnapshotError> {
        let file = fs::File::open(path)
            .map_err(|source| SnapshotError::Io { path: path.to_path_buf(), source })?;
        let graph: CampusGraph = serde_json::from_reader(BufReader::new(file))
            .map_err(|source| SnapshotError::Json { path: path.to_path_buf(), source })?;
        graph.validate()?;

        debug!(nodes = graph.node_count(), edges = graph.edge_count(), "loaded graph from {}", path.display());
        Ok(graph)
    }
}

impl Graph for CampusGraph {

    fn node_id(&self, node: &str) -> Option<&str> {
        self.nodes.get_key_value(node).map(|(id, _)| id.as_str())
    }

    fn coordinate(&self, node: &str) -> Option<Coordinate> {
        self.nodes.get(node).copied()
    }

    fn neighbors(&self, node: &str) -> Option<&Neighbors> {
        self.edges.get(node)
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    fn triangle() -> CampusGraph {
        let mut graph = CampusGraph::new();
        graph.add_node("A", Coordinate::new(14.5648, 120.9932)).unwrap();
        graph.add_node("B", Coordinate::new(14.5652, 120.9935)).unwrap();
        graph.add_node("C", Coordinate::new(14.5655, 120.9930)).unwrap();
        graph.add_edge("A", "B", 55.0).unwrap();
        graph.add_edge("B", "C", 60.0).unwrap();
        graph.add_edge("A", "C", 80.0).unwrap();
        graph
    }

    #[test]
    fn test_add_edge_is_symmetric() {
        let graph = triangle();
        assert_eq!(graph.edge_cost("A", "B"), Some(55.0));
        assert_eq!(graph.edge_cost("B", "A"), Some(55.0));
        assert_eq!(graph.edge_count(), 3);
        assert!(graph.validate().is_ok());
    }

    #[test]
    fn test_add_edge_overwrites_both_directions() {
        let mut graph = triangle();
        graph.add_edge("B", "A", 70.0).unwrap();
        assert_eq!(graph.edge_cost("A", "B"), Some(70.0));
        assert_eq!(graph.edge_cost("B", "A"), Some(70.0));
    }

    #[test]
    fn test_add_edge_rejects_bad_input() {
        let mut graph = triangle();
        assert_eq!(graph.add_edge("A", "A", 1.0), Err(GraphError::SelfLoop("A".into())));
        assert!(matches!(graph.add_edge("A", "B", -3.0), Err(GraphError::InvalidWeight { .. })));
        assert!(matches!(graph.add_edge("A", "B", 0.0), Err(GraphError::InvalidWeight { .. })));
        assert!(matches!(graph.add_edge("A", "B", f64::INFINITY), Err(GraphError::InvalidWeight { .. })));
        assert_eq!(graph.add_edge("A", "Z", 1.0), Err(GraphError::UnknownNode("Z".into())));
    }

    #[test]
    fn test_add_node_validation() {
        let mut graph = triangle();
        assert_eq!(graph.add_node("A", Coordinate::new(0.0, 0.0)), Err(GraphError::DuplicateNode("A".into())));
        assert_eq!(graph.add_node("  ", Coordinate::new(0.0, 0.0)), Err(GraphError::EmptyId));
        assert!(matches!(graph.add_node("X", Coordinate::new(95.0, 0.0)), Err(GraphError::InvalidCoordinate { .. })));
    }

    #[test]
    fn test_remove_node_clears_references() {
        let mut graph = triangle();
        graph.remove_node("B").unwrap();

        assert!(!graph.contains("B"));
        assert_eq!(graph.edge_cost("A", "B"), None);
        assert_eq!(graph.edge_cost("C", "B"), None);
        assert_eq!(graph.edge_count(), 1);
        assert!(graph.validate().is_ok());
        assert_eq!(graph.remove_node("B"), Err(GraphError::UnknownNode("B".into())));
    }

    #[test]
    fn test_remove_edge() {
        let mut graph = triangle();
        graph.remove_edge("A", "C").unwrap();
        assert_eq!(graph.edge_cost("C", "A"), None);
        assert_eq!(graph.remove_edge("A", "C"), Err(GraphError::MissingEdge("A".into(), "C".into())));
    }

    #[test]
    fn test_validate_detects_asymmetric_and_dangling_edges() {
        let asymmetric: CampusGraph = serde_json::from_str(r#"{
            "nodes": {"A": [14.0, 120.0], "B": [14.001, 120.0]},
            "edges": {"A": {"B": 10}, "B": {"A": 12}}
        }"#).unwrap();
        assert!(matches!(asymmetric.validate(), Err(GraphError::AsymmetricEdge { .. })));

        let one_way: CampusGraph = serde_json::from_str(r#"{
            "nodes": {"A": [14.0, 120.0], "B": [14.001, 120.0]},
            "edges": {"A": {"B": 10}, "B": {}}
        }"#).unwrap();
        assert!(matches!(one_way.validate(), Err(GraphError::OneWayEdge { .. })));

        let dangling: CampusGraph = serde_json::from_str(r#"{
            "nodes": {"A": [14.0, 120.0]},
            "edges": {"A": {"Q": 10}}
        }"#).unwrap();
        assert_eq!(dangling.validate(), Err(GraphError::UnknownNode("Q".into())));
    }

    #[test]
    fn test_graph_trait_view() {
        let graph = triangle();
        assert!(graph.contains("A"));
        assert!(!graph.contains("Nonexistent"));
        assert_eq!(graph.coordinate("B"), Some(Coordinate::new(14.5652, 120.9935)));

        let neighbors: Vec<_> = graph.neighbors("A").unwrap().keys().cloned().collect();
        assert_eq!(neighbors, vec!["B".to_string(), "C".to_string()]);
    }
}
