use kdtree::KdTree;

use crate::errors::GraphError;
use crate::geometry::{squared_euclidean, Coordinate, Metric};
use super::{CampusGraph, NodeId};


/// Nearest-node lookup over a graph's coordinates
/// Lets a caller start a search from an arbitrary map point
/// Points are projected with `lon * cos(reference latitude)` so squared
/// Euclidean ordering in the tree matches ground distance at campus scale
pub struct SpatialIndex {
    tree: KdTree<f64, usize, [f64; 2]>, // projected point -> index in ids
    ids: Vec<NodeId>,
    coordinates: Vec<Coordinate>,
    lon_scale: f64,
}

impl SpatialIndex {

    /// Build the index from a graph snapshot
    pub fn build(graph: &CampusGraph) -> Result<Self, GraphError> {
        let count = graph.node_count();
        let mean_lat = if count == 0 {
            0.0
        } else {
            graph.nodes().map(|(_, c)| c.lat).sum::<f64>() / count as f64
        };
        let lon_scale = mean_lat.to_radians().cos();

        let mut tree = KdTree::new(2);
        let mut ids = Vec::with_capacity(count);
        let mut coordinates = Vec::with_capacity(count);

        for (idx, (id, coordinate)) in graph.nodes().enumerate() {
            tree.add([coordinate.lat, coordinate.lon * lon_scale], idx)?;
            ids.push(id.to_string());
            coordinates.push(coordinate);
        }

        Ok(Self { tree, ids, coordinates, lon_scale })
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Closest node to `point` and its ground distance in meters under `metric`
    /// `None` for an empty graph
    pub fn nearest(&self, point: Coordinate, metric: Metric) -> Result<Option<(&str, f64)>, GraphError> {
        if self.is_empty() {
            return Ok(None);
        }

        let query = [point.lat, point.lon * self.lon_scale];
        let found = self.tree.nearest(&query, 1, &|a: &[f64], b: &[f64]| {
            squared_euclidean(a[0], a[1], b[0], b[1])
        })?;

        Ok(found.first().map(|&(_, &idx)| {
            (self.ids[idx].as_str(), metric.distance(point, self.coordinates[idx]))
        }))
    }
}
