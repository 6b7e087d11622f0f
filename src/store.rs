use std::{
    fs,
    io::{BufWriter, Write},
    path::Path,
    sync::Arc,
};
use parking_lot::RwLock;
use serde::Serialize;
use tracing::{debug, info};

use crate::eatery::{EateryAttributes, EateryCatalog, EateryPatch};
use crate::errors::{GraphError, SnapshotError};
use crate::geometry::Coordinate;
use crate::graph::{CampusGraph, Graph};
use crate::planner::Planner;


/// Immutable view of the campus at one point in time
/// Cloning only bumps two reference counts
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Snapshot {
    pub graph: Arc<CampusGraph>,
    pub eateries: Arc<EateryCatalog>,
}

impl Snapshot {

    pub fn new(graph: CampusGraph, eateries: EateryCatalog) -> Self {
        Self { graph: Arc::new(graph), eateries: Arc::new(eateries) }
    }

    /// Planner with default options over this snapshot
    pub fn planner(&self) -> Planner<'_, CampusGraph> {
        Planner::new(self.graph.as_ref(), self.eateries.as_ref())
    }

    pub fn validate(&self) -> Result<(), GraphError> {
        self.graph.validate()?;
        self.eateries.validate()
    }
}


/// Owner of the current campus state
///
/// Readers take a `Snapshot` and search it without holding any lock. Writers
/// take the write lock and copy whatever is still shared with outstanding
/// snapshots, so a search never sees a half-applied mutation.
#[derive(Debug, Default)]
pub struct CampusStore {
    inner: RwLock<Snapshot>,
}

impl CampusStore {

    pub fn new(graph: CampusGraph, eateries: EateryCatalog) -> Result<Self, GraphError> {
        let snapshot = Snapshot::new(graph, eateries);
        snapshot.validate()?;
        Ok(Self { inner: RwLock::new(snapshot) })
    }

    /// Load and validate both documents
    pub fn load(graph_path: &Path, eateries_path: &Path) -> Result<Self, SnapshotError> {
        let graph = CampusGraph::load(graph_path)?;
        let eateries = EateryCatalog::load(eateries_path)?;
        info!(nodes = graph.node_count(), edges = graph.edge_count(), eateries = eateries.len(), "campus loaded");
        Ok(Self::new(graph, eateries)?)
    }

    /// Write both documents of the current snapshot
    pub fn save(&self, graph_path: &Path, eateries_path: &Path) -> Result<(), SnapshotError> {
        let snapshot = self.snapshot();
        write_json(graph_path, snapshot.graph.as_ref())?;
        write_json(eateries_path, snapshot.eateries.as_ref())?;
        info!(graph = %graph_path.display(), eateries = %eateries_path.display(), "campus saved");
        Ok(())
    }

    pub fn snapshot(&self) -> Snapshot {
        self.inner.read().clone()
    }

    pub fn add_node(&self, id: &str, coordinate: Coordinate) -> Result<(), GraphError> {
        let mut inner = self.inner.write();
        Arc::make_mut(&mut inner.graph).add_node(id, coordinate)?;
        debug!(id, lat = coordinate.lat, lon = coordinate.lon, "node added");
        Ok(())
    }

    pub fn add_edge(&self, a: &str, b: &str, cost: f64) -> Result<(), GraphError> {
        let mut inner = self.inner.write();
        Arc::make_mut(&mut inner.graph).add_edge(a, b, cost)?;
        debug!(a, b, cost, "edge added");
        Ok(())
    }

    /// Remove a node, its edges and its eatery record
    pub fn remove_node(&self, id: &str) -> Result<Coordinate, GraphError> {
        let mut inner = self.inner.write();
        if !inner.graph.contains(id) {
            return Err(GraphError::UnknownNode(id.to_string()));
        }

        let coordinate = Arc::make_mut(&mut inner.graph).remove_node(id)?;
        if inner.eateries.contains(id) {
            Arc::make_mut(&mut inner.eateries).remove(id)?;
        }
        debug!(id, "node removed");
        Ok(coordinate)
    }

    pub fn remove_edge(&self, a: &str, b: &str) -> Result<(), GraphError> {
        let mut inner = self.inner.write();
        Arc::make_mut(&mut inner.graph).remove_edge(a, b)?;
        debug!(a, b, "edge removed");
        Ok(())
    }

    /// Create or patch the eatery record of an existing node
    pub fn update_eatery(&self, id: &str, patch: EateryPatch) -> Result<EateryAttributes, GraphError> {
        let mut inner = self.inner.write();
        if !inner.graph.contains(id) {
            return Err(GraphError::UnknownNode(id.to_string()));
        }

        let updated = Arc::make_mut(&mut inner.eateries).update(id, patch)?.clone();
        debug!(id, name = %updated.name, "eatery updated");
        Ok(updated)
    }

    pub fn remove_eatery(&self, id: &str) -> Result<EateryAttributes, GraphError> {
        let mut inner = self.inner.write();
        if !inner.eateries.contains(id) {
            return Err(GraphError::UnknownEatery(id.to_string()));
        }

        let removed = Arc::make_mut(&mut inner.eateries).remove(id)?;
        debug!(id, "eatery removed");
        Ok(removed)
    }

    /// Add a node together with its eatery record, or neither
    pub fn add_eatery_node(&self, id: &str, coordinate: Coordinate, attributes: EateryAttributes) -> Result<(), GraphError> {
        let mut inner = self.inner.write();

        // extra handles force copies, the current snapshot stays intact on failure
        let mut graph = Arc::clone(&inner.graph);
        let mut eateries = Arc::clone(&inner.eateries);
        Arc::make_mut(&mut graph).add_node(id, coordinate)?;
        Arc::make_mut(&mut eateries).insert(id, attributes)?;

        inner.graph = graph;
        inner.eateries = eateries;
        debug!(id, "eatery node added");
        Ok(())
    }
}


/// Write to a sibling temp file first so a failed write never truncates `path`
fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), SnapshotError> {
    let io_err = |source| SnapshotError::Io { path: path.to_path_buf(), source };
    let tmp = path.with_extension("json.tmp");

    let file = fs::File::create(&tmp).map_err(io_err)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, value)
        .map_err(|source| SnapshotError::Json { path: path.to_path_buf(), source })?;
    writer.flush().map_err(io_err)?;
    drop(writer);

    fs::rename(&tmp, path).map_err(io_err)
}


#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> CampusStore {
        let mut graph = CampusGraph::new();
        graph.add_node("Gate", Coordinate::new(14.5640, 120.9930)).unwrap();
        graph.add_node("Canteen", Coordinate::new(14.5650, 120.9935)).unwrap();
        graph.add_edge("Gate", "Canteen", 130.0).unwrap();

        let mut eateries = EateryCatalog::new();
        eateries.insert("Canteen", EateryAttributes::new("Canteen")).unwrap();
        CampusStore::new(graph, eateries).unwrap()
    }

    #[test]
    fn test_new_rejects_invalid_catalog() {
        let mut eateries = EateryCatalog::new();
        eateries.insert("x", EateryAttributes::new("x")).unwrap();
        let bad: EateryCatalog = serde_json::from_str(r#"{"x": {"name": "x", "rating": 9.0}}"#).unwrap();
        assert!(CampusStore::new(CampusGraph::new(), eateries).is_ok());
        assert!(matches!(
            CampusStore::new(CampusGraph::new(), bad),
            Err(GraphError::InvalidRating { .. })
        ));
    }

    #[test]
    fn test_mutation_leaves_snapshot_untouched() {
        let store = store();
        let before = store.snapshot();

        store.add_node("Library", Coordinate::new(14.5660, 120.9940)).unwrap();
        store.add_edge("Canteen", "Library", 120.0).unwrap();

        assert_eq!(before.graph.node_count(), 2);
        assert_eq!(store.snapshot().graph.node_count(), 3);
        assert_eq!(store.snapshot().graph.edge_count(), 2);
    }

    #[test]
    fn test_update_eatery_requires_node() {
        let store = store();
        let patch = EateryPatch { rating: Some(4.0), ..EateryPatch::default() };
        assert_eq!(
            store.update_eatery("Nowhere", patch.clone()),
            Err(GraphError::UnknownNode("Nowhere".into()))
        );

        let updated = store.update_eatery("Gate", patch).unwrap();
        assert_eq!(updated.name, "Gate");
        assert_eq!(updated.rating, 4.0);
        assert!(store.snapshot().eateries.contains("Gate"));
    }

    #[test]
    fn test_remove_eatery() {
        let store = store();
        assert!(store.remove_eatery("Canteen").is_ok());
        assert_eq!(store.remove_eatery("Canteen"), Err(GraphError::UnknownEatery("Canteen".into())));
        assert!(store.snapshot().graph.contains("Canteen"));
    }
}
