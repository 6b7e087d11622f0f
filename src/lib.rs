pub mod collections;
pub mod config;
pub mod eatery;
pub mod errors;
pub mod geometry;
pub mod graph;
pub mod graph_algos;
pub mod heuristic;
pub mod metrics;
pub mod planner;
pub mod preferences;
pub mod scoring;
pub mod store;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub use crate::config::AppConfig;
pub use eatery::{EateryAttributes, EateryCatalog, EateryPatch, Hours};
pub use errors::{ConfigError, GraphError, PreferenceError, SearchError, SnapshotError, UnknownAlgorithm};
pub use geometry::{Coordinate, Metric};
pub use graph::{CampusGraph, Graph, NodeId, SpatialIndex};
pub use metrics::SearchMetrics;
pub use planner::{
    Algorithm, AlgorithmComparison, DistanceBasis, PathResult, Planner, PlannerOptions, RankedEatery,
    SearchRequest, MAX_TOP_EATERIES,
};
pub use preferences::{Factor, PreferenceVector};
pub use store::{CampusStore, Snapshot};


/// Log to stderr, filtered by `RUST_LOG` (default `info`)
/// Keeps stdout free for JSON output
pub fn init_tracing() {
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);

    let filter_layer = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .init();
}
