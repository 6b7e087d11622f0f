use std::path::PathBuf;
use thiserror::Error;


/// Failures of a single search call
/// None of these are retried: the search is deterministic, so the same input fails the same way
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SearchError {
    /// Start node or a referenced goal is not in the graph
    #[error("node '{0}' not found in graph")]
    UnknownNode(String),

    /// Negative or non-finite edge weight, the snapshot is corrupt
    #[error("invalid weight {weight} on edge {from} -> {to}")]
    InvalidWeight { from: String, to: String, weight: f64 },

    /// No goal is reachable from the start (or the goal set is empty)
    #[error("no path from '{start}' to any eatery")]
    NoPathFound { start: String },

    /// Caller supplied deadline passed before the search terminated
    #[error("search deadline exceeded after expanding {expanded} nodes")]
    DeadlineExceeded { expanded: usize },
}

impl SearchError {
    /// Stable identifier for the transport layer
    pub fn kind(&self) -> &'static str {
        match self {
            SearchError::UnknownNode(_) => "UnknownNodeError",
            SearchError::InvalidWeight { .. } => "InvalidWeightError",
            SearchError::NoPathFound { .. } => "NoPathFoundError",
            SearchError::DeadlineExceeded { .. } => "DeadlineExceededError",
        }
    }
}


/// Rejected graph or eatery mutations
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GraphError {
    #[error("node id must be a non-empty string")]
    EmptyId,

    #[error("node '{0}' already exists")]
    DuplicateNode(String),

    #[error("node '{0}' does not exist")]
    UnknownNode(String),

    #[error("invalid coordinate ({lat}, {lon}) for node '{id}'")]
    InvalidCoordinate { id: String, lat: f64, lon: f64 },

    #[error("cannot create self-edge on node '{0}'")]
    SelfLoop(String),

    #[error("edge {from} - {to} has cost {cost}, cost must be a positive number")]
    InvalidWeight { from: String, to: String, cost: f64 },

    #[error("edge {from} - {to} costs {forward} one way and {backward} the other")]
    AsymmetricEdge { from: String, to: String, forward: f64, backward: f64 },

    #[error("edge {from} -> {to} has no reverse direction")]
    OneWayEdge { from: String, to: String },

    #[error("no edge between '{0}' and '{1}'")]
    MissingEdge(String, String),

    #[error("eatery '{0}' does not exist")]
    UnknownEatery(String),

    #[error("rating {rating} for eatery '{id}' must be between 0 and 5")]
    InvalidRating { id: String, rating: f64 },

    #[error("spatial index error: {0}")]
    SpatialIndex(String),
}

impl From<kdtree::ErrorKind> for GraphError {
    fn from(error: kdtree::ErrorKind) -> Self {
        GraphError::SpatialIndex(error.to_string())
    }
}


/// Invalid preference input
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PreferenceError {
    #[error("unknown preference factor '{0}'")]
    UnknownFactor(String),

    #[error("weight for {factor} must be a non-negative number, got {weight}")]
    InvalidWeight { factor: String, weight: f64 },
}


/// Algorithm names are a closed set, anything else is rejected at the boundary
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown algorithm '{0}', choose 'ucs' or 'astar'")]
pub struct UnknownAlgorithm(pub String);


/// Loading or saving a graph / eatery snapshot
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("failed to access {}: {source}", .path.display())]
    Io { path: PathBuf, #[source] source: std::io::Error },

    #[error("invalid JSON in {}: {source}", .path.display())]
    Json { path: PathBuf, #[source] source: serde_json::Error },

    #[error(transparent)]
    Invalid(#[from] GraphError),
}


/// Building the layered application configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid configuration value for {key}: {message}")]
    Invalid { key: &'static str, message: String },
}
