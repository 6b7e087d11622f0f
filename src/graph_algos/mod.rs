
pub mod a_star;
pub mod ucs;
mod best_first;
mod shortest_path;

use std::time::Instant;
use shortest_path::shortest_path;

use crate::collections::FxIndexMap;
use crate::metrics::SearchMetrics;

pub use a_star::AStar;
pub use ucs::{uniform_cost_nodes_full, uniform_cost_search};


/// Best known way to reach a node
/// - parent is the index of the parent node in the map, `usize::MAX` for the start
/// - cost is the lowest accumulated cost found so far
/// - closed is set once the node has been expanded, its cost is final from then on
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Visit {
    pub parent: usize,
    pub cost: f64,
    pub closed: bool,
}

/// Type alias for the node map used in path planning algorithms
/// N: Node - space on a graph
pub type GraphNodeMap<N> = FxIndexMap<N, Visit>;


/// Optional bounds on a single search
#[derive(Clone, Copy, Debug, Default)]
pub struct SearchLimits {
    /// Checked once per pop, the search fails with `DeadlineExceeded` past it
    pub deadline: Option<Instant>,
}


/// Successful search from start to the chosen goal
#[derive(Clone, Debug, PartialEq)]
pub struct SearchRun<N> {
    /// Start to goal, both inclusive
    pub path: Vec<N>,
    pub cost: f64,
    /// Score the goal function gave the chosen goal
    pub goal_score: f64,
    pub metrics: SearchMetrics,
}
