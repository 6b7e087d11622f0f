use crate::errors::SearchError;
use super::best_first::best_first;
use super::{GraphNodeMap, SearchLimits, SearchRun};

use std::{fmt::Display, hash::Hash};


/// Uniform Cost Search
/// https://en.wikipedia.org/wiki/Dijkstra%27s_algorithm#Practical_optimizations_and_infinite_graphs
/// From start Node, expand the cheapest node first until a goal is popped
/// goal_fn returns the goal's score for goal nodes, used to break cost ties
pub fn uniform_cost_search<N, IT, NN, G>(start: N, neighbors: NN, goal_fn: G, limits: &SearchLimits) -> Result<SearchRun<N>, SearchError>
where
    N: Ord + Hash + Clone + Display,
    NN: Fn(&N) -> IT, // returns iterator of neighbors + costs
    IT: IntoIterator<Item = (N, f64)>, // Iterator of neighbors + edge cost to neighbor node
    G: Fn(&N) -> Option<f64>, // node qualifier for goal
    {

    best_first(start, neighbors, |_| 0.0, goal_fn, limits)?.into_run()
}


/// Returns a full map of the graph, includes all (reachable) nodes and their final costs
pub fn uniform_cost_nodes_full<N, IT, NN>(start: N, neighbors: NN) -> Result<GraphNodeMap<N>, SearchError>
where
    N: Ord + Hash + Clone + Display,
    NN: Fn(&N) -> IT,
    IT: IntoIterator<Item = (N, f64)>,
    {

    // No goal - runs until the frontier is exhausted
    let outcome = best_first(start, neighbors, |_| 0.0, |_| None, &SearchLimits::default())?;

    Ok(outcome.node_map)
}
