use crate::geometry::{Coordinate, Metric};
use crate::graph::Graph;


/// Lower bound on the remaining cost from a node to the closest goal
///
/// Admissible as long as every edge costs at least the straight-line
/// distance between its endpoints; that is the graph owner's job, nothing
/// here checks it. Taking the minimum over goals keeps the bound valid when
/// any of several goals may end the search.
pub struct NearestGoal<'g, G> {
    graph: &'g G,
    goals: Vec<Coordinate>,
    metric: Metric,
}

impl<'g, G: Graph> NearestGoal<'g, G> {

    /// Goals without a coordinate are skipped
    pub fn new<'n, I>(graph: &'g G, goals: I, metric: Metric) -> Self
    where
        I: IntoIterator<Item = &'n str>,
    {
        let goals = goals.into_iter().filter_map(|g| graph.coordinate(g)).collect();
        Self { graph, goals, metric }
    }

    /// 0 for a node without a coordinate or when there are no goals
    pub fn estimate(&self, node: &str) -> f64 {
        let Some(from) = self.graph.coordinate(node) else {
            return 0.0;
        };
        self.goals.iter()
            .map(|&goal| self.metric.distance(from, goal))
            .fold(None, |best: Option<f64>, d| Some(best.map_or(d, |b| b.min(d))))
            .unwrap_or(0.0)
    }
}
