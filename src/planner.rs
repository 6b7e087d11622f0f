use std::{fmt, str::FromStr, time::{Duration, Instant}};
use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::collections::{FxIndexMap, FxIndexSet};
use crate::eatery::EateryCatalog;
use crate::errors::{SearchError, UnknownAlgorithm};
use crate::geometry::Metric;
use crate::graph::{Graph, NodeId};
use crate::graph_algos::{uniform_cost_nodes_full, uniform_cost_search, AStar, SearchLimits};
use crate::heuristic::NearestGoal;
use crate::metrics::SearchMetrics;
use crate::preferences::PreferenceVector;
use crate::scoring::{score_candidates, Candidate, EateryScore};


/// Upper bound on how many eateries a ranking returns
pub const MAX_TOP_EATERIES: usize = 10;


/// Search algorithm, a closed set checked at the boundary
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Algorithm {
    #[serde(rename = "ucs")]
    Ucs,
    #[serde(rename = "astar")]
    AStar,
}

impl Algorithm {

    pub const ALL: [Algorithm; 2] = [Algorithm::Ucs, Algorithm::AStar];

    pub fn as_str(&self) -> &'static str {
        match self {
            Algorithm::Ucs => "ucs",
            Algorithm::AStar => "astar",
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Algorithm {
    type Err = UnknownAlgorithm;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ucs" | "uniform-cost" | "uniform_cost" => Ok(Algorithm::Ucs),
            "astar" | "a*" | "a-star" | "a_star" => Ok(Algorithm::AStar),
            _ => Err(UnknownAlgorithm(s.to_string())),
        }
    }
}


/// What the distance factor of the score measures
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceBasis {
    /// Straight-line distance under the configured metric
    #[default]
    Straight,
    /// Shortest path cost over the graph
    Network,
}


#[derive(Clone, Debug, PartialEq)]
pub struct PlannerOptions {
    pub metric: Metric,
    pub distance_basis: DistanceBasis,
    pub max_top_n: usize,
    /// Per search call, `None` for no deadline
    pub timeout: Option<Duration>,
}

impl Default for PlannerOptions {
    fn default() -> Self {
        Self {
            metric: Metric::Haversine,
            distance_basis: DistanceBasis::Straight,
            max_top_n: MAX_TOP_EATERIES,
            timeout: None,
        }
    }
}


/// Input of one query
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SearchRequest {
    pub start: NodeId,
    /// Explicit goal subset, every eatery on the graph when `None`
    pub goals: Option<Vec<NodeId>>,
    pub preferences: PreferenceVector,
    /// Drop eateries closed at this time from the default goal set
    pub open_at: Option<NaiveTime>,
}

impl SearchRequest {

    pub fn new(start: impl Into<NodeId>) -> Self {
        Self { start: start.into(), ..Self::default() }
    }

    pub fn with_goals<I, S>(mut self, goals: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<NodeId>,
    {
        self.goals = Some(goals.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_preferences(mut self, preferences: PreferenceVector) -> Self {
        self.preferences = preferences;
        self
    }

    pub fn open_at(mut self, at: NaiveTime) -> Self {
        self.open_at = Some(at);
        self
    }
}


/// Route to the chosen eatery
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PathResult {
    pub algorithm: Algorithm,
    pub start: NodeId,
    pub goal: NodeId,
    pub goal_score: f64,
    pub path: Vec<NodeId>,
    pub cost: f64,
    pub metrics: SearchMetrics,
}

/// One row of an eatery ranking
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RankedEatery {
    pub rank: usize,
    pub id: NodeId,
    pub name: String,
    pub score: f64,
    pub distance: f64,
}

/// Both algorithms on the same input
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AlgorithmComparison {
    pub ucs: PathResult,
    pub astar: PathResult,
}

impl AlgorithmComparison {

    /// Same goal, same path and the same optimal cost
    pub fn agree(&self) -> bool {
        self.ucs.goal == self.astar.goal
            && self.ucs.path == self.astar.path
            && (self.ucs.cost - self.astar.cost).abs() <= 1e-9 * self.ucs.cost.abs().max(1.0)
    }
}


/// Goal set of a query with the scores of its reachable eateries
struct Query<'a> {
    goals: FxIndexSet<&'a str>,
    reachable_goals: Vec<&'a str>,
    scores: FxIndexMap<&'a str, EateryScore>,
}


/// Search and ranking over one graph / eatery snapshot
/// Holds no state between calls, every call reads the snapshot it was built on
pub struct Planner<'a, G> {
    graph: &'a G,
    eateries: &'a EateryCatalog,
    options: PlannerOptions,
}

impl<'a, G: Graph> Planner<'a, G> {

    pub fn new(graph: &'a G, eateries: &'a EateryCatalog) -> Self {
        Self { graph, eateries, options: PlannerOptions::default() }
    }

    pub fn with_options(mut self, options: PlannerOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &PlannerOptions {
        &self.options
    }

    /// Route from `request.start` to the best eatery
    ///
    /// The cheapest reachable goal wins; among goals tied at that cost the
    /// one with the highest preference score wins.
    pub fn find_path(&self, request: &SearchRequest, algorithm: Algorithm) -> Result<PathResult, SearchError> {
        let graph = self.graph;
        let start = self.resolve(&request.start)?;
        let query = self.prepare(start, request)?;

        if query.reachable_goals.is_empty() {
            info!(%algorithm, start, goals = query.goals.len(), "no eatery reachable");
            return Err(SearchError::NoPathFound { start: start.to_string() });
        }

        let goals = &query.goals;
        let scores = &query.scores;
        let is_goal = |node: &&'a str| {
            goals.contains(node).then(|| scores.get(node).map_or(0.0, |s| s.score))
        };
        let neighbors = move |node: &&'a str| neighbors_of(graph, *node);
        let limits = self.limits();

        let run = match algorithm {
            Algorithm::Ucs => uniform_cost_search(start, neighbors, is_goal, &limits)?,
            Algorithm::AStar => {
                let heuristic = NearestGoal::new(graph, query.reachable_goals.iter().copied(), self.options.metric);
                AStar{}.plan(start, neighbors, |node: &&'a str| heuristic.estimate(node), is_goal, &limits)?
            }
        };

        let Some(&goal) = run.path.last() else {
            return Err(SearchError::NoPathFound { start: start.to_string() });
        };
        info!(
            %algorithm,
            start,
            goal,
            cost = run.cost,
            expanded = run.metrics.nodes_expanded,
            frontier = run.metrics.max_frontier_size,
            elapsed_ms = run.metrics.execution_time_ms,
            "search finished"
        );

        Ok(PathResult {
            algorithm,
            start: start.to_string(),
            goal: goal.to_string(),
            goal_score: run.goal_score,
            path: run.path.iter().map(|n| n.to_string()).collect(),
            cost: run.cost,
            metrics: run.metrics,
        })
    }

    /// Reachable eateries by descending score, ties by ascending distance then id
    /// At most `top_n` rows, capped by `max_top_n`
    pub fn rank_eateries(&self, request: &SearchRequest, top_n: usize) -> Result<Vec<RankedEatery>, SearchError> {
        let start = self.resolve(&request.start)?;
        let query = self.prepare(start, request)?;

        let mut ranked: Vec<(&str, EateryScore)> = query.scores.iter().map(|(id, s)| (*id, *s)).collect();
        ranked.sort_by(|a, b| {
            b.1.score.total_cmp(&a.1.score)
                .then(a.1.distance.total_cmp(&b.1.distance))
                .then_with(|| a.0.cmp(b.0))
        });

        let limit = top_n.min(self.options.max_top_n);
        debug!(start, candidates = ranked.len(), limit, "ranked eateries");

        Ok(ranked.into_iter()
            .take(limit)
            .enumerate()
            .map(|(i, (id, s))| RankedEatery {
                rank: i + 1,
                id: id.to_string(),
                name: self.eateries.get(id).map(|e| e.name.clone()).unwrap_or_default(),
                score: s.score,
                distance: s.distance,
            })
            .collect())
    }

    /// Run UCS and A* on the same request
    pub fn compare_algorithms(&self, request: &SearchRequest) -> Result<AlgorithmComparison, SearchError> {
        let ucs = self.find_path(request, Algorithm::Ucs)?;
        let astar = self.find_path(request, Algorithm::AStar)?;
        let comparison = AlgorithmComparison { ucs, astar };

        if !comparison.agree() {
            // only possible when some edge is shorter than the straight line between its ends
            warn!(
                start = %request.start,
                ucs_goal = %comparison.ucs.goal,
                astar_goal = %comparison.astar.goal,
                "UCS and A* disagree, heuristic is not admissible for this graph"
            );
        }
        Ok(comparison)
    }

    fn resolve(&self, node: &str) -> Result<&'a str, SearchError> {
        let graph = self.graph;
        graph.node_id(node).ok_or_else(|| SearchError::UnknownNode(node.to_string()))
    }

    fn limits(&self) -> SearchLimits {
        SearchLimits { deadline: self.options.timeout.map(|t| Instant::now() + t) }
    }

    /// Explicit goals must exist, the default goal set is every eatery on the graph
    fn goal_set(&self, request: &SearchRequest) -> Result<FxIndexSet<&'a str>, SearchError> {
        let graph = self.graph;
        let eateries = self.eateries;

        if let Some(goals) = &request.goals {
            return goals.iter().map(|g| self.resolve(g)).collect();
        }

        Ok(eateries.iter()
            .filter_map(|(id, attrs)| {
                let Some(node) = graph.node_id(id) else {
                    warn!(eatery = id, "eatery is not on the graph, skipping");
                    return None;
                };
                if let Some(at) = request.open_at {
                    if !attrs.is_open(at) {
                        debug!(eatery = id, hours = %attrs.hours, "closed, skipping");
                        return None;
                    }
                }
                Some(node)
            })
            .collect())
    }

    /// Resolve goals, find which are reachable and score the reachable eateries
    fn prepare(&self, start: &'a str, request: &SearchRequest) -> Result<Query<'a>, SearchError> {
        let graph = self.graph;
        let eateries = self.eateries;
        let goals = self.goal_set(request)?;

        let reachable = uniform_cost_nodes_full(start, move |node: &&'a str| neighbors_of(graph, *node))?;
        let reachable_goals: Vec<&'a str> = goals.iter().copied().filter(|g| reachable.contains_key(g)).collect();

        let candidates: Vec<Candidate<'a>> = reachable_goals.iter()
            .filter_map(|&id| {
                let Some(attributes) = eateries.get(id) else {
                    warn!(goal = id, "goal has no eatery record, scored 0");
                    return None;
                };
                let network = reachable.get(id).map_or(0.0, |v| v.cost);
                let distance = match self.options.distance_basis {
                    DistanceBasis::Network => network,
                    DistanceBasis::Straight => match (graph.coordinate(start), graph.coordinate(id)) {
                        (Some(a), Some(b)) => self.options.metric.distance(a, b),
                        _ => network,
                    },
                };
                Some(Candidate { id, attributes, distance })
            })
            .collect();

        let scores = score_candidates(&candidates, &request.preferences);
        debug!(start, goals = goals.len(), reachable = reachable_goals.len(), scored = scores.len(), "prepared query");

        Ok(Query { goals, reachable_goals, scores })
    }
}


/// Outgoing edges of `node` with ids borrowed from the graph
fn neighbors_of<'a, G: Graph>(graph: &'a G, node: &'a str) -> impl Iterator<Item = (&'a str, f64)> + 'a {
    graph.neighbors(node)
        .into_iter()
        .flat_map(|n| n.iter())
        .map(|(id, &cost)| (id.as_str(), cost))
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_algorithm_parsing() {
        assert_eq!("ucs".parse::<Algorithm>(), Ok(Algorithm::Ucs));
        assert_eq!("A*".parse::<Algorithm>(), Ok(Algorithm::AStar));
        assert_eq!(" astar ".parse::<Algorithm>(), Ok(Algorithm::AStar));
        assert_eq!("dfs".parse::<Algorithm>(), Err(UnknownAlgorithm("dfs".into())));
        for algorithm in Algorithm::ALL {
            assert_eq!(algorithm.to_string().parse::<Algorithm>(), Ok(algorithm));
        }
    }

    #[test]
    fn test_algorithm_serde_names() {
        assert_eq!(serde_json::to_string(&Algorithm::AStar).unwrap(), "\"astar\"");
        assert_eq!(serde_json::from_str::<Algorithm>("\"ucs\"").unwrap(), Algorithm::Ucs);
    }

    #[test]
    fn test_request_builder() {
        let request = SearchRequest::new("Gate").with_goals(["B", "C"]);
        assert_eq!(request.start, "Gate");
        assert_eq!(request.goals, Some(vec!["B".to_string(), "C".to_string()]));
        assert_eq!(request.preferences, PreferenceVector::default());
        assert_eq!(request.open_at, None);
    }
}
