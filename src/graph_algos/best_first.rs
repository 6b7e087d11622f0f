use crate::errors::SearchError;
use crate::collections::FxIndexMap;
use crate::metrics::{MetricsCollector, SearchMetrics};
use super::{shortest_path, GraphNodeMap, SearchLimits, SearchRun, Visit};

use std::{
    collections::BinaryHeap,
    hash::Hash,
    fmt::Display,
    cmp::Ordering,
    mem::size_of,
    time::Instant,
};
use indexmap::map::Entry::{Occupied, Vacant};


/// Relative tolerance under which two path costs count as the same cost
const COST_TOLERANCE: f64 = 1e-9;

pub(crate) fn same_cost(a: f64, b: f64) -> bool {
    (a - b).abs() <= COST_TOLERANCE * a.abs().max(b.abs()).max(1.0)
}


/// Entry on the open list
/// Ordered by priority, then by insertion order so equal priorities pop first-in-first-out
#[derive(Debug)]
struct Node {
    index: usize, // index in the node map - maps to the id of the node
    cost: f64, // cost to reach this node when the entry was pushed
    priority: f64, // cost for UCS, cost + h(n) for A*
    seq: u64, // insertion counter
}

impl Ord for Node {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap pops the largest, so both keys are reversed
        other.priority.total_cmp(&self.priority)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}
impl PartialOrd for Node {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}
impl Eq for Node {}


/// Goal picked so far
#[derive(Clone, Copy, Debug)]
struct Best {
    index: usize,
    cost: f64,
    score: f64,
}

/// Everything the loop learned, the chosen goal is `(index, score)`
#[derive(Debug)]
pub(crate) struct Outcome<N> {
    pub(crate) node_map: GraphNodeMap<N>,
    pub(crate) goal: Option<(usize, f64)>,
    pub(crate) metrics: SearchMetrics,
}

impl<N: Clone + Display> Outcome<N> {

    /// Rebuild the path to the chosen goal
    pub(crate) fn into_run(self) -> Result<SearchRun<N>, SearchError> {
        // start is always the first node in the map
        let no_path = || SearchError::NoPathFound {
            start: self.node_map.get_index(0).map(|(n, _)| n.to_string()).unwrap_or_default(),
        };

        let Some((goal_index, goal_score)) = self.goal else {
            return Err(no_path());
        };
        let Some(path) = shortest_path(&self.node_map, goal_index) else {
            return Err(no_path());
        };
        let cost = self.node_map[goal_index].cost;

        Ok(SearchRun { path, cost, goal_score, metrics: self.metrics })
    }
}


/// Shared expansion loop behind UCS and A*
///
/// From the start node, pop the lowest priority entry until a goal is popped.
/// `goal_fn` returns the goal's score for goal nodes and `None` otherwise.
/// The first goal popped fixes the optimal cost; popping continues while the
/// frontier can still hold a goal at that same cost, and the highest scored of
/// those tied goals wins, the lowest node id among equal scores. Cost is never
/// traded for score.
///
/// Requirements, as for any A*:
/// 1. Edge costs are non-negative (checked, fails with `InvalidWeight`)
/// 2. The heuristic is consistent, `|_| 0.0` gives UCS
pub(crate) fn best_first<N, IT, NN, H, G>(start: N, neighbors: NN, heuristic_fn: H, goal_fn: G, limits: &SearchLimits) -> Result<Outcome<N>, SearchError>
where
    N: Ord + Hash + Clone + Display,
    NN: Fn(&N) -> IT, // returns iterator of neighbors + costs
    IT: IntoIterator<Item = (N, f64)>, // Iterator of neighbors + edge cost to neighbor node
    H: Fn(&N) -> f64, // heuristic function
    G: Fn(&N) -> Option<f64>, // goal qualifier, carries the goal's score
{
    let mut collector = MetricsCollector::start();

    // Open List
    // Nodes that need to be evaluated, implemented as priority queue
    // Entries are never updated in place, a cheaper path pushes a new entry
    let mut open_list: BinaryHeap<Node> = BinaryHeap::new();

    // Every node discovered so far with its best cost and parent
    // for the start node, parent is set to usize::MAX to indicate it has no parent
    let mut node_map: GraphNodeMap<N> = FxIndexMap::default();
    let mut seq: u64 = 0;

    let start_h = heuristic_fn(&start);
    let start_index = node_map.insert_full(start, Visit { parent: usize::MAX, cost: 0.0, closed: false }).0;
    open_list.push(Node {
        index: start_index,
        cost: 0.0,
        priority: start_h,
        seq,
    });
    collector.record_frontier(open_list.len(), footprint(&open_list, &node_map));

    let mut best: Option<Best> = None;

    while let Some(Node { index, cost, priority, .. }) = open_list.pop() {

        // Priorities never drop below the cost of any goal behind them,
        // once they pass the chosen cost there is no tie left to find
        if let Some(b) = best {
            if priority > b.cost && !same_cost(priority, b.cost) {
                break;
            }
        }

        if let Some(deadline) = limits.deadline {
            if Instant::now() >= deadline {
                return Err(SearchError::DeadlineExceeded { expanded: collector.nodes_expanded() });
            }
        }

        let Some((node, visit)) = node_map.get_index_mut(index) else {
            continue;
        };

        // If cost of the entry is higher than the best cost, or the node is
        // already final, a better path has been handled - skip it
        if visit.closed || cost > visit.cost {
            continue;
        }
        visit.closed = true;
        let node = node.clone();
        collector.record_expansion();

        // Check if we've reached a goal
        if let Some(score) = goal_fn(&node) {
            match best {
                None => best = Some(Best { index, cost, score }),
                Some(b) if same_cost(cost, b.cost) && outranks(&node, score, &node_map, b) => {
                    best = Some(Best { index, cost: b.cost, score });
                }
                Some(_) => {}
            }
        }

        // loop over neighbors
        for (neighbor, edge_cost) in neighbors(&node) {

            if !(edge_cost.is_finite() && edge_cost >= 0.0) {
                return Err(SearchError::InvalidWeight {
                    from: node.to_string(),
                    to: neighbor.to_string(),
                    weight: edge_cost,
                });
            }

            // new cost to reach this node = edge cost + node cost
            let new_cost = cost + edge_cost;
            let h_cost = heuristic_fn(&neighbor);

            let neighbor_index;
            match node_map.entry(neighbor) {
                Vacant(e) => {
                    // This is the first time we're seeing this neighbor
                    neighbor_index = e.index();
                    e.insert(Visit { parent: index, cost: new_cost, closed: false });
                }
                Occupied(mut e) => {
                    if e.get().closed || e.get().cost <= new_cost {
                        // Final already, or the existing path is at least as good
                        continue;
                    }
                    neighbor_index = e.index();
                    e.insert(Visit { parent: index, cost: new_cost, closed: false });
                }
            }

            seq += 1;
            open_list.push(Node {
                index: neighbor_index,
                cost: new_cost,
                priority: new_cost + h_cost,
                seq,
            });
            collector.record_frontier(open_list.len(), footprint(&open_list, &node_map));
        }
    }

    Ok(Outcome {
        node_map,
        goal: best.map(|b| (b.index, b.score)),
        metrics: collector.finish(),
    })
}

/// Tie-break between goals at the same cost: higher score, then lower node id
/// Neither key depends on pop order, so UCS and A* settle on the same goal
fn outranks<N: Ord>(node: &N, score: f64, node_map: &GraphNodeMap<N>, best: Best) -> bool {
    match score.total_cmp(&best.score) {
        Ordering::Greater => true,
        Ordering::Less => false,
        Ordering::Equal => node_map.get_index(best.index).is_some_and(|(held, _)| node < held),
    }
}

/// Bytes held by the open list and node map entries
fn footprint<N>(open_list: &BinaryHeap<Node>, node_map: &GraphNodeMap<N>) -> usize {
    open_list.len() * size_of::<Node>() + node_map.len() * (size_of::<N>() + size_of::<Visit>())
}


#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    type TestGraph = HashMap<String, Vec<(String, f64)>>;

    fn graph(edges: &[(&str, &str, f64)]) -> TestGraph {
        let mut graph: TestGraph = HashMap::new();
        for &(a, b, w) in edges {
            graph.entry(a.to_string()).or_default().push((b.to_string(), w));
            graph.entry(b.to_string()).or_default().push((a.to_string(), w));
        }
        graph
    }

    // Helper function to create a neighbor function from a graph
    fn create_neighbor_fn(graph: &TestGraph) -> impl Fn(&String) -> Vec<(String, f64)> + '_ {
        move |node: &String| {
            graph.get(node).cloned().unwrap_or_default()
        }
    }

    fn goals<'a>(scores: &'a [(&'a str, f64)]) -> impl Fn(&String) -> Option<f64> + 'a {
        move |node: &String| scores.iter().find(|(id, _)| id == node).map(|&(_, s)| s)
    }

    fn run(graph: &TestGraph, start: &str, scores: &[(&str, f64)]) -> Result<SearchRun<String>, SearchError> {
        best_first(start.to_string(), create_neighbor_fn(graph), |_| 0.0, goals(scores), &SearchLimits::default())?
            .into_run()
    }

    #[test]
    fn test_equal_priorities_pop_first_in_first_out() {
        // A -> B -> D and A -> C -> D all cost 1, B is discovered first
        let g = graph(&[("A", "B", 1.0), ("A", "C", 1.0), ("B", "D", 1.0), ("C", "D", 1.0)]);
        for _ in 0..5 {
            let run = run(&g, "A", &[("D", 0.0)]).unwrap();
            assert_eq!(run.path, vec!["A", "B", "D"]);
            assert_eq!(run.cost, 2.0);
        }
    }

    #[test]
    fn test_tied_goals_pick_highest_score() {
        let g = graph(&[("A", "B", 2.0), ("A", "C", 2.0)]);

        let run_c = run(&g, "A", &[("B", 0.2), ("C", 0.9)]).unwrap();
        assert_eq!(run_c.path, vec!["A", "C"]);
        assert_eq!(run_c.goal_score, 0.9);

        let run_b = run(&g, "A", &[("B", 0.9), ("C", 0.2)]).unwrap();
        assert_eq!(run_b.path, vec!["A", "B"]);
    }

    #[test]
    fn test_cost_beats_score() {
        let g = graph(&[("A", "B", 2.0), ("A", "C", 2.5)]);
        let run = run(&g, "A", &[("B", 0.1), ("C", 1.0)]).unwrap();
        assert_eq!(run.path, vec!["A", "B"]);
        assert_eq!(run.cost, 2.0);
    }

    #[test]
    fn test_equal_scores_pick_lowest_id() {
        // C is discovered and popped before B
        let g = graph(&[("A", "C", 2.0), ("A", "B", 2.0)]);
        let run = run(&g, "A", &[("C", 0.5), ("B", 0.5)]).unwrap();
        assert_eq!(run.path, vec!["A", "B"]);
    }

    #[test]
    fn test_equal_scores_ignore_heuristic_order() {
        // A-X-B and A-Y-C both cost 2, the heuristic pops Y and then C ahead of B
        let g = graph(&[("A", "X", 1.0), ("X", "B", 1.0), ("A", "Y", 1.0), ("Y", "C", 1.0)]);
        let h = |n: &String| match n.as_str() {
            "X" => 1.0,
            "Y" => 0.5,
            _ => 0.0,
        };
        let scores = [("B", 0.5), ("C", 0.5)];

        let informed = best_first("A".to_string(), create_neighbor_fn(&g), h, goals(&scores), &SearchLimits::default())
            .unwrap()
            .into_run()
            .unwrap();
        let blind = run(&g, "A", &scores).unwrap();

        assert_eq!(informed.path, vec!["A", "X", "B"]);
        assert_eq!(informed.path, blind.path);
        assert_eq!(informed.cost, 2.0);
    }

    #[test]
    fn test_start_is_goal() {
        let g = graph(&[("A", "B", 2.0)]);
        let run = run(&g, "A", &[("A", 0.3), ("B", 1.0)]).unwrap();
        assert_eq!(run.path, vec!["A"]);
        assert_eq!(run.cost, 0.0);
        assert_eq!(run.goal_score, 0.3);
    }

    #[test]
    fn test_no_goal_reachable() {
        let mut g = graph(&[("A", "B", 1.0)]);
        g.insert("Z".to_string(), vec![]);
        let result = run(&g, "A", &[("Z", 1.0)]);
        assert_eq!(result, Err(SearchError::NoPathFound { start: "A".into() }));

        let result = run(&g, "A", &[]);
        assert!(matches!(result, Err(SearchError::NoPathFound { .. })));
    }

    #[test]
    fn test_negative_weight_is_fatal() {
        let g = graph(&[("A", "B", 1.0), ("B", "C", -4.0)]);
        let result = run(&g, "A", &[("C", 1.0)]);
        assert_eq!(result, Err(SearchError::InvalidWeight { from: "B".into(), to: "C".into(), weight: -4.0 }));

        let g = graph(&[("A", "B", f64::NAN)]);
        assert!(matches!(run(&g, "A", &[("B", 1.0)]), Err(SearchError::InvalidWeight { .. })));
    }

    #[test]
    fn test_zero_weight_edges_allowed() {
        let g = graph(&[("A", "B", 0.0), ("B", "C", 0.0)]);
        let run = run(&g, "A", &[("C", 1.0)]).unwrap();
        assert_eq!(run.path, vec!["A", "B", "C"]);
        assert_eq!(run.cost, 0.0);
    }

    #[test]
    fn test_deadline_in_the_past() {
        let g = graph(&[("A", "B", 1.0)]);
        // already due by the time the first entry is popped
        let limits = SearchLimits { deadline: Some(Instant::now()) };
        let result = best_first("A".to_string(), create_neighbor_fn(&g), |_| 0.0, goals(&[("B", 1.0)]), &limits);
        assert!(matches!(result, Err(SearchError::DeadlineExceeded { expanded: 0 })));
    }

    #[test]
    fn test_metrics_count_expansions_not_stale_pops() {
        // B is first reached at cost 5 then improved to 2 via C, the stale entry is skipped
        let g = graph(&[("A", "B", 5.0), ("A", "C", 1.0), ("C", "B", 1.0), ("B", "D", 1.0)]);
        let run = run(&g, "A", &[("D", 1.0)]).unwrap();

        assert_eq!(run.path, vec!["A", "C", "B", "D"]);
        assert_eq!(run.cost, 3.0);
        // A, C, B, D
        assert_eq!(run.metrics.nodes_expanded, 4);
        assert!(run.metrics.max_frontier_size >= 2);
        assert!(run.metrics.peak_memory_bytes > 0);
    }

    #[test]
    fn test_same_cost_tolerance() {
        assert!(same_cost(0.1 + 0.2, 0.3));
        assert!(same_cost(1e6 + 1e-4, 1e6));
        assert!(!same_cost(2.0, 2.001));
    }
}
