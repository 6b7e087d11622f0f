use crate::errors::SearchError;
use super::best_first::best_first;
use super::{SearchLimits, SearchRun};

use std::{fmt::Display, hash::Hash};


/// A* Algorithm
/// https://en.wikipedia.org/wiki/A*_search_algorithm
pub struct AStar {}

impl AStar {

    /// From start Node, traverse through graph until a node meets goal criteria
    /// The Approach has 2 requirements:
    /// 1. The heuristic function must be consistent (never overestimates, and
    ///    drops by at most the edge cost along any edge)
    /// 2. With several goals the heuristic must bound the distance to the closest one
    pub fn plan<N, IT, NN, H, G>(&self, start: N, neighbors: NN, heuristic_fn: H, goal_fn: G, limits: &SearchLimits) -> Result<SearchRun<N>, SearchError>
    where
        N: Ord + Hash + Clone + Display,
        NN: Fn(&N) -> IT, // returns iterator of neighbors + costs
        H: Fn(&N) -> f64, // heuristic function
        IT: IntoIterator<Item = (N, f64)>, // Iterator of neighbors + edge cost to neighbor node
        G: Fn(&N) -> Option<f64>, // node qualifier for goal
        {

        best_first(start, neighbors, heuristic_fn, goal_fn, limits)?.into_run()
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    // Helper function to create a neighbor function from a graph
    // Assumes data stored as: HashMap<String, Vec<(String, f64)>>
    fn create_neighbor_fn(graph: &HashMap<String, Vec<(String, f64)>>) -> impl Fn(&String) -> Vec<(String, f64)> + '_ {
        move |node: &String| {
            graph.get(node).cloned().unwrap_or_default()
        }
    }

    /// A* algorithm test
    #[test]
    fn test_a_star() {
        // Diamond-shaped graph: A -> B -> D and A -> C -> D
        let mut graph = HashMap::new();
        graph.insert("A".to_string(), vec![("B".to_string(), 1.0), ("C".to_string(), 3.0)]);
        graph.insert("B".to_string(), vec![("D".to_string(), 5.0)]);
        graph.insert("C".to_string(), vec![("D".to_string(), 1.0)]);
        graph.insert("D".to_string(), vec![]);

        let neighbors = create_neighbor_fn(&graph);

        // Simple zero heuristic (makes A* behave like UCS)
        let heuristic = |_node: &String| 0.0;

        // Run A* algorithm from node A to node D
        let a_star = AStar{};
        let run = a_star.plan(
            "A".to_string(),
            neighbors,
            heuristic,
            |node: &String| (node == "D").then_some(1.0),
            &SearchLimits::default(),
        ).unwrap();

        // The expected path is A -> C -> D (the cheapest path)
        assert_eq!(run.path, vec!["A", "C", "D"].into_iter().map(String::from).collect::<Vec<_>>());
        assert_eq!(run.cost, 4.0);
        assert_eq!(run.goal_score, 1.0);
    }

    #[test]
    fn test_a_star_handles_unreachable_goal() {
        // Create a graph with no path to the goal
        let mut graph = HashMap::new();
        graph.insert("A".to_string(), vec![("B".to_string(), 1.0)]);
        graph.insert("B".to_string(), vec![("C".to_string(), 1.0)]);
        graph.insert("C".to_string(), vec![]);
        graph.insert("D".to_string(), vec![]); // D is not connected

        let neighbors = create_neighbor_fn(&graph);

        let a_star = AStar{};
        let result = a_star.plan(
            "A".to_string(),
            neighbors,
            |_node: &String| 0.0,
            |node: &String| (node == "D").then_some(0.0),
            &SearchLimits::default(),
        );

        // Expect a NoPathFound error
        assert!(matches!(result, Err(SearchError::NoPathFound { .. })));
    }

    #[test]
    fn test_a_star_with_heuristic_expands_less() {
        // Grid-like graph where nodes are (x, y) coordinates
        // A(0,0) -> B(1,0) -> D(2,0)
        //   |
        //   v
        // C(0,1) -> E(0,2) -> F(0,3)
        // Euclidean distance is admissible: every edge costs at least its length

        let mut graph = HashMap::new();
        graph.insert("A".to_string(), vec![("B".to_string(), 1.0), ("C".to_string(), 1.0)]);
        graph.insert("B".to_string(), vec![("D".to_string(), 1.0)]);
        graph.insert("C".to_string(), vec![("E".to_string(), 1.0)]);
        graph.insert("E".to_string(), vec![("F".to_string(), 1.0)]);
        graph.insert("D".to_string(), vec![]);
        graph.insert("F".to_string(), vec![]);

        // Coordinates for each node
        let coords = HashMap::from([
            ("A".to_string(), (0.0, 0.0)),
            ("B".to_string(), (1.0, 0.0)),
            ("C".to_string(), (0.0, 1.0)),
            ("D".to_string(), (2.0, 0.0)),
            ("E".to_string(), (0.0, 2.0)),
            ("F".to_string(), (0.0, 3.0)),
        ]);

        let heuristic = |node: &String| {
            let (nx, ny): (f64, f64) = coords[node];
            let (gx, gy): (f64, f64) = coords["D"]; // Goal is D
            ((nx - gx).powi(2) + (ny - gy).powi(2)).sqrt()
        };
        let is_goal = |node: &String| (node == "D").then_some(0.0);

        let a_star = AStar{};
        let informed = a_star.plan("A".to_string(), create_neighbor_fn(&graph), heuristic, is_goal, &SearchLimits::default()).unwrap();
        let blind = a_star.plan("A".to_string(), create_neighbor_fn(&graph), |_: &String| 0.0, is_goal, &SearchLimits::default()).unwrap();

        // The expected path is A -> B -> D either way
        assert_eq!(informed.path, vec!["A", "B", "D"].into_iter().map(String::from).collect::<Vec<_>>());
        assert_eq!(informed.path, blind.path);
        assert_eq!(informed.cost, blind.cost);

        // C is never expanded when guided towards D
        assert!(informed.metrics.nodes_expanded < blind.metrics.nodes_expanded);
    }
}
