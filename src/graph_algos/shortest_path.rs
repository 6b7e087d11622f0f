use super::GraphNodeMap;

/// Construct the shortest path from the goal node to the start node
/// Returns the ordered path as a vector of nodes from start to goal
/// node_map: GraphNodeMap<N> - map of nodes with their parent index and cost
/// goal_index: usize - index of the goal node in the node_map
/// `None` if a parent link points outside the map
pub(crate) fn shortest_path<N>(node_map: &GraphNodeMap<N>, goal_index: usize) -> Option<Vec<N>>
where
    N: Clone,
{

    let mut path = Vec::new();
    let mut current_index = goal_index;

    // Trace back from goal to start
    while current_index != usize::MAX {
        let (node, visit) = node_map.get_index(current_index)?;
        path.push(node.clone());
        current_index = visit.parent;

        // a parent chain longer than the map means a cycle in the links
        if path.len() > node_map.len() {
            return None;
        }
    }

    // The path is in reverse order, so reverse it
    path.reverse();

    if path.is_empty() {
        return None;
    }

    Some(path)
}
