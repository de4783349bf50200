//! Breadth-first shortest path over the marker graph

use std::collections::{HashMap, VecDeque};

use super::model::Graph;

/// Shortest path from `start` to `goal`, both inclusive
///
/// Neighbors are expanded in authored order, so among equally short paths
/// the first one discovered is returned every time. When `goal` cannot be
/// reached the result is `[start]`; callers treat a length below 2 as "no
/// route".
pub fn shortest_path(graph: &Graph, start: &str, goal: &str) -> Vec<String> {
    if start == goal {
        return vec![start.to_string()];
    }

    let mut queue = VecDeque::from([start]);
    let mut prev: HashMap<&str, Option<&str>> = HashMap::from([(start, None)]);

    while let Some(node) = queue.pop_front() {
        if node == goal {
            break;
        }
        for (neighbor, _) in graph.neighbors(node) {
            let neighbor = neighbor.as_str();
            if !prev.contains_key(neighbor) {
                prev.insert(neighbor, Some(node));
                queue.push_back(neighbor);
            }
        }
    }

    if !prev.contains_key(goal) {
        return vec![start.to_string()];
    }

    let mut path = Vec::new();
    let mut cursor = Some(goal);
    while let Some(node) = cursor {
        path.push(node.to_string());
        cursor = prev.get(node).copied().flatten();
    }
    path.reverse();
    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::model::{Direction, EdgeSpec, GraphSpec, NodeSpec};
    use crate::graph::sample;

    fn graph(ids: &[&str], edges: &[(&str, &str)]) -> Graph {
        Graph::from_spec(GraphSpec {
            nodes: ids
                .iter()
                .map(|id| NodeSpec {
                    id: id.to_string(),
                    destination: None,
                })
                .collect(),
            edges: edges
                .iter()
                .map(|(from, to)| EdgeSpec {
                    from: from.to_string(),
                    to: to.to_string(),
                    direction: Direction::Forward,
                })
                .collect(),
        })
        .unwrap()
    }

    #[test]
    fn test_same_start_and_goal() {
        let campus = sample::campus();
        assert_eq!(shortest_path(&campus, "N4", "N4"), vec!["N4"]);
        // Holds even for ids the graph does not know
        assert_eq!(shortest_path(&campus, "X", "X"), vec!["X"]);
    }

    #[test]
    fn test_campus_route_to_office() {
        let campus = sample::campus();
        assert_eq!(
            shortest_path(&campus, "N6", "N13"),
            vec!["N6", "N10", "N11", "N12", "N13"]
        );
    }

    #[test]
    fn test_route_is_minimal() {
        let campus = sample::campus();
        // N1 -> N2 -> N3 -> N4
        assert_eq!(shortest_path(&campus, "N1", "N4").len(), 4);
        // N8 -> N9 -> N10 -> N11 -> N12 -> N13
        assert_eq!(shortest_path(&campus, "N8", "N13").len(), 6);
    }

    #[test]
    fn test_unreachable_goal_returns_start() {
        let g = graph(&["A", "B", "C"], &[("A", "B")]);
        assert_eq!(shortest_path(&g, "A", "C"), vec!["A"]);
        // Directed: B cannot get back to A
        assert_eq!(shortest_path(&g, "B", "A"), vec!["B"]);
    }

    #[test]
    fn test_unknown_start_returns_start() {
        let campus = sample::campus();
        assert_eq!(shortest_path(&campus, "N99", "N13"), vec!["N99"]);
    }

    #[test]
    fn test_tie_break_follows_neighbor_order() {
        // Two routes of equal length: A-B-D and A-C-D
        let via_b = graph(&["A", "B", "C", "D"], &[("A", "B"), ("A", "C"), ("B", "D"), ("C", "D")]);
        assert_eq!(shortest_path(&via_b, "A", "D"), vec!["A", "B", "D"]);

        let via_c = graph(&["A", "B", "C", "D"], &[("A", "C"), ("A", "B"), ("B", "D"), ("C", "D")]);
        assert_eq!(shortest_path(&via_c, "A", "D"), vec!["A", "C", "D"]);
    }

    #[test]
    fn test_deterministic_across_runs() {
        let campus = sample::campus();
        let first = shortest_path(&campus, "N1", "N8");
        for _ in 0..10 {
            assert_eq!(shortest_path(&campus, "N1", "N8"), first);
        }
    }
}
