//! Built-in campus floor graph (markers N1..N13)

use super::model::{Direction, EdgeSpec, Graph, GraphSpec, NodeSpec};

const NODES: &[(&str, Option<&str>)] = &[
    ("N1", Some("Main Stairs")),
    ("N2", None),
    ("N3", None),
    ("N4", Some("Dean's Office - 2053")),
    ("N5", None),
    ("N6", None),
    ("N7", None),
    ("N8", Some("Alpay Filiztekin - 2001")),
    ("N9", None),
    ("N10", None),
    ("N11", None),
    ("N12", None),
    ("N13", Some("Mehmet Kuru - 2143")),
];

const EDGES: &[(&str, &str, Direction)] = &[
    ("N1", "N2", Direction::Left),
    ("N2", "N1", Direction::Back),
    ("N2", "N3", Direction::Right),
    ("N2", "N5", Direction::Left),
    ("N3", "N2", Direction::Back),
    ("N3", "N4", Direction::Left),
    ("N4", "N3", Direction::Back),
    ("N5", "N2", Direction::Back),
    ("N5", "N6", Direction::Forward),
    ("N6", "N5", Direction::Back),
    ("N6", "N7", Direction::Right),
    ("N6", "N10", Direction::Left),
    ("N7", "N6", Direction::Back),
    ("N8", "N7", Direction::Back),
    ("N8", "N9", Direction::Left),
    ("N9", "N8", Direction::Back),
    ("N9", "N10", Direction::Left),
    ("N10", "N9", Direction::Back),
    ("N10", "N11", Direction::Right),
    ("N10", "N6", Direction::Left),
    ("N11", "N10", Direction::Back),
    ("N11", "N12", Direction::Forward),
    ("N12", "N11", Direction::Back),
    ("N12", "N13", Direction::Right),
    ("N13", "N12", Direction::Back),
];

/// Graph description of the campus floor
pub fn campus_spec() -> GraphSpec {
    GraphSpec {
        nodes: NODES
            .iter()
            .map(|(id, destination)| NodeSpec {
                id: id.to_string(),
                destination: destination.map(str::to_string),
            })
            .collect(),
        edges: EDGES
            .iter()
            .map(|(from, to, direction)| EdgeSpec {
                from: from.to_string(),
                to: to.to_string(),
                direction: *direction,
            })
            .collect(),
    }
}

/// The campus floor graph
pub fn campus() -> Graph {
    Graph::from_spec(campus_spec()).expect("built-in campus graph is valid")
}
