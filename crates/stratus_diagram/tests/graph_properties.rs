//! Property tests for graph construction.

use std::collections::HashSet;

use proptest::prelude::*;
use stratus_diagram::{Diagram, DiagramEdge, DiagramError, DiagramNode, GraphBuilder};

/// Random diagram with `n` nodes and arbitrary containment edges, which may
/// include conflicting parents and cycles.
fn arbitrary_diagram() -> impl Strategy<Value = Diagram> {
    (1usize..12).prop_flat_map(|n| {
        let edges = prop::collection::vec((0..n, 0..n), 0..(n * 2));
        let shorthand = prop::collection::vec(prop::option::of(0..n), n);
        (Just(n), edges, shorthand)
    })
    .prop_map(|(n, edges, shorthand)| {
        let mut diagram = Diagram::new();
        for i in 0..n {
            let mut node = DiagramNode::new(format!("n{}", i), "VPC");
            if let Some(parent) = shorthand[i] {
                node = node.with_parent(format!("n{}", parent));
            }
            diagram = diagram.node(node);
        }
        for (k, (parent, child)) in edges.into_iter().enumerate() {
            diagram = diagram.edge(DiagramEdge::containment(
                format!("e{}", k),
                format!("n{}", parent),
                format!("n{}", child),
            ));
        }
        diagram
    })
}

proptest! {
    #[test]
    fn accepted_graphs_are_forests(diagram in arbitrary_diagram()) {
        match GraphBuilder::build(diagram) {
            Ok(graph) => {
                let mut children = HashSet::new();
                for edge in graph.containment_edges() {
                    prop_assert!(children.insert(edge.target.clone()), "node {} has two parents", edge.target);
                }

                for node in graph.nodes() {
                    let mut seen = HashSet::new();
                    let mut current = Some(node.id.as_str());
                    while let Some(id) = current {
                        prop_assert!(seen.insert(id.to_string()), "cycle through {}", id);
                        current = graph.parent_id(id);
                    }
                }
            }
            Err(err) => {
                prop_assert!(matches!(err, DiagramError::InvalidContainmentGraph { .. }), "unexpected error: {:?}", err);
            }
        }
    }
}
