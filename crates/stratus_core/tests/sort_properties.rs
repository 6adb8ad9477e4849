//! Property tests for mapping and provisioning order.

use std::collections::HashMap;
use std::sync::Arc;

use proptest::prelude::*;
use stratus_core::{
    provisioning_edges, ArchitectureMapper, CloudProvider, DependencySorter, ResourceTypeRegistry,
};
use stratus_diagram::{DependencyType, Diagram, DiagramEdge, DiagramNode, GraphBuilder};

const TYPES: &[&str] = &["S3", "Lambda", "NATGateway", "SQS", "EC2", "RDS"];

/// Random acyclic diagram: node `i` may only depend on nodes of lower rank.
fn acyclic_diagram() -> impl Strategy<Value = Diagram> {
    (1usize..10)
        .prop_flat_map(|n| {
            let types = prop::collection::vec(0..TYPES.len(), n);
            let ranks = Just((0..n).collect::<Vec<_>>()).prop_shuffle();
            let edges = prop::collection::vec((0..n, 0..n), 0..(n * 2));
            (types, ranks, edges)
        })
        .prop_map(|(types, ranks, edges)| {
            let mut diagram = Diagram::new();
            for (i, t) in types.iter().enumerate() {
                diagram = diagram.node(
                    DiagramNode::new(format!("r{}", i), TYPES[*t]).with_metadata("extra_volume_gb", 10),
                );
            }
            for (k, (from, to)) in edges.into_iter().enumerate() {
                if ranks[to] < ranks[from] {
                    diagram = diagram.edge(DiagramEdge::dependency(
                        format!("d{}", k),
                        format!("r{}", from),
                        format!("r{}", to),
                        DependencyType::DependsOn,
                    ));
                }
            }
            diagram
        })
}

proptest! {
    #[test]
    fn prerequisites_precede_dependents(diagram in acyclic_diagram()) {
        let registry = ResourceTypeRegistry::with_defaults();
        let graph = Arc::new(GraphBuilder::build(diagram).unwrap());
        let architecture = ArchitectureMapper::new(&registry)
            .map(graph, CloudProvider::Aws, "us-east-1")
            .unwrap();
        let count = architecture.len();

        let sorted = DependencySorter::sort(architecture).unwrap();
        prop_assert_eq!(sorted.len(), count);

        let position: HashMap<&str, usize> = sorted
            .resource_ids()
            .into_iter()
            .enumerate()
            .map(|(i, id)| (id, i))
            .collect();

        for edge in provisioning_edges(&sorted).unwrap() {
            prop_assert!(
                position[edge.before.as_str()] < position[edge.after.as_str()],
                "{} should precede {}",
                edge.before,
                edge.after
            );
        }
    }

    #[test]
    fn sorting_is_deterministic(diagram in acyclic_diagram()) {
        let registry = ResourceTypeRegistry::with_defaults();
        let graph = Arc::new(GraphBuilder::build(diagram).unwrap());
        let mapper = ArchitectureMapper::new(&registry);

        let first = DependencySorter::sort(mapper.map(graph.clone(), CloudProvider::Aws, "us-east-1").unwrap()).unwrap();
        let second = DependencySorter::sort(mapper.map(graph, CloudProvider::Aws, "us-east-1").unwrap()).unwrap();

        prop_assert_eq!(first, second);
    }
}

#[test]
fn nat_gateway_expands_to_exactly_one_elastic_ip() {
    let registry = ResourceTypeRegistry::with_defaults();
    let graph = GraphBuilder::parse_str(
        r#"{"nodes": [{"id": "nat", "typeName": "NATGateway"}], "edges": []}"#,
    )
    .unwrap();

    let architecture = ArchitectureMapper::new(&registry)
        .map(Arc::new(graph), CloudProvider::Aws, "eu-west-1")
        .unwrap();

    let eips: Vec<_> = architecture
        .resources
        .iter()
        .filter(|r| r.type_name == "ElasticIP")
        .collect();
    assert_eq!(eips.len(), 1);
    assert_eq!(eips[0].parents, vec!["nat"]);
    assert_eq!(architecture.resource("nat").unwrap().children, vec!["nat-elasticip-1"]);
}
