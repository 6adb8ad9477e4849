//! Diagram JSON to [`Graph`] construction.

use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;
use tracing::{debug, warn};

use crate::error::{DiagramError, DiagramResult};
use crate::graph::Graph;
use crate::models::{Diagram, DiagramEdge, DiagramNode, EdgeKind};

/// Builds validated graphs from diagram documents.
pub struct GraphBuilder;

impl GraphBuilder {
    /// Parse raw diagram JSON into a graph.
    pub fn parse(raw: &[u8]) -> DiagramResult<Graph> {
        let diagram: Diagram = serde_json::from_slice(raw)
            .map_err(|e| DiagramError::malformed(format!("invalid diagram JSON: {}", e)))?;
        Self::build(diagram)
    }

    /// Parse diagram JSON held in a string.
    pub fn parse_str(raw: &str) -> DiagramResult<Graph> {
        Self::parse(raw.as_bytes())
    }

    /// Build a graph from an already deserialized diagram.
    pub fn build(diagram: Diagram) -> DiagramResult<Graph> {
        let Diagram { nodes, edges } = diagram;
        debug!("Building graph from {} nodes and {} edges", nodes.len(), edges.len());

        let nodes = Self::index_nodes(nodes)?;
        Self::check_edges(&nodes, &edges)?;

        let (containment_edges, dependency_edges): (Vec<_>, Vec<_>) = edges
            .into_iter()
            .partition(|edge| edge.kind == EdgeKind::Containment);

        let containment = Self::resolve_containment(&nodes, containment_edges)?;
        Self::check_forest(&nodes, &containment)?;

        let dependency = dependency_edges
            .into_iter()
            .map(|mut edge| {
                edge.dependency_type = Some(edge.effective_dependency_type());
                edge
            })
            .collect();

        Ok(Graph::from_parts(nodes, containment, dependency))
    }

    fn index_nodes(nodes: Vec<DiagramNode>) -> DiagramResult<IndexMap<String, DiagramNode>> {
        let mut indexed = IndexMap::with_capacity(nodes.len());

        for node in nodes {
            if node.id.trim().is_empty() {
                return Err(DiagramError::malformed("node with empty id"));
            }
            if node.type_name.trim().is_empty() {
                return Err(DiagramError::malformed(format!(
                    "node '{}' has no resource type",
                    node.id
                )));
            }
            if indexed.contains_key(&node.id) {
                return Err(DiagramError::malformed(format!("duplicate node id '{}'", node.id)));
            }
            indexed.insert(node.id.clone(), node);
        }

        Ok(indexed)
    }

    fn check_edges(nodes: &IndexMap<String, DiagramNode>, edges: &[DiagramEdge]) -> DiagramResult<()> {
        let mut seen = HashSet::new();

        for edge in edges {
            if !seen.insert(edge.id.as_str()) {
                return Err(DiagramError::malformed(format!("duplicate edge id '{}'", edge.id)));
            }
            for endpoint in [&edge.source, &edge.target] {
                if !nodes.contains_key(endpoint) {
                    return Err(DiagramError::malformed(format!(
                        "edge '{}' references unknown node '{}'",
                        edge.id, endpoint
                    )));
                }
            }
        }

        Ok(())
    }

    /// Merge explicit containment edges with `parentId` shorthands.
    ///
    /// The result holds one edge per contained node, ordered by the child's
    /// position in the document.
    fn resolve_containment(
        nodes: &IndexMap<String, DiagramNode>,
        explicit: Vec<DiagramEdge>,
    ) -> DiagramResult<Vec<DiagramEdge>> {
        let mut by_child: HashMap<String, DiagramEdge> = HashMap::new();

        for edge in explicit {
            if edge.source == edge.target {
                return Err(DiagramError::containment(
                    &edge.target,
                    format!("edge '{}' makes the node contain itself", edge.id),
                ));
            }
            match by_child.get(&edge.target) {
                Some(existing) if existing.source == edge.source => {
                    debug!(
                        "Collapsing duplicate containment edge '{}' ({} -> {})",
                        edge.id, edge.source, edge.target
                    );
                }
                Some(existing) => {
                    return Err(DiagramError::containment(
                        &edge.target,
                        format!(
                            "more than one containment parent ('{}' and '{}')",
                            existing.source, edge.source
                        ),
                    ));
                }
                None => {
                    by_child.insert(edge.target.clone(), edge);
                }
            }
        }

        for node in nodes.values() {
            let Some(parent_id) = node.parent_id.as_deref() else {
                continue;
            };
            if !nodes.contains_key(parent_id) {
                return Err(DiagramError::malformed(format!(
                    "node '{}' declares unknown parentId '{}'",
                    node.id, parent_id
                )));
            }
            match by_child.get(&node.id) {
                Some(edge) if edge.source != parent_id => {
                    warn!(
                        "Node '{}' declares parentId '{}' but containment edge '{}' names '{}'; using the edge",
                        node.id, parent_id, edge.id, edge.source
                    );
                }
                Some(_) => {}
                None => {
                    if parent_id == node.id {
                        return Err(DiagramError::containment(&node.id, "parentId names the node itself"));
                    }
                    by_child.insert(
                        node.id.clone(),
                        DiagramEdge::containment(format!("{}:parent", node.id), parent_id, &node.id),
                    );
                }
            }
        }

        Ok(nodes
            .keys()
            .filter_map(|id| by_child.remove(id))
            .collect())
    }

    /// Walk parent pointers from every node and reject cycles.
    fn check_forest(nodes: &IndexMap<String, DiagramNode>, containment: &[DiagramEdge]) -> DiagramResult<()> {
        #[derive(Clone, Copy, PartialEq)]
        enum Mark {
            Unvisited,
            InProgress,
            Done,
        }

        let parents: HashMap<&str, &str> = containment
            .iter()
            .map(|edge| (edge.target.as_str(), edge.source.as_str()))
            .collect();
        let mut marks: HashMap<&str, Mark> = nodes.keys().map(|id| (id.as_str(), Mark::Unvisited)).collect();

        for start in nodes.keys() {
            let mut path: Vec<&str> = Vec::new();
            let mut current = Some(start.as_str());

            while let Some(id) = current {
                match marks.get(id).copied().unwrap_or(Mark::Done) {
                    Mark::Done => break,
                    Mark::InProgress => {
                        let from = path.iter().position(|p| *p == id).unwrap_or(0);
                        let mut cycle: Vec<&str> = path[from..].to_vec();
                        cycle.push(id);
                        return Err(DiagramError::containment(
                            id,
                            format!("containment cycle {}", cycle.join(" -> ")),
                        ));
                    }
                    Mark::Unvisited => {
                        marks.insert(id, Mark::InProgress);
                        path.push(id);
                        current = parents.get(id).copied();
                    }
                }
            }

            for id in path {
                marks.insert(id, Mark::Done);
            }
        }

        Ok(())
    }
}
