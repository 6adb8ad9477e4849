//! Typed diagram graph with a containment forest and a dependency digraph.

use std::collections::HashMap;

use indexmap::IndexMap;

use crate::models::{DiagramEdge, DiagramNode};

/// A parsed diagram.
///
/// Nodes keep the order in which they appeared in the document; that order
/// is what downstream stages use to break ties deterministically.
/// Instances are produced by [`GraphBuilder`](crate::GraphBuilder), which
/// guarantees that every edge endpoint exists and that containment is a
/// single-parent, acyclic forest.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    nodes: IndexMap<String, DiagramNode>,
    parents: HashMap<String, String>,
    children: HashMap<String, Vec<String>>,
    containment: Vec<DiagramEdge>,
    dependency: Vec<DiagramEdge>,
}

impl Graph {
    pub(crate) fn from_parts(
        nodes: IndexMap<String, DiagramNode>,
        containment: Vec<DiagramEdge>,
        dependency: Vec<DiagramEdge>,
    ) -> Self {
        let parents: HashMap<String, String> = containment
            .iter()
            .map(|edge| (edge.target.clone(), edge.source.clone()))
            .collect();

        let mut children: HashMap<String, Vec<String>> = HashMap::new();
        for id in nodes.keys() {
            if let Some(parent) = parents.get(id) {
                children.entry(parent.clone()).or_default().push(id.clone());
            }
        }

        Self {
            nodes,
            parents,
            children,
            containment,
            dependency,
        }
    }

    /// Look up a node by id.
    pub fn node(&self, id: &str) -> Option<&DiagramNode> {
        self.nodes.get(id)
    }

    /// Check whether a node exists.
    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    /// All nodes in document order.
    pub fn nodes(&self) -> impl Iterator<Item = &DiagramNode> {
        self.nodes.values()
    }

    /// Position of a node in document order.
    pub fn insertion_index(&self, id: &str) -> Option<usize> {
        self.nodes.get_index_of(id)
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if the graph has no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Containment parent id of a node.
    pub fn parent_id(&self, id: &str) -> Option<&str> {
        self.parents.get(id).map(String::as_str)
    }

    /// Containment parent of a node.
    pub fn parent_of(&self, id: &str) -> Option<&DiagramNode> {
        self.parent_id(id).and_then(|parent| self.nodes.get(parent))
    }

    /// Containment children of a node, in document order.
    pub fn children_of(&self, id: &str) -> Vec<&DiagramNode> {
        self.children
            .get(id)
            .map(|ids| ids.iter().filter_map(|child| self.nodes.get(child)).collect())
            .unwrap_or_default()
    }

    /// Outgoing dependency edges of a node, in document order.
    pub fn dependencies_of<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a DiagramEdge> + 'a {
        self.dependency.iter().filter(move |edge| edge.source == id)
    }

    /// Resolved containment edges (parent -> child), one per contained node.
    pub fn containment_edges(&self) -> &[DiagramEdge] {
        &self.containment
    }

    /// Dependency edges (dependent -> prerequisite).
    pub fn dependency_edges(&self) -> &[DiagramEdge] {
        &self.dependency
    }

    /// Nodes without a containment parent, in document order.
    pub fn roots(&self) -> impl Iterator<Item = &DiagramNode> {
        self.nodes
            .values()
            .filter(|node| !self.parents.contains_key(&node.id))
    }
}
