//! # stratus_diagram
//!
//! Diagram parsing and graph construction for Stratus.
//!
//! A diagram is the JSON document produced by the architecture editor: a list
//! of nodes (cloud resources) and edges (containment or dependency). This
//! crate turns that document into a [`Graph`] whose containment edges are
//! guaranteed to form a forest.
//!
//! ## Example
//!
//! ```rust
//! use stratus_diagram::GraphBuilder;
//!
//! let graph = GraphBuilder::parse_str(r#"{
//!     "nodes": [
//!         {"id": "v1", "typeName": "VPC"},
//!         {"id": "s1", "typeName": "Subnet", "parentId": "v1"}
//!     ],
//!     "edges": []
//! }"#).unwrap();
//!
//! assert_eq!(graph.parent_id("s1"), Some("v1"));
//! ```

pub mod builder;
pub mod error;
pub mod graph;
pub mod models;

pub use builder::GraphBuilder;
pub use error::{DiagramError, DiagramResult};
pub use graph::Graph;
pub use models::{DependencyType, Diagram, DiagramEdge, DiagramNode, EdgeKind, Metadata, Position};
