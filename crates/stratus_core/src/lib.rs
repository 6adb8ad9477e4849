//! # stratus_core
//!
//! Resource model, type registry, architecture mapping and dependency
//! ordering for Stratus.
//!
//! # Architecture
//!
//! - **Registry**: Maps resource type names to descriptors and hidden dependency rules
//! - **Mapper**: Turns a validated diagram graph into an [`Architecture`]
//! - **Sorter**: Orders resources so every prerequisite is provisioned first
//! - **Expressions**: The restricted evaluator behind hidden dependency rules
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use stratus_core::{ArchitectureMapper, CloudProvider, DependencySorter, ResourceTypeRegistry};
//! use stratus_diagram::GraphBuilder;
//!
//! let registry = ResourceTypeRegistry::with_defaults();
//! let graph = GraphBuilder::parse_str(r#"{
//!     "nodes": [
//!         {"id": "v1", "typeName": "VPC"},
//!         {"id": "nat", "typeName": "NATGateway", "parentId": "v1"}
//!     ]
//! }"#).unwrap();
//!
//! let architecture = ArchitectureMapper::new(&registry)
//!     .map(Arc::new(graph), CloudProvider::Aws, "us-east-1")
//!     .unwrap();
//! let sorted = DependencySorter::sort(architecture).unwrap();
//!
//! assert_eq!(sorted.resource_ids(), vec!["v1", "nat", "nat-elasticip-1"]);
//! ```

pub mod error;
pub mod expr;
pub mod hidden;
pub mod mapper;
pub mod provider;
pub mod providers;
pub mod registry;
pub mod resource;
pub mod resource_type;
pub mod sorter;

// Re-export main types for convenience
pub use error::{CoreError, CoreResult};
pub use expr::{Expression, Value};
pub use hidden::HiddenDependencyRule;
pub use mapper::ArchitectureMapper;
pub use provider::CloudProvider;
pub use registry::ResourceTypeRegistry;
pub use resource::{Architecture, DependencyOrigin, Resource, ResourceDependency};
pub use resource_type::{ResourceCategory, ResourceType};
pub use sorter::{provisioning_edges, DependencySorter, ProvisioningEdge};
