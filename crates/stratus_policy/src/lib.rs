//! # stratus_policy
//!
//! Data-driven structural validation for Stratus diagrams.
//!
//! This crate provides:
//! - **Constraints**: Per-type structural rules loaded from YAML/JSON or a store
//! - **Rule Engine**: Evaluates every constraint and accumulates violations
//! - **Constraint Stores**: The request-time source of constraints
//!
//! ## Example
//!
//! ```rust
//! use stratus_core::ResourceTypeRegistry;
//! use stratus_diagram::GraphBuilder;
//! use stratus_policy::{Constraint, ConstraintSet, RuleEngine};
//!
//! let registry = ResourceTypeRegistry::with_defaults();
//! let graph = GraphBuilder::parse_str(r#"{
//!     "nodes": [{"id": "s1", "typeName": "Subnet"}]
//! }"#).unwrap();
//!
//! let constraints = ConstraintSet::new().with(Constraint::requires_parent("Subnet", &["VPC"]));
//! let errors = RuleEngine::new(&registry).validate(&graph, &constraints, "us-east-1");
//!
//! assert_eq!(errors.len(), 1);
//! assert_eq!(errors[0].constraint_type, "requires_parent");
//! ```

pub mod constraint;
pub mod engine;
pub mod error;
pub mod store;

pub use constraint::{Constraint, ConstraintSet, ConstraintType};
pub use engine::{RuleEngine, ValidationError};
pub use error::{PolicyError, PolicyResult};
pub use store::{ConstraintStore, InMemoryConstraintStore};
