//! # stratus_iac
//!
//! Infrastructure-as-code generation for Stratus architectures.
//!
//! Generation is registry driven: an [`EngineWriter`] knows how one engine
//! spells configuration and lays out files, and a [`ResourceMapper`] per
//! `(engine, resource type)` pair turns a resource into engine-neutral
//! [`CodeBlock`]s. Adding an engine or a resource type is a registration,
//! not a change to the generator.
//!
//! ## Example
//!
//! ```rust
//! use stratus_core::{Architecture, CloudProvider, DependencySorter, Resource};
//! use stratus_iac::{CodeGenerator, CodegenRegistry};
//!
//! let arch = Architecture::new(CloudProvider::Aws, "us-east-1")
//!     .with_resource(Resource::new("b1", "S3").with_name("assets"));
//! let arch = DependencySorter::sort(arch).unwrap();
//!
//! let registry = CodegenRegistry::with_defaults();
//! let result = CodeGenerator::new(&registry).generate("terraform", &arch);
//!
//! assert!(result.is_success());
//! assert!(result.file("main.tf").unwrap().content.contains("resource \"aws_s3_bucket\" \"assets\""));
//! ```

pub mod block;
pub mod error;
pub mod generator;
pub mod registry;
pub mod result;
pub mod terraform;
pub mod writer;

// Re-export main types for convenience
pub use block::{AttrValue, CodeBlock};
pub use error::{IacError, IacResult};
pub use generator::CodeGenerator;
pub use registry::{CodegenRegistry, MapContext, ResourceMapper};
pub use result::{write_all, GeneratedFile, PipelineResult, ResultError, ResultStatus};
pub use terraform::TerraformWriter;
pub use writer::{sanitize_identifier, EngineWriter};
