//! # stratus_pipeline
//!
//! Orchestrates the Stratus stages: a diagram is parsed into a graph,
//! validated against constraints, mapped onto an architecture with hidden
//! dependencies expanded, ordered, and finally turned into IaC files.
//!
//! ## Example
//!
//! ```rust,no_run
//! use stratus_core::CloudProvider;
//! use stratus_pipeline::{Pipeline, ProcessOutcome};
//!
//! # async fn run(raw: &[u8]) -> stratus_pipeline::RunResult<()> {
//! let pipeline = Pipeline::builder().build();
//!
//! match pipeline.process_diagram(raw, CloudProvider::Aws, "us-east-1").await? {
//!     ProcessOutcome::Mapped(architecture) => {
//!         let result = pipeline.generate_code(architecture, "terraform");
//!         println!("{} files", result.files.len());
//!     }
//!     ProcessOutcome::Invalid(errors) => {
//!         for error in errors {
//!             eprintln!("{}", error);
//!         }
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod pipeline;
pub mod stores;

// Re-export main types for convenience
pub use config::{PipelineConfig, CONFIG_FILE};
pub use error::{PipelineError, RunResult};
pub use pipeline::{Pipeline, PipelineBuilder, ProcessOutcome};
pub use stores::{
    hydrate_registry, ArchitectureStore, InMemoryArchitectureStore, InMemoryResourceTypeStore, ResourceTypeRecord,
    ResourceTypeStore, StoredArchitecture,
};
