//! Terraform engine.

pub mod aws;
pub mod hcl;

use std::sync::Arc;

use crate::registry::CodegenRegistry;

pub use hcl::TerraformWriter;

/// Engine name under which Terraform is registered.
pub const ENGINE: &str = "terraform";

/// Register the Terraform writer and every built-in Terraform mapper.
pub fn register(registry: &mut CodegenRegistry) {
    registry.register_writer(Arc::new(TerraformWriter::new()));
    aws::register(registry);
}
