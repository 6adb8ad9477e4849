//! Code generation registry.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use stratus_core::{Architecture, Resource};

use crate::block::CodeBlock;
use crate::error::IacResult;
use crate::terraform;
use crate::writer::EngineWriter;

/// What a mapper can see besides the resource it is mapping.
pub struct MapContext<'a> {
    pub architecture: &'a Architecture,
    pub engine: &'a str,
    local_names: &'a HashMap<String, String>,
}

impl<'a> MapContext<'a> {
    pub fn new(architecture: &'a Architecture, engine: &'a str, local_names: &'a HashMap<String, String>) -> Self {
        Self {
            architecture,
            engine,
            local_names,
        }
    }

    /// Engine-local identifier assigned to a resource.
    pub fn local_name(&self, resource_id: &str) -> Option<&'a str> {
        self.local_names.get(resource_id).map(String::as_str)
    }

    pub fn resource(&self, resource_id: &str) -> Option<&'a Resource> {
        self.architecture.resource(resource_id)
    }

    /// Nearest containment ancestor of the given type.
    pub fn ancestor(&self, resource: &Resource, type_name: &str) -> Option<&'a Resource> {
        let mut current = self.resource(resource.parent()?)?;
        let mut hops = 0;
        loop {
            if current.type_name == type_name {
                return Some(current);
            }
            hops += 1;
            if hops > self.architecture.len() {
                return None;
            }
            current = self.resource(current.parent()?)?;
        }
    }

    /// Containment children of the given type, in child order.
    pub fn children(&self, resource: &Resource, type_name: &str) -> Vec<&'a Resource> {
        resource
            .children
            .iter()
            .filter_map(|id| self.resource(id))
            .filter(|r| r.type_name == type_name)
            .collect()
    }

    /// Dependency targets of the given type, in declaration order.
    pub fn dependencies(&self, resource: &Resource, type_name: &str) -> Vec<&'a Resource> {
        resource
            .dependency_targets()
            .filter_map(|id| self.resource(id))
            .filter(|r| r.type_name == type_name)
            .collect()
    }

    /// Resources that depend on the given one.
    pub fn dependents(&self, resource: &Resource) -> Vec<&'a Resource> {
        self.architecture
            .resources
            .iter()
            .filter(|r| r.dependency_targets().any(|t| t == resource.id))
            .collect()
    }
}

/// Turns one resource into engine blocks.
///
/// A mapper may return more than one block, e.g. a variable or output next
/// to the resource itself.
pub trait ResourceMapper: Send + Sync {
    fn map(&self, resource: &Resource, ctx: &MapContext<'_>) -> IacResult<Vec<CodeBlock>>;
}

impl<F> ResourceMapper for F
where
    F: Fn(&Resource, &MapContext<'_>) -> IacResult<Vec<CodeBlock>> + Send + Sync,
{
    fn map(&self, resource: &Resource, ctx: &MapContext<'_>) -> IacResult<Vec<CodeBlock>> {
        self(resource, ctx)
    }
}

/// Engines and their per-type mappers.
///
/// Built once at startup and shared read-only afterwards.
#[derive(Default, Clone)]
pub struct CodegenRegistry {
    writers: HashMap<String, Arc<dyn EngineWriter>>,
    mappers: HashMap<(String, String), Arc<dyn ResourceMapper>>,
}

impl CodegenRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with the built-in Terraform engine and AWS mappers.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        terraform::register(&mut registry);
        registry
    }

    /// Register the writer for an engine, replacing any previous one.
    pub fn register_writer(&mut self, writer: Arc<dyn EngineWriter>) {
        let engine = writer.engine().to_string();
        debug!("Registering IaC engine: {}", engine);
        self.writers.insert(engine, writer);
    }

    /// Register a mapper for a resource type under an engine.
    pub fn register_mapper(
        &mut self,
        engine: impl Into<String>,
        type_name: impl Into<String>,
        mapper: impl ResourceMapper + 'static,
    ) {
        let key = (engine.into(), type_name.into());
        debug!("Registering {} mapper for {}", key.0, key.1);
        self.mappers.insert(key, Arc::new(mapper));
    }

    pub fn writer(&self, engine: &str) -> Option<Arc<dyn EngineWriter>> {
        self.writers.get(engine).cloned()
    }

    pub fn mapper(&self, engine: &str, type_name: &str) -> Option<Arc<dyn ResourceMapper>> {
        self.mappers
            .get(&(engine.to_string(), type_name.to_string()))
            .cloned()
    }

    /// Registered engine names, sorted.
    pub fn engines(&self) -> Vec<&str> {
        let mut engines: Vec<_> = self.writers.keys().map(String::as_str).collect();
        engines.sort_unstable();
        engines
    }

    /// Resource types with a mapper for the engine, sorted.
    pub fn supported_types(&self, engine: &str) -> Vec<&str> {
        let mut types: Vec<_> = self
            .mappers
            .keys()
            .filter(|(e, _)| e == engine)
            .map(|(_, t)| t.as_str())
            .collect();
        types.sort_unstable();
        types
    }
}

impl std::fmt::Debug for CodegenRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CodegenRegistry")
            .field("engines", &self.engines())
            .field("mappers", &self.mappers.len())
            .finish()
    }
}
