//! Persistence seams for architectures and resource types.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use tracing::{debug, info, warn};
use uuid::Uuid;

use stratus_core::{Architecture, CloudProvider, HiddenDependencyRule, ResourceType, ResourceTypeRegistry};

use crate::error::{PipelineError, RunResult};

/// Loads and saves mapped architectures by project id.
#[async_trait]
pub trait ArchitectureStore: Send + Sync {
    async fn load_architecture(&self, id: Uuid) -> RunResult<Architecture>;

    async fn save_architecture(&self, architecture: &Architecture) -> RunResult<Uuid>;
}

/// A saved architecture.
#[derive(Debug, Clone)]
pub struct StoredArchitecture {
    pub id: Uuid,
    pub architecture: Architecture,
    pub saved_at: DateTime<Utc>,
}

/// Process-local architecture store.
#[derive(Clone, Default)]
pub struct InMemoryArchitectureStore {
    records: Arc<RwLock<HashMap<Uuid, StoredArchitecture>>>,
    failure: Arc<RwLock<Option<String>>>,
}

impl InMemoryArchitectureStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail with a store error.
    pub fn fail_with(&self, message: impl Into<String>) {
        *self.failure.write() = Some(message.into());
    }

    pub fn clear_failure(&self) {
        *self.failure.write() = None;
    }

    pub fn get(&self, id: Uuid) -> Option<StoredArchitecture> {
        self.records.read().get(&id).cloned()
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }

    fn check_failure(&self) -> RunResult<()> {
        match self.failure.read().clone() {
            Some(message) => Err(PipelineError::Store(message)),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ArchitectureStore for InMemoryArchitectureStore {
    async fn load_architecture(&self, id: Uuid) -> RunResult<Architecture> {
        self.check_failure()?;
        self.records
            .read()
            .get(&id)
            .map(|record| record.architecture.clone())
            .ok_or(PipelineError::ArchitectureNotFound(id))
    }

    async fn save_architecture(&self, architecture: &Architecture) -> RunResult<Uuid> {
        self.check_failure()?;
        let id = Uuid::new_v4();
        debug!("Saving architecture {} ({} resources)", id, architecture.len());
        self.records.write().insert(
            id,
            StoredArchitecture {
                id,
                architecture: architecture.clone(),
                saved_at: Utc::now(),
            },
        );
        Ok(id)
    }
}

impl std::fmt::Debug for InMemoryArchitectureStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryArchitectureStore")
            .field("architectures", &self.len())
            .finish()
    }
}

/// A resource type together with its hidden-dependency rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceTypeRecord {
    pub resource_type: ResourceType,
    pub hidden_dependencies: Vec<HiddenDependencyRule>,
}

impl ResourceTypeRecord {
    pub fn new(resource_type: ResourceType) -> Self {
        Self {
            resource_type,
            hidden_dependencies: Vec::new(),
        }
    }

    pub fn with_rule(mut self, rule: HiddenDependencyRule) -> Self {
        self.hidden_dependencies.push(rule);
        self
    }
}

/// Source of resource types beyond the built-in catalog.
#[async_trait]
pub trait ResourceTypeStore: Send + Sync {
    async fn find_resource_type(&self, name: &str, provider: CloudProvider) -> RunResult<Option<ResourceTypeRecord>>;
}

/// Process-local resource type store.
#[derive(Clone, Default)]
pub struct InMemoryResourceTypeStore {
    records: Arc<RwLock<Vec<ResourceTypeRecord>>>,
    queries: Arc<AtomicUsize>,
}

impl InMemoryResourceTypeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_record(self, record: ResourceTypeRecord) -> Self {
        self.records.write().push(record);
        self
    }

    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ResourceTypeStore for InMemoryResourceTypeStore {
    async fn find_resource_type(&self, name: &str, provider: CloudProvider) -> RunResult<Option<ResourceTypeRecord>> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .records
            .read()
            .iter()
            .find(|r| r.resource_type.name == name && r.resource_type.cloud_provider == provider)
            .cloned())
    }
}

impl std::fmt::Debug for InMemoryResourceTypeStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryResourceTypeStore")
            .field("records", &self.records.read().len())
            .field("queries", &self.query_count())
            .finish()
    }
}

/// Fill the registry with any of `names` it does not know yet.
///
/// Runs once at startup, before the registry is shared. Names the store
/// does not have either are left for the mapper to report. Hidden rules on a
/// record whose parent is another type are attached to that type when it is
/// already registered.
pub async fn hydrate_registry<'a, I>(
    store: &dyn ResourceTypeStore,
    registry: &mut ResourceTypeRegistry,
    names: I,
    provider: CloudProvider,
) -> RunResult<usize>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut added = 0;
    for name in names {
        if registry.contains(name) {
            continue;
        }
        if let Some(record) = store.find_resource_type(name, provider).await? {
            debug!("Hydrating resource type {} from store", record.resource_type.name);
            let (own, linked): (Vec<_>, Vec<_>) = record
                .hidden_dependencies
                .into_iter()
                .partition(|rule| rule.parent_resource_type == record.resource_type.name);
            registry.register(record.resource_type, own);
            for rule in linked {
                if let Err(e) = registry.add_hidden_rule(rule) {
                    warn!("Skipping hidden dependency from store: {}", e);
                }
            }
            added += 1;
        }
    }
    if added > 0 {
        info!("Hydrated {} resource types for {}", added, provider);
    }
    Ok(added)
}

#[cfg(test)]
mod tests {
    use super::*;
    use stratus_core::{Resource, ResourceCategory};

    #[tokio::test]
    async fn test_architecture_round_trip() {
        let store = InMemoryArchitectureStore::new();
        let arch = Architecture::new(CloudProvider::Aws, "us-east-1").with_resource(Resource::new("b1", "S3"));

        let id = store.save_architecture(&arch).await.unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.load_architecture(id).await.unwrap(), arch);
        assert!(store.get(id).unwrap().saved_at <= Utc::now());
    }

    #[tokio::test]
    async fn test_missing_architecture() {
        let store = InMemoryArchitectureStore::new();
        let id = Uuid::new_v4();
        let err = store.load_architecture(id).await.unwrap_err();
        assert!(matches!(err, PipelineError::ArchitectureNotFound(missing) if missing == id));
    }

    #[tokio::test]
    async fn test_store_failure() {
        let store = InMemoryArchitectureStore::new();
        store.fail_with("disk full");
        let arch = Architecture::new(CloudProvider::Aws, "us-east-1");
        assert!(matches!(store.save_architecture(&arch).await, Err(PipelineError::Store(_))));

        store.clear_failure();
        assert!(store.save_architecture(&arch).await.is_ok());
    }

    #[tokio::test]
    async fn test_hydrate_registry_only_fetches_unknown_types() {
        let store = InMemoryResourceTypeStore::new().with_record(ResourceTypeRecord::new(ResourceType::regional(
            "Kinesis",
            ResourceCategory::Messaging,
            "kinesis_stream",
            CloudProvider::Aws,
        )));
        let mut registry = ResourceTypeRegistry::with_defaults();
        let before = registry.len();

        let added = hydrate_registry(&store, &mut registry, ["VPC", "Kinesis", "Mystery"], CloudProvider::Aws)
            .await
            .unwrap();

        assert_eq!(added, 1);
        assert_eq!(registry.len(), before + 1);
        assert!(registry.contains("Kinesis"));
        assert_eq!(store.query_count(), 2);
    }

    #[tokio::test]
    async fn test_hydrate_links_rules_to_registered_parents() {
        let store = InMemoryResourceTypeStore::new().with_record(
            ResourceTypeRecord::new(ResourceType::regional(
                "LogGroup",
                ResourceCategory::Integration,
                "cloudwatch_log_group",
                CloudProvider::Aws,
            ))
            .with_rule(HiddenDependencyRule::new("aws", "Lambda", "LogGroup"))
            .with_rule(HiddenDependencyRule::new("aws", "Mystery", "LogGroup")),
        );
        let mut registry = ResourceTypeRegistry::with_defaults();
        let lambda_rules = registry.hidden_dependencies("Lambda").len();

        let added = hydrate_registry(&store, &mut registry, ["LogGroup"], CloudProvider::Aws)
            .await
            .unwrap();

        assert_eq!(added, 1);
        assert!(registry.hidden_dependencies("LogGroup").is_empty());
        let rules = registry.hidden_dependencies("Lambda");
        assert_eq!(rules.len(), lambda_rules + 1);
        assert_eq!(rules[lambda_rules].child_resource_type, "LogGroup");
        assert!(registry.hidden_dependencies("Mystery").is_empty());
    }

    #[tokio::test]
    async fn test_hydrate_respects_provider() {
        let store = InMemoryResourceTypeStore::new().with_record(ResourceTypeRecord::new(ResourceType::regional(
            "PubSub",
            ResourceCategory::Messaging,
            "pubsub_topic",
            CloudProvider::Gcp,
        )));
        let mut registry = ResourceTypeRegistry::new();

        let added = hydrate_registry(&store, &mut registry, ["PubSub"], CloudProvider::Aws)
            .await
            .unwrap();
        assert_eq!(added, 0);
        assert!(!registry.contains("PubSub"));
    }
}
