//! Constraint sources.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::constraint::{Constraint, ConstraintSet};
use crate::error::{PolicyError, PolicyResult};

/// Where constraints come from at request time.
#[async_trait]
pub trait ConstraintStore: Send + Sync {
    /// All constraints attached to a resource type, in storage order.
    async fn find_constraints_by_resource_type(&self, resource_type: &str) -> PolicyResult<Vec<Constraint>>;
}

/// A loaded constraint set can serve as its own store.
#[async_trait]
impl ConstraintStore for ConstraintSet {
    async fn find_constraints_by_resource_type(&self, resource_type: &str) -> PolicyResult<Vec<Constraint>> {
        Ok(self.for_type(resource_type).cloned().collect())
    }
}

/// In-memory constraint store for tests and embedding.
///
/// Can be told to fail so callers can exercise store outages.
#[derive(Clone, Default)]
pub struct InMemoryConstraintStore {
    constraints: Arc<RwLock<Vec<Constraint>>>,
    failure: Arc<RwLock<Option<String>>>,
    queries: Arc<AtomicUsize>,
}

impl InMemoryConstraintStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-filled with a constraint set.
    pub fn with_constraints(set: ConstraintSet) -> Self {
        let store = Self::new();
        store.constraints.write().extend(set.constraints);
        store
    }

    pub fn add(&self, constraint: Constraint) {
        self.constraints.write().push(constraint);
    }

    /// Make every subsequent query fail with the given message.
    pub fn fail_with(&self, message: impl Into<String>) {
        *self.failure.write() = Some(message.into());
    }

    pub fn clear_failure(&self) {
        *self.failure.write() = None;
    }

    /// Number of queries served or refused so far.
    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ConstraintStore for InMemoryConstraintStore {
    async fn find_constraints_by_resource_type(&self, resource_type: &str) -> PolicyResult<Vec<Constraint>> {
        self.queries.fetch_add(1, Ordering::SeqCst);

        if let Some(message) = self.failure.read().clone() {
            return Err(PolicyError::Store(message));
        }

        Ok(self
            .constraints
            .read()
            .iter()
            .filter(|c| c.resource_type == resource_type)
            .cloned()
            .collect())
    }
}

impl std::fmt::Debug for InMemoryConstraintStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryConstraintStore")
            .field("constraints", &self.constraints.read().len())
            .field("failing", &self.failure.read().is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraint::ConstraintType;

    #[tokio::test]
    async fn test_fetch_queries_each_type_once() {
        let store = InMemoryConstraintStore::with_constraints(ConstraintSet::aws_defaults());

        let set = ConstraintSet::fetch(&store, ["Subnet", "VPC", "Subnet"]).await.unwrap();

        assert_eq!(store.query_count(), 2);
        assert_eq!(set.constraints[0].resource_type, "Subnet");
        assert!(set.constraints.iter().all(|c| c.resource_type == "Subnet" || c.resource_type == "VPC"));
    }

    #[tokio::test]
    async fn test_store_failure_propagates() {
        let store = InMemoryConstraintStore::new();
        store.add(Constraint::new("VPC", ConstraintType::RequiresRegion, "true"));
        store.fail_with("connection refused");

        let err = ConstraintSet::fetch(&store, ["VPC", "Subnet"]).await.unwrap_err();
        assert!(matches!(err, PolicyError::Store(ref m) if m == "connection refused"));
        assert_eq!(store.query_count(), 1);

        store.clear_failure();
        assert_eq!(ConstraintSet::fetch(&store, ["VPC"]).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_constraint_set_as_store() {
        let set = ConstraintSet::aws_defaults();
        let found = set.find_constraints_by_resource_type("Subnet").await.unwrap();
        assert_eq!(found.len(), 1);
    }
}
