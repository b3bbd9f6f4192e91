//! Inefficient in-memory implementation of [`Store`](super::Store) for unit tests.
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;

use anyhow::Result;
use uuid::Uuid;

use provisioner_context::Context;
use provisioner_models::Cluster;
use provisioner_models::Operation;

use super::PersistOps;
use super::PersistResponses;
use super::QueryOps;
use super::QueryResponses;
use super::StoreBackend;

/// In-memory implementation of a mock [`Store`](super::Store) for unit tests.
///
/// Clones share the same in-memory state so tests can inspect records
/// persisted through a [`Store`](super::Store) created from the fixture.
#[derive(Clone)]
pub struct StoreFixture {
    /// Shared in-memory state to mock the DB with.
    inner: Arc<Mutex<StoreFixtureState>>,
}

impl StoreFixture {
    /// Number of times operation records were persisted.
    pub fn operation_writes(&self) -> usize {
        self.access().operation_writes
    }

    /// Lock and access the shared inner store.
    fn access(&self) -> MutexGuard<StoreFixtureState> {
        self.inner
            .lock()
            .expect("StoreFixture::inner state lock poisoned")
    }
}

impl Default for StoreFixture {
    fn default() -> Self {
        let inner = StoreFixtureState::default();
        let inner = Mutex::new(inner);
        let inner = Arc::new(inner);
        StoreFixture { inner }
    }
}

#[async_trait::async_trait]
impl StoreBackend for StoreFixture {
    async fn query(&self, _: &Context, op: QueryOps) -> Result<QueryResponses> {
        let store = self.access();
        match op {
            QueryOps::Cluster(lookup) => {
                let cluster = store.clusters.get(&lookup.0).cloned();
                Ok(QueryResponses::Cluster(cluster))
            }
            QueryOps::ListOperationsInProgress => {
                let mut operations: Vec<Operation> = store
                    .operations
                    .values()
                    .filter(|operation| !operation.state.is_final())
                    .cloned()
                    .collect();
                operations.sort_by_key(|operation| operation.started);
                Ok(QueryResponses::Operations(operations))
            }
            QueryOps::Operation(lookup) => {
                let operation = store.operations.get(&lookup.0).cloned();
                Ok(QueryResponses::Operation(operation))
            }
        }
    }

    async fn persist(&self, _: &Context, op: PersistOps) -> Result<PersistResponses> {
        let mut store = self.access();
        match op {
            PersistOps::Cluster(cluster) => {
                store.clusters.insert(cluster.cluster_id.clone(), cluster);
            }
            PersistOps::Operation(operation) => {
                store.operation_writes += 1;
                store.operations.insert(operation.operation_id, operation);
            }
        };
        Ok(PersistResponses::Success)
    }
}

/// Container for the shared state.
#[derive(Default)]
struct StoreFixtureState {
    clusters: HashMap<String, Cluster>,
    operation_writes: usize,
    operations: HashMap<Uuid, Operation>,
}
