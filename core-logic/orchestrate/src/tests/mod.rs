use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use anyhow::Result;

use provisioner_context::Context;
use provisioner_models::Cluster;
use provisioner_stage::ScriptedStage;
use provisioner_stage::StageRegistry;
use provisioner_store::persist::PersistOps;
use provisioner_store::persist::PersistResponses;
use provisioner_store::query::QueryOps;
use provisioner_store::query::QueryResponses;
use provisioner_store::Store;
use provisioner_store::StoreBackend;
use provisioner_store::StoreFixture;

use crate::Orchestrator;

mod orchestrator;

const CLUSTER_ID: &str = "cluster-1";
const STAGE_ONE: &str = "StageOne";
const STAGE_TWO: &str = "StageTwo";

/// Set of fixtures to use in tests.
struct Fixtures {
    context: Context,
    orchestrator: Orchestrator,
    registry: StageRegistry,
    store: Store,
    store_fixture: StoreFixture,
}

impl Fixtures {
    /// Initialise fixtures with the given stages and a known cluster.
    async fn with_stages<I>(stages: I) -> Fixtures
    where
        I: IntoIterator<Item = ScriptedStage>,
    {
        let mut registry = StageRegistry::build();
        for stage in stages {
            registry.register(stage);
        }
        let registry = registry.finish();

        let store_fixture = StoreFixture::default();
        let store = Store::from(store_fixture.clone());
        let context = Context::fixture();
        let cluster = Cluster {
            cluster_id: CLUSTER_ID.into(),
            tenant: "tenant-1".into(),
            kubeconfig: None,
        };
        store.persist(&context, cluster).await.unwrap();

        Fixtures {
            context,
            orchestrator: Orchestrator::new(registry.clone(), store.clone()),
            registry,
            store,
            store_fixture,
        }
    }
}

/// Store that fails one operation write and delegates everything else to a [`StoreFixture`].
#[derive(Clone)]
struct FlakyStore {
    fail_write: usize,
    inner: StoreFixture,
    writes: Arc<AtomicUsize>,
}

impl FlakyStore {
    /// Fail the `fail_write`-th (1-based) operation write made through this store.
    fn new(inner: StoreFixture, fail_write: usize) -> FlakyStore {
        FlakyStore {
            fail_write,
            inner,
            writes: Default::default(),
        }
    }
}

#[async_trait::async_trait]
impl StoreBackend for FlakyStore {
    async fn query(&self, context: &Context, op: QueryOps) -> Result<QueryResponses> {
        self.inner.query(context, op).await
    }

    async fn persist(&self, context: &Context, op: PersistOps) -> Result<PersistResponses> {
        if let PersistOps::Operation(_) = &op {
            let write = self.writes.fetch_add(1, Ordering::SeqCst) + 1;
            if write == self.fail_write {
                anyhow::bail!("store connection reset");
            }
        }
        self.inner.persist(context, op).await
    }
}
