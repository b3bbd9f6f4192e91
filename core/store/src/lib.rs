//! Persistent storage interface for clusters and provisioning operations.
//!
//! ## An ergonomic interface
//!
//! The [`Store`] interface focuses on a small set of high level methods
//! that accept different operations and return different data.
//! This is implemented with a combination of an internal (sealed) `trait` and enums.
//!
//! ```ignore
//! use provisioner_store::query::LookupOperation;
//!
//! // Persist an operation record.
//! store.persist(context, operation).await?;
//!
//! // Lookup an operation by ID.
//! let operation = store.query(context, LookupOperation(operation_id)).await?;
//! ```
//!
//! ### Backend implementations
//!
//! Backend implementations receive a wrapping `enum` type for the operation group to implement.
//! Backends must ensure the returned type matches what the requested operation expects
//! or the [`Store`] interface will panic while converting types.
use std::sync::Arc;

use anyhow::Result;

use provisioner_context::Context;

pub mod persist;
pub mod query;

#[cfg(any(test, feature = "test-fixture"))]
mod fixture;
#[cfg(any(test, feature = "test-fixture"))]
pub use self::fixture::StoreFixture;


use self::persist::PersistOp;
use self::persist::PersistOps;
use self::persist::PersistResponses;
use self::query::QueryOp;
use self::query::QueryOps;
use self::query::QueryResponses;

/// Query and persist cluster and operation state with a database.
#[derive(Clone)]
pub struct Store {
    /// Runtime configured implementation of the persistent store.
    inner: Arc<dyn StoreBackend>,
}

impl Store {
    /// Query records from the persistent store.
    pub async fn query<O>(&self, context: &Context, op: O) -> Result<O::Response>
    where
        O: QueryOp,
    {
        let op: QueryOps = op.into();
        let response = self.inner.query(context, op).await;
        response.map(O::Response::from)
    }

    /// Persist records to the persistent store.
    pub async fn persist<O>(&self, context: &Context, op: O) -> Result<O::Response>
    where
        O: PersistOp,
    {
        let op: PersistOps = op.into();
        let response = self.inner.persist(context, op).await;
        response.map(O::Response::from)
    }
}

impl<T> From<T> for Store
where
    T: StoreBackend + 'static,
{
    fn from(value: T) -> Self {
        Store {
            inner: Arc::new(value),
        }
    }
}

#[cfg(any(test, feature = "test-fixture"))]
impl Store {
    /// Initialise a new store backend fixture for unit tests.
    pub fn fixture() -> Self {
        let inner = StoreFixture::default();
        Self::from(inner)
    }
}

/// Operations implemented by persistent stores supported by the provisioner.
#[async_trait::async_trait]
pub trait StoreBackend: Send + Sync {
    /// Query records from the persistent store.
    async fn query(&self, context: &Context, op: QueryOps) -> Result<QueryResponses>;

    /// Persist records to the persistent store.
    async fn persist(&self, context: &Context, op: PersistOps) -> Result<PersistResponses>;
}
