//! Client interface to the runtime directory service.
//!
//! The directory tracks every runtime known to the management plane along with
//! its status condition, which provisioning stages update as clusters progress.
use std::sync::Arc;

use anyhow::Result;

use provisioner_context::Context;
use provisioner_models::RuntimeStatusCondition;

#[cfg(any(test, feature = "test-fixture"))]
mod fixture;
#[cfg(any(test, feature = "test-fixture"))]
pub use self::fixture::DirectorFixture;
#[cfg(any(test, feature = "test-fixture"))]
pub use self::fixture::StatusUpdate;

/// Update runtime records in the directory service.
#[derive(Clone)]
pub struct DirectorClient(Arc<dyn DirectorBackend>);

impl DirectorClient {
    /// Set the status condition of a runtime owned by the given tenant.
    pub async fn set_runtime_status_condition(
        &self,
        context: &Context,
        runtime_id: &str,
        condition: RuntimeStatusCondition,
        tenant: &str,
    ) -> Result<()> {
        self.0
            .set_runtime_status_condition(context, runtime_id, condition, tenant)
            .await
    }
}

impl<T> From<T> for DirectorClient
where
    T: DirectorBackend + 'static,
{
    fn from(value: T) -> Self {
        DirectorClient(Arc::new(value))
    }
}

/// Operations implemented by directory service clients.
#[async_trait::async_trait]
pub trait DirectorBackend: Send + Sync {
    /// Set the status condition of a runtime owned by the given tenant.
    async fn set_runtime_status_condition(
        &self,
        context: &Context,
        runtime_id: &str,
        condition: RuntimeStatusCondition,
        tenant: &str,
    ) -> Result<()>;
}
