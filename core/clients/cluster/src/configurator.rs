//! Apply runtime configuration to clusters whose agent failed to connect.
use std::sync::Arc;

use anyhow::Result;

use provisioner_context::Context;
use provisioner_models::Cluster;

/// Re-apply the runtime agent configuration onto a cluster.
#[async_trait::async_trait]
pub trait RuntimeConfigurator: Send + Sync {
    /// (Re)configure the runtime agent on the given cluster.
    async fn configure(&self, context: &Context, cluster: &Cluster, kubeconfig: &str)
        -> Result<()>;
}

/// Alias for a shared [`RuntimeConfigurator`] trait object.
pub type ArcedRuntimeConfigurator = Arc<dyn RuntimeConfigurator>;
