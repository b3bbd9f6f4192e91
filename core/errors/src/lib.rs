//! Common errors from and for the Provisioner implementation

/// The cluster has no connection credentials to reach it with.
#[derive(Debug, thiserror::Error)]
#[error("the cluster '{cluster_id}' has no connection credentials")]
pub struct ClusterCredentialsMissing {
    pub cluster_id: String,
}

impl ClusterCredentialsMissing {
    /// The cluster has no connection credentials to reach it with.
    pub fn new<S: Into<String>>(cluster_id: S) -> Self {
        Self {
            cluster_id: cluster_id.into(),
        }
    }
}

/// The expected cluster record was not found.
#[derive(Debug, thiserror::Error)]
#[error("the expected cluster '{cluster_id}' was not found")]
pub struct ClusterNotFound {
    pub cluster_id: String,
}

impl ClusterNotFound {
    /// The expected cluster record was not found.
    pub fn new<S: Into<String>>(cluster_id: S) -> Self {
        Self {
            cluster_id: cluster_id.into(),
        }
    }
}

/// The expected operation record was not found.
#[derive(Debug, thiserror::Error)]
#[error("the expected operation '{operation_id}' was not found")]
pub struct OperationNotFound {
    pub operation_id: String,
}

impl OperationNotFound {
    /// The expected operation record was not found.
    pub fn new<S: Into<String>>(operation_id: S) -> Self {
        Self {
            operation_id: operation_id.into(),
        }
    }
}

/// Check if an error, or any of its causes, is of the given type.
pub fn is_caused_by<E>(error: &anyhow::Error) -> bool
where
    E: std::error::Error + Send + Sync + 'static,
{
    error.is::<E>() || error.chain().any(|cause| cause.is::<E>())
}
