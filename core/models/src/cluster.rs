//! Models describing provisioned clusters.
use serde::Deserialize;
use serde::Serialize;

/// A provisioned target cluster.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Cluster {
    /// Unique ID of the cluster, also used as the runtime ID by the directory service.
    pub cluster_id: String,

    /// Tenant the cluster belongs to.
    pub tenant: String,

    /// Raw connection credentials (kubeconfig document) to reach the cluster with.
    ///
    /// Credentials are only available once the cluster has been created.
    #[serde(default)]
    pub kubeconfig: Option<String>,
}

/// Status conditions a runtime can be marked with in the directory service.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RuntimeStatusCondition {
    /// The runtime agent has established a connection to the control service.
    Connected,

    /// Provisioning of the runtime failed.
    Failed,

    /// The runtime is registered but provisioning has not started.
    Initial,

    /// The runtime is being provisioned.
    Provisioning,
}

impl std::fmt::Display for RuntimeStatusCondition {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::Connected => write!(f, "CONNECTED"),
            Self::Failed => write!(f, "FAILED"),
            Self::Initial => write!(f, "INITIAL"),
            Self::Provisioning => write!(f, "PROVISIONING"),
        }
    }
}
