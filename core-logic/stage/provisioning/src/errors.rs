//! Errors reported by provisioning stages.

/// Unable to create a client for the cluster connection status resource.
#[derive(Debug, thiserror::Error)]
#[error("unable to create connection status client for cluster '{cluster_id}'")]
pub struct ConnectionClientInit {
    pub cluster_id: String,
}

/// Unable to fetch the connection status resource from the cluster.
#[derive(Debug, thiserror::Error)]
#[error("unable to fetch connection status '{name}' from cluster '{cluster_id}'")]
pub struct ConnectionStatusFetch {
    pub cluster_id: String,
    pub name: String,
}

/// The runtime agent reported a connection state that is not recognised.
#[derive(Debug, thiserror::Error)]
#[error("cluster '{cluster_id}' reported unrecognised connection state '{state}'")]
pub struct ConnectionStateUnrecognised {
    pub cluster_id: String,
    pub state: String,
}

/// Unable to re-apply the runtime configuration after the agent failed to connect.
#[derive(Debug, thiserror::Error)]
#[error("unable to reconfigure runtime on cluster '{cluster_id}'")]
pub struct RuntimeReconfigureFailed {
    pub cluster_id: String,
}
