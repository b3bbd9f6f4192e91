//! Access the connection status resource maintained by the runtime agent.
use std::fmt::Display;
use std::sync::Arc;

use anyhow::Result;
use serde::Deserialize;
use serde::Serialize;

use provisioner_context::Context;

use crate::ClusterConfig;

/// Connection states reported by the runtime agent.
#[derive(Clone, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ConnectionState {
    /// The agent connected to the management plane.
    Connected,

    /// The agent could not establish a connection to the management plane.
    ConnectionFailed,

    /// The agent lost the ability to maintain an established connection.
    ConnectionMaintenanceFailed,

    /// The agent failed to update the runtime metadata.
    MetadataUpdateFailed,

    /// The agent has not connected yet.
    NotConnected,

    /// The agent failed to synchronise the runtime with the management plane.
    SynchronizationFailed,

    /// The agent is connected and the runtime is in sync with the management plane.
    Synchronized,

    /// A state this version of the provisioner does not know about.
    Unrecognised(String),
}

impl ConnectionState {
    fn as_str(&self) -> &str {
        match self {
            ConnectionState::Connected => "Connected",
            ConnectionState::ConnectionFailed => "ConnectionFailed",
            ConnectionState::ConnectionMaintenanceFailed => "ConnectionMaintenanceFailed",
            ConnectionState::MetadataUpdateFailed => "MetadataUpdateFailed",
            ConnectionState::NotConnected => "NotConnected",
            ConnectionState::SynchronizationFailed => "SynchronizationFailed",
            ConnectionState::Synchronized => "Synchronized",
            ConnectionState::Unrecognised(state) => state,
        }
    }
}

impl Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<String> for ConnectionState {
    fn from(value: String) -> Self {
        match value.as_str() {
            "Connected" => ConnectionState::Connected,
            "ConnectionFailed" => ConnectionState::ConnectionFailed,
            "ConnectionMaintenanceFailed" => ConnectionState::ConnectionMaintenanceFailed,
            "MetadataUpdateFailed" => ConnectionState::MetadataUpdateFailed,
            "NotConnected" => ConnectionState::NotConnected,
            "SynchronizationFailed" => ConnectionState::SynchronizationFailed,
            "Synchronized" => ConnectionState::Synchronized,
            _ => ConnectionState::Unrecognised(value),
        }
    }
}

impl From<&str> for ConnectionState {
    fn from(value: &str) -> Self {
        ConnectionState::from(value.to_string())
    }
}

impl From<ConnectionState> for String {
    fn from(value: ConnectionState) -> Self {
        match value {
            ConnectionState::Unrecognised(state) => state,
            state => state.as_str().to_string(),
        }
    }
}

/// Connection status resource as observed on the cluster.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct ConnectionStatus {
    /// Name of the connection status resource.
    pub name: String,

    /// Current state of the connection.
    pub state: ConnectionState,

    /// Optional details attached by the agent to the current state.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Read connection status resources from a single cluster.
#[derive(Clone)]
pub struct ConnectionStatusClient(Arc<dyn ConnectionStatusBackend>);

impl ConnectionStatusClient {
    /// Fetch the connection status resource with the given name.
    ///
    /// Resources that do not exist are reported as `None` rather then errors.
    pub async fn get(&self, context: &Context, name: &str) -> Result<Option<ConnectionStatus>> {
        self.0.get(context, name).await
    }
}

impl<T> From<T> for ConnectionStatusClient
where
    T: ConnectionStatusBackend + 'static,
{
    fn from(value: T) -> Self {
        ConnectionStatusClient(Arc::new(value))
    }
}

/// Operations implemented by connection status clients.
#[async_trait::async_trait]
pub trait ConnectionStatusBackend: Send + Sync {
    /// Fetch the connection status resource with the given name.
    async fn get(&self, context: &Context, name: &str) -> Result<Option<ConnectionStatus>>;
}

/// Initialise [`ConnectionStatusClient`]s for a specific cluster.
#[async_trait::async_trait]
pub trait ConnectionStatusFactory: Send + Sync {
    /// Build a client to the cluster described by the given configuration.
    async fn init(&self, context: &Context, config: &ClusterConfig)
        -> Result<ConnectionStatusClient>;
}

#[async_trait::async_trait]
impl<F> ConnectionStatusFactory for F
where
    F: Fn(&ClusterConfig) -> Result<ConnectionStatusClient> + Send + Sync,
{
    async fn init(
        &self,
        _: &Context,
        config: &ClusterConfig,
    ) -> Result<ConnectionStatusClient> {
        self(config)
    }
}

/// Alias for a shared [`ConnectionStatusFactory`] trait object.
pub type ArcedConnectionStatusFactory = Arc<dyn ConnectionStatusFactory>;
