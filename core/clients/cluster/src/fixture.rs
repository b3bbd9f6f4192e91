//! Scriptable cluster clients for unit tests.
use std::sync::Arc;
use std::sync::Mutex;

use anyhow::Result;

use provisioner_context::Context;
use provisioner_models::Cluster;

use crate::ArcedConnectionStatusFactory;
use crate::ClusterConfig;
use crate::ConnectionState;
use crate::ConnectionStatus;
use crate::ConnectionStatusBackend;
use crate::ConnectionStatusClient;
use crate::RuntimeConfigurator;

/// In-memory connection status resource that tests can manipulate.
#[derive(Clone, Default)]
pub struct ConnectionStatusFixture {
    state: Arc<Mutex<StatusState>>,
}

#[derive(Default)]
struct StatusState {
    fetch_error: Option<String>,
    gets: usize,
    init_error: Option<String>,
    inits: usize,
    status: Option<ConnectionState>,
}

impl ConnectionStatusFixture {
    /// Create a fixture with no connection status resource.
    pub fn missing() -> ConnectionStatusFixture {
        ConnectionStatusFixture::default()
    }

    /// Create a fixture with a connection status resource in the given state.
    pub fn with_state<S: Into<ConnectionState>>(state: S) -> ConnectionStatusFixture {
        let fixture = ConnectionStatusFixture::default();
        fixture.set_state(state);
        fixture
    }

    /// Fail all future fetches with the given message.
    pub fn fail_fetch(&self, message: &str) {
        self.access().fetch_error = Some(message.to_string());
    }

    /// Fail all future client initialisations with the given message.
    pub fn fail_init(&self, message: &str) {
        self.access().init_error = Some(message.to_string());
    }

    /// Factory returning clients bound to this fixture.
    pub fn factory(&self) -> ArcedConnectionStatusFactory {
        let fixture = self.clone();
        Arc::new(move |_: &ClusterConfig| -> Result<ConnectionStatusClient> {
            let mut state = fixture.access();
            state.inits += 1;
            if let Some(message) = &state.init_error {
                anyhow::bail!("{}", message);
            }
            drop(state);
            Ok(ConnectionStatusClient::from(fixture.clone()))
        })
    }

    /// Number of times the connection status was fetched.
    pub fn gets(&self) -> usize {
        self.access().gets
    }

    /// Number of clients the factory created (or attempted to).
    pub fn inits(&self) -> usize {
        self.access().inits
    }

    /// Delete the connection status resource.
    pub fn remove(&self) {
        self.access().status = None;
    }

    /// Create or update the connection status resource.
    pub fn set_state<S: Into<ConnectionState>>(&self, state: S) {
        self.access().status = Some(state.into());
    }

    fn access(&self) -> std::sync::MutexGuard<StatusState> {
        self.state
            .lock()
            .expect("ConnectionStatusFixture state lock poisoned")
    }
}

#[async_trait::async_trait]
impl ConnectionStatusBackend for ConnectionStatusFixture {
    async fn get(&self, _: &Context, name: &str) -> Result<Option<ConnectionStatus>> {
        let mut state = self.access();
        state.gets += 1;
        if let Some(message) = &state.fetch_error {
            anyhow::bail!("{}", message);
        }
        let status = state.status.clone().map(|state| ConnectionStatus {
            name: name.to_string(),
            state,
            message: None,
        });
        Ok(status)
    }
}

/// Record runtime configuration requests and optionally fail them.
#[derive(Clone, Default)]
pub struct RuntimeConfiguratorFixture {
    state: Arc<Mutex<ConfiguratorState>>,
}

#[derive(Default)]
struct ConfiguratorState {
    calls: Vec<String>,
    error: Option<String>,
}

impl RuntimeConfiguratorFixture {
    /// Create a configurator that fails every request with the given message.
    pub fn failing(message: &str) -> RuntimeConfiguratorFixture {
        let fixture = RuntimeConfiguratorFixture::default();
        fixture.access().error = Some(message.to_string());
        fixture
    }

    /// IDs of the clusters configuration was requested for, in order.
    pub fn calls(&self) -> Vec<String> {
        self.access().calls.clone()
    }

    fn access(&self) -> std::sync::MutexGuard<ConfiguratorState> {
        self.state
            .lock()
            .expect("RuntimeConfiguratorFixture state lock poisoned")
    }
}

#[async_trait::async_trait]
impl RuntimeConfigurator for RuntimeConfiguratorFixture {
    async fn configure(&self, _: &Context, cluster: &Cluster, _: &str) -> Result<()> {
        let mut state = self.access();
        state.calls.push(cluster.cluster_id.clone());
        if let Some(message) = &state.error {
            anyhow::bail!("{}", message);
        }
        Ok(())
    }
}
