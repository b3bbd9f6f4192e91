use std::sync::Arc;
use std::time::Duration;

use time::OffsetDateTime;

use provisioner_clients_cluster::errors::CredentialsInvalid;
use provisioner_clients_cluster::ConnectionState;
use provisioner_clients_cluster::ConnectionStatusFixture;
use provisioner_clients_cluster::RuntimeConfiguratorFixture;
use provisioner_clients_director::DirectorClient;
use provisioner_clients_director::DirectorFixture;
use provisioner_conf::WaitForAgentConf;
use provisioner_context::Context;
use provisioner_errors::ClusterCredentialsMissing;
use provisioner_models::constants::STAGE_FINISHED;
use provisioner_models::constants::STAGE_WAIT_FOR_AGENT_TO_CONNECT;
use provisioner_models::Cluster;
use provisioner_models::Operation;
use provisioner_models::OperationKind;
use provisioner_models::OperationStage;
use provisioner_models::RuntimeStatusCondition;
use provisioner_models::StageResult;
use provisioner_stage::Stage;

use crate::errors::ConnectionClientInit;
use crate::errors::ConnectionStateUnrecognised;
use crate::errors::ConnectionStatusFetch;
use crate::errors::RuntimeReconfigureFailed;
use crate::WaitForAgentToConnect;

const KUBECONFIG: &str = r#"
current-context: shoot
clusters:
  - name: shoot
    cluster:
      server: https://api.shoot.example.com
contexts:
  - name: shoot
    context:
      cluster: shoot
      user: admin
users:
  - name: admin
    user:
      token: secret
"#;

struct Fixtures {
    configurator: RuntimeConfiguratorFixture,
    director: DirectorFixture,
    status: ConnectionStatusFixture,
}

impl Fixtures {
    fn new(status: ConnectionStatusFixture) -> Fixtures {
        Fixtures {
            configurator: RuntimeConfiguratorFixture::default(),
            director: DirectorFixture::default(),
            status,
        }
    }

    fn configurator(mut self, configurator: RuntimeConfiguratorFixture) -> Self {
        self.configurator = configurator;
        self
    }

    fn director(mut self, director: DirectorFixture) -> Self {
        self.director = director;
        self
    }

    fn stage(&self) -> WaitForAgentToConnect {
        WaitForAgentToConnect::new(
            &WaitForAgentConf::default(),
            STAGE_FINISHED,
            self.status.factory(),
            Arc::new(self.configurator.clone()),
            DirectorClient::from(self.director.clone()),
        )
    }
}

fn cluster() -> Cluster {
    Cluster {
        cluster_id: "cluster-1".into(),
        tenant: "tenant-1".into(),
        kubeconfig: Some(KUBECONFIG.into()),
    }
}

fn operation() -> Operation {
    Operation::start(
        "cluster-1",
        OperationKind::Provision,
        STAGE_WAIT_FOR_AGENT_TO_CONNECT,
        OffsetDateTime::now_utc(),
    )
}

fn wait(delay: u64) -> StageResult {
    StageResult::wait(STAGE_WAIT_FOR_AGENT_TO_CONNECT, Duration::from_secs(delay))
}

async fn run(fixtures: &Fixtures, cluster: &Cluster) -> anyhow::Result<StageResult> {
    let context = Context::fixture();
    fixtures.stage().run(&context, cluster, &operation()).await
}

#[test]
fn stage_metadata() {
    let fixtures = Fixtures::new(ConnectionStatusFixture::missing());
    let stage = fixtures.stage();
    assert_eq!(stage.name(), OperationStage::from(STAGE_WAIT_FOR_AGENT_TO_CONNECT));
    assert_eq!(stage.time_budget(), Duration::from_secs(15 * 60));
}

#[tokio::test]
async fn credentials_missing() {
    let fixtures = Fixtures::new(ConnectionStatusFixture::missing());
    let mut cluster = cluster();
    cluster.kubeconfig = None;
    let error = run(&fixtures, &cluster).await.unwrap_err();
    assert!(error.is::<ClusterCredentialsMissing>());
    assert_eq!(fixtures.status.inits(), 0);
}

#[tokio::test]
async fn credentials_invalid() {
    let fixtures = Fixtures::new(ConnectionStatusFixture::missing());
    let mut cluster = cluster();
    cluster.kubeconfig = Some("clusters: [".into());
    let error = run(&fixtures, &cluster).await.unwrap_err();
    assert!(error.is::<CredentialsInvalid>());
    assert_eq!(fixtures.status.inits(), 0);
}

#[tokio::test]
async fn client_init_fails() {
    let status = ConnectionStatusFixture::missing();
    status.fail_init("no route to cluster");
    let fixtures = Fixtures::new(status);
    let error = run(&fixtures, &cluster()).await.unwrap_err();
    assert!(error.is::<ConnectionClientInit>());
    assert_eq!(error.root_cause().to_string(), "no route to cluster");
}

#[tokio::test]
async fn status_fetch_fails() {
    let status = ConnectionStatusFixture::with_state(ConnectionState::Synchronized);
    status.fail_fetch("forbidden");
    let fixtures = Fixtures::new(status);
    let error = run(&fixtures, &cluster()).await.unwrap_err();
    assert!(error.is::<ConnectionStatusFetch>());
    assert!(fixtures.director.requests().is_empty());
}

#[tokio::test]
async fn status_not_found_waits() {
    let fixtures = Fixtures::new(ConnectionStatusFixture::missing());
    let result = run(&fixtures, &cluster()).await.unwrap();
    assert_eq!(result, wait(5));
    assert_eq!(fixtures.status.gets(), 1);
}

#[tokio::test]
async fn pending_states_wait() {
    let states = [
        ConnectionState::NotConnected,
        ConnectionState::Connected,
        ConnectionState::ConnectionMaintenanceFailed,
    ];
    for state in states {
        let fixtures = Fixtures::new(ConnectionStatusFixture::with_state(state.clone()));
        let result = run(&fixtures, &cluster()).await.unwrap();
        assert_eq!(result, wait(2), "unexpected result for state {}", state);
        assert!(!result.is_immediate());
        assert!(fixtures.director.requests().is_empty());
        assert!(fixtures.configurator.calls().is_empty());
    }
}

#[tokio::test]
async fn unrecognised_state_fails() {
    let fixtures = Fixtures::new(ConnectionStatusFixture::with_state("Hibernated"));
    let error = run(&fixtures, &cluster()).await.unwrap_err();
    let error = error.downcast::<ConnectionStateUnrecognised>().unwrap();
    assert_eq!(error.state, "Hibernated");
}

#[tokio::test]
async fn connection_failed_reconfigures() {
    let fixtures = Fixtures::new(ConnectionStatusFixture::with_state(
        ConnectionState::ConnectionFailed,
    ));
    let result = run(&fixtures, &cluster()).await.unwrap();
    assert_eq!(result, wait(120));
    assert_eq!(fixtures.configurator.calls(), vec!["cluster-1".to_string()]);
    assert!(fixtures.director.requests().is_empty());
}

#[tokio::test]
async fn connection_failed_reconfigure_error() {
    let fixtures = Fixtures::new(ConnectionStatusFixture::with_state(
        ConnectionState::ConnectionFailed,
    ))
    .configurator(RuntimeConfiguratorFixture::failing("apply rejected"));
    let error = run(&fixtures, &cluster()).await.unwrap_err();
    assert!(error.is::<RuntimeReconfigureFailed>());
    assert_eq!(fixtures.configurator.calls().len(), 1);
}

#[tokio::test]
async fn synchronized_reports_and_advances() {
    let fixtures = Fixtures::new(ConnectionStatusFixture::with_state(
        ConnectionState::Synchronized,
    ));
    let result = run(&fixtures, &cluster()).await.unwrap();
    assert_eq!(result, StageResult::advance(STAGE_FINISHED));
    assert!(result.is_immediate());

    let requests = fixtures.director.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].condition, RuntimeStatusCondition::Connected);
    assert_eq!(requests[0].runtime_id, "cluster-1");
    assert_eq!(requests[0].tenant, "tenant-1");
}

#[tokio::test]
async fn connected_with_warning_advances() {
    let states = [
        ConnectionState::SynchronizationFailed,
        ConnectionState::MetadataUpdateFailed,
    ];
    for state in states {
        let fixtures = Fixtures::new(ConnectionStatusFixture::with_state(state));
        let result = run(&fixtures, &cluster()).await.unwrap();
        assert_eq!(result, StageResult::advance(STAGE_FINISHED));
        assert_eq!(fixtures.director.requests().len(), 1);
    }
}

#[tokio::test(start_paused = true)]
async fn report_recovers_within_retries() {
    let fixtures = Fixtures::new(ConnectionStatusFixture::with_state(
        ConnectionState::Synchronized,
    ))
    .director(DirectorFixture::failing(2));
    let start = tokio::time::Instant::now();
    let result = run(&fixtures, &cluster()).await.unwrap();
    assert_eq!(result, StageResult::advance(STAGE_FINISHED));
    assert_eq!(fixtures.director.requests().len(), 3);
    assert_eq!(start.elapsed(), Duration::from_secs(10));
}

#[tokio::test(start_paused = true)]
async fn report_exhausted_waits() {
    let fixtures = Fixtures::new(ConnectionStatusFixture::with_state(
        ConnectionState::SynchronizationFailed,
    ))
    .director(DirectorFixture::unavailable());
    let result = run(&fixtures, &cluster()).await.unwrap();
    assert_eq!(result, wait(2));
    assert_eq!(fixtures.director.requests().len(), 3);
}

#[tokio::test]
async fn repeated_runs_are_stable() {
    let fixtures = Fixtures::new(ConnectionStatusFixture::missing());
    let first = run(&fixtures, &cluster()).await.unwrap();
    let second = run(&fixtures, &cluster()).await.unwrap();
    assert_eq!(first, second);

    fixtures.status.set_state(ConnectionState::NotConnected);
    let first = run(&fixtures, &cluster()).await.unwrap();
    let second = run(&fixtures, &cluster()).await.unwrap();
    assert_eq!(first, second);
    assert!(fixtures.director.requests().is_empty());
    assert!(fixtures.configurator.calls().is_empty());
}

#[tokio::test]
async fn status_removed_after_creation_waits() {
    let fixtures = Fixtures::new(ConnectionStatusFixture::missing());
    assert_eq!(run(&fixtures, &cluster()).await.unwrap(), wait(5));

    fixtures.status.set_state(ConnectionState::NotConnected);
    assert_eq!(run(&fixtures, &cluster()).await.unwrap(), wait(2));

    fixtures.status.remove();
    assert_eq!(run(&fixtures, &cluster()).await.unwrap(), wait(5));
    assert_eq!(fixtures.status.gets(), 3);
    assert!(fixtures.director.requests().is_empty());
    assert!(fixtures.configurator.calls().is_empty());
}

#[tokio::test]
async fn custom_connection_name() {
    let fixtures = Fixtures::new(ConnectionStatusFixture::missing());
    let stage = fixtures.stage().connection_name("custom-connection");
    let context = Context::fixture();
    let result = stage.run(&context, &cluster(), &operation()).await.unwrap();
    assert_eq!(result, wait(5));
}
