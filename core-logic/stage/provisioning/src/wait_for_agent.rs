//! Wait for the runtime agent on the cluster to connect to the management plane.
use std::time::Duration;

use anyhow::Context as AnyContext;
use anyhow::Result;
use slog::debug;
use slog::error;
use slog::info;
use slog::warn;

use replisdk::utils::error::slog::ErrorAttributes;

use provisioner_clients_cluster::ArcedConnectionStatusFactory;
use provisioner_clients_cluster::ArcedRuntimeConfigurator;
use provisioner_clients_cluster::ClusterConfig;
use provisioner_clients_cluster::ConnectionState;
use provisioner_clients_cluster::DEFAULT_CONNECTION_NAME;
use provisioner_clients_director::DirectorClient;
use provisioner_conf::WaitForAgentConf;
use provisioner_context::Context;
use provisioner_errors::ClusterCredentialsMissing;
use provisioner_models::constants::STAGE_WAIT_FOR_AGENT_TO_CONNECT;
use provisioner_models::Cluster;
use provisioner_models::Operation;
use provisioner_models::OperationStage;
use provisioner_models::RuntimeStatusCondition;
use provisioner_models::StageResult;
use provisioner_retry::RetryPolicy;
use provisioner_stage::Stage;

use crate::errors::ConnectionClientInit;
use crate::errors::ConnectionStateUnrecognised;
use crate::errors::ConnectionStatusFetch;
use crate::errors::RuntimeReconfigureFailed;

/// Wait for the runtime agent on the cluster to connect to the management plane.
///
/// The agent is deployed as part of the cluster but connects on its own schedule.
/// The stage polls the connection status resource the agent maintains on the cluster:
///
/// - While the resource is missing or the connection is in progress the stage waits.
/// - When the agent reports a connection failure the runtime configuration is re-applied
///   and the stage waits longer, to give the agent time to pick up the new configuration.
/// - Once the agent is connected (even if follow up synchronisation failed) the runtime
///   is marked as connected in the directory service and the operation advances.
///
/// Failing to mark the runtime as connected is not fatal: the connection is established
/// so the stage waits and reports again on the next invocation.
/// This repeats until the stage time budget runs out.
pub struct WaitForAgentToConnect {
    configurator: ArcedRuntimeConfigurator,
    connection_name: String,
    director: DirectorClient,
    factory: ArcedConnectionStatusFactory,
    next_stage: OperationStage,
    not_found_delay: Duration,
    pending_delay: Duration,
    reconfigure_delay: Duration,
    report_retry: RetryPolicy,
    time_budget: Duration,
}

impl WaitForAgentToConnect {
    /// Create the stage with the given configuration and external capabilities.
    pub fn new<S>(
        conf: &WaitForAgentConf,
        next_stage: S,
        factory: ArcedConnectionStatusFactory,
        configurator: ArcedRuntimeConfigurator,
        director: DirectorClient,
    ) -> WaitForAgentToConnect
    where
        S: Into<OperationStage>,
    {
        WaitForAgentToConnect {
            configurator,
            connection_name: DEFAULT_CONNECTION_NAME.to_string(),
            director,
            factory,
            next_stage: next_stage.into(),
            not_found_delay: conf.not_found_delay(),
            pending_delay: conf.pending_delay(),
            reconfigure_delay: conf.reconfigure_delay(),
            report_retry: RetryPolicy::from(&conf.report_retry),
            time_budget: conf.time_budget(),
        }
    }

    /// Look for a connection status resource with a different name.
    pub fn connection_name<S: Into<String>>(mut self, name: S) -> Self {
        self.connection_name = name.into();
        self
    }

    /// Re-apply the runtime configuration after the agent failed to connect.
    async fn reconfigure(
        &self,
        context: &Context,
        cluster: &Cluster,
        kubeconfig: &str,
    ) -> Result<StageResult> {
        warn!(
            context.logger,
            "Runtime agent failed to connect, re-applying runtime configuration"
        );
        self.configurator
            .configure(context, cluster, kubeconfig)
            .await
            .with_context(|| RuntimeReconfigureFailed {
                cluster_id: cluster.cluster_id.clone(),
            })?;
        Ok(StageResult::wait(self.name(), self.reconfigure_delay))
    }

    /// Mark the runtime as connected in the directory service and advance the operation.
    async fn report_connected(&self, context: &Context, cluster: &Cluster) -> StageResult {
        let report = move || {
            self.director.set_runtime_status_condition(
                context,
                &cluster.cluster_id,
                RuntimeStatusCondition::Connected,
                &cluster.tenant,
            )
        };
        match self.report_retry.retry(context, report).await {
            Ok(()) => {
                info!(
                    context.logger, "Runtime agent connected";
                    "next_stage" => %self.next_stage,
                );
                StageResult::advance(self.next_stage.clone())
            }
            Err(error) => {
                error!(
                    context.logger,
                    "Unable to mark runtime as connected in the directory service";
                    ErrorAttributes::from(&error),
                );
                StageResult::wait(self.name(), self.pending_delay)
            }
        }
    }
}

impl std::fmt::Debug for WaitForAgentToConnect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WaitForAgentToConnect")
            .field("connection_name", &self.connection_name)
            .field("next_stage", &self.next_stage)
            .field("report_retry", &self.report_retry)
            .field("time_budget", &self.time_budget)
            .finish_non_exhaustive()
    }
}

#[async_trait::async_trait]
impl Stage for WaitForAgentToConnect {
    fn name(&self) -> OperationStage {
        OperationStage::from(STAGE_WAIT_FOR_AGENT_TO_CONNECT)
    }

    fn time_budget(&self) -> Duration {
        self.time_budget
    }

    async fn run(
        &self,
        context: &Context,
        cluster: &Cluster,
        _: &Operation,
    ) -> Result<StageResult> {
        let kubeconfig = match &cluster.kubeconfig {
            Some(kubeconfig) => kubeconfig,
            None => anyhow::bail!(ClusterCredentialsMissing::new(&cluster.cluster_id)),
        };
        let config = ClusterConfig::parse(kubeconfig)?;
        let client = self
            .factory
            .init(context, &config)
            .await
            .with_context(|| ConnectionClientInit {
                cluster_id: cluster.cluster_id.clone(),
            })?;

        let status = client
            .get(context, &self.connection_name)
            .await
            .with_context(|| ConnectionStatusFetch {
                cluster_id: cluster.cluster_id.clone(),
                name: self.connection_name.clone(),
            })?;
        let status = match status {
            Some(status) => status,
            None => {
                info!(
                    context.logger,
                    "Connection status not found, runtime agent not yet provisioned";
                    "connection_name" => &self.connection_name,
                );
                return Ok(StageResult::wait(self.name(), self.not_found_delay));
            }
        };

        match status.state {
            ConnectionState::Synchronized => {
                debug!(context.logger, "Runtime agent connected and synchronised");
                Ok(self.report_connected(context, cluster).await)
            }
            ConnectionState::SynchronizationFailed | ConnectionState::MetadataUpdateFailed => {
                warn!(
                    context.logger,
                    "Runtime agent connected but failed to synchronise";
                    "connection_state" => %status.state,
                    "message" => status.message.as_deref().unwrap_or_default(),
                );
                Ok(self.report_connected(context, cluster).await)
            }
            ConnectionState::ConnectionFailed => {
                self.reconfigure(context, cluster, kubeconfig).await
            }
            ConnectionState::Connected
            | ConnectionState::ConnectionMaintenanceFailed
            | ConnectionState::NotConnected => {
                info!(
                    context.logger, "Runtime agent is not yet connected";
                    "connection_state" => %status.state,
                );
                Ok(StageResult::wait(self.name(), self.pending_delay))
            }
            ConnectionState::Unrecognised(state) => {
                anyhow::bail!(ConnectionStateUnrecognised {
                    cluster_id: cluster.cluster_id.clone(),
                    state,
                })
            }
        }
    }
}
