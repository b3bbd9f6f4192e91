//! Progress individual operations through their stages.
use std::time::Duration;

use anyhow::Result;
use slog::debug;
use slog::error;
use slog::info;
use time::OffsetDateTime;
use uuid::Uuid;

use replisdk::utils::error::slog::ErrorAttributes;

use provisioner_context::Context;
use provisioner_errors::ClusterNotFound;
use provisioner_errors::OperationNotFound;
use provisioner_models::Operation;
use provisioner_models::OperationFailureKind;
use provisioner_models::OperationKind;
use provisioner_models::OperationStage;
use provisioner_models::OperationState;
use provisioner_stage::StageRegistry;
use provisioner_store::query::LookupCluster;
use provisioner_store::query::LookupOperation;
use provisioner_store::Store;

use crate::errors::StageFailed;
use crate::errors::StageTimeout;
use crate::telemetry::OPERATIONS_FAILED;
use crate::telemetry::OPERATIONS_SUCCEEDED;
use crate::telemetry::STAGE_INVOKE_COUNT;
use crate::telemetry::STAGE_INVOKE_ERR;
use crate::telemetry::STAGE_TIMEOUT;

/// Invoke stages for operations and record the outcome.
///
/// Each call to [`Orchestrator::progress`] performs exactly one stage invocation
/// (or time budget enforcement) and persists the updated operation.
/// Callers are responsible for waiting the returned delay before progressing again
/// and for never progressing the same operation concurrently.
#[derive(Clone)]
pub struct Orchestrator {
    registry: StageRegistry,
    store: Store,
}

impl Orchestrator {
    pub fn new(registry: StageRegistry, store: Store) -> Orchestrator {
        Orchestrator { registry, store }
    }

    /// Progress an operation until it reaches a final state.
    ///
    /// Between invocations the operation waits for the delay returned by stages.
    /// Operations loaded from the store only wait what is left of their last delay.
    pub async fn drive(&self, context: &Context, operation_id: Uuid) -> Result<Operation> {
        let operation = self.lookup(context, operation_id).await?;
        if operation.state.is_final() {
            return Ok(operation);
        }
        let remaining = operation.last_transition + operation.delay - OffsetDateTime::now_utc();
        let remaining = Duration::try_from(remaining).unwrap_or(Duration::ZERO);
        if !remaining.is_zero() {
            tokio::time::sleep(remaining).await;
        }

        loop {
            let operation = self.progress(context, operation_id).await?;
            if operation.state.is_final() {
                return Ok(operation);
            }
            if !operation.delay.is_zero() {
                tokio::time::sleep(operation.delay).await;
            }
        }
    }

    /// Perform a single wake-up of an operation and persist the outcome.
    ///
    /// Operations in a final state are returned unchanged.
    ///
    /// # Errors
    ///
    /// Errors returned by this method indicate the operation could not be progressed
    /// (for example the store is unavailable) and the operation record is unchanged.
    /// Stage failures and timeouts are instead recorded on the returned operation.
    pub async fn progress(&self, context: &Context, operation_id: Uuid) -> Result<Operation> {
        let mut operation = self.lookup(context, operation_id).await?;
        if operation.state.is_final() {
            debug!(
                context.logger, "Skipping progress of operation in a final state";
                "operation_id" => %operation_id,
            );
            return Ok(operation);
        }

        let context = context.derive_with(|builder| {
            builder.log_values(slog::o!(
                "cluster_id" => operation.cluster_id.clone(),
                "operation_id" => operation.operation_id.to_string(),
                "stage" => operation.stage.to_string(),
            ))
        });
        self.advance(&context, &mut operation).await?;
        self.store.persist(&context, operation.clone()).await?;
        Ok(operation)
    }

    /// Create and persist a new operation for a cluster.
    ///
    /// # Errors
    ///
    /// The cluster must exist and the first stage must be registered.
    pub async fn start<S>(
        &self,
        context: &Context,
        cluster_id: &str,
        kind: OperationKind,
        first_stage: S,
    ) -> Result<Operation>
    where
        S: Into<OperationStage>,
    {
        let first_stage = first_stage.into();
        self.registry.lookup(&first_stage)?;
        let cluster = self
            .store
            .query(context, LookupCluster::from(cluster_id))
            .await?;
        if cluster.is_none() {
            anyhow::bail!(ClusterNotFound::new(cluster_id));
        }

        let operation = Operation::start(
            cluster_id,
            kind,
            first_stage,
            OffsetDateTime::now_utc(),
        );
        self.store.persist(context, operation.clone()).await?;
        info!(
            context.logger, "Started provisioning operation";
            "cluster_id" => cluster_id,
            "operation_id" => %operation.operation_id,
            "operation_kind" => %kind,
            "stage" => %operation.stage,
        );
        Ok(operation)
    }

    /// Enforce the stage time budget and invoke the stage to update the operation.
    async fn advance(&self, context: &Context, operation: &mut Operation) -> Result<()> {
        let stage_id = operation.stage.clone();
        let stage = match self.registry.lookup(&stage_id) {
            Ok(stage) => stage,
            Err(error) => {
                let error = error.context(StageFailed::from(&stage_id));
                fail(context, operation, OperationFailureKind::StageFailed, error);
                return Ok(());
            }
        };

        // The budget is checked before invoking the stage again.
        let budget = stage.time_budget();
        if operation.time_at_stage(OffsetDateTime::now_utc()) > budget {
            STAGE_TIMEOUT.with_label_values(&[stage_id.as_str()]).inc();
            let error = anyhow::anyhow!(StageTimeout {
                budget,
                stage: stage_id.to_string(),
            });
            fail(context, operation, OperationFailureKind::StageTimeout, error);
            return Ok(());
        }

        let cluster = self
            .store
            .query(context, LookupCluster::from(&*operation))
            .await?;
        let result = match cluster {
            None => Err(anyhow::anyhow!(ClusterNotFound::new(&operation.cluster_id))),
            Some(cluster) => {
                STAGE_INVOKE_COUNT
                    .with_label_values(&[stage_id.as_str()])
                    .inc();
                stage.run(context, &cluster, operation).await
            }
        };

        match result {
            Err(error) => {
                STAGE_INVOKE_ERR.with_label_values(&[stage_id.as_str()]).inc();
                let error = error.context(StageFailed::from(&stage_id));
                fail(context, operation, OperationFailureKind::StageFailed, error);
            }
            Ok(result) => {
                debug!(
                    context.logger, "Stage invocation completed";
                    "next_stage" => %result.stage,
                    "delay" => result.delay.as_secs(),
                );
                operation.transition(result, OffsetDateTime::now_utc());
                if operation.state == OperationState::Succeeded {
                    OPERATIONS_SUCCEEDED.inc();
                    info!(context.logger, "Provisioning operation succeeded");
                }
            }
        }
        Ok(())
    }

    /// Store the orchestrator reads and persists operations with.
    pub fn store(&self) -> &Store {
        &self.store
    }

    async fn lookup(&self, context: &Context, operation_id: Uuid) -> Result<Operation> {
        let operation = self
            .store
            .query(context, LookupOperation(operation_id))
            .await?;
        match operation {
            Some(operation) => Ok(operation),
            None => anyhow::bail!(OperationNotFound::new(operation_id.to_string())),
        }
    }
}

/// Mark the operation as failed, attaching the error that caused it.
fn fail(
    context: &Context,
    operation: &mut Operation,
    kind: OperationFailureKind,
    error: anyhow::Error,
) {
    error!(
        context.logger, "Provisioning operation failed";
        "failure_kind" => ?kind,
        ErrorAttributes::from(&error),
    );
    OPERATIONS_FAILED.inc();
    let message = format!("{:#}", error);
    let error = replisdk::utils::error::into_json(error);
    operation.fail(kind, message, error, OffsetDateTime::now_utc());
}
