//! Interface for implementation of provisioning workflow stages.
use std::time::Duration;

use anyhow::Result;

use provisioner_context::Context;
use provisioner_models::Cluster;
use provisioner_models::Operation;
use provisioner_models::OperationStage;
use provisioner_models::StageResult;

/// Interface for stage logic to inspect state and decide how an [`Operation`] progresses.
///
/// Implementations of [`Stage`]s have to be `Send` and `Sync` as many operations
/// are progressed concurrently, each possibly invoking the same stage.
#[async_trait::async_trait]
pub trait Stage: std::fmt::Debug + Send + Sync {
    /// Identifier of the stage, constant for every instance.
    fn name(&self) -> OperationStage;

    /// Maximum cumulative time an [`Operation`] can spend at this stage.
    ///
    /// The budget covers all invocations of [`Stage::run`] that return the stage itself.
    /// Once exceeded the orchestrator fails the operation with a timeout.
    fn time_budget(&self) -> Duration;

    /// Inspect cluster, operation and external state to decide where the operation goes next.
    ///
    /// The returned [`StageResult`] can point at the stage itself (to wait and retry),
    /// at a later stage (to advance) or at any other stage the workflow routes to.
    /// Waiting is expressed with the result delay: implementations must not sleep
    /// while waiting for external state to change.
    ///
    /// Invocations must be idempotent, as an expired delay with no external progress
    /// results in the stage being invoked again with the same state.
    ///
    /// ## Errors
    ///
    /// If the stage cannot proceed it returns an error to indicate so.
    /// On error the [`Operation`] is failed and no further progress is attempted.
    ///
    /// Retry of failed stages is NOT automatically handled so transient failures need
    /// to be handled by the implementation.
    async fn run(
        &self,
        context: &Context,
        cluster: &Cluster,
        operation: &Operation,
    ) -> Result<StageResult>;
}
