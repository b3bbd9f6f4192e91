//! Errors reported while driving operations.
use std::time::Duration;

use provisioner_models::OperationStage;

/// The stage invoked for an operation returned an error.
#[derive(Debug, thiserror::Error)]
#[error("stage '{stage}' failed")]
pub struct StageFailed {
    pub stage: String,
}

impl From<&OperationStage> for StageFailed {
    fn from(value: &OperationStage) -> Self {
        StageFailed {
            stage: value.to_string(),
        }
    }
}

/// The operation spent longer at a stage then the stage allows.
#[derive(Debug, thiserror::Error)]
#[error("stage '{stage}' exceeded its time budget of {}s", .budget.as_secs())]
pub struct StageTimeout {
    pub budget: Duration,
    pub stage: String,
}

/// The [`OperationsExecutor`](crate::OperationsExecutor) is no longer accepting operations.
#[derive(Debug, thiserror::Error)]
#[error("the operations executor has stopped and can't accept operation '{operation_id}'")]
pub struct ExecutorStopped {
    pub operation_id: String,
}
