//! Models tracking provisioning workflow instances as they progress through stages.
use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value as Json;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::OperationStage;
use crate::StageResult;

/// One provisioning workflow instance for a cluster.
///
/// Operations are created when the workflow begins and updated by the orchestrator
/// after every stage invocation until they reach a final state.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    /// Unique ID of the operation.
    pub operation_id: Uuid,

    /// ID of the cluster the operation acts on.
    pub cluster_id: String,

    /// Delay to wait before the current stage is invoked again.
    pub delay: Duration,

    /// Details of why the operation failed, for failed operations only.
    #[serde(default)]
    pub failure: Option<OperationFailure>,

    /// Type of workflow the operation performs.
    pub kind: OperationKind,

    /// UTC time of the last change to the operation.
    #[serde(with = "time::serde::rfc3339")]
    pub last_transition: OffsetDateTime,

    /// Human readable summary of the operation progress.
    pub message: String,

    /// Stage the operation is currently at.
    pub stage: OperationStage,

    /// UTC time the operation entered its current stage.
    ///
    /// Used to enforce stage time budgets across repeated invocations.
    #[serde(with = "time::serde::rfc3339")]
    pub stage_started: OffsetDateTime,

    /// UTC time the operation was created.
    #[serde(with = "time::serde::rfc3339")]
    pub started: OffsetDateTime,

    /// Lifecycle state of the operation.
    pub state: OperationState,
}

impl Operation {
    /// Initialise a new in-progress operation at the given stage.
    pub fn start<S, O>(cluster_id: S, kind: OperationKind, stage: O, now: OffsetDateTime) -> Self
    where
        S: Into<String>,
        O: Into<OperationStage>,
    {
        let stage = stage.into();
        let message = format!("Operation started at stage {}", stage);
        Self {
            operation_id: Uuid::new_v4(),
            cluster_id: cluster_id.into(),
            delay: Duration::ZERO,
            failure: None,
            kind,
            last_transition: now,
            message,
            stage,
            stage_started: now,
            started: now,
            state: OperationState::InProgress,
        }
    }

    /// Mark the operation as failed.
    pub fn fail<M>(
        &mut self,
        kind: OperationFailureKind,
        message: M,
        error: Json,
        now: OffsetDateTime,
    ) where
        M: Into<String>,
    {
        self.delay = Duration::ZERO;
        self.failure = Some(OperationFailure {
            error,
            kind,
            stage: self.stage.clone(),
        });
        self.last_transition = now;
        self.message = message.into();
        self.state = OperationState::Failed;
    }

    /// Time spent at the current stage, across all invocations of it.
    pub fn time_at_stage(&self, now: OffsetDateTime) -> Duration {
        let elapsed = now - self.stage_started;
        Duration::try_from(elapsed).unwrap_or(Duration::ZERO)
    }

    /// Apply the result of a stage invocation to the operation.
    ///
    /// Moving to a different stage resets the time tracked against stage budgets.
    /// Moving to the [`OperationStage::finished`] sentinel completes the operation.
    pub fn transition(&mut self, result: StageResult, now: OffsetDateTime) {
        if result.stage != self.stage {
            self.stage_started = now;
        }
        self.last_transition = now;
        self.stage = result.stage;
        if self.stage.is_finished() {
            self.delay = Duration::ZERO;
            self.message = String::from("Operation succeeded");
            self.state = OperationState::Succeeded;
        } else {
            self.delay = result.delay;
            self.message = format!("Operation in progress at stage {}", self.stage);
        }
    }
}

/// Information about failed operations.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OperationFailure {
    /// Encoded error chain that caused the failure.
    pub error: Json,

    /// Classification of the failure.
    pub kind: OperationFailureKind,

    /// Stage the operation was at when it failed.
    pub stage: OperationStage,
}

/// Classification of operation failures.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum OperationFailureKind {
    /// The stage reported an error it could not recover from.
    #[serde(rename = "STAGE_FAILED")]
    StageFailed,

    /// The operation spent longer then the stage time budget at a stage.
    #[serde(rename = "STAGE_TIMEOUT")]
    StageTimeout,
}

/// Type of workflow an operation performs.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum OperationKind {
    #[serde(rename = "DEPROVISION")]
    Deprovision,

    #[serde(rename = "PROVISION")]
    Provision,

    #[serde(rename = "RECONNECT_RUNTIME")]
    ReconnectRuntime,

    #[serde(rename = "UPGRADE")]
    Upgrade,
}

impl std::fmt::Display for OperationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::Deprovision => write!(f, "DEPROVISION"),
            Self::Provision => write!(f, "PROVISION"),
            Self::ReconnectRuntime => write!(f, "RECONNECT_RUNTIME"),
            Self::Upgrade => write!(f, "UPGRADE"),
        }
    }
}

/// Lifecycle state of an operation.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum OperationState {
    /// The operation failed and will not progress further.
    #[serde(rename = "FAILED")]
    Failed,

    /// The operation is progressing through its stages.
    #[serde(rename = "IN_PROGRESS")]
    InProgress,

    /// The operation reached the end of its workflow.
    #[serde(rename = "SUCCEEDED")]
    Succeeded,
}

impl OperationState {
    /// Check if the operation is in a final state.
    pub fn is_final(&self) -> bool {
        !matches!(self, Self::InProgress)
    }
}
