//! Identifiers for workflow stages and the outcome of evaluating them.
use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;

use crate::constants::STAGE_FINISHED;

/// Identifier of a stage in the provisioning workflow graph.
///
/// Every identifier an operation can reach must correspond to a registered stage,
/// except for the [`OperationStage::finished`] sentinel which marks completed operations.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OperationStage(String);

impl OperationStage {
    /// Refer to the stage with the given identifier.
    pub fn new<S: Into<String>>(id: S) -> Self {
        Self(id.into())
    }

    /// The terminal sentinel stage, which has no stage implementation associated to it.
    pub fn finished() -> Self {
        Self::new(STAGE_FINISHED)
    }

    /// Access the stage identifier as a string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Check if this is the terminal sentinel stage.
    pub fn is_finished(&self) -> bool {
        self.0 == STAGE_FINISHED
    }
}

impl AsRef<str> for OperationStage {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for OperationStage {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for OperationStage {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for OperationStage {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Outcome of a stage evaluation: where to resume and how long to wait before doing so.
///
/// A zero delay means the next stage should be invoked immediately.
/// A non-zero delay means the orchestrator must not invoke the next stage before it elapses.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct StageResult {
    /// Stage to resume the operation at on the next invocation.
    pub stage: OperationStage,

    /// Amount of time to wait before the next invocation.
    pub delay: Duration,
}

impl StageResult {
    /// Move on to the given stage without waiting.
    pub fn advance<S: Into<OperationStage>>(stage: S) -> Self {
        Self {
            stage: stage.into(),
            delay: Duration::ZERO,
        }
    }

    /// Invoke the given stage again once the delay has elapsed.
    pub fn wait<S: Into<OperationStage>>(stage: S, delay: Duration) -> Self {
        Self {
            stage: stage.into(),
            delay,
        }
    }

    /// The next stage should be invoked with no externally visible wait.
    pub fn is_immediate(&self) -> bool {
        self.delay.is_zero()
    }
}
