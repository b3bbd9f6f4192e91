//! Errors related to stage handling and definition.

/// No stage implementation is registered for the stage identifier.
#[derive(Debug, thiserror::Error)]
#[error("no stage implementation is registered for stage {stage}")]
pub struct StageNotRegistered {
    /// The stage identifier being looked up.
    pub stage: String,
}

impl From<&str> for StageNotRegistered {
    fn from(value: &str) -> Self {
        StageNotRegistered {
            stage: value.to_string(),
        }
    }
}
