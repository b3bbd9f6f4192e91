//! Data models for clusters and the provisioning operations that act on them.
mod cluster;
mod operation;
mod stage;

pub mod constants;

pub use self::cluster::Cluster;
pub use self::cluster::RuntimeStatusCondition;
pub use self::operation::Operation;
pub use self::operation::OperationFailure;
pub use self::operation::OperationFailureKind;
pub use self::operation::OperationKind;
pub use self::operation::OperationState;
pub use self::stage::OperationStage;
pub use self::stage::StageResult;
