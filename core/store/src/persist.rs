//! Persistent store operations to persist records.
use provisioner_models::Cluster;
use provisioner_models::Operation;

use self::seal::SealPersistOp;

/// Internal trait to enable persist operations on the persistent store.
pub trait PersistOp: Into<PersistOps> + SealPersistOp {
    /// Type returned by the matching persist operation.
    type Response: From<PersistResponses>;
}

/// List of all persist operations the persistent store must implement.
pub enum PersistOps {
    /// Persist a cluster record.
    Cluster(Cluster),

    /// Persist an operation record.
    Operation(Operation),
}

/// List of all responses from persist operations.
pub enum PersistResponses {
    /// The operation completed successfully and does not return data.
    Success,
}

// --- Internal implementation details follow --- //
/// Private module to seal implementation details.
mod seal {
    /// Super-trait to seal the [`PersistOp`](super::PersistOp) trait.
    pub trait SealPersistOp {}
}

// --- Implement PersistOp and super traits on types for transparent operations --- //
impl PersistOp for Cluster {
    type Response = ();
}
impl SealPersistOp for Cluster {}
impl From<Cluster> for PersistOps {
    fn from(value: Cluster) -> Self {
        PersistOps::Cluster(value)
    }
}

impl PersistOp for Operation {
    type Response = ();
}
impl SealPersistOp for Operation {}
impl From<Operation> for PersistOps {
    fn from(value: Operation) -> Self {
        PersistOps::Operation(value)
    }
}

// --- Implement PersistResponses conversions on return types for transparent operations --- //
impl From<PersistResponses> for () {
    fn from(value: PersistResponses) -> Self {
        match value {
            PersistResponses::Success => (),
        }
    }
}
