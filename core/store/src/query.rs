//! Persistent store operations to query records.
use uuid::Uuid;

use provisioner_models::Cluster;
use provisioner_models::Operation;

use self::seal::SealQueryOp;

/// Internal trait to enable query operations on the persistent store.
pub trait QueryOp: Into<QueryOps> + SealQueryOp {
    /// Type returned by the matching query operation.
    type Response: From<QueryResponses>;
}

/// List of all query operations the persistent store must implement.
pub enum QueryOps {
    /// Query a cluster by ID.
    Cluster(LookupCluster),

    /// List all operations that are not in a final state.
    ListOperationsInProgress,

    /// Query an operation by ID.
    Operation(LookupOperation),
}

/// List of all responses from query operations.
pub enum QueryResponses {
    /// Return a [`Cluster`], if one was found matching the query.
    Cluster(Option<Cluster>),

    /// Return an [`Operation`], if one was found matching the query.
    Operation(Option<Operation>),

    /// Return a list of [`Operation`]s.
    Operations(Vec<Operation>),
}

// --- High level query operations --- //
/// List all operations that are not in a final state.
pub struct ListOperationsInProgress;

/// Lookup a [`Cluster`] record by ID.
#[derive(Clone, Debug)]
pub struct LookupCluster(pub String);
impl From<&str> for LookupCluster {
    fn from(value: &str) -> Self {
        LookupCluster(value.to_string())
    }
}
impl From<&Operation> for LookupCluster {
    fn from(value: &Operation) -> Self {
        LookupCluster(value.cluster_id.clone())
    }
}

/// Lookup an [`Operation`] record by ID.
#[derive(Clone, Debug)]
pub struct LookupOperation(pub Uuid);
impl From<&Operation> for LookupOperation {
    fn from(value: &Operation) -> Self {
        LookupOperation(value.operation_id)
    }
}
impl From<Uuid> for LookupOperation {
    fn from(value: Uuid) -> Self {
        LookupOperation(value)
    }
}

// --- Internal implementation details follow --- //
/// Private module to seal implementation details.
mod seal {
    /// Super-trait to seal the [`QueryOp`](super::QueryOp) trait.
    pub trait SealQueryOp {}
}

// --- Implement QueryOp and super traits on types for transparent operations --- //
impl SealQueryOp for ListOperationsInProgress {}
impl QueryOp for ListOperationsInProgress {
    type Response = Vec<Operation>;
}
impl From<ListOperationsInProgress> for QueryOps {
    fn from(_: ListOperationsInProgress) -> Self {
        QueryOps::ListOperationsInProgress
    }
}

impl SealQueryOp for LookupCluster {}
impl QueryOp for LookupCluster {
    type Response = Option<Cluster>;
}
impl From<LookupCluster> for QueryOps {
    fn from(value: LookupCluster) -> Self {
        QueryOps::Cluster(value)
    }
}

impl SealQueryOp for LookupOperation {}
impl QueryOp for LookupOperation {
    type Response = Option<Operation>;
}
impl From<LookupOperation> for QueryOps {
    fn from(value: LookupOperation) -> Self {
        QueryOps::Operation(value)
    }
}

// --- Implement Response conversions on return types --- //
impl From<QueryResponses> for Option<Cluster> {
    fn from(value: QueryResponses) -> Self {
        match value {
            QueryResponses::Cluster(cluster) => cluster,
            _ => panic!("unexpected result type for cluster query"),
        }
    }
}

impl From<QueryResponses> for Option<Operation> {
    fn from(value: QueryResponses) -> Self {
        match value {
            QueryResponses::Operation(operation) => operation,
            _ => panic!("unexpected result type for operation query"),
        }
    }
}

impl From<QueryResponses> for Vec<Operation> {
    fn from(value: QueryResponses) -> Self {
        match value {
            QueryResponses::Operations(operations) => operations,
            _ => panic!("unexpected result type for operations list query"),
        }
    }
}
