//! Errors around cluster credentials and clients initialisation.

/// The cluster connection credentials are malformed.
#[derive(Debug, thiserror::Error)]
pub enum CredentialsInvalid {
    #[error("credentials reference cluster '{0}' which is not defined")]
    // (cluster_name,)
    ClusterNotFound(String),

    #[error("credentials reference context '{0}' which is not defined")]
    // (context_name,)
    ContextNotFound(String),

    #[error("unable to decode cluster credentials")]
    Decode,

    #[error("credentials do not select a current context")]
    NoCurrentContext,

    #[error("credentials for cluster '{0}' do not include a server address")]
    // (cluster_name,)
    NoServer(String),

    #[error("credentials reference user '{0}' which is not defined")]
    // (user_name,)
    UserNotFound(String),
}
