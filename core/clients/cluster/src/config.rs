//! Typed client configuration decoded from raw cluster credentials.
use anyhow::Context;
use anyhow::Result;
use serde::Deserialize;

use crate::errors::CredentialsInvalid;

/// Connection details needed to build clients for a cluster's control-plane API.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ClusterConfig {
    /// How clients authenticate with the cluster.
    pub auth: ClusterAuth,

    /// Base64 encoded certificate authority bundle to verify the server with.
    pub certificate_authority_data: Option<String>,

    /// Skip verification of the server certificate.
    pub insecure_skip_tls_verify: bool,

    /// Address of the cluster control-plane API server.
    pub server: String,
}

/// Authentication methods supported for cluster clients.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ClusterAuth {
    /// Mutual TLS with a client certificate.
    ClientCertificate {
        certificate_data: String,
        key_data: String,
    },

    /// No credentials are presented to the server.
    None,

    /// Bearer token authentication.
    Token(String),
}

impl ClusterConfig {
    /// Decode raw (kubeconfig formatted) credentials into a [`ClusterConfig`].
    ///
    /// The cluster and user referenced by the current context are used.
    /// When no current context is set but only one context is defined that one is used.
    ///
    /// # Errors
    ///
    /// Malformed credentials are reported with a [`CredentialsInvalid`] error.
    pub fn parse(raw: &str) -> Result<ClusterConfig> {
        let document: Kubeconfig =
            serde_yaml::from_str(raw).context(CredentialsInvalid::Decode)?;

        // Find the context to use.
        let context = match document.current_context.as_deref() {
            Some(name) if !name.is_empty() => document
                .contexts
                .iter()
                .find(|context| context.name == name)
                .ok_or_else(|| CredentialsInvalid::ContextNotFound(name.to_string()))?,
            _ if document.contexts.len() == 1 => &document.contexts[0],
            _ => anyhow::bail!(CredentialsInvalid::NoCurrentContext),
        };

        // Resolve the cluster and user the context refers to.
        let cluster_name = &context.context.cluster;
        let cluster = document
            .clusters
            .iter()
            .find(|cluster| &cluster.name == cluster_name)
            .ok_or_else(|| CredentialsInvalid::ClusterNotFound(cluster_name.clone()))?;
        if cluster.cluster.server.is_empty() {
            anyhow::bail!(CredentialsInvalid::NoServer(cluster_name.clone()));
        }
        let auth = match &context.context.user {
            None => ClusterAuth::None,
            Some(user_name) => {
                let user = document
                    .users
                    .iter()
                    .find(|user| &user.name == user_name)
                    .ok_or_else(|| CredentialsInvalid::UserNotFound(user_name.clone()))?;
                user.user.auth()
            }
        };

        Ok(ClusterConfig {
            auth,
            certificate_authority_data: cluster.cluster.certificate_authority_data.clone(),
            insecure_skip_tls_verify: cluster.cluster.insecure_skip_tls_verify,
            server: cluster.cluster.server.clone(),
        })
    }
}

/// Subset of the kubeconfig document needed to reach a cluster.
#[derive(Debug, Deserialize)]
struct Kubeconfig {
    #[serde(default)]
    clusters: Vec<NamedCluster>,

    #[serde(default)]
    contexts: Vec<NamedContext>,

    #[serde(default, rename = "current-context")]
    current_context: Option<String>,

    #[serde(default)]
    users: Vec<NamedUser>,
}

#[derive(Debug, Deserialize)]
struct NamedCluster {
    name: String,
    cluster: ClusterEntry,
}

#[derive(Debug, Deserialize)]
struct ClusterEntry {
    #[serde(default, rename = "certificate-authority-data")]
    certificate_authority_data: Option<String>,

    #[serde(default, rename = "insecure-skip-tls-verify")]
    insecure_skip_tls_verify: bool,

    #[serde(default)]
    server: String,
}

#[derive(Debug, Deserialize)]
struct NamedContext {
    name: String,
    context: ContextEntry,
}

#[derive(Debug, Deserialize)]
struct ContextEntry {
    cluster: String,

    #[serde(default)]
    user: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NamedUser {
    name: String,
    user: UserEntry,
}

#[derive(Debug, Deserialize)]
struct UserEntry {
    #[serde(default, rename = "client-certificate-data")]
    client_certificate_data: Option<String>,

    #[serde(default, rename = "client-key-data")]
    client_key_data: Option<String>,

    #[serde(default)]
    token: Option<String>,
}

impl UserEntry {
    /// Pick the authentication method for the user, preferring tokens.
    fn auth(&self) -> ClusterAuth {
        if let Some(token) = &self.token {
            return ClusterAuth::Token(token.clone());
        }
        match (&self.client_certificate_data, &self.client_key_data) {
            (Some(certificate_data), Some(key_data)) => ClusterAuth::ClientCertificate {
                certificate_data: certificate_data.clone(),
                key_data: key_data.clone(),
            },
            _ => ClusterAuth::None,
        }
    }
}
