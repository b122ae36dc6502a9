use std::path::PathBuf;

/// Errors raised while talking to the cluster API.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to load in-cluster config: {0}")]
    InClusterConfig(#[source] kube::config::InClusterError),
    #[error("failed to read kubeconfig `{path}`: {source}")]
    KubeconfigRead {
        path: PathBuf,
        #[source]
        source: kube::config::KubeconfigError,
    },
    #[error("failed to load kubeconfig `{path}`: {source}")]
    KubeconfigLoad {
        path: PathBuf,
        #[source]
        source: kube::config::KubeconfigError,
    },
    #[error("failed to create Kubernetes client: {0}")]
    ClientBuild(#[source] kube::Error),
    #[error("failed to list pods: {0}")]
    Query(#[source] kube::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
