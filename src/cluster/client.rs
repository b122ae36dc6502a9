use std::path::Path;

use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Client, Config};

use super::{Error, Result};

/// Creates a client from the mounted service account of the current pod.
///
/// # Errors
///
/// * [`Error::InClusterConfig`] if the service account configuration is incomplete.
/// * [`Error::ClientBuild`] if the client cannot be constructed from the config.
pub fn connect_in_cluster() -> Result<Client> {
    println!("Using in-cluster config");
    let config = Config::incluster().map_err(Error::InClusterConfig)?;
    log::debug!("Cluster URL: {}", config.cluster_url);

    Client::try_from(config).map_err(Error::ClientBuild)
}

/// Creates a client from the current context of the kubeconfig at `kubeconfig`.
///
/// # Errors
///
/// * [`Error::KubeconfigRead`] or [`Error::KubeconfigLoad`] if the kubeconfig cannot be
///   read or does not describe a usable context.
/// * [`Error::ClientBuild`] if the client cannot be constructed from the config.
pub async fn connect_local(kubeconfig: &Path) -> Result<Client> {
    println!("Using local kubeconfig");
    let config = load_kubeconfig(kubeconfig).await?;
    log::debug!("Cluster URL: {}", config.cluster_url);

    Client::try_from(config).map_err(Error::ClientBuild)
}

async fn load_kubeconfig(path: &Path) -> Result<Config> {
    let kubeconfig = Kubeconfig::read_from(path).map_err(|source| Error::KubeconfigRead {
        path: path.to_path_buf(),
        source,
    })?;

    Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default())
        .await
        .map_err(|source| Error::KubeconfigLoad {
            path: path.to_path_buf(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    const KUBECONFIG: &str = r#"
apiVersion: v1
kind: Config
clusters:
- name: dev
  cluster:
    server: https://127.0.0.1:6443
    insecure-skip-tls-verify: true
contexts:
- name: dev
  context:
    cluster: dev
    user: dev
current-context: dev
users:
- name: dev
  user:
    token: not-a-real-token
"#;

    #[tokio::test]
    async fn test_load_kubeconfig() {
        let tempdir = tempfile::tempdir().unwrap();
        let path = tempdir.path().join("config");
        std::fs::write(&path, KUBECONFIG).unwrap();

        let config = load_kubeconfig(&path).await.unwrap();
        assert_eq!(config.cluster_url.host(), Some("127.0.0.1"));
        assert_eq!(config.cluster_url.port_u16(), Some(6443));
    }

    #[tokio::test]
    async fn test_load_kubeconfig_missing_file() {
        let tempdir = tempfile::tempdir().unwrap();
        let path = tempdir.path().join("config");

        let err = load_kubeconfig(&path).await.unwrap_err();
        match err {
            Error::KubeconfigRead { path: err_path, .. } => assert_eq!(err_path, path),
            other => panic!("Expected KubeconfigRead, got {other}"),
        }
    }
}
