use std::path::Path;

use super::checks::{contains_service_account_token, has_service_env};

/// Default mount point of the pod's service account secret.
pub const SERVICE_ACCOUNT_DIR: &str = "/var/run/secrets/kubernetes.io/serviceaccount";

/// Available runtime environments for the logger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeEnvironment {
    /// Running as a pod with a mounted service account; replicas elect a leader.
    InCluster,
    /// Running outside the cluster with a kubeconfig; a single unguarded pass is run.
    Local,
}

/// Detects whether the current process runs inside a Kubernetes cluster.
///
/// The process counts as in-cluster if the API server service variables are set and
/// a service account token is mounted below `service_account_dir`. These are the same
/// inputs the in-cluster client configuration needs.
///
/// All individual errors are logged as warnings and do **not** cause this function to
/// fail; a failed check counts as not in-cluster.
pub fn detect_runtime_environment(service_account_dir: impl AsRef<Path>) -> RuntimeEnvironment {
    if !has_service_env() {
        log::debug!("API server service environment variables are not set");
        return RuntimeEnvironment::Local;
    }

    detect_from_token(service_account_dir)
}

fn detect_from_token(service_account_dir: impl AsRef<Path>) -> RuntimeEnvironment {
    match contains_service_account_token(service_account_dir) {
        Ok(true) => RuntimeEnvironment::InCluster,
        Ok(false) => {
            log::debug!("No service account token mounted");
            RuntimeEnvironment::Local
        }
        Err(err) => {
            log::warn!(
                "Service account check failed when detecting runtime environment: {}",
                err
            );
            RuntimeEnvironment::Local
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_from_token() {
        let tempdir = tempfile::tempdir().unwrap();
        assert_eq!(detect_from_token(tempdir.path()), RuntimeEnvironment::Local);

        std::fs::write(tempdir.path().join("token"), "token").unwrap();
        assert_eq!(
            detect_from_token(tempdir.path()),
            RuntimeEnvironment::InCluster
        );
    }

    #[test]
    fn test_detect_from_missing_directory() {
        let tempdir = tempfile::tempdir().unwrap();
        let missing = tempdir.path().join("serviceaccount");
        assert_eq!(detect_from_token(missing), RuntimeEnvironment::Local);
    }
}
