use super::{Error, Result};
use std::env;
use std::path::Path;

/// Environment variable injected into every pod that points at the API server.
pub const SERVICE_HOST_ENV: &str = "KUBERNETES_SERVICE_HOST";
/// Environment variable injected into every pod that holds the API server port.
pub const SERVICE_PORT_ENV: &str = "KUBERNETES_SERVICE_PORT";

/// Returns true if the given service account directory contains a token file.
///
/// # Arguments
///
/// * `service_account_dir` - Directory the service account secret is mounted at,
///   usually `/var/run/secrets/kubernetes.io/serviceaccount`.
///
/// # Errors
///
/// Returns [`Error::ExistenceCheck`] if checking the existence of the token fails.
pub fn contains_service_account_token(service_account_dir: impl AsRef<Path>) -> Result<bool> {
    let path = service_account_dir.as_ref().join("token");

    path.try_exists()
        .map_err(|source| Error::ExistenceCheck { path, source })
}

/// Returns true if the API server host and port variables are both set and non-empty.
pub fn has_service_env() -> bool {
    is_non_empty_var(env::var(SERVICE_HOST_ENV).ok().as_deref())
        && is_non_empty_var(env::var(SERVICE_PORT_ENV).ok().as_deref())
}

/// Returns true if the variable is present and contains more than whitespace.
pub fn is_non_empty_var(value: Option<&str>) -> bool {
    value.is_some_and(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_non_empty_var() {
        assert!(is_non_empty_var(Some("10.96.0.1")));
        assert!(!is_non_empty_var(Some("")));
        assert!(!is_non_empty_var(Some("  ")));
        assert!(!is_non_empty_var(None));
    }

    #[test]
    fn test_contains_service_account_token() {
        let tempdir = tempfile::tempdir().unwrap();
        assert!(!contains_service_account_token(tempdir.path()).unwrap());

        std::fs::write(tempdir.path().join("token"), "token").unwrap();
        assert!(contains_service_account_token(tempdir.path()).unwrap());
    }
}
