use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::election::{DEFAULT_LEASE_NAME, DEFAULT_LEASE_NAMESPACE, ElectionConfig};
use crate::logger::DEFAULT_LOG_FILE;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("no kubeconfig given and `HOME` is not set")]
    MissingHome,
    #[error("failed to determine hostname: {0}")]
    Hostname(#[source] std::io::Error),
    #[error("election identity must not be empty")]
    EmptyIdentity,
}

pub type Result<T> = std::result::Result<T, Error>;

/// Logs the name, node and phase of every pod in the cluster.
#[derive(Debug, Clone, Parser)]
#[command(version, about)]
pub struct Config {
    /// Path to the kubeconfig file, used when running outside the cluster. Of a
    /// `KUBECONFIG` path list only the first entry is used [default: $HOME/.kube/config]
    #[arg(long, env = "KUBECONFIG")]
    pub kubeconfig: Option<PathBuf>,

    /// File the pod status lines are appended to.
    #[arg(long, env = "POD_STATUS_LOG_FILE", default_value = DEFAULT_LOG_FILE)]
    pub log_file: PathBuf,

    /// Name of the lease replicas compete for.
    #[arg(long, default_value = DEFAULT_LEASE_NAME)]
    pub lease_name: String,

    /// Namespace of the lease.
    #[arg(long, default_value = DEFAULT_LEASE_NAMESPACE)]
    pub lease_namespace: String,

    /// Identity of this replica in the election [default: hostname]
    #[arg(long, env = "POD_NAME")]
    pub identity: Option<String>,

    /// Seconds followers wait after the last renewal before taking over the lease.
    #[arg(long, default_value_t = 15)]
    pub lease_duration: u64,

    /// Seconds the leader keeps retrying renewal before stepping down.
    #[arg(long, default_value_t = 10)]
    pub renew_deadline: u64,

    /// Seconds between acquisition and renewal attempts.
    #[arg(long, default_value_t = 2)]
    pub retry_period: u64,
}

impl Config {
    /// Returns the kubeconfig path, defaulting to `$HOME/.kube/config`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingHome`] if no path was given and `HOME` is unset.
    pub fn kubeconfig_path(&self) -> Result<PathBuf> {
        if let Some(path) = self
            .kubeconfig
            .as_deref()
            .and_then(|paths| std::env::split_paths(paths).find(|p| !p.as_os_str().is_empty()))
        {
            return Ok(path);
        }
        let home = std::env::var_os("HOME").ok_or(Error::MissingHome)?;
        Ok(PathBuf::from(home).join(".kube").join("config"))
    }

    /// Returns the election identity, falling back to the hostname.
    ///
    /// # Errors
    ///
    /// * [`Error::Hostname`] if no identity was given and the hostname cannot be read.
    /// * [`Error::EmptyIdentity`] if the resulting identity is empty.
    pub fn identity(&self) -> Result<String> {
        let identity = match &self.identity {
            Some(identity) => identity.trim().to_owned(),
            None => hostname::get()
                .map_err(Error::Hostname)?
                .to_string_lossy()
                .trim()
                .to_owned(),
        };
        if identity.is_empty() {
            return Err(Error::EmptyIdentity);
        }
        Ok(identity)
    }

    pub fn election(&self) -> ElectionConfig {
        ElectionConfig {
            lease_duration: Duration::from_secs(self.lease_duration),
            renew_deadline: Duration::from_secs(self.renew_deadline),
            retry_period: Duration::from_secs(self.retry_period),
        }
    }
}
