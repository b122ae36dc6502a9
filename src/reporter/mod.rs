//! One logging pass: enumerate the cluster's pods and log each one's status.
//!
//! [`PodStatusReporter`] is also the [`LeadershipHandler`] of the election, running a
//! pass every time this replica becomes leader.
use crate::cluster::PodLister;
use crate::election::LeadershipHandler;
use crate::logger::{ConcurrentLogger, PassReport};

mod error;

pub use error::{Error, Result};

pub struct PodStatusReporter<P> {
    lister: P,
    logger: ConcurrentLogger,
    identity: String,
}

impl<P> PodStatusReporter<P>
where
    P: PodLister,
{
    /// Creates a reporter for the replica with the given election identity.
    pub fn new(lister: P, logger: ConcurrentLogger, identity: impl Into<String>) -> Self {
        Self {
            lister,
            logger,
            identity: identity.into(),
        }
    }

    /// Lists all pods and logs their status.
    ///
    /// # Errors
    ///
    /// * [`Error::Enumerate`] if the pod list cannot be retrieved.
    /// * [`Error::Log`] if the log file cannot be opened.
    pub async fn run_pass(&self) -> Result<PassReport> {
        let pods = self.lister.list_pods().await?;
        let report = self.logger.log_pods(pods).await?;
        log::debug!(
            "Pass finished: delivered={}, failed_writes={}",
            report.delivered(),
            report.failed_writes
        );
        Ok(report)
    }
}

impl<P> LeadershipHandler for PodStatusReporter<P>
where
    P: PodLister + Send + Sync + 'static,
{
    async fn on_started_leading(&self) {
        log::info!("I am the leader, starting to log pod statuses.");
        if let Err(err) = self.run_pass().await {
            log::error!("Logging pass failed: {}", err);
        }
    }

    fn on_stopped_leading(&self) {
        log::info!("Lost leadership, stopping pod status logging.");
    }

    fn on_new_leader(&self, identity: &str) {
        if identity == self.identity {
            log::info!("I am still the leader!");
        } else {
            log::info!("New leader elected: {}", identity);
        }
    }
}
