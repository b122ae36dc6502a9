//! Lease based leader election.
//!
//! Cooperating replicas compete for a single `coordination.k8s.io/v1` lease. The
//! replica holding it is the leader and is the only one allowed to run logging passes.
//!
//! # Key Components
//!
//! - [`LeaseLock`]: acquire, renew and release a named lease. [`KubeLeaseLock`] talks
//!   to the API server, tests use in-memory fakes.
//! - [`LeaderStateMachine`]: the `Follower` / `Acquiring` / `Leader` states and the
//!   transitions between them.
//! - [`LeaderElector`]: drives the state machine from lease observations and invokes
//!   a [`LeadershipHandler`] on every transition.
//!
//! # Timing
//!
//! A leader renews its lease every retry period. If no renewal succeeds within the
//! renew deadline it steps down. A follower retries acquisition every retry period and
//! may take over once the previous holder has not renewed for a full lease duration.
//! A logging pass runs independently of renewal, so a pass that outlives the renew
//! deadline can overlap with a pass started by the next leader.
use std::time::Duration;

mod elector;
mod error;
mod kube_lease;
mod lock;
mod state;

pub use elector::{LeaderElector, LeadershipHandler};
pub use error::{Error, Result};
pub use kube_lease::KubeLeaseLock;
pub use lock::{LeaseLock, LeaseObservation};
pub use state::{LeaderState, LeaderStateMachine, Transition};

/// Default name of the lease replicas compete for.
pub const DEFAULT_LEASE_NAME: &str = "leader-election";
/// Default namespace of the lease.
pub const DEFAULT_LEASE_NAMESPACE: &str = "default";

/// Minimum ratio between renew deadline and retry period.
const JITTER_FACTOR: f64 = 1.2;

/// Timing parameters of the election.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ElectionConfig {
    /// How long non-leaders wait after the last observed renewal before taking over.
    pub lease_duration: Duration,
    /// How long the leader keeps retrying renewal before stepping down.
    pub renew_deadline: Duration,
    /// Interval between acquisition or renewal attempts.
    pub retry_period: Duration,
}

impl Default for ElectionConfig {
    fn default() -> Self {
        Self {
            lease_duration: Duration::from_secs(15),
            renew_deadline: Duration::from_secs(10),
            retry_period: Duration::from_secs(2),
        }
    }
}

impl ElectionConfig {
    /// Checks that the timings leave room for renewal before the lease expires.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if any duration is zero, if the lease duration
    /// does not exceed the renew deadline, or if the renew deadline does not exceed
    /// the retry period by at least the jitter factor of 1.2.
    pub fn validate(&self) -> Result<()> {
        if self.lease_duration.is_zero()
            || self.renew_deadline.is_zero()
            || self.retry_period.is_zero()
        {
            return Err(Error::InvalidConfig(
                "durations must be greater than zero".to_owned(),
            ));
        }
        if self.lease_duration <= self.renew_deadline {
            return Err(Error::InvalidConfig(format!(
                "lease duration ({:?}) must be greater than renew deadline ({:?})",
                self.lease_duration, self.renew_deadline
            )));
        }
        if self.renew_deadline <= self.retry_period.mul_f64(JITTER_FACTOR) {
            return Err(Error::InvalidConfig(format!(
                "renew deadline ({:?}) must be greater than {JITTER_FACTOR} * retry period ({:?})",
                self.renew_deadline, self.retry_period
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(lease: u64, renew: u64, retry: u64) -> ElectionConfig {
        ElectionConfig {
            lease_duration: Duration::from_secs(lease),
            renew_deadline: Duration::from_secs(renew),
            retry_period: Duration::from_secs(retry),
        }
    }

    #[test]
    fn test_default_config_is_valid() {
        let default = ElectionConfig::default();
        assert_eq!(default, config(15, 10, 2));
        assert!(default.validate().is_ok());
    }

    #[test]
    fn test_config_rejects_zero_durations() {
        assert!(matches!(
            config(15, 10, 0).validate(),
            Err(Error::InvalidConfig(_))
        ));
        assert!(config(0, 10, 2).validate().is_err());
    }

    #[test]
    fn test_config_rejects_lease_not_exceeding_deadline() {
        assert!(config(10, 10, 2).validate().is_err());
        assert!(config(5, 10, 2).validate().is_err());
    }

    #[test]
    fn test_config_rejects_deadline_too_close_to_retry() {
        assert!(config(15, 2, 2).validate().is_err());
        assert!(config(15, 11, 10).validate().is_err());
        assert!(config(15, 13, 10).validate().is_ok());
    }
}
