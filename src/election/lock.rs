use super::Result;

/// Result of a single acquire or renew attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaseObservation {
    /// Identity currently recorded as holder, if any.
    pub holder: Option<String>,
    /// Whether this replica holds the lease after the attempt.
    pub acquired: bool,
}

impl LeaseObservation {
    pub fn acquired(identity: impl Into<String>) -> Self {
        Self {
            holder: Some(identity.into()),
            acquired: true,
        }
    }

    pub fn held_by(holder: Option<String>) -> Self {
        Self {
            holder,
            acquired: false,
        }
    }
}

/// A named, time bounded mutual exclusion record shared by all replicas.
pub trait LeaseLock: Send + Sync + 'static {
    /// Identity this replica competes with.
    fn identity(&self) -> &str;

    /// Human readable name of the lease, e.g. `namespace/name`.
    fn describe(&self) -> String;

    /// Takes the lease if it is free or expired, or renews it if already held.
    fn try_acquire_or_renew(
        &self,
    ) -> impl std::future::Future<Output = Result<LeaseObservation>> + Send;

    /// Gives up the lease if this replica holds it.
    fn release(&self) -> impl std::future::Future<Output = Result<()>> + Send;
}
