use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use k8s_openapi::api::coordination::v1::{Lease, LeaseSpec};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::MicroTime;
use kube::api::{Api, ObjectMeta, Patch, PatchParams, PostParams};
use kube::Client;
use tokio::time::Instant;

use super::{Error, LeaseLock, LeaseObservation, Result};

const HTTP_CONFLICT: u16 = 409;

/// A [`LeaseLock`] backed by a `coordination.k8s.io/v1` lease object.
///
/// Expiry is judged against the local clock: a lease counts as expired once its
/// holder and renew time have not changed for a full lease duration since this
/// replica first saw them. Updates carry the fetched `resourceVersion`, so of two
/// replicas racing for the same record only one succeeds.
pub struct KubeLeaseLock {
    api: Api<Lease>,
    namespace: String,
    name: String,
    identity: String,
    lease_duration: Duration,
    observed: Mutex<Option<ObservedRecord>>,
}

/// Holder and renew time of the lease as last seen, with the local time they were
/// first seen at.
#[derive(Debug, Clone)]
struct ObservedRecord {
    holder: Option<String>,
    renew_time: Option<MicroTime>,
    observed_at: Instant,
}

impl ObservedRecord {
    /// Stores `spec` as the current observation if it differs from the previous one and
    /// returns the time the current record was first observed.
    fn refresh(slot: &mut Option<ObservedRecord>, spec: &LeaseSpec, now: Instant) -> Instant {
        match slot {
            Some(record)
                if record.holder == spec.holder_identity
                    && record.renew_time == spec.renew_time =>
            {
                record.observed_at
            }
            _ => {
                *slot = Some(ObservedRecord {
                    holder: spec.holder_identity.clone(),
                    renew_time: spec.renew_time.clone(),
                    observed_at: now,
                });
                now
            }
        }
    }
}

impl KubeLeaseLock {
    /// Creates a lock on the lease `namespace/name`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyIdentity`] if `identity` is empty.
    pub fn new(
        client: Client,
        namespace: impl Into<String>,
        name: impl Into<String>,
        identity: impl Into<String>,
        lease_duration: Duration,
    ) -> Result<Self> {
        let identity = identity.into();
        if identity.is_empty() {
            return Err(Error::EmptyIdentity);
        }
        let namespace = namespace.into();

        Ok(Self {
            api: Api::namespaced(client, &namespace),
            namespace,
            name: name.into(),
            identity,
            lease_duration,
            observed: Mutex::new(None),
        })
    }

    fn lease_error(&self, source: kube::Error) -> Error {
        Error::Lease {
            lease: self.describe(),
            source,
        }
    }

    /// Records the fetched spec and reports whether the holder let it expire.
    fn is_expired(&self, spec: &LeaseSpec) -> bool {
        let now = Instant::now();
        let mut observed = self.observed.lock().unwrap_or_else(PoisonError::into_inner);
        let observed_at = ObservedRecord::refresh(&mut observed, spec, now);
        let duration = spec
            .lease_duration_seconds
            .and_then(|secs| u64::try_from(secs).ok())
            .map(Duration::from_secs)
            .unwrap_or(self.lease_duration);

        observed_at + duration <= now
    }

    fn remember(&self, spec: &LeaseSpec) {
        let mut observed = self.observed.lock().unwrap_or_else(PoisonError::into_inner);
        ObservedRecord::refresh(&mut observed, spec, Instant::now());
    }

    async fn create(&self) -> Result<LeaseObservation> {
        let spec = new_spec(&self.identity, self.lease_duration, Utc::now());
        let lease = Lease {
            metadata: ObjectMeta {
                name: Some(self.name.clone()),
                namespace: Some(self.namespace.clone()),
                ..Default::default()
            },
            spec: Some(spec.clone()),
        };

        match self.api.create(&PostParams::default(), &lease).await {
            Ok(_) => {
                self.remember(&spec);
                Ok(LeaseObservation::acquired(self.identity.as_str()))
            }
            Err(kube::Error::Api(resp)) if resp.code == HTTP_CONFLICT => {
                log::debug!("lease {} was created concurrently", self.describe());
                Ok(LeaseObservation::held_by(None))
            }
            Err(err) => Err(self.lease_error(err)),
        }
    }

    async fn update(&self, mut lease: Lease) -> Result<LeaseObservation> {
        let current = lease.spec.take().unwrap_or_default();
        let expired = self.is_expired(&current);

        let decision = decide(&current, &self.identity, expired);
        if let Decision::Defer(holder) = &decision {
            return Ok(LeaseObservation::held_by(Some(holder.clone())));
        }

        let spec = renewed_spec(&current, &self.identity, self.lease_duration, Utc::now());
        lease.spec = Some(spec.clone());
        match self
            .api
            .replace(&self.name, &PostParams::default(), &lease)
            .await
        {
            Ok(_) => {
                self.remember(&spec);
                Ok(LeaseObservation::acquired(self.identity.as_str()))
            }
            Err(err) => match conflict_observation(&decision, &current, &err) {
                Some(observation) => {
                    log::debug!("lease {} was taken over concurrently", self.describe());
                    Ok(observation)
                }
                None => Err(self.lease_error(err)),
            },
        }
    }
}

/// What to do with a fetched lease record.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Decision {
    /// We hold the lease and write a new renew time.
    Renew,
    /// The lease is free or expired and we write ourselves as holder.
    TakeOver,
    /// Another identity holds a live lease.
    Defer(String),
}

fn decide(current: &LeaseSpec, identity: &str, expired: bool) -> Decision {
    match current.holder_identity.as_deref() {
        Some(holder) if holder == identity => Decision::Renew,
        Some(holder) if !holder.is_empty() && !expired => Decision::Defer(holder.to_owned()),
        _ => Decision::TakeOver,
    }
}

/// Maps a failed replace to "not acquired" when another writer won a takeover race.
///
/// A conflict on our own renewal is returned as an error, so the renew deadline
/// decides whether leadership is lost.
fn conflict_observation(
    decision: &Decision,
    current: &LeaseSpec,
    err: &kube::Error,
) -> Option<LeaseObservation> {
    match err {
        kube::Error::Api(resp) if resp.code == HTTP_CONFLICT && *decision == Decision::TakeOver => {
            let holder = current
                .holder_identity
                .clone()
                .filter(|holder| !holder.is_empty());
            Some(LeaseObservation::held_by(holder))
        }
        _ => None,
    }
}

impl LeaseLock for KubeLeaseLock {
    fn identity(&self) -> &str {
        &self.identity
    }

    fn describe(&self) -> String {
        format!("{}/{}", self.namespace, self.name)
    }

    async fn try_acquire_or_renew(&self) -> Result<LeaseObservation> {
        match self
            .api
            .get_opt(&self.name)
            .await
            .map_err(|err| self.lease_error(err))?
        {
            None => self.create().await,
            Some(lease) => self.update(lease).await,
        }
    }

    /// Clears the holder so followers can take over without waiting for expiry.
    async fn release(&self) -> Result<()> {
        let Some(lease) = self
            .api
            .get_opt(&self.name)
            .await
            .map_err(|err| self.lease_error(err))?
        else {
            return Ok(());
        };

        let holder = lease
            .spec
            .as_ref()
            .and_then(|spec| spec.holder_identity.as_deref());
        if holder != Some(self.identity.as_str()) {
            return Ok(());
        }

        let patch = release_patch(lease.metadata.resource_version.as_deref(), Utc::now());
        self.api
            .patch(&self.name, &PatchParams::default(), &Patch::Merge(&patch))
            .await
            .map_err(|err| self.lease_error(err))?;
        log::info!("released lease {}", self.describe());
        Ok(())
    }
}

fn duration_seconds(duration: Duration) -> i32 {
    i32::try_from(duration.as_secs()).unwrap_or(i32::MAX)
}

/// Spec of a freshly created lease held by `identity`.
fn new_spec(identity: &str, lease_duration: Duration, now: DateTime<Utc>) -> LeaseSpec {
    LeaseSpec {
        holder_identity: Some(identity.to_owned()),
        lease_duration_seconds: Some(duration_seconds(lease_duration)),
        acquire_time: Some(MicroTime(now)),
        renew_time: Some(MicroTime(now)),
        lease_transitions: Some(0),
        ..Default::default()
    }
}

/// Spec after `identity` renewed or took over `current`.
///
/// The acquire time and transition count only change when the holder changes.
fn renewed_spec(
    current: &LeaseSpec,
    identity: &str,
    lease_duration: Duration,
    now: DateTime<Utc>,
) -> LeaseSpec {
    let renewal = current.holder_identity.as_deref() == Some(identity);
    let (acquire_time, lease_transitions) = if renewal {
        (current.acquire_time.clone(), current.lease_transitions)
    } else {
        (
            Some(MicroTime(now)),
            Some(current.lease_transitions.unwrap_or(0) + 1),
        )
    };

    LeaseSpec {
        holder_identity: Some(identity.to_owned()),
        lease_duration_seconds: Some(duration_seconds(lease_duration)),
        acquire_time,
        renew_time: Some(MicroTime(now)),
        lease_transitions,
        ..current.clone()
    }
}

fn release_patch(resource_version: Option<&str>, now: DateTime<Utc>) -> serde_json::Value {
    serde_json::json!({
        "metadata": {
            "resourceVersion": resource_version,
        },
        "spec": {
            "holderIdentity": null,
            "leaseDurationSeconds": 1,
            "renewTime": MicroTime(now),
        },
    })
}
