//! Pod observation model.
//!
//! A [`PodState`] is the plain set of fields this tool cares about for a single pod:
//! its name, the node it is scheduled on and its lifecycle phase. A [`PodSnapshot`]
//! wraps one such state behind a read/write lock so it can be shared between workers
//! and replaced wholesale on re-observation.
use std::fmt;
use std::str::FromStr;

use k8s_openapi::api::core::v1::Pod;

mod error;
mod snapshot;

pub use error::{Error, Result};
pub use snapshot::PodSnapshot;

/// Lifecycle phase of a pod as reported by the API server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PodPhase {
    Pending,
    Running,
    Succeeded,
    Failed,
    #[default]
    Unknown,
}

impl PodPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            PodPhase::Pending => "Pending",
            PodPhase::Running => "Running",
            PodPhase::Succeeded => "Succeeded",
            PodPhase::Failed => "Failed",
            PodPhase::Unknown => "Unknown",
        }
    }
}

impl FromStr for PodPhase {
    type Err = Error;

    /// Parses the phase string used by the `core/v1` pod status.
    ///
    /// Matching is exact, mirroring the API server's spelling.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(PodPhase::Pending),
            "Running" => Ok(PodPhase::Running),
            "Succeeded" => Ok(PodPhase::Succeeded),
            "Failed" => Ok(PodPhase::Failed),
            "Unknown" => Ok(PodPhase::Unknown),
            other => Err(Error::InvalidPhase(other.to_owned())),
        }
    }
}

impl fmt::Display for PodPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The observed fields of a single pod.
///
/// An empty `node_name` means the pod has not been scheduled yet.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PodState {
    pub name: String,
    pub node_name: String,
    pub phase: PodPhase,
}

impl PodState {
    pub fn new(name: impl Into<String>, node_name: impl Into<String>, phase: PodPhase) -> Self {
        Self {
            name: name.into(),
            node_name: node_name.into(),
            phase,
        }
    }
}

impl From<&Pod> for PodState {
    /// Extracts name, node and phase from a full pod object.
    ///
    /// Missing fields map to their empty value; a missing or unrecognized phase maps
    /// to [`PodPhase::Unknown`].
    fn from(pod: &Pod) -> Self {
        let name = pod.metadata.name.clone().unwrap_or_default();
        let node_name = pod
            .spec
            .as_ref()
            .and_then(|spec| spec.node_name.clone())
            .unwrap_or_default();
        let phase = match pod.status.as_ref().and_then(|status| status.phase.as_deref()) {
            Some(raw) => raw.parse().unwrap_or_else(|err| {
                log::debug!("pod `{}`: {}", name, err);
                PodPhase::Unknown
            }),
            None => PodPhase::Unknown,
        };

        Self {
            name,
            node_name,
            phase,
        }
    }
}
