//! Cluster API access.
//!
//! Builds a [`kube::Client`] either from the pod's service account or from a local
//! kubeconfig, and lists the pods a logging pass works on.
mod client;
mod error;
mod lister;

pub use client::{connect_in_cluster, connect_local};
pub use error::{Error, Result};
pub use lister::{KubePodLister, PodLister};
