use k8s_openapi::api::core::v1::Pod;
use kube::Client;
use kube::api::{Api, ListParams};

use super::{Error, Result};
use crate::pod::PodState;

/// Source of the current pod list.
pub trait PodLister {
    /// Returns every pod across all namespaces as of the time of the call.
    fn list_pods(&self) -> impl std::future::Future<Output = Result<Vec<PodState>>> + Send;
}

/// Lists pods through the Kubernetes API with a single unpaginated request.
#[derive(Clone)]
pub struct KubePodLister {
    client: Client,
}

impl KubePodLister {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

impl PodLister for KubePodLister {
    /// # Errors
    ///
    /// Returns [`Error::Query`] if the list request fails.
    async fn list_pods(&self) -> Result<Vec<PodState>> {
        let pods: Api<Pod> = Api::all(self.client.clone());
        let list = pods
            .list(&ListParams::default())
            .await
            .map_err(Error::Query)?;
        log::debug!("Listed {} pods", list.items.len());

        Ok(list.items.iter().map(PodState::from).collect())
    }
}
