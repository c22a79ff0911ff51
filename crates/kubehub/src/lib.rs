//! zkop kubehub: client bootstrap and the live `ResourceApplier`.

#![forbid(unsafe_code)]

use std::fmt::Debug;

use anyhow::{anyhow, Context, Result};
use k8s_openapi::NamespaceResourceScope;
use kube::{
    api::{Api, PostParams},
    Client, Resource,
};
use metrics::counter;
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, info};
use zkop_core::{ApplyError, DesiredResource, ResourceApplier, ZookeeperCluster};

fn field_manager() -> String {
    std::env::var("ZKOP_FIELD_MANAGER")
        .ok()
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "zkop".to_string())
}

/// Client from the ambient kubeconfig or in-cluster service account.
pub async fn get_kube_client() -> Result<Client> {
    Client::try_default().await.context("building kube client from default config")
}

/// Read a `ZookeeperCluster` from the API server, so the owner uid is the live one.
pub async fn fetch_cluster(client: Client, namespace: &str, name: &str) -> Result<ZookeeperCluster> {
    let api: Api<ZookeeperCluster> = Api::namespaced(client, namespace);
    let zk = api
        .get(name)
        .await
        .with_context(|| format!("fetching ZookeeperCluster {}/{}", namespace, name))?;
    info!(ns = %namespace, name = %name, "fetched cluster");
    Ok(zk)
}

/// True when the API server refused a create because the object is already there.
pub fn is_already_exists(err: &kube::Error) -> bool {
    matches!(err, kube::Error::Api(ae) if ae.code == 409 && ae.reason == "AlreadyExists")
}

/// Creates objects with plain POSTs; never patches or updates.
pub struct KubeApplier {
    client: Client,
    dry_run: bool,
    field_manager: String,
}

impl KubeApplier {
    pub fn new(client: Client) -> Self {
        Self { client, dry_run: false, field_manager: field_manager() }
    }

    /// Ask the server to validate creates without persisting them.
    pub fn with_dry_run(mut self, on: bool) -> Self {
        self.dry_run = on;
        self
    }

    fn post_params(&self) -> PostParams {
        PostParams { dry_run: self.dry_run, field_manager: Some(self.field_manager.clone()) }
    }

    async fn create_in<K>(&self, res: &DesiredResource, obj: &K) -> Result<(), ApplyError>
    where
        K: Resource<Scope = NamespaceResourceScope> + Clone + Debug + Serialize + DeserializeOwned,
        <K as Resource>::DynamicType: Default,
    {
        let ns = res
            .namespace()
            .ok_or_else(|| ApplyError::Other(anyhow!("{} {} has no namespace", res.kind(), res.name())))?;
        let api: Api<K> = Api::namespaced(self.client.clone(), ns);
        match api.create(&self.post_params(), obj).await {
            Ok(_) => {
                counter!("kube_create_ok", 1u64, "kind" => res.kind());
                debug!(kind = res.kind(), name = res.name(), ns = %ns, dry_run = self.dry_run, "created");
                Ok(())
            }
            Err(e) if is_already_exists(&e) => {
                counter!("kube_create_exists", 1u64, "kind" => res.kind());
                Err(ApplyError::already_exists(res))
            }
            Err(e) => {
                counter!("kube_create_err", 1u64, "kind" => res.kind());
                Err(ApplyError::Other(e.into()))
            }
        }
    }
}

#[async_trait::async_trait]
impl ResourceApplier for KubeApplier {
    async fn create(&self, resource: &DesiredResource) -> Result<(), ApplyError> {
        match resource {
            DesiredResource::ConfigMap(o) => self.create_in(resource, o).await,
            DesiredResource::StatefulSet(o) => self.create_in(resource, o).await,
            DesiredResource::PodDisruptionBudget(o) => self.create_in(resource, o).await,
            DesiredResource::Service(o) => self.create_in(resource, o).await,
        }
    }
}
