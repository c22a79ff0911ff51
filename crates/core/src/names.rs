//! Deterministic names, labels and the ownership link shared by every
//! object synthesized for one cluster.

#![forbid(unsafe_code)]

use std::collections::BTreeMap;

use k8s_openapi::apimachinery::pkg::apis::meta::v1::{ObjectMeta, OwnerReference};
use kube::{Resource, ResourceExt};

use crate::cluster::ZookeeperCluster;

/// Value of the `kind` label carried by member pods.
pub const MEMBER_KIND: &str = "ZookeeperMember";

pub fn config_map_name(zk: &ZookeeperCluster) -> String {
    format!("{}-configmap", zk.name_any())
}

pub fn headless_service_name(zk: &ZookeeperCluster) -> String {
    format!("{}-headless", zk.name_any())
}

pub fn client_service_name(zk: &ZookeeperCluster) -> String {
    format!("{}-client", zk.name_any())
}

/// StatefulSet and PodDisruptionBudget share the cluster name.
pub fn workload_name(zk: &ZookeeperCluster) -> String {
    zk.name_any()
}

/// Namespace of the cluster; `default` when unset.
pub fn namespace(zk: &ZookeeperCluster) -> String {
    zk.namespace().unwrap_or_else(|| "default".to_string())
}

/// `<name>-headless.<namespace>.svc.cluster.local`
pub fn headless_domain(zk: &ZookeeperCluster) -> String {
    format!("{}.{}.svc.cluster.local", headless_service_name(zk), namespace(zk))
}

/// `app=<name>`, the selector shared by every synthesized object.
pub fn app_labels(zk: &ZookeeperCluster) -> BTreeMap<String, String> {
    BTreeMap::from([("app".to_string(), zk.name_any())])
}

/// Pod template labels: user labels overlaid with `app` and `kind`.
pub fn member_labels(zk: &ZookeeperCluster) -> BTreeMap<String, String> {
    let mut labels = zk.spec.pod.labels.clone();
    labels.extend(app_labels(zk));
    labels.insert("kind".to_string(), MEMBER_KIND.to_string());
    labels
}

/// Controller reference back to the cluster, consumed by the garbage collector.
/// An object without a uid still gets a link (with an empty uid); rejection is
/// left to the API server.
pub fn owner_reference(zk: &ZookeeperCluster) -> OwnerReference {
    OwnerReference {
        api_version: ZookeeperCluster::api_version(&()).to_string(),
        kind: ZookeeperCluster::kind(&()).to_string(),
        name: zk.name_any(),
        uid: zk.uid().unwrap_or_default(),
        controller: Some(true),
        block_owner_deletion: Some(true),
    }
}

/// Metadata for an owned object: name, cluster namespace and owner link.
pub fn owned_meta(zk: &ZookeeperCluster, name: String) -> ObjectMeta {
    ObjectMeta {
        name: Some(name),
        namespace: Some(namespace(zk)),
        owner_references: Some(vec![owner_reference(zk)]),
        ..ObjectMeta::default()
    }
}
