//! zkop synth: derive every Kubernetes object a `ZookeeperCluster` needs.
//!
//! Synthesis is a pure function of the cluster object. Names come from
//! [`zkop_core::names`], ports are resolved once and shared by the ConfigMap
//! and both Services, and every object carries the controller owner link.

#![forbid(unsafe_code)]

pub mod config;
pub mod pdb;
pub mod pod;
pub mod service;
pub mod statefulset;

use k8s_openapi::api::apps::v1::StatefulSet;
use k8s_openapi::api::core::v1::{ConfigMap, Service};
use k8s_openapi::api::policy::v1::PodDisruptionBudget;
use kube::ResourceExt;
use serde::Serialize;
use tracing::warn;
use zkop_core::{names, DesiredResource, PortRoleMap, ZookeeperCluster};

pub use config::ConfigArtifacts;

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DesiredResourceSet {
    pub config_map: ConfigMap,
    pub stateful_set: StatefulSet,
    pub disruption_budget: PodDisruptionBudget,
    pub client_service: Service,
    pub headless_service: Service,
}

impl DesiredResourceSet {
    /// Objects in creation order.
    pub fn into_ordered(self) -> [DesiredResource; 5] {
        [
            DesiredResource::ConfigMap(self.config_map),
            DesiredResource::StatefulSet(self.stateful_set),
            DesiredResource::PodDisruptionBudget(self.disruption_budget),
            DesiredResource::Service(self.client_service),
            DesiredResource::Service(self.headless_service),
        ]
    }
}

/// Build the full object set for `zk`.
pub fn synthesize(zk: &ZookeeperCluster) -> DesiredResourceSet {
    let ports = PortRoleMap::resolve(&zk.spec.ports);
    for role in ports.unset() {
        warn!(cluster = %zk.name_any(), role = role.port_name(), "port role not declared; rendering port 0");
    }
    let cm_name = names::config_map_name(zk);
    DesiredResourceSet {
        config_map: config::config_map(zk, cm_name.clone(), &ports),
        stateful_set: statefulset::stateful_set(zk, &cm_name),
        disruption_budget: pdb::disruption_budget(zk),
        client_service: service::client_service(zk, &ports),
        headless_service: service::headless_service(zk, &ports),
    }
}
