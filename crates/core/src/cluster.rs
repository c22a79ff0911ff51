//! `ZookeeperCluster` custom resource and its defaults.

#![forbid(unsafe_code)]

use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::{
    Affinity, ContainerPort, EnvVar, PersistentVolumeClaimSpec, PodSecurityContext,
    ResourceRequirements, Toleration, VolumeResourceRequirements,
};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A replicated ZooKeeper ensemble.
///
/// ```yaml
/// apiVersion: zookeeper.pravega.io/v1beta1
/// kind: ZookeeperCluster
/// metadata:
///   name: zk
/// spec:
///   size: 3
/// ```
#[derive(CustomResource, Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq)]
#[kube(
    group = "zookeeper.pravega.io",
    version = "v1beta1",
    kind = "ZookeeperCluster",
    plural = "zookeeperclusters",
    shortname = "zk",
    namespaced,
    printcolumn = r#"{"name":"Size", "type":"integer", "jsonPath":".spec.size"}"#,
    printcolumn = r#"{"name":"Age", "type":"date", "jsonPath":".metadata.creationTimestamp"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct ZookeeperClusterSpec {
    /// Desired number of ensemble members.
    #[serde(default = "default_size")]
    pub size: i32,

    #[serde(default)]
    pub image: ContainerImage,

    /// Declared container ports. Roles are resolved by name
    /// (`client`, `quorum`, `leader-election`); every entry is exposed on the container.
    #[serde(default = "default_ports")]
    pub ports: Vec<ContainerPort>,

    /// Claim template instantiated once per member and mounted at `/data`.
    #[serde(default = "default_persistence")]
    pub persistence: PersistentVolumeClaimSpec,

    #[serde(default)]
    pub pod: PodPolicy,

    #[serde(default)]
    pub conf: ZookeeperConfig,

    /// Labels placed on the StatefulSet object.
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
}

impl Default for ZookeeperClusterSpec {
    fn default() -> Self {
        Self {
            size: default_size(),
            image: ContainerImage::default(),
            ports: default_ports(),
            persistence: default_persistence(),
            pod: PodPolicy::default(),
            conf: ZookeeperConfig::default(),
            labels: BTreeMap::new(),
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ContainerImage {
    #[serde(default = "default_image_repository")]
    pub repository: String,
    #[serde(default = "default_image_tag")]
    pub tag: String,
    #[serde(default = "default_image_pull_policy")]
    pub pull_policy: String,
}

impl ContainerImage {
    /// `<repository>:<tag>`
    pub fn reference(&self) -> String {
        format!("{}:{}", self.repository, self.tag)
    }
}

impl Default for ContainerImage {
    fn default() -> Self {
        Self {
            repository: default_image_repository(),
            tag: default_image_tag(),
            pull_policy: default_image_pull_policy(),
        }
    }
}

/// Per-member pod overrides.
#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PodPolicy {
    /// Extra labels for member pods. `app` and `kind` are always set by the operator.
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    #[serde(default)]
    pub node_selector: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub affinity: Option<Affinity>,
    #[serde(default)]
    pub resources: ResourceRequirements,
    #[serde(default)]
    pub tolerations: Vec<Toleration>,
    #[serde(default)]
    pub env: Vec<EnvVar>,
    #[serde(default)]
    pub security_context: PodSecurityContext,
    #[serde(default = "default_termination_grace_period")]
    pub termination_grace_period_seconds: i64,
}

impl Default for PodPolicy {
    fn default() -> Self {
        Self {
            labels: BTreeMap::new(),
            node_selector: BTreeMap::new(),
            affinity: None,
            resources: ResourceRequirements::default(),
            tolerations: Vec::new(),
            env: Vec::new(),
            security_context: PodSecurityContext::default(),
            termination_grace_period_seconds: default_termination_grace_period(),
        }
    }
}

/// Values rendered into `zoo.cfg`.
#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ZookeeperConfig {
    /// Ticks a follower may take to connect and sync to the leader.
    #[serde(default = "default_init_limit")]
    pub init_limit: i32,
    /// Length of a single tick in milliseconds.
    #[serde(default = "default_tick_time")]
    pub tick_time: i32,
    /// Ticks a follower may lag behind the leader.
    #[serde(default = "default_sync_limit")]
    pub sync_limit: i32,
}

impl Default for ZookeeperConfig {
    fn default() -> Self {
        Self {
            init_limit: default_init_limit(),
            tick_time: default_tick_time(),
            sync_limit: default_sync_limit(),
        }
    }
}

fn default_size() -> i32 {
    3
}

fn default_image_repository() -> String {
    "emccorp/zookeeper".to_string()
}

fn default_image_tag() -> String {
    "3.5.4-beta-operator".to_string()
}

fn default_image_pull_policy() -> String {
    "IfNotPresent".to_string()
}

fn default_ports() -> Vec<ContainerPort> {
    [("client", 2181), ("quorum", 2888), ("leader-election", 3888)]
        .into_iter()
        .map(|(name, port)| ContainerPort {
            name: Some(name.to_string()),
            container_port: port,
            ..ContainerPort::default()
        })
        .collect()
}

fn default_persistence() -> PersistentVolumeClaimSpec {
    PersistentVolumeClaimSpec {
        access_modes: Some(vec!["ReadWriteOnce".to_string()]),
        resources: Some(VolumeResourceRequirements {
            requests: Some(BTreeMap::from([(
                "storage".to_string(),
                Quantity("20Gi".to_string()),
            )])),
            ..VolumeResourceRequirements::default()
        }),
        ..PersistentVolumeClaimSpec::default()
    }
}

fn default_termination_grace_period() -> i64 {
    30
}

fn default_init_limit() -> i32 {
    10
}

fn default_tick_time() -> i32 {
    2000
}

fn default_sync_limit() -> i32 {
    2
}
