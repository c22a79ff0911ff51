//! Ordered, stable-identity replica group for the ensemble.

use k8s_openapi::api::apps::v1::{StatefulSet, StatefulSetSpec, StatefulSetUpdateStrategy};
use k8s_openapi::api::core::v1::{PersistentVolumeClaim, PodTemplateSpec};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{LabelSelector, ObjectMeta};
use kube::ResourceExt;
use zkop_core::{names, ZookeeperCluster};

use crate::pod;

/// Members start and stop one by one, in ordinal order.
pub const POD_MANAGEMENT_POLICY: &str = "OrderedReady";
pub const UPDATE_STRATEGY: &str = "RollingUpdate";

pub fn stateful_set(zk: &ZookeeperCluster, config_map_name: &str) -> StatefulSet {
    let mut metadata = names::owned_meta(zk, names::workload_name(zk));
    metadata.labels = (!zk.spec.labels.is_empty()).then(|| zk.spec.labels.clone());

    StatefulSet {
        metadata,
        spec: Some(StatefulSetSpec {
            service_name: names::headless_service_name(zk),
            replicas: Some(zk.spec.size),
            selector: LabelSelector { match_labels: Some(names::app_labels(zk)), ..LabelSelector::default() },
            update_strategy: Some(StatefulSetUpdateStrategy {
                type_: Some(UPDATE_STRATEGY.to_string()),
                ..StatefulSetUpdateStrategy::default()
            }),
            pod_management_policy: Some(POD_MANAGEMENT_POLICY.to_string()),
            template: PodTemplateSpec {
                metadata: Some(ObjectMeta {
                    generate_name: Some(zk.name_any()),
                    labels: Some(names::member_labels(zk)),
                    ..ObjectMeta::default()
                }),
                spec: Some(pod::pod_spec(zk, config_map_name)),
            },
            volume_claim_templates: Some(vec![PersistentVolumeClaim {
                metadata: ObjectMeta {
                    name: Some(pod::DATA_VOLUME.to_string()),
                    labels: Some(names::app_labels(zk)),
                    ..ObjectMeta::default()
                },
                spec: Some(zk.spec.persistence.clone()),
                ..PersistentVolumeClaim::default()
            }]),
            ..StatefulSetSpec::default()
        }),
        ..StatefulSet::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use zkop_core::ZookeeperClusterSpec;

    fn cluster(size: i32) -> ZookeeperCluster {
        let mut zk = ZookeeperCluster::new("zk", ZookeeperClusterSpec { size, ..Default::default() });
        zk.metadata.namespace = Some("infra".into());
        zk
    }

    #[test]
    fn ordered_rolling_replica_group() {
        let sts = stateful_set(&cluster(5), "zk-configmap");
        assert_eq!(sts.metadata.name.as_deref(), Some("zk"));
        assert_eq!(sts.metadata.namespace.as_deref(), Some("infra"));
        let spec = sts.spec.unwrap();
        assert_eq!(spec.replicas, Some(5));
        assert_eq!(spec.service_name, "zk-headless");
        assert_eq!(spec.pod_management_policy.as_deref(), Some("OrderedReady"));
        assert_eq!(spec.update_strategy.unwrap().type_.as_deref(), Some("RollingUpdate"));
        assert_eq!(spec.selector.match_labels.unwrap().get("app").map(String::as_str), Some("zk"));
    }

    #[test]
    fn template_labels_match_selector() {
        let spec = stateful_set(&cluster(3), "zk-configmap").spec.unwrap();
        let selector = spec.selector.match_labels.unwrap();
        let labels = spec.template.metadata.unwrap().labels.unwrap();
        for (k, v) in selector {
            assert_eq!(labels.get(&k), Some(&v));
        }
        assert_eq!(labels.get("kind").map(String::as_str), Some(names::MEMBER_KIND));
    }

    #[test]
    fn one_claim_template_named_data() {
        let zk = cluster(3);
        let claims = stateful_set(&zk, "zk-configmap").spec.unwrap().volume_claim_templates.unwrap();
        assert_eq!(claims.len(), 1);
        assert_eq!(claims[0].metadata.name.as_deref(), Some("data"));
        assert_eq!(claims[0].spec.as_ref(), Some(&zk.spec.persistence));
    }

    #[test]
    fn cluster_labels_land_on_the_workload() {
        let mut zk = cluster(3);
        assert!(stateful_set(&zk, "c").metadata.labels.is_none());
        zk.spec.labels.insert("tier".into(), "coord".into());
        let labels = stateful_set(&zk, "c").metadata.labels.unwrap();
        assert_eq!(labels.get("tier").map(String::as_str), Some("coord"));
    }
}
