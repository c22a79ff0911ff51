//! Member pod template: one `zookeeper` container plus the cluster overrides.

use k8s_openapi::api::core::v1::{
    ConfigMapVolumeSource, Container, ExecAction, Lifecycle, LifecycleHandler, PodSecurityContext,
    PodSpec, Probe, Volume, VolumeMount,
};
use zkop_core::ZookeeperCluster;

pub const CONTAINER_NAME: &str = "zookeeper";
pub const DATA_VOLUME: &str = "data";
pub const CONF_VOLUME: &str = "conf";
pub const DATA_MOUNT_PATH: &str = "/data";
pub const CONF_MOUNT_PATH: &str = "/conf";

pub const START_SCRIPT: &str = "/usr/local/bin/zookeeperStart.sh";
pub const READY_SCRIPT: &str = "zookeeperReady.sh";
pub const LIVE_SCRIPT: &str = "zookeeperLive.sh";
pub const TEARDOWN_SCRIPT: &str = "zookeeperTeardown.sh";

/// Initial delay and timeout, in seconds, for both probes.
const PROBE_SECONDS: i32 = 10;

fn exec(script: &str) -> ExecAction {
    ExecAction { command: Some(vec![script.to_string()]) }
}

fn probe(script: &str) -> Probe {
    Probe {
        exec: Some(exec(script)),
        initial_delay_seconds: Some(PROBE_SECONDS),
        timeout_seconds: Some(PROBE_SECONDS),
        ..Probe::default()
    }
}

pub fn container(zk: &ZookeeperCluster) -> Container {
    let spec = &zk.spec;
    let resources = &spec.pod.resources;
    let has_resources = resources.limits.is_some() || resources.requests.is_some();
    Container {
        name: CONTAINER_NAME.to_string(),
        image: Some(spec.image.reference()),
        image_pull_policy: Some(spec.image.pull_policy.clone()),
        // every declared port, not only the resolved roles
        ports: Some(spec.ports.clone()),
        command: Some(vec![START_SCRIPT.to_string()]),
        readiness_probe: Some(probe(READY_SCRIPT)),
        liveness_probe: Some(probe(LIVE_SCRIPT)),
        lifecycle: Some(Lifecycle {
            pre_stop: Some(LifecycleHandler { exec: Some(exec(TEARDOWN_SCRIPT)), ..LifecycleHandler::default() }),
            ..Lifecycle::default()
        }),
        volume_mounts: Some(vec![
            VolumeMount { name: DATA_VOLUME.to_string(), mount_path: DATA_MOUNT_PATH.to_string(), ..VolumeMount::default() },
            VolumeMount { name: CONF_VOLUME.to_string(), mount_path: CONF_MOUNT_PATH.to_string(), ..VolumeMount::default() },
        ]),
        resources: has_resources.then(|| resources.clone()),
        env: (!spec.pod.env.is_empty()).then(|| spec.pod.env.clone()),
        ..Container::default()
    }
}

pub fn pod_spec(zk: &ZookeeperCluster, config_map_name: &str) -> PodSpec {
    let pod = &zk.spec.pod;
    // an all-default security context is left unset rather than written out
    let security_context = (pod.security_context != PodSecurityContext::default()).then(|| pod.security_context.clone());
    PodSpec {
        containers: vec![container(zk)],
        affinity: pod.affinity.clone(),
        volumes: Some(vec![Volume {
            name: CONF_VOLUME.to_string(),
            config_map: Some(ConfigMapVolumeSource {
                name: Some(config_map_name.to_string()),
                ..ConfigMapVolumeSource::default()
            }),
            ..Volume::default()
        }]),
        termination_grace_period_seconds: Some(pod.termination_grace_period_seconds),
        security_context,
        node_selector: (!pod.node_selector.is_empty()).then(|| pod.node_selector.clone()),
        tolerations: (!pod.tolerations.is_empty()).then(|| pod.tolerations.clone()),
        ..PodSpec::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    use k8s_openapi::api::core::v1::{EnvVar, Toleration};
    use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
    use zkop_core::ZookeeperClusterSpec;

    fn cluster() -> ZookeeperCluster {
        ZookeeperCluster::new("zk", ZookeeperClusterSpec::default())
    }

    #[test]
    fn container_wires_scripts_probes_and_mounts() {
        let c = container(&cluster());
        assert_eq!(c.name, "zookeeper");
        assert_eq!(c.image.as_deref(), Some("emccorp/zookeeper:3.5.4-beta-operator"));
        assert_eq!(c.command, Some(vec![START_SCRIPT.to_string()]));
        for (p, script) in [(c.readiness_probe.as_ref(), READY_SCRIPT), (c.liveness_probe.as_ref(), LIVE_SCRIPT)] {
            let p = p.unwrap();
            assert_eq!(p.initial_delay_seconds, Some(10));
            assert_eq!(p.timeout_seconds, Some(10));
            assert_eq!(p.exec.as_ref().unwrap().command, Some(vec![script.to_string()]));
        }
        let pre_stop = c.lifecycle.unwrap().pre_stop.unwrap();
        assert_eq!(pre_stop.exec.unwrap().command, Some(vec![TEARDOWN_SCRIPT.to_string()]));
        let mounts: Vec<(String, String)> = c.volume_mounts.unwrap().into_iter().map(|m| (m.name, m.mount_path)).collect();
        assert_eq!(mounts, vec![("data".into(), "/data".into()), ("conf".into(), "/conf".into())]);
    }

    #[test]
    fn container_exposes_all_declared_ports() {
        let mut zk = cluster();
        zk.spec.ports.push(k8s_openapi::api::core::v1::ContainerPort {
            name: Some("metrics".into()),
            container_port: 7000,
            ..Default::default()
        });
        assert_eq!(container(&zk).ports.unwrap().len(), 4);
    }

    #[test]
    fn resources_only_when_declared() {
        let mut zk = cluster();
        assert!(container(&zk).resources.is_none());
        zk.spec.pod.resources.limits = Some(BTreeMap::from([("memory".to_string(), Quantity("1Gi".into()))]));
        assert!(container(&zk).resources.unwrap().limits.is_some());
    }

    #[test]
    fn security_context_only_when_not_default() {
        let mut zk = cluster();
        assert!(pod_spec(&zk, "zk-configmap").security_context.is_none());
        zk.spec.pod.security_context.run_as_user = Some(1000);
        assert_eq!(pod_spec(&zk, "zk-configmap").security_context.unwrap().run_as_user, Some(1000));
    }

    #[test]
    fn pod_overrides_are_carried() {
        let mut zk = cluster();
        zk.spec.pod.env = vec![EnvVar { name: "JVMFLAGS".into(), value: Some("-Xmx1g".into()), ..Default::default() }];
        zk.spec.pod.node_selector.insert("disk".into(), "ssd".into());
        zk.spec.pod.tolerations = vec![Toleration { key: Some("dedicated".into()), ..Default::default() }];
        zk.spec.pod.termination_grace_period_seconds = 60;
        let spec = pod_spec(&zk, "zk-configmap");
        assert_eq!(spec.containers.len(), 1);
        assert_eq!(spec.containers[0].env.as_ref().unwrap()[0].name, "JVMFLAGS");
        assert_eq!(spec.node_selector.unwrap().get("disk").map(String::as_str), Some("ssd"));
        assert_eq!(spec.tolerations.unwrap().len(), 1);
        assert_eq!(spec.termination_grace_period_seconds, Some(60));
        let vol = &spec.volumes.unwrap()[0];
        assert_eq!(vol.name, "conf");
        assert_eq!(vol.config_map.as_ref().unwrap().name.as_deref(), Some("zk-configmap"));
    }
}
