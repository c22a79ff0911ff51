//! Client and headless Services. Both read ports from the same `PortRoleMap`
//! as the ConfigMap so the numbers cannot drift apart.

use k8s_openapi::api::core::v1::{Service, ServicePort, ServiceSpec};
use zkop_core::{names, PortRole, PortRoleMap, ZookeeperCluster};

fn service_port(ports: &PortRoleMap, role: PortRole) -> ServicePort {
    ServicePort {
        name: Some(role.port_name().to_string()),
        port: ports.port(role),
        ..ServicePort::default()
    }
}

fn service(zk: &ZookeeperCluster, name: String, ports: Vec<ServicePort>, headless: bool) -> Service {
    let mut metadata = names::owned_meta(zk, name);
    metadata.labels = Some(names::app_labels(zk));
    Service {
        metadata,
        spec: Some(ServiceSpec {
            ports: Some(ports),
            selector: Some(names::app_labels(zk)),
            cluster_ip: headless.then(|| "None".to_string()),
            ..ServiceSpec::default()
        }),
        ..Service::default()
    }
}

/// Load-balanced endpoint exposing only the client port.
pub fn client_service(zk: &ZookeeperCluster, ports: &PortRoleMap) -> Service {
    service(zk, names::client_service_name(zk), vec![service_port(ports, PortRole::Client)], false)
}

/// Endpoint without a virtual IP; gives each member a stable DNS name for peer discovery.
pub fn headless_service(zk: &ZookeeperCluster, ports: &PortRoleMap) -> Service {
    let svc_ports = vec![service_port(ports, PortRole::Quorum), service_port(ports, PortRole::LeaderElection)];
    service(zk, names::headless_service_name(zk), svc_ports, true)
}
