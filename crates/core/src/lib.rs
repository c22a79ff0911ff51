//! zkop core: the `ZookeeperCluster` resource, port roles, naming and the apply seam.

#![forbid(unsafe_code)]

pub mod cluster;
pub mod names;
pub mod ports;
pub mod resource;

pub use cluster::{ContainerImage, PodPolicy, ZookeeperCluster, ZookeeperClusterSpec, ZookeeperConfig};
pub use ports::{PortRole, PortRoleMap};
pub use resource::{ApplyError, DesiredResource, ResourceApplier};

pub mod prelude {
    pub use super::{
        ApplyError, DesiredResource, PortRole, PortRoleMap, ResourceApplier, ZookeeperCluster,
        ZookeeperClusterSpec,
    };
}
