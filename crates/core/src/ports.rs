//! Port role resolution.
//!
//! A cluster declares an ordered list of container ports. Three of them carry
//! meaning for the ensemble and are looked up by exact name. Resolution never
//! fails: a role that is not declared stays unset and renders as port 0.
//! Duplicate names are tolerated; the first declaration of a role wins.

#![forbid(unsafe_code)]

use k8s_openapi::api::core::v1::ContainerPort;
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum PortRole {
    Client,
    Quorum,
    LeaderElection,
}

impl PortRole {
    pub const ALL: [PortRole; 3] = [PortRole::Client, PortRole::Quorum, PortRole::LeaderElection];

    /// Port name used both for lookup and for the exposed service ports.
    pub fn port_name(self) -> &'static str {
        match self {
            PortRole::Client => "client",
            PortRole::Quorum => "quorum",
            PortRole::LeaderElection => "leader-election",
        }
    }

    pub fn from_port_name(name: &str) -> Option<Self> {
        PortRole::ALL.into_iter().find(|r| r.port_name() == name)
    }
}

/// Resolved port per role. `None` means the role was not declared.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PortRoleMap {
    client: Option<i32>,
    quorum: Option<i32>,
    leader: Option<i32>,
}

impl PortRoleMap {
    /// Single pass over `ports`; first match per role wins.
    pub fn resolve(ports: &[ContainerPort]) -> Self {
        let mut map = PortRoleMap::default();
        for p in ports {
            let Some(role) = p.name.as_deref().and_then(PortRole::from_port_name) else { continue };
            let slot = map.slot_mut(role);
            match slot {
                None => *slot = Some(p.container_port),
                Some(first) => {
                    debug!(role = role.port_name(), kept = *first, ignored = p.container_port, "duplicate port role ignored");
                }
            }
        }
        map
    }

    pub fn get(&self, role: PortRole) -> Option<i32> {
        match role {
            PortRole::Client => self.client,
            PortRole::Quorum => self.quorum,
            PortRole::LeaderElection => self.leader,
        }
    }

    /// Port number for `role`, 0 when unset.
    pub fn port(&self, role: PortRole) -> i32 {
        self.get(role).unwrap_or(0)
    }

    pub fn client(&self) -> i32 { self.port(PortRole::Client) }
    pub fn quorum(&self) -> i32 { self.port(PortRole::Quorum) }
    pub fn leader(&self) -> i32 { self.port(PortRole::LeaderElection) }

    /// Roles with no declared port, in role order.
    pub fn unset(&self) -> Vec<PortRole> {
        PortRole::ALL.into_iter().filter(|r| self.get(*r).is_none()).collect()
    }

    fn slot_mut(&mut self, role: PortRole) -> &mut Option<i32> {
        match role {
            PortRole::Client => &mut self.client,
            PortRole::Quorum => &mut self.quorum,
            PortRole::LeaderElection => &mut self.leader,
        }
    }
}
