//! Typed desired objects and the create-only apply seam.

#![forbid(unsafe_code)]

use k8s_openapi::api::apps::v1::StatefulSet;
use k8s_openapi::api::core::v1::{ConfigMap, Service};
use k8s_openapi::api::policy::v1::PodDisruptionBudget;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{ObjectMeta, OwnerReference};
use serde::Serialize;
use thiserror::Error;

/// One synthesized object, ready to be created.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(untagged)]
pub enum DesiredResource {
    ConfigMap(ConfigMap),
    StatefulSet(StatefulSet),
    PodDisruptionBudget(PodDisruptionBudget),
    Service(Service),
}

impl DesiredResource {
    pub fn kind(&self) -> &'static str {
        match self {
            DesiredResource::ConfigMap(_) => "ConfigMap",
            DesiredResource::StatefulSet(_) => "StatefulSet",
            DesiredResource::PodDisruptionBudget(_) => "PodDisruptionBudget",
            DesiredResource::Service(_) => "Service",
        }
    }

    pub fn metadata(&self) -> &ObjectMeta {
        match self {
            DesiredResource::ConfigMap(o) => &o.metadata,
            DesiredResource::StatefulSet(o) => &o.metadata,
            DesiredResource::PodDisruptionBudget(o) => &o.metadata,
            DesiredResource::Service(o) => &o.metadata,
        }
    }

    pub fn name(&self) -> &str {
        self.metadata().name.as_deref().unwrap_or("")
    }

    /// Synthesized objects always carry the cluster's namespace; `None` only for hand-built ones.
    pub fn namespace(&self) -> Option<&str> {
        self.metadata().namespace.as_deref()
    }

    pub fn owner_references(&self) -> &[OwnerReference] {
        self.metadata().owner_references.as_deref().unwrap_or(&[])
    }
}

/// Failure of a single create call.
///
/// `AlreadyExists` is the idempotency signal and is absorbed by the reconciler;
/// everything else is fatal to the current run.
#[derive(Debug, Error)]
pub enum ApplyError {
    #[error("{kind} {name} already exists")]
    AlreadyExists { kind: &'static str, name: String },
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ApplyError {
    pub fn already_exists(res: &DesiredResource) -> Self {
        ApplyError::AlreadyExists { kind: res.kind(), name: res.name().to_string() }
    }

    pub fn is_already_exists(&self) -> bool {
        matches!(self, ApplyError::AlreadyExists { .. })
    }
}

/// Create-only backing store. Implementations never update or patch.
#[async_trait::async_trait]
pub trait ResourceApplier: Send + Sync {
    async fn create(&self, resource: &DesiredResource) -> Result<(), ApplyError>;
}
