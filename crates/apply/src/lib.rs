//! zkop apply: ordered, create-only reconciliation of a ZooKeeper ensemble.
//!
//! A run walks five stages in a fixed order. Each stage creates one object;
//! "already exists" counts as done, any other failure stops the run where it
//! is. Nothing created by earlier stages is rolled back: every stage is
//! independently idempotent, so the next run simply starts over.

#![forbid(unsafe_code)]

pub mod input;

use std::fmt;

use anyhow::Result;
use kube::ResourceExt;
use metrics::{counter, histogram};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error, info};
use zkop_core::{ApplyError, ResourceApplier, ZookeeperCluster};

pub use input::parse_cluster_yaml;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Stage {
    ConfigMap,
    StatefulSet,
    PodDisruptionBudget,
    ClientService,
    HeadlessService,
}

impl Stage {
    /// Creation order.
    pub const ORDER: [Stage; 5] = [
        Stage::ConfigMap,
        Stage::StatefulSet,
        Stage::PodDisruptionBudget,
        Stage::ClientService,
        Stage::HeadlessService,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Stage::ConfigMap => "configmap",
            Stage::StatefulSet => "statefulset",
            Stage::PodDisruptionBudget => "pod-disruption-budget",
            Stage::ClientService => "client service",
            Stage::HeadlessService => "headless service",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Progress of one run. `Applied(s)` means `s` and every stage before it are in place.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ReconcileState {
    Idle,
    Applied(Stage),
    Failed(Stage),
}

impl ReconcileState {
    pub fn is_complete(self) -> bool {
        self == ReconcileState::Applied(Stage::HeadlessService)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum StageOutcome {
    Created,
    AlreadyExists,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StageReport {
    pub stage: Stage,
    pub kind: String,
    pub name: String,
    pub outcome: StageOutcome,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReconcileReport {
    pub cluster: String,
    pub namespace: String,
    pub state: ReconcileState,
    pub stages: Vec<StageReport>,
}

/// A run aborted at `stage`; `source` is the apply layer's error, untouched.
#[derive(Debug, Error)]
#[error("failed to create zookeeper {stage}: {source}")]
pub struct ReconcileError {
    pub stage: Stage,
    pub state: ReconcileState,
    pub stages: Vec<StageReport>,
    pub source: anyhow::Error,
}

pub struct Reconciler<A> {
    applier: A,
}

impl<A: ResourceApplier> Reconciler<A> {
    pub fn new(applier: A) -> Self {
        Self { applier }
    }

    pub fn applier(&self) -> &A {
        &self.applier
    }

    /// Synthesize every object for `zk` and create them in stage order.
    pub async fn reconcile(&self, zk: &ZookeeperCluster) -> Result<ReconcileReport, ReconcileError> {
        let t0 = std::time::Instant::now();
        counter!("reconcile_attempts", 1u64);
        let cluster = zk.name_any();
        let namespace = zkop_core::names::namespace(zk);

        let mut state = ReconcileState::Idle;
        let mut stages = Vec::with_capacity(Stage::ORDER.len());
        let resources = zkop_synth::synthesize(zk).into_ordered();

        for (stage, res) in Stage::ORDER.into_iter().zip(resources.iter()) {
            let outcome = match self.applier.create(res).await {
                Ok(()) => StageOutcome::Created,
                Err(ApplyError::AlreadyExists { .. }) => StageOutcome::AlreadyExists,
                Err(ApplyError::Other(e)) => {
                    error!(cluster = %cluster, ns = %namespace, stage = %stage, error = %e, "failed to create zookeeper {}", stage);
                    counter!("reconcile_err", 1u64, "stage" => stage.as_str());
                    state = ReconcileState::Failed(stage);
                    return Err(ReconcileError { stage, state, stages, source: e });
                }
            };
            match outcome {
                StageOutcome::Created => {
                    counter!("reconcile_stage_created", 1u64, "stage" => stage.as_str());
                }
                StageOutcome::AlreadyExists => {
                    counter!("reconcile_stage_exists", 1u64, "stage" => stage.as_str());
                }
            }
            debug!(cluster = %cluster, stage = %stage, kind = res.kind(), name = res.name(), ?outcome, "stage applied");
            state = ReconcileState::Applied(stage);
            stages.push(StageReport { stage, kind: res.kind().to_string(), name: res.name().to_string(), outcome });
        }

        histogram!("reconcile_latency_ms", t0.elapsed().as_secs_f64() * 1000.0);
        counter!("reconcile_ok", 1u64);
        info!(cluster = %cluster, ns = %namespace, "reconcile complete");
        Ok(ReconcileReport { cluster, namespace, state, stages })
    }
}

/// Reconcile against the API server from the ambient kube config.
pub async fn reconcile_live(zk: &ZookeeperCluster, dry_run: bool) -> Result<ReconcileReport> {
    let client = zkop_kubehub::get_kube_client().await?;
    let reconciler = Reconciler::new(zkop_kubehub::KubeApplier::new(client).with_dry_run(dry_run));
    Ok(reconciler.reconcile(zk).await?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_order_is_fixed() {
        assert_eq!(Stage::ORDER[0], Stage::ConfigMap);
        assert_eq!(Stage::ORDER[4], Stage::HeadlessService);
        assert_eq!(Stage::PodDisruptionBudget.to_string(), "pod-disruption-budget");
    }

    #[test]
    fn only_last_stage_completes() {
        assert!(!ReconcileState::Idle.is_complete());
        assert!(!ReconcileState::Applied(Stage::ClientService).is_complete());
        assert!(!ReconcileState::Failed(Stage::HeadlessService).is_complete());
        assert!(ReconcileState::Applied(Stage::HeadlessService).is_complete());
    }
}
