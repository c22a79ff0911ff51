use k8s_openapi::api::policy::v1::{PodDisruptionBudget, PodDisruptionBudgetSpec};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::LabelSelector;
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;
use zkop_core::{names, ZookeeperCluster};

/// At most one member voluntarily down at a time, whatever the ensemble size.
pub const MAX_UNAVAILABLE: i32 = 1;

pub fn disruption_budget(zk: &ZookeeperCluster) -> PodDisruptionBudget {
    PodDisruptionBudget {
        metadata: names::owned_meta(zk, names::workload_name(zk)),
        spec: Some(PodDisruptionBudgetSpec {
            max_unavailable: Some(IntOrString::Int(MAX_UNAVAILABLE)),
            selector: Some(LabelSelector { match_labels: Some(names::app_labels(zk)), ..LabelSelector::default() }),
            ..PodDisruptionBudgetSpec::default()
        }),
        ..PodDisruptionBudget::default()
    }
}
