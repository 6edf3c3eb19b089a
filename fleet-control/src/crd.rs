use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// In-cluster fleet resource. The initial rollout creates it; this subsystem
/// only reads it and patches `minCapacity`/`maxCapacity`. The autoscaler that
/// drives replicas between those bounds lives elsewhere.
#[derive(CustomResource, Deserialize, Serialize, Clone, Debug, JsonSchema)]
#[kube(
    group = "fleetops.io",
    version = "v1alpha1",
    kind = "RunnerFleet",
    plural = "runnerfleets",
    namespaced,
    status = "RunnerFleetStatus"
)]
#[serde(rename_all = "camelCase")]
pub struct RunnerFleetSpec {
    /// Lower bound the autoscaler may not go below.
    pub min_capacity: i32,
    /// Upper bound the autoscaler may not exceed. Always >= minCapacity.
    pub max_capacity: i32,
}

#[derive(Deserialize, Serialize, Clone, Debug, JsonSchema, Default)]
#[serde(rename_all = "camelCase")]
pub struct RunnerFleetStatus {
    /// Replica count the orchestrator currently observes for the fleet.
    /// Missing status (a freshly created resource) reads as zero.
    #[serde(default)]
    pub current_replicas: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub observed_generation: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,
}
