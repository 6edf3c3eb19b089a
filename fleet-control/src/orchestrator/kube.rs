use std::time::Duration;

use k8s_openapi::api::core::v1::Pod;
use kube::api::{Api, DeleteParams, ListParams, Patch, PatchParams};
use kube::{Client, ResourceExt};
use serde_json::json;
use tracing::{debug, instrument};

use crate::crd::RunnerFleet;
use crate::errors::FleetError;
use crate::models::{CapacityRange, ExecutorPhase, ExecutorUnit, ScalableUnit};

use super::{DeleteStatus, Orchestrator};

/// Kubernetes-backed orchestrator. Holds nothing but API handles; every
/// call is a fresh round trip to the cluster.
#[derive(Clone)]
pub struct KubeOrchestrator {
    fleets: Api<RunnerFleet>,
    pods: Api<Pod>,
    poll_interval: Duration,
}

impl KubeOrchestrator {
    pub fn new(client: Client, namespace: &str, poll_interval: Duration) -> Self {
        Self {
            fleets: Api::namespaced(client.clone(), namespace),
            pods: Api::namespaced(client, namespace),
            poll_interval,
        }
    }

    /// Connects using the ambient kubeconfig or in-cluster service account.
    pub async fn try_default(
        namespace: &str,
        poll_interval: Duration,
    ) -> Result<Self, FleetError> {
        let client = Client::try_default()
            .await
            .map_err(|e| FleetError::Orchestrator(e.to_string()))?;
        Ok(Self::new(client, namespace, poll_interval))
    }
}

#[async_trait::async_trait]
impl Orchestrator for KubeOrchestrator {
    async fn get_fleet(&self, name: &str) -> Result<ScalableUnit, FleetError> {
        let fleet = self
            .fleets
            .get(name)
            .await
            .map_err(|e| FleetError::from_kube(e, name))?;
        Ok(unit_from_fleet(&fleet))
    }

    #[instrument(skip_all, fields(fleet = %name, min = range.min(), max = range.max()))]
    async fn set_capacity(&self, name: &str, range: CapacityRange) -> Result<(), FleetError> {
        let patch = json!({
            "spec": {
                "minCapacity": range.min(),
                "maxCapacity": range.max(),
            }
        });
        self.fleets
            .patch(name, &PatchParams::default(), &Patch::Merge(&patch))
            .await
            .map_err(|e| FleetError::from_kube(e, name))?;
        debug!("capacity bounds patched");
        Ok(())
    }

    async fn list_units(&self, selector: &str) -> Result<Vec<ExecutorUnit>, FleetError> {
        let lp = ListParams::default().labels(selector);
        let pods = self
            .pods
            .list(&lp)
            .await
            .map_err(|e| FleetError::from_kube(e, selector))?;
        let label_key = selector.split_once('=').map(|(k, _)| k);
        Ok(pods.iter().map(|p| unit_from_pod(p, label_key)).collect())
    }

    async fn delete_unit(&self, id: &str, force: bool) -> Result<DeleteStatus, FleetError> {
        let dp = if force {
            DeleteParams::default().grace_period(0)
        } else {
            DeleteParams::default()
        };
        match self.pods.delete(id, &dp).await {
            Ok(_) => Ok(DeleteStatus::Deleted),
            // Someone else got there first; the desired state holds.
            Err(kube::Error::Api(resp)) if resp.code == 404 => {
                debug!(unit = %id, "already gone");
                Ok(DeleteStatus::AlreadyGone)
            }
            Err(e) => Err(FleetError::from_kube(e, id)),
        }
    }

    fn poll_interval(&self) -> Duration {
        self.poll_interval
    }
}

fn unit_from_fleet(fleet: &RunnerFleet) -> ScalableUnit {
    ScalableUnit {
        name: fleet.name_any(),
        min_capacity: fleet.spec.min_capacity,
        max_capacity: fleet.spec.max_capacity,
        current_replicas: fleet
            .status
            .as_ref()
            .map(|s| s.current_replicas)
            .unwrap_or(0),
    }
}

fn unit_from_pod(pod: &Pod, label_key: Option<&str>) -> ExecutorUnit {
    let fleet = label_key
        .and_then(|key| pod.metadata.labels.as_ref().and_then(|l| l.get(key)))
        .cloned();
    ExecutorUnit {
        id: pod.name_any(),
        phase: phase_of(pod),
        fleet,
    }
}

/// A deletion timestamp overrides the reported phase: the unit is on its
/// way out no matter what the kubelet last wrote.
fn phase_of(pod: &Pod) -> ExecutorPhase {
    if pod.metadata.deletion_timestamp.is_some() {
        return ExecutorPhase::Terminating;
    }
    match pod.status.as_ref().and_then(|s| s.phase.as_deref()) {
        Some("Pending") => ExecutorPhase::Pending,
        Some("Running") => ExecutorPhase::Running,
        Some("Succeeded") => ExecutorPhase::Succeeded,
        Some("Failed") => ExecutorPhase::Failed,
        _ => ExecutorPhase::Unknown,
    }
}
