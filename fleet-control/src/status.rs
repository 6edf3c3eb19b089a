use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, instrument, warn};

use crate::errors::FleetError;
use crate::models::{ConsistencyWarning, ExecutorPhase, FleetSnapshot};
use crate::orchestrator::Orchestrator;
use crate::registry::{RegistryView, RunnerRegistry};

/// Merges the two independently-consistent views of a fleet into one
/// snapshot: what the cluster runs (authoritative) and what the coordinator
/// has registered (advisory). A coordinator that cannot answer degrades the
/// registration fields to `None`; it never fails the snapshot.
pub struct StatusAggregator {
    orchestrator: Arc<dyn Orchestrator>,
    registry: Arc<dyn RunnerRegistry>,
    tolerance: i64,
}

impl StatusAggregator {
    pub fn new(
        orchestrator: Arc<dyn Orchestrator>,
        registry: Arc<dyn RunnerRegistry>,
        tolerance: i64,
    ) -> Self {
        Self {
            orchestrator,
            registry,
            tolerance,
        }
    }

    /// Recomputes the fleet view from scratch: fleet resource, unit listing,
    /// registration listing. Only a cluster-side failure fails the call.
    #[instrument(skip_all, fields(fleet = %fleet, selector = %selector))]
    pub async fn snapshot(
        &self,
        fleet: &str,
        selector: &str,
        prefix: &str,
    ) -> Result<FleetSnapshot, FleetError> {
        let unit = self.orchestrator.get_fleet(fleet).await?;
        let executors = self.orchestrator.list_units(selector).await?;

        let mut counts_by_phase: BTreeMap<ExecutorPhase, usize> = BTreeMap::new();
        for executor in &executors {
            *counts_by_phase.entry(executor.phase).or_insert(0) += 1;
        }

        let mut notes = Vec::new();
        let (registered_total, registered_online, registered_busy) =
            match self.registry.list_registered(prefix).await {
                RegistryView::Available(registered) => {
                    let online = registered.iter().filter(|r| r.online).count();
                    let busy = registered.iter().filter(|r| r.busy).count();
                    debug!(total = registered.len(), online, busy, "registrations fetched");
                    (Some(registered.len()), Some(online), Some(busy))
                }
                RegistryView::Unavailable { reason } => {
                    warn!(%reason, "registration data unavailable, snapshot degraded");
                    notes.push(format!("registration data unavailable: {reason}"));
                    (None, None, None)
                }
            };

        let running = counts_by_phase
            .get(&ExecutorPhase::Running)
            .copied()
            .unwrap_or(0);
        let consistency_warning = registered_online
            .and_then(|online| drift_warning(running, online, self.tolerance));
        if let Some(w) = &consistency_warning {
            warn!(running = w.running, online = w.registered_online, "fleet views diverge");
            notes.push(w.to_string());
        }

        Ok(FleetSnapshot {
            fleet: fleet.to_string(),
            desired_min: unit.min_capacity,
            desired_max: unit.max_capacity,
            current_replicas: unit.current_replicas,
            counts_by_phase,
            registered_total,
            registered_online,
            registered_busy,
            consistency_warning,
            notes,
            taken_at: Utc::now(),
        })
    }
}

/// Warn only when the drift strictly exceeds the tolerance. Registration
/// propagation lag routinely accounts for a difference of one, so the
/// default tolerance of 1 keeps a mid-registration fleet quiet.
fn drift_warning(
    running: usize,
    registered_online: usize,
    tolerance: i64,
) -> Option<ConsistencyWarning> {
    let delta = (running as i64 - registered_online as i64).abs();
    (delta > tolerance).then_some(ConsistencyWarning {
        running,
        registered_online,
    })
}
