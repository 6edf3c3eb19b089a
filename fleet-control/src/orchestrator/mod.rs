//! Cluster orchestrator access.
//!
//! [`Orchestrator`] is the seam between the control logic and the cluster:
//! production code talks to Kubernetes through [`KubeOrchestrator`], tests
//! substitute an in-memory fake. Capacity writes are last-write-wins; the
//! orchestrator's optimistic concurrency on the fleet resource is the only
//! serialization between concurrent operators.

mod kube;

pub use kube::KubeOrchestrator;

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::errors::FleetError;
use crate::models::{CapacityRange, ExecutorUnit, ScalableUnit};

/// Result of deleting a single executor unit. A unit that was already gone
/// when the delete arrived is an idempotent success, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteStatus {
    Deleted,
    AlreadyGone,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeleteFailure {
    pub id: String,
    pub reason: String,
}

/// Exact accounting for a batch deletion. Callers get counts and per-unit
/// failures, never a collapsed pass/fail.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchDelete {
    pub deleted: usize,
    pub failed: usize,
    pub failures: Vec<DeleteFailure>,
}

/// Outcome of a bounded wait for capacity convergence. Running out of time
/// is an expected outcome, so it is data rather than an error.
#[derive(Debug, Clone)]
pub enum WaitOutcome {
    Converged(ScalableUnit),
    /// The bound elapsed first. Carries the last state seen, if any read
    /// succeeded during the wait.
    TimedOut(Option<ScalableUnit>),
}

#[async_trait]
pub trait Orchestrator: Send + Sync {
    /// Reads the fleet resource. `NotFound` when it does not exist.
    async fn get_fleet(&self, name: &str) -> Result<ScalableUnit, FleetError>;

    /// Writes the capacity bounds. `CapacityRange` already guarantees a
    /// valid range, so implementations only translate and send.
    async fn set_capacity(&self, name: &str, range: CapacityRange) -> Result<(), FleetError>;

    /// Lists executor units matching a label selector. Fresh query on every
    /// call; nothing is cached between calls.
    async fn list_units(&self, selector: &str) -> Result<Vec<ExecutorUnit>, FleetError>;

    /// Deletes one unit. `force` skips the graceful termination period.
    async fn delete_unit(&self, id: &str, force: bool) -> Result<DeleteStatus, FleetError>;

    /// Deletes every unit matching `selector`, each independently: one
    /// failed deletion never aborts the rest of the batch.
    async fn delete_units(&self, selector: &str, force: bool) -> Result<BatchDelete, FleetError> {
        let units = self.list_units(selector).await?;
        let mut batch = BatchDelete::default();
        for unit in &units {
            match self.delete_unit(&unit.id, force).await {
                Ok(_) => batch.deleted += 1,
                Err(e) => {
                    warn!(unit = %unit.id, error = %e, "unit deletion failed, continuing batch");
                    batch.failed += 1;
                    batch.failures.push(DeleteFailure {
                        id: unit.id.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }
        Ok(batch)
    }

    /// Interval between convergence polls. Bounded waits rely on this being
    /// small relative to their timeout.
    fn poll_interval(&self) -> Duration {
        Duration::from_secs(3)
    }

    /// Polls the fleet until its replicas sit inside the desired bounds or
    /// `timeout` elapses, whichever comes first. Cancellation wins over both.
    /// Transient read errors are logged and retried within the bound; only a
    /// vanished fleet aborts early.
    async fn wait_for_capacity(
        &self,
        name: &str,
        timeout: Duration,
        cancel: &CancellationToken,
    ) -> Result<WaitOutcome, FleetError> {
        let deadline = tokio::time::Instant::now() + timeout;
        let mut last_seen: Option<ScalableUnit> = None;
        loop {
            if cancel.is_cancelled() {
                return Err(FleetError::Cancelled);
            }
            match self.get_fleet(name).await {
                Ok(unit) if unit.converged() => return Ok(WaitOutcome::Converged(unit)),
                Ok(unit) => last_seen = Some(unit),
                Err(FleetError::NotFound(what)) => return Err(FleetError::NotFound(what)),
                Err(e) => {
                    debug!(fleet = %name, error = %e, "convergence poll failed, retrying");
                }
            }
            let now = tokio::time::Instant::now();
            if now >= deadline {
                return Ok(WaitOutcome::TimedOut(last_seen));
            }
            let nap = self.poll_interval().min(deadline - now);
            tokio::select! {
                _ = cancel.cancelled() => return Err(FleetError::Cancelled),
                _ = tokio::time::sleep(nap) => {}
            }
        }
    }
}
