//! Operator-facing fleet operations.
//!
//! Each operation is one small transaction over the reconciler, the status
//! aggregator and the orchestrator client, returning a structured report
//! rather than a bare pass/fail. Destructive operations are gated: scale to
//! zero and restart take a [`Confirmation`], the emergency stop takes the
//! literal phrase [`EMERGENCY_STOP_PHRASE`].

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument, warn};

use crate::config::{FleetConfig, ScalePreset};
use crate::errors::FleetError;
use crate::models::{CapacityRange, FleetSnapshot};
use crate::orchestrator::{BatchDelete, DeleteFailure, Orchestrator};
use crate::reconcile::{ApplyOutcome, CapacityReconciler};
use crate::registry::RunnerRegistry;
use crate::status::StatusAggregator;

/// Exact phrase an operator must supply before an emergency stop runs.
pub const EMERGENCY_STOP_PHRASE: &str = "EMERGENCY STOP";

/// Operator acknowledgement for destructive operations. Anything other than
/// `Acknowledged` rejects the operation before any mutation is sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    Acknowledged,
    Denied,
}

impl Confirmation {
    /// `--yes` style flags map directly onto the gate.
    pub fn from_flag(acknowledged: bool) -> Self {
        if acknowledged {
            Confirmation::Acknowledged
        } else {
            Confirmation::Denied
        }
    }

    fn require(self, action: &str) -> Result<(), FleetError> {
        match self {
            Confirmation::Acknowledged => Ok(()),
            Confirmation::Denied => Err(FleetError::ConfirmationRequired(format!(
                "{action} requires operator acknowledgement"
            ))),
        }
    }
}

/// Outcome of one scaling operation, as handed to operators.
#[derive(Debug, Clone, Serialize)]
pub struct ScaleReport {
    pub operation: String,
    #[serde(flatten)]
    pub outcome: ApplyOutcome,
    pub finished_at: DateTime<Utc>,
}

/// Outcome of one batch deletion. `attempted == deleted + failed`; a unit
/// that was already gone when its delete arrived counts as deleted.
#[derive(Debug, Clone, Serialize)]
pub struct DeletionReport {
    pub operation: String,
    pub attempted: usize,
    pub deleted: usize,
    pub failed: usize,
    pub failures: Vec<DeleteFailure>,
    pub finished_at: DateTime<Utc>,
}

impl DeletionReport {
    fn from_batch(operation: &str, batch: BatchDelete) -> Self {
        Self {
            operation: operation.to_string(),
            attempted: batch.deleted + batch.failed,
            deleted: batch.deleted,
            failed: batch.failed,
            failures: batch.failures,
            finished_at: Utc::now(),
        }
    }

    pub fn fully_succeeded(&self) -> bool {
        self.failed == 0
    }
}

/// Steps of the emergency-stop sequence, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StopStep {
    CapacityZeroed,
    UnitsDeleted,
    Verified,
}

#[derive(Debug, Clone, Serialize)]
pub struct StepReport {
    pub step: StopStep,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl StepReport {
    fn ok(step: StopStep) -> Self {
        Self {
            step,
            ok: true,
            detail: None,
        }
    }

    fn failed(step: StopStep, detail: impl ToString) -> Self {
        Self {
            step,
            ok: false,
            detail: Some(detail.to_string()),
        }
    }
}

/// What an emergency stop managed to do. Always produced once the phrase
/// check passes, no matter how many steps failed along the way.
#[derive(Debug, Clone, Serialize)]
pub struct EmergencyStopReport {
    pub fleet: String,
    pub steps: Vec<StepReport>,
    pub deleted: usize,
    /// Units still present after the grace delay. `None` when the
    /// verification read itself failed.
    pub remaining: Option<usize>,
    pub finished_at: DateTime<Utc>,
}

impl EmergencyStopReport {
    pub fn clean(&self) -> bool {
        self.steps.iter().all(|s| s.ok) && self.remaining == Some(0)
    }
}

/// Orchestrates the named fleet operations. Holds no state of its own:
/// every call re-reads the cluster, and concurrent controllers against the
/// same fleet resolve through the orchestrator's last-write-wins semantics.
pub struct LifecycleController {
    orchestrator: Arc<dyn Orchestrator>,
    reconciler: CapacityReconciler,
    aggregator: StatusAggregator,
    config: FleetConfig,
}

impl LifecycleController {
    pub fn new(
        orchestrator: Arc<dyn Orchestrator>,
        registry: Arc<dyn RunnerRegistry>,
        config: FleetConfig,
    ) -> Self {
        let reconciler = CapacityReconciler::new(orchestrator.clone());
        let aggregator = StatusAggregator::new(
            orchestrator.clone(),
            registry,
            config.consistency_tolerance,
        );
        Self {
            orchestrator,
            reconciler,
            aggregator,
            config,
        }
    }

    /// Point-in-time fleet health. Degrades (with notes) when the
    /// coordinator cannot be queried; fails only on cluster-side errors.
    pub async fn status(&self) -> Result<FleetSnapshot, FleetError> {
        self.aggregator
            .snapshot(
                &self.config.fleet_name,
                &self.config.selector(),
                self.config.runner_prefix(),
            )
            .await
    }

    /// Applies an explicit capacity range. An invalid pair is rejected
    /// before anything is sent to the cluster.
    pub async fn scale_to(
        &self,
        min: i32,
        max: i32,
        cancel: &CancellationToken,
    ) -> Result<ScaleReport, FleetError> {
        let range = CapacityRange::new(min, max)?;
        self.apply("scale", range, cancel).await
    }

    /// Applies one of the configured preset ranges.
    pub async fn scale_preset(
        &self,
        preset: ScalePreset,
        cancel: &CancellationToken,
    ) -> Result<ScaleReport, FleetError> {
        let range = self.config.preset(preset)?;
        let operation = match preset {
            ScalePreset::Up => "up",
            ScalePreset::Down => "down",
            ScalePreset::Burst => "max",
        };
        self.apply(operation, range, cancel).await
    }

    /// Parks the fleet at zero capacity. Gated: a denied confirmation
    /// rejects the call before any mutation.
    pub async fn scale_to_zero(
        &self,
        confirm: Confirmation,
        cancel: &CancellationToken,
    ) -> Result<ScaleReport, FleetError> {
        confirm.require("scaling to zero")?;
        self.apply("zero", CapacityRange::ZERO, cancel).await
    }

    async fn apply(
        &self,
        operation: &str,
        range: CapacityRange,
        cancel: &CancellationToken,
    ) -> Result<ScaleReport, FleetError> {
        let outcome = self
            .reconciler
            .apply(
                &self.config.fleet_name,
                range,
                self.config.wait_timeout(),
                cancel,
            )
            .await?;
        Ok(ScaleReport {
            operation: operation.to_string(),
            outcome,
            finished_at: Utc::now(),
        })
    }

    /// Force-deletes every unit in the fleet so the orchestrator replaces
    /// them. Partial failure is reported with exact counts, never collapsed.
    #[instrument(skip_all, fields(fleet = %self.config.fleet_name))]
    pub async fn restart_all(&self, confirm: Confirmation) -> Result<DeletionReport, FleetError> {
        confirm.require("restarting every unit")?;
        let batch = self
            .orchestrator
            .delete_units(&self.config.selector(), true)
            .await?;
        info!(deleted = batch.deleted, failed = batch.failed, "fleet restart issued");
        Ok(DeletionReport::from_batch("restart", batch))
    }

    /// Deletes units that finished their task, successfully or not. Running
    /// and pending units are never touched; a unit vanishing between the
    /// listing and its delete is a success.
    #[instrument(skip_all, fields(fleet = %self.config.fleet_name))]
    pub async fn cleanup_terminated(&self) -> Result<DeletionReport, FleetError> {
        let units = self
            .orchestrator
            .list_units(&self.config.selector())
            .await?;
        let mut batch = BatchDelete::default();
        for unit in units.iter().filter(|u| u.phase.is_terminated()) {
            match self.orchestrator.delete_unit(&unit.id, false).await {
                Ok(_) => batch.deleted += 1,
                Err(e) => {
                    warn!(unit = %unit.id, error = %e, "cleanup deletion failed, continuing");
                    batch.failed += 1;
                    batch.failures.push(DeleteFailure {
                        id: unit.id.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }
        info!(deleted = batch.deleted, failed = batch.failed, "terminated units cleaned up");
        Ok(DeletionReport::from_batch("cleanup", batch))
    }

    /// Last line of defense: zero the capacity, force-delete everything,
    /// then report what is left. After the phrase check every step runs even
    /// when the one before it failed, and step errors are logged and
    /// recorded instead of propagated. A fully unreachable orchestrator
    /// still yields a report.
    #[instrument(skip_all, fields(fleet = %self.config.fleet_name))]
    pub async fn emergency_stop(
        &self,
        phrase: &str,
        cancel: &CancellationToken,
    ) -> Result<EmergencyStopReport, FleetError> {
        if phrase != EMERGENCY_STOP_PHRASE {
            return Err(FleetError::ConfirmationRequired(format!(
                "emergency stop requires the exact phrase {EMERGENCY_STOP_PHRASE:?}"
            )));
        }
        warn!("emergency stop confirmed, zeroing capacity and force-deleting units");
        let mut steps = Vec::with_capacity(3);

        // Capacity first, so the orchestrator stops replacing what the next
        // step deletes. No convergence wait: the units are force-deleted
        // immediately after.
        steps.push(
            match self
                .reconciler
                .apply(
                    &self.config.fleet_name,
                    CapacityRange::ZERO,
                    Duration::ZERO,
                    cancel,
                )
                .await
            {
                Ok(_) => StepReport::ok(StopStep::CapacityZeroed),
                Err(e) => {
                    error!(error = %e, "capacity zeroing failed, proceeding to deletion");
                    StepReport::failed(StopStep::CapacityZeroed, e)
                }
            },
        );

        let mut deleted = 0;
        steps.push(
            match self
                .orchestrator
                .delete_units(&self.config.selector(), true)
                .await
            {
                Ok(batch) => {
                    deleted = batch.deleted;
                    if batch.failed == 0 {
                        StepReport::ok(StopStep::UnitsDeleted)
                    } else {
                        StepReport::failed(
                            StopStep::UnitsDeleted,
                            format!("{} deleted, {} failed", batch.deleted, batch.failed),
                        )
                    }
                }
                Err(e) => {
                    error!(error = %e, "unit deletion failed, proceeding to verification");
                    StepReport::failed(StopStep::UnitsDeleted, e)
                }
            },
        );

        // Let forced deletions settle before the single verification pass.
        // Cancellation skips the delay; the stop still verifies and reports.
        tokio::select! {
            _ = cancel.cancelled() => {}
            _ = tokio::time::sleep(self.config.grace_delay()) => {}
        }

        let remaining = match self
            .orchestrator
            .list_units(&self.config.selector())
            .await
        {
            Ok(units) => {
                steps.push(StepReport::ok(StopStep::Verified));
                Some(units.len())
            }
            Err(e) => {
                error!(error = %e, "verification listing failed, remaining count unknown");
                steps.push(StepReport::failed(StopStep::Verified, e));
                None
            }
        };

        let report = EmergencyStopReport {
            fleet: self.config.fleet_name.clone(),
            steps,
            deleted,
            remaining,
            finished_at: Utc::now(),
        };
        warn!(deleted = report.deleted, remaining = ?report.remaining, "emergency stop finished");
        Ok(report)
    }
}
