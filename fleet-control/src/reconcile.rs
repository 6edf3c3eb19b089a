use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

use crate::errors::FleetError;
use crate::models::{CapacityRange, ScalableUnit};
use crate::orchestrator::{Orchestrator, WaitOutcome};

/// Sole authority for mutating fleet capacity. Every scaling path in the
/// crate funnels through [`CapacityReconciler::apply`].
pub struct CapacityReconciler {
    orchestrator: Arc<dyn Orchestrator>,
}

/// What a capacity change actually did. A write that lands while replicas
/// lag behind is still a success, reported with `converged = false` and a
/// warning instead of an error.
#[derive(Debug, Clone, Serialize)]
pub struct ApplyOutcome {
    pub fleet: String,
    pub applied: CapacityRange,
    /// Bounds read before the write, when that read produced a valid range.
    pub previous: Option<CapacityRange>,
    /// Replica count last observed, from the convergence wait when one ran.
    pub current_replicas: Option<i32>,
    pub converged: bool,
    pub warning: Option<String>,
}

impl CapacityReconciler {
    pub fn new(orchestrator: Arc<dyn Orchestrator>) -> Self {
        Self { orchestrator }
    }

    /// Reads the fleet, writes the new bounds, then waits up to
    /// `wait_timeout` for replicas to converge. A zero timeout skips the
    /// wait. Applying bounds the fleet already has is a no-op on the
    /// orchestrator side and reports success like any other write.
    #[instrument(skip_all, fields(fleet = %name, min = range.min(), max = range.max()))]
    pub async fn apply(
        &self,
        name: &str,
        range: CapacityRange,
        wait_timeout: Duration,
        cancel: &CancellationToken,
    ) -> Result<ApplyOutcome, FleetError> {
        let before = self.orchestrator.get_fleet(name).await?;
        let previous = CapacityRange::new(before.min_capacity, before.max_capacity).ok();
        info!(
            previous = %previous.map(|p| p.to_string()).unwrap_or_else(|| "?".to_string()),
            replicas = before.current_replicas,
            "applying capacity range"
        );

        self.orchestrator.set_capacity(name, range).await?;

        if wait_timeout.is_zero() {
            return Ok(ApplyOutcome {
                fleet: name.to_string(),
                applied: range,
                previous,
                current_replicas: Some(before.current_replicas),
                converged: false,
                warning: Some("convergence wait skipped".to_string()),
            });
        }

        match self
            .orchestrator
            .wait_for_capacity(name, wait_timeout, cancel)
            .await?
        {
            WaitOutcome::Converged(unit) => {
                info!(replicas = unit.current_replicas, "capacity converged");
                Ok(ApplyOutcome {
                    fleet: name.to_string(),
                    applied: range,
                    previous,
                    current_replicas: Some(unit.current_replicas),
                    converged: true,
                    warning: None,
                })
            }
            WaitOutcome::TimedOut(last) => {
                let warning = format!(
                    "capacity write accepted but replicas did not converge within {:?}",
                    wait_timeout
                );
                warn!(
                    replicas = ?last.as_ref().map(|u: &ScalableUnit| u.current_replicas),
                    "{warning}"
                );
                Ok(ApplyOutcome {
                    fleet: name.to_string(),
                    applied: range,
                    previous,
                    current_replicas: last.map(|u| u.current_replicas),
                    converged: false,
                    warning: Some(warning),
                })
            }
        }
    }
}
