use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::errors::FleetError;

/// Desired capacity bounds for a fleet.
///
/// Construction is the only validation point in the crate: a value of this
/// type always satisfies `0 <= min <= max`, so everything downstream can
/// take the invariant for granted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CapacityRange {
    min: i32,
    max: i32,
}

impl CapacityRange {
    pub const ZERO: CapacityRange = CapacityRange { min: 0, max: 0 };

    pub fn new(min: i32, max: i32) -> Result<Self, FleetError> {
        if min < 0 || max < min {
            return Err(FleetError::InvalidRange { min, max });
        }
        Ok(Self { min, max })
    }

    pub fn min(&self) -> i32 {
        self.min
    }

    pub fn max(&self) -> i32 {
        self.max
    }

    pub fn contains(&self, replicas: i32) -> bool {
        replicas >= self.min && replicas <= self.max
    }
}

impl fmt::Display for CapacityRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.min, self.max)
    }
}

/// Cluster-side view of one fleet resource: its capacity bounds and the
/// replica count the orchestrator currently reports for it.
#[derive(Debug, Clone, Serialize)]
pub struct ScalableUnit {
    pub name: String,
    pub min_capacity: i32,
    pub max_capacity: i32,
    pub current_replicas: i32,
}

impl ScalableUnit {
    /// A fleet has converged when its observed replicas sit inside the
    /// desired bounds. Mid-flight scaling reports `false`.
    pub fn converged(&self) -> bool {
        self.current_replicas >= self.min_capacity
            && self.current_replicas <= self.max_capacity
    }
}

/// Lifecycle phase of a single executor unit, as reported by the cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum ExecutorPhase {
    Pending,
    Running,
    Succeeded,
    Failed,
    Terminating,
    Unknown,
}

impl ExecutorPhase {
    /// Terminated units are finished work: safe to delete, never evidence
    /// of a live runner.
    pub fn is_terminated(&self) -> bool {
        matches!(self, ExecutorPhase::Succeeded | ExecutorPhase::Failed)
    }
}

impl fmt::Display for ExecutorPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ExecutorPhase::Pending => "Pending",
            ExecutorPhase::Running => "Running",
            ExecutorPhase::Succeeded => "Succeeded",
            ExecutorPhase::Failed => "Failed",
            ExecutorPhase::Terminating => "Terminating",
            ExecutorPhase::Unknown => "Unknown",
        };
        f.write_str(s)
    }
}

/// One executor unit owned by a fleet.
#[derive(Debug, Clone, Serialize)]
pub struct ExecutorUnit {
    /// Cluster-assigned unit name.
    pub id: String,
    pub phase: ExecutorPhase,
    /// Value of the fleet membership label, when the listing carried one.
    pub fleet: Option<String>,
}

/// One runner registration as the CI coordinator sees it.
#[derive(Debug, Clone, Serialize)]
pub struct RegisteredExecutor {
    pub name: String,
    pub online: bool,
    pub busy: bool,
}

/// Raised inside a snapshot when cluster-side and coordinator-side counts
/// drift further apart than the configured tolerance. Advisory only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ConsistencyWarning {
    pub running: usize,
    pub registered_online: usize,
}

impl fmt::Display for ConsistencyWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "cluster reports {} running units but the coordinator sees {} online",
            self.running, self.registered_online
        )
    }
}

/// Point-in-time merge of cluster truth and coordinator registrations.
/// Recomputed on every query, never cached.
#[derive(Debug, Clone, Serialize)]
pub struct FleetSnapshot {
    pub fleet: String,
    pub desired_min: i32,
    pub desired_max: i32,
    pub current_replicas: i32,
    pub counts_by_phase: BTreeMap<ExecutorPhase, usize>,
    /// `None` in each of the registered_* fields means the coordinator could
    /// not be queried; the snapshot is degraded, not failed.
    pub registered_total: Option<usize>,
    pub registered_online: Option<usize>,
    pub registered_busy: Option<usize>,
    pub consistency_warning: Option<ConsistencyWarning>,
    pub notes: Vec<String>,
    pub taken_at: DateTime<Utc>,
}

impl FleetSnapshot {
    pub fn count(&self, phase: ExecutorPhase) -> usize {
        self.counts_by_phase.get(&phase).copied().unwrap_or(0)
    }

    pub fn running(&self) -> usize {
        self.count(ExecutorPhase::Running)
    }
}
