#![allow(dead_code)]

use std::collections::BTreeSet;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use fleet_control::config::{CoordinatorConfig, FleetConfig, ScalePresets};
use fleet_control::errors::FleetError;
use fleet_control::models::{
    CapacityRange, ExecutorPhase, ExecutorUnit, RegisteredExecutor,
    ScalableUnit,
};
use fleet_control::orchestrator::{DeleteStatus, Orchestrator};
use fleet_control::registry::{RegistryView, RunnerRegistry};

pub const FLEET: &str = "runners";

// Env guard utilities
pub struct EnvGuard {
    key: &'static str,
    old: Option<String>,
}
impl Drop for EnvGuard {
    fn drop(&mut self) {
        unsafe {
            if let Some(ref v) = self.old {
                std::env::set_var(self.key, v);
            } else {
                std::env::remove_var(self.key);
            }
        }
    }
}
pub fn set_env(key: &'static str, val: &str) -> EnvGuard {
    let old = std::env::var(key).ok();
    unsafe {
        std::env::set_var(key, val);
    }
    EnvGuard { key, old }
}

/// Configuration the integration tests run under: instant waits, no grace
/// delay, the default presets.
pub fn test_config() -> FleetConfig {
    FleetConfig {
        namespace: "ci-runners".into(),
        fleet_name: FLEET.into(),
        label_key: "fleetops.io/fleet".into(),
        runner_prefix: None,
        poll_interval_secs: 1,
        wait_timeout_secs: 2,
        consistency_tolerance: 1,
        grace_delay_secs: 0,
        coordinator: CoordinatorConfig::default(),
        presets: ScalePresets::default(),
    }
}

#[derive(Debug, Clone)]
pub struct FakeUnit {
    pub id: String,
    pub phase: ExecutorPhase,
    /// Listed normally, but the first deletion finds it already gone, as if
    /// someone else deleted it between the listing and the delete call.
    pub vanished: bool,
}

#[derive(Debug, Clone)]
pub struct FakeFleet {
    pub name: String,
    pub min: i32,
    pub max: i32,
    pub replicas: i32,
}

#[derive(Debug, Default)]
pub struct FakeState {
    pub fleet: Option<FakeFleet>,
    pub units: Vec<FakeUnit>,
    pub get_calls: usize,
    pub set_calls: usize,
    pub list_calls: usize,
    pub delete_calls: usize,
    pub set_history: Vec<(i32, i32)>,
    /// Every call errors, as if the cluster API were down.
    pub unreachable: bool,
    /// Unit ids whose deletion errors (and leaves the unit in place).
    pub fail_delete: BTreeSet<String>,
    /// Snap replicas into the applied range on every capacity write.
    pub converge_on_set: bool,
}

/// In-memory orchestrator. One mutex holds the whole cluster; knobs on
/// [`FakeState`] make it converge, lag or fail per scenario.
pub struct FakeOrchestrator {
    pub state: Mutex<FakeState>,
    poll: Duration,
}

impl FakeOrchestrator {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(FakeState::default()),
            poll: Duration::from_millis(10),
        }
    }

    pub fn with_fleet(min: i32, max: i32, replicas: i32) -> Self {
        let fake = Self::new();
        fake.state.lock().unwrap().fleet = Some(FakeFleet {
            name: FLEET.to_string(),
            min,
            max,
            replicas,
        });
        fake
    }

    /// A cluster whose API answers nothing at all.
    pub fn unreachable() -> Self {
        let fake = Self::new();
        fake.state.lock().unwrap().unreachable = true;
        fake
    }

    pub fn with_poll_interval(mut self, poll: Duration) -> Self {
        self.poll = poll;
        self
    }

    pub fn converging(self) -> Self {
        self.state.lock().unwrap().converge_on_set = true;
        self
    }

    pub fn push_unit(&self, id: &str, phase: ExecutorPhase) {
        self.state.lock().unwrap().units.push(FakeUnit {
            id: id.to_string(),
            phase,
            vanished: false,
        });
    }

    pub fn push_vanished_unit(&self, id: &str, phase: ExecutorPhase) {
        self.state.lock().unwrap().units.push(FakeUnit {
            id: id.to_string(),
            phase,
            vanished: true,
        });
    }

    pub fn fail_deletion_of(&self, id: &str) {
        self.state
            .lock()
            .unwrap()
            .fail_delete
            .insert(id.to_string());
    }

    pub fn set_replicas(&self, replicas: i32) {
        if let Some(fleet) = self.state.lock().unwrap().fleet.as_mut() {
            fleet.replicas = replicas;
        }
    }

    pub fn capacity(&self) -> (i32, i32) {
        let state = self.state.lock().unwrap();
        let fleet = state.fleet.as_ref().expect("fleet configured");
        (fleet.min, fleet.max)
    }

    pub fn unit_ids(&self) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .units
            .iter()
            .map(|u| u.id.clone())
            .collect()
    }

    pub fn set_calls(&self) -> usize {
        self.state.lock().unwrap().set_calls
    }

    pub fn get_calls(&self) -> usize {
        self.state.lock().unwrap().get_calls
    }

    pub fn delete_calls(&self) -> usize {
        self.state.lock().unwrap().delete_calls
    }

    pub fn set_history(&self) -> Vec<(i32, i32)> {
        self.state.lock().unwrap().set_history.clone()
    }
}

#[async_trait]
impl Orchestrator for FakeOrchestrator {
    async fn get_fleet(&self, name: &str) -> Result<ScalableUnit, FleetError> {
        let mut state = self.state.lock().unwrap();
        state.get_calls += 1;
        if state.unreachable {
            return Err(FleetError::Orchestrator("cluster unreachable".into()));
        }
        match &state.fleet {
            Some(fleet) if fleet.name == name => Ok(ScalableUnit {
                name: fleet.name.clone(),
                min_capacity: fleet.min,
                max_capacity: fleet.max,
                current_replicas: fleet.replicas,
            }),
            _ => Err(FleetError::NotFound(name.to_string())),
        }
    }

    async fn set_capacity(
        &self,
        name: &str,
        range: CapacityRange,
    ) -> Result<(), FleetError> {
        let mut state = self.state.lock().unwrap();
        state.set_calls += 1;
        state.set_history.push((range.min(), range.max()));
        if state.unreachable {
            return Err(FleetError::Orchestrator("cluster unreachable".into()));
        }
        let converge = state.converge_on_set;
        match state.fleet.as_mut() {
            Some(fleet) if fleet.name == name => {
                fleet.min = range.min();
                fleet.max = range.max();
                if converge {
                    fleet.replicas = fleet.replicas.clamp(range.min(), range.max());
                }
                Ok(())
            }
            _ => Err(FleetError::NotFound(name.to_string())),
        }
    }

    async fn list_units(
        &self,
        _selector: &str,
    ) -> Result<Vec<ExecutorUnit>, FleetError> {
        let mut state = self.state.lock().unwrap();
        state.list_calls += 1;
        if state.unreachable {
            return Err(FleetError::Orchestrator("cluster unreachable".into()));
        }
        Ok(state
            .units
            .iter()
            .map(|u| ExecutorUnit {
                id: u.id.clone(),
                phase: u.phase,
                fleet: Some(FLEET.to_string()),
            })
            .collect())
    }

    async fn delete_unit(
        &self,
        id: &str,
        _force: bool,
    ) -> Result<DeleteStatus, FleetError> {
        let mut state = self.state.lock().unwrap();
        state.delete_calls += 1;
        if state.unreachable {
            return Err(FleetError::Orchestrator("cluster unreachable".into()));
        }
        if state.fail_delete.contains(id) {
            return Err(FleetError::Orchestrator(format!(
                "deletion of {id} rejected"
            )));
        }
        match state.units.iter().position(|u| u.id == id) {
            Some(pos) => {
                let unit = state.units.remove(pos);
                if unit.vanished {
                    Ok(DeleteStatus::AlreadyGone)
                } else {
                    Ok(DeleteStatus::Deleted)
                }
            }
            None => Ok(DeleteStatus::AlreadyGone),
        }
    }

    fn poll_interval(&self) -> Duration {
        self.poll
    }
}

/// Registry fake: either a fixed roster (prefix-filtered like the real
/// client) or a fixed unavailability reason.
pub struct FakeRegistry {
    view: RegistryView,
}

impl FakeRegistry {
    pub fn unavailable(reason: &str) -> Self {
        Self {
            view: RegistryView::Unavailable {
                reason: reason.to_string(),
            },
        }
    }

    pub fn with_runners(runners: Vec<RegisteredExecutor>) -> Self {
        Self {
            view: RegistryView::Available(runners),
        }
    }

    /// `online` runners online+idle, plus `offline` stale registrations.
    pub fn online(online: usize, offline: usize) -> Self {
        let mut runners = Vec::new();
        for i in 0..online {
            runners.push(RegisteredExecutor {
                name: format!("{FLEET}-online-{i}"),
                online: true,
                busy: false,
            });
        }
        for i in 0..offline {
            runners.push(RegisteredExecutor {
                name: format!("{FLEET}-stale-{i}"),
                online: false,
                busy: false,
            });
        }
        Self::with_runners(runners)
    }
}

#[async_trait]
impl RunnerRegistry for FakeRegistry {
    async fn list_registered(&self, prefix: &str) -> RegistryView {
        match &self.view {
            RegistryView::Available(runners) => RegistryView::Available(
                runners
                    .iter()
                    .filter(|r| r.name.starts_with(prefix))
                    .cloned()
                    .collect(),
            ),
            unavailable => unavailable.clone(),
        }
    }
}
