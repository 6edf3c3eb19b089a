use std::time::Duration;

use envconfig::Envconfig;

use crate::errors::FleetError;
use crate::models::CapacityRange;

#[derive(Envconfig, Clone, Debug)]
pub struct FleetConfig {
    /// Namespace holding the fleet resource and its executor pods.
    /// Env: FLEET_NAMESPACE
    #[envconfig(from = "FLEET_NAMESPACE", default = "ci-runners")]
    pub namespace: String,

    /// Name of the fleet resource. Doubles as the membership label value
    /// and, unless overridden, as the registered runner name prefix.
    /// Env: FLEET_NAME
    #[envconfig(from = "FLEET_NAME", default = "runners")]
    pub fleet_name: String,

    /// Label key marking executor pods as fleet members.
    /// Env: FLEET_LABEL_KEY
    #[envconfig(from = "FLEET_LABEL_KEY", default = "fleetops.io/fleet")]
    pub label_key: String,

    /// Registered runner name prefix on the coordinator, when it differs
    /// from the fleet name.
    /// Env: FLEET_RUNNER_PREFIX
    #[envconfig(from = "FLEET_RUNNER_PREFIX")]
    pub runner_prefix: Option<String>,

    /// Interval between convergence polls. Values below 1 are raised to 1.
    /// Env: FLEET_POLL_INTERVAL_SECS
    #[envconfig(from = "FLEET_POLL_INTERVAL_SECS", default = "3")]
    pub poll_interval_secs: u64,

    /// Upper bound on waiting for a capacity change to converge. Zero skips
    /// the wait entirely.
    /// Env: FLEET_WAIT_TIMEOUT_SECS
    #[envconfig(from = "FLEET_WAIT_TIMEOUT_SECS", default = "120")]
    pub wait_timeout_secs: u64,

    /// Allowed |running - registered online| drift before a snapshot raises
    /// a consistency warning. Registration lag makes 1 the useful floor.
    /// Env: FLEET_CONSISTENCY_TOLERANCE
    #[envconfig(from = "FLEET_CONSISTENCY_TOLERANCE", default = "1")]
    pub consistency_tolerance: i64,

    /// Settling delay between deleting units and the verification pass of an
    /// emergency stop.
    /// Env: FLEET_GRACE_DELAY_SECS
    #[envconfig(from = "FLEET_GRACE_DELAY_SECS", default = "5")]
    pub grace_delay_secs: u64,

    #[envconfig(nested)]
    pub coordinator: CoordinatorConfig,

    #[envconfig(nested)]
    pub presets: ScalePresets,
}

/// Coordinator access. Both URL and token must be present for registration
/// lookups; anything less degrades snapshots instead of failing them.
#[derive(Envconfig, Clone, Debug, Default)]
pub struct CoordinatorConfig {
    /// Base URL of the coordinator scope the fleet registers under,
    /// e.g. https://coordinator.example.com/orgs/acme
    /// Env: FLEET_COORD_URL
    #[envconfig(from = "FLEET_COORD_URL")]
    pub url: Option<String>,

    /// Bearer token for the registration API.
    /// Env: FLEET_COORD_TOKEN
    #[envconfig(from = "FLEET_COORD_TOKEN")]
    pub token: Option<String>,

    /// Env: FLEET_COORD_TIMEOUT_SECS
    #[envconfig(from = "FLEET_COORD_TIMEOUT_SECS", default = "10")]
    pub timeout_secs: u64,

    /// Page size for registration listings (server caps apply).
    /// Env: FLEET_COORD_PAGE_SIZE
    #[envconfig(from = "FLEET_COORD_PAGE_SIZE", default = "100")]
    pub page_size: u32,
}

/// Named capacity ranges behind the `up`/`down`/`max` shortcuts. Validated
/// at use, so a misconfigured pair surfaces as `InvalidRange` then, not at
/// startup.
#[derive(Envconfig, Clone, Debug)]
pub struct ScalePresets {
    /// Env: FLEET_UP_MIN
    #[envconfig(from = "FLEET_UP_MIN", default = "1")]
    pub up_min: i32,
    /// Env: FLEET_UP_MAX
    #[envconfig(from = "FLEET_UP_MAX", default = "4")]
    pub up_max: i32,

    /// Env: FLEET_DOWN_MIN
    #[envconfig(from = "FLEET_DOWN_MIN", default = "0")]
    pub down_min: i32,
    /// Env: FLEET_DOWN_MAX
    #[envconfig(from = "FLEET_DOWN_MAX", default = "1")]
    pub down_max: i32,

    /// Env: FLEET_BURST_MIN
    #[envconfig(from = "FLEET_BURST_MIN", default = "4")]
    pub burst_min: i32,
    /// Env: FLEET_BURST_MAX
    #[envconfig(from = "FLEET_BURST_MAX", default = "8")]
    pub burst_max: i32,
}

impl Default for ScalePresets {
    fn default() -> Self {
        Self {
            up_min: 1,
            up_max: 4,
            down_min: 0,
            down_max: 1,
            burst_min: 4,
            burst_max: 8,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalePreset {
    /// Working-hours range.
    Up,
    /// Idle range.
    Down,
    /// Burst range for backlogs.
    Burst,
}

impl FleetConfig {
    /// Label selector matching this fleet's executor pods.
    pub fn selector(&self) -> String {
        format!("{}={}", self.label_key, self.fleet_name)
    }

    pub fn runner_prefix(&self) -> &str {
        self.runner_prefix.as_deref().unwrap_or(&self.fleet_name)
    }

    /// Floored at one second: a zero interval would turn every bounded
    /// wait into a busy poll of the cluster API.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.max(1))
    }

    pub fn wait_timeout(&self) -> Duration {
        Duration::from_secs(self.wait_timeout_secs)
    }

    pub fn grace_delay(&self) -> Duration {
        Duration::from_secs(self.grace_delay_secs)
    }

    pub fn preset(&self, preset: ScalePreset) -> Result<CapacityRange, FleetError> {
        let (min, max) = match preset {
            ScalePreset::Up => (self.presets.up_min, self.presets.up_max),
            ScalePreset::Down => (self.presets.down_min, self.presets.down_max),
            ScalePreset::Burst => (self.presets.burst_min, self.presets.burst_max),
        };
        CapacityRange::new(min, max)
    }
}
