pub mod config;
pub mod crd;
pub mod errors;
pub mod lifecycle;
pub mod models;
pub mod orchestrator;
pub mod reconcile;
pub mod registry;
pub mod status;

use tracing_subscriber::{
    EnvFilter, layer::SubscriberExt, util::SubscriberInitExt,
};

pub use config::{CoordinatorConfig, FleetConfig, ScalePreset, ScalePresets};
pub use errors::FleetError;
pub use lifecycle::{
    Confirmation, DeletionReport, EMERGENCY_STOP_PHRASE, EmergencyStopReport,
    LifecycleController, ScaleReport, StepReport, StopStep,
};
pub use models::{
    CapacityRange, ConsistencyWarning, ExecutorPhase, ExecutorUnit,
    FleetSnapshot, RegisteredExecutor, ScalableUnit,
};
pub use orchestrator::{
    BatchDelete, DeleteFailure, DeleteStatus, KubeOrchestrator, Orchestrator,
    WaitOutcome,
};
pub use reconcile::{ApplyOutcome, CapacityReconciler};
pub use registry::{CoordinatorClient, RegistryView, RunnerRegistry};
pub use status::StatusAggregator;

/// Installs the global tracing subscriber. Logs go to stderr so command
/// output on stdout stays parseable; `RUST_LOG` overrides `default_env`.
pub fn init_tracing(default_env: &str) {
    let filter = EnvFilter::builder()
        .with_env_var("RUST_LOG")
        .from_env_lossy()
        .add_directive(
            default_env
                .parse()
                .unwrap_or_else(|_| "info".parse().unwrap()),
        );

    let _ = tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .try_init();
}
