mod scale;
mod status;
mod units;


use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use envconfig::Envconfig;
use fleet_control::{
    CoordinatorClient, FleetConfig, KubeOrchestrator, LifecycleController, ScalePreset,
};
use tokio_util::sync::CancellationToken;

use crate::types::{FleetCli, FleetCommand, TargetArgs};

/// Resolve configuration, connect the clients, dispatch one command
pub async fn execute(cli: &FleetCli, cancel: &CancellationToken) -> Result<ExitCode> {
    let config = load_config(&cli.target)?;
    let controller = build_controller(config).await?;
    let output = cli.output.output;
    match &cli.command {
        FleetCommand::Status => status::handle_status(&controller, output).await,
        FleetCommand::Scale { min, max } => {
            scale::handle_scale(&controller, *min, *max, cancel, output).await
        }
        FleetCommand::Up => {
            scale::handle_preset(&controller, ScalePreset::Up, cancel, output).await
        }
        FleetCommand::Down => {
            scale::handle_preset(&controller, ScalePreset::Down, cancel, output).await
        }
        FleetCommand::Max => {
            scale::handle_preset(&controller, ScalePreset::Burst, cancel, output).await
        }
        FleetCommand::Zero { yes } => scale::handle_zero(&controller, *yes, cancel, output).await,
        FleetCommand::Restart { yes } => units::handle_restart(&controller, *yes, output).await,
        FleetCommand::Cleanup => units::handle_cleanup(&controller, output).await,
        FleetCommand::EmergencyStop { confirm } => {
            units::handle_emergency_stop(
                &controller,
                confirm.as_deref().unwrap_or_default(),
                cancel,
                output,
            )
            .await
        }
    }
}

/// Environment carries the defaults; flags override per invocation.
fn load_config(target: &TargetArgs) -> Result<FleetConfig> {
    let mut config = FleetConfig::init_from_env().context("reading FLEET_* environment")?;
    if let Some(namespace) = &target.namespace {
        config.namespace = namespace.clone();
    }
    if let Some(fleet) = &target.fleet {
        config.fleet_name = fleet.clone();
    }
    if let Some(wait) = target.wait {
        config.wait_timeout_secs = wait;
    }
    Ok(config)
}

async fn build_controller(config: FleetConfig) -> Result<LifecycleController> {
    let orchestrator = KubeOrchestrator::try_default(&config.namespace, config.poll_interval())
        .await
        .context("connecting to the cluster")?;
    let registry = CoordinatorClient::from_config(&config.coordinator)?;
    Ok(LifecycleController::new(
        Arc::new(orchestrator),
        Arc::new(registry),
        config,
    ))
}
