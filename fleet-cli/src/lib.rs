mod commands;
mod types;

pub use types::{FleetCli, FleetCommand, OutputArgs, OutputFormat, TargetArgs};

use std::process::ExitCode;

use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Runs one parsed invocation and maps the outcome onto the exit contract:
/// 0 success (degraded visibility included), 1 failure, 2 partial failure.
pub async fn run(cli: FleetCli, cancel: CancellationToken) -> ExitCode {
    debug!("use option {cli:?}");
    match commands::execute(&cli, &cancel).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("fleetctl: {e:#}");
            ExitCode::FAILURE
        }
    }
}
