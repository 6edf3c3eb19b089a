use std::process::ExitCode;

use anyhow::Result;
use fleet_control::{Confirmation, LifecycleController, ScalePreset, ScaleReport};
use tokio_util::sync::CancellationToken;

use crate::types::OutputFormat;

/// Handle `scale <min> <max>`
pub async fn handle_scale(
    controller: &LifecycleController,
    min: i32,
    max: i32,
    cancel: &CancellationToken,
    output: OutputFormat,
) -> Result<ExitCode> {
    let report = controller.scale_to(min, max, cancel).await?;
    finish(&report, output)
}

/// Handle the `up`/`down`/`max` preset commands
pub async fn handle_preset(
    controller: &LifecycleController,
    preset: ScalePreset,
    cancel: &CancellationToken,
    output: OutputFormat,
) -> Result<ExitCode> {
    let report = controller.scale_preset(preset, cancel).await?;
    finish(&report, output)
}

/// Handle `zero`, the gated park-at-zero command
pub async fn handle_zero(
    controller: &LifecycleController,
    yes: bool,
    cancel: &CancellationToken,
    output: OutputFormat,
) -> Result<ExitCode> {
    let report = controller
        .scale_to_zero(Confirmation::from_flag(yes), cancel)
        .await?;
    finish(&report, output)
}

/// A capacity write that landed is a success even when replicas are still
/// converging; the warning says so and the exit code stays 0.
fn finish(report: &ScaleReport, output: OutputFormat) -> Result<ExitCode> {
    match output {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(report)?),
        OutputFormat::Text => println!("{}", render(report)),
    }
    Ok(ExitCode::SUCCESS)
}

fn render(report: &ScaleReport) -> String {
    let outcome = &report.outcome;
    let mut lines = vec![match outcome.previous {
        Some(previous) => format!(
            "fleet {}: capacity {} -> {}",
            outcome.fleet, previous, outcome.applied
        ),
        None => format!("fleet {}: capacity {}", outcome.fleet, outcome.applied),
    }];
    if outcome.converged {
        lines.push(format!(
            "  converged at {} replicas",
            outcome.current_replicas.unwrap_or_default()
        ));
    }
    if let Some(warning) = &outcome.warning {
        lines.push(format!("  warning: {warning}"));
    }
    lines.join("\n")
}
