use std::process::ExitCode;

use anyhow::Result;
use fleet_control::{Confirmation, DeletionReport, EmergencyStopReport, LifecycleController};
use tokio_util::sync::CancellationToken;

use crate::types::OutputFormat;

/// Exit code for operations that ran to the end but left failures behind.
const PARTIAL_FAILURE: u8 = 2;

/// Handle `restart`, the gated delete-everything command
pub async fn handle_restart(
    controller: &LifecycleController,
    yes: bool,
    output: OutputFormat,
) -> Result<ExitCode> {
    let report = controller.restart_all(Confirmation::from_flag(yes)).await?;
    finish(&report, output)
}

/// Handle `cleanup` of terminated units
pub async fn handle_cleanup(
    controller: &LifecycleController,
    output: OutputFormat,
) -> Result<ExitCode> {
    let report = controller.cleanup_terminated().await?;
    finish(&report, output)
}

/// Handle `emergency-stop`
pub async fn handle_emergency_stop(
    controller: &LifecycleController,
    phrase: &str,
    cancel: &CancellationToken,
    output: OutputFormat,
) -> Result<ExitCode> {
    let report = controller.emergency_stop(phrase, cancel).await?;
    match output {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Text => println!("{}", render_stop(&report)),
    }
    Ok(ExitCode::from(stop_exit(&report)))
}

fn finish(report: &DeletionReport, output: OutputFormat) -> Result<ExitCode> {
    match output {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(report)?),
        OutputFormat::Text => println!("{}", render(report)),
    }
    Ok(ExitCode::from(deletion_exit(report)))
}

fn deletion_exit(report: &DeletionReport) -> u8 {
    if report.fully_succeeded() {
        0
    } else {
        PARTIAL_FAILURE
    }
}

fn stop_exit(report: &EmergencyStopReport) -> u8 {
    if report.clean() { 0 } else { PARTIAL_FAILURE }
}

fn render(report: &DeletionReport) -> String {
    let mut lines = vec![format!(
        "{}: {} attempted, {} deleted, {} failed",
        report.operation, report.attempted, report.deleted, report.failed
    )];
    for failure in &report.failures {
        lines.push(format!("  failed {}: {}", failure.id, failure.reason));
    }
    lines.join("\n")
}

fn render_stop(report: &EmergencyStopReport) -> String {
    let mut lines = vec![format!("emergency stop of fleet {}:", report.fleet)];
    for step in &report.steps {
        let mark = if step.ok { "ok" } else { "failed" };
        match &step.detail {
            Some(detail) => lines.push(format!("  {:?}: {mark} ({detail})", step.step)),
            None => lines.push(format!("  {:?}: {mark}", step.step)),
        }
    }
    lines.push(format!("  deleted: {}", report.deleted));
    match report.remaining {
        Some(n) => lines.push(format!("  remaining: {n}")),
        None => lines.push("  remaining: unknown (verification failed)".to_string()),
    }
    lines.join("\n")
}
