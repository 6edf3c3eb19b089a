use std::process::ExitCode;

use anyhow::Result;
use fleet_control::{FleetSnapshot, LifecycleController};

use crate::types::OutputFormat;

/// Handle the status command
pub async fn handle_status(
    controller: &LifecycleController,
    output: OutputFormat,
) -> Result<ExitCode> {
    let snapshot = controller.status().await?;
    match output {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&snapshot)?),
        OutputFormat::Text => println!("{}", render_snapshot(&snapshot)),
    }
    // Degraded visibility (coordinator down) is still a successful read.
    Ok(ExitCode::SUCCESS)
}

fn render_snapshot(snapshot: &FleetSnapshot) -> String {
    let mut lines = vec![format!(
        "fleet {}: capacity [{}, {}], {} replicas, {} running",
        snapshot.fleet,
        snapshot.desired_min,
        snapshot.desired_max,
        snapshot.current_replicas,
        snapshot.running()
    )];
    if snapshot.counts_by_phase.is_empty() {
        lines.push("  units: none".to_string());
    }
    for (phase, count) in &snapshot.counts_by_phase {
        lines.push(format!("  units {phase}: {count}"));
    }
    match (
        snapshot.registered_total,
        snapshot.registered_online,
        snapshot.registered_busy,
    ) {
        (Some(total), Some(online), Some(busy)) => {
            lines.push(format!(
                "  registered: {total} total, {online} online, {busy} busy"
            ));
        }
        _ => lines.push("  registered: unavailable".to_string()),
    }
    // Notes already carry the consistency warning when one was raised.
    for note in &snapshot.notes {
        lines.push(format!("  note: {note}"));
    }
    lines.join("\n")
}
