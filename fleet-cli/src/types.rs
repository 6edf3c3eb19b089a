/// Lifecycle and scaling operations for runner fleets
#[derive(clap::Parser, Clone, Debug)]
#[clap(name = "fleetctl", author, version, about, long_about = None)]
pub struct FleetCli {
    #[command(subcommand)]
    pub command: FleetCommand,
    #[clap(flatten)]
    pub target: TargetArgs,
    #[clap(flatten)]
    pub output: OutputArgs,
}

/// Available fleet operations
#[derive(clap::Subcommand, Clone, Debug)]
pub enum FleetCommand {
    /// Show fleet health: capacity, unit phases, registrations, drift
    #[clap(aliases = &["st"])]
    Status,
    /// Scale to an explicit capacity range
    #[clap(aliases = &["s"], allow_negative_numbers = true)]
    Scale {
        /// Lower capacity bound
        min: i32,
        /// Upper capacity bound
        max: i32,
    },
    /// Scale to the configured working-hours range
    Up,
    /// Scale to the configured idle range
    Down,
    /// Scale to the configured burst range
    Max,
    /// Park the fleet at zero capacity
    Zero {
        /// Acknowledge the destructive operation
        #[arg(long)]
        yes: bool,
    },
    /// Force-delete every unit so the orchestrator replaces them
    #[clap(aliases = &["r"])]
    Restart {
        /// Acknowledge the destructive operation
        #[arg(long)]
        yes: bool,
    },
    /// Delete units that finished their task (Succeeded or Failed)
    #[clap(aliases = &["gc"])]
    Cleanup,
    /// Zero capacity, force-delete all units, then verify what is left
    #[clap(aliases = &["stop"])]
    EmergencyStop {
        /// Confirmation phrase; must be exactly "EMERGENCY STOP"
        #[arg(long, value_name = "PHRASE")]
        confirm: Option<String>,
    },
}

/// Fleet targeting, overriding the FLEET_* environment
#[derive(clap::Args, Debug, Clone)]
pub struct TargetArgs {
    /// Namespace holding the fleet (FLEET_NAMESPACE)
    #[arg(short, long, global = true)]
    pub namespace: Option<String>,
    /// Fleet resource name (FLEET_NAME)
    #[arg(short, long, global = true)]
    pub fleet: Option<String>,
    /// Seconds to wait for convergence, 0 to skip (FLEET_WAIT_TIMEOUT_SECS)
    #[arg(short, long, global = true)]
    pub wait: Option<u64>,
}

/// Output formatting options
#[derive(clap::Args, Clone, Debug)]
pub struct OutputArgs {
    /// Output format
    #[arg(short = 'o', long, value_enum, default_value = "text", global = true)]
    pub output: OutputFormat,
}

/// Available output formats
#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn status_parses_with_defaults() {
        let cli = FleetCli::try_parse_from(["fleetctl", "status"]).unwrap();
        assert!(matches!(cli.command, FleetCommand::Status));
        assert_eq!(cli.output.output, OutputFormat::Text);
        assert!(cli.target.namespace.is_none());
        assert!(cli.target.fleet.is_none());
        assert!(cli.target.wait.is_none());
    }

    #[test]
    fn aliases_resolve_to_their_commands() {
        let st = FleetCli::try_parse_from(["fleetctl", "st"]).unwrap();
        assert!(matches!(st.command, FleetCommand::Status));

        let s = FleetCli::try_parse_from(["fleetctl", "s", "1", "4"]).unwrap();
        assert!(matches!(s.command, FleetCommand::Scale { min: 1, max: 4 }));

        let r = FleetCli::try_parse_from(["fleetctl", "r", "--yes"]).unwrap();
        assert!(matches!(r.command, FleetCommand::Restart { yes: true }));

        let gc = FleetCli::try_parse_from(["fleetctl", "gc"]).unwrap();
        assert!(matches!(gc.command, FleetCommand::Cleanup));

        let stop = FleetCli::try_parse_from(["fleetctl", "stop"]).unwrap();
        assert!(matches!(
            stop.command,
            FleetCommand::EmergencyStop { confirm: None }
        ));
    }

    #[test]
    fn global_flags_parse_after_the_subcommand() {
        let cli = FleetCli::try_parse_from([
            "fleetctl",
            "status",
            "-n",
            "build-farm",
            "-f",
            "linux-x64",
            "-w",
            "30",
            "-o",
            "json",
        ])
        .unwrap();
        assert_eq!(cli.target.namespace.as_deref(), Some("build-farm"));
        assert_eq!(cli.target.fleet.as_deref(), Some("linux-x64"));
        assert_eq!(cli.target.wait, Some(30));
        assert_eq!(cli.output.output, OutputFormat::Json);
    }

    #[test]
    fn scale_accepts_negative_bounds() {
        // The parser passes them through; range validation is the
        // controller's job and reports InvalidRange.
        let cli = FleetCli::try_parse_from(["fleetctl", "scale", "-1", "4"]).unwrap();
        assert!(matches!(
            cli.command,
            FleetCommand::Scale { min: -1, max: 4 }
        ));
    }

    #[test]
    fn gated_commands_carry_their_acknowledgement() {
        let zero = FleetCli::try_parse_from(["fleetctl", "zero"]).unwrap();
        assert!(matches!(zero.command, FleetCommand::Zero { yes: false }));

        let zero = FleetCli::try_parse_from(["fleetctl", "zero", "--yes"]).unwrap();
        assert!(matches!(zero.command, FleetCommand::Zero { yes: true }));

        let stop = FleetCli::try_parse_from([
            "fleetctl",
            "emergency-stop",
            "--confirm",
            "EMERGENCY STOP",
        ])
        .unwrap();
        match stop.command {
            FleetCommand::EmergencyStop { confirm } => {
                assert_eq!(confirm.as_deref(), Some("EMERGENCY STOP"));
            }
            other => panic!("parsed {other:?}"),
        }
    }

    #[test]
    fn bare_and_unknown_invocations_are_usage_errors() {
        assert!(FleetCli::try_parse_from(["fleetctl"]).is_err());
        assert!(FleetCli::try_parse_from(["fleetctl", "explode"]).is_err());
        assert!(FleetCli::try_parse_from(["fleetctl", "scale", "2"]).is_err());
    }
}
