use std::process::ExitCode;

use clap::Parser;
use fleet_cli::FleetCli;
use tokio_util::sync::CancellationToken;
use tracing::warn;

#[tokio::main(flavor = "multi_thread")]
async fn main() -> ExitCode {
    fleet_control::init_tracing("warn");

    // Ensure rustls uses the aws-lc-rs provider explicitly.
    // This avoids runtime errors when no default provider is set.
    if let Err(e) = rustls::crypto::CryptoProvider::install_default(
        rustls::crypto::aws_lc_rs::default_provider(),
    ) {
        // It's fine if a compatible provider was already installed.
        tracing::debug!(
            ?e,
            "CryptoProvider already installed or incompatible; proceeding"
        );
    }

    let cli = FleetCli::parse();

    // First Ctrl-C cancels the in-flight operation; commands treat that as
    // `Cancelled` rather than killing the process mid-write.
    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, cancelling the running operation");
            interrupt.cancel();
        }
    });

    fleet_cli::run(cli, cancel).await
}
