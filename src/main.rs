use std::process::ExitCode;

use clap::Parser;
use filestore_sync::cli::{run, Cli, RunOutcome};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    // Logs go to stderr so stdout only carries the run summary.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();
    tracing::info!("CLI application startup: tracing initialised, environment loaded");

    let cli = Cli::parse();
    match run(cli).await {
        Ok(RunOutcome::IndexRefreshFailed) => {
            tracing::warn!("CLI completed, application index is stale");
            ExitCode::from(2)
        }
        Ok(outcome) => {
            tracing::info!(?outcome, "CLI completed successfully");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "CLI exited with error");
            eprintln!("[ERROR] {e:#}");
            ExitCode::from(1)
        }
    }
}
