//! Command-line glue for `filestore-sync`.
//!
//! Parses the `upload` subcommand, merges flags with the optional YAML file,
//! selects the local files and hands everything to the reconciliation engine
//! in [`filestore_sync_core`]. No business logic lives here; this module only
//! wires collaborators together and prints the run summary on stdout.

use std::path::PathBuf;

use anyhow::{anyhow, bail, Context, Result};
use clap::builder::BoolishValueParser;
use clap::{Args, Parser, Subcommand};
use filestore_sync_core::artifact::ChangeItem;
use filestore_sync_core::filestore::FileStore;
use filestore_sync_core::selection::select;
use filestore_sync_core::synchronise::{plan, synchronise, SyncReport, SyncStage};

use crate::load_config::load_config;
use crate::transport::ReqwestTransport;

/// CLI for filestore-sync: deploy a local build into a UI5 filestore container.
#[derive(Parser)]
#[clap(
    name = "filestore-sync",
    version,
    about = "Synchronise a local file tree into an SAP UI5 filestore (BSP) container"
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Upload the selected files, deleting remote files that are not selected
    Upload(UploadArgs),
}

/// Every option may also come from the YAML file given with `--config`; flags win.
#[derive(Args, Debug, Default, Clone)]
pub struct UploadArgs {
    /// Path to a YAML config file
    #[clap(long)]
    pub config: Option<PathBuf>,

    /// Server root URL, e.g. https://host:44300
    #[clap(long)]
    pub server: Option<String>,
    /// SAP client, sent as the sap-client URL parameter
    #[clap(long)]
    pub client: Option<String>,
    /// User name (or FILESTORE_USER)
    #[clap(long)]
    pub user: Option<String>,
    /// Password (or FILESTORE_PASSWORD)
    #[clap(long)]
    pub password: Option<String>,
    /// Verify TLS certificates; disable for self-signed certificates
    #[clap(long, value_parser = BoolishValueParser::new())]
    pub strict_ssl: Option<bool>,

    /// Local base directory
    #[clap(long)]
    pub base: Option<PathBuf>,
    /// Files to upload, as a glob relative to the base directory
    #[clap(long)]
    pub files: Option<String>,
    /// Also select files and folders whose name starts with a dot
    #[clap(long)]
    pub include_dotfiles: bool,

    /// Package the container and its content are assigned to
    #[clap(long)]
    pub package: Option<String>,
    /// BSP container name
    #[clap(long)]
    pub container: Option<String>,
    /// Description used when the container has to be created
    #[clap(long)]
    pub container_description: Option<String>,
    /// Transport request number
    #[clap(long)]
    pub transport: Option<String>,
    /// Logon language
    #[clap(long)]
    pub language: Option<String>,
    /// Recalculate the application index after a successful upload
    #[clap(long)]
    pub recalculate_index: bool,

    /// Only upload files changed since this commit, branch or reference
    #[clap(long)]
    pub git_diff_commit: Option<String>,
    /// Include unstaged changes in the git selection
    #[clap(long)]
    pub git_diff_unstaged: bool,
    /// Keep remote files that were not selected
    #[clap(long)]
    pub preserve_unselected: bool,

    /// Print the change plan without touching the remote container
    #[clap(long)]
    pub dry_run: bool,
}

/// How a successful invocation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Synchronised,
    /// All changes applied, but the application index recalculation failed.
    IndexRefreshFailed,
    Planned,
}

/// Extracted async CLI logic entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<RunOutcome> {
    match cli.command {
        Commands::Upload(args) => upload(args).await,
    }
}

async fn upload(args: UploadArgs) -> Result<RunOutcome> {
    let config = load_config(&args)?;
    config.filestore.trace_loaded();
    config.synchronise.trace_loaded();

    if config.connection.strict_ssl {
        println!("If HTTPS is used, strict SSL is enabled.");
    }

    let selection = select(&config.selection).context("Selecting local files failed")?;
    if selection.is_empty() {
        bail!("No files found. Stopping...");
    }
    println!("Found {} files. Starting upload...", selection.len());

    let transport = ReqwestTransport::new(&config.connection)
        .map_err(|e| anyhow!("Failed to build HTTP client: {e}"))?;
    let store = FileStore::new(config.filestore, transport);

    if args.dry_run {
        let plan = plan(&store, &config.synchronise, &selection)
            .await
            .context("Computing the change plan failed")?;
        print_plan(&plan);
        return Ok(RunOutcome::Planned);
    }

    match synchronise(&store, &config.synchronise, &selection).await {
        Ok(report) => {
            print_report(&report, false);
            if let Some(e) = report.index.error() {
                println!("[FAILED] Calculating application index: {e}");
                return Ok(RunOutcome::IndexRefreshFailed);
            }
            println!("Upload complete.");
            Ok(RunOutcome::Synchronised)
        }
        Err(failure) => {
            print_report(&failure.report, failure.stage == SyncStage::Executing);
            let stage = failure.stage;
            Err(anyhow::Error::new(failure.error).context(format!("Synchronisation failed during {stage:?}")))
        }
    }
}

fn print_plan(plan: &[ChangeItem]) {
    println!("{} planned changes:", plan.len());
    for item in plan {
        println!("  {} {} {}", item.disposition, item.kind, item.id);
    }
}

fn print_report(report: &SyncReport, failed_on_change: bool) {
    println!("{} planned changes.", report.plan.len());
    for item in &report.completed {
        println!("[OK] {}d.", item);
    }
    let mut remaining = report.remaining.iter();
    if failed_on_change {
        if let Some(failed) = remaining.next() {
            println!("[FAILED] {}d.", failed);
        }
    }
    for item in remaining {
        println!("[SKIPPED] {}.", item);
    }
}
