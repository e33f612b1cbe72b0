//! High-level pipeline: orchestrates resolve → walk → diff → order → provision → execute → index.
//!
//! Each stage completes before the next one starts and every remote call is
//! awaited before the next is issued. The run owns exactly one
//! [`Session`]; it is created here and threaded through every stage that
//! mutates the remote store.
//!
//! # Major Types
//! - [`SyncReport`]: the ordered plan with the applied prefix, the untouched
//!   rest and the index outcome
//! - [`SyncFailure`]: the terminal error together with the stage it happened
//!   in and the report at the time of the stop
//!
//! # Error Handling
//! The first error of any stage ends the run. The index recalculation is the
//! exception: its failure is recorded in [`SyncReport::index`] and the run
//! still counts as synchronised.

use serde::Serialize;
use thiserror::Error;
use tracing::{error, info};

use crate::artifact::{Artifact, ChangeItem};
use crate::config::SynchroniseConfig;
use crate::contract::Transport;
use crate::diff::{diff, removals};
use crate::error::SyncError;
use crate::executor::execute;
use crate::filestore::FileStore;
use crate::index::{refresh_index, IndexOutcome};
use crate::local::{exists_locally, resolve};
use crate::order::order;
use crate::provision::ensure_container;
use crate::remote::walk;
use crate::selection::Selection;
use crate::session::Session;

#[derive(Debug, Serialize)]
pub struct SyncReport {
    pub plan: Vec<ChangeItem>,
    pub completed: Vec<ChangeItem>,
    pub remaining: Vec<ChangeItem>,
    pub index: IndexOutcome,
}

impl SyncReport {
    fn planned(plan: Vec<ChangeItem>) -> Self {
        Self {
            remaining: plan.clone(),
            plan,
            completed: Vec::new(),
            index: IndexOutcome::Skipped,
        }
    }
}

/// Pipeline stage a run stopped in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SyncStage {
    Planning,
    Provisioning,
    /// The first entry of [`SyncReport::remaining`] is the change that failed.
    Executing,
}

#[derive(Debug, Error)]
#[error("{error}")]
pub struct SyncFailure {
    #[source]
    pub error: SyncError,
    pub stage: SyncStage,
    pub report: SyncReport,
}

/// Computes the ordered plan that would bring the container in line with `selection`.
pub async fn plan<T: Transport>(
    store: &FileStore<T>,
    config: &SynchroniseConfig,
    selection: &Selection,
) -> Result<Vec<ChangeItem>, SyncError> {
    let local = resolve(&selection.present, '/');
    info!(count = local.len(), "Resolved local tree");

    let remote = walk(store).await?;

    let mut changes = diff(&local, &remote, config.preserve_unselected);
    if config.preserve_unselected {
        // Ancestors of a removed file go too, once their directory is gone.
        let removed: Vec<Artifact> = resolve(&selection.removed, '/')
            .into_iter()
            .filter(|artifact| !local.contains(artifact) && !exists_locally(&config.base_dir, artifact))
            .collect();
        changes.extend(removals(&removed, &remote));
    }

    let plan = order(changes);
    info!(changes = plan.len(), "Sync plan ready");
    Ok(plan)
}

/// Runs a full synchronisation of `selection` into the store's container.
pub async fn synchronise<T: Transport>(
    store: &FileStore<T>,
    config: &SynchroniseConfig,
    selection: &Selection,
) -> Result<SyncReport, SyncFailure> {
    info!(container = %store.container(), "[SYNC] Starting synchronisation");

    let plan = match plan(store, config, selection).await {
        Ok(plan) => plan,
        Err(e) => {
            error!(error = %e, "[SYNC][ERROR] Could not compute sync plan");
            return Err(SyncFailure {
                error: e,
                stage: SyncStage::Planning,
                report: SyncReport::planned(Vec::new()),
            });
        }
    };

    let mut session = Session::new();

    if let Err(e) = ensure_container(store, &mut session).await {
        error!(error = %e, "[SYNC][ERROR] Container provisioning failed");
        return Err(SyncFailure {
            error: e,
            stage: SyncStage::Provisioning,
            report: SyncReport::planned(plan),
        });
    }

    let execution = execute(store, &mut session, &config.base_dir, &plan).await;
    let mut report = SyncReport {
        plan,
        completed: execution.completed,
        remaining: execution.remaining,
        index: IndexOutcome::Skipped,
    };

    if let Some(e) = execution.error {
        error!(
            completed = report.completed.len(),
            remaining = report.remaining.len(),
            error = %e,
            "[SYNC][ERROR] Synchronisation stopped"
        );
        return Err(SyncFailure {
            error: e,
            stage: SyncStage::Executing,
            report,
        });
    }

    report.index = refresh_index(store, &mut session, config.recalculate_index).await;

    info!(
        applied = report.completed.len(),
        index = ?report.index,
        "[SYNC] Synchronisation complete"
    );
    Ok(report)
}
