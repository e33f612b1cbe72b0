//! Sync Executor: applies an ordered plan one change at a time.
//!
//! Changes are never issued concurrently; a later change may only be valid
//! because an earlier one completed. The first failure stops the run and
//! nothing already applied is rolled back.

use std::path::Path;

use serde::Serialize;
use tracing::{error, info};

use crate::artifact::{ArtifactKind, ChangeItem, Disposition};
use crate::contract::Transport;
use crate::error::{Result, SyncError};
use crate::filestore::FileStore;
use crate::local::{is_binary, local_path};
use crate::session::Session;

/// What happened to a plan: the applied prefix, the untouched rest, and the stop reason.
#[derive(Debug, Default, Serialize)]
pub struct ExecutionReport {
    pub completed: Vec<ChangeItem>,
    /// The failing change (if any) followed by every change not attempted.
    pub remaining: Vec<ChangeItem>,
    #[serde(skip)]
    pub error: Option<SyncError>,
}

impl ExecutionReport {
    pub fn is_complete(&self) -> bool {
        self.error.is_none() && self.remaining.is_empty()
    }
}

pub async fn execute<T: Transport>(
    store: &FileStore<T>,
    session: &mut Session,
    base_dir: &Path,
    plan: &[ChangeItem],
) -> ExecutionReport {
    let mut report = ExecutionReport::default();

    for (index, item) in plan.iter().enumerate() {
        match apply(store, session, base_dir, item).await {
            Ok(()) => {
                info!(kind = %item.kind, id = %item.id, "[OK] {} {} {}d.", item.kind, item.id, item.disposition);
                report.completed.push(item.clone());
            }
            Err(e) => {
                error!(
                    kind = %item.kind,
                    id = %item.id,
                    error = %e,
                    "[FAILED] {} {} {}d.",
                    item.kind,
                    item.id,
                    item.disposition
                );
                report.remaining = plan[index..].to_vec();
                report.error = Some(e);
                return report;
            }
        }
    }

    report
}

async fn apply<T: Transport>(
    store: &FileStore<T>,
    session: &mut Session,
    base_dir: &Path,
    item: &ChangeItem,
) -> Result<()> {
    if !is_valid_id(&item.id) {
        return Err(SyncError::UnsupportedDisposition {
            kind: item.kind.to_string(),
            id: item.id.clone(),
            disposition: item.disposition.to_string(),
        });
    }

    match (item.kind, item.disposition) {
        // The filestore has no folder update primitive.
        (ArtifactKind::Folder, Disposition::Update) => Ok(()),
        (ArtifactKind::Folder, Disposition::Create) => {
            let credentials = session.ensure(store).await?;
            store.create_folder(credentials, &item.id).await
        }
        (ArtifactKind::Folder, Disposition::Delete) => {
            let credentials = session.ensure(store).await?;
            store.delete_folder(credentials, &item.id).await
        }
        (ArtifactKind::File, Disposition::Create) => {
            let (content, binary) = read_content(base_dir, &item.id).await?;
            let credentials = session.ensure(store).await?;
            store.create_file(credentials, &item.id, content, binary).await
        }
        (ArtifactKind::File, Disposition::Update) => {
            let (content, binary) = read_content(base_dir, &item.id).await?;
            let credentials = session.ensure(store).await?;
            store.update_file(credentials, &item.id, content, binary).await
        }
        (ArtifactKind::File, Disposition::Delete) => {
            let credentials = session.ensure(store).await?;
            store.delete_file(credentials, &item.id).await
        }
    }
}

async fn read_content(base_dir: &Path, id: &str) -> Result<(Vec<u8>, bool)> {
    let path = local_path(base_dir, id);
    let content = tokio::fs::read(&path)
        .await
        .map_err(|e| SyncError::local_read(&path, e))?;
    let binary = is_binary(&content);
    Ok((content, binary))
}

/// A change must address a normalised, non-root entity below the container.
fn is_valid_id(id: &str) -> bool {
    id.len() > 1
        && id.starts_with('/')
        && !id.ends_with('/')
        && !id[1..].split('/').any(|segment| segment.is_empty())
}
