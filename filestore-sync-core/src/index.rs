//! Index Refresher: optional application index recalculation after a run.

use serde::Serialize;
use tracing::{error, info};

use crate::contract::Transport;
use crate::error::SyncError;
use crate::filestore::FileStore;
use crate::session::Session;

/// Result of the post-sync index step. A failure here does not undo the sync.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum IndexOutcome {
    /// Recalculation is not enabled for this run.
    Skipped,
    Recalculated,
    Failed(String),
}

impl IndexOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, IndexOutcome::Failed(_))
    }

    pub fn error(&self) -> Option<SyncError> {
        match self {
            IndexOutcome::Failed(message) => Some(SyncError::IndexRefreshFailed(message.clone())),
            _ => None,
        }
    }
}

pub async fn refresh_index<T: Transport>(
    store: &FileStore<T>,
    session: &mut Session,
    enabled: bool,
) -> IndexOutcome {
    if !enabled {
        return IndexOutcome::Skipped;
    }

    let result = match session.ensure(store).await {
        Ok(credentials) => store.recalculate_index(credentials).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(()) => {
            info!(container = %store.container(), "[OK] Calculating application index.");
            IndexOutcome::Recalculated
        }
        Err(e) => {
            error!(container = %store.container(), error = %e, "[FAILED] Calculating application index.");
            IndexOutcome::Failed(e.to_string())
        }
    }
}
