//! Error types for synchronisation runs.
//!
//! Every variant is terminal: a run stops at the first error it meets and
//! nothing is retried. "Not found" answers from the filestore never show up
//! here; they are folded into control flow by the callers that expect them.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Authentication rejected by {url} (status {status}): {message}")]
    AuthRejected {
        url: String,
        status: u16,
        message: String,
    },

    #[error("Remote filestore unavailable: {0}")]
    RemoteUnavailable(String),

    #[error("Container {container} could not be created: {message}")]
    ProvisionFailed { container: String, message: String },

    #[error("Failed to read local file {path}: {source}")]
    LocalReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unsupported disposition {disposition} for {kind} {id}")]
    UnsupportedDisposition {
        kind: String,
        id: String,
        disposition: String,
    },

    #[error("Local file selection failed: {0}")]
    LocalSelection(String),

    #[error("Application index recalculation failed: {0}")]
    IndexRefreshFailed(String),
}

impl SyncError {
    pub fn local_read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::LocalReadFailed {
            path: path.into(),
            source,
        }
    }

    /// Short machine-friendly name of the error kind, used in reports.
    pub fn kind(&self) -> &'static str {
        match self {
            SyncError::AuthRejected { .. } => "AuthRejected",
            SyncError::RemoteUnavailable(_) => "RemoteUnavailable",
            SyncError::ProvisionFailed { .. } => "ProvisionFailed",
            SyncError::LocalReadFailed { .. } => "LocalReadFailed",
            SyncError::UnsupportedDisposition { .. } => "UnsupportedDisposition",
            SyncError::LocalSelection(_) => "LocalSelection",
            SyncError::IndexRefreshFailed(_) => "IndexRefreshFailed",
        }
    }
}

pub type Result<T> = std::result::Result<T, SyncError>;
