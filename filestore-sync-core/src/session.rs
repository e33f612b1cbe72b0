//! Session Manager: one anti-forgery token and cookie pair per run.
//!
//! The pair is fetched lazily on first use and then reused for every
//! mutating call of the run. It is never refreshed; if the server stops
//! accepting it, the failing call surfaces as [`SyncError::AuthRejected`].

use tracing::debug;

use crate::contract::Transport;
use crate::error::{Result, SyncError};
use crate::filestore::{Credentials, FileStore};

#[derive(Debug, Default)]
pub struct Session {
    credentials: Option<Credentials>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached credentials, if the session has been established.
    pub fn credentials(&self) -> Option<&Credentials> {
        self.credentials.as_ref()
    }

    /// Fetches the token and cookie unless they are already cached.
    pub async fn ensure<T: Transport>(&mut self, store: &FileStore<T>) -> Result<&Credentials> {
        if self.credentials.is_none() {
            let fetched = store.fetch_token().await?;
            self.credentials = Some(fetched);
        } else {
            debug!("Reusing cached anti-forgery token");
        }

        self.credentials
            .as_ref()
            .ok_or_else(|| SyncError::RemoteUnavailable("session credentials missing".to_string()))
    }
}
