//! Container Provisioner: makes sure the root container exists.

use tracing::{error, info};

use crate::contract::Transport;
use crate::error::Result;
use crate::filestore::{ContainerCreation, FileStore};
use crate::remote::container_exists;
use crate::session::Session;

/// Creates the container if the metadata probe reports it missing.
///
/// Calling it for an existing container does nothing beyond the probe and
/// establishing the session.
pub async fn ensure_container<T: Transport>(store: &FileStore<T>, session: &mut Session) -> Result<()> {
    let credentials = session.ensure(store).await?;

    if container_exists(store).await? {
        info!(container = %store.container(), "Container exists");
        return Ok(());
    }

    match store.create_container(credentials).await {
        Ok(ContainerCreation::Created) => {
            info!(container = %store.container(), "[OK] Container created");
            Ok(())
        }
        Ok(ContainerCreation::AlreadyExists) => {
            info!(container = %store.container(), "[OK] Container already exists");
            Ok(())
        }
        Err(e) => {
            error!(container = %store.container(), error = %e, "[FAILED] Container creation");
            Err(e)
        }
    }
}
