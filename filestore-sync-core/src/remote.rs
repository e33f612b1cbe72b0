//! Remote Tree Walker: enumerates the container into a flat artifact list.

use std::collections::VecDeque;

use tracing::{debug, info};

use crate::artifact::{Artifact, ArtifactKind};
use crate::contract::Transport;
use crate::error::Result;
use crate::filestore::FileStore;
use crate::path::normalize_remote_id;

/// Lists every artifact below the container, breadth-first, one folder at a time.
///
/// A container that does not exist yields an empty list. Folders that vanish
/// while the walk is in progress are treated as empty.
pub async fn walk<T: Transport>(store: &FileStore<T>) -> Result<Vec<Artifact>> {
    let container = store.container().to_string();
    info!(container = %container, "Reading remote tree");

    let mut queue: VecDeque<String> = VecDeque::new();
    queue.push_back(container.clone());
    let mut artifacts = Vec::new();

    while let Some(folder) = queue.pop_front() {
        let entries = match store.list_folder(&folder).await? {
            Some(entries) => entries,
            None if folder == container => {
                info!(container = %container, "Container does not exist yet");
                return Ok(Vec::new());
            }
            None => {
                debug!(folder = %folder, "Folder disappeared during listing");
                continue;
            }
        };
        debug!(folder = %folder, children = entries.len(), "Listed remote folder");

        for entry in entries {
            if entry.kind == ArtifactKind::Folder {
                queue.push_back(entry.raw_id.clone());
            }
            artifacts.push(Artifact {
                kind: entry.kind,
                id: normalize_remote_id(&entry.raw_id, &container),
            });
        }
    }

    info!(count = artifacts.len(), "Remote tree read");
    Ok(artifacts)
}

/// Existence probe for the container, shared with the provisioner.
pub async fn container_exists<T: Transport>(store: &FileStore<T>) -> Result<bool> {
    store.container_exists().await
}
