//! Differ: classifies every `(kind, id)` of the local and remote trees.
//!
//! The comparison key is the pair, not the path: a local file and a remote
//! folder at the same id are unrelated and classified independently.

use std::collections::BTreeSet;

use tracing::debug;

use crate::artifact::{Artifact, ChangeItem, Disposition};

/// Produces one change per distinct artifact in `local ∪ remote`.
///
/// - local only: `Create`
/// - both: `Update`
/// - remote only: `Delete`, unless `preserve_unselected` is set, in which case
///   the artifact is left alone.
///
/// Listings carry no content hash or timestamp, so an artifact on both sides is
/// always an `Update`. Running twice over an unchanged tree plans no creates or
/// deletes but still rewrites every file.
pub fn diff(local: &[Artifact], remote: &[Artifact], preserve_unselected: bool) -> Vec<ChangeItem> {
    let local_set: BTreeSet<&Artifact> = local.iter().collect();
    let remote_set: BTreeSet<&Artifact> = remote.iter().collect();

    let mut changes = Vec::new();

    for artifact in &local_set {
        let disposition = if remote_set.contains(artifact) {
            Disposition::Update
        } else {
            Disposition::Create
        };
        changes.push(ChangeItem::new((*artifact).clone(), disposition));
    }

    if !preserve_unselected {
        for artifact in remote_set.difference(&local_set) {
            changes.push(ChangeItem::new((*artifact).clone(), Disposition::Delete));
        }
    }

    debug!(
        local = local_set.len(),
        remote = remote_set.len(),
        changes = changes.len(),
        preserve_unselected,
        "Computed tree diff"
    );
    changes
}

/// Deletes for artifacts that were explicitly removed locally and still exist remotely.
///
/// Used under "preserve unselected", where the regular diff would keep them.
/// `removed` holds files and the folders they leave empty; the caller has
/// already dropped anything that still exists locally.
pub fn removals(removed: &[Artifact], remote: &[Artifact]) -> Vec<ChangeItem> {
    let remote_set: BTreeSet<&Artifact> = remote.iter().collect();

    removed
        .iter()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .filter(|artifact| remote_set.contains(artifact))
        .map(|artifact| ChangeItem::new(artifact.clone(), Disposition::Delete))
        .collect()
}
