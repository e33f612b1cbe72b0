//! Operation Orderer: arranges changes so every intermediate remote state is valid.
//!
//! The filestore has no transactions, so the order is the only guarantee:
//!
//! 1. delete files
//! 2. delete folders, deepest first
//! 3. create folders, shallowest first
//! 4. update folders (no remote call, kept as its own bucket)
//! 5. create files
//! 6. update files
//!
//! Within a bucket the incoming order is kept (the sorts are stable).

use tracing::debug;

use crate::artifact::{ArtifactKind, ChangeItem, Disposition};

pub fn order(changes: Vec<ChangeItem>) -> Vec<ChangeItem> {
    let mut delete_files = Vec::new();
    let mut delete_folders = Vec::new();
    let mut create_folders = Vec::new();
    let mut update_folders = Vec::new();
    let mut create_files = Vec::new();
    let mut update_files = Vec::new();

    for item in changes {
        match (item.kind, item.disposition) {
            (ArtifactKind::File, Disposition::Delete) => delete_files.push(item),
            (ArtifactKind::Folder, Disposition::Delete) => delete_folders.push(item),
            (ArtifactKind::Folder, Disposition::Create) => create_folders.push(item),
            (ArtifactKind::Folder, Disposition::Update) => update_folders.push(item),
            (ArtifactKind::File, Disposition::Create) => create_files.push(item),
            (ArtifactKind::File, Disposition::Update) => update_files.push(item),
        }
    }

    delete_folders.sort_by(|a, b| b.depth.cmp(&a.depth));
    create_folders.sort_by(|a, b| a.depth.cmp(&b.depth));

    debug!(
        delete_files = delete_files.len(),
        delete_folders = delete_folders.len(),
        create_folders = create_folders.len(),
        update_folders = update_folders.len(),
        create_files = create_files.len(),
        update_files = update_files.len(),
        "Ordered sync plan"
    );

    let mut plan = delete_files;
    plan.append(&mut delete_folders);
    plan.append(&mut create_folders);
    plan.append(&mut update_folders);
    plan.append(&mut create_files);
    plan.append(&mut update_files);
    plan
}
