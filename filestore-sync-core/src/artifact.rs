//! Data model shared by both tree snapshots and the sync plan.
//!
//! An [`Artifact`] is a node in either the local or the remote tree, keyed by
//! `(kind, id)`. A [`ChangeItem`] is an artifact the Differ decided to create,
//! update or delete.

use std::fmt;

use serde::Serialize;

/// Kind of a node in the filestore tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum ArtifactKind {
    File,
    Folder,
}

impl ArtifactKind {
    /// Maps the Atom `category@term` value of a listing entry.
    pub fn from_term(term: &str) -> Option<Self> {
        match term {
            "file" => Some(ArtifactKind::File),
            "folder" => Some(ArtifactKind::Folder),
            _ => None,
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArtifactKind::File => f.write_str("File"),
            ArtifactKind::Folder => f.write_str("Folder"),
        }
    }
}

/// A file or folder identified by its container-relative path.
///
/// `id` always starts with `/`, uses `/` as separator and has no trailing
/// slash, so `/index.html` lives directly in the container.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Artifact {
    pub kind: ArtifactKind,
    pub id: String,
}

impl Artifact {
    pub fn file(id: impl Into<String>) -> Self {
        Self {
            kind: ArtifactKind::File,
            id: id.into(),
        }
    }

    pub fn folder(id: impl Into<String>) -> Self {
        Self {
            kind: ArtifactKind::Folder,
            id: id.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Disposition {
    Create,
    Update,
    Delete,
}

impl fmt::Display for Disposition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Disposition::Create => f.write_str("create"),
            Disposition::Update => f.write_str("update"),
            Disposition::Delete => f.write_str("delete"),
        }
    }
}

/// One planned operation against the remote store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChangeItem {
    pub kind: ArtifactKind,
    pub id: String,
    pub disposition: Disposition,
    /// Number of path segments in `id`. Only used for ordering.
    pub depth: usize,
}

impl ChangeItem {
    pub fn new(artifact: Artifact, disposition: Disposition) -> Self {
        let depth = depth_of(&artifact.id);
        Self {
            kind: artifact.kind,
            id: artifact.id,
            disposition,
            depth,
        }
    }

    pub fn artifact(&self) -> Artifact {
        Artifact {
            kind: self.kind,
            id: self.id.clone(),
        }
    }
}

impl fmt::Display for ChangeItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.kind, self.id, self.disposition)
    }
}

/// Counts the segments of a normalised id: `/a` is 1, `/a/b` is 2.
pub fn depth_of(id: &str) -> usize {
    id.split('/').filter(|segment| !segment.is_empty()).count()
}
