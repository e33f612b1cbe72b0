//! Local Tree Resolver and content helpers for files below the base directory.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::artifact::{Artifact, ArtifactKind};
use crate::path::to_id;

/// Expands relative file paths into file artifacts plus every implied ancestor folder.
///
/// Purely string based: nothing is read from disk. Duplicates are removed and
/// the result is sorted by `(kind, id)`.
pub fn resolve<S: AsRef<str>>(paths: &[S], separator: char) -> Vec<Artifact> {
    let mut artifacts = BTreeSet::new();

    for path in paths {
        let id = to_id(path.as_ref(), separator);
        if id == "/" {
            continue;
        }

        let segments: Vec<&str> = id[1..].split('/').collect();
        for depth in 1..segments.len() {
            artifacts.insert(Artifact::folder(format!("/{}", segments[..depth].join("/"))));
        }
        artifacts.insert(Artifact::file(id));
    }

    artifacts.into_iter().collect()
}

/// Location on disk of the artifact `id` below `base_dir`.
pub fn local_path(base_dir: &Path, id: &str) -> PathBuf {
    id.split('/')
        .filter(|segment| !segment.is_empty())
        .fold(base_dir.to_path_buf(), |path, segment| path.join(segment))
}

/// Whether `artifact` exists below `base_dir` as an entry of the same kind.
pub fn exists_locally(base_dir: &Path, artifact: &Artifact) -> bool {
    let path = local_path(base_dir, &artifact.id);
    match artifact.kind {
        ArtifactKind::File => path.is_file(),
        ArtifactKind::Folder => path.is_dir(),
    }
}

const BINARY_SAMPLE: usize = 8000;

/// Heuristic binary check on the start of a file's content.
pub fn is_binary(content: &[u8]) -> bool {
    let sample = &content[..content.len().min(BINARY_SAMPLE)];
    if sample.is_empty() {
        return false;
    }
    if sample.contains(&0) {
        return true;
    }

    match std::str::from_utf8(sample) {
        Ok(_) => false,
        // The sample may cut a multi-byte character in half.
        Err(e) if e.error_len().is_none() => false,
        Err(_) => {
            let control = sample
                .iter()
                .filter(|b| **b < 7 || (**b > 13 && **b < 32))
                .count();
            control * 10 > sample.len() || !looks_like_latin1_text(sample)
        }
    }
}

fn looks_like_latin1_text(sample: &[u8]) -> bool {
    sample
        .iter()
        .all(|b| *b >= 0xa0 || (*b >= 0x20 && *b < 0x7f) || matches!(*b, b'\t' | b'\n' | b'\r'))
}
