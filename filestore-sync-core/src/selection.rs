//! Local file selection: which files below the base directory take part in a run.
//!
//! Two strategies, both producing base-relative, `/`-separated paths:
//! - a glob walk over the base directory
//! - the files git reports as changed since a commit (optionally including
//!   unstaged changes), filtered by the same glob

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::process::Command;

use globset::{GlobBuilder, GlobMatcher};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};
use walkdir::WalkDir;

use crate::error::{Result, SyncError};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectionConfig {
    pub base_dir: PathBuf,
    /// Glob relative to `base_dir`, see [`GlobPattern`].
    pub pattern: String,
    #[serde(default)]
    pub include_dotfiles: bool,
    /// Select only files changed since this commit, branch or reference.
    #[serde(default)]
    pub git_diff_commit: Option<String>,
    #[serde(default)]
    pub git_diff_unstaged: bool,
}

/// Selected paths split by whether they still exist on disk.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    pub present: Vec<String>,
    /// Reported by git but gone from the working tree.
    pub removed: Vec<String>,
}

impl Selection {
    pub fn is_empty(&self) -> bool {
        self.present.is_empty() && self.removed.is_empty()
    }

    pub fn len(&self) -> usize {
        self.present.len() + self.removed.len()
    }
}

/// Compiled glob over `/`-separated relative paths.
///
/// `*`, `?` and `[...]` stay within a segment, `**` spans segments and
/// `{a,b}` lists alternatives.
#[derive(Debug, Clone)]
pub struct GlobPattern {
    matcher: GlobMatcher,
}

impl GlobPattern {
    pub fn new(pattern: &str) -> Result<Self> {
        let glob = GlobBuilder::new(pattern.trim_start_matches("./"))
            .literal_separator(true)
            .build()
            .map_err(|e| SyncError::LocalSelection(format!("invalid pattern {pattern:?}: {e}")))?;
        Ok(Self {
            matcher: glob.compile_matcher(),
        })
    }

    pub fn matches(&self, relative_path: &str) -> bool {
        self.matcher.is_match(relative_path)
    }
}

pub fn select(config: &SelectionConfig) -> Result<Selection> {
    let pattern = GlobPattern::new(&config.pattern)?;

    let selection = match config.git_diff_commit.as_deref().filter(|c| !c.is_empty()) {
        Some(commit) => {
            let changed = git_changed_files(&config.base_dir, commit, config.git_diff_unstaged)?;
            let mut selection = Selection::default();
            for path in changed.into_iter().filter(|p| pattern.matches(p)) {
                if config.base_dir.join(&path).is_file() {
                    selection.present.push(path);
                } else {
                    selection.removed.push(path);
                }
            }
            selection
        }
        None => Selection {
            present: glob_files(&config.base_dir, &pattern, config.include_dotfiles)?,
            removed: Vec::new(),
        },
    };

    info!(
        base_dir = %config.base_dir.display(),
        present = selection.present.len(),
        removed = selection.removed.len(),
        "Selected local files"
    );
    Ok(selection)
}

/// Walks `base_dir` and returns every regular file matching `pattern`, sorted.
pub fn glob_files(base_dir: &Path, pattern: &GlobPattern, include_dotfiles: bool) -> Result<Vec<String>> {
    if !base_dir.is_dir() {
        return Err(SyncError::LocalSelection(format!(
            "base directory {} does not exist",
            base_dir.display()
        )));
    }

    let mut files = Vec::new();
    let walker = WalkDir::new(base_dir)
        .follow_links(true)
        .into_iter()
        .filter_entry(|entry| include_dotfiles || entry.depth() == 0 || !is_hidden(entry.file_name()));

    for entry in walker {
        let entry = entry.map_err(|e| SyncError::LocalSelection(format!("walking {}: {e}", base_dir.display())))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = match entry.path().strip_prefix(base_dir) {
            Ok(relative) => relative,
            Err(_) => continue,
        };
        let relative = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        if pattern.matches(&relative) {
            files.push(relative);
        }
    }

    files.sort();
    debug!(count = files.len(), "Glob selection complete");
    Ok(files)
}

fn is_hidden(name: &std::ffi::OsStr) -> bool {
    name.to_string_lossy().starts_with('.')
}

/// Files changed since `commit` (and unstaged changes if requested), relative to `base_dir`.
///
/// Only paths below `base_dir` are reported. Deleted files are included; the
/// caller decides what to do with paths that no longer exist. The glob is not
/// handed to git, whose pathspec syntax differs.
pub fn git_changed_files(base_dir: &Path, commit: &str, include_unstaged: bool) -> Result<Vec<String>> {
    let mut seen = HashSet::new();
    let mut files = Vec::new();

    if include_unstaged {
        let stdout = run_git(base_dir, &["status", "--short", "-u", "--", "."])?;
        for path in parse_status(&stdout) {
            if seen.insert(path.clone()) {
                files.push(path);
            }
        }
    }

    let stdout = run_git(
        base_dir,
        &["diff", "-r", "--name-status", "--no-renames", "--relative", commit, "--", "."],
    )?;
    for path in parse_name_status(&stdout) {
        if seen.insert(path.clone()) {
            files.push(path);
        }
    }

    debug!(count = files.len(), commit, include_unstaged, "Git selection complete");
    Ok(files)
}

fn run_git(base_dir: &Path, args: &[&str]) -> Result<String> {
    let output = Command::new("git")
        .arg("-C")
        .arg(base_dir)
        .args(["-c", "core.quotePath=false", "-c", "status.relativePaths=true"])
        .args(args)
        .output()
        .map_err(|e| {
            error!(error = ?e, "Failed to launch git process");
            SyncError::LocalSelection(format!("failed to launch git: {e}"))
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        error!(args = ?args, status = ?output.status, "Git exited with non-zero code");
        return Err(SyncError::LocalSelection(format!(
            "git {} failed: {}",
            args.join(" "),
            stderr.trim()
        )));
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Paths from `git status --short` whose work-tree column shows a change.
pub fn parse_status(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .filter(|line| line.len() > 3)
        .filter(|line| line.as_bytes()[1] != b' ')
        .map(|line| unquote(&line[3..]))
        .collect()
}

/// Paths from `git diff --name-status` output (`<status>\t<path>`).
pub fn parse_name_status(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .filter_map(|line| line.split('\t').nth(1))
        .filter(|path| !path.is_empty())
        .map(unquote)
        .collect()
}

/// Undoes git's C-style quoting of unusual path names.
///
/// Octal escapes are raw bytes of a UTF-8 name, so `"k\303\244se.txt"` is `käse.txt`.
pub fn unquote(path: &str) -> String {
    let path = path.trim();
    let inner = match path.strip_prefix('"').and_then(|p| p.strip_suffix('"')) {
        Some(inner) => inner.as_bytes(),
        None => return path.to_string(),
    };

    let mut bytes = Vec::with_capacity(inner.len());
    let mut i = 0;
    while i < inner.len() {
        if inner[i] != b'\\' || i + 1 == inner.len() {
            bytes.push(inner[i]);
            i += 1;
            continue;
        }
        let escaped = inner[i + 1];
        if (b'0'..=b'7').contains(&escaped) {
            let digits = inner[i + 1..]
                .iter()
                .take(3)
                .take_while(|b| (b'0'..=b'7').contains(*b))
                .count();
            let value = inner[i + 1..i + 1 + digits]
                .iter()
                .fold(0u32, |acc, b| acc * 8 + u32::from(b - b'0'));
            bytes.push(value as u8);
            i += 1 + digits;
            continue;
        }
        bytes.push(match escaped {
            b'a' => 0x07,
            b'b' => 0x08,
            b't' => b'\t',
            b'n' => b'\n',
            b'v' => 0x0b,
            b'f' => 0x0c,
            b'r' => b'\r',
            other => other,
        });
        i += 2;
    }

    String::from_utf8_lossy(&bytes).into_owned()
}
