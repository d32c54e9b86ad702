//! Orphan removal from a destination directory.
//!
//! A file is an orphan when no template produces it and it is not on the
//! allow-list. Only regular, non-hidden files directly inside the directory
//! are considered; sub-directories belong to expansions and are pruned as
//! their own scope.

use std::collections::BTreeSet;
use std::io::ErrorKind;
use std::path::PathBuf;

use serde::Serialize;

use regen_core::types::is_hidden;

use crate::error::{io_err, SyncError};

/// One directory to prune and what must survive in it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PruneTarget {
    pub dir: PathBuf,
    /// Output names some template will produce.
    pub known: BTreeSet<String>,
    /// Names that are never removed.
    pub allow: BTreeSet<String>,
    /// When set, files without this suffix are left alone.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub managed_suffix: Option<String>,
    /// Which group or expansion owns the directory, for messages.
    pub owner: String,
}

/// A file that should have been removed but could not be.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PruneWarning {
    pub path: PathBuf,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PruneReport {
    pub removed: Vec<PathBuf>,
    pub warnings: Vec<PruneWarning>,
}

impl PruneReport {
    pub fn merge(&mut self, other: PruneReport) {
        self.removed.extend(other.removed);
        self.warnings.extend(other.warnings);
    }
}

/// Whether `name` would be deleted from a directory governed by `target`.
pub fn is_orphan(target: &PruneTarget, name: &str) -> bool {
    if is_hidden(name) || target.known.contains(name) || target.allow.contains(name) {
        return false;
    }
    match &target.managed_suffix {
        Some(suffix) => name.ends_with(suffix.as_str()),
        None => true,
    }
}

/// Delete orphans from `target.dir`.
///
/// A missing directory yields an empty report. Failing to delete one file
/// becomes a [`PruneWarning`]; failing to list the directory is an error.
pub fn prune(target: &PruneTarget) -> Result<PruneReport, SyncError> {
    let mut report = PruneReport::default();
    for path in orphans(target)? {
        match std::fs::remove_file(&path) {
            Ok(()) => {
                tracing::info!("pruned: {}", path.display());
                report.removed.push(path);
            }
            Err(err) if err.kind() == ErrorKind::NotFound => {}
            Err(err) => {
                tracing::warn!("could not prune {}: {err}", path.display());
                report.warnings.push(PruneWarning {
                    path,
                    message: err.to_string(),
                });
            }
        }
    }
    Ok(report)
}

/// Files `prune` would delete, sorted, without touching anything.
pub fn orphans(target: &PruneTarget) -> Result<Vec<PathBuf>, SyncError> {
    let entries = match std::fs::read_dir(&target.dir) {
        Ok(entries) => entries,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => return Err(io_err(&target.dir, err)),
    };

    let mut found = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| io_err(&target.dir, e))?;
        let file_type = entry.file_type().map_err(|e| io_err(entry.path(), e))?;
        if !file_type.is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if is_orphan(target, &name) {
            found.push(entry.path());
        }
    }
    found.sort();
    Ok(found)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
