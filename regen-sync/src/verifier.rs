//! Verification: regenerate into a scratch tree and compare it with what is
//! committed, without touching any destination.
//!
//! Each group's destination is redirected to `<scratch>/<group name>` and
//! generated without source-location annotations. The comparison is
//! recursive and skips hidden entries at any depth. A committed file that
//! generation would never produce counts only if pruning would remove it, so
//! allow-listed files and files outside a group's managed suffix never show
//! up as divergences.

use std::collections::BTreeSet;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::Serialize;
use similar::TextDiff;
use walkdir::WalkDir;

use regen_core::types::is_hidden;
use regen_core::{ConfigError, FilePair, Layout};
use regen_renderer::Renderer;

use crate::error::{io_err, SyncError};
use crate::orchestrator::{self, RunOptions, RunResult};
use crate::plan;
use crate::pruner::{self, PruneTarget};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DivergenceKind {
    /// Generation produces the file but it is not committed.
    Missing,
    /// Committed but no template produces it.
    Extra,
    /// Both exist with different bytes.
    Differs,
}

/// One file that does not match a fresh generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Divergence {
    pub group: String,
    /// Committed location, relative to the layout root when possible.
    pub path: PathBuf,
    pub kind: DivergenceKind,
    pub unified_diff: String,
}

#[derive(Debug)]
pub struct VerifyReport {
    /// The scratch generation. When it failed, no comparison was made.
    pub run: RunResult,
    pub divergences: Vec<Divergence>,
}

impl VerifyReport {
    /// Generation succeeded and matched the committed tree exactly.
    pub fn is_clean(&self) -> bool {
        self.run.is_success() && self.divergences.is_empty()
    }
}

/// Regenerate `layout` into scratch and diff it against the committed tree.
pub fn verify(
    layout: &Layout,
    renderer: &dyn Renderer,
    jobs: Option<usize>,
) -> Result<VerifyReport, SyncError> {
    let committed_plan = plan::plan(layout)?;

    let scratch = tempfile::Builder::new()
        .prefix("regen-verify-")
        .tempdir()
        .map_err(|e| io_err(std::env::temp_dir(), e))?;
    let redirected = layout.redirect_destinations(|g| scratch.path().join(&g.name.0));
    for group in &redirected.groups {
        let dir = &group.destination_dir;
        if dir.parent() != Some(scratch.path()) {
            return Err(ConfigError::InvalidGroup {
                group: group.name.0.clone(),
                reason: format!("verify destination {} leaves the scratch tree", dir.display()),
            }
            .into());
        }
    }

    let run = orchestrator::run(
        &redirected,
        renderer,
        &RunOptions {
            annotate: false,
            jobs,
        },
    )?;
    if !run.is_success() {
        return Ok(VerifyReport {
            run,
            divergences: Vec::new(),
        });
    }

    let mut divergences = Vec::new();
    for (group, generated) in layout.groups.iter().zip(&redirected.groups) {
        let protected = |path: &Path| is_protected(&committed_plan.prune_targets, path);
        for (relative, kind, diff) in
            compare_trees(&generated.destination_dir, &group.destination_dir, protected)?
        {
            divergences.push(Divergence {
                group: group.name.0.clone(),
                path: relative_to(&layout.root, &group.destination_dir.join(&relative)),
                kind,
                unified_diff: diff,
            });
        }
    }
    for pair in &layout.verify_pairs {
        divergences.extend(compare_pair(&layout.root, pair)?);
    }

    Ok(VerifyReport { run, divergences })
}

/// Group label used for `verify_pairs` divergences.
pub const PAIRS_GROUP: &str = "verify_pairs";

/// Compare two files that must be identical. Either side missing is `Missing`.
pub fn compare_pair(root: &Path, pair: &FilePair) -> Result<Option<Divergence>, SyncError> {
    let expected_rel = relative_to(root, &pair.expected);
    let actual_rel = relative_to(root, &pair.actual);
    let expected = read_optional(&pair.expected)?;
    let actual = read_optional(&pair.actual)?;

    let kind = match (&expected, &actual) {
        (Some(e), Some(a)) if e == a => return Ok(None),
        (Some(_), Some(_)) => DivergenceKind::Differs,
        _ => DivergenceKind::Missing,
    };
    Ok(Some(Divergence {
        group: PAIRS_GROUP.to_string(),
        path: actual_rel.clone(),
        kind,
        unified_diff: unified_diff(
            &format!("a/{}", expected_rel.display()),
            &format!("b/{}", actual_rel.display()),
            expected.as_deref().unwrap_or_default(),
            actual.as_deref().unwrap_or_default(),
        ),
    }))
}

fn relative_to(root: &Path, path: &Path) -> PathBuf {
    path.strip_prefix(root)
        .map(Path::to_path_buf)
        .unwrap_or_else(|_| path.to_path_buf())
}

/// A committed file pruning would keep even though nothing generates it.
///
/// Files in directories no prune scope covers are never pruned, so they are
/// protected too.
fn is_protected(targets: &[PruneTarget], path: &Path) -> bool {
    let (Some(dir), Some(name)) = (path.parent(), path.file_name()) else {
        return false;
    };
    match targets.iter().find(|t| t.dir == dir) {
        Some(target) => !pruner::is_orphan(target, &name.to_string_lossy()),
        None => true,
    }
}

/// Compare `generated` against `committed`, recursively.
///
/// Returns `(relative path, kind, unified diff)` for every mismatch, sorted
/// by path. Paths are relative to the two roots. `protected` receives the
/// absolute committed path of files only present on the committed side.
pub fn compare_trees(
    generated: &Path,
    committed: &Path,
    protected: impl Fn(&Path) -> bool,
) -> Result<Vec<(PathBuf, DivergenceKind, String)>, SyncError> {
    let ours = list_files(generated)?;
    let theirs = list_files(committed)?;

    let mut out = Vec::new();
    for relative in ours.union(&theirs) {
        let kind = match (ours.contains(relative), theirs.contains(relative)) {
            (true, false) => DivergenceKind::Missing,
            (false, true) if protected(&committed.join(relative)) => continue,
            (false, true) => DivergenceKind::Extra,
            _ => DivergenceKind::Differs,
        };
        let old = read_or_empty(&committed.join(relative))?;
        let new = read_or_empty(&generated.join(relative))?;
        if kind == DivergenceKind::Differs && old == new {
            continue;
        }
        let diff = unified_diff(
            &format!("a/{}", relative.display()),
            &format!("b/{}", relative.display()),
            &old,
            &new,
        );
        out.push((relative.clone(), kind, diff));
    }
    Ok(out)
}

/// Non-hidden regular files under `root`, relative to it. Absent root is empty.
fn list_files(root: &Path) -> Result<BTreeSet<PathBuf>, SyncError> {
    if !root.exists() {
        return Ok(BTreeSet::new());
    }
    let mut files = BTreeSet::new();
    let walker = WalkDir::new(root)
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_hidden(&e.file_name().to_string_lossy()));
    for entry in walker {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(root).to_path_buf();
            io_err(path, e.into())
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        if let Ok(relative) = entry.path().strip_prefix(root) {
            files.insert(relative.to_path_buf());
        }
    }
    Ok(files)
}

fn read_or_empty(path: &Path) -> Result<Vec<u8>, SyncError> {
    Ok(read_optional(path)?.unwrap_or_default())
}

fn read_optional(path: &Path) -> Result<Option<Vec<u8>>, SyncError> {
    match std::fs::read(path) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
        Err(err) => Err(io_err(path, err)),
    }
}

fn unified_diff(old_header: &str, new_header: &str, old: &[u8], new: &[u8]) -> String {
    match (std::str::from_utf8(old), std::str::from_utf8(new)) {
        (Ok(old), Ok(new)) => TextDiff::from_lines(old, new)
            .unified_diff()
            .header(old_header, new_header)
            .context_radius(3)
            .to_string(),
        _ => format!("Binary files {old_header} and {new_header} differ\n"),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
