//! Checksum-gated, atomic copy of a scratch file into its destination.
//!
//! ## Protocol
//!
//! 1. Checksum the scratch file and the destination (absent counts as different).
//! 2. Equal checksums: leave the destination alone, mtime included.
//! 3. Otherwise copy to `.<name>.regen.tmp` next to the destination.
//! 4. Rename the temp file over the destination.
//!
//! A reader of the destination sees either the old bytes or the new bytes.
//! The temp name is hidden so pruning and verification never pick it up.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::checksum;
use crate::error::{io_err, SyncError};

/// What happened to a destination file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncOutcome {
    /// Destination was created or replaced.
    Changed,
    /// Destination already had identical bytes and was not touched.
    Unchanged,
}

/// Make `destination` byte-identical to `scratch`.
pub fn sync(scratch: &Path, destination: &Path) -> Result<SyncOutcome, SyncError> {
    let digest = checksum::of_file(scratch)?.ok_or_else(|| {
        io_err(
            scratch,
            std::io::Error::new(std::io::ErrorKind::NotFound, "scratch file missing"),
        )
    })?;
    sync_checked(scratch, &digest, destination)
}

/// [`sync`] with the scratch checksum already known.
pub(crate) fn sync_checked(
    scratch: &Path,
    scratch_checksum: &str,
    destination: &Path,
) -> Result<SyncOutcome, SyncError> {
    sync_with_tmp(scratch, scratch_checksum, destination, &tmp_path(destination))
}

/// Sibling temp path for `destination`.
pub fn tmp_path(destination: &Path) -> PathBuf {
    let name = destination
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    destination.with_file_name(format!(".{name}.regen.tmp"))
}

fn sync_with_tmp(
    scratch: &Path,
    scratch_checksum: &str,
    destination: &Path,
    tmp: &Path,
) -> Result<SyncOutcome, SyncError> {
    if checksum::of_file(destination)?.as_deref() == Some(scratch_checksum) {
        tracing::debug!("unchanged: {}", destination.display());
        return Ok(SyncOutcome::Unchanged);
    }

    if let Some(parent) = destination.parent() {
        std::fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
    }

    if let Err(e) = std::fs::copy(scratch, tmp) {
        let _ = std::fs::remove_file(tmp);
        return Err(io_err(tmp, e));
    }

    if let Err(e) = std::fs::rename(tmp, destination) {
        let _ = std::fs::remove_file(tmp);
        return Err(io_err(destination, e));
    }

    tracing::info!("updated: {}", destination.display());
    Ok(SyncOutcome::Changed)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
