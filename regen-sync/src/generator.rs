//! One generation unit: render into scratch, then synchronize.

use std::path::{Path, PathBuf};

use serde::Serialize;

use regen_core::{GenerationUnit, OutputName};
use regen_renderer::{RenderError, RenderRequest, Renderer};

use crate::checksum;
use crate::error::GenerateError;
use crate::synchronizer::{self, SyncOutcome};

/// A rendered output and what syncing it did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeneratedFile {
    pub output_name: OutputName,
    pub destination: PathBuf,
    #[serde(skip)]
    pub content: Vec<u8>,
    pub checksum: String,
    pub annotated: bool,
    pub outcome: SyncOutcome,
    /// Captured tool output, empty when the renderer was silent.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub tool_output: String,
}

/// Render `unit` to `<scratch_dir>/<output name>` and sync it into place.
///
/// Render failures leave the destination untouched.
pub fn generate(
    unit: &GenerationUnit,
    scratch_dir: &Path,
    renderer: &dyn Renderer,
    annotate: bool,
) -> Result<GeneratedFile, GenerateError> {
    let label = unit.source.label();
    let scratch = scratch_dir.join(&unit.source.output_name.0);
    let request = RenderRequest {
        template: &unit.source.path,
        output: &scratch,
        flags: &unit.source.flags,
        annotate,
    };

    tracing::info!("{}", renderer.describe(&request));
    let rendered = renderer
        .render(&request)
        .map_err(|source| GenerateError::Render {
            template: label.clone(),
            source,
        })?;

    let content = std::fs::read(&scratch).map_err(|source| GenerateError::Render {
        template: label.clone(),
        source: RenderError::Io {
            path: scratch.clone(),
            source,
        },
    })?;
    let digest = checksum::of_bytes(&content);

    let destination = unit.destination_path();
    let outcome = synchronizer::sync_checked(&scratch, &digest, &destination)
        .map_err(|source| GenerateError::Sync {
            template: label,
            source,
        })?;

    Ok(GeneratedFile {
        output_name: unit.source.output_name.clone(),
        destination,
        content,
        checksum: digest,
        annotated: annotate,
        outcome,
        tool_output: rendered.output,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
