//! Error types for regen-sync.

use std::path::PathBuf;

use thiserror::Error;

use regen_core::ConfigError;
use regen_renderer::RenderError;

/// Errors that abort a whole run.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The layout is unusable (bad config, colliding outputs).
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The renderer cannot run at all.
    #[error("render error: {0}")]
    Render(#[from] RenderError),

    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Failure of a single generation unit.
#[derive(Debug, Error)]
pub enum GenerateError {
    /// The renderer rejected the template or the tool failed. Sibling units keep going.
    #[error("failed to render {template}: {source}")]
    Render {
        template: String,
        #[source]
        source: RenderError,
    },

    /// The destination could not be updated. Fatal for the run.
    #[error("failed to synchronize {template}: {source}")]
    Sync {
        template: String,
        #[source]
        source: SyncError,
    },
}

impl GenerateError {
    /// Whether this failure should stop units that have not started yet.
    pub fn is_fatal(&self) -> bool {
        matches!(self, GenerateError::Sync { .. })
    }

    /// The label of the unit that failed.
    pub fn template(&self) -> &str {
        match self {
            GenerateError::Render { template, .. } | GenerateError::Sync { template, .. } => {
                template
            }
        }
    }
}

/// Convenience constructor for [`SyncError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> SyncError {
    SyncError::Io {
        path: path.into(),
        source,
    }
}
