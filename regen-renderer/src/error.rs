//! Error types for regen-renderer.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise from template rendering operations.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The external renderer exited non-zero. `command` and `output` are
    /// reproduced verbatim so the failure can be re-run by hand.
    #[error("renderer exited with {status}\nExecuting: {command}\n{output}")]
    Failed {
        command: String,
        status: String,
        output: String,
    },

    /// The external renderer could not be started at all.
    #[error("failed to start renderer\nExecuting: {command}\n{source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// Preflight could not locate a required tool.
    #[error("could not find {tool} at '{path}'; set `renderer.program` in regen.yaml or pass --renderer-program")]
    ToolNotFound { tool: &'static str, path: PathBuf },

    /// Tera template engine error, with the full source chain flattened.
    #[error("template error in {path}: {detail}")]
    Template { path: PathBuf, detail: String },

    /// Filesystem error while reading a template or writing its output.
    #[error("template io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> RenderError {
    RenderError::Io {
        path: path.into(),
        source,
    }
}
