//! Error types for regen-core.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise while loading and validating a generation layout.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Underlying I/O failure, annotated with the path involved.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// YAML parse error on load, with file path and line context from serde_yaml.
    #[error("failed to parse config at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// The config file did not exist at the expected path.
    #[error("config not found at {path}; create a regen.yaml or pass --config")]
    ConfigNotFound { path: PathBuf },

    /// A group's template directory does not exist.
    #[error("source directory for group '{group}' not found at {path}")]
    SourceDirMissing { group: String, path: PathBuf },

    /// An expansion template does not exist.
    #[error("expansion template not found at {path}")]
    TemplateMissing { path: PathBuf },

    /// A group or expansion entry is structurally invalid.
    #[error("invalid group '{group}': {reason}")]
    InvalidGroup { group: String, reason: String },

    /// Two groups share a name (their scratch trees would collide).
    #[error("group name '{name}' is declared more than once")]
    DuplicateGroup { name: String },

    /// Two prune scopes cover the same directory and would delete each other's outputs.
    #[error("destination {path} is shared by {first} and {second}; give each its own directory")]
    SharedDestination {
        path: PathBuf,
        first: String,
        second: String,
    },

    /// Two generation units would write the same destination file.
    #[error(
        "output {path} is produced by both {first} and {second}; each output must have exactly one template"
    )]
    DuplicateOutput {
        path: PathBuf,
        first: String,
        second: String,
    },
}

/// Convenience constructor for [`ConfigError::Io`].
pub fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> ConfigError {
    ConfigError::Io {
        path: path.into(),
        source,
    }
}
