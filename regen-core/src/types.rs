//! Domain types for template generation.
//!
//! All path fields use `PathBuf`; never `&str` or `String` for filesystem paths.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// File name of a generated output inside its destination directory.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct OutputName(pub String);

impl fmt::Display for OutputName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for OutputName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for OutputName {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// A strongly-typed name for a template group.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GroupName(pub String);

impl fmt::Display for GroupName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for GroupName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for GroupName {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ---------------------------------------------------------------------------
// Flags and templates
// ---------------------------------------------------------------------------

/// A named generation flag passed to the renderer (`NAME=value`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Flag {
    pub name: String,
    pub value: String,
}

impl Flag {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

impl fmt::Display for Flag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.name, self.value)
    }
}

/// One template plus the flag set it is rendered with.
///
/// A `(path, flags)` pair maps to exactly one [`OutputName`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateSource {
    pub path: PathBuf,
    pub output_name: OutputName,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub flags: Vec<Flag>,
}

impl TemplateSource {
    /// Build a source from a template path by stripping `suffix` from its file name.
    ///
    /// Returns `None` when the file name does not end with `suffix` or nothing
    /// would remain after stripping it.
    pub fn from_template_path(path: &Path, suffix: &str) -> Option<Self> {
        let file_name = path.file_name()?.to_str()?;
        let output = strip_template_suffix(file_name, suffix)?;
        Some(Self {
            path: path.to_path_buf(),
            output_name: OutputName::from(output),
            flags: Vec::new(),
        })
    }

    /// A source rendered under an explicit output name with a flag set.
    pub fn expanded(path: &Path, output_name: OutputName, flags: Vec<Flag>) -> Self {
        Self {
            path: path.to_path_buf(),
            output_name,
            flags,
        }
    }

    /// Human label: the template path plus its flags, if any.
    pub fn label(&self) -> String {
        if self.flags.is_empty() {
            return self.path.display().to_string();
        }
        let flags: Vec<String> = self.flags.iter().map(Flag::to_string).collect();
        format!("{} [{}]", self.path.display(), flags.join(", "))
    }
}

/// `Foo.swift.gyb` + `.gyb` → `Foo.swift`.
pub fn strip_template_suffix<'a>(file_name: &'a str, suffix: &str) -> Option<&'a str> {
    let stem = file_name.strip_suffix(suffix)?;
    if stem.is_empty() {
        None
    } else {
        Some(stem)
    }
}

/// Names starting with `.` (`.DS_Store`, `.gitkeep`, temp files) are never
/// treated as generated outputs.
pub fn is_hidden(file_name: &str) -> bool {
    file_name.starts_with('.')
}

// ---------------------------------------------------------------------------
// Generation units
// ---------------------------------------------------------------------------

/// A single template-to-output job: what to render and where it lands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationUnit {
    pub group: GroupName,
    pub source: TemplateSource,
    pub destination_dir: PathBuf,
}

impl GenerationUnit {
    /// Absolute path of the output file inside the destination tree.
    pub fn destination_path(&self) -> PathBuf {
        self.destination_dir.join(&self.source.output_name.0)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
