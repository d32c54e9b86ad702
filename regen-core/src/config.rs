//! `regen.yaml` configuration and the resolved [`Layout`].
//!
//! # File layout
//!
//! ```text
//! <root>/
//!   regen.yaml                 (this file; every relative path resolves against <root>)
//!   Sources/Foo/
//!     Tokens.swift.gyb         (template)
//!     gyb_generated/           (default destination)
//!       Tokens.swift
//! ```
//!
//! # API pattern
//!
//! - `load_at(path)`: explicit config path; used in tests with `TempDir`
//! - `load()`: `./regen.yaml`, delegates to `load_at`
//!
//! The [`Layout`] is built once at startup and passed by reference to every
//! component. Nothing in the workspace reads paths from globals.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{io_err, ConfigError};
use crate::types::{GroupName, OutputName};

pub const CONFIG_FILE_NAME: &str = "regen.yaml";
pub const DEFAULT_TEMPLATE_SUFFIX: &str = ".gyb";
pub const DEFAULT_DESTINATION_DIR: &str = "gyb_generated";

// ---------------------------------------------------------------------------
// 1. On-disk shape
// ---------------------------------------------------------------------------

/// Root of `regen.yaml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigFile {
    #[serde(default = "default_template_suffix")]
    pub template_suffix: String,
    /// Worker count; `None` means available parallelism.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jobs: Option<usize>,
    pub renderer: RendererConfig,
    #[serde(default)]
    pub groups: Vec<GroupConfig>,
    /// Files that must stay byte-identical to each other; checked by verify.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub verify_pairs: Vec<FilePairConfig>,
}

/// Two files `regen verify` compares byte for byte.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilePairConfig {
    pub expected: PathBuf,
    pub actual: PathBuf,
}

/// Which engine renders templates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "engine", rename_all = "lowercase")]
pub enum RendererConfig {
    /// An external tool invoked once per output.
    Command(CommandConfig),
    /// The in-process Tera engine.
    Tera(TeraConfig),
}

/// Invocation settings for an external renderer.
///
/// The child process receives exactly `env` on top of the inherited
/// environment; the parent environment is never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandConfig {
    pub program: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interpreter: Option<PathBuf>,
    #[serde(default)]
    pub args: Vec<String>,
    /// Passed only when source-location annotation is off.
    #[serde(default = "default_strip_locations_args")]
    pub strip_locations_args: Vec<String>,
    #[serde(default)]
    pub env: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeraConfig {
    /// Line-comment token used for source-location annotations.
    #[serde(default = "default_comment_prefix")]
    pub comment_prefix: String,
}

impl Default for TeraConfig {
    fn default() -> Self {
        Self {
            comment_prefix: default_comment_prefix(),
        }
    }
}

/// One template directory and where its outputs go.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupConfig {
    pub name: String,
    pub source_dir: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination_dir: Option<PathBuf>,
    /// Allow-list: names never pruned from the destination.
    #[serde(default)]
    pub keep: Vec<String>,
    /// When set, only files with this suffix are pruning candidates.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub managed_suffix: Option<String>,
    #[serde(default)]
    pub expansions: Vec<ExpansionConfig>,
}

/// One template rendered once per kind into its own sub-directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpansionConfig {
    pub template: PathBuf,
    pub subdir: PathBuf,
    pub flag: String,
    /// kind → output file name.
    pub outputs: BTreeMap<String, String>,
}

fn default_template_suffix() -> String {
    DEFAULT_TEMPLATE_SUFFIX.to_string()
}

fn default_strip_locations_args() -> Vec<String> {
    vec!["--line-directive=".to_string()]
}

fn default_comment_prefix() -> String {
    "//".to_string()
}

// ---------------------------------------------------------------------------
// 2. Resolved layout
// ---------------------------------------------------------------------------

/// Validated configuration with every path made absolute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    pub root: PathBuf,
    pub template_suffix: String,
    pub jobs: Option<usize>,
    pub renderer: RendererConfig,
    pub groups: Vec<Group>,
    pub verify_pairs: Vec<FilePair>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePair {
    pub expected: PathBuf,
    pub actual: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    pub name: GroupName,
    pub source_dir: PathBuf,
    pub destination_dir: PathBuf,
    pub keep: BTreeSet<String>,
    pub managed_suffix: Option<String>,
    pub expansions: Vec<Expansion>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expansion {
    pub template: PathBuf,
    /// Relative to the owning group's destination.
    pub subdir: PathBuf,
    pub flag: String,
    pub outputs: BTreeMap<String, OutputName>,
}

impl Group {
    /// Destination directory of an expansion owned by this group.
    pub fn expansion_dir(&self, expansion: &Expansion) -> PathBuf {
        self.destination_dir.join(&expansion.subdir)
    }
}

impl Expansion {
    /// The base-kind files: never pruned from the expansion directory.
    pub fn allow_list(&self) -> BTreeSet<String> {
        self.outputs.values().map(|o| o.0.clone()).collect()
    }
}

impl Layout {
    /// Validate `config` and resolve its relative paths against `root`.
    pub fn from_config(root: &Path, config: ConfigFile) -> Result<Self, ConfigError> {
        if config.template_suffix.is_empty() {
            return Err(ConfigError::InvalidGroup {
                group: "*".to_string(),
                reason: "template_suffix must not be empty".to_string(),
            });
        }
        if config.jobs == Some(0) {
            return Err(ConfigError::InvalidGroup {
                group: "*".to_string(),
                reason: "jobs must be at least 1".to_string(),
            });
        }

        let mut seen = BTreeSet::new();
        let mut groups = Vec::with_capacity(config.groups.len());
        for group in config.groups {
            if group.name.trim().is_empty() || !is_single_name(&group.name) {
                return Err(ConfigError::InvalidGroup {
                    group: group.name,
                    reason: "name must be a single directory name (no separators, '.' or '..')"
                        .to_string(),
                });
            }
            if !seen.insert(group.name.clone()) {
                return Err(ConfigError::DuplicateGroup { name: group.name });
            }
            groups.push(resolve_group(root, group)?);
        }

        check_destinations(&groups)?;

        Ok(Layout {
            root: normalize(root),
            template_suffix: config.template_suffix,
            jobs: config.jobs,
            renderer: resolve_renderer(root, config.renderer),
            groups,
            verify_pairs: config
                .verify_pairs
                .into_iter()
                .map(|pair| FilePair {
                    expected: normalize(&root.join(pair.expected)),
                    actual: normalize(&root.join(pair.actual)),
                })
                .collect(),
        })
    }

    /// A copy of this layout whose group destinations are replaced by
    /// `redirect(group)`. Expansion sub-directories follow their group.
    pub fn redirect_destinations(&self, redirect: impl Fn(&Group) -> PathBuf) -> Layout {
        let mut layout = self.clone();
        for group in &mut layout.groups {
            group.destination_dir = redirect(group);
        }
        layout
    }

    /// Override the configured worker count.
    pub fn with_jobs(mut self, jobs: Option<usize>) -> Self {
        if jobs.is_some() {
            self.jobs = jobs;
        }
        self
    }

    /// Override the external renderer's program (no-op for in-process engines).
    pub fn with_renderer_program(mut self, program: Option<PathBuf>) -> Self {
        if let (Some(program), RendererConfig::Command(cmd)) = (program, &mut self.renderer) {
            cmd.program = resolve_tool(&self.root, program);
        }
        self
    }
}

fn resolve_group(root: &Path, group: GroupConfig) -> Result<Group, ConfigError> {
    let source_dir = normalize(&root.join(&group.source_dir));
    if !source_dir.is_dir() {
        return Err(ConfigError::SourceDirMissing {
            group: group.name,
            path: source_dir,
        });
    }
    let destination_dir = match group.destination_dir {
        Some(dir) => normalize(&root.join(dir)),
        None => source_dir.join(DEFAULT_DESTINATION_DIR),
    };

    let mut expansions = Vec::with_capacity(group.expansions.len());
    for exp in group.expansions {
        if !is_plain_relative(&exp.subdir) {
            return Err(ConfigError::InvalidGroup {
                group: group.name,
                reason: format!(
                    "expansion subdir '{}' must be a non-empty relative path without '..'",
                    exp.subdir.display()
                ),
            });
        }
        if exp.flag.trim().is_empty() || exp.outputs.is_empty() {
            return Err(ConfigError::InvalidGroup {
                group: group.name,
                reason: format!(
                    "expansion of '{}' needs a flag and at least one output",
                    exp.template.display()
                ),
            });
        }
        if let Some(bad) = exp.outputs.values().find(|o| !is_output_name(o)) {
            return Err(ConfigError::InvalidGroup {
                group: group.name,
                reason: format!(
                    "expansion output '{bad}' must be a plain, non-hidden file name"
                ),
            });
        }
        let template = normalize(&root.join(&exp.template));
        if !template.is_file() {
            return Err(ConfigError::TemplateMissing { path: template });
        }
        expansions.push(Expansion {
            template,
            subdir: exp.subdir,
            flag: exp.flag,
            outputs: exp
                .outputs
                .into_iter()
                .map(|(kind, output)| (kind, OutputName::from(output)))
                .collect(),
        });
    }

    Ok(Group {
        name: GroupName::from(group.name),
        source_dir,
        destination_dir,
        keep: group.keep.into_iter().collect(),
        managed_suffix: group.managed_suffix,
        expansions,
    })
}

fn resolve_renderer(root: &Path, renderer: RendererConfig) -> RendererConfig {
    match renderer {
        RendererConfig::Command(mut cmd) => {
            cmd.program = resolve_tool(root, cmd.program);
            cmd.interpreter = cmd.interpreter.map(|i| resolve_tool(root, i));
            RendererConfig::Command(cmd)
        }
        other => other,
    }
}

/// Bare names (`gyb`, `python3`) stay as-is for `PATH` lookup; anything with
/// a separator is resolved against `root`.
fn resolve_tool(root: &Path, tool: PathBuf) -> PathBuf {
    if tool.components().count() > 1 || tool.is_absolute() {
        root.join(tool)
    } else {
        tool
    }
}

/// Sources are never pruning scopes: a destination or expansion directory
/// that is some group's source directory would lose its templates.
fn check_destinations(groups: &[Group]) -> Result<(), ConfigError> {
    for group in groups {
        let scopes = std::iter::once(group.destination_dir.clone())
            .chain(group.expansions.iter().map(|e| group.expansion_dir(e)));
        for scope in scopes {
            if let Some(owner) = groups.iter().find(|g| g.source_dir == scope) {
                return Err(ConfigError::InvalidGroup {
                    group: group.name.0.clone(),
                    reason: format!(
                        "output directory {} is the source directory of group '{}'",
                        scope.display(),
                        owner.name
                    ),
                });
            }
        }
    }
    Ok(())
}

/// Lexically drop `.` and fold `..` so equal locations compare equal.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if matches!(out.components().next_back(), Some(Component::Normal(_))) {
                    out.pop();
                } else {
                    out.push(component);
                }
            }
            other => out.push(other),
        }
    }
    if out.as_os_str().is_empty() {
        out.push(Component::CurDir);
    }
    out
}

/// Exactly one normal path component.
fn is_single_name(name: &str) -> bool {
    if name.contains(['/', '\\']) {
        return false;
    }
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

fn is_output_name(name: &str) -> bool {
    is_single_name(name) && !name.starts_with('.')
}

fn is_plain_relative(path: &Path) -> bool {
    let mut components = path.components().peekable();
    components.peek().is_some() && components.all(|c| matches!(c, Component::Normal(_)))
}

// ---------------------------------------------------------------------------
// 3. Load
// ---------------------------------------------------------------------------

/// Parse `yaml` as a config whose relative paths resolve against `root`.
///
/// `origin` is only used for error messages.
pub fn parse_at(root: &Path, origin: &Path, yaml: &str) -> Result<Layout, ConfigError> {
    let config: ConfigFile = serde_yaml::from_str(yaml).map_err(|e| ConfigError::Parse {
        path: origin.to_path_buf(),
        source: e,
    })?;
    Layout::from_config(root, config)
}

/// Load and validate the config at `path`.
///
/// Returns `ConfigError::ConfigNotFound` if absent, `ConfigError::Parse`
/// (with path + line context) if malformed YAML.
pub fn load_at(path: &Path) -> Result<Layout, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::ConfigNotFound {
            path: path.to_path_buf(),
        });
    }
    let contents = std::fs::read_to_string(path).map_err(|e| io_err(path, e))?;
    let root = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => std::env::current_dir().map_err(|e| io_err(path, e))?,
    };
    parse_at(&root, path, &contents)
}

/// `load_at` convenience wrapper for `./regen.yaml`.
pub fn load() -> Result<Layout, ConfigError> {
    load_at(Path::new(CONFIG_FILE_NAME))
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
