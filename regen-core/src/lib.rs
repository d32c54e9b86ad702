//! regen core library: domain types, configuration, errors.
//!
//! - [`types`]: newtypes, templates and generation units
//! - [`config`]: `regen.yaml` loading and the resolved [`Layout`]
//! - [`error`]: [`ConfigError`]

pub mod config;
pub mod error;
pub mod types;

pub use config::{Expansion, FilePair, Group, Layout, RendererConfig};
pub use error::ConfigError;
pub use types::{Flag, GenerationUnit, GroupName, OutputName, TemplateSource};
