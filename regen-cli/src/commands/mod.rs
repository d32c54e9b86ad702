//! Subcommand implementations and the arguments they share.

pub mod generate;
pub mod plan;
pub mod verify;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use regen_core::{config, Layout};
use regen_renderer::RenderError;
use regen_sync::{GenerateError, RunResult};

/// Where to find the layout and how to override it.
#[derive(Args, Debug)]
pub struct LayoutArgs {
    /// Path to the configuration file.
    #[arg(long, default_value = config::CONFIG_FILE_NAME)]
    pub config: PathBuf,

    /// Use this renderer executable instead of the configured one.
    #[arg(long, value_name = "PATH")]
    pub renderer_program: Option<PathBuf>,

    /// Number of templates rendered in parallel.
    #[arg(long, short = 'j', value_parser = clap::value_parser!(u64).range(1..))]
    pub jobs: Option<u64>,
}

impl LayoutArgs {
    pub fn load(&self) -> Result<Layout> {
        let layout = config::load_at(&self.config)
            .with_context(|| format!("failed to load {}", self.config.display()))?;
        // Paths given on the command line are relative to where the user is, not to the config.
        let program = match &self.renderer_program {
            Some(p) if p.is_relative() && p.components().count() > 1 => Some(
                std::env::current_dir()
                    .context("could not determine current directory")?
                    .join(p),
            ),
            other => other.clone(),
        };
        tracing::debug!(
            "loaded {} group(s) from {}",
            layout.groups.len(),
            self.config.display()
        );
        Ok(layout
            .with_jobs(self.jobs.map(|j| j as usize))
            .with_renderer_program(program))
    }
}

/// Print every failed unit in the `FAIL:` / `Executing:` format.
pub(crate) fn print_failures(result: &RunResult) {
    for (unit, err) in result.failures() {
        eprintln!("{} {}", "FAIL:".red().bold(), unit.source.label());
        match err {
            GenerateError::Render {
                source: RenderError::Failed {
                    command, output, ..
                },
                ..
            } => {
                eprintln!("Executing: {command}");
                if !output.is_empty() {
                    eprint!("{output}");
                    if !output.ends_with('\n') {
                        eprintln!();
                    }
                }
            }
            other => eprintln!("{}", error_chain(other)),
        }
    }
    if result.cancelled() > 0 {
        eprintln!(
            "{} {} unit(s) not started after a fatal error",
            "skipped:".yellow(),
            result.cancelled()
        );
    }
}

fn error_chain(err: &dyn std::error::Error) -> String {
    let mut text = err.to_string();
    let mut source = err.source();
    while let Some(inner) = source {
        let next = inner.to_string();
        if !text.contains(&next) {
            text.push_str(": ");
            text.push_str(&next);
        }
        source = inner.source();
    }
    text
}
