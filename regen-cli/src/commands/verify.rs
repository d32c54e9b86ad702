//! `regen verify`: check that committed outputs match a fresh generation.

use anyhow::{bail, Context, Result};
use clap::Args;
use colored::Colorize;

use super::{print_failures, LayoutArgs};

/// Arguments for `regen verify`.
#[derive(Args, Debug)]
pub struct VerifyArgs {
    #[command(flatten)]
    pub layout: LayoutArgs,
}

impl VerifyArgs {
    pub fn run(self) -> Result<()> {
        let layout = self.layout.load()?;
        let renderer = regen_renderer::build(&layout.renderer);

        let report = regen_sync::verify(&layout, renderer.as_ref(), None)
            .context("verification failed")?;

        if !report.run.is_success() {
            print_failures(&report.run);
            bail!("verification could not generate every output");
        }

        if report.divergences.is_empty() {
            println!(
                "{} generated sources match their templates ({} output(s))",
                "✓".green(),
                report.run.reports.len()
            );
            return Ok(());
        }

        for divergence in &report.divergences {
            println!(
                "{} [{}] {} ({:?})",
                "✗".red(),
                divergence.group,
                divergence.path.display(),
                divergence.kind
            );
            print!("{}", divergence.unified_diff);
            if !divergence.unified_diff.ends_with('\n') {
                println!();
            }
        }
        eprintln!(
            "{} generated sources are out of date; run `regen generate` and commit the result",
            "hint:".cyan()
        );
        bail!(
            "{} generated file(s) diverge from their templates",
            report.divergences.len()
        );
    }
}
