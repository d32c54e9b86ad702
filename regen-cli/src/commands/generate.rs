//! `regen generate`: render every template and sync changed outputs into place.

use anyhow::{bail, Context, Result};
use clap::Args;
use colored::Colorize;
use tabled::{settings::Style, Table, Tabled};

use regen_core::Layout;
use regen_sync::{RunOptions, RunResult, SyncOutcome, UnitOutcome};

use super::{print_failures, LayoutArgs};

/// Arguments for `regen generate`.
#[derive(Args, Debug)]
pub struct GenerateArgs {
    #[command(flatten)]
    pub layout: LayoutArgs,

    /// Keep source-location comments that point back at the templates.
    #[arg(long)]
    pub add_source_locations: bool,
}

impl GenerateArgs {
    pub fn run(self) -> Result<()> {
        let layout = self.layout.load()?;
        let renderer = regen_renderer::build(&layout.renderer);
        let options = RunOptions {
            annotate: self.add_source_locations,
            jobs: None,
        };

        let result =
            regen_sync::run(&layout, renderer.as_ref(), &options).context("generation failed")?;

        print_changes(&result);
        print_summary(&layout, &result);
        print_failures(&result);

        if !result.is_success() {
            bail!(
                "{} of {} output(s) could not be generated",
                result.failed() + result.cancelled(),
                result.reports.len()
            );
        }
        Ok(())
    }
}

fn print_changes(result: &RunResult) {
    for path in &result.removed {
        println!("  {}  {}", "✗".red(), path.display());
    }
    for warning in &result.prune_warnings {
        eprintln!(
            "{} could not remove {}: {}",
            "warning:".yellow(),
            warning.path.display(),
            warning.message
        );
    }
    for file in result.generated() {
        if file.outcome == SyncOutcome::Changed {
            println!("  {}  {}", "✎".green(), file.destination.display());
        }
    }
}

#[derive(Tabled)]
struct GroupRow {
    #[tabled(rename = "group")]
    group: String,
    #[tabled(rename = "rendered")]
    rendered: usize,
    #[tabled(rename = "updated")]
    updated: usize,
    #[tabled(rename = "unchanged")]
    unchanged: usize,
    #[tabled(rename = "failed")]
    failed: usize,
    #[tabled(rename = "pruned")]
    pruned: usize,
}

fn group_rows(layout: &Layout, result: &RunResult) -> Vec<GroupRow> {
    layout
        .groups
        .iter()
        .map(|group| {
            let mut row = GroupRow {
                group: group.name.0.clone(),
                rendered: 0,
                updated: 0,
                unchanged: 0,
                failed: 0,
                pruned: result
                    .removed
                    .iter()
                    .filter(|p| p.starts_with(&group.destination_dir))
                    .count(),
            };
            for report in result.reports.iter().filter(|r| r.unit.group == group.name) {
                match &report.outcome {
                    UnitOutcome::Generated(file) => {
                        row.rendered += 1;
                        match file.outcome {
                            SyncOutcome::Changed => row.updated += 1,
                            SyncOutcome::Unchanged => row.unchanged += 1,
                        }
                    }
                    UnitOutcome::Failed(_) | UnitOutcome::Cancelled => row.failed += 1,
                }
            }
            row
        })
        .collect()
}

fn print_summary(layout: &Layout, result: &RunResult) {
    let rows = group_rows(layout, result);
    if rows.is_empty() {
        println!("No groups configured.");
        return;
    }
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");

    let elapsed = result.finished_at - result.started_at;
    let line = format!(
        "{} output(s): {} updated, {} unchanged, {} pruned in {}ms",
        result.reports.len(),
        result.changed(),
        result.unchanged(),
        result.removed.len(),
        elapsed.num_milliseconds()
    );
    if result.is_success() {
        println!("{} {line}", "✓".green());
    } else {
        println!("{} {line}", "✗".red());
    }
}
