//! `regen plan`: show what `generate` would render and prune, without doing it.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use regen_core::GenerationUnit;
use regen_sync::{pruner, Plan};

use super::LayoutArgs;

/// Arguments for `regen plan`.
#[derive(Args, Debug)]
pub struct PlanArgs {
    #[command(flatten)]
    pub layout: LayoutArgs,

    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

impl PlanArgs {
    pub fn run(self) -> Result<()> {
        let layout = self.layout.load()?;
        let plan = regen_sync::plan(&layout).context("planning failed")?;

        let mut orphans = Vec::new();
        for target in &plan.prune_targets {
            orphans.extend(pruner::orphans(target)?);
        }

        if self.json {
            print_json(&plan, &orphans)?;
        } else {
            print_table(&plan, &orphans);
        }
        Ok(())
    }
}

#[derive(Serialize)]
struct PlanJson<'a> {
    units: &'a [GenerationUnit],
    would_remove: &'a [PathBuf],
}

fn print_json(plan: &Plan, orphans: &[PathBuf]) -> Result<()> {
    let doc = PlanJson {
        units: &plan.units,
        would_remove: orphans,
    };
    println!("{}", serde_json::to_string_pretty(&doc)?);
    Ok(())
}

#[derive(Tabled)]
struct UnitRow {
    #[tabled(rename = "group")]
    group: String,
    #[tabled(rename = "template")]
    template: String,
    #[tabled(rename = "flags")]
    flags: String,
    #[tabled(rename = "output")]
    output: String,
}

fn print_table(plan: &Plan, orphans: &[PathBuf]) {
    if plan.units.is_empty() {
        println!("No templates found.");
    } else {
        let rows = plan.units.iter().map(|unit| UnitRow {
            group: unit.group.0.clone(),
            template: unit
                .source
                .path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            flags: unit
                .source
                .flags
                .iter()
                .map(|f| f.to_string())
                .collect::<Vec<_>>()
                .join(" "),
            output: unit.destination_path().display().to_string(),
        });
        let mut table = Table::new(rows);
        table.with(Style::rounded());
        println!("{table}");
    }

    for path in orphans {
        println!("would remove {}", path.display());
    }
}
