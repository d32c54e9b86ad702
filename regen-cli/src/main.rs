//! regen: render templates into generated sources and keep them in sync.
//!
//! # Usage
//!
//! ```text
//! regen generate [--config regen.yaml] [--add-source-locations] [--jobs N] [--renderer-program PATH] [-v]
//! regen verify   [--config regen.yaml] [--jobs N] [--renderer-program PATH] [-v]
//! regen plan     [--config regen.yaml] [--json]
//! ```

mod commands;

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};

use commands::{generate::GenerateArgs, plan::PlanArgs, verify::VerifyArgs};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "regen",
    version,
    about = "Render source templates and keep generated code in sync",
    long_about = None,
)]
struct Cli {
    /// Log more: `-v` echoes every renderer invocation, `-vv` adds debug detail.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Regenerate outputs, prune stale ones, and update changed files in place.
    Generate(GenerateArgs),

    /// Fail if committed outputs differ from what the templates produce.
    Verify(VerifyArgs),

    /// List the outputs and prunes a generate would perform.
    Plan(PlanArgs),
}

// ---------------------------------------------------------------------------
// Logging
// ---------------------------------------------------------------------------

/// `-v` flags win over `RUST_LOG`; without them `RUST_LOG` applies, else `warn`.
fn init_tracing(verbose: u8) {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        _ => EnvFilter::new("debug"),
    };
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match cli.command {
        Commands::Generate(args) => args.run(),
        Commands::Verify(args) => args.run(),
        Commands::Plan(args) => args.run(),
    }
}
