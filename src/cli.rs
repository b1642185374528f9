//! CLI argument parsing for the sweep workflow.
//!
//! The CLI is intentionally thin: it loads a config document and hands it to
//! the generation or collection entry points, so the same core logic can be
//! driven from tests without a process boundary.
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Root CLI entrypoint for sweep generation and result collection.
#[derive(Parser, Debug)]
#[command(
    name = "sweepgen",
    version,
    about = "Batch sweep script generator for parameterized experiments",
    after_help = "Commands:\n  generate --config <FILE>   Expand the sweep and write scripts + output dirs\n  collect --config <FILE>    Parse saved run records into report rows\n\nExamples:\n  sweepgen generate --config sweep.json\n  sweepgen generate --config sweep.json --dry-run\n  sweepgen generate --config sweep.json --overwrite\n  sweepgen collect --config sweep.json --root outputs/",
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct RootArgs {
    #[command(subcommand)]
    pub command: Command,
}

/// Top-level workflow commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    Generate(GenerateArgs),
    Collect(CollectArgs),
}

/// Generate command inputs for one sweep config.
#[derive(Parser, Debug)]
#[command(about = "Expand a sweep config into batch scripts and output directories")]
pub struct GenerateArgs {
    /// Sweep config document (JSON)
    #[arg(long, value_name = "FILE")]
    pub config: PathBuf,

    /// DANGER: recursively delete pre-existing output directories before
    /// recreating them. Irreversible; no backup is taken.
    #[arg(long)]
    pub overwrite: bool,

    /// Plan and validate without writing anything
    #[arg(long)]
    pub dry_run: bool,

    /// Emit a verbose transcript of the planned runs
    #[arg(long)]
    pub verbose: bool,
}

/// Collect command inputs for reading back run records.
#[derive(Parser, Debug)]
#[command(about = "Parse saved run records into formatted report rows")]
pub struct CollectArgs {
    /// Sweep config document (JSON)
    #[arg(long, value_name = "FILE")]
    pub config: PathBuf,

    /// Outputs root to read from; defaults to the config's output_root, or
    /// the latest batch's outputs folder
    #[arg(long, value_name = "DIR")]
    pub root: Option<PathBuf>,
}
