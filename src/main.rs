use anyhow::{bail, Context, Result};
use clap::Parser;
use std::path::Path;

mod cli;
mod collect;
mod config;
mod error;
mod expand;
mod generate;
mod naming;
mod ordering;
mod render;
mod run;

use cli::{CollectArgs, Command, GenerateArgs, RootArgs};
use config::SweepConfig;
use generate::{GenerateOptions, LATEST_LINK};

fn main() -> Result<()> {
    let args = RootArgs::parse();
    let verbose = match &args.command {
        Command::Generate(generate_args) => generate_args.verbose,
        Command::Collect(_) => false,
    };
    init_tracing(verbose);

    match args.command {
        Command::Generate(generate_args) => cmd_generate(generate_args),
        Command::Collect(collect_args) => cmd_collect(collect_args),
    }
}

fn init_tracing(verbose: bool) {
    let default_directive = if verbose { "debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_directive));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: &Path) -> Result<SweepConfig> {
    let config = SweepConfig::load(path)
        .with_context(|| format!("load config {}", path.display()))?;
    if let Some(errors) = config.validate() {
        bail!(
            "invalid config {}:\n  {}",
            path.display(),
            errors.join("\n  ")
        );
    }
    Ok(config)
}

fn cmd_generate(args: GenerateArgs) -> Result<()> {
    let config = load_config(&args.config)?;
    let options = GenerateOptions {
        overwrite: args.overwrite,
        dry_run: args.dry_run,
    };
    let summary = generate::generate(&config, &options)
        .with_context(|| format!("generate sweep from {}", args.config.display()))?;

    if args.dry_run {
        println!(
            "dry run: {} runs across {} scripts would land in {}",
            summary.run_count,
            summary.bucket_sizes.len(),
            summary.batch_root.display()
        );
        return Ok(());
    }

    println!(
        "wrote {} runs across {} scripts under {}",
        summary.run_count,
        summary.scripts.len(),
        summary.batch_root.display()
    );
    for script in &summary.scripts {
        println!("  {}", script.display());
    }
    Ok(())
}

fn cmd_collect(args: CollectArgs) -> Result<()> {
    let config = load_config(&args.config)?;
    let outputs_root = match args.root {
        Some(root) => root,
        None => match &config.output_root {
            Some(root) => root.clone(),
            None => config.root.join(LATEST_LINK).join("outputs"),
        },
    };

    let report = collect::collect(&config, &outputs_root)
        .with_context(|| format!("collect results under {}", outputs_root.display()))?;

    for row in &report.rows {
        println!("{}{} \\\\", row.segment, row.cells);
    }
    for (segment, reason) in &report.failed {
        eprintln!("missing: {segment} ({reason})");
    }
    if report.rows.is_empty() && !report.failed.is_empty() {
        bail!("no readable run records under {}", outputs_root.display());
    }
    Ok(())
}
