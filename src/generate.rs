//! Sweep generation: plan, validate, then commit.
//!
//! Planning and validation are pure; the filesystem is only touched once
//! every run has a collision-free path and every pre-existing directory has
//! been accounted for. A failed invocation therefore leaves nothing behind.

use chrono::Local;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::SweepConfig;
use crate::error::SweepError;
use crate::expand;
use crate::ordering;
use crate::render;
use crate::run::RunDefinition;

/// Name of the symlink pointing at the most recent batch folder.
pub const LATEST_LINK: &str = "latest";

#[derive(Debug, Clone, Copy, Default)]
pub struct GenerateOptions {
    /// Recursively delete and recreate pre-existing output directories.
    /// Destructive and irreversible; off by default.
    pub overwrite: bool,
    /// Plan and validate without writing anything.
    pub dry_run: bool,
}

#[derive(Debug)]
pub struct GenerateSummary {
    pub batch_root: PathBuf,
    pub scripts: Vec<PathBuf>,
    pub run_count: usize,
    pub bucket_sizes: Vec<usize>,
}

/// Expand, order, name, and collision-check every run. Pure.
pub fn plan_runs(
    config: &SweepConfig,
    outputs_root: &Path,
) -> Result<Vec<RunDefinition>, SweepError> {
    let args_list = expand::combine(&config.arguments.groups, &config.arguments.shared)?;
    let args_list = ordering::order(args_list, &config.ordering)?;

    let mut seen = BTreeSet::new();
    let mut runs = Vec::with_capacity(args_list.len());
    for args in args_list {
        let segment = config.naming.path_segment(&args)?;
        if !seen.insert(segment.clone()) {
            return Err(SweepError::PathCollision { segment });
        }
        let command = render::render_command(&config.cmd, &args, config.invocation.style);
        let output_dir = outputs_root.join(&segment);
        runs.push(RunDefinition {
            args,
            path_segment: segment,
            output_dir,
            command,
        });
    }
    Ok(runs)
}

/// Generate one batch: scripts plus per-run output directories, then the
/// `latest` symlink.
pub fn generate(
    config: &SweepConfig,
    options: &GenerateOptions,
) -> Result<GenerateSummary, SweepError> {
    let stamp = timestamp();
    let batch_root = config.root.join(&stamp);
    let outputs_root = config
        .output_root
        .clone()
        .unwrap_or_else(|| batch_root.join("outputs"));

    let runs = plan_runs(config, &outputs_root)?;
    let buckets = ordering::partition(&runs, &config.partition)?;
    let scripts: Vec<String> = buckets
        .iter()
        .map(|bucket| {
            let blocks: Vec<String> = bucket
                .iter()
                .map(|&i| render::render_run_block(&runs[i], &config.invocation))
                .collect();
            render::render_script(&config.prologue, &blocks, &config.epilogue)
        })
        .collect();
    let bucket_sizes: Vec<usize> = buckets.iter().map(Vec::len).collect();

    // Validation phase: nothing below touches the filesystem until every
    // check has passed.
    if batch_root.exists() {
        return Err(SweepError::ExistingOutput { path: batch_root });
    }
    let mut doomed = Vec::new();
    for run in &runs {
        if run.output_dir.exists() {
            if options.overwrite {
                doomed.push(run.output_dir.clone());
            } else {
                return Err(SweepError::ExistingOutput {
                    path: run.output_dir.clone(),
                });
            }
        }
    }

    tracing::info!(
        runs = runs.len(),
        buckets = buckets.len(),
        batch = %batch_root.display(),
        "planned sweep"
    );

    if options.dry_run {
        for run in &runs {
            tracing::info!(segment = %run.path_segment, command = %run.command, "planned run");
        }
        return Ok(GenerateSummary {
            batch_root,
            scripts: Vec::new(),
            run_count: runs.len(),
            bucket_sizes,
        });
    }

    // Commit phase.
    for dir in &doomed {
        tracing::warn!(path = %dir.display(), "overwrite: deleting existing output directory");
        fs::remove_dir_all(dir)?;
    }
    let scripts_dir = batch_root.join("scripts");
    fs::create_dir_all(&scripts_dir)?;
    for run in &runs {
        fs::create_dir_all(&run.output_dir)?;
    }
    let mut script_paths = Vec::with_capacity(scripts.len());
    for (i, text) in scripts.iter().enumerate() {
        let path = scripts_dir.join(format!("job_{i}.sh"));
        fs::write(&path, text)?;
        script_paths.push(path);
    }
    point_latest(&config.root, &stamp)?;

    Ok(GenerateSummary {
        batch_root,
        scripts: script_paths,
        run_count: runs.len(),
        bucket_sizes,
    })
}

/// Sortable second-resolution batch folder name.
fn timestamp() -> String {
    Local::now().format("%Y-%m-%d-%H:%M:%S").to_string()
}

/// Repoint `<root>/latest` at the new batch folder, unlink-then-relink.
/// Refuses to replace anything that is not already a symlink.
#[cfg(unix)]
fn point_latest(root: &Path, stamp: &str) -> Result<(), SweepError> {
    let link = root.join(LATEST_LINK);
    match fs::symlink_metadata(&link) {
        Ok(meta) => {
            if !meta.file_type().is_symlink() {
                return Err(SweepError::Config {
                    detail: format!("'{}' exists and is not a symlink", link.display()),
                });
            }
            fs::remove_file(&link)?;
        }
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
        Err(err) => return Err(err.into()),
    }
    std::os::unix::fs::symlink(stamp, &link)?;
    Ok(())
}

#[cfg(not(unix))]
fn point_latest(root: &Path, _stamp: &str) -> Result<(), SweepError> {
    tracing::warn!(
        root = %root.display(),
        "symlinks unsupported on this platform; skipping 'latest'"
    );
    Ok(())
}
