//! Error taxonomy for sweep generation.
//!
//! Every variant is fatal to the whole invocation: generation either writes
//! all scripts and directories or nothing user-visible at all.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SweepError {
    /// Malformed or inconsistent configuration.
    #[error("config error: {detail}")]
    Config { detail: String },

    /// Two distinct runs resolved to the same output path segment.
    #[error("output path collision: two runs resolve to '{segment}'")]
    PathCollision { segment: String },

    /// An output directory already exists and overwrite was not requested.
    #[error("output directory already exists: '{path}' (pass --overwrite to replace it)")]
    ExistingOutput { path: PathBuf },

    /// Naming, ordering, or partitioning referenced an argument a run lacks.
    #[error("argument '{name}' missing from run ({context})")]
    MissingArgument { name: String, context: String },

    /// Naming template arity does not match its named argument list.
    #[error("naming template has {slots} positional slots but {named} named args")]
    FormatMismatch { slots: usize, named: usize },

    /// An argument value is absent from its non-empty ordering priority list.
    #[error("value '{value}' of '{name}' is not in its ordering priority list")]
    UnrankedValue { name: String, value: String },

    /// An ordering key with an empty priority list saw values of mixed types.
    #[error("ordering key '{name}' compares values of different types")]
    MixedOrderingKey { name: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
