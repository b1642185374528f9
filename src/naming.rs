//! Output path derivation for runs.
//!
//! Two strategies exist because the historical tooling disagreed with
//! itself: a positional template over an explicit argument subset, and a
//! `base_name-value` suffix chain over every argument. The no-abbreviate
//! semantics likewise diverged historically, so the mode is an explicit
//! config choice rather than a default.

use serde::{Deserialize, Serialize};

use crate::error::SweepError;
use crate::expand::{ArgValue, RunArgs};

/// Argument whose value gets zero-padded in path segments.
pub const SEED_ARG: &str = "seed";

/// How arguments in the no-abbreviate set contribute to a suffix segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoAbbrevMode {
    /// Omit the argument from the segment entirely.
    Skip,
    /// Include the bare value without the `name-` prefix.
    Verbatim,
}

/// Naming strategy, selected by the `naming.strategy` config tag.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum NamingConfig {
    /// Positional format string filled from an ordered argument subset.
    Template {
        named_args: Vec<String>,
        format: String,
    },
    /// `base` followed by `_name-value` for each argument in run order.
    Suffix {
        base: String,
        #[serde(default)]
        no_abbrev: Vec<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        no_abbrev_mode: Option<NoAbbrevMode>,
    },
}

impl NamingConfig {
    /// Structural checks that do not need a concrete run.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        match self {
            NamingConfig::Template { named_args, format } => {
                if named_args.is_empty() {
                    errors.push("naming.named_args must not be empty".to_string());
                }
                let slots = format.matches("{}").count();
                if slots != named_args.len() {
                    errors.push(format!(
                        "naming.format has {slots} '{{}}' slots but {} named args",
                        named_args.len()
                    ));
                }
            }
            NamingConfig::Suffix {
                base,
                no_abbrev,
                no_abbrev_mode,
            } => {
                if base.trim().is_empty() {
                    errors.push("naming.base must not be empty".to_string());
                }
                if !no_abbrev.is_empty() && no_abbrev_mode.is_none() {
                    errors.push(
                        "naming.no_abbrev_mode is required when naming.no_abbrev is set \
                         (pick 'skip' or 'verbatim')"
                            .to_string(),
                    );
                }
            }
        }
        errors
    }

    /// Derive the output path segment for one run.
    pub fn path_segment(&self, run: &RunArgs) -> Result<String, SweepError> {
        let segment = match self {
            NamingConfig::Template { named_args, format } => {
                let parts: Vec<&str> = format.split("{}").collect();
                if parts.len() - 1 != named_args.len() {
                    return Err(SweepError::FormatMismatch {
                        slots: parts.len() - 1,
                        named: named_args.len(),
                    });
                }
                let mut segment = String::new();
                for (part, name) in parts.iter().zip(named_args) {
                    let value = run.get(name).ok_or_else(|| SweepError::MissingArgument {
                        name: name.clone(),
                        context: "naming template".to_string(),
                    })?;
                    segment.push_str(part);
                    segment.push_str(&path_value(name, value));
                }
                segment.push_str(parts[parts.len() - 1]);
                segment
            }
            NamingConfig::Suffix {
                base,
                no_abbrev,
                no_abbrev_mode,
            } => {
                let mut segment = base.clone();
                for (name, value) in run.iter() {
                    if no_abbrev.iter().any(|n| n == name) {
                        let mode =
                            no_abbrev_mode.ok_or_else(|| SweepError::Config {
                                detail: "naming.no_abbrev_mode is not set".to_string(),
                            })?;
                        match mode {
                            NoAbbrevMode::Skip => {}
                            NoAbbrevMode::Verbatim => {
                                segment.push('_');
                                segment.push_str(&path_value(name, value));
                            }
                        }
                    } else {
                        segment.push('_');
                        segment.push_str(name);
                        segment.push('-');
                        segment.push_str(&path_value(name, value));
                    }
                }
                segment
            }
        };
        validate_segment(&segment)?;
        Ok(segment)
    }
}

/// Render a value for use in a path segment.
///
/// `seed` is zero-padded to three digits purely for path aesthetics; the
/// command-line rendering keeps the natural form.
pub fn path_value(name: &str, value: &ArgValue) -> String {
    match value {
        ArgValue::Int(i) if name == SEED_ARG => format!("{i:03}"),
        other => other.to_string(),
    }
}

/// A segment becomes a single directory name, so it must stay inside its
/// parent directory.
fn validate_segment(segment: &str) -> Result<(), SweepError> {
    if segment.is_empty() || segment == "." || segment == ".." {
        return Err(SweepError::Config {
            detail: format!("derived path segment '{segment}' is not a valid directory name"),
        });
    }
    if segment.contains('/') || segment.contains('\0') {
        return Err(SweepError::Config {
            detail: format!("derived path segment '{segment}' contains a path separator"),
        });
    }
    Ok(())
}
