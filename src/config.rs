//! Typed sweep configuration.
//!
//! Configuration is plain data parsed from a JSON document. The historical
//! tooling imported caller-supplied Python modules as config; that pattern
//! is deliberately gone; nothing here ever executes user code.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::SweepError;
use crate::expand::JsonMap;
use crate::naming::NamingConfig;
use crate::ordering::{OrderingEntry, PartitionConfig};
use crate::render::InvocationConfig;

pub const CONFIG_SCHEMA_VERSION: u32 = 1;

/// Top-level sweep document.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SweepConfig {
    pub schema_version: u32,
    /// Command to invoke for every run, e.g. `python attack.py`.
    pub cmd: String,
    /// Text placed verbatim at the top of every script (SBATCH directives
    /// and the like, opaque to this tool).
    #[serde(default)]
    pub prologue: String,
    /// Text placed verbatim at the bottom of every script.
    #[serde(default)]
    pub epilogue: String,
    pub arguments: ArgumentsConfig,
    pub naming: NamingConfig,
    /// Ordering keys applied before partitioning, in listed order.
    #[serde(default)]
    pub ordering: Vec<OrderingEntry>,
    #[serde(default)]
    pub partition: PartitionConfig,
    #[serde(default)]
    pub invocation: InvocationConfig,
    /// Batch root; each invocation creates a timestamped folder beneath it
    /// and repoints the `latest` symlink.
    pub root: PathBuf,
    /// Stable outputs root shared across invocations. When unset, outputs
    /// live inside the timestamped batch folder.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_root: Option<PathBuf>,
}

/// Shared arguments plus independently expanded groups.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ArgumentsConfig {
    #[serde(default)]
    pub shared: JsonMap,
    #[serde(default)]
    pub groups: Vec<JsonMap>,
}

impl SweepConfig {
    pub fn load(path: &Path) -> Result<Self, SweepError> {
        let text = fs::read_to_string(path).map_err(|err| SweepError::Config {
            detail: format!("read {}: {err}", path.display()),
        })?;
        serde_json::from_str(&text).map_err(|err| SweepError::Config {
            detail: format!("parse {}: {err}", path.display()),
        })
    }

    /// Structural validation, reporting every problem at once.
    pub fn validate(&self) -> Option<Vec<String>> {
        let mut errors = Vec::new();
        if self.schema_version != CONFIG_SCHEMA_VERSION {
            errors.push(format!(
                "schema_version must be {CONFIG_SCHEMA_VERSION}, got {}",
                self.schema_version
            ));
        }
        if self.cmd.trim().is_empty() {
            errors.push("cmd must not be empty".to_string());
        }
        errors.extend(self.naming.validate());
        if self.partition.bucket_count == 0 {
            errors.push("partition.bucket_count must be a positive integer".to_string());
        }
        for (idx, entry) in self.ordering.iter().enumerate() {
            if entry.name.trim().is_empty() {
                errors.push(format!("ordering[{idx}].name must not be empty"));
            }
        }
        if self.invocation.output_flag.trim().is_empty() {
            errors.push("invocation.output_flag must not be empty".to_string());
        }
        if self.root.as_os_str().is_empty() {
            errors.push("root must not be empty".to_string());
        }

        if errors.is_empty() {
            None
        } else {
            Some(errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn minimal() -> serde_json::Value {
        json!({
            "schema_version": 1,
            "cmd": "python attack.py",
            "prologue": "#!/bin/bash",
            "epilogue": "echo 'Job Done!'",
            "arguments": {
                "shared": {"eps": [0.1, 0.2], "seed": 0},
            },
            "naming": {"strategy": "suffix", "base": "attack"},
            "root": "batches",
        })
    }

    #[test]
    fn minimal_config_parses_and_validates() {
        let config: SweepConfig = serde_json::from_value(minimal()).expect("parse");
        assert!(config.validate().is_none());
        assert_eq!(config.partition.bucket_count, 1);
        assert!(config.output_root.is_none());
    }

    #[test]
    fn unknown_top_level_fields_are_rejected() {
        let mut doc = minimal();
        doc["sbtach_args"] = json!("typo");
        assert!(serde_json::from_value::<SweepConfig>(doc).is_err());
    }

    #[test]
    fn zero_bucket_count_fails_validation() {
        let mut doc = minimal();
        doc["partition"] = json!({"strategy": "round_robin", "bucket_count": 0});
        let config: SweepConfig = serde_json::from_value(doc).expect("parse");
        let errors = config.validate().expect("errors");
        assert!(errors.iter().any(|e| e.contains("bucket_count")));
    }

    #[test]
    fn template_arity_mismatch_fails_validation() {
        let mut doc = minimal();
        doc["naming"] = json!({
            "strategy": "template",
            "named_args": ["eps"],
            "format": "eps-{}_lam-{}",
        });
        let config: SweepConfig = serde_json::from_value(doc).expect("parse");
        let errors = config.validate().expect("errors");
        assert!(errors.iter().any(|e| e.contains("slots")));
    }

    #[test]
    fn suffix_no_abbrev_without_mode_fails_validation() {
        let mut doc = minimal();
        doc["naming"] = json!({
            "strategy": "suffix",
            "base": "attack",
            "no_abbrev": ["seed"],
        });
        let config: SweepConfig = serde_json::from_value(doc).expect("parse");
        let errors = config.validate().expect("errors");
        assert!(errors.iter().any(|e| e.contains("no_abbrev_mode")));
    }

    #[test]
    fn shared_argument_order_survives_parsing() {
        let config: SweepConfig = serde_json::from_value(minimal()).expect("parse");
        let keys: Vec<&String> = config.arguments.shared.keys().collect();
        assert_eq!(keys, vec!["eps", "seed"]);
    }
}
