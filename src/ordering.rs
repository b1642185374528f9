//! Run ordering by priority lists and partitioning into script buckets.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::error::SweepError;
use crate::expand::{ArgValue, RunArgs};
use crate::naming::SEED_ARG;
use crate::run::RunDefinition;

/// One ordering key: runs are ranked by the position of their value in
/// `priority`. An empty priority list ranks by the raw value instead, which
/// requires every run to carry the same value type for that name.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct OrderingEntry {
    pub name: String,
    #[serde(default)]
    pub priority: Vec<ArgValue>,
}

/// How runs map onto script buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PartitionStrategy {
    /// Run at position `i` goes to bucket `i mod bucket_count`.
    #[default]
    RoundRobin,
    /// Run goes to bucket `seed mod bucket_count`.
    Seed,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields, default)]
pub struct PartitionConfig {
    pub strategy: PartitionStrategy,
    pub bucket_count: usize,
}

impl Default for PartitionConfig {
    fn default() -> Self {
        PartitionConfig {
            strategy: PartitionStrategy::RoundRobin,
            bucket_count: 1,
        }
    }
}

/// Sort key component for one ordering entry.
#[derive(Debug, Clone)]
enum KeyPart {
    Index(usize),
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),
}

impl KeyPart {
    fn from_value(value: &ArgValue) -> Self {
        match value {
            ArgValue::Int(i) => KeyPart::Int(*i),
            ArgValue::Float(x) => KeyPart::Float(*x),
            ArgValue::Bool(b) => KeyPart::Bool(*b),
            ArgValue::Str(s) => KeyPart::Str(s.clone()),
        }
    }

    fn kind(&self) -> u8 {
        match self {
            KeyPart::Index(_) => 0,
            KeyPart::Int(_) => 1,
            KeyPart::Float(_) => 2,
            KeyPart::Bool(_) => 3,
            KeyPart::Str(_) => 4,
        }
    }
}

fn cmp_parts(a: &KeyPart, b: &KeyPart) -> Ordering {
    match (a, b) {
        (KeyPart::Index(x), KeyPart::Index(y)) => x.cmp(y),
        (KeyPart::Int(x), KeyPart::Int(y)) => x.cmp(y),
        (KeyPart::Float(x), KeyPart::Float(y)) => x.total_cmp(y),
        (KeyPart::Bool(x), KeyPart::Bool(y)) => x.cmp(y),
        (KeyPart::Str(x), KeyPart::Str(y)) => x.cmp(y),
        // Mixed kinds are rejected before sorting begins.
        _ => Ordering::Equal,
    }
}

/// Stable-sort runs by the composite key defined by `spec`, preserving
/// Cartesian order on ties.
pub fn order(runs: Vec<RunArgs>, spec: &[OrderingEntry]) -> Result<Vec<RunArgs>, SweepError> {
    if spec.is_empty() || runs.is_empty() {
        return Ok(runs);
    }

    let mut keyed: Vec<(Vec<KeyPart>, RunArgs)> = Vec::with_capacity(runs.len());
    for run in runs {
        let mut key = Vec::with_capacity(spec.len());
        for entry in spec {
            let value = run.get(&entry.name).ok_or_else(|| SweepError::MissingArgument {
                name: entry.name.clone(),
                context: "ordering".to_string(),
            })?;
            if entry.priority.is_empty() {
                key.push(KeyPart::from_value(value));
            } else {
                let rank = entry
                    .priority
                    .iter()
                    .position(|candidate| candidate == value)
                    .ok_or_else(|| SweepError::UnrankedValue {
                        name: entry.name.clone(),
                        value: value.to_string(),
                    })?;
                key.push(KeyPart::Index(rank));
            }
        }
        keyed.push((key, run));
    }

    // Raw-value keys must be homogeneous per position; anything else would
    // sort by an accident of type, not by a meaning.
    for (pos, entry) in spec.iter().enumerate() {
        let kinds: Vec<u8> = keyed.iter().map(|(key, _)| key[pos].kind()).collect();
        if kinds.windows(2).any(|pair| pair[0] != pair[1]) {
            return Err(SweepError::MixedOrderingKey {
                name: entry.name.clone(),
            });
        }
    }

    keyed.sort_by(|(a, _), (b, _)| {
        a.iter()
            .zip(b.iter())
            .map(|(x, y)| cmp_parts(x, y))
            .find(|ord| *ord != Ordering::Equal)
            .unwrap_or(Ordering::Equal)
    });

    Ok(keyed.into_iter().map(|(_, run)| run).collect())
}

/// Assign every run to exactly one bucket, returning run indices per bucket.
///
/// Buckets may come back empty; callers still emit one script per bucket so
/// the generated file set is deterministic.
pub fn partition(
    runs: &[RunDefinition],
    config: &PartitionConfig,
) -> Result<Vec<Vec<usize>>, SweepError> {
    if config.bucket_count == 0 {
        return Err(SweepError::Config {
            detail: "partition.bucket_count must be a positive integer".to_string(),
        });
    }

    let mut buckets = vec![Vec::new(); config.bucket_count];
    for (i, run) in runs.iter().enumerate() {
        let bucket = match config.strategy {
            PartitionStrategy::RoundRobin => i % config.bucket_count,
            PartitionStrategy::Seed => {
                let seed = run.args.get(SEED_ARG).ok_or_else(|| {
                    SweepError::MissingArgument {
                        name: SEED_ARG.to_string(),
                        context: format!("seed partition of run '{}'", run.path_segment),
                    }
                })?;
                match seed {
                    ArgValue::Int(s) => s.rem_euclid(config.bucket_count as i64) as usize,
                    other => {
                        return Err(SweepError::Config {
                            detail: format!(
                                "run '{}': seed partition needs an integer seed, got {other}",
                                run.path_segment
                            ),
                        })
                    }
                }
            }
        };
        buckets[bucket].push(i);
    }
    Ok(buckets)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn run_args(pairs: &[(&str, ArgValue)]) -> RunArgs {
        RunArgs::new(
            pairs
                .iter()
                .map(|(name, value)| (name.to_string(), value.clone()))
                .collect(),
        )
    }

    fn run_def(segment: &str, pairs: &[(&str, ArgValue)]) -> RunDefinition {
        RunDefinition {
            args: run_args(pairs),
            path_segment: segment.to_string(),
            output_dir: PathBuf::from(segment),
            command: String::new(),
        }
    }

    #[test]
    fn priority_list_maps_values_to_index_positions() {
        let runs = vec![
            run_args(&[("method", ArgValue::Str("frank_wolfe".to_string()))]),
            run_args(&[("method", ArgValue::Str("sinkhorn".to_string()))]),
            run_args(&[("method", ArgValue::Str("dual_proj".to_string()))]),
        ];
        let spec = vec![OrderingEntry {
            name: "method".to_string(),
            priority: vec![
                ArgValue::Str("sinkhorn".to_string()),
                ArgValue::Str("dual_proj".to_string()),
                ArgValue::Str("frank_wolfe".to_string()),
            ],
        }];
        let ordered = order(runs, &spec).expect("order");
        let methods: Vec<String> = ordered
            .iter()
            .map(|run| run.get("method").expect("method").to_string())
            .collect();
        assert_eq!(methods, vec!["sinkhorn", "dual_proj", "frank_wolfe"]);
    }

    #[test]
    fn ties_keep_original_cartesian_order() {
        let runs = vec![
            run_args(&[("a", ArgValue::Int(1)), ("b", ArgValue::Int(1))]),
            run_args(&[("a", ArgValue::Int(1)), ("b", ArgValue::Int(2))]),
            run_args(&[("a", ArgValue::Int(0)), ("b", ArgValue::Int(3))]),
        ];
        let spec = vec![OrderingEntry {
            name: "a".to_string(),
            priority: vec![ArgValue::Int(0), ArgValue::Int(1)],
        }];
        let ordered = order(runs, &spec).expect("order");
        let pairs: Vec<(String, String)> = ordered
            .iter()
            .map(|run| {
                (
                    run.get("a").expect("a").to_string(),
                    run.get("b").expect("b").to_string(),
                )
            })
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("0".to_string(), "3".to_string()),
                ("1".to_string(), "1".to_string()),
                ("1".to_string(), "2".to_string()),
            ]
        );
    }

    #[test]
    fn empty_priority_list_sorts_by_raw_value() {
        let runs = vec![
            run_args(&[("eps", ArgValue::Float(0.3))]),
            run_args(&[("eps", ArgValue::Float(0.1))]),
            run_args(&[("eps", ArgValue::Float(0.2))]),
        ];
        let spec = vec![OrderingEntry {
            name: "eps".to_string(),
            priority: Vec::new(),
        }];
        let ordered = order(runs, &spec).expect("order");
        let eps: Vec<String> = ordered
            .iter()
            .map(|run| run.get("eps").expect("eps").to_string())
            .collect();
        assert_eq!(eps, vec!["0.1", "0.2", "0.3"]);
    }

    #[test]
    fn mixed_types_under_raw_value_key_fail() {
        let runs = vec![
            run_args(&[("lr", ArgValue::Float(0.1))]),
            run_args(&[("lr", ArgValue::Str("auto".to_string()))]),
        ];
        let spec = vec![OrderingEntry {
            name: "lr".to_string(),
            priority: Vec::new(),
        }];
        let err = order(runs, &spec).unwrap_err();
        assert!(matches!(err, SweepError::MixedOrderingKey { ref name } if name == "lr"));
    }

    #[test]
    fn value_absent_from_priority_list_fails() {
        let runs = vec![run_args(&[("method", ArgValue::Str("typo".to_string()))])];
        let spec = vec![OrderingEntry {
            name: "method".to_string(),
            priority: vec![ArgValue::Str("sinkhorn".to_string())],
        }];
        let err = order(runs, &spec).unwrap_err();
        assert!(matches!(err, SweepError::UnrankedValue { .. }));
    }

    #[test]
    fn ordering_name_missing_from_run_fails() {
        let runs = vec![run_args(&[("eps", ArgValue::Float(0.1))])];
        let spec = vec![OrderingEntry {
            name: "lam".to_string(),
            priority: Vec::new(),
        }];
        let err = order(runs, &spec).unwrap_err();
        assert!(matches!(err, SweepError::MissingArgument { ref name, .. } if name == "lam"));
    }

    #[test]
    fn round_robin_distributes_by_position() {
        let runs: Vec<RunDefinition> = (0..5)
            .map(|i| run_def(&format!("run{i}"), &[]))
            .collect();
        let config = PartitionConfig {
            strategy: PartitionStrategy::RoundRobin,
            bucket_count: 2,
        };
        let buckets = partition(&runs, &config).expect("partition");
        assert_eq!(buckets, vec![vec![0, 2, 4], vec![1, 3]]);
    }

    #[test]
    fn seed_partition_uses_seed_modulo() {
        let runs: Vec<RunDefinition> = (0..4)
            .map(|seed| {
                run_def(
                    &format!("seed{seed}"),
                    &[("seed", ArgValue::Int(seed))],
                )
            })
            .collect();
        let config = PartitionConfig {
            strategy: PartitionStrategy::Seed,
            bucket_count: 2,
        };
        let buckets = partition(&runs, &config).expect("partition");
        assert_eq!(buckets, vec![vec![0, 2], vec![1, 3]]);
    }

    #[test]
    fn seed_partition_without_seed_fails() {
        let runs = vec![run_def("r", &[("eps", ArgValue::Float(0.1))])];
        let config = PartitionConfig {
            strategy: PartitionStrategy::Seed,
            bucket_count: 2,
        };
        let err = partition(&runs, &config).unwrap_err();
        assert!(matches!(err, SweepError::MissingArgument { ref name, .. } if name == "seed"));
    }

    #[test]
    fn zero_buckets_is_a_config_error() {
        let config = PartitionConfig {
            strategy: PartitionStrategy::RoundRobin,
            bucket_count: 0,
        };
        let err = partition(&[], &config).unwrap_err();
        assert!(matches!(err, SweepError::Config { .. }));
    }
}
