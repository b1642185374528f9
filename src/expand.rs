//! Argument normalization, Cartesian expansion, and group combination.
//!
//! Everything here is pure: a declarative argument spec goes in, an ordered
//! list of concrete argument mappings comes out. Declaration order is
//! semantic: it fixes both the key order inside each run and the product
//! order across runs.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::error::SweepError;

/// JSON object preserving insertion order (serde_json `preserve_order`).
pub type JsonMap = serde_json::Map<String, Value>;

/// One concrete argument value.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum ArgValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl ArgValue {
    /// Convert a JSON scalar into an argument value.
    ///
    /// Objects, nulls, and nested arrays are rejected: candidate values must
    /// render to a single command-line token.
    pub fn from_json(name: &str, value: &Value) -> Result<Self, SweepError> {
        match value {
            Value::Bool(b) => Ok(ArgValue::Bool(*b)),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Ok(ArgValue::Int(i))
                } else if let Some(f) = n.as_f64() {
                    Ok(ArgValue::Float(f))
                } else {
                    Err(SweepError::Config {
                        detail: format!("argument '{name}': number {n} is out of range"),
                    })
                }
            }
            Value::String(s) => Ok(ArgValue::Str(s.clone())),
            other => Err(SweepError::Config {
                detail: format!("argument '{name}': unsupported value {other}"),
            }),
        }
    }
}

/// Command-line rendering of a value. Path rendering differs only for `seed`
/// (see `naming::path_value`).
impl fmt::Display for ArgValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgValue::Bool(b) => write!(f, "{b}"),
            ArgValue::Int(i) => write!(f, "{i}"),
            ArgValue::Float(x) => write!(f, "{x}"),
            ArgValue::Str(s) => f.write_str(s),
        }
    }
}

/// A normalized argument spec: every name maps to an ordered candidate
/// list, in declaration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArgSpec(Vec<(String, Vec<ArgValue>)>);

impl ArgSpec {
    pub fn contains(&self, name: &str) -> bool {
        self.0.iter().any(|(k, _)| k == name)
    }

    pub fn push(&mut self, name: String, values: Vec<ArgValue>) {
        self.0.push((name, values));
    }

    pub fn entries(&self) -> &[(String, Vec<ArgValue>)] {
        &self.0
    }
}

/// One run's concrete arguments, in declaration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunArgs(Vec<(String, ArgValue)>);

impl RunArgs {
    pub fn new(pairs: Vec<(String, ArgValue)>) -> Self {
        RunArgs(pairs)
    }

    pub fn get(&self, name: &str) -> Option<&ArgValue> {
        self.0
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = &(String, ArgValue)> {
        self.0.iter()
    }
}

/// Normalize a raw argument mapping: scalars become one-element candidate
/// lists, lists are kept as declared.
pub fn normalize(raw: &JsonMap) -> Result<ArgSpec, SweepError> {
    let mut spec = ArgSpec::default();
    for (name, value) in raw {
        let candidates = match value {
            Value::Array(items) => items
                .iter()
                .map(|item| ArgValue::from_json(name, item))
                .collect::<Result<Vec<_>, _>>()?,
            scalar => vec![ArgValue::from_json(name, scalar)?],
        };
        spec.push(name.clone(), candidates);
    }
    Ok(spec)
}

/// Full Cartesian product of a normalized spec.
///
/// The last key varies fastest, matching nested-loop iteration order. An
/// empty candidate list anywhere yields an empty product, which downstream
/// stages treat as a valid zero-run sweep. An empty spec yields exactly one
/// empty run.
pub fn expand(spec: &ArgSpec) -> Vec<RunArgs> {
    let entries = spec.entries();
    if entries.is_empty() {
        return vec![RunArgs::default()];
    }
    if entries.iter().any(|(_, candidates)| candidates.is_empty()) {
        return Vec::new();
    }

    let total: usize = entries.iter().map(|(_, candidates)| candidates.len()).product();
    let mut runs = Vec::with_capacity(total);
    let mut cursor = vec![0usize; entries.len()];

    loop {
        let pairs = entries
            .iter()
            .zip(&cursor)
            .map(|((name, candidates), &i)| (name.clone(), candidates[i].clone()))
            .collect();
        runs.push(RunArgs::new(pairs));

        // Odometer increment, rightmost digit first.
        let mut pos = entries.len();
        loop {
            if pos == 0 {
                return runs;
            }
            pos -= 1;
            cursor[pos] += 1;
            if cursor[pos] < entries[pos].1.len() {
                break;
            }
            cursor[pos] = 0;
        }
    }
}

/// Expand each group merged with the shared arguments, concatenating results
/// in group order.
///
/// Merge precedence is asymmetric on purpose: a group key always wins over a
/// shared key of the same name, and shared-only keys are appended after the
/// group's own keys. With no groups, the shared arguments expand alone.
pub fn combine(groups: &[JsonMap], shared: &JsonMap) -> Result<Vec<RunArgs>, SweepError> {
    let shared_spec = normalize(shared)?;
    if groups.is_empty() {
        return Ok(expand(&shared_spec));
    }

    let mut runs = Vec::new();
    for group in groups {
        let mut merged = normalize(group)?;
        for (name, candidates) in shared_spec.entries() {
            if !merged.contains(name) {
                merged.push(name.clone(), candidates.clone());
            }
        }
        runs.extend(expand(&merged));
    }
    Ok(runs)
}
