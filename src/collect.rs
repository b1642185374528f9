//! Result readback: parse saved run records into formatted report rows.
//!
//! Records are keyed by the same computed path segments generation used, so
//! a sweep config is enough to locate every run's artifacts. Two historical
//! record layouts exist; the flat-array fallback keeps old result trees
//! readable.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::Path;

use crate::config::SweepConfig;
use crate::error::SweepError;
use crate::generate;

/// Per-run result record written by the executed command.
pub const RECORD_FILE: &str = "record.json";

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RunRecord {
    pub accuracy: f64,
    pub run_time: f64,
    pub num_iter: u64,
    pub func_calls: u64,
    pub overflow: bool,
    pub converge: bool,
}

/// One collected row, ready for report assembly.
#[derive(Debug, Clone)]
pub struct RunRow {
    pub segment: String,
    pub cells: String,
}

#[derive(Debug, Default)]
pub struct CollectReport {
    pub rows: Vec<RunRow>,
    /// Runs whose record was absent or unreadable, with the reason.
    pub failed: Vec<(String, String)>,
}

/// Parse a record in either the current object layout or the legacy flat
/// array layout (leading fields in the same order, trailing series ignored).
pub fn parse_record(bytes: &[u8]) -> Result<RunRecord, String> {
    if let Ok(record) = serde_json::from_slice::<RunRecord>(bytes) {
        return Ok(record);
    }
    let value: Value =
        serde_json::from_slice(bytes).map_err(|err| format!("invalid JSON: {err}"))?;
    let items = value
        .as_array()
        .ok_or_else(|| "record is neither the current object layout nor an array".to_string())?;
    if items.len() < 6 {
        return Err(format!("legacy record has {} fields, expected >= 6", items.len()));
    }
    Ok(RunRecord {
        accuracy: legacy_f64(&items[0], "accuracy")?,
        run_time: legacy_f64(&items[1], "run_time")?,
        num_iter: legacy_u64(&items[2], "num_iter")?,
        func_calls: legacy_u64(&items[3], "func_calls")?,
        overflow: legacy_bool(&items[4], "overflow")?,
        converge: legacy_bool(&items[5], "converge")?,
    })
}

fn legacy_f64(value: &Value, field: &str) -> Result<f64, String> {
    value
        .as_f64()
        .ok_or_else(|| format!("legacy field {field}: expected number, got {value}"))
}

fn legacy_u64(value: &Value, field: &str) -> Result<u64, String> {
    value
        .as_u64()
        .ok_or_else(|| format!("legacy field {field}: expected integer, got {value}"))
}

/// Old writers stored flags as 0/1 as often as true/false.
fn legacy_bool(value: &Value, field: &str) -> Result<bool, String> {
    match value {
        Value::Bool(b) => Ok(*b),
        Value::Number(n) => Ok(n.as_f64().unwrap_or(0.0) != 0.0),
        other => Err(format!("legacy field {field}: expected flag, got {other}")),
    }
}

/// Format one report row: accuracy, average iterations per call, average
/// time per iteration. Overflowed runs render as dashes; non-converged runs
/// get a `*` marker on the iteration cell.
pub fn format_row(record: &RunRecord) -> String {
    if record.overflow || record.num_iter == 0 || record.func_calls == 0 {
        return " & $-$ & $-$ & $-$".to_string();
    }
    let avg_iter = record.num_iter as f64 / record.func_calls as f64;
    let avg_time = record.run_time / record.num_iter as f64;
    let marker = if record.converge { "" } else { "*" };
    format!(
        " & ${:4.1}$ & ${:5}{marker}$ & ${:6.1}$",
        record.accuracy, avg_iter as i64, avg_time
    )
}

/// Read the record for every planned run under `outputs_root`.
///
/// Missing or unreadable records are reported per run rather than aborting
/// the whole collection.
pub fn collect(config: &SweepConfig, outputs_root: &Path) -> Result<CollectReport, SweepError> {
    let runs = generate::plan_runs(config, outputs_root)?;
    let mut report = CollectReport::default();
    for run in &runs {
        let record_path = run.output_dir.join(RECORD_FILE);
        let bytes = match fs::read(&record_path) {
            Ok(bytes) => bytes,
            Err(err) => {
                report
                    .failed
                    .push((run.path_segment.clone(), format!("read {}: {err}", record_path.display())));
                continue;
            }
        };
        match parse_record(&bytes) {
            Ok(record) => report.rows.push(RunRow {
                segment: run.path_segment.clone(),
                cells: format_row(&record),
            }),
            Err(reason) => report.failed.push((run.path_segment.clone(), reason)),
        }
    }
    tracing::info!(
        rows = report.rows.len(),
        failed = report.failed.len(),
        "collected run records"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record() -> RunRecord {
        RunRecord {
            accuracy: 87.3,
            run_time: 600.0,
            num_iter: 300,
            func_calls: 100,
            overflow: false,
            converge: true,
        }
    }

    #[test]
    fn parses_current_object_layout() {
        let bytes = serde_json::to_vec(&record()).expect("serialize");
        assert_eq!(parse_record(&bytes).expect("parse"), record());
    }

    #[test]
    fn parses_legacy_array_layout_with_trailing_series() {
        let doc = json!([87.3, 600.0, 300, 100, 0, 1, [0.5, 0.4, 0.3]]);
        let bytes = serde_json::to_vec(&doc).expect("serialize");
        let parsed = parse_record(&bytes).expect("parse");
        assert_eq!(parsed, record());
    }

    #[test]
    fn rejects_short_legacy_records() {
        let bytes = serde_json::to_vec(&json!([1.0, 2.0])).expect("serialize");
        assert!(parse_record(&bytes).is_err());
    }

    #[test]
    fn converged_row_has_no_marker() {
        let row = format_row(&record());
        assert_eq!(row, " & $87.3$ & $    3$ & $   2.0$");
    }

    #[test]
    fn non_converged_row_is_starred() {
        let mut r = record();
        r.converge = false;
        assert!(format_row(&r).contains("3*$"));
    }

    #[test]
    fn overflow_row_is_dashes() {
        let mut r = record();
        r.overflow = true;
        assert_eq!(format_row(&r), " & $-$ & $-$ & $-$");
    }

    #[test]
    fn collect_reports_missing_records_per_run() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let config: SweepConfig = serde_json::from_value(json!({
            "schema_version": 1,
            "cmd": "python attack.py",
            "arguments": {"shared": {"eps": [0.1, 0.2]}},
            "naming": {"strategy": "suffix", "base": "attack"},
            "root": tmp.path().join("batches"),
            "output_root": tmp.path().join("outputs"),
        }))
        .expect("config");

        let done = tmp.path().join("outputs/attack_eps-0.1");
        fs::create_dir_all(&done).expect("mkdir");
        fs::write(
            done.join(RECORD_FILE),
            serde_json::to_vec(&record()).expect("serialize"),
        )
        .expect("write record");

        let report = collect(&config, &tmp.path().join("outputs")).expect("collect");
        assert_eq!(report.rows.len(), 1);
        assert_eq!(report.rows[0].segment, "attack_eps-0.1");
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, "attack_eps-0.2");
    }
}
