//! Detection report rendering (text table or JSON records).

use polars::prelude::*;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::detect::Detection;
use crate::stats::ScoreSummary;

#[derive(Serialize)]
struct JsonReport<'a> {
    year: i64,
    columns: &'a [String],
    cleaned_rows: usize,
    outlier_count: usize,
    threshold: f64,
    summary: &'a ScoreSummary,
    outliers: Vec<Map<String, Value>>,
}

/// One-line headline for a detection.
pub fn headline(detection: &Detection) -> String {
    format!(
        "Outliers detected for Year {}: {} of {} rows (threshold {:.3})",
        detection.year,
        detection.outlier_count(),
        detection.cleaned_rows,
        detection.threshold
    )
}

/// Score distribution line.
pub fn score_line(summary: &ScoreSummary) -> String {
    format!(
        "Scores: mean {:.3}, median {:.3}, std {:.3}, p05 {:.3}, p95 {:.3}, max {:.3}",
        summary.mean, summary.median, summary.std, summary.p05, summary.p95, summary.max
    )
}

/// Headline, flagged rows as a table, and the score distribution.
pub fn to_text(detection: &Detection) -> String {
    let mut out = headline(detection);
    out.push('\n');
    if detection.is_empty() {
        out.push_str("No outliers for this selection.\n");
    } else {
        out.push_str(&detection.outliers.to_string());
        out.push('\n');
    }
    out.push_str(&score_line(&detection.summary));
    out
}

/// Flagged rows as a list of `{column: value}` records.
pub fn records(df: &DataFrame) -> PolarsResult<Vec<Map<String, Value>>> {
    let mut rows = Vec::with_capacity(df.height());
    for i in 0..df.height() {
        let mut record = Map::new();
        for column in df.get_columns() {
            record.insert(column.name().to_string(), json_value(column.get(i)?));
        }
        rows.push(record);
    }
    Ok(rows)
}

/// Whole detection as pretty-printed JSON.
pub fn to_json(detection: &Detection) -> anyhow::Result<String> {
    let report = JsonReport {
        year: detection.year,
        columns: &detection.columns,
        cleaned_rows: detection.cleaned_rows,
        outlier_count: detection.outlier_count(),
        threshold: detection.threshold,
        summary: &detection.summary,
        outliers: records(&detection.outliers)?,
    };
    Ok(serde_json::to_string_pretty(&report)?)
}

fn json_value(value: AnyValue<'_>) -> Value {
    match value {
        AnyValue::Null => Value::Null,
        AnyValue::Boolean(b) => Value::Bool(b),
        AnyValue::String(s) => Value::String(s.to_string()),
        AnyValue::StringOwned(s) => Value::String(s.to_string()),
        AnyValue::Int8(v) => Value::from(v),
        AnyValue::Int16(v) => Value::from(v),
        AnyValue::Int32(v) => Value::from(v),
        AnyValue::Int64(v) => Value::from(v),
        AnyValue::UInt8(v) => Value::from(v),
        AnyValue::UInt16(v) => Value::from(v),
        AnyValue::UInt32(v) => Value::from(v),
        AnyValue::UInt64(v) => Value::from(v),
        AnyValue::Float32(v) => float_value(v as f64),
        AnyValue::Float64(v) => float_value(v),
        other => Value::String(other.to_string()),
    }
}

fn float_value(v: f64) -> Value {
    serde_json::Number::from_f64(v)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}
