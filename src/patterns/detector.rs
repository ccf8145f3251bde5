//! Column-level type inference over row-major sample data.
//!
//! Each column is profiled independently, so the pass is split per column
//! across the rayon pool. Output is index-aligned with `headers`.

use super::classify::{classify_value, currency_format, date_format, majority_vote};
use super::types::{ColumnPattern, CurrencyFormat, DataType, DateFormat, TypeCounts};
use crate::config::DetectorConfig;
use rayon::prelude::*;
use serde_json::Value;
use std::collections::HashSet;

/// Profile every column with the default thresholds.
pub fn detect_patterns(rows: &[Vec<Value>], headers: &[String]) -> Vec<ColumnPattern> {
    detect_patterns_with(rows, headers, &DetectorConfig::default())
}

/// Profile every column of `rows`, one [`ColumnPattern`] per header.
///
/// Rows shorter than `headers` contribute nulls for the missing cells; cells
/// past the last header are ignored.
pub fn detect_patterns_with(
    rows: &[Vec<Value>],
    headers: &[String],
    config: &DetectorConfig,
) -> Vec<ColumnPattern> {
    let patterns: Vec<ColumnPattern> = headers
        .par_iter()
        .enumerate()
        .map(|(idx, header)| detect_column(header, rows.iter().map(|row| row.get(idx)), config))
        .collect();

    tracing::debug!(
        columns = patterns.len(),
        rows = rows.len(),
        "pattern detection complete"
    );
    patterns
}

/// Profile a single column from its cells, in row order.
pub fn detect_column<'a>(
    column: &str,
    cells: impl IntoIterator<Item = Option<&'a Value>>,
    config: &DetectorConfig,
) -> ColumnPattern {
    let mut null_count = 0;
    let mut values = Vec::new();
    for cell in cells {
        match cell_text(cell) {
            Some(text) => values.push(text),
            None => null_count += 1,
        }
    }

    let mut seen = HashSet::with_capacity(values.len());
    let mut samples = Vec::new();
    for value in &values {
        if seen.insert(value.as_str()) && samples.len() < config.max_samples {
            samples.push(value.clone());
        }
    }
    let unique_count = seen.len();

    let mut counts = TypeCounts::default();
    for value in &values {
        counts.record(classify_value(value, config));
    }

    let (data_type, confidence) = decide(&counts, values.len(), config);
    let window = values.iter().take(config.format_vote_window);
    let format = match data_type {
        DataType::Currency => Some(
            majority_vote(window.filter_map(|v| currency_format(v)), CurrencyFormat::Usd)
                .as_str()
                .to_owned(),
        ),
        DataType::Date => Some(
            majority_vote(window.filter_map(|v| date_format(v)), DateFormat::IsoDate)
                .as_str()
                .to_owned(),
        ),
        _ => None,
    };

    tracing::debug!(
        column,
        data_type = %data_type,
        confidence,
        null_count,
        unique_count,
        "column classified"
    );

    ColumnPattern {
        column: column.to_owned(),
        data_type,
        format,
        null_count,
        unique_count,
        samples,
        confidence,
    }
}

/// Text of a cell, or `None` when it counts as null.
///
/// Strings are kept verbatim; numbers and booleans use their JSON text. Missing
/// cells, JSON null and blank strings are null.
fn cell_text(cell: Option<&Value>) -> Option<String> {
    match cell? {
        Value::Null => None,
        Value::String(s) if s.trim().is_empty() => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn decide(counts: &TypeCounts, total: usize, config: &DetectorConfig) -> (DataType, f64) {
    if total == 0 {
        return (DataType::Text, 0.0);
    }
    let ratio = |count: usize| count as f64 / total as f64;

    for data_type in DataType::PRIORITY {
        let share = ratio(counts.get(data_type));
        if share > config.dominant_threshold {
            return (data_type, share);
        }
    }

    if ratio(counts.structured()) > config.mixed_threshold {
        return (DataType::Mixed, 0.5);
    }

    (DataType::Text, (1.0 - ratio(counts.typed())).clamp(0.0, 1.0))
}
