//! Advisory data-quality notes derived from detected column patterns.
//!
//! Suggestions never block anything; they are plain sentences meant for
//! whoever is authoring the pipeline.

use super::types::{ColumnPattern, DataType};
use crate::config::DetectorConfig;
use std::collections::BTreeSet;

pub fn generate_suggestions(patterns: &[ColumnPattern]) -> Vec<String> {
    generate_suggestions_with(patterns, &DetectorConfig::default())
}

/// Cross-column format conflicts first, then per-column notes in column order.
pub fn generate_suggestions_with(
    patterns: &[ColumnPattern],
    config: &DetectorConfig,
) -> Vec<String> {
    let mut suggestions = Vec::new();

    if let Some(note) = format_conflict(patterns, DataType::Date) {
        suggestions.push(format!(
            "Date columns use different formats ({note}); normalize them to YYYY-MM-DD before joining or sorting"
        ));
    }
    if let Some(note) = format_conflict(patterns, DataType::Currency) {
        suggestions.push(format!(
            "Currency columns use different currencies ({note}); convert to a single currency before comparing amounts"
        ));
    }

    for pattern in patterns {
        let duplicate_ratio = pattern.estimated_duplicate_ratio();
        if pattern.data_type != DataType::Text
            && duplicate_ratio > config.duplicate_ratio_threshold
        {
            suggestions.push(format!(
                "Column '{}' has an estimated {:.0}% duplicate values; consider a dedupe step",
                pattern.column,
                duplicate_ratio * 100.0
            ));
        }

        if pattern.data_type == DataType::Mixed {
            suggestions.push(format!(
                "Column '{}' mixes dates, numbers or amounts; clean it up or split it before use",
                pattern.column
            ));
        } else if pattern.confidence < config.low_confidence_threshold {
            suggestions.push(format!(
                "Column '{}' needs cleanup: only {:.0}% of values look like {}",
                pattern.column,
                pattern.confidence * 100.0,
                pattern.data_type
            ));
        }
    }

    tracing::debug!(count = suggestions.len(), "suggestions generated");
    suggestions
}

/// `"col (FMT), col (FMT)"` when columns of `data_type` disagree on format.
fn format_conflict(patterns: &[ColumnPattern], data_type: DataType) -> Option<String> {
    let columns: Vec<(&str, &str)> = patterns
        .iter()
        .filter(|p| p.data_type == data_type)
        .filter_map(|p| Some((p.column.as_str(), p.format.as_deref()?)))
        .collect();

    let distinct: BTreeSet<&str> = columns.iter().map(|(_, format)| *format).collect();
    if distinct.len() < 2 {
        return None;
    }

    Some(
        columns
            .iter()
            .map(|(column, format)| format!("{column} ({format})"))
            .collect::<Vec<_>>()
            .join(", "),
    )
}
