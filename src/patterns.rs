//! Column pattern detection over raw sample data.
//!
//! Every non-null value in a column is classified by a priority cascade
//! (currency, then date, number, email, phone) and the per-type counts decide
//! the column's dominant type. Currency and date columns also get a format from
//! a majority vote over the leading values.
//!
//! ```
//! use serde_json::json;
//! use tablespec::config::DetectorConfig;
//! use tablespec::patterns::{DataType, analyse};
//!
//! let headers = vec!["joined".to_owned()];
//! let rows = vec![vec![json!("2024-01-15")], vec![json!("2024-02-20")]];
//! let report = analyse(&rows, &headers, &DetectorConfig::default());
//! assert_eq!(report.patterns[0].data_type, DataType::Date);
//! ```

pub mod classify;
pub mod detector;
pub mod suggestions;
pub mod types;

pub use classify::classify_value;
pub use detector::{detect_column, detect_patterns, detect_patterns_with};
pub use suggestions::{generate_suggestions, generate_suggestions_with};
pub use types::{ColumnPattern, CurrencyFormat, DataType, DateFormat};

use crate::config::DetectorConfig;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Patterns for every column plus the suggestions derived from them
#[derive(Clone, Serialize, Deserialize, PartialEq, Debug, Default)]
pub struct DetectionReport {
    pub patterns: Vec<ColumnPattern>,
    pub suggestions: Vec<String>,
}

/// Detect patterns and derive suggestions in one call.
pub fn analyse(rows: &[Vec<Value>], headers: &[String], config: &DetectorConfig) -> DetectionReport {
    let patterns = detect_patterns_with(rows, headers, config);
    let suggestions = generate_suggestions_with(&patterns, config);
    DetectionReport {
        patterns,
        suggestions,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_analyse_flags_conflicting_date_columns() {
        let headers = vec!["created".to_owned(), "shipped".to_owned()];
        let rows = vec![
            vec![json!("2024-01-15"), json!("01/20/2024")],
            vec![json!("2024-02-15"), json!("02/20/2024")],
            vec![json!("2024-03-15"), json!("03/20/2024")],
        ];
        let report = analyse(&rows, &headers, &DetectorConfig::default());

        assert_eq!(report.patterns.len(), 2);
        assert_eq!(report.patterns[1].format.as_deref(), Some("MM/DD/YYYY"));
        assert_eq!(report.suggestions.len(), 1);
        assert!(report.suggestions[0].contains("created"));
        assert!(report.suggestions[0].contains("shipped"));
    }

    #[test]
    fn test_report_serializes_camel_case() {
        let report = analyse(
            &[vec![json!("a@b.com")]],
            &["email".to_owned()],
            &DetectorConfig::default(),
        );
        let json = serde_json::to_value(&report).expect("serialize");
        assert_eq!(json["patterns"][0]["dataType"], "email");
        assert!(json["suggestions"].as_array().is_some());
    }
}
