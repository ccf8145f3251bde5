//! Settings for the validators, the pattern detector and logging.
//!
//! Every field has a default, so a settings file only needs the keys it
//! changes:
//!
//! ```json
//! { "detector": { "dominant_threshold": 0.9 }, "validator": { "schema_tracking": "evolving" } }
//! ```

use crate::error::{Result, ResultExt as _};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub detector: DetectorConfig,
    pub validator: ValidatorConfig,
    pub logging: LoggingConfig,
}

impl Settings {
    /// Load settings from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file {}", path.display()))?;
        let settings: Self = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse settings file {}", path.display()))?;
        settings.detector.check()?;
        Ok(settings)
    }

    /// Load settings from `path` when given, defaults otherwise
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

/// Thresholds used by column pattern detection and suggestion generation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Share of values a single type must exceed to become the column type
    pub dominant_threshold: f64,
    /// Share the date, number and currency matches together must exceed for `mixed`
    pub mixed_threshold: f64,
    /// Maximum number of distinct sample values kept per column
    pub max_samples: usize,
    /// How many leading values take part in the format vote
    pub format_vote_window: usize,
    /// Earliest year accepted by free-form date parsing
    pub min_year: i32,
    /// Latest year accepted by free-form date parsing
    pub max_year: i32,
    pub duplicate_ratio_threshold: f64,
    pub low_confidence_threshold: f64,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            dominant_threshold: 0.8,
            mixed_threshold: 0.8,
            max_samples: 5,
            format_vote_window: 100,
            min_year: 1900,
            max_year: 2100,
            duplicate_ratio_threshold: 0.3,
            low_confidence_threshold: 0.8,
        }
    }
}

impl DetectorConfig {
    fn check(&self) -> Result<()> {
        let ratios = [
            ("dominant_threshold", self.dominant_threshold),
            ("mixed_threshold", self.mixed_threshold),
            ("duplicate_ratio_threshold", self.duplicate_ratio_threshold),
            ("low_confidence_threshold", self.low_confidence_threshold),
        ];
        for (name, value) in ratios {
            if !(0.0..=1.0).contains(&value) {
                return Err(crate::error::TablespecError::Config(format!(
                    "detector.{name} must be between 0 and 1, got {value}"
                )));
            }
        }
        if self.min_year > self.max_year {
            return Err(crate::error::TablespecError::Config(format!(
                "detector.min_year ({}) is after detector.max_year ({})",
                self.min_year, self.max_year
            )));
        }
        Ok(())
    }
}

/// How the semantic validator treats columns created by earlier steps
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaTracking {
    /// Every step is checked against the primary table's initial columns
    #[default]
    Static,
    /// Columns added or removed by earlier steps are visible to later ones
    Evolving,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidatorConfig {
    pub schema_tracking: SchemaTracking,
    /// Report filter conditions whose operator needs a `value` but has none
    pub require_filter_value: bool,
    pub primary_table: String,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            schema_tracking: SchemaTracking::Static,
            require_filter_value: false,
            primary_table: crate::pipeline::PRIMARY_DATASET.to_owned(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive; `RUST_LOG` takes precedence
    pub level: String,
    /// Write daily-rotated log files here in addition to the console
    pub directory: Option<PathBuf>,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            directory: None,
            json: false,
        }
    }
}
