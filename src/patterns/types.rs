use serde::{Deserialize, Serialize};

/// Dominant type inferred for a column
#[derive(Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Debug)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    Number,
    Date,
    Currency,
    Email,
    Phone,
    Text,
    /// Mostly dates, numbers and amounts, with no single one dominant
    Mixed,
}

impl DataType {
    /// Classification order for a single value; the first match wins.
    pub const PRIORITY: [Self; 5] = [
        Self::Currency,
        Self::Date,
        Self::Number,
        Self::Email,
        Self::Phone,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Number => "number",
            Self::Date => "date",
            Self::Currency => "currency",
            Self::Email => "email",
            Self::Phone => "phone",
            Self::Text => "text",
            Self::Mixed => "mixed",
        }
    }

    /// Date, number and currency: the types that count towards `Mixed`.
    pub fn is_structured(self) -> bool {
        matches!(self, Self::Date | Self::Number | Self::Currency)
    }
}

impl std::fmt::Display for DataType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Currency recognised from a symbol or a leading ISO code
#[derive(Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum CurrencyFormat {
    #[serde(rename = "USD")]
    Usd,
    #[serde(rename = "GBP")]
    Gbp,
    #[serde(rename = "CNY")]
    Cny,
    #[serde(rename = "EUR")]
    Eur,
}

impl CurrencyFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Usd => "USD",
            Self::Gbp => "GBP",
            Self::Cny => "CNY",
            Self::Eur => "EUR",
        }
    }
}

/// Date layouts distinguished by the format vote
#[derive(Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum DateFormat {
    #[serde(rename = "YYYY-MM-DD")]
    IsoDate,
    #[serde(rename = "MM/DD/YYYY")]
    MonthDayYear,
    #[serde(rename = "DD-MM-YYYY")]
    DayMonthYear,
    #[serde(rename = "TIMESTAMP")]
    Timestamp,
}

impl DateFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::IsoDate => "YYYY-MM-DD",
            Self::MonthDayYear => "MM/DD/YYYY",
            Self::DayMonthYear => "DD-MM-YYYY",
            Self::Timestamp => "TIMESTAMP",
        }
    }
}

/// Inferred profile of one column's sampled values
#[derive(Clone, Serialize, Deserialize, PartialEq, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ColumnPattern {
    pub column: String,
    pub data_type: DataType,
    /// Currency code or date layout; only set for currency and date columns
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    pub null_count: usize,
    pub unique_count: usize,
    /// Up to a handful of distinct raw values, in first-seen order
    pub samples: Vec<String>,
    /// Share of values matching `data_type`, in `[0, 1]`
    pub confidence: f64,
}

impl ColumnPattern {
    /// `1 - unique / (unique + null)`.
    ///
    /// Not a true duplicate rate: the row count never enters into it. Kept
    /// as-is because suggestion thresholds are tuned against it.
    pub fn estimated_duplicate_ratio(&self) -> f64 {
        let denominator = self.unique_count + self.null_count;
        if denominator == 0 {
            0.0
        } else {
            1.0 - self.unique_count as f64 / denominator as f64
        }
    }
}

/// Per-type match counts for one column
#[derive(Clone, Copy, Default, PartialEq, Eq, Debug)]
pub struct TypeCounts {
    pub currency: usize,
    pub date: usize,
    pub number: usize,
    pub email: usize,
    pub phone: usize,
}

impl TypeCounts {
    pub fn record(&mut self, matched: Option<DataType>) {
        match matched {
            Some(DataType::Currency) => self.currency += 1,
            Some(DataType::Date) => self.date += 1,
            Some(DataType::Number) => self.number += 1,
            Some(DataType::Email) => self.email += 1,
            Some(DataType::Phone) => self.phone += 1,
            Some(DataType::Text | DataType::Mixed) | None => {}
        }
    }

    pub fn get(&self, data_type: DataType) -> usize {
        match data_type {
            DataType::Currency => self.currency,
            DataType::Date => self.date,
            DataType::Number => self.number,
            DataType::Email => self.email,
            DataType::Phone => self.phone,
            DataType::Text | DataType::Mixed => 0,
        }
    }

    /// Values matching any non-text type
    pub fn typed(&self) -> usize {
        self.currency + self.date + self.number + self.email + self.phone
    }

    pub fn structured(&self) -> usize {
        self.currency + self.date + self.number
    }
}
