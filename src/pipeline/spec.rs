//! Pipeline specification data structures.
//!
//! Defines the JSON wire format for pipeline specs: the top-level document and
//! the closed set of operation shapes, discriminated by the `op` field.
//!
//! These types describe *well-formed* pipelines. Untrusted documents should go
//! through [`validate_structure`](super::structure::validate_structure) first,
//! which reports every shape problem with its location instead of stopping at
//! the first one like plain deserialisation does.

use crate::error::{Result, ResultExt as _, TablespecError};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

/// Current pipeline spec version
pub const SPEC_VERSION: &str = "v1";

/// Name of the primary dataset every pipeline operates on
pub const PRIMARY_DATASET: &str = "a";

/// Root pipeline specification structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineSpec {
    /// Specification version, always [`SPEC_VERSION`]
    pub version: String,

    /// Primary dataset name, always [`PRIMARY_DATASET`]
    pub dataset: String,

    /// Ordered sequence of operations; order is execution order
    pub steps: Vec<Step>,

    /// Free-form authoring metadata
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<PipelineMeta>,
}

impl PipelineSpec {
    /// Create an empty pipeline over the primary dataset
    pub fn new() -> Self {
        Self {
            version: SPEC_VERSION.to_owned(),
            dataset: PRIMARY_DATASET.to_owned(),
            steps: Vec::new(),
            meta: None,
        }
    }

    /// Append a step, builder style
    #[must_use]
    pub fn with_step(mut self, step: Step) -> Self {
        self.steps.push(step);
        self
    }

    /// Load a pipeline spec from a JSON file, running structural validation.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .context("Failed to read pipeline spec file")?;
        Self::from_json(&content)
    }

    /// Parse a pipeline spec from a JSON string, running structural validation.
    ///
    /// Structural errors are rendered one per line into
    /// [`TablespecError::Input`].
    pub fn from_json(json: &str) -> Result<Self> {
        let doc: Value = serde_json::from_str(json)?;
        super::structure::validate_structure(&doc).map_err(|errors| {
            let rendered: Vec<String> = errors.iter().map(ToString::to_string).collect();
            TablespecError::Input(rendered.join("\n"))
        })
    }

    /// Serialize pipeline spec to a JSON string
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize pipeline spec")
    }

    /// Tables other than the primary dataset that this pipeline reads from
    ///
    /// Each table appears once, in order of first reference.
    pub fn referenced_tables(&self) -> Vec<&str> {
        let mut seen = BTreeSet::new();
        self.steps
            .iter()
            .filter_map(Step::referenced_table)
            .filter(|table| *table != PRIMARY_DATASET && seen.insert(*table))
            .collect()
    }
}

impl Default for PipelineSpec {
    fn default() -> Self {
        Self::new()
    }
}

/// Optional authoring metadata carried alongside the steps
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,

    /// The request that produced this pipeline, when it came from a prompt
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_query: Option<String>,
}

/// Pipeline operation (tagged enum)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase", rename_all_fields = "camelCase")]
pub enum Step {
    /// Rewrite date and money columns into canonical representations
    Normalize {
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        dates: Vec<DateNormalization>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        money: Vec<MoneyNormalization>,
    },

    /// Collapse rows sharing the `by` key, optionally aggregating the rest
    Dedupe {
        by: Vec<String>,
        keep: KeepPolicy,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        order_by: Vec<DedupeOrder>,
        #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
        aggs: BTreeMap<String, DedupeAggregation>,
    },

    /// Split one column into several
    Split {
        column: String,
        by: SplitDelimiter,
        into: Vec<String>,
        /// Only meaningful when `by` is `regex`
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pattern: Option<String>,
    },

    /// Concatenate columns into a single target column
    Merge {
        columns: Vec<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        into: Option<String>,
        /// Older spelling of `into`; at least one of the two is present
        #[serde(default, skip_serializing_if = "Option::is_none")]
        new_column: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        separator: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        keep_original: Option<bool>,
    },

    /// Whitespace trimming and literal replacements
    Clean {
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        trims: Vec<String>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        normalize_space: Vec<String>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        replace: Vec<Replacement>,
    },

    /// Join the primary dataset with another registered table
    Join {
        right_ref: String,
        how: JoinKind,
        /// Left column -> right column
        on: BTreeMap<String, String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        select: Option<Vec<String>>,
    },

    /// Compare the primary dataset against another registered table
    Diff {
        right_ref: String,
        key: Vec<String>,
        scope: DiffScope,
    },

    /// Keep rows matching every condition
    Filter { conditions: Vec<Condition> },

    /// Order rows by one or more keys
    Sort { by: Vec<SortKey> },

    /// Group rows and compute aggregates
    Aggregate {
        group_by: Vec<String>,
        aggs: BTreeMap<String, Aggregation>,
    },

    /// Keep (or with `exclude`, drop) the listed columns
    Select {
        columns: Vec<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        exclude: Option<bool>,
    },
}

impl Step {
    /// Every `op` discriminant, in wire order.
    pub const OPS: [&'static str; 11] = [
        "normalize",
        "dedupe",
        "split",
        "merge",
        "clean",
        "join",
        "diff",
        "filter",
        "sort",
        "aggregate",
        "select",
    ];

    /// The `op` discriminant of this step
    pub fn op_name(&self) -> &'static str {
        match self {
            Self::Normalize { .. } => "normalize",
            Self::Dedupe { .. } => "dedupe",
            Self::Split { .. } => "split",
            Self::Merge { .. } => "merge",
            Self::Clean { .. } => "clean",
            Self::Join { .. } => "join",
            Self::Diff { .. } => "diff",
            Self::Filter { .. } => "filter",
            Self::Sort { .. } => "sort",
            Self::Aggregate { .. } => "aggregate",
            Self::Select { .. } => "select",
        }
    }

    /// The table named by `rightRef`, for steps that read a second table
    pub fn referenced_table(&self) -> Option<&str> {
        match self {
            Self::Join { right_ref, .. } | Self::Diff { right_ref, .. } => Some(right_ref),
            Self::Normalize { .. }
            | Self::Dedupe { .. }
            | Self::Split { .. }
            | Self::Merge { .. }
            | Self::Clean { .. }
            | Self::Filter { .. }
            | Self::Sort { .. }
            | Self::Aggregate { .. }
            | Self::Select { .. } => None,
        }
    }

    /// Target column of a merge, preferring `into` over `newColumn`
    pub fn merge_target(&self) -> Option<&str> {
        match self {
            Self::Merge {
                into, new_column, ..
            } => into.as_deref().or(new_column.as_deref()),
            _ => None,
        }
    }
}

/// Implements `as_str` and the list of accepted wire spellings for a fieldless enum.
macro_rules! wire_enum {
    ($name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            /// Accepted wire spellings, in declaration order
            pub const VARIANTS: &'static [&'static str] = &[$($text),+];

            pub fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $text),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateNormalization {
    pub col: String,
    pub to: DateTarget,
}

/// Canonical date representation produced by `normalize`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DateTarget {
    #[serde(rename = "YYYY-MM-DD")]
    IsoDate,
}

wire_enum!(DateTarget { IsoDate => "YYYY-MM-DD" });

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoneyNormalization {
    pub col: String,
    pub keep: MoneyTarget,
}

/// Canonical money representation produced by `normalize`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MoneyTarget {
    Number,
}

wire_enum!(MoneyTarget { Number => "number" });

/// Which row survives a dedupe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeepPolicy {
    Latest,
    Earliest,
}

wire_enum!(KeepPolicy { Latest => "latest", Earliest => "earliest" });

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DedupeOrder {
    pub col: String,
    pub dir: SortOrder,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DedupeAggregation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub col: Option<String>,
    #[serde(rename = "fn")]
    pub func: DedupeFn,
}

/// Aggregate functions available inside a dedupe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DedupeFn {
    Sum,
    Count,
    Max,
    Min,
}

wire_enum!(DedupeFn { Sum => "sum", Count => "count", Max => "max", Min => "min" });

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SplitDelimiter {
    #[serde(rename = " ")]
    Space,
    #[serde(rename = ",")]
    Comma,
    #[serde(rename = ";")]
    Semicolon,
    #[serde(rename = "regex")]
    Regex,
}

wire_enum!(SplitDelimiter { Space => " ", Comma => ",", Semicolon => ";", Regex => "regex" });

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Replacement {
    pub col: String,
    pub from: String,
    pub to: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JoinKind {
    Left,
    Inner,
}

wire_enum!(JoinKind { Left => "left", Inner => "inner" });

/// Columns compared by a diff: every column, or an explicit list
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiffScope {
    All,
    Columns(Vec<String>),
}

impl DiffScope {
    pub const ALL: &'static str = "all";
}

impl Serialize for DiffScope {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Self::All => serializer.serialize_str(Self::ALL),
            Self::Columns(columns) => columns.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for DiffScope {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Value::deserialize(deserializer)? {
            Value::String(s) if s == Self::ALL => Ok(Self::All),
            Value::Array(items) => items
                .into_iter()
                .map(|item| match item {
                    Value::String(s) => Ok(s),
                    other => Err(D::Error::custom(format!(
                        "expected column name, found {other}"
                    ))),
                })
                .collect::<std::result::Result<Vec<_>, _>>()
                .map(Self::Columns),
            other => Err(D::Error::custom(format!(
                "expected \"all\" or a list of columns, found {other}"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub col: String,
    pub op: FilterOp,
    /// Comparison operand; unused by the null tests
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

/// Comparison operators accepted in filter conditions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FilterOp {
    #[serde(rename = "=")]
    Eq,
    #[serde(rename = "!=")]
    NotEq,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = ">=")]
    GtEq,
    #[serde(rename = "<=")]
    LtEq,
    #[serde(rename = "contains")]
    Contains,
    #[serde(rename = "not_contains")]
    NotContains,
    #[serde(rename = "is_null")]
    IsNull,
    #[serde(rename = "is_not_null")]
    IsNotNull,
}

wire_enum!(FilterOp {
    Eq => "=",
    NotEq => "!=",
    Gt => ">",
    Lt => "<",
    GtEq => ">=",
    LtEq => "<=",
    Contains => "contains",
    NotContains => "not_contains",
    IsNull => "is_null",
    IsNotNull => "is_not_null",
});

impl FilterOp {
    /// Whether the operator compares against a `value`
    pub fn takes_value(self) -> bool {
        !matches!(self, Self::IsNull | Self::IsNotNull)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortKey {
    pub col: String,
    pub order: SortOrder,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

wire_enum!(SortOrder { Asc => "asc", Desc => "desc" });

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Aggregation {
    #[serde(rename = "fn")]
    pub func: AggregateFn,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub col: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AggregateFn {
    Sum,
    Count,
    Avg,
    Max,
    Min,
}

wire_enum!(AggregateFn {
    Sum => "sum",
    Count => "count",
    Avg => "avg",
    Max => "max",
    Min => "min",
});

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_spec_serialization() {
        let spec = PipelineSpec::new()
            .with_step(Step::Merge {
                columns: vec!["first".to_owned(), "last".to_owned()],
                into: None,
                new_column: Some("full_name".to_owned()),
                separator: Some(" ".to_owned()),
                keep_original: None,
            })
            .with_step(Step::Diff {
                right_ref: "b".to_owned(),
                key: vec!["id".to_owned()],
                scope: DiffScope::All,
            });

        let json = spec.to_json().expect("serialize");
        assert!(json.contains("\"version\": \"v1\""));
        assert!(json.contains("\"op\": \"merge\""));
        assert!(json.contains("\"newColumn\": \"full_name\""));
        assert!(json.contains("\"rightRef\": \"b\""));
        assert!(json.contains("\"scope\": \"all\""));

        let parsed = PipelineSpec::from_json(&json).expect("parse back");
        assert_eq!(parsed, spec);
    }

    #[test]
    fn test_step_wire_names() {
        let step: Step = serde_json::from_value(json!({
            "op": "filter",
            "conditions": [{ "col": "age", "op": ">=", "value": 18 }, { "col": "email", "op": "is_not_null" }]
        }))
        .expect("filter step");

        let Step::Filter { conditions } = &step else {
            panic!("expected filter, got {step:?}");
        };
        assert_eq!(conditions[0].op, FilterOp::GtEq);
        assert_eq!(conditions[0].value, Some(json!(18)));
        assert_eq!(conditions[1].op, FilterOp::IsNotNull);
        assert!(!conditions[1].op.takes_value());
        assert_eq!(step.op_name(), "filter");
    }

    #[test]
    fn test_diff_scope_column_list() {
        let scope: DiffScope = serde_json::from_value(json!(["price", "qty"])).expect("list");
        assert_eq!(
            scope,
            DiffScope::Columns(vec!["price".to_owned(), "qty".to_owned()])
        );
        assert!(serde_json::from_value::<DiffScope>(json!("some")).is_err());
    }

    #[test]
    fn test_merge_target_prefers_into() {
        let step = Step::Merge {
            columns: vec!["a".to_owned(), "b".to_owned()],
            into: Some("ab".to_owned()),
            new_column: Some("legacy".to_owned()),
            separator: None,
            keep_original: None,
        };
        assert_eq!(step.merge_target(), Some("ab"));
    }

    #[test]
    fn test_op_names_cover_every_variant() {
        assert_eq!(Step::OPS.len(), 11);
        assert!(Step::OPS.contains(&"aggregate"));
        assert_eq!(SplitDelimiter::VARIANTS, &[" ", ",", ";", "regex"]);
    }

    #[test]
    fn test_referenced_tables() {
        let spec = PipelineSpec::new()
            .with_step(Step::Join {
                right_ref: "customers".to_owned(),
                how: JoinKind::Left,
                on: BTreeMap::from([("customer_id".to_owned(), "id".to_owned())]),
                select: None,
            })
            .with_step(Step::Sort {
                by: vec![SortKey {
                    col: "id".to_owned(),
                    order: SortOrder::Asc,
                }],
            });
        assert_eq!(spec.referenced_tables(), vec!["customers"]);
    }

    #[test]
    fn test_referenced_tables_are_unique_and_skip_primary() {
        let join = |table: &str| Step::Join {
            right_ref: table.to_owned(),
            how: JoinKind::Inner,
            on: BTreeMap::from([("id".to_owned(), "id".to_owned())]),
            select: None,
        };
        let spec = PipelineSpec::new()
            .with_step(join("b"))
            .with_step(Step::Diff {
                right_ref: "c".to_owned(),
                key: vec!["id".to_owned()],
                scope: DiffScope::All,
            })
            .with_step(join("b"))
            .with_step(join(PRIMARY_DATASET));
        assert_eq!(spec.referenced_tables(), vec!["b", "c"]);
    }
}
