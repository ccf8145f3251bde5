//! Pipeline validation errors and the semantic (referential) validator.
//!
//! Semantic validation runs on a structurally valid [`PipelineSpec`] and checks
//! that every column and table it names exists in the caller's
//! [`TableRegistry`]. All problems are collected; nothing short-circuits.
//!
//! By default every step is checked against the primary table's *initial*
//! columns, so a column created by an earlier `split` or `merge` is reported as
//! unknown when a later step uses it. [`SchemaTracking::Evolving`] threads the
//! column set through the steps instead.

use super::registry::TableRegistry;
use super::spec::{PipelineSpec, Step};
use crate::config::{SchemaTracking, ValidatorConfig};
use serde::Serialize;
use std::collections::BTreeSet;

/// Which validation phase produced an error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationPhase {
    /// The document does not have the shape of a pipeline
    Structural,
    /// The pipeline names a table or column the registry does not have
    Semantic,
}

/// Validation error with the location it refers to
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationError {
    pub phase: ValidationPhase,
    pub step_index: Option<usize>,
    /// Location in the document, e.g. `steps[2].orderBy[0].col`
    pub path: String,
    pub message: String,
}

impl ValidationError {
    pub(crate) fn structural(
        step_index: Option<usize>,
        path: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            phase: ValidationPhase::Structural,
            step_index,
            path: path.into(),
            message: message.into(),
        }
    }

    pub(crate) fn semantic(
        step_index: usize,
        path: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            phase: ValidationPhase::Semantic,
            step_index: Some(step_index),
            path: path.into(),
            message: message.into(),
        }
    }

    fn registry(message: impl Into<String>) -> Self {
        Self {
            phase: ValidationPhase::Semantic,
            step_index: None,
            path: "$".to_owned(),
            message: message.into(),
        }
    }

    pub fn is_structural(&self) -> bool {
        self.phase == ValidationPhase::Structural
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// Check every table and column reference against the registry using the
/// default (schema-static) settings.
pub fn validate_semantics(spec: &PipelineSpec, registry: &TableRegistry) -> Vec<ValidationError> {
    validate_semantics_with(spec, registry, &ValidatorConfig::default())
}

/// Check every table and column reference against the registry.
pub fn validate_semantics_with(
    spec: &PipelineSpec,
    registry: &TableRegistry,
    config: &ValidatorConfig,
) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let primary = config.primary_table.as_str();

    let mut columns: BTreeSet<String> = match registry.columns(primary) {
        Some(cols) => cols.iter().cloned().collect(),
        None => {
            errors.push(ValidationError::registry(format!(
                "primary table '{primary}' is not in the table registry"
            )));
            BTreeSet::new()
        }
    };

    for (idx, step) in spec.steps.iter().enumerate() {
        let mut check = StepCheck {
            idx,
            op: step.op_name(),
            primary,
            columns: &columns,
            registry,
            errors: &mut errors,
        };
        check.step(step, config);

        if config.schema_tracking == SchemaTracking::Evolving {
            evolve_columns(step, &mut columns, registry);
        }
    }

    tracing::debug!(
        steps = spec.steps.len(),
        errors = errors.len(),
        "semantic validation finished"
    );
    errors
}

/// Reference checks for a single step
struct StepCheck<'a> {
    idx: usize,
    op: &'static str,
    primary: &'a str,
    columns: &'a BTreeSet<String>,
    registry: &'a TableRegistry,
    errors: &'a mut Vec<ValidationError>,
}

impl<'a> StepCheck<'a> {
    fn step(&mut self, step: &Step, config: &ValidatorConfig) {
        match step {
            Step::Dedupe { by, order_by, .. } => {
                for (i, col) in by.iter().enumerate() {
                    self.primary_column(col, format!("by[{i}]"));
                }
                for (i, key) in order_by.iter().enumerate() {
                    self.primary_column(&key.col, format!("orderBy[{i}].col"));
                }
            }

            Step::Join { right_ref, on, .. } => {
                let right = self.right_table(right_ref);
                for (left_col, right_col) in on {
                    self.primary_column(left_col, format!("on.{left_col}"));
                    if let Some(right_cols) = right {
                        self.table_column(right_ref, right_cols, right_col, format!("on.{left_col}"));
                    }
                }
            }

            Step::Diff { right_ref, key, .. } => {
                let right = self.right_table(right_ref);
                for (i, col) in key.iter().enumerate() {
                    self.primary_column(col, format!("key[{i}]"));
                    if let Some(right_cols) = right {
                        self.table_column(right_ref, right_cols, col, format!("key[{i}]"));
                    }
                }
            }

            Step::Filter { conditions } => {
                for (i, cond) in conditions.iter().enumerate() {
                    self.primary_column(&cond.col, format!("conditions[{i}].col"));
                    if config.require_filter_value && cond.op.takes_value() && cond.value.is_none()
                    {
                        self.push(
                            format!("conditions[{i}].value"),
                            format!(
                                "{} condition on '{}' uses '{}' but has no value",
                                self.op, cond.col, cond.op
                            ),
                        );
                    }
                }
            }

            Step::Sort { by } => {
                for (i, key) in by.iter().enumerate() {
                    self.primary_column(&key.col, format!("by[{i}].col"));
                }
            }

            Step::Split { column, .. } => self.primary_column(column, "column".to_owned()),

            Step::Normalize { dates, money } => {
                for (i, date) in dates.iter().enumerate() {
                    self.primary_column(&date.col, format!("dates[{i}].col"));
                }
                for (i, amount) in money.iter().enumerate() {
                    self.primary_column(&amount.col, format!("money[{i}].col"));
                }
            }

            // Shape-only at this layer.
            Step::Merge { .. } | Step::Clean { .. } | Step::Aggregate { .. } | Step::Select { .. } => {}
        }
    }

    fn push(&mut self, field: String, message: String) {
        self.errors.push(ValidationError::semantic(
            self.idx,
            format!("steps[{}].{field}", self.idx),
            message,
        ));
    }

    fn primary_column(&mut self, col: &str, field: String) {
        if !self.columns.contains(col) {
            let message = format!(
                "{} step {} references unknown column '{col}' in table '{}'",
                self.op, self.idx, self.primary
            );
            self.push(field, message);
        }
    }

    fn table_column(&mut self, table: &str, table_cols: &[String], col: &str, field: String) {
        if !table_cols.iter().any(|c| c == col) {
            let message = format!(
                "{} step {} references unknown column '{col}' in table '{table}'",
                self.op, self.idx
            );
            self.push(field, message);
        }
    }

    fn right_table(&mut self, right_ref: &str) -> Option<&'a [String]> {
        let registry: &'a TableRegistry = self.registry;
        let columns = registry.columns(right_ref);
        if columns.is_none() {
            let message = format!(
                "{} step {} references unknown table '{right_ref}'",
                self.op, self.idx
            );
            self.push("rightRef".to_owned(), message);
        }
        columns
    }
}

/// Apply a step's effect on the visible column set.
fn evolve_columns(step: &Step, columns: &mut BTreeSet<String>, registry: &TableRegistry) {
    match step {
        Step::Split { into, .. } => columns.extend(into.iter().cloned()),

        Step::Merge {
            columns: sources,
            keep_original,
            ..
        } => {
            if *keep_original == Some(false) {
                for source in sources {
                    columns.remove(source);
                }
            }
            if let Some(target) = step.merge_target() {
                columns.insert(target.to_owned());
            }
        }

        Step::Select {
            columns: listed,
            exclude,
        } => {
            if exclude.unwrap_or(false) {
                for col in listed {
                    columns.remove(col);
                }
            } else {
                columns.retain(|col| listed.contains(col));
            }
        }

        Step::Join {
            right_ref,
            on,
            select,
            ..
        } => {
            if let Some(right_cols) = registry.columns(right_ref) {
                match select {
                    Some(selected) => columns.extend(selected.iter().cloned()),
                    None => columns.extend(
                        right_cols
                            .iter()
                            .filter(|c| !on.values().any(|key| key == *c))
                            .cloned(),
                    ),
                }
            }
        }

        Step::Aggregate { group_by, aggs } => {
            *columns = group_by.iter().chain(aggs.keys()).cloned().collect();
        }

        Step::Dedupe { aggs, .. } => columns.extend(aggs.keys().cloned()),

        // Diff reports differences; it does not reshape the primary table.
        Step::Diff { .. }
        | Step::Normalize { .. }
        | Step::Clean { .. }
        | Step::Filter { .. }
        | Step::Sort { .. } => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::spec::{
        Condition, DateNormalization, DateTarget, DedupeOrder, DiffScope, FilterOp, JoinKind,
        KeepPolicy, MoneyNormalization, MoneyTarget, SortKey, SortOrder, SplitDelimiter,
    };
    use std::collections::BTreeMap;

    fn registry() -> TableRegistry {
        TableRegistry::new()
            .with_table("a", ["id", "name", "email", "signup_date", "amount"])
            .with_table("b", ["customer_id", "segment"])
    }

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| (*s).to_owned()).collect()
    }

    #[test]
    fn test_valid_pipeline_has_no_errors() {
        let spec = PipelineSpec::new()
            .with_step(Step::Dedupe {
                by: strings(&["email"]),
                keep: KeepPolicy::Latest,
                order_by: vec![DedupeOrder {
                    col: "signup_date".to_owned(),
                    dir: SortOrder::Desc,
                }],
                aggs: BTreeMap::new(),
            })
            .with_step(Step::Join {
                right_ref: "b".to_owned(),
                how: JoinKind::Left,
                on: BTreeMap::from([("id".to_owned(), "customer_id".to_owned())]),
                select: None,
            })
            .with_step(Step::Normalize {
                dates: vec![DateNormalization {
                    col: "signup_date".to_owned(),
                    to: DateTarget::IsoDate,
                }],
                money: vec![],
            });

        assert!(validate_semantics(&spec, &registry()).is_empty());
    }

    #[test]
    fn test_dedupe_and_normalize_columns_are_checked() {
        let spec = PipelineSpec::new()
            .with_step(Step::Dedupe {
                by: strings(&["ghost_key"]),
                keep: KeepPolicy::Latest,
                order_by: vec![DedupeOrder {
                    col: "ghost_order".to_owned(),
                    dir: SortOrder::Desc,
                }],
                aggs: BTreeMap::new(),
            })
            .with_step(Step::Normalize {
                dates: vec![DateNormalization {
                    col: "ghost_date".to_owned(),
                    to: DateTarget::IsoDate,
                }],
                money: vec![MoneyNormalization {
                    col: "ghost_money".to_owned(),
                    keep: MoneyTarget::Number,
                }],
            });

        let errors = validate_semantics(&spec, &registry());
        let located: Vec<(&str, &str)> = errors
            .iter()
            .map(|e| (e.path.as_str(), e.message.as_str()))
            .collect();
        assert_eq!(
            located,
            [
                (
                    "steps[0].by[0]",
                    "dedupe step 0 references unknown column 'ghost_key' in table 'a'"
                ),
                (
                    "steps[0].orderBy[0].col",
                    "dedupe step 0 references unknown column 'ghost_order' in table 'a'"
                ),
                (
                    "steps[1].dates[0].col",
                    "normalize step 1 references unknown column 'ghost_date' in table 'a'"
                ),
                (
                    "steps[1].money[0].col",
                    "normalize step 1 references unknown column 'ghost_money' in table 'a'"
                ),
            ]
        );
    }

    #[test]
    fn test_unknown_columns_are_all_reported() {
        let spec = PipelineSpec::new()
            .with_step(Step::Sort {
                by: vec![
                    SortKey {
                        col: "missing_one".to_owned(),
                        order: SortOrder::Asc,
                    },
                    SortKey {
                        col: "name".to_owned(),
                        order: SortOrder::Asc,
                    },
                ],
            })
            .with_step(Step::Filter {
                conditions: vec![Condition {
                    col: "missing_two".to_owned(),
                    op: FilterOp::Eq,
                    value: Some(serde_json::json!("x")),
                }],
            });

        let errors = validate_semantics(&spec, &registry());
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].step_index, Some(0));
        assert_eq!(errors[0].path, "steps[0].by[0].col");
        assert!(errors[0].message.contains("'missing_one'"));
        assert!(errors[0].message.contains("sort"));
        assert_eq!(errors[1].path, "steps[1].conditions[0].col");
        assert!(errors[1].message.contains("'missing_two'"));
        assert!(errors.iter().all(|e| !e.is_structural()));
    }

    #[test]
    fn test_join_unknown_table_and_keys() {
        let spec = PipelineSpec::new()
            .with_step(Step::Join {
                right_ref: "nope".to_owned(),
                how: JoinKind::Inner,
                on: BTreeMap::from([("id".to_owned(), "id".to_owned())]),
                select: None,
            })
            .with_step(Step::Join {
                right_ref: "b".to_owned(),
                how: JoinKind::Inner,
                on: BTreeMap::from([("cust".to_owned(), "cust_id".to_owned())]),
                select: None,
            });

        let errors = validate_semantics(&spec, &registry());
        let messages: Vec<&str> = errors.iter().map(|e| e.message.as_str()).collect();
        assert_eq!(errors.len(), 3, "{messages:?}");
        assert!(messages[0].contains("unknown table 'nope'"));
        assert!(messages[1].contains("'cust' in table 'a'"));
        assert!(messages[2].contains("'cust_id' in table 'b'"));
    }

    #[test]
    fn test_diff_keys_checked_on_both_sides() {
        let spec = PipelineSpec::new().with_step(Step::Diff {
            right_ref: "b".to_owned(),
            key: strings(&["id"]),
            scope: DiffScope::All,
        });

        let errors = validate_semantics(&spec, &registry());
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("'id' in table 'b'"));
    }

    #[test]
    fn test_static_schema_rejects_column_from_earlier_step() {
        let spec = PipelineSpec::new()
            .with_step(Step::Split {
                column: "name".to_owned(),
                by: SplitDelimiter::Space,
                into: strings(&["first", "last"]),
                pattern: None,
            })
            .with_step(Step::Sort {
                by: vec![SortKey {
                    col: "last".to_owned(),
                    order: SortOrder::Asc,
                }],
            });

        let errors = validate_semantics(&spec, &registry());
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("'last'"));

        let evolving = ValidatorConfig {
            schema_tracking: SchemaTracking::Evolving,
            ..ValidatorConfig::default()
        };
        assert!(validate_semantics_with(&spec, &registry(), &evolving).is_empty());
    }

    #[test]
    fn test_evolving_schema_drops_unselected_columns() {
        let spec = PipelineSpec::new()
            .with_step(Step::Select {
                columns: strings(&["id"]),
                exclude: None,
            })
            .with_step(Step::Split {
                column: "name".to_owned(),
                by: SplitDelimiter::Comma,
                into: strings(&["x", "y"]),
                pattern: None,
            });

        let evolving = ValidatorConfig {
            schema_tracking: SchemaTracking::Evolving,
            ..ValidatorConfig::default()
        };
        let errors = validate_semantics_with(&spec, &registry(), &evolving);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].path, "steps[1].column");

        assert!(validate_semantics(&spec, &registry()).is_empty());
    }

    #[test]
    fn test_missing_primary_table() {
        let spec = PipelineSpec::new().with_step(Step::Split {
            column: "name".to_owned(),
            by: SplitDelimiter::Comma,
            into: strings(&["x"]),
            pattern: None,
        });
        let errors = validate_semantics(&spec, &TableRegistry::new().with_table("b", ["id"]));
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].step_index, None);
        assert!(errors[0].message.contains("primary table 'a'"));
    }

    #[test]
    fn test_filter_value_requirement_is_opt_in() {
        let spec = PipelineSpec::new().with_step(Step::Filter {
            conditions: vec![
                Condition {
                    col: "amount".to_owned(),
                    op: FilterOp::Gt,
                    value: None,
                },
                Condition {
                    col: "email".to_owned(),
                    op: FilterOp::IsNull,
                    value: None,
                },
            ],
        });

        assert!(validate_semantics(&spec, &registry()).is_empty());

        let strict = ValidatorConfig {
            require_filter_value: true,
            ..ValidatorConfig::default()
        };
        let errors = validate_semantics_with(&spec, &registry(), &strict);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].path, "steps[0].conditions[0].value");
    }

    #[test]
    fn test_validation_is_repeatable() {
        let spec = PipelineSpec::new().with_step(Step::Sort {
            by: vec![SortKey {
                col: "ghost".to_owned(),
                order: SortOrder::Desc,
            }],
        });
        let reg = registry();
        assert_eq!(validate_semantics(&spec, &reg), validate_semantics(&spec, &reg));
    }
}
