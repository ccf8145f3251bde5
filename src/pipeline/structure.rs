//! Structural validation: untyped JSON in, typed [`PipelineSpec`] out.
//!
//! Serde stops at the first mismatch and reports it with line/column numbers,
//! which is of little use to someone fixing a pipeline that came out of a form
//! or a model. This module walks the document field by field instead, and
//! reports every problem with a path such as `steps[1].orderBy[0].dir`.
//! Errors are ordered by step, then by field in the order the grammar lists
//! them. Unknown fields are ignored.
//!
//! Only once the walk finds nothing is the document deserialized.

use super::spec::{
    AggregateFn, DateTarget, DedupeFn, FilterOp, JoinKind, KeepPolicy, MoneyTarget,
    PRIMARY_DATASET, PipelineSpec, SPEC_VERSION, SortOrder, SplitDelimiter, Step,
};
use super::validation::ValidationError;
use serde_json::{Map, Value};

/// Validate the shape of an untrusted pipeline document.
///
/// Returns the typed pipeline, or every structural error found. Never both.
pub fn validate_structure(doc: &Value) -> Result<PipelineSpec, Vec<ValidationError>> {
    let mut errors = Vec::new();

    let Some(root) = doc.as_object() else {
        return Err(vec![ValidationError::structural(
            None,
            "$",
            format!("expected a pipeline object, found {}", kind_of(doc)),
        )]);
    };

    {
        let mut fields = Fields::new(root, "$".to_owned(), None, &mut errors);
        fields.literal("version", SPEC_VERSION);
        fields.literal("dataset", PRIMARY_DATASET);
    }

    match root.get("steps") {
        None => errors.push(ValidationError::structural(
            None,
            "steps",
            "missing required field 'steps'",
        )),
        Some(Value::Array(steps)) => {
            for (idx, step) in steps.iter().enumerate() {
                check_step(idx, step, &mut errors);
            }
        }
        Some(other) => errors.push(ValidationError::structural(
            None,
            "steps",
            format!("expected an array of steps, found {}", kind_of(other)),
        )),
    }

    {
        let mut fields = Fields::new(root, "$".to_owned(), None, &mut errors);
        fields.optional_object("meta", |meta| {
            meta.optional_string("title");
            meta.optional_string("notes");
            meta.optional_string("userQuery");
        });
    }

    if !errors.is_empty() {
        tracing::debug!(errors = errors.len(), "pipeline rejected by structural validation");
        return Err(errors);
    }

    serde_json::from_value(doc.clone()).map_err(|e| {
        vec![ValidationError::structural(
            None,
            "$",
            format!("document does not decode as a pipeline: {e}"),
        )]
    })
}

fn check_step(idx: usize, step: &Value, errors: &mut Vec<ValidationError>) {
    let path = format!("steps[{idx}]");
    let Some(obj) = step.as_object() else {
        errors.push(ValidationError::structural(
            Some(idx),
            path,
            format!("expected a step object, found {}", kind_of(step)),
        ));
        return;
    };

    let op = match obj.get("op") {
        None => {
            errors.push(ValidationError::structural(
                Some(idx),
                format!("{path}.op"),
                "missing required field 'op'",
            ));
            return;
        }
        Some(Value::String(op)) => op.as_str(),
        Some(other) => {
            errors.push(ValidationError::structural(
                Some(idx),
                format!("{path}.op"),
                format!("expected an operation name, found {}", kind_of(other)),
            ));
            return;
        }
    };

    let mut f = Fields::new(obj, path, Some(idx), errors);
    match op {
        "normalize" => {
            f.optional_object_list("dates", |d| {
                d.required_string("col");
                d.required_enum("to", DateTarget::VARIANTS);
            });
            f.optional_object_list("money", |m| {
                m.required_string("col");
                m.required_enum("keep", MoneyTarget::VARIANTS);
            });
        }
        "dedupe" => {
            f.required_string_list("by", 1);
            f.required_enum("keep", KeepPolicy::VARIANTS);
            f.optional_object_list("orderBy", |o| {
                o.required_string("col");
                o.required_enum("dir", SortOrder::VARIANTS);
            });
            f.optional_record("aggs", |a| {
                a.optional_string("col");
                a.required_enum("fn", DedupeFn::VARIANTS);
            });
        }
        "split" => {
            f.required_string("column");
            f.required_enum("by", SplitDelimiter::VARIANTS);
            f.required_string_list("into", 0);
            f.optional_string("pattern");
            if let Some(Value::String(pattern)) = obj.get("pattern")
                && let Err(e) = regex::Regex::new(pattern)
            {
                f.error("pattern", format!("invalid regex pattern: {e}"));
            }
        }
        "merge" => {
            f.required_string_list("columns", 2);
            let has_into = f.optional_string("into");
            let has_new_column = f.optional_string("newColumn");
            f.optional_string("separator");
            f.optional_bool("keepOriginal");
            if !has_into && !has_new_column {
                f.error("into", "merge needs a target column: set 'into' or 'newColumn'");
            }
        }
        "clean" => {
            f.optional_string_list("trims");
            f.optional_string_list("normalizeSpace");
            f.optional_object_list("replace", |r| {
                r.required_string("col");
                r.required_string("from");
                r.required_string("to");
            });
        }
        "join" => {
            f.required_string("rightRef");
            f.required_enum("how", JoinKind::VARIANTS);
            f.required_string_map("on");
            f.optional_string_list("select");
        }
        "diff" => {
            f.required_string("rightRef");
            f.required_string_list("key", 0);
            f.required_scope("scope");
        }
        "filter" => {
            f.required_object_list("conditions", |c| {
                c.required_string("col");
                c.required_enum("op", FilterOp::VARIANTS);
                c.optional_scalar("value");
            });
        }
        "sort" => {
            f.required_object_list("by", |k| {
                k.required_string("col");
                k.required_enum("order", SortOrder::VARIANTS);
            });
        }
        "aggregate" => {
            f.required_string_list("groupBy", 0);
            f.required_record("aggs", |a| {
                a.required_enum("fn", AggregateFn::VARIANTS);
                a.optional_string("col");
            });
        }
        "select" => {
            f.required_string_list("columns", 0);
            f.optional_bool("exclude");
        }
        unknown => {
            f.error(
                "op",
                format!(
                    "unknown operation '{unknown}'; expected one of {}",
                    Step::OPS.join(", ")
                ),
            );
        }
    }
}

/// Field checker over one JSON object, accumulating errors under `path`.
struct Fields<'a> {
    obj: &'a Map<String, Value>,
    path: String,
    step: Option<usize>,
    errors: &'a mut Vec<ValidationError>,
}

impl<'a> Fields<'a> {
    fn new(
        obj: &'a Map<String, Value>,
        path: String,
        step: Option<usize>,
        errors: &'a mut Vec<ValidationError>,
    ) -> Self {
        Self {
            obj,
            path,
            step,
            errors,
        }
    }

    fn field_path(&self, name: &str) -> String {
        if self.path == "$" {
            name.to_owned()
        } else {
            format!("{}.{name}", self.path)
        }
    }

    fn error(&mut self, name: &str, message: impl Into<String>) {
        let path = self.field_path(name);
        self.errors
            .push(ValidationError::structural(self.step, path, message));
    }

    fn missing(&mut self, name: &str) {
        self.error(name, format!("missing required field '{name}'"));
    }

    fn wrong_type(&mut self, name: &str, expected: &str, found: &Value) {
        self.error(name, format!("expected {expected}, found {}", kind_of(found)));
    }

    /// Run `check` against a nested object at `path`.
    fn nested(&mut self, path: String, value: &Value, check: &impl Fn(&mut Fields<'_>)) {
        match value.as_object() {
            Some(obj) => {
                let mut inner = Fields::new(obj, path, self.step, self.errors);
                check(&mut inner);
            }
            None => self.errors.push(ValidationError::structural(
                self.step,
                path,
                format!("expected an object, found {}", kind_of(value)),
            )),
        }
    }

    fn literal(&mut self, name: &str, expected: &str) {
        match self.obj.get(name) {
            None => self.missing(name),
            Some(Value::String(s)) if s == expected => {}
            Some(Value::String(s)) => {
                self.error(name, format!("expected \"{expected}\", found \"{s}\""));
            }
            Some(other) => self.wrong_type(name, &format!("\"{expected}\""), other),
        }
    }

    fn required_string(&mut self, name: &str) {
        match self.obj.get(name) {
            None => self.missing(name),
            Some(Value::String(_)) => {}
            Some(other) => self.wrong_type(name, "a string", other),
        }
    }

    /// Returns whether the field is present (and well-typed or not).
    fn optional_string(&mut self, name: &str) -> bool {
        match self.obj.get(name) {
            None => false,
            Some(Value::String(_)) => true,
            Some(other) => {
                self.wrong_type(name, "a string", other);
                true
            }
        }
    }

    fn optional_bool(&mut self, name: &str) {
        match self.obj.get(name) {
            None | Some(Value::Bool(_)) => {}
            Some(other) => self.wrong_type(name, "a boolean", other),
        }
    }

    fn optional_scalar(&mut self, name: &str) {
        match self.obj.get(name) {
            None
            | Some(Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_)) => {}
            Some(other) => self.wrong_type(name, "a string, number or boolean", other),
        }
    }

    fn required_enum(&mut self, name: &str, variants: &[&str]) {
        match self.obj.get(name) {
            None => self.missing(name),
            Some(Value::String(s)) if variants.contains(&s.as_str()) => {}
            Some(Value::String(s)) => {
                let expected = variants
                    .iter()
                    .map(|v| format!("\"{v}\""))
                    .collect::<Vec<_>>()
                    .join(", ");
                self.error(name, format!("invalid value \"{s}\"; expected one of {expected}"));
            }
            Some(other) => self.wrong_type(name, "a string", other),
        }
    }

    fn string_list(&mut self, name: &str, value: &Value, min: usize) {
        let Some(items) = value.as_array() else {
            self.wrong_type(name, "an array of strings", value);
            return;
        };
        if items.len() < min {
            let noun = if min == 1 { "entry" } else { "entries" };
            self.error(
                name,
                format!("needs at least {min} {noun}, found {}", items.len()),
            );
        }
        for (i, item) in items.iter().enumerate() {
            if !item.is_string() {
                let message = format!("expected a string, found {}", kind_of(item));
                self.error(&format!("{name}[{i}]"), message);
            }
        }
    }

    fn required_string_list(&mut self, name: &str, min: usize) {
        match self.obj.get(name) {
            None => self.missing(name),
            Some(value) => self.string_list(name, value, min),
        }
    }

    fn optional_string_list(&mut self, name: &str) {
        if let Some(value) = self.obj.get(name) {
            self.string_list(name, value, 0);
        }
    }

    fn object_list(&mut self, name: &str, value: &Value, check: impl Fn(&mut Fields<'_>)) {
        let Some(items) = value.as_array() else {
            self.wrong_type(name, "an array of objects", value);
            return;
        };
        for (i, item) in items.iter().enumerate() {
            let path = self.field_path(&format!("{name}[{i}]"));
            self.nested(path, item, &check);
        }
    }

    fn required_object_list(&mut self, name: &str, check: impl Fn(&mut Fields<'_>)) {
        match self.obj.get(name) {
            None => self.missing(name),
            Some(value) => self.object_list(name, value, check),
        }
    }

    fn optional_object_list(&mut self, name: &str, check: impl Fn(&mut Fields<'_>)) {
        if let Some(value) = self.obj.get(name) {
            self.object_list(name, value, check);
        }
    }

    fn optional_object(&mut self, name: &str, check: impl Fn(&mut Fields<'_>)) {
        if let Some(value) = self.obj.get(name) {
            let path = self.field_path(name);
            self.nested(path, value, &check);
        }
    }

    /// An object whose values all have the same shape, keyed by output name.
    fn record(&mut self, name: &str, value: &Value, check: impl Fn(&mut Fields<'_>)) {
        let Some(entries) = value.as_object() else {
            self.wrong_type(name, "an object", value);
            return;
        };
        for (key, entry) in entries {
            let path = self.field_path(&format!("{name}.{key}"));
            self.nested(path, entry, &check);
        }
    }

    fn required_record(&mut self, name: &str, check: impl Fn(&mut Fields<'_>)) {
        match self.obj.get(name) {
            None => self.missing(name),
            Some(value) => self.record(name, value, check),
        }
    }

    fn optional_record(&mut self, name: &str, check: impl Fn(&mut Fields<'_>)) {
        if let Some(value) = self.obj.get(name) {
            self.record(name, value, check);
        }
    }

    fn required_string_map(&mut self, name: &str) {
        let Some(value) = self.obj.get(name) else {
            self.missing(name);
            return;
        };
        let Some(entries) = value.as_object() else {
            self.wrong_type(name, "an object of column pairs", value);
            return;
        };
        for (key, entry) in entries {
            if !entry.is_string() {
                let message = format!("expected a column name, found {}", kind_of(entry));
                self.error(&format!("{name}.{key}"), message);
            }
        }
    }

    /// `"all"` or a list of column names.
    fn required_scope(&mut self, name: &str) {
        match self.obj.get(name) {
            None => self.missing(name),
            Some(Value::String(s)) if s == "all" => {}
            Some(Value::String(s)) => {
                self.error(name, format!("expected \"all\" or a list of columns, found \"{s}\""));
            }
            Some(value @ Value::Array(_)) => self.string_list(name, value, 0),
            Some(other) => self.wrong_type(name, "\"all\" or a list of columns", other),
        }
    }
}

/// Article-prefixed JSON type name for error messages.
pub(crate) fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
