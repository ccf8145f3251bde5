//! Integration tests for pipeline validation
//!
//! These tests load the pipeline fixtures under `testdata/` and run them
//! through structural and semantic validation end to end.

use serde_json::{Value, json};
use std::path::PathBuf;
use tablespec::config::{SchemaTracking, ValidatorConfig};
use tablespec::error::TablespecError;
use tablespec::pipeline::{
    PipelineSpec, Step, TableRegistry, ValidationPhase, parse_untrusted, validate_semantics,
    validate_semantics_with, validate_structure,
};

fn fixture(name: &str) -> String {
    let path = PathBuf::from("testdata").join(name);
    std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("failed to read fixture {}: {e}", path.display()))
}

fn registry() -> TableRegistry {
    serde_json::from_str(&fixture("tables.json")).expect("tables.json should parse")
}

#[test]
fn test_orders_pipeline_is_accepted() {
    let spec = PipelineSpec::from_file("testdata/orders_pipeline.json")
        .expect("orders pipeline should be well-formed");

    assert_eq!(spec.steps.len(), 7, "Should keep all 7 steps");
    let ops: Vec<&str> = spec.steps.iter().map(Step::op_name).collect();
    assert_eq!(
        ops,
        ["clean", "normalize", "dedupe", "join", "filter", "sort", "select"],
        "Step order must be preserved"
    );
    assert_eq!(spec.referenced_tables(), ["customers"]);
    assert_eq!(
        spec.meta.as_ref().and_then(|m| m.title.as_deref()),
        Some("Monthly order cleanup")
    );

    let errors = validate_semantics(&spec, &registry());
    assert!(errors.is_empty(), "Unexpected semantic errors: {errors:?}");
}

#[test]
fn test_orders_pipeline_round_trips_through_json() {
    let spec = PipelineSpec::from_file("testdata/orders_pipeline.json").expect("well-formed");
    let json = spec.to_json().expect("serialize");
    let reparsed = PipelineSpec::from_json(&json).expect("serialized spec should re-validate");
    assert_eq!(spec, reparsed);
}

#[test]
fn test_broken_pipeline_reports_every_structural_error() {
    let doc: Value = serde_json::from_str(&fixture("broken_pipeline.json")).expect("valid JSON");
    let errors = validate_structure(&doc).expect_err("broken pipeline must be rejected");

    let paths: Vec<&str> = errors.iter().map(|e| e.path.as_str()).collect();
    assert_eq!(
        paths,
        [
            "version",
            "steps[0].op",
            "steps[1].by",
            "steps[1].keep",
            "steps[2].into",
            "steps[3].op"
        ],
        "Errors should be ordered by step then field: {errors:?}"
    );
    assert!(errors.iter().all(|e| e.phase == ValidationPhase::Structural));
    assert_eq!(errors[1].step_index, Some(0), "Missing op must name its step");
    assert!(errors[5].message.contains("pivot"));
}

#[test]
fn test_from_file_renders_structural_errors() {
    let err = PipelineSpec::from_file("testdata/broken_pipeline.json")
        .expect_err("broken pipeline must be rejected");
    match err {
        TablespecError::Input(message) => {
            assert_eq!(message.lines().count(), 6, "One line per error: {message}");
        }
        other => panic!("expected an input error, got {other:?}"),
    }
}

#[test]
fn test_model_output_is_recovered_and_validated() {
    let spec = parse_untrusted(
        &fixture("model_output.txt"),
        &registry(),
        &ValidatorConfig::default(),
    )
    .expect("pipeline embedded in prose should validate");

    assert_eq!(spec.steps.len(), 2);
    assert_eq!(spec.referenced_tables(), ["last_month"]);
}

#[test]
fn test_semantic_errors_are_exhaustive() {
    let doc = json!({
        "version": "v1",
        "dataset": "a",
        "steps": [
            { "op": "sort", "by": [{ "col": "created", "order": "asc" }] },
            { "op": "join", "rightRef": "suppliers", "how": "inner", "on": { "supplier_id": "id" } },
            { "op": "diff", "rightRef": "last_month", "key": ["email"], "scope": "all" }
        ]
    });
    let spec = validate_structure(&doc).expect("well-formed");
    let errors = validate_semantics(&spec, &registry());

    let messages: Vec<&str> = errors.iter().map(|e| e.message.as_str()).collect();
    assert_eq!(
        messages,
        [
            "sort step 0 references unknown column 'created' in table 'a'",
            "join step 1 references unknown table 'suppliers'",
            "join step 1 references unknown column 'supplier_id' in table 'a'",
            "diff step 2 references unknown column 'email' in table 'last_month'",
        ]
    );
    assert!(errors.iter().all(|e| e.phase == ValidationPhase::Semantic));
}

#[test]
fn test_evolving_schema_accepts_derived_columns() {
    let doc = json!({
        "version": "v1",
        "dataset": "a",
        "steps": [
            { "op": "split", "column": "customer_name", "by": " ", "into": ["first", "last"] },
            { "op": "sort", "by": [{ "col": "last", "order": "asc" }] }
        ]
    });
    let spec = validate_structure(&doc).expect("well-formed");

    let static_errors = validate_semantics(&spec, &registry());
    assert_eq!(static_errors.len(), 1, "Static mode only knows the source columns");
    assert_eq!(static_errors[0].path, "steps[1].by[0].col");

    let evolving = ValidatorConfig {
        schema_tracking: SchemaTracking::Evolving,
        ..ValidatorConfig::default()
    };
    let errors = validate_semantics_with(&spec, &registry(), &evolving);
    assert!(errors.is_empty(), "Split outputs should be visible later: {errors:?}");
}

#[test]
fn test_validation_is_idempotent() {
    let doc: Value = serde_json::from_str(&fixture("orders_pipeline.json")).expect("valid JSON");
    let first = validate_structure(&doc).expect("well-formed");
    let second = validate_structure(&doc).expect("well-formed");
    assert_eq!(first, second);

    let broken = json!({ "version": "v1", "dataset": "a", "steps": [{ "op": "sort" }] });
    assert_eq!(validate_structure(&broken), validate_structure(&broken));
}
