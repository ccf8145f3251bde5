//! Declarative pipeline specs and their two-phase validation.
//!
//! A pipeline is an ordered list of tabular operations over the primary dataset
//! `a`, optionally reading other registered tables through `rightRef`. Nothing
//! here executes a pipeline; this module decides whether one is fit to hand to
//! an execution engine.
//!
//! # Phases
//!
//! 1. [`validate_structure`] turns an untyped JSON document into a
//!    [`PipelineSpec`] or rejects it with field-located errors.
//! 2. [`validate_semantics`] checks every column and table reference of a typed
//!    spec against a caller-supplied [`TableRegistry`].
//!
//! ```
//! use serde_json::json;
//! use tablespec::pipeline::{TableRegistry, validate_semantics, validate_structure};
//!
//! let doc = json!({
//!     "version": "v1",
//!     "dataset": "a",
//!     "steps": [{ "op": "dedupe", "by": ["email"], "keep": "latest" }]
//! });
//! let spec = validate_structure(&doc).expect("well-formed");
//!
//! let registry = TableRegistry::new().with_table("a", ["id", "email"]);
//! assert!(validate_semantics(&spec, &registry).is_empty());
//! ```
//!
//! # Operations
//!
//! `normalize`, `dedupe`, `split`, `merge`, `clean`, `join`, `diff`, `filter`,
//! `sort`, `aggregate` and `select`. See [`Step`] for the shape of each.

pub mod registry;
pub mod spec;
pub mod structure;
pub mod validation;

pub use registry::TableRegistry;
pub use spec::{PRIMARY_DATASET, PipelineMeta, PipelineSpec, SPEC_VERSION, Step};
pub use structure::validate_structure;
pub use validation::{
    ValidationError, ValidationPhase, validate_semantics, validate_semantics_with,
};

use crate::config::ValidatorConfig;
use serde_json::Value;

/// Parse, validate and reference-check a pipeline from untrusted text.
///
/// The text may be plain JSON or JSON wrapped in prose or a fenced block; see
/// [`extract_payload`](crate::extract::extract_payload). Structural errors are
/// returned without running the semantic phase.
pub fn parse_untrusted(
    text: &str,
    registry: &TableRegistry,
    config: &ValidatorConfig,
) -> Result<PipelineSpec, Vec<ValidationError>> {
    let doc = match serde_json::from_str::<Value>(text.trim()) {
        Ok(doc) => doc,
        Err(_) => crate::extract::extract_payload(text).ok_or_else(|| {
            vec![ValidationError::structural(
                None,
                "$",
                "no JSON object could be recovered from the input",
            )]
        })?,
    };

    let spec = validate_structure(&doc)?;
    let errors = validate_semantics_with(&spec, registry, config);
    if errors.is_empty() {
        tracing::info!(steps = spec.steps.len(), "pipeline accepted");
        Ok(spec)
    } else {
        Err(errors)
    }
}
