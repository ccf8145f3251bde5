//! # tablespec
//!
//! A declarative format for tabular data pipelines, the checks that decide
//! whether a pipeline may run, and a column profiler that feeds suggestions back
//! to whoever writes pipelines.
//!
//! ## Quick Start
//!
//! ```
//! use serde_json::json;
//! use tablespec::pipeline::{TableRegistry, validate_semantics, validate_structure};
//!
//! let doc = json!({
//!     "version": "v1",
//!     "dataset": "a",
//!     "steps": [
//!         { "op": "join", "rightRef": "customers", "how": "left", "on": { "customer_id": "id" } },
//!         { "op": "sort", "by": [{ "col": "total", "order": "desc" }] }
//!     ]
//! });
//!
//! let spec = validate_structure(&doc).expect("well-formed pipeline");
//! let registry = TableRegistry::new()
//!     .with_table("a", ["order_id", "customer_id", "total"])
//!     .with_table("customers", ["id", "name"]);
//! assert!(validate_semantics(&spec, &registry).is_empty());
//! ```
//!
//! ## Core Modules
//!
//! - [`pipeline`]: pipeline spec types, structural and semantic validation
//! - [`patterns`]: column type and format detection with data-quality suggestions
//! - [`extract`]: recovery of a JSON object from free-form text
//! - [`config`]: detector thresholds, validator options, logging settings
//! - [`error`]: error types and handling utilities
//! - [`logging`]: subscriber setup for binaries
//!
//! Nothing in this crate executes a pipeline. Validation and detection are pure
//! functions over borrowed inputs and can run concurrently from any thread.

pub mod config;
pub mod error;
pub mod extract;
pub mod logging;
pub mod patterns;
pub mod pipeline;
