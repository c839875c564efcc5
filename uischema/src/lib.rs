//! # uischema
//!
//! Declarative UI parameter schemas for configurable workloads.
//!
//! A schema is an ordered forest of parameters: fields with widget hints,
//! constraints, defaults, nested sub-parameters and mutually exclusive
//! input shapes. One immutable [`SchemaTree`] drives two independent,
//! side-effect-free consumers:
//!
//! - [`ValidationEngine`] checks a configuration document and returns every
//!   [`Violation`] at once
//! - [`RenderModel`] derives an ordered, grouped form description
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use uischema::{DefinitionFormat, SchemaTree, ValidateOptions, Value};
//!
//! let tree = SchemaTree::parse(
//!     r#"
//! - jsonKey: image
//!   label: Container Image
//!   sort: 1
//!   uiType: ImageInput
//!   validate:
//!     required: true
//! "#,
//!     DefinitionFormat::Yaml,
//! )
//! .unwrap();
//!
//! let doc: Value = serde_json::json!({ "image": "nginx:latest" });
//! let violations = uischema::validate(&tree, &doc, &ValidateOptions::default());
//! assert!(violations.is_empty());
//!
//! let form = uischema::render(&tree, Some(&doc));
//! assert_eq!(form.keys(), vec!["image"]);
//! ```
//!
//! ## Modules
//!
//! - [`data`] - Schema definitions, loading and the checked tree
//! - [`path`] - Dotted/indexed field paths
//! - [`validate`] - Document validation
//! - [`render`] - Form presentation model

/// Schema definitions, loading and the checked tree.
pub mod data;

/// Field paths through schemas and documents.
pub mod path;

/// Form presentation model.
pub mod render;

/// Document validation.
pub mod validate;

pub use data::{
    DefinitionFormat, GroupOptions, ParameterDefinition, ParameterNode, SchemaError, SchemaTree,
    Selection, UiType, definition_json_schema,
};
pub use path::{FieldPath, PathError};
pub use render::{
    ChoiceEntry, ChoiceSelector, RenderField, RenderGroup, RenderModel, ValueSource, render,
};
pub use serde_json::Value;
pub use validate::{
    ValidateOptions, ValidationEngine, ValidationMode, Violation, ViolationKind, Violations,
    validate, validate_update,
};
