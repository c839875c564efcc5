//! Parameter schema data model.
//!
//! This module provides the structures that describe configurable
//! parameters and the loading of definition documents:
//!
//! - Definition parsing (JSON, YAML, TOML) and structural checks
//! - The checked, immutable schema tree
//! - Mutually exclusive sub-parameter key-sets
//!
//! ## Architecture
//!
//! - [`schema`] - Raw definition format and [`SchemaError`]
//! - [`types`] - Widgets, constraint records, conditions
//! - [`param`] - Checked schema nodes
//! - [`oneof`] - Alternative key-sets (`subParameterGroupOption`)
//! - [`tree`] - The schema forest and path lookup

/// Checked schema nodes.
pub mod param;

/// Alternative key-sets over sub-parameters.
pub mod oneof;

/// Definition document format and load errors.
pub mod schema;

/// The schema forest.
pub mod tree;

/// Widget, constraint and condition types.
pub mod types;

pub use oneof::{Alternative, GroupOptions, Selection};
pub use param::ParameterNode;
pub use schema::{
    DefinitionFormat, ParameterDefinition, SchemaError, SubParameterGroupOption,
    definition_json_schema,
};
pub use tree::SchemaTree;
pub use types::{
    Condition, ConditionAction, ConditionOp, OptionItem, Style, UiType, Validate, ValueShape,
    values_equal,
};
