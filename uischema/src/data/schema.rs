use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::data::types::{Condition, Style, Validate};

/// Errors that make a schema definition unusable.
///
/// Structural variants carry the dotted path of the offending node.
#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("parameter at '{path}' has an empty jsonKey")]
    EmptyKey { path: String },

    #[error("duplicate jsonKey '{key}' under '{path}'")]
    DuplicateKey { path: String, key: String },

    #[error("group option '{label}' at '{path}' references unknown key '{key}'")]
    UnknownGroupKey {
        path: String,
        label: String,
        key: String,
    },

    #[error("group option '{label}' at '{path}' declares no keys")]
    EmptyGroupOption { path: String, label: String },

    #[error("group options '{first}' and '{second}' at '{path}' declare the same keys")]
    DuplicateGroupOption {
        path: String,
        first: String,
        second: String,
    },

    #[error("uiType {ui_type} at '{path}' does not accept options")]
    OptionsNotSupported { path: String, ui_type: String },

    #[error("uiType {ui_type} at '{path}' does not accept subParameters")]
    ChildrenNotSupported { path: String, ui_type: String },

    #[error("duplicate option value {value} at '{path}'")]
    DuplicateOption { path: String, value: Value },

    #[error("parameter at '{path}' has subParameters and cannot take defaultValue {value}")]
    StructuredDefault { path: String, value: Value },

    #[error("default value {value} at '{path}' is not one of the declared options")]
    DefaultNotInOptions { path: String, value: Value },

    #[error("invalid pattern at '{path}': {source}")]
    InvalidPattern {
        path: String,
        #[source]
        source: regex::Error,
    },

    #[error("invalid bounds at '{path}': {reason}")]
    InvalidBounds { path: String, reason: String },

    #[error("condition at '{path}' references unknown sibling '{key}'")]
    UnknownConditionKey { path: String, key: String },

    #[error("condition at '{path}' uses `in` with a non-list value")]
    InvalidCondition { path: String },

    #[error("invalid JSON definition: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid YAML definition: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid TOML definition: {0}")]
    Toml(#[from] toml::de::Error),
}

/// One parameter as written in a definition document.
///
/// This is the raw, unchecked form. [`crate::SchemaTree::load`] turns a list
/// of these into checked [`crate::ParameterNode`]s.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ParameterDefinition {
    /// Field name in the configuration document.
    pub json_key: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub description: String,
    /// Render order among siblings.
    #[serde(default = "default_sort")]
    pub sort: i32,
    /// Widget name; see [`crate::UiType`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ui_type: Option<String>,
    #[serde(default)]
    pub disable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validate: Option<Validate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_parameters: Option<Vec<ParameterDefinition>>,
    /// Mutually exclusive key-sets over `subParameters`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_parameter_group_option: Option<Vec<SubParameterGroupOption>>,
    /// Accept keys beyond the declared `subParameters`.
    #[serde(default)]
    pub additional: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conditions: Option<Vec<Condition>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<Style>,
}

/// Sort value for parameters that do not declare one.
pub const DEFAULT_SORT: i32 = 100;

fn default_sort() -> i32 {
    DEFAULT_SORT
}

/// One named alternative of a `subParameterGroupOption`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SubParameterGroupOption {
    #[serde(default)]
    pub label: String,
    /// `jsonKey`s of the sub-parameters supplied together.
    pub keys: Vec<String>,
}

/// Serialization of a definition document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefinitionFormat {
    /// A JSON array of parameters.
    Json,
    /// A YAML sequence of parameters.
    Yaml,
    /// A TOML table with a `parameters` array.
    Toml,
}

#[derive(Deserialize)]
struct TomlDocument {
    parameters: Vec<ParameterDefinition>,
}

impl DefinitionFormat {
    /// Pick a format from a file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "json" => Some(Self::Json),
            "yaml" | "yml" => Some(Self::Yaml),
            "toml" | "tml" => Some(Self::Toml),
            _ => None,
        }
    }

    /// Parse a definition document.
    pub fn parse(self, content: &str) -> Result<Vec<ParameterDefinition>, SchemaError> {
        let defs = match self {
            Self::Json => serde_json::from_str(content)?,
            Self::Yaml => serde_yaml::from_str(content)?,
            Self::Toml => toml::from_str::<TomlDocument>(content)?.parameters,
        };
        Ok(defs)
    }
}

/// JSON Schema describing definition documents, for editor integration.
pub fn definition_json_schema() -> Result<Value, serde_json::Error> {
    let schema = schemars::schema_for!(Vec<ParameterDefinition>);
    serde_json::to_value(&schema)
}
