use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Widget tag selecting how a parameter is rendered.
///
/// Unknown widget names are kept as [`UiType::Custom`] so that schemas written
/// for newer clients still load; their values are not type-checked.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum UiType {
    /// Single-line text.
    Input,
    /// Masked text.
    Password,
    /// Numeric input.
    Number,
    /// Drop-down over `validate.options`.
    Select,
    /// Radio buttons over `validate.options`.
    Radio,
    /// Boolean toggle.
    Switch,
    /// List of scalar values.
    Strings,
    /// List of numbers.
    Numbers,
    /// Free-form string map.
    Kv,
    /// Nested object shown as a collapsible section.
    Group,
    /// Nested object shown inline with its parent.
    InnerGroup,
    /// List of nested objects.
    Structs,
    /// Validated but never rendered.
    Ignore,
    /// Container image reference.
    ImageInput,
    /// CPU quantity such as `0.5` or `"500m"`.
    CpuNumber,
    /// Memory quantity such as `"512Mi"`.
    MemoryNumber,
    /// Disk quantity such as `"10Gi"`.
    DiskNumber,
    /// Secret name picker.
    SecretSelect,
    /// Secret key picker.
    SecretKeySelect,
    /// Raw Kubernetes object editor.
    K8sObjectsCode,
    /// Any widget this crate does not know about.
    Custom(String),
}

/// Value shape a widget expects in a configuration document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueShape {
    /// A string.
    Text,
    /// A boolean.
    Bool,
    /// A number.
    Number,
    /// A string or a number (resource quantities).
    Quantity,
    /// Any string, number or boolean.
    Scalar,
    /// A list of scalars.
    ScalarList,
    /// A list of numbers.
    NumberList,
    /// An object whose values are all scalars.
    Map,
    /// An object.
    Object,
    /// A list; elements are checked individually.
    ObjectList,
    /// Anything.
    Any,
}

const KNOWN: &[(&str, UiType)] = &[
    ("Input", UiType::Input),
    ("Password", UiType::Password),
    ("Number", UiType::Number),
    ("Select", UiType::Select),
    ("Radio", UiType::Radio),
    ("Switch", UiType::Switch),
    ("Strings", UiType::Strings),
    ("Numbers", UiType::Numbers),
    ("KV", UiType::Kv),
    ("Group", UiType::Group),
    ("InnerGroup", UiType::InnerGroup),
    ("Structs", UiType::Structs),
    ("Ignore", UiType::Ignore),
    ("ImageInput", UiType::ImageInput),
    ("CPUNumber", UiType::CpuNumber),
    ("MemoryNumber", UiType::MemoryNumber),
    ("DiskNumber", UiType::DiskNumber),
    ("SecretSelect", UiType::SecretSelect),
    ("SecretKeySelect", UiType::SecretKeySelect),
    ("K8sObjectsCode", UiType::K8sObjectsCode),
];

impl UiType {
    /// Resolve a widget name as written in a definition.
    pub fn from_name(name: &str) -> Self {
        KNOWN
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, t)| t.clone())
            .unwrap_or_else(|| UiType::Custom(name.to_string()))
    }

    /// Widget name as written in a definition.
    pub fn as_str(&self) -> &str {
        match self {
            UiType::Custom(name) => name,
            known => KNOWN
                .iter()
                .find(|(_, t)| t == known)
                .map(|(n, _)| *n)
                .unwrap_or_default(),
        }
    }

    /// Expected value shape. `has_children` matters only for widgets that may
    /// or may not describe a nested object.
    pub fn shape(&self, has_children: bool) -> ValueShape {
        match self {
            UiType::Input
            | UiType::Password
            | UiType::ImageInput
            | UiType::SecretSelect
            | UiType::SecretKeySelect => ValueShape::Text,
            UiType::Number => ValueShape::Number,
            UiType::CpuNumber | UiType::MemoryNumber | UiType::DiskNumber => ValueShape::Quantity,
            UiType::Select | UiType::Radio => ValueShape::Scalar,
            UiType::Switch => ValueShape::Bool,
            UiType::Strings => ValueShape::ScalarList,
            UiType::Numbers => ValueShape::NumberList,
            UiType::Kv => ValueShape::Map,
            UiType::Group | UiType::InnerGroup => ValueShape::Object,
            UiType::Structs => ValueShape::ObjectList,
            UiType::Ignore | UiType::Custom(_) if has_children => ValueShape::Object,
            UiType::Ignore | UiType::Custom(_) | UiType::K8sObjectsCode => ValueShape::Any,
        }
    }

    /// Whether `validate.options` makes sense for this widget.
    pub fn accepts_options(&self) -> bool {
        matches!(
            self,
            UiType::Select
                | UiType::Radio
                | UiType::Strings
                | UiType::Numbers
                | UiType::Input
                | UiType::Number
                | UiType::Ignore
                | UiType::Custom(_)
        )
    }

    /// Whether the widget may carry `subParameters`.
    pub fn accepts_children(&self) -> bool {
        matches!(
            self,
            UiType::Group
                | UiType::InnerGroup
                | UiType::Structs
                | UiType::Ignore
                | UiType::Custom(_)
        )
    }
}

impl fmt::Display for UiType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for UiType {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

fn is_scalar(value: &Value) -> bool {
    matches!(value, Value::String(_) | Value::Number(_) | Value::Bool(_))
}

/// Short name of a JSON value's type, for messages.
pub fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Compare two JSON values, treating numbers by numeric value.
///
/// `1` and `1.0` are equal here, unlike with `Value`'s own `PartialEq`.
/// Arrays and objects are compared element by element.
pub fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => match (x.as_f64(), y.as_f64()) {
            (Some(x), Some(y)) => x == y,
            _ => x == y,
        },
        (Value::Array(xs), Value::Array(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| values_equal(x, y))
        }
        (Value::Object(xs), Value::Object(ys)) => {
            xs.len() == ys.len()
                && xs
                    .iter()
                    .all(|(k, x)| ys.get(k).is_some_and(|y| values_equal(x, y)))
        }
        _ => a == b,
    }
}

impl ValueShape {
    /// Check the outer shape of `value`.
    pub fn accepts(&self, value: &Value) -> bool {
        match self {
            ValueShape::Text => value.is_string(),
            ValueShape::Bool => value.is_boolean(),
            ValueShape::Number => value.is_number(),
            ValueShape::Quantity => value.is_string() || value.is_number(),
            ValueShape::Scalar => is_scalar(value),
            ValueShape::ScalarList => value
                .as_array()
                .is_some_and(|items| items.iter().all(is_scalar)),
            ValueShape::NumberList => value
                .as_array()
                .is_some_and(|items| items.iter().all(Value::is_number)),
            ValueShape::Map => value
                .as_object()
                .is_some_and(|map| map.values().all(is_scalar)),
            ValueShape::Object => value.is_object(),
            ValueShape::ObjectList => value.is_array(),
            ValueShape::Any => true,
        }
    }

    /// Human readable description of the shape.
    pub fn describe(&self) -> &'static str {
        match self {
            ValueShape::Text => "string",
            ValueShape::Bool => "boolean",
            ValueShape::Number => "number",
            ValueShape::Quantity => "string or number",
            ValueShape::Scalar => "scalar",
            ValueShape::ScalarList => "list of scalars",
            ValueShape::NumberList => "list of numbers",
            ValueShape::Map => "map of scalars",
            ValueShape::Object => "object",
            ValueShape::ObjectList => "list of objects",
            ValueShape::Any => "any value",
        }
    }

    /// Lists whose elements are scalars checked one by one.
    pub fn is_scalar_list(&self) -> bool {
        matches!(self, ValueShape::ScalarList | ValueShape::NumberList)
    }
}

/// Constraint record attached to a parameter.
///
/// An absent `validate` block is the same as `Validate::default()`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct Validate {
    /// A value must be supplied whenever the parameter is reachable.
    pub required: bool,
    /// The value may be set once and must not change on update.
    pub immutable: bool,
    /// Value used when the document does not supply one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_value: Option<Value>,
    /// Accepted values, in display order.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<OptionItem>,
    /// Inclusive lower bound for numbers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    /// Inclusive upper bound for numbers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    /// Minimum string length in characters, or minimum list length.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,
    /// Maximum string length in characters, or maximum list length.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
    /// Regular expression string values must match.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
}

/// One entry of an option list. Only `value` takes part in validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct OptionItem {
    /// Display text.
    #[serde(default)]
    pub label: String,
    /// Accepted value.
    pub value: Value,
}

/// Presentation hints forwarded to the client as-is.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct Style {
    /// Grid columns the widget spans.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub col_span: Option<u32>,
}

/// Comparison used by a [`Condition`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum ConditionOp {
    /// Sibling value equals the condition value.
    #[serde(rename = "==")]
    Eq,
    /// Sibling value differs from the condition value.
    #[serde(rename = "!=")]
    Ne,
    /// Sibling value is contained in the condition's list.
    #[serde(rename = "in")]
    In,
}

/// What happens to a parameter when its condition holds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ConditionAction {
    /// Parameter is active only while the condition holds.
    #[default]
    Enable,
    /// Parameter is inactive while the condition holds.
    Disable,
}

/// Makes a parameter depend on the value of a sibling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    /// Sibling `jsonKey` whose value is inspected.
    pub json_key: String,
    /// Comparison.
    pub op: ConditionOp,
    /// Operand; a list for `in`.
    pub value: Value,
    /// Effect on the parameter.
    #[serde(default)]
    pub action: ConditionAction,
}

impl Condition {
    /// Evaluate against the sibling's effective value.
    pub fn holds(&self, sibling: Option<&Value>) -> bool {
        match self.op {
            ConditionOp::Eq => sibling.is_some_and(|v| values_equal(v, &self.value)),
            ConditionOp::Ne => !sibling.is_some_and(|v| values_equal(v, &self.value)),
            ConditionOp::In => match (self.value.as_array(), sibling) {
                (Some(list), Some(v)) => list.iter().any(|item| values_equal(item, v)),
                _ => false,
            },
        }
    }

    /// Whether this condition leaves its parameter active.
    pub fn allows(&self, sibling: Option<&Value>) -> bool {
        match self.action {
            ConditionAction::Enable => self.holds(sibling),
            ConditionAction::Disable => !self.holds(sibling),
        }
    }
}
