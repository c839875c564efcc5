use std::collections::HashSet;

use regex::Regex;
use serde_json::{Map, Value};

use crate::{
    data::{
        oneof::GroupOptions,
        schema::{ParameterDefinition, SchemaError},
        types::{
            Condition, ConditionOp, OptionItem, Style, UiType, Validate, ValueShape, values_equal,
        },
    },
    path::FieldPath,
};

/// A checked schema node: one configuration field and its children.
///
/// Nodes are only produced by [`crate::SchemaTree::load`], so every node
/// satisfies the structural invariants (unique sibling keys, resolvable
/// group options, compatible option lists, compiled pattern).
#[derive(Debug, Clone)]
pub struct ParameterNode {
    json_key: String,
    label: String,
    description: String,
    sort: i32,
    ui_type: UiType,
    /// `uiType` was written in the definition rather than implied.
    typed: bool,
    disable: bool,
    validate: Validate,
    pattern: Option<Regex>,
    children: Vec<ParameterNode>,
    group_options: Option<GroupOptions>,
    additional: bool,
    conditions: Vec<Condition>,
    style: Option<Style>,
    path: FieldPath,
}

impl ParameterNode {
    /// Build a sibling list, checking key uniqueness and condition targets.
    pub(crate) fn build_siblings(
        defs: Vec<ParameterDefinition>,
        parent: &FieldPath,
    ) -> Result<Vec<Self>, SchemaError> {
        let mut seen = HashSet::new();
        for def in &defs {
            if !def.json_key.is_empty() && !seen.insert(def.json_key.as_str()) {
                return Err(SchemaError::DuplicateKey {
                    path: parent.to_string(),
                    key: def.json_key.clone(),
                });
            }
        }
        for def in &defs {
            for cond in def.conditions.iter().flatten() {
                if !seen.contains(cond.json_key.as_str()) {
                    return Err(SchemaError::UnknownConditionKey {
                        path: parent.child(&def.json_key).to_string(),
                        key: cond.json_key.clone(),
                    });
                }
            }
        }

        defs.into_iter().map(|d| Self::build(d, parent)).collect()
    }

    fn build(def: ParameterDefinition, parent: &FieldPath) -> Result<Self, SchemaError> {
        if def.json_key.is_empty() {
            return Err(SchemaError::EmptyKey {
                path: parent.to_string(),
            });
        }
        let path = parent.child(&def.json_key);
        let at = path.to_string();

        let sub_defs = def.sub_parameters.unwrap_or_default();
        let ui_type = match def.ui_type.as_deref() {
            Some(name) => UiType::from_name(name),
            None if !sub_defs.is_empty() => UiType::Group,
            None => UiType::Input,
        };
        if !sub_defs.is_empty() && !ui_type.accepts_children() {
            return Err(SchemaError::ChildrenNotSupported {
                path: at,
                ui_type: ui_type.to_string(),
            });
        }

        let validate = def.validate.unwrap_or_default();
        if !sub_defs.is_empty()
            && let Some(default) = &validate.default_value
        {
            return Err(SchemaError::StructuredDefault {
                path: at,
                value: default.clone(),
            });
        }
        check_options(&validate, &ui_type, &at)?;
        check_bounds(&validate, &at)?;
        let pattern = validate
            .pattern
            .as_deref()
            .map(Regex::new)
            .transpose()
            .map_err(|source| SchemaError::InvalidPattern {
                path: at.clone(),
                source,
            })?;

        let conditions = def.conditions.unwrap_or_default();
        if conditions
            .iter()
            .any(|c| c.op == ConditionOp::In && !c.value.is_array())
        {
            return Err(SchemaError::InvalidCondition { path: at });
        }

        let children = Self::build_siblings(sub_defs, &path)?;
        let child_keys: Vec<&str> = children.iter().map(|c| c.json_key.as_str()).collect();
        let group_options = GroupOptions::build(
            def.sub_parameter_group_option.unwrap_or_default(),
            &child_keys,
            &at,
        )?;

        Ok(Self {
            json_key: def.json_key,
            label: def.label,
            description: def.description,
            sort: def.sort,
            typed: def.ui_type.is_some(),
            ui_type,
            disable: def.disable,
            validate,
            pattern,
            children,
            group_options,
            additional: def.additional,
            conditions,
            style: def.style,
            path,
        })
    }

    /// Field name in the configuration document.
    pub fn json_key(&self) -> &str {
        &self.json_key
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn sort(&self) -> i32 {
        self.sort
    }

    pub fn ui_type(&self) -> &UiType {
        &self.ui_type
    }

    /// Hidden from rendering, still validated.
    pub fn is_disabled(&self) -> bool {
        self.disable
    }

    pub fn validate(&self) -> &Validate {
        &self.validate
    }

    pub fn is_required(&self) -> bool {
        self.validate.required
    }

    pub fn is_immutable(&self) -> bool {
        self.validate.immutable
    }

    pub fn default_value(&self) -> Option<&Value> {
        self.validate.default_value.as_ref()
    }

    pub fn options(&self) -> &[OptionItem] {
        &self.validate.options
    }

    /// Compiled `validate.pattern`.
    pub fn pattern(&self) -> Option<&Regex> {
        self.pattern.as_ref()
    }

    /// Sub-parameters in declaration order.
    pub fn children(&self) -> &[ParameterNode] {
        &self.children
    }

    /// Direct child by `jsonKey`.
    pub fn child(&self, key: &str) -> Option<&ParameterNode> {
        self.children.iter().find(|c| c.json_key == key)
    }

    pub fn group_options(&self) -> Option<&GroupOptions> {
        self.group_options.as_ref()
    }

    /// Extra keys are accepted at this level.
    pub fn is_additional(&self) -> bool {
        self.additional
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    pub fn style(&self) -> Option<&Style> {
        self.style.as_ref()
    }

    /// Schema path from the root (keys only).
    pub fn path(&self) -> &FieldPath {
        &self.path
    }

    /// Has neither sub-parameters nor alternatives.
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty() && self.group_options.is_none()
    }

    /// Expected value shape in a configuration document.
    ///
    /// A leaf without a declared `uiType` accepts any scalar.
    pub fn shape(&self) -> ValueShape {
        if !self.typed && self.is_leaf() {
            return ValueShape::Scalar;
        }
        self.ui_type.shape(!self.is_leaf())
    }

    /// Neither disabled nor an `Ignore` widget.
    pub fn is_visible(&self) -> bool {
        !self.disable && self.ui_type != UiType::Ignore
    }

    /// Whether `value` is one of the declared option values.
    pub fn accepts_option(&self, value: &Value) -> bool {
        self.validate.options.iter().any(|o| values_equal(&o.value, value))
    }

    /// Evaluate `conditions` against sibling values.
    ///
    /// A sibling missing from `object` falls back to its default value.
    pub fn is_active(&self, siblings: &[ParameterNode], object: Option<&Map<String, Value>>) -> bool {
        self.conditions.iter().all(|cond| {
            let value = object
                .and_then(|o| o.get(&cond.json_key))
                .filter(|v| !v.is_null())
                .or_else(|| {
                    siblings
                        .iter()
                        .find(|s| s.json_key == cond.json_key)
                        .and_then(ParameterNode::default_value)
                });
            cond.allows(value)
        })
    }

    /// Sub-parameters in render order.
    pub fn sorted_children(&self) -> Vec<&ParameterNode> {
        sort_nodes(&self.children)
    }
}

/// Order siblings by `sort`, keeping declaration order on ties.
pub fn sort_nodes(nodes: &[ParameterNode]) -> Vec<&ParameterNode> {
    let mut sorted: Vec<&ParameterNode> = nodes.iter().collect();
    // stable
    sorted.sort_by_key(|n| n.sort);
    sorted
}

fn check_options(validate: &Validate, ui_type: &UiType, at: &str) -> Result<(), SchemaError> {
    let options = &validate.options;
    if options.is_empty() {
        return Ok(());
    }
    if !ui_type.accepts_options() {
        return Err(SchemaError::OptionsNotSupported {
            path: at.to_string(),
            ui_type: ui_type.to_string(),
        });
    }
    for (i, opt) in options.iter().enumerate() {
        if options[..i].iter().any(|o| values_equal(&o.value, &opt.value)) {
            return Err(SchemaError::DuplicateOption {
                path: at.to_string(),
                value: opt.value.clone(),
            });
        }
    }

    let declared = |v: &Value| options.iter().any(|o| values_equal(&o.value, v));
    if let Some(default) = &validate.default_value {
        let ok = match default {
            Value::Array(items) if ui_type.shape(false).is_scalar_list() => {
                items.iter().all(declared)
            }
            other => declared(other),
        };
        if !ok {
            return Err(SchemaError::DefaultNotInOptions {
                path: at.to_string(),
                value: default.clone(),
            });
        }
    }
    Ok(())
}

fn check_bounds(validate: &Validate, at: &str) -> Result<(), SchemaError> {
    if let (Some(min), Some(max)) = (validate.min, validate.max)
        && min > max
    {
        return Err(SchemaError::InvalidBounds {
            path: at.to_string(),
            reason: format!("min {min} is greater than max {max}"),
        });
    }
    if let (Some(min), Some(max)) = (validate.min_length, validate.max_length)
        && min > max
    {
        return Err(SchemaError::InvalidBounds {
            path: at.to_string(),
            reason: format!("minLength {min} is greater than maxLength {max}"),
        });
    }
    Ok(())
}
