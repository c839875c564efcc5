//! Presentation model for schema-driven input forms.
//!
//! [`RenderModel::render`] projects a [`SchemaTree`] (and optionally a
//! document being edited) onto a tree of [`RenderGroup`]s: visible fields in
//! render order, each with its widget, options, and current or default
//! value. Nodes with alternatives become an exclusive-choice selector whose
//! chosen alternative is the only one whose fields are exposed.
//!
//! The output is `Serialize` and can be handed to a client as JSON.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::{
    data::{
        GroupOptions, OptionItem, ParameterNode, SchemaTree, Selection, Style, UiType, ValueShape,
        param::sort_nodes,
    },
    path::FieldPath,
};

/// Where a rendered value or choice came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ValueSource {
    /// Taken from the supplied document.
    Instance,
    /// Taken from `validate.defaultValue`, or the first alternative.
    Default,
    /// Nothing to show.
    Unset,
}

/// One entry of an exclusive-choice selector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChoiceEntry {
    pub label: String,
    pub keys: Vec<String>,
}

/// Selector for a node's `subParameterGroupOption`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChoiceSelector {
    pub alternatives: Vec<ChoiceEntry>,
    /// Index into `alternatives`.
    pub selected: usize,
    pub source: ValueSource,
}

/// An ordered set of fields sharing one object level.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderGroup {
    pub path: FieldPath,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub choice: Option<ChoiceSelector>,
    pub fields: Vec<RenderField>,
}

impl RenderGroup {
    /// Field by `jsonKey`.
    pub fn field(&self, key: &str) -> Option<&RenderField> {
        self.fields.iter().find(|f| f.json_key == key)
    }

    /// Field keys in render order.
    pub fn keys(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.json_key.as_str()).collect()
    }
}

/// One visible parameter.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderField {
    pub json_key: String,
    pub path: FieldPath,
    pub label: String,
    pub description: String,
    pub ui_type: UiType,
    pub sort: i32,
    pub required: bool,
    pub immutable: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<OptionItem>,
    /// Current or default value. Only set for leaf fields; structured fields
    /// expose their content through `group` and `items`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    pub value_source: ValueSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<Style>,
    /// Nested fields; for list nodes, the template of a new element.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<RenderGroup>,
    /// One group per element of a list node.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<RenderGroup>,
}

/// Derives form presentation from a schema tree.
#[derive(Debug, Clone, Copy)]
pub struct RenderModel<'a> {
    tree: &'a SchemaTree,
}

impl<'a> RenderModel<'a> {
    pub fn new(tree: &'a SchemaTree) -> Self {
        Self { tree }
    }

    /// Render the whole tree, filling values from `instance` when given.
    ///
    /// A non-object `instance` is treated as absent.
    pub fn render(&self, instance: Option<&Value>) -> RenderGroup {
        render_level(
            self.tree.roots(),
            None,
            instance.and_then(Value::as_object),
            &FieldPath::root(),
        )
    }
}

/// Render `tree` for `instance`.
pub fn render(tree: &SchemaTree, instance: Option<&Value>) -> RenderGroup {
    RenderModel::new(tree).render(instance)
}

fn selector(group: &GroupOptions, object: Option<&Map<String, Value>>) -> ChoiceSelector {
    let (selected, source) = match object.map(|o| group.resolve(o)) {
        Some(Selection::One(i)) => (i, ValueSource::Instance),
        Some(Selection::Conflict(indices)) => (indices[0], ValueSource::Instance),
        Some(Selection::None) | None => (0, ValueSource::Default),
    };
    ChoiceSelector {
        alternatives: group
            .alternatives()
            .iter()
            .map(|a| ChoiceEntry {
                label: a.label().to_string(),
                keys: a.keys().to_vec(),
            })
            .collect(),
        selected,
        source,
    }
}

fn render_level(
    nodes: &[ParameterNode],
    group: Option<&GroupOptions>,
    object: Option<&Map<String, Value>>,
    path: &FieldPath,
) -> RenderGroup {
    let choice = group.map(|g| selector(g, object));

    let fields = sort_nodes(nodes)
        .into_iter()
        .filter(|n| n.is_visible())
        .filter(|n| match (group, &choice) {
            (Some(g), Some(c)) => g.allows(c.selected, n.json_key()),
            _ => true,
        })
        .filter(|n| n.is_active(nodes, object))
        .map(|n| {
            let value = object
                .and_then(|o| o.get(n.json_key()))
                .filter(|v| !v.is_null());
            render_field(n, value, path)
        })
        .collect();

    RenderGroup {
        path: path.clone(),
        choice,
        fields,
    }
}

fn render_field(node: &ParameterNode, value: Option<&Value>, parent: &FieldPath) -> RenderField {
    let path = parent.child(node.json_key());
    let (effective, value_source) = match (value, node.default_value()) {
        (Some(v), _) => (Some(v), ValueSource::Instance),
        (None, Some(d)) => (Some(d), ValueSource::Default),
        (None, None) => (None, ValueSource::Unset),
    };

    let (group, items) = if node.is_leaf() {
        (None, Vec::new())
    } else {
        let children = node.children();
        let options = node.group_options();
        match node.shape() {
            ValueShape::ObjectList => {
                let template = render_level(children, options, None, &path);
                let items: Vec<RenderGroup> = effective
                    .and_then(Value::as_array)
                    .map(|elements| {
                        elements
                            .iter()
                            .enumerate()
                            .map(|(i, e)| {
                                render_level(children, options, e.as_object(), &path.index(i))
                            })
                            .collect()
                    })
                    .unwrap_or_default();
                (Some(template), items)
            }
            _ => (
                Some(render_level(
                    children,
                    options,
                    effective.and_then(Value::as_object),
                    &path,
                )),
                Vec::new(),
            ),
        }
    };

    RenderField {
        json_key: node.json_key().to_string(),
        path,
        label: node.label().to_string(),
        description: node.description().to_string(),
        ui_type: node.ui_type().clone(),
        sort: node.sort(),
        required: node.is_required(),
        immutable: node.is_immutable(),
        options: node.options().to_vec(),
        value: if node.is_leaf() { effective.cloned() } else { None },
        value_source,
        style: node.style().cloned(),
        group,
        items,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tree(defs: Value) -> SchemaTree {
        SchemaTree::from_value(&defs).unwrap()
    }

    #[test]
    fn test_hidden_nodes_are_skipped() {
        let t = tree(json!([
            {"jsonKey": "image", "sort": 1},
            {"jsonKey": "internal", "uiType": "Ignore"},
            {"jsonKey": "legacy", "disable": true},
        ]));
        assert_eq!(render(&t, None).keys(), vec!["image"]);
    }

    #[test]
    fn test_sort_is_stable() {
        let t = tree(json!([
            {"jsonKey": "cpu", "sort": 100},
            {"jsonKey": "image", "sort": 1},
            {"jsonKey": "memory", "sort": 100},
            {"jsonKey": "policy", "sort": 3},
            {"jsonKey": "cmd", "sort": 100},
        ]));
        let first = render(&t, None);
        assert_eq!(first.keys(), vec!["image", "policy", "cpu", "memory", "cmd"]);
        assert_eq!(first, render(&t, None));
    }

    #[test]
    fn test_value_sources() {
        let t = tree(json!([
            {"jsonKey": "image"},
            {"jsonKey": "policy", "uiType": "Select", "validate": {
                "defaultValue": "IfNotPresent",
                "options": [
                    {"label": "IfNotPresent", "value": "IfNotPresent"},
                    {"label": "Always", "value": "Always"},
                ],
            }},
        ]));

        let group = render(&t, None);
        let policy = group.field("policy").unwrap();
        assert_eq!(policy.value, Some(json!("IfNotPresent")));
        assert_eq!(policy.value_source, ValueSource::Default);
        assert_eq!(policy.options.len(), 2);
        assert_eq!(group.field("image").unwrap().value_source, ValueSource::Unset);

        let doc = json!({"image": "nginx", "policy": "Always"});
        let group = render(&t, Some(&doc));
        assert_eq!(group.field("policy").unwrap().value, Some(json!("Always")));
        assert_eq!(
            group.field("image").unwrap().value_source,
            ValueSource::Instance
        );
    }

    #[test]
    fn test_nested_defaults_without_instance() {
        let t = tree(json!([
            {"jsonKey": "resources", "uiType": "Group", "subParameters": [
                {"jsonKey": "cpu", "uiType": "CPUNumber", "validate": {"defaultValue": "1"}},
                {"jsonKey": "memory", "uiType": "MemoryNumber"},
            ]},
        ]));
        let root = render(&t, None);
        let resources = root.field("resources").unwrap();
        assert_eq!(resources.value, None);
        assert_eq!(resources.value_source, ValueSource::Unset);

        let group = resources.group.as_ref().unwrap();
        let cpu = group.field("cpu").unwrap();
        assert_eq!(cpu.value, Some(json!("1")));
        assert_eq!(cpu.value_source, ValueSource::Default);
        assert_eq!(group.field("memory").unwrap().value_source, ValueSource::Unset);

        let structured = SchemaTree::from_value(&json!([
            {"jsonKey": "resources", "uiType": "Group", "validate": {"defaultValue": {"cpu": "1"}},
             "subParameters": [{"jsonKey": "cpu", "uiType": "CPUNumber"}]},
        ]));
        assert!(structured.is_err());
    }

    fn env_tree() -> SchemaTree {
        tree(json!([
            {"jsonKey": "env", "uiType": "Structs", "sort": 1,
             "subParameterGroupOption": [
                {"label": "Add By Value", "keys": ["name", "value"]},
                {"label": "Add By Secret", "keys": ["name", "valueFrom"]},
             ],
             "subParameters": [
                {"jsonKey": "name", "sort": 1, "validate": {"required": true}},
                {"jsonKey": "value", "sort": 3},
                {"jsonKey": "valueFrom", "sort": 5, "subParameters": [
                    {"jsonKey": "secretKeyRef", "subParameters": [
                        {"jsonKey": "name"},
                        {"jsonKey": "key"},
                    ]},
                ]},
             ]},
        ]))
    }

    #[test]
    fn test_choice_selector() {
        let t = env_tree();
        let doc = json!({"env": [
            {"name": "MODE", "value": "prod"},
            {"name": "TOKEN", "valueFrom": {"secretKeyRef": {"name": "s", "key": "k"}}},
        ]});
        let root = render(&t, Some(&doc));
        let env = root.field("env").unwrap();

        let template = env.group.as_ref().unwrap();
        let selector = template.choice.as_ref().unwrap();
        assert_eq!(selector.selected, 0);
        assert_eq!(selector.source, ValueSource::Default);
        assert_eq!(selector.alternatives[1].label, "Add By Secret");
        assert_eq!(template.keys(), vec!["name", "value"]);

        assert_eq!(env.items.len(), 2);
        assert_eq!(env.items[0].keys(), vec!["name", "value"]);
        assert_eq!(env.items[1].keys(), vec!["name", "valueFrom"]);
        let item = &env.items[1];
        assert_eq!(item.choice.as_ref().unwrap().selected, 1);
        assert_eq!(item.choice.as_ref().unwrap().source, ValueSource::Instance);
        assert_eq!(item.path.to_string(), "env[1]");

        let secret = item.field("valueFrom").unwrap().group.as_ref().unwrap();
        let key = secret.field("secretKeyRef").unwrap().group.as_ref().unwrap();
        assert_eq!(key.field("key").unwrap().value, Some(json!("k")));
        assert_eq!(key.field("key").unwrap().path.to_string(), "env[1].valueFrom.secretKeyRef.key");
    }

    #[test]
    fn test_conditions_hide_fields() {
        let t = tree(json!([
            {"jsonKey": "exposeType", "uiType": "Select", "validate": {
                "defaultValue": "ClusterIP",
                "options": [
                    {"label": "ClusterIP", "value": "ClusterIP"},
                    {"label": "NodePort", "value": "NodePort"},
                ],
            }},
            {"jsonKey": "nodePort", "uiType": "Number",
             "conditions": [{"jsonKey": "exposeType", "op": "==", "value": "NodePort"}]},
        ]));
        assert_eq!(render(&t, None).keys(), vec!["exposeType"]);
        let doc = json!({"exposeType": "NodePort"});
        assert_eq!(render(&t, Some(&doc)).keys(), vec!["exposeType", "nodePort"]);
    }

    #[test]
    fn test_serializes_camel_case() {
        let t = tree(json!([
            {"jsonKey": "cpu", "label": "CPU", "uiType": "CPUNumber", "style": {"colSpan": 12}},
        ]));
        let out = serde_json::to_value(render(&t, None)).unwrap();
        assert_eq!(
            out,
            json!({
                "path": "",
                "fields": [{
                    "jsonKey": "cpu",
                    "path": "cpu",
                    "label": "CPU",
                    "description": "",
                    "uiType": "CPUNumber",
                    "sort": 100,
                    "required": false,
                    "immutable": false,
                    "valueSource": "unset",
                    "style": {"colSpan": 12},
                }],
            })
        );
    }
}
