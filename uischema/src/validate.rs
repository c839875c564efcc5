//! Validation of configuration documents against a [`SchemaTree`].
//!
//! The walk is depth-first over the schema, mirrored against the document.
//! Every problem is collected as a [`Violation`]; the walk never stops at the
//! first one and never fails on a malformed document.
//!
//! ## Alternatives
//!
//! At a node with `subParameterGroupOption`, the document object is first
//! resolved to one alternative (see [`GroupOptions::resolve`]). Keys of the
//! selected alternative and keys shared by no alternative are validated
//! normally. Keys that only belong to other alternatives are reported as
//! unexpected. When no alternative, or more than one, is selected, `required`
//! is not enforced on alternative members.

use std::fmt;

use log::{debug, trace, warn};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{
    data::{
        GroupOptions, ParameterNode, SchemaTree, Selection,
        types::{value_kind, values_equal},
    },
    path::FieldPath,
};

/// Policy for document keys the schema does not declare.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationMode {
    /// Undeclared keys are [`ViolationKind::UnexpectedField`] violations.
    #[default]
    Strict,
    /// Undeclared keys are logged and otherwise ignored.
    Lenient,
}

/// Options recognized by a validation call.
///
/// Deserializable so hosts can embed it in their own configuration:
///
/// ```toml
/// [validation]
/// mode = "lenient"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ValidateOptions {
    pub mode: ValidationMode,
}

impl ValidateOptions {
    pub fn strict() -> Self {
        Self {
            mode: ValidationMode::Strict,
        }
    }

    pub fn lenient() -> Self {
        Self {
            mode: ValidationMode::Lenient,
        }
    }
}

/// Category of a [`Violation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViolationKind {
    /// A required value is absent.
    MissingRequired,
    /// A value is not among the declared options.
    InvalidOption,
    /// A value has the wrong shape for its widget.
    TypeMismatch,
    /// An immutable value differs from the stored one.
    ImmutableViolation,
    /// Several exclusive alternatives are supplied together.
    ConflictingAlternatives,
    /// A key the schema does not accept at this place.
    UnexpectedField,
    /// A number outside `min`/`max`.
    OutOfRange,
    /// A string or list outside `minLength`/`maxLength`.
    InvalidLength,
    /// A string that does not match `pattern`.
    PatternMismatch,
}

impl ViolationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ViolationKind::MissingRequired => "MissingRequired",
            ViolationKind::InvalidOption => "InvalidOption",
            ViolationKind::TypeMismatch => "TypeMismatch",
            ViolationKind::ImmutableViolation => "ImmutableViolation",
            ViolationKind::ConflictingAlternatives => "ConflictingAlternatives",
            ViolationKind::UnexpectedField => "UnexpectedField",
            ViolationKind::OutOfRange => "OutOfRange",
            ViolationKind::InvalidLength => "InvalidLength",
            ViolationKind::PatternMismatch => "PatternMismatch",
        }
    }
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single validation failure.
#[derive(Debug, Clone, PartialEq)]
pub struct Violation {
    /// Location in the document.
    pub path: FieldPath,
    pub kind: ViolationKind,
    /// Human-readable description.
    pub message: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_root() {
            write!(f, "(root): {} ({})", self.message, self.kind)
        } else {
            write!(f, "{}: {} ({})", self.path, self.message, self.kind)
        }
    }
}

/// All violations found in one document, in walk order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Violations {
    violations: Vec<Violation>,
}

impl Violations {
    pub fn len(&self) -> usize {
        self.violations.len()
    }

    /// True when the document is valid.
    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Violation> {
        self.violations.iter()
    }

    /// Violations of one kind.
    pub fn of_kind(&self, kind: ViolationKind) -> impl Iterator<Item = &Violation> {
        self.violations.iter().filter(move |v| v.kind == kind)
    }

    /// Violations at a path, given in dotted/indexed form.
    pub fn at<'a>(&'a self, path: &'a str) -> impl Iterator<Item = &'a Violation> {
        self.violations
            .iter()
            .filter(move |v| v.path.to_string() == path)
    }

    pub fn into_inner(self) -> Vec<Violation> {
        self.violations
    }
}

impl fmt::Display for Violations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, v) in self.violations.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{v}")?;
        }
        Ok(())
    }
}

impl IntoIterator for Violations {
    type Item = Violation;
    type IntoIter = std::vec::IntoIter<Violation>;

    fn into_iter(self) -> Self::IntoIter {
        self.violations.into_iter()
    }
}

impl<'a> IntoIterator for &'a Violations {
    type Item = &'a Violation;
    type IntoIter = std::slice::Iter<'a, Violation>;

    fn into_iter(self) -> Self::IntoIter {
        self.violations.iter()
    }
}

/// Validates documents against one schema tree.
///
/// The engine holds no per-call state; one engine may be shared between
/// threads.
#[derive(Debug, Clone)]
pub struct ValidationEngine<'a> {
    tree: &'a SchemaTree,
    options: ValidateOptions,
}

impl<'a> ValidationEngine<'a> {
    /// Engine in strict mode.
    pub fn new(tree: &'a SchemaTree) -> Self {
        Self::with_options(tree, ValidateOptions::default())
    }

    pub fn with_options(tree: &'a SchemaTree, options: ValidateOptions) -> Self {
        Self { tree, options }
    }

    pub fn options(&self) -> &ValidateOptions {
        &self.options
    }

    /// Validate a document on initial creation.
    pub fn validate(&self, instance: &Value) -> Violations {
        self.run(instance, None)
    }

    /// Validate an updated document against the stored `previous` one.
    ///
    /// Immutable fields must keep their stored value.
    pub fn validate_update(&self, instance: &Value, previous: &Value) -> Violations {
        self.run(instance, Some(previous))
    }

    fn run(&self, instance: &Value, previous: Option<&Value>) -> Violations {
        let mut walk = Walk {
            options: &self.options,
            violations: Vec::new(),
        };
        let root = FieldPath::root();

        match instance.as_object() {
            Some(object) => walk.object(
                Level::root(self.tree),
                object,
                previous.and_then(Value::as_object),
                &root,
            ),
            None => walk.push(
                root,
                ViolationKind::TypeMismatch,
                format!("expected object, found {}", value_kind(instance)),
            ),
        }

        debug!("validation finished with {} violation(s)", walk.violations.len());
        Violations {
            violations: walk.violations,
        }
    }
}

/// Validate `instance` against `tree`.
pub fn validate(tree: &SchemaTree, instance: &Value, options: &ValidateOptions) -> Violations {
    ValidationEngine::with_options(tree, options.clone()).validate(instance)
}

/// Validate an update of a stored document.
pub fn validate_update(
    tree: &SchemaTree,
    instance: &Value,
    previous: &Value,
    options: &ValidateOptions,
) -> Violations {
    ValidationEngine::with_options(tree, options.clone()).validate_update(instance, previous)
}

/// One object level of the schema.
#[derive(Clone, Copy)]
struct Level<'a> {
    nodes: &'a [ParameterNode],
    group: Option<&'a GroupOptions>,
    additional: bool,
    required: bool,
}

impl<'a> Level<'a> {
    fn root(tree: &'a SchemaTree) -> Self {
        Self {
            nodes: tree.roots(),
            group: None,
            additional: false,
            required: false,
        }
    }

    fn of(node: &'a ParameterNode) -> Self {
        Self {
            nodes: node.children(),
            group: node.group_options(),
            additional: node.is_additional(),
            required: node.is_required(),
        }
    }
}

struct Walk<'o> {
    options: &'o ValidateOptions,
    violations: Vec<Violation>,
}

fn non_null(value: Option<&Value>) -> Option<&Value> {
    value.filter(|v| !v.is_null())
}

impl Walk<'_> {
    fn push(&mut self, path: FieldPath, kind: ViolationKind, message: String) {
        self.violations.push(Violation {
            path,
            kind,
            message,
        });
    }

    fn unexpected(&mut self, path: FieldPath, message: String) {
        match self.options.mode {
            ValidationMode::Strict => self.push(path, ViolationKind::UnexpectedField, message),
            ValidationMode::Lenient => warn!("ignoring unexpected field `{path}`: {message}"),
        }
    }

    fn resolve(
        &mut self,
        group: &GroupOptions,
        required: bool,
        object: &Map<String, Value>,
        path: &FieldPath,
    ) -> Selection {
        let selection = group.resolve(object);
        match &selection {
            Selection::None if required => {
                let all: Vec<usize> = (0..group.alternatives().len()).collect();
                self.push(
                    path.clone(),
                    ViolationKind::MissingRequired,
                    format!("one of [{}] must be supplied", group.labels(&all).join(", ")),
                );
            }
            Selection::Conflict(indices) => self.push(
                path.clone(),
                ViolationKind::ConflictingAlternatives,
                format!(
                    "alternatives [{}] are mutually exclusive",
                    group.labels(indices).join(", ")
                ),
            ),
            Selection::One(i) => {
                debug!("`{path}` resolved to alternative {i}");
            }
            Selection::None => {}
        }
        selection
    }

    fn object(
        &mut self,
        level: Level<'_>,
        object: &Map<String, Value>,
        previous: Option<&Map<String, Value>>,
        path: &FieldPath,
    ) {
        let selection = level
            .group
            .map(|group| (group, self.resolve(group, level.required, object, path)));

        for node in level.nodes {
            let key = node.json_key();
            let child_path = path.child(key);
            let value = non_null(object.get(key));
            let mut required = node.is_required() && node.is_active(level.nodes, Some(object));

            if let Some((group, selection)) = &selection
                && group.is_member(key)
            {
                match selection {
                    Selection::One(i) if !group.allows(*i, key) => {
                        if value.is_some() {
                            let owners: Vec<&str> = group
                                .alternatives()
                                .iter()
                                .filter(|a| a.contains(key))
                                .map(|a| a.label())
                                .collect();
                            let selected = group.labels(&[*i]).join("");
                            self.unexpected(
                                child_path,
                                format!(
                                    "belongs to [{}], but alternative '{selected}' is selected",
                                    owners.join(", ")
                                ),
                            );
                        }
                        continue;
                    }
                    Selection::One(_) => {}
                    Selection::None | Selection::Conflict(_) => required = false,
                }
            }

            let stored = non_null(previous.and_then(|p| p.get(key)));
            match value {
                Some(v) => self.value(node, v, stored, &child_path),
                None => {
                    if required {
                        self.push(
                            child_path.clone(),
                            ViolationKind::MissingRequired,
                            "required value is missing".to_string(),
                        );
                    }
                    if node.is_immutable() && stored.is_some() {
                        self.push(
                            child_path,
                            ViolationKind::ImmutableViolation,
                            "immutable value cannot be removed".to_string(),
                        );
                    }
                }
            }
        }

        if !level.additional {
            for key in object.keys() {
                if !level.nodes.iter().any(|n| n.json_key() == key.as_str()) {
                    self.unexpected(path.child(key), "not declared in the schema".to_string());
                }
            }
        }
    }

    fn value(
        &mut self,
        node: &ParameterNode,
        value: &Value,
        stored: Option<&Value>,
        path: &FieldPath,
    ) {
        trace!("checking `{path}`");
        let shape = node.shape();
        if !shape.accepts(value) {
            self.push(
                path.clone(),
                ViolationKind::TypeMismatch,
                format!("expected {}, found {}", shape.describe(), value_kind(value)),
            );
            return;
        }

        if node.is_immutable()
            && let Some(stored) = stored
            && !values_equal(stored, value)
        {
            self.push(
                path.clone(),
                ViolationKind::ImmutableViolation,
                format!("immutable value cannot change from {stored} to {value}"),
            );
        }

        self.constraints(node, value, path);

        if node.is_leaf() {
            return;
        }
        let level = Level::of(node);
        match value {
            Value::Object(object) => {
                self.object(level, object, stored.and_then(Value::as_object), path)
            }
            Value::Array(items) => {
                for (i, item) in items.iter().enumerate() {
                    let item_path = path.index(i);
                    let stored_item = non_null(stored.and_then(|s| s.get(i)));
                    match item.as_object() {
                        Some(object) => self.object(
                            level,
                            object,
                            stored_item.and_then(Value::as_object),
                            &item_path,
                        ),
                        None => self.push(
                            item_path,
                            ViolationKind::TypeMismatch,
                            format!("expected object, found {}", value_kind(item)),
                        ),
                    }
                }
            }
            _ => {}
        }
    }

    fn constraints(&mut self, node: &ParameterNode, value: &Value, path: &FieldPath) {
        let rules = node.validate();

        if !rules.options.is_empty() {
            let allowed = || {
                rules
                    .options
                    .iter()
                    .map(|o| o.value.to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            };
            match value {
                Value::Array(items) if node.shape().is_scalar_list() => {
                    for (i, item) in items.iter().enumerate() {
                        if !node.accepts_option(item) {
                            self.push(
                                path.index(i),
                                ViolationKind::InvalidOption,
                                format!("{item} is not one of [{}]", allowed()),
                            );
                        }
                    }
                }
                other => {
                    if !node.accepts_option(other) {
                        self.push(
                            path.clone(),
                            ViolationKind::InvalidOption,
                            format!("{other} is not one of [{}]", allowed()),
                        );
                    }
                }
            }
        }

        if let Some(n) = value.as_f64() {
            if let Some(min) = rules.min
                && n < min
            {
                self.push(
                    path.clone(),
                    ViolationKind::OutOfRange,
                    format!("{n} is less than the minimum {min}"),
                );
            }
            if let Some(max) = rules.max
                && n > max
            {
                self.push(
                    path.clone(),
                    ViolationKind::OutOfRange,
                    format!("{n} is greater than the maximum {max}"),
                );
            }
        }

        let len = match value {
            Value::String(s) => Some(s.chars().count()),
            Value::Array(items) => Some(items.len()),
            _ => None,
        };
        if let Some(len) = len {
            if let Some(min) = rules.min_length
                && len < min
            {
                self.push(
                    path.clone(),
                    ViolationKind::InvalidLength,
                    format!("length {len} is shorter than {min}"),
                );
            }
            if let Some(max) = rules.max_length
                && len > max
            {
                self.push(
                    path.clone(),
                    ViolationKind::InvalidLength,
                    format!("length {len} is longer than {max}"),
                );
            }
        }

        if let Some(re) = node.pattern() {
            let mut check = |p: FieldPath, s: &str| {
                if !re.is_match(s) {
                    self.push(
                        p,
                        ViolationKind::PatternMismatch,
                        format!("{s:?} does not match pattern {}", re.as_str()),
                    );
                }
            };
            match value {
                Value::String(s) => check(path.clone(), s),
                Value::Array(items) => {
                    for (i, item) in items.iter().enumerate() {
                        if let Some(s) = item.as_str() {
                            check(path.index(i), s);
                        }
                    }
                }
                _ => {}
            }
        }
    }
}
