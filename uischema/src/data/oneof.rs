use std::collections::BTreeSet;

use serde_json::{Map, Value};

use crate::data::schema::{SchemaError, SubParameterGroupOption};

/// One named alternative of a node's `subParameterGroupOption`.
#[derive(Debug, Clone)]
pub struct Alternative {
    label: String,
    keys: Vec<String>,
    /// Keys no other alternative declares. Presence of any of them selects
    /// this alternative.
    distinguishing: Vec<String>,
}

impl Alternative {
    /// Display label.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Declared keys, in declaration order.
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    /// Whether `key` belongs to this alternative.
    pub fn contains(&self, key: &str) -> bool {
        self.keys.iter().any(|k| k == key)
    }
}

/// Outcome of matching an instance object against a [`GroupOptions`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// No alternative is present.
    None,
    /// Exactly one alternative is present.
    One(usize),
    /// Several alternatives are present at once, by index.
    Conflict(Vec<usize>),
}

/// Mutually exclusive key-sets over a node's sub-parameters.
///
/// Keys that appear in no alternative are common to every shape and are
/// always validated. Keys shared by several alternatives (such as `name` in
/// `{name, value}` / `{name, valueFrom}`) never select an alternative on
/// their own.
#[derive(Debug, Clone)]
pub struct GroupOptions {
    alternatives: Vec<Alternative>,
}

fn present(object: &Map<String, Value>, key: &str) -> bool {
    object.get(key).is_some_and(|v| !v.is_null())
}

impl GroupOptions {
    /// Check alternatives against the node's child keys.
    ///
    /// Returns `Ok(None)` when no alternatives are declared.
    pub(crate) fn build(
        options: Vec<SubParameterGroupOption>,
        child_keys: &[&str],
        path: &str,
    ) -> Result<Option<Self>, SchemaError> {
        if options.is_empty() {
            return Ok(None);
        }

        for opt in &options {
            if opt.keys.is_empty() {
                return Err(SchemaError::EmptyGroupOption {
                    path: path.to_string(),
                    label: opt.label.clone(),
                });
            }
            if let Some(key) = opt.keys.iter().find(|k| !child_keys.contains(&k.as_str())) {
                return Err(SchemaError::UnknownGroupKey {
                    path: path.to_string(),
                    label: opt.label.clone(),
                    key: key.clone(),
                });
            }
        }

        let key_sets: Vec<BTreeSet<&str>> = options
            .iter()
            .map(|o| o.keys.iter().map(String::as_str).collect())
            .collect();
        for (i, a) in key_sets.iter().enumerate() {
            if let Some(j) = key_sets[i + 1..].iter().position(|b| a == b) {
                return Err(SchemaError::DuplicateGroupOption {
                    path: path.to_string(),
                    first: options[i].label.clone(),
                    second: options[i + 1 + j].label.clone(),
                });
            }
        }

        let alternatives = options
            .iter()
            .enumerate()
            .map(|(i, opt)| {
                let distinguishing = opt
                    .keys
                    .iter()
                    .filter(|k| {
                        key_sets
                            .iter()
                            .enumerate()
                            .all(|(j, set)| j == i || !set.contains(k.as_str()))
                    })
                    .cloned()
                    .collect();
                Alternative {
                    label: opt.label.clone(),
                    keys: opt.keys.clone(),
                    distinguishing,
                }
            })
            .collect();

        Ok(Some(Self { alternatives }))
    }

    /// All alternatives in declaration order.
    pub fn alternatives(&self) -> &[Alternative] {
        &self.alternatives
    }

    /// Alternative by index.
    pub fn get(&self, index: usize) -> Option<&Alternative> {
        self.alternatives.get(index)
    }

    /// Whether `key` belongs to any alternative.
    pub fn is_member(&self, key: &str) -> bool {
        self.alternatives.iter().any(|a| a.contains(key))
    }

    /// Whether `key` may appear once alternative `selected` is chosen.
    pub fn allows(&self, selected: usize, key: &str) -> bool {
        !self.is_member(key) || self.get(selected).is_some_and(|a| a.contains(key))
    }

    /// Decide which alternative an instance object takes.
    ///
    /// An alternative matches when one of its distinguishing keys is present.
    /// If none matches that way, alternatives without distinguishing keys
    /// match when all of their keys are present.
    pub fn resolve(&self, object: &Map<String, Value>) -> Selection {
        let mut matched: Vec<usize> = self
            .alternatives
            .iter()
            .enumerate()
            .filter(|(_, a)| a.distinguishing.iter().any(|k| present(object, k)))
            .map(|(i, _)| i)
            .collect();

        if matched.is_empty() {
            matched = self
                .alternatives
                .iter()
                .enumerate()
                .filter(|(_, a)| {
                    a.distinguishing.is_empty() && a.keys.iter().all(|k| present(object, k))
                })
                .map(|(i, _)| i)
                .collect();
        }

        match matched.len() {
            0 => Selection::None,
            1 => Selection::One(matched[0]),
            _ => Selection::Conflict(matched),
        }
    }

    /// Labels of the given alternatives, for messages.
    pub fn labels(&self, indices: &[usize]) -> Vec<&str> {
        indices
            .iter()
            .filter_map(|&i| self.get(i).map(Alternative::label))
            .collect()
    }
}
