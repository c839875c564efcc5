use std::{fs, path::Path};

use anyhow::{Context, bail};
use log::debug;
use serde_json::Value;

use crate::{
    data::{
        param::{ParameterNode, sort_nodes},
        schema::{DefinitionFormat, ParameterDefinition, SchemaError},
    },
    path::{FieldPath, Segment},
};

/// An ordered forest of checked parameters describing one configuration
/// object.
///
/// A tree is immutable once loaded. It is `Send + Sync`, so one instance can
/// serve any number of concurrent validations and renders.
#[derive(Debug, Clone, Default)]
pub struct SchemaTree {
    roots: Vec<ParameterNode>,
}

impl SchemaTree {
    /// Check a list of definitions and build the tree.
    ///
    /// # Errors
    ///
    /// Returns a [`SchemaError`] describing the first structural problem
    /// found; no tree is produced in that case.
    pub fn load(definitions: Vec<ParameterDefinition>) -> Result<Self, SchemaError> {
        let roots = ParameterNode::build_siblings(definitions, &FieldPath::root())?;
        let tree = Self { roots };
        debug!(
            "loaded parameter schema: {} top-level, {} total",
            tree.roots.len(),
            tree.iter().count()
        );
        Ok(tree)
    }

    /// Parse and load a definition document.
    pub fn parse(content: &str, format: DefinitionFormat) -> Result<Self, SchemaError> {
        Self::load(format.parse(content)?)
    }

    /// Load from an already deserialized JSON value (an array of parameters).
    pub fn from_value(value: &Value) -> Result<Self, SchemaError> {
        let defs: Vec<ParameterDefinition> = serde_json::from_value(value.clone())?;
        Self::load(defs)
    }

    /// Read a definition file, picking the format from its extension.
    ///
    /// # Errors
    ///
    /// Fails when the file is missing or unreadable, the extension is not
    /// one of `json`, `yaml`/`yml`, `toml`, or the definition is invalid.
    pub fn from_path(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            bail!("Schema file does not exist: {}", path.display());
        }

        let ext = path.extension().and_then(|s| s.to_str()).unwrap_or("");
        let Some(format) = DefinitionFormat::from_extension(ext) else {
            bail!("Unsupported schema file extension: {ext:?}");
        };

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let tree = Self::parse(&content, format)
            .with_context(|| format!("Invalid parameter schema in {}", path.display()))?;
        Ok(tree)
    }

    /// Top-level parameters in declaration order.
    pub fn roots(&self) -> &[ParameterNode] {
        &self.roots
    }

    /// Top-level parameters in render order.
    pub fn sorted_roots(&self) -> Vec<&ParameterNode> {
        sort_nodes(&self.roots)
    }

    /// Number of top-level parameters.
    pub fn len(&self) -> usize {
        self.roots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Resolve a dotted/indexed path such as `readinessProbe.httpGet.path`
    /// or `env[0].valueFrom`. List indices are skipped, since every element
    /// of a list shares one schema node.
    ///
    /// Returns `None` for unparsable paths and unknown keys.
    pub fn find(&self, path: &str) -> Option<&ParameterNode> {
        let path: FieldPath = path.parse().ok()?;
        self.find_path(&path)
    }

    /// Resolve an already parsed path.
    pub fn find_path(&self, path: &FieldPath) -> Option<&ParameterNode> {
        let mut level = self.roots.as_slice();
        let mut found = None;
        for segment in path.segments() {
            if let Segment::Key(key) = segment {
                let node = level.iter().find(|n| n.json_key() == key.as_str())?;
                level = node.children();
                found = Some(node);
            }
        }
        found
    }

    /// Resolve a sequence of keys.
    pub fn find_keys<S: AsRef<str>>(&self, keys: &[S]) -> Option<&ParameterNode> {
        let mut level = self.roots.as_slice();
        let mut found = None;
        for key in keys {
            let node = level.iter().find(|n| n.json_key() == key.as_ref())?;
            level = node.children();
            found = Some(node);
        }
        found
    }

    /// Depth-first, pre-order walk over every node in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &ParameterNode> {
        let mut stack: Vec<&ParameterNode> = self.roots.iter().rev().collect();
        std::iter::from_fn(move || {
            let node = stack.pop()?;
            stack.extend(node.children().iter().rev());
            Some(node)
        })
    }
}
