//! Field paths through a parameter schema and the documents it describes.
//!
//! A path is a sequence of object keys and list indices. It displays in the
//! dotted/indexed form `readinessProbe.httpGet.path` or `env[0].name`, and the
//! same form is accepted by [`FieldPath::from_str`].

use std::{fmt, str::FromStr};

use serde::Serialize;
use thiserror::Error;

/// One step of a [`FieldPath`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    /// Object member by `jsonKey`.
    Key(String),
    /// List element by position.
    Index(usize),
}

/// Location of a field inside a configuration document.
///
/// The empty path designates the document root.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct FieldPath {
    segments: Vec<Segment>,
}

/// Error returned when a textual path cannot be parsed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid field path '{path}': {reason}")]
pub struct PathError {
    /// The offending input.
    pub path: String,
    /// What is wrong with it.
    pub reason: String,
}

impl FieldPath {
    /// The document root.
    pub fn root() -> Self {
        Self::default()
    }

    /// Returns true for the document root.
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Path of the member `key` below this path.
    pub fn child(&self, key: &str) -> Self {
        let mut segments = self.segments.clone();
        segments.push(Segment::Key(key.to_string()));
        Self { segments }
    }

    /// Path of the list element `index` below this path.
    pub fn index(&self, index: usize) -> Self {
        let mut segments = self.segments.clone();
        segments.push(Segment::Index(index));
        Self { segments }
    }

    /// All segments from the root.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Key segments only, which is the route through the schema.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Key(k) => Some(k.as_str()),
            Segment::Index(_) => None,
        })
    }

    /// The last key segment, if any.
    pub fn last_key(&self) -> Option<&str> {
        self.keys().last()
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            match segment {
                Segment::Key(key) if i == 0 => write!(f, "{key}")?,
                Segment::Key(key) => write!(f, ".{key}")?,
                Segment::Index(idx) => write!(f, "[{idx}]")?,
            }
        }
        Ok(())
    }
}

impl FromStr for FieldPath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = |reason: &str| PathError {
            path: s.to_string(),
            reason: reason.to_string(),
        };

        let mut path = FieldPath::root();
        if s.is_empty() {
            return Ok(path);
        }

        for part in s.split('.') {
            let (key, mut rest) = match part.find('[') {
                Some(pos) => part.split_at(pos),
                None => (part, ""),
            };
            if key.is_empty() {
                return Err(err("empty key segment"));
            }
            path.segments.push(Segment::Key(key.to_string()));

            while !rest.is_empty() {
                let Some(close) = rest.find(']') else {
                    return Err(err("unterminated index"));
                };
                if !rest.starts_with('[') {
                    return Err(err("unexpected text after index"));
                }
                let idx = rest[1..close]
                    .parse::<usize>()
                    .map_err(|_| err("index is not a non-negative integer"))?;
                path.segments.push(Segment::Index(idx));
                rest = &rest[close + 1..];
            }
        }

        Ok(path)
    }
}

impl Serialize for FieldPath {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
