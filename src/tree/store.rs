// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Construction tree storage and loading

use super::NodeDefinition;
use crate::error::{BuildError, BuildResult};
use ahash::AHashMap;
use serde::Deserialize;
use serde_json::Value;
use std::str::FromStr;

/// Reserved key naming the node whose shape is the build result
pub const ROOT_KEY: &str = "root";

/// Named node definitions plus the designated root.
///
/// Only the outer shape (an object with a string `root`) is checked on load.
/// Entries that are not node records, dangling references and cycles are
/// discovered while evaluating, so unreachable branches may be broken.
#[derive(Debug, Clone)]
pub struct ConstructionTree {
    root: String,
    nodes: AHashMap<String, Entry>,
}

/// A loaded entry; malformed ones keep their raw form and the reason
#[derive(Debug, Clone)]
enum Entry {
    Node(NodeDefinition),
    Malformed { raw: Value, reason: String },
}

impl ConstructionTree {
    pub fn new(root: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            nodes: AHashMap::new(),
        }
    }

    /// Add a node, builder style
    pub fn with_node(mut self, name: impl Into<String>, definition: NodeDefinition) -> Self {
        self.insert(name, definition);
        self
    }

    /// Add or replace a node, returning the previous definition if it was
    /// well-formed
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        definition: NodeDefinition,
    ) -> Option<NodeDefinition> {
        match self.nodes.insert(name.into(), Entry::Node(definition)) {
            Some(Entry::Node(previous)) => Some(previous),
            _ => None,
        }
    }

    /// Load a tree from its structured JSON form
    pub fn from_value(value: Value) -> BuildResult<Self> {
        let mut entries = match value {
            Value::Object(entries) => entries,
            other => {
                return Err(BuildError::InvalidTree {
                    reason: format!("expected an object, got {}", json_kind(&other)),
                })
            }
        };

        let root = match entries.remove(ROOT_KEY) {
            None => return Err(BuildError::MissingRoot),
            Some(Value::String(root)) => root,
            Some(other) => {
                return Err(BuildError::InvalidTree {
                    reason: format!("'{}' must name a node, got {}", ROOT_KEY, json_kind(&other)),
                })
            }
        };

        let nodes = entries
            .into_iter()
            .map(|(name, raw)| {
                let entry = match NodeDefinition::deserialize(&raw) {
                    Ok(definition) => Entry::Node(definition),
                    Err(e) => Entry::Malformed {
                        reason: e.to_string(),
                        raw,
                    },
                };
                (name, entry)
            })
            .collect();

        Ok(Self { root, nodes })
    }

    /// Load a tree from JSON text
    pub fn from_json(source: &str) -> BuildResult<Self> {
        let value: Value = serde_json::from_str(source)?;
        Self::from_value(value)
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    /// Definition of `name`; fails if it is absent or not a node record
    pub fn get(&self, name: &str) -> BuildResult<&NodeDefinition> {
        match self.nodes.get(name) {
            Some(Entry::Node(definition)) => Ok(definition),
            Some(Entry::Malformed { reason, .. }) => Err(BuildError::InvalidTree {
                reason: format!("node '{}': {}", name, reason),
            }),
            None => Err(BuildError::UndefinedReference {
                name: name.to_string(),
            }),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.nodes.contains_key(name)
    }

    /// Number of entries, malformed ones included
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.nodes.keys().map(String::as_str)
    }

    /// Structured JSON form, with `root` alongside the nodes. Malformed
    /// entries are written back as they were loaded.
    pub fn to_value(&self) -> serde_json::Result<Value> {
        let mut entries = serde_json::Map::with_capacity(self.nodes.len() + 1);
        for (name, entry) in &self.nodes {
            let value = match entry {
                Entry::Node(definition) => serde_json::to_value(definition)?,
                Entry::Malformed { raw, .. } => raw.clone(),
            };
            entries.insert(name.clone(), value);
        }
        entries.insert(ROOT_KEY.to_string(), Value::String(self.root.clone()));
        Ok(Value::Object(entries))
    }
}

impl FromStr for ConstructionTree {
    type Err = BuildError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_json(s)
    }
}

impl TryFrom<Value> for ConstructionTree {
    type Error = BuildError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Self::from_value(value)
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
