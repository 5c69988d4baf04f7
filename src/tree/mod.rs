// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Construction tree module
//!
//! A construction tree is a JSON object mapping node names to
//! `{ "type": ..., "parameters": [...] }` records, plus a `root` key naming
//! the node to build.

mod node;
mod store;

pub use node::{Argument, Literal, NodeDefinition};
pub use store::{ConstructionTree, ROOT_KEY};

use serde_json::json;

/// The canonical demo tree: a rounded block with a cross-shaped cut.
///
/// Three cylinders fused into a cross are cut out of the intersection of a
/// box and a sphere.
pub fn sample_tree_value() -> serde_json::Value {
    json!({
        "c1":     { "type": "makeCylinder", "parameters": [[-20.0, 0.0, 0.0], [20.0, 0.0, 0.0], 5.0] },
        "c2":     { "type": "makeCylinder", "parameters": [[0.0, -20.0, 0.0], [0.0, 20.0, 0.0], 5.0] },
        "c3":     { "type": "makeCylinder", "parameters": [[0.0, 0.0, -20.0], [0.0, 0.0, 20.0], 5.0] },
        "c4":     { "type": "fuse",         "parameters": ["c1", "c2"] },
        "cross":  { "type": "fuse",         "parameters": ["c4", "c3"] },
        "box":    { "type": "makeBox",      "parameters": [[-10, -10, -10], [10, 10, 10]] },
        "sphere": { "type": "makeSphere",   "parameters": [[0, 0, 0], 15] },
        "blob":   { "type": "common",       "parameters": ["box", "sphere"] },
        "thiny":  { "type": "cut",          "parameters": ["blob", "cross"] },
        "root": "thiny"
    })
}

pub fn sample_tree() -> ConstructionTree {
    ConstructionTree::from_value(sample_tree_value()).expect("sample tree is well-formed")
}
