// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Polyframe CSG
//!
//! Lazy, memoized evaluation of construction trees: named nodes, each
//! applying an operation to literal arguments and to the results of other
//! nodes. Only what the root needs is built, and a node shared by several
//! others is built once per build.
//!
//! Operations are supplied through an [`OperationRegistry`]; the
//! [`geometry`] module provides a reference mesh kernel.

pub mod config;
pub mod error;
pub mod eval;
pub mod geometry;
pub mod registry;
pub mod tree;

pub use config::BuildConfig;
pub use error::{BuildError, BuildResult, RegistryError};
pub use eval::{BuildOutput, BuildStats, Executor, Resolver, ShapeValidator};
pub use geometry::Mesh;
pub use registry::{Operation, OperationRegistry, Value};
pub use tree::{Argument, ConstructionTree, Literal, NodeDefinition};

use anyhow::Result;
use std::sync::Arc;

/// Build a JSON construction tree with the mesh kernel, using the
/// configuration from [`BuildConfig::load`]
pub fn build(source: &str) -> Result<Arc<Mesh>> {
    let config = BuildConfig::load()?;
    let executor = geometry::mesh_executor(&config)?;
    Ok(executor.execute_str(source)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_box() {
        let mesh = build(
            r#"{ "b": { "type": "makeBox", "parameters": [[0, 0, 0], [10, 10, 10]] }, "root": "b" }"#,
        )
        .unwrap();
        assert_eq!(mesh.triangle_count(), 12);
    }
}
