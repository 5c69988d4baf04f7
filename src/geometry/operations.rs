// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Mesh kernel operations for construction trees
//!
//! Registers the primitive constructors, `translate` and the three boolean
//! operations under the operation kinds used by construction tree files.

use super::csg::{perform_boolean_operation, BooleanOp};
use super::{Mesh, Primitive};
use crate::config::BuildConfig;
use crate::error::RegistryError;
use crate::eval::{Executor, ShapeValidator};
use crate::registry::{OperationRegistry, Value};
use anyhow::{bail, ensure, Context, Result};
use nalgebra::{Point3, Vector3};
use tracing::trace;

/// Operation kinds provided by [`register_operations`]
pub const MESH_OPERATIONS: [&str; 8] = [
    "makeBox",
    "makeSphere",
    "makeCylinder",
    "makeCone",
    "translate",
    "fuse",
    "common",
    "cut",
];

/// Register the mesh kernel into `registry`, tessellating curved primitives
/// with `segments`
pub fn register_operations(
    registry: &mut OperationRegistry<Mesh>,
    segments: u32,
) -> Result<(), RegistryError> {
    registry.register("makeBox", |args: &[Value<Mesh>]| -> Result<Mesh> {
        expect_arity("makeBox", args, 2)?;
        Primitive::cuboid(point(args, 0)?, point(args, 1)?).to_mesh()
    })?;

    registry.register("makeSphere", move |args: &[Value<Mesh>]| -> Result<Mesh> {
        expect_arity("makeSphere", args, 2)?;
        Primitive::sphere(point(args, 0)?, number(args, 1)?, segments).to_mesh()
    })?;

    registry.register("makeCylinder", move |args: &[Value<Mesh>]| -> Result<Mesh> {
        expect_arity("makeCylinder", args, 3)?;
        Primitive::cylinder(point(args, 0)?, point(args, 1)?, number(args, 2)?, segments)
            .to_mesh()
    })?;

    registry.register("makeCone", move |args: &[Value<Mesh>]| -> Result<Mesh> {
        expect_arity("makeCone", args, 4)?;
        Primitive::cone(
            point(args, 0)?,
            point(args, 1)?,
            number(args, 2)?,
            number(args, 3)?,
            segments,
        )
        .to_mesh()
    })?;

    registry.register("translate", |args: &[Value<Mesh>]| -> Result<Mesh> {
        expect_arity("translate", args, 2)?;
        Ok(shape(args, 0)?.translated(&vector(args, 1)?))
    })?;

    registry.register("fuse", |args: &[Value<Mesh>]| -> Result<Mesh> {
        fold_boolean("fuse", args, BooleanOp::Union)
    })?;

    registry.register("common", |args: &[Value<Mesh>]| -> Result<Mesh> {
        fold_boolean("common", args, BooleanOp::Intersection)
    })?;

    registry.register("cut", |args: &[Value<Mesh>]| -> Result<Mesh> {
        fold_boolean("cut", args, BooleanOp::Difference)
    })?;

    Ok(())
}

/// Registry holding only the mesh kernel, tessellated per `config`
pub fn mesh_registry(config: &BuildConfig) -> Result<OperationRegistry<Mesh>, RegistryError> {
    let mut registry = OperationRegistry::new();
    register_operations(&mut registry, config.segments)?;
    Ok(registry)
}

/// Executor over the mesh kernel; checks every shape with [`NonEmptyMesh`]
/// when `config.validate_results` is set
pub fn mesh_executor(config: &BuildConfig) -> Result<Executor<Mesh>, RegistryError> {
    Ok(Executor::new(mesh_registry(config)?).configure(config, NonEmptyMesh))
}

/// Postcondition: every built mesh has at least one triangle
#[derive(Debug, Clone, Copy, Default)]
pub struct NonEmptyMesh;

impl ShapeValidator<Mesh> for NonEmptyMesh {
    fn validate(&self, node: &str, shape: &Mesh) -> Result<()> {
        ensure!(!shape.is_empty(), "node '{}' produced an empty mesh", node);
        Ok(())
    }
}

/// Apply `op` left to right: `args[0] op args[1] op ...`
fn fold_boolean(kind: &str, args: &[Value<Mesh>], op: BooleanOp) -> Result<Mesh> {
    if args.len() < 2 {
        bail!("{} expects at least 2 shapes, got {}", kind, args.len());
    }

    let mut result = perform_boolean_operation(shape(args, 0)?, shape(args, 1)?, op)
        .with_context(|| format!("{} of shapes 0 and 1", kind))?;
    for index in 2..args.len() {
        result = perform_boolean_operation(&result, shape(args, index)?, op)
            .with_context(|| format!("{} with shape {}", kind, index))?;
    }

    trace!(kind, triangles = result.triangle_count(), "boolean done");
    Ok(result)
}

fn expect_arity(kind: &str, args: &[Value<Mesh>], expected: usize) -> Result<()> {
    ensure!(
        args.len() == expected,
        "{} expects {} arguments, got {}",
        kind,
        expected,
        args.len()
    );
    Ok(())
}

fn shape(args: &[Value<Mesh>], index: usize) -> Result<&Mesh> {
    args[index]
        .as_shape()
        .with_context(|| format!("argument {}", index))
}

fn point(args: &[Value<Mesh>], index: usize) -> Result<Point3<f64>> {
    args[index]
        .as_literal()
        .and_then(|literal| literal.as_point3())
        .with_context(|| format!("argument {}", index))
}

fn vector(args: &[Value<Mesh>], index: usize) -> Result<Vector3<f64>> {
    args[index]
        .as_literal()
        .and_then(|literal| literal.as_vector3())
        .with_context(|| format!("argument {}", index))
}

fn number(args: &[Value<Mesh>], index: usize) -> Result<f64> {
    args[index]
        .as_literal()
        .and_then(|literal| literal.as_f64())
        .with_context(|| format!("argument {}", index))
}
