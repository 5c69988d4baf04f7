// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Geometry module - reference mesh kernel
//!
//! Triangle meshes, primitive tessellation and BSP booleans, registered as
//! construction tree operations by [`register_operations`].

mod bbox;
mod csg;
mod mesh;
mod operations;
mod primitives;

pub use bbox::BoundingBox;
pub use csg::{csg_difference, csg_intersection, csg_union, perform_boolean_operation, BooleanOp};
pub use mesh::{Mesh, Triangle, Vertex};
pub use operations::{
    mesh_executor, mesh_registry, register_operations, NonEmptyMesh, MESH_OPERATIONS,
};
pub use primitives::Primitive;
