// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Geometric primitives generator

use super::{Mesh, Vertex};
use anyhow::{ensure, Result};
use nalgebra::{Matrix4, Point3, UnitQuaternion, Vector3};
use std::f64::consts::PI;

const MIN_SEGMENTS: u32 = 3;

/// Geometric primitives
#[derive(Debug, Clone, PartialEq)]
pub enum Primitive {
    /// Axis-aligned box spanned by two opposite corners
    Cuboid { a: Point3<f64>, b: Point3<f64> },
    Sphere {
        center: Point3<f64>,
        r: f64,
        segments: u32,
    },
    /// Frustum between two axis end points; a cylinder when `r1 == r2`
    Cone {
        base: Point3<f64>,
        top: Point3<f64>,
        r1: f64,
        r2: f64,
        segments: u32,
    },
}

impl Primitive {
    pub fn cuboid(a: Point3<f64>, b: Point3<f64>) -> Self {
        Self::Cuboid { a, b }
    }

    pub fn sphere(center: Point3<f64>, r: f64, segments: u32) -> Self {
        Self::Sphere {
            center,
            r,
            segments: segments.max(MIN_SEGMENTS),
        }
    }

    pub fn cylinder(base: Point3<f64>, top: Point3<f64>, r: f64, segments: u32) -> Self {
        Self::cone(base, top, r, r, segments)
    }

    pub fn cone(base: Point3<f64>, top: Point3<f64>, r1: f64, r2: f64, segments: u32) -> Self {
        Self::Cone {
            base,
            top,
            r1,
            r2,
            segments: segments.max(MIN_SEGMENTS),
        }
    }

    /// Tessellate, rejecting primitives without volume
    pub fn to_mesh(&self) -> Result<Mesh> {
        match self {
            Self::Cuboid { a, b } => {
                let size = (b - a).abs();
                ensure!(
                    size.min() > 0.0,
                    "box corners {:?} and {:?} span no volume",
                    a.coords.as_slice(),
                    b.coords.as_slice()
                );
                Ok(generate_cuboid_mesh(&a.inf(b), &a.sup(b)))
            }
            Self::Sphere {
                center,
                r,
                segments,
            } => {
                ensure!(*r > 0.0, "sphere radius must be positive, got {}", r);
                Ok(generate_sphere_mesh(center, *r, *segments))
            }
            Self::Cone {
                base,
                top,
                r1,
                r2,
                segments,
            } => {
                let axis = top - base;
                ensure!(axis.norm() > 0.0, "axis end points coincide");
                ensure!(
                    *r1 >= 0.0 && *r2 >= 0.0 && (*r1 > 0.0 || *r2 > 0.0),
                    "radii must be non-negative and not both zero, got {} and {}",
                    r1,
                    r2
                );
                Ok(generate_cone_mesh(base, &axis, *r1, *r2, *segments))
            }
        }
    }
}

fn generate_cuboid_mesh(min: &Point3<f64>, max: &Point3<f64>) -> Mesh {
    let mut mesh = Mesh::with_capacity(8, 12);

    let corners = [
        Point3::new(min.x, min.y, min.z),
        Point3::new(max.x, min.y, min.z),
        Point3::new(max.x, max.y, min.z),
        Point3::new(min.x, max.y, min.z),
        Point3::new(min.x, min.y, max.z),
        Point3::new(max.x, min.y, max.z),
        Point3::new(max.x, max.y, max.z),
        Point3::new(min.x, max.y, max.z),
    ];
    for corner in corners {
        mesh.add_vertex(Vertex::new(corner, Vector3::zeros()));
    }

    let faces = [
        // z+
        [4, 5, 6],
        [4, 6, 7],
        // z-
        [1, 0, 3],
        [1, 3, 2],
        // x+
        [5, 1, 2],
        [5, 2, 6],
        // x-
        [0, 4, 7],
        [0, 7, 3],
        // y+
        [7, 6, 2],
        [7, 2, 3],
        // y-
        [0, 1, 5],
        [0, 5, 4],
    ];
    for face in faces {
        mesh.add_face(face);
    }

    mesh.recompute_normals();
    mesh
}

/// UV sphere: `segments` slices around, half as many stacks pole to pole
fn generate_sphere_mesh(center: &Point3<f64>, radius: f64, segments: u32) -> Mesh {
    let slices = segments as usize;
    let stacks = (segments / 2).max(2) as usize;
    let mut mesh = Mesh::with_capacity((stacks + 1) * (slices + 1), stacks * slices * 2);

    for i in 0..=stacks {
        let phi = PI * i as f64 / stacks as f64;
        let y = radius * phi.cos();
        let ring = radius * phi.sin();

        for j in 0..=slices {
            let theta = 2.0 * PI * j as f64 / slices as f64;
            let offset = Vector3::new(ring * theta.cos(), y, ring * theta.sin());
            mesh.add_vertex(Vertex::new(center + offset, offset / radius));
        }
    }

    // Pole rows produce one degenerate triangle per quad, dropped by add_face
    for i in 0..stacks {
        for j in 0..slices {
            let first = i * (slices + 1) + j;
            let second = first + slices + 1;
            mesh.add_face([first, first + 1, second]);
            mesh.add_face([second, first + 1, second + 1]);
        }
    }

    mesh
}

/// Frustum built along +z from the origin, then moved onto `base` → `base + axis`
fn generate_cone_mesh(
    base: &Point3<f64>,
    axis: &Vector3<f64>,
    r1: f64,
    r2: f64,
    segments: u32,
) -> Mesh {
    let height = axis.norm();
    let n = segments as usize;
    let mut mesh = Mesh::with_capacity(2 * n + 2, 4 * n);

    let bottom_center = mesh.add_vertex(Vertex::new(Point3::origin(), -Vector3::z()));
    let top_center = mesh.add_vertex(Vertex::new(Point3::new(0.0, 0.0, height), Vector3::z()));

    let mut bottom = Vec::with_capacity(n);
    let mut top = Vec::with_capacity(n);
    for i in 0..n {
        let angle = 2.0 * PI * i as f64 / n as f64;
        let (sin, cos) = angle.sin_cos();
        bottom.push(mesh.add_vertex(Vertex::new(
            Point3::new(r1 * cos, r1 * sin, 0.0),
            Vector3::zeros(),
        )));
        top.push(mesh.add_vertex(Vertex::new(
            Point3::new(r2 * cos, r2 * sin, height),
            Vector3::zeros(),
        )));
    }

    for i in 0..n {
        let next = (i + 1) % n;
        mesh.add_face([bottom_center, bottom[next], bottom[i]]);
        mesh.add_face([top_center, top[i], top[next]]);
        mesh.add_face([bottom[i], bottom[next], top[i]]);
        mesh.add_face([top[i], bottom[next], top[next]]);
    }

    let rotation = UnitQuaternion::rotation_between(&Vector3::z(), axis)
        .unwrap_or_else(|| UnitQuaternion::from_axis_angle(&Vector3::x_axis(), PI));
    let placement = Matrix4::new_translation(&base.coords) * rotation.to_homogeneous();
    mesh.transform(&placement);
    mesh.recompute_normals();
    mesh
}
