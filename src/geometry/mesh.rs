// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Mesh representation and utilities

use super::BoundingBox;
use nalgebra::{Matrix4, Point3, Vector3};
use serde::{Deserialize, Serialize};

/// Triangles with less area than this are dropped on insertion
const DEGENERATE_AREA: f64 = 1e-12;

/// Vertex with position and normal
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Vertex {
    pub position: Point3<f64>,
    pub normal: Vector3<f64>,
}

impl Vertex {
    pub fn new(position: Point3<f64>, normal: Vector3<f64>) -> Self {
        Self { position, normal }
    }

    pub fn transform(&mut self, matrix: &Matrix4<f64>) {
        self.position = matrix.transform_point(&self.position);
        // Normals go through the inverse transpose
        let normal_matrix = matrix
            .try_inverse()
            .map(|m| m.transpose())
            .unwrap_or(*matrix);
        self.normal = normal_matrix
            .transform_vector(&self.normal)
            .try_normalize(f64::EPSILON)
            .unwrap_or(self.normal);
    }
}

/// Triangle defined by three vertex indices
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Triangle {
    pub indices: [usize; 3],
}

impl Triangle {
    pub fn new(indices: [usize; 3]) -> Self {
        Self { indices }
    }
}

/// Triangular mesh, outward-facing counter-clockwise winding
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Mesh {
    pub vertices: Vec<Vertex>,
    pub triangles: Vec<Triangle>,
}

impl Mesh {
    pub fn new() -> Self {
        Self {
            vertices: Vec::new(),
            triangles: Vec::new(),
        }
    }

    pub fn empty() -> Self {
        Self::new()
    }

    pub fn with_capacity(vertex_count: usize, triangle_count: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(vertex_count),
            triangles: Vec::with_capacity(triangle_count),
        }
    }

    /// Add a vertex and return its index
    pub fn add_vertex(&mut self, vertex: Vertex) -> usize {
        let index = self.vertices.len();
        self.vertices.push(vertex);
        index
    }

    /// Add a triangle
    pub fn add_triangle(&mut self, triangle: Triangle) {
        self.triangles.push(triangle);
    }

    /// Add a triangle unless its corners are (nearly) collinear
    pub fn add_face(&mut self, indices: [usize; 3]) -> bool {
        let [a, b, c] = indices.map(|i| self.vertices[i].position);
        if (b - a).cross(&(c - a)).norm() * 0.5 <= DEGENERATE_AREA {
            return false;
        }
        self.add_triangle(Triangle::new(indices));
        true
    }

    /// Transform all vertices by a matrix
    pub fn transform(&mut self, matrix: &Matrix4<f64>) {
        for vertex in &mut self.vertices {
            vertex.transform(matrix);
        }
    }

    pub fn translated(&self, offset: &Vector3<f64>) -> Mesh {
        let mut mesh = self.clone();
        mesh.transform(&Matrix4::new_translation(offset));
        mesh
    }

    /// Compute bounding box
    pub fn bounding_box(&self) -> BoundingBox {
        BoundingBox::from_vertices(&self.vertices)
    }

    /// Get vertex count
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Get triangle count
    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    /// Corner positions of every triangle
    pub fn triangle_positions(&self) -> impl Iterator<Item = [Point3<f64>; 3]> + '_ {
        self.triangles
            .iter()
            .map(|t| t.indices.map(|i| self.vertices[i].position))
    }

    /// Enclosed volume; only meaningful for closed meshes
    pub fn volume(&self) -> f64 {
        self.triangle_positions()
            .map(|[a, b, c]| a.coords.dot(&b.coords.cross(&c.coords)))
            .sum::<f64>()
            / 6.0
    }

    pub fn surface_area(&self) -> f64 {
        self.triangle_positions()
            .map(|[a, b, c]| (b - a).cross(&(c - a)).norm() * 0.5)
            .sum()
    }

    /// Merge with another mesh (simple union without CSG)
    pub fn merge(&mut self, other: &Mesh) {
        let offset = self.vertices.len();
        self.vertices.extend_from_slice(&other.vertices);

        for triangle in &other.triangles {
            self.triangles.push(Triangle::new([
                triangle.indices[0] + offset,
                triangle.indices[1] + offset,
                triangle.indices[2] + offset,
            ]));
        }
    }

    /// Recompute vertex normals from triangle geometry, area weighted
    pub fn recompute_normals(&mut self) {
        if self.vertices.is_empty() || self.triangles.is_empty() {
            return;
        }

        let mut normal_sums: Vec<Vector3<f64>> = vec![Vector3::zeros(); self.vertices.len()];

        for triangle in &self.triangles {
            let [a, b, c] = triangle.indices.map(|i| self.vertices[i].position);
            // Length of the cross product is twice the area
            let face_normal = (b - a).cross(&(c - a));
            for &idx in &triangle.indices {
                normal_sums[idx] += face_normal;
            }
        }

        for (vertex, sum) in self.vertices.iter_mut().zip(normal_sums) {
            vertex.normal = sum.try_normalize(1e-12).unwrap_or_else(Vector3::z);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Primitive;
    use approx::assert_relative_eq;

    fn unit_box() -> Mesh {
        Primitive::cuboid(Point3::origin(), Point3::new(1.0, 2.0, 3.0))
            .to_mesh()
            .unwrap()
    }

    #[test]
    fn test_volume_and_area() {
        let mesh = unit_box();
        assert_relative_eq!(mesh.volume(), 6.0, epsilon = 1e-9);
        assert_relative_eq!(mesh.surface_area(), 22.0, epsilon = 1e-9);
    }

    #[test]
    fn test_translate_keeps_volume() {
        let moved = unit_box().translated(&Vector3::new(5.0, -3.0, 1.0));
        assert_relative_eq!(moved.volume(), 6.0, epsilon = 1e-9);
        assert_relative_eq!(moved.bounding_box().min.x, 5.0, epsilon = 1e-12);
    }

    #[test]
    fn test_degenerate_faces_are_skipped() {
        let mut mesh = Mesh::new();
        let n = Vector3::z();
        let a = mesh.add_vertex(Vertex::new(Point3::new(0.0, 0.0, 0.0), n));
        let b = mesh.add_vertex(Vertex::new(Point3::new(1.0, 0.0, 0.0), n));
        let c = mesh.add_vertex(Vertex::new(Point3::new(2.0, 0.0, 0.0), n));
        let d = mesh.add_vertex(Vertex::new(Point3::new(0.0, 1.0, 0.0), n));

        assert!(!mesh.add_face([a, b, c]));
        assert!(mesh.add_face([a, b, d]));
        assert_eq!(mesh.triangle_count(), 1);
    }

    #[test]
    fn test_recompute_normals_point_outward() {
        let mut mesh = unit_box();
        mesh.recompute_normals();
        let center = mesh.bounding_box().center();
        for vertex in &mesh.vertices {
            assert!(vertex.normal.dot(&(vertex.position - center)) > 0.0);
            assert_relative_eq!(vertex.normal.norm(), 1.0, epsilon = 1e-9);
        }
    }
}
